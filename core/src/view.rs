use crate::color::Color;
use crate::draw_state::DrawStateStack;
use crate::rect::Rect;
use crate::region::Region;
use bitflags::bitflags;
use cgmath::{Point2, Vector2, Zero};
use core::fmt;
use uuid::Uuid;

/// A unique identifier for a view.
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u32, u16, u16, [u8; 8]);

impl ViewId {
    /// Creates a fresh identifier.
    ///
    /// Clients may create ids themselves so requests can name a view before the server has
    /// seen it.
    pub fn new() -> ViewId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        ViewId(a, b, c, *d)
    }

    fn as_uuid(&self) -> Uuid {
        Uuid::from_fields(self.0, self.1, self.2, &self.3)
    }
}

impl Default for ViewId {
    fn default() -> Self {
        ViewId::new()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_uuid())
    }
}

bitflags! {
    /// View behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ViewFlags: u32 {
        /// The view draws its own content on top of its view color.
        const WILL_DRAW = 1 << 0;
        /// The whole view is invalidated when it is resized.
        const FULL_UPDATE_ON_RESIZE = 1 << 1;
        /// Children do not clip the view’s drawing.
        const DRAW_ON_CHILDREN = 1 << 2;
        /// The client is told about frame changes.
        const FRAME_EVENTS = 1 << 3;
    }
}

bitflags! {
    /// Input events a view wants regardless of focus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const POINTER_EVENTS = 1 << 0;
        const KEYBOARD_EVENTS = 1 << 1;
    }
}

bitflags! {
    /// Modifiers for event mask delivery.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventOptions: u32 {
        const LOCK_WINDOW_FOCUS = 1 << 0;
        const SUSPEND_VIEW_FOCUS = 1 << 1;
        const NO_POINTER_HISTORY = 1 << 2;
    }
}

/// A view: one node of a window’s view tree.
///
/// Links are handles into the owning [`ViewTree`](crate::ViewTree); a view only ever belongs
/// to one tree.
#[derive(Debug, Clone)]
pub struct View {
    pub(crate) id: ViewId,
    pub(crate) name: String,
    /// Frame in parent coordinates (screen coordinates for the top view).
    pub(crate) frame: Rect,
    pub(crate) scroll_offset: Vector2<f64>,
    pub(crate) flags: ViewFlags,
    pub(crate) event_mask: EventMask,
    pub(crate) event_options: EventOptions,
    pub(crate) view_color: Color,

    /// Explicitly hidden.
    pub(crate) hidden: bool,
    /// Computed: attached, not hidden, and no ancestor hidden.
    pub(crate) visible: bool,
    pub(crate) background_dirty: bool,

    pub(crate) draw_state: DrawStateStack,
    pub(crate) screen_clipping: Region,

    pub(crate) parent: Option<ViewId>,
    pub(crate) first_child: Option<ViewId>,
    pub(crate) last_child: Option<ViewId>,
    pub(crate) next_sibling: Option<ViewId>,
    pub(crate) previous_sibling: Option<ViewId>,
}

impl View {
    pub(crate) fn new(id: ViewId, name: &str, frame: Rect, flags: ViewFlags) -> View {
        View {
            id,
            name: name.to_owned(),
            frame,
            scroll_offset: Vector2::zero(),
            flags,
            event_mask: EventMask::empty(),
            event_options: EventOptions::empty(),
            view_color: Color::PANEL,
            hidden: false,
            visible: false,
            background_dirty: true,
            draw_state: DrawStateStack::default(),
            screen_clipping: Region::new(),
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            previous_sibling: None,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// The view’s own coordinate space: frame size, at the scrolling offset.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            Point2::new(self.scroll_offset.x, self.scroll_offset.y),
            self.frame.size,
        )
    }

    pub fn scroll_offset(&self) -> Vector2<f64> {
        self.scroll_offset
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    pub fn event_mask(&self) -> EventMask {
        self.event_mask
    }

    pub fn event_options(&self) -> EventOptions {
        self.event_options
    }

    pub fn view_color(&self) -> Color {
        self.view_color
    }

    /// Returns true if this view itself was hidden, regardless of its ancestors.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns true if the view is attached and neither it nor any ancestor is hidden.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_background_dirty(&self) -> bool {
        self.background_dirty
    }

    pub fn draw_state(&self) -> &DrawStateStack {
        &self.draw_state
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<ViewId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<ViewId> {
        self.last_child
    }

    pub fn next_sibling(&self) -> Option<ViewId> {
        self.next_sibling
    }

    pub fn previous_sibling(&self) -> Option<ViewId> {
        self.previous_sibling
    }

    /// Point in parent coordinates corresponding to `point` in this view.
    pub(crate) fn to_parent(&self, point: Point2<f64>) -> Point2<f64> {
        point + (self.frame.origin - Point2::new(0., 0.)) - self.scroll_offset
    }

    pub(crate) fn from_parent(&self, point: Point2<f64>) -> Point2<f64> {
        point - (self.frame.origin - Point2::new(0., 0.)) + self.scroll_offset
    }
}
