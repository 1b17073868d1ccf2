//! Server-side windows.

use crate::bitmap::SharedBitmap;
use crate::drawing_engine::DrawingEngine;
use crate::error::WindowError;
use crate::hw_interface::HWInterface;
use crate::message::{ClientPort, Envelope, Message, MessageTarget};
use crate::settings::DesktopSettings;
use cgmath::{Point2, Vector2};
use core::fmt;
use kite_core::{ClipRect, Color, Rect, Region, ViewArchive, ViewFlags, ViewId, ViewTree};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Number of workspaces a window can be on.
pub const MAX_WORKSPACES: usize = 32;
/// List of every window, regardless of workspace.
pub const ALL_WINDOWS_LIST: usize = MAX_WORKSPACES;
/// Windows belonging to a subset (floating or modal) group.
pub const SUBSET_LIST: usize = MAX_WORKSPACES + 1;
/// Focus history.
pub const FOCUS_LIST: usize = MAX_WORKSPACES + 2;
/// Number of anchor slots per window.
pub const LIST_COUNT: usize = MAX_WORKSPACES + 3;

const BORDER_COLOR: Color = Color::new(1., 0.8, 0., 1.);

/// A unique identifier for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u32, u16, u16, [u8; 8]);

impl WindowId {
    pub fn new() -> WindowId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        WindowId(a, b, c, *d)
    }
}

impl Default for WindowId {
    fn default() -> Self {
        WindowId::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", Uuid::from_fields(self.0, self.1, self.2, &self.3))
    }
}

/// A window’s link into one window list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowAnchor {
    pub next: Option<WindowId>,
    pub previous: Option<WindowId>,
    /// Where the window sits on this workspace, if it was ever placed there.
    pub position: Option<Point2<f64>>,
}

impl WindowAnchor {
    pub const EMPTY: WindowAnchor = WindowAnchor {
        next: None,
        previous: None,
        position: None,
    };
}

/// What is on the other side of a window.
#[derive(Debug, Clone)]
pub enum WindowKind {
    /// A client application, reached through its port.
    Live { port: ClientPort },
    /// Nobody: the window renders into a bitmap.
    Offscreen { bitmap: SharedBitmap },
}

/// Serializable snapshot of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowArchive {
    pub title: String,
    pub frame: Rect,
    pub workspaces: u32,
    pub hidden: bool,
    pub root: ViewArchive,
}

/// A window: a view tree, the regions it may draw in, and the pipeline it draws through.
///
/// The frame is the content area in screen coordinates; the border surrounds it. Region
/// caches are recomputed lazily after they are invalidated.
pub struct Window {
    pub(crate) id: WindowId,
    title: String,
    frame: Rect,
    pub(crate) kind: WindowKind,
    pub(crate) views: ViewTree,

    pub(crate) anchors: [WindowAnchor; LIST_COUNT],
    pub(crate) workspaces: u32,
    pub(crate) hidden: bool,

    border_width: i32,
    default_view_color: Color,

    pub(crate) border_region: Region,
    pub(crate) border_valid: bool,
    pub(crate) content_region: Region,
    pub(crate) content_valid: bool,
    pub(crate) visible_region: Region,
    pub(crate) visible_valid: bool,
    pub(crate) visible_content_region: Region,
    pub(crate) visible_content_valid: bool,
    /// The whole visible region needs repainting after the next clipping pass.
    frame_changed: bool,

    pub(crate) dirty_region: Region,
    pub(crate) drawing_engine: DrawingEngine,
    pub(crate) hw: Option<Arc<dyn HWInterface>>,
    pub(crate) owns_hw: bool,
    closed: bool,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("frame", &self.frame)
            .field("workspaces", &format_args!("{:#x}", self.workspaces))
            .field("hidden", &self.hidden)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Window {
    /// Creates a window drawing on the shared screen.
    ///
    /// It can’t draw anything until the desktop assigns it a visible region.
    pub fn new(
        title: &str,
        frame: Rect,
        port: ClientPort,
        screen: Arc<dyn HWInterface>,
        settings: &DesktopSettings,
    ) -> Window {
        let mut window = Window::with_kind(
            title,
            frame,
            WindowKind::Live { port },
            settings.border_width.max(0),
            settings.default_view_color,
        );
        window.drawing_engine = DrawingEngine::new(Some(Arc::clone(&screen)));
        window.hw = Some(screen);
        window
    }

    pub(crate) fn with_kind(
        title: &str,
        frame: Rect,
        kind: WindowKind,
        border_width: i32,
        default_view_color: Color,
    ) -> Window {
        let views = ViewTree::with_top_view_color(frame, default_view_color);

        Window {
            id: WindowId::new(),
            title: title.to_owned(),
            frame,
            kind,
            views,
            anchors: [WindowAnchor::EMPTY; LIST_COUNT],
            workspaces: 0,
            hidden: false,
            border_width,
            default_view_color,
            border_region: Region::new(),
            border_valid: false,
            content_region: Region::new(),
            content_valid: false,
            visible_region: Region::new(),
            visible_valid: false,
            visible_content_region: Region::new(),
            visible_content_valid: false,
            frame_changed: true,
            dirty_region: Region::new(),
            drawing_engine: DrawingEngine::default(),
            hw: None,
            owns_hw: false,
            closed: false,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_owned();
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn kind(&self) -> &WindowKind {
        &self.kind
    }

    pub fn is_offscreen(&self) -> bool {
        matches!(self.kind, WindowKind::Offscreen { .. })
    }

    pub fn views(&self) -> &ViewTree {
        &self.views
    }

    pub fn root_view(&self) -> ViewId {
        self.views.root()
    }

    pub fn workspaces(&self) -> u32 {
        self.workspaces
    }

    pub fn is_on_workspace(&self, index: usize) -> bool {
        index < MAX_WORKSPACES && self.workspaces & (1 << index) != 0
    }

    pub fn anchor(&self, index: usize) -> &WindowAnchor {
        &self.anchors[index]
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn drawing_engine(&self) -> &DrawingEngine {
        &self.drawing_engine
    }

    pub fn hw_interface(&self) -> Option<&Arc<dyn HWInterface>> {
        self.hw.as_ref()
    }

    /// Area waiting to be repainted by [`redraw`](Self::redraw), in screen coordinates.
    pub fn dirty_region(&self) -> &Region {
        &self.dirty_region
    }

    // - regions

    /// The frame around the content area.
    pub fn border_region(&mut self) -> &Region {
        if !self.border_valid {
            let content = self.frame.to_clip_rect();
            let mut border = Region::from_rect(content.inflate(self.border_width));
            border.exclude_rect(content);
            self.border_region = border;
            self.border_valid = true;
        }
        &self.border_region
    }

    pub fn content_region(&mut self) -> &Region {
        if !self.content_valid {
            self.content_region = Region::from_rect(self.frame.to_clip_rect());
            self.content_valid = true;
        }
        &self.content_region
    }

    /// What the window may draw on screen, border included.
    pub fn visible_region(&self) -> &Region {
        &self.visible_region
    }

    pub fn is_visible_region_valid(&self) -> bool {
        self.visible_valid
    }

    pub fn is_content_region_valid(&self) -> bool {
        self.content_valid
    }

    pub fn is_visible_content_region_valid(&self) -> bool {
        self.visible_content_valid
    }

    /// The visible part of the content area.
    pub fn visible_content_region(&mut self) -> &Region {
        if !self.visible_content_valid {
            let content = self.content_region().clone();
            self.visible_content_region = &self.visible_region & &content;
            self.visible_content_valid = true;
        }
        &self.visible_content_region
    }

    /// Assigns the window the part of `still_available` it covers.
    ///
    /// Area that was not visible before is added to the dirty region.
    pub fn set_clipping(&mut self, still_available: &Region) {
        let visible = if self.hidden {
            Region::new()
        } else {
            let mut visible = self.border_region().clone();
            visible.include(self.content_region());
            visible.intersect_with(still_available);
            visible
        };
        let exposed = if self.frame_changed {
            visible.clone()
        } else {
            &visible - &self.visible_region
        };
        self.frame_changed = false;

        if visible != self.visible_region || !self.visible_valid {
            self.visible_region = visible;
            self.visible_valid = true;
            self.visible_content_valid = false;
            self.views.invalidate_clipping();
        }
        if !exposed.is_empty() {
            self.dirty_region.include(&exposed);
        }
    }

    /// Forgets the content regions and view clipping.
    pub fn invalidate_content(&mut self) {
        self.content_valid = false;
        self.visible_content_valid = false;
        self.views.invalidate_clipping();
    }

    fn invalidate_geometry(&mut self) {
        self.border_valid = false;
        self.visible_valid = false;
        self.frame_changed = true;
        self.invalidate_content();
    }

    /// Recomputes view clipping if anything changed since the last time.
    pub fn ensure_clipping(&mut self) -> Result<(), WindowError> {
        if !self.views.is_clipping_valid() {
            let visible_content = self.visible_content_region().clone();
            self.views.rebuild_clipping(&visible_content)?;
        }
        Ok(())
    }

    /// Adds the visible part of `dirty` to the dirty region.
    fn mark_dirty(&mut self, mut dirty: Region) {
        if dirty.is_empty() {
            return;
        }
        dirty.intersect_with(self.visible_content_region());
        self.dirty_region.include(&dirty);
    }

    // - geometry

    /// Moves the window on screen. Offscreen windows don’t move.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> Result<(), WindowError> {
        if self.is_offscreen() || (dx == 0. && dy == 0.) {
            return Ok(());
        }
        self.frame = self.frame + Vector2::new(dx, dy);
        let root = self.views.root();
        self.views.move_by(root, dx, dy, &mut Region::new())?;
        self.invalidate_geometry();
        trace!(window = %self.id, frame = ?self.frame, "moved");
        Ok(())
    }

    /// Resizes the window. Offscreen windows keep the size of their bitmap.
    pub fn resize_by(&mut self, dw: f64, dh: f64) -> Result<(), WindowError> {
        if self.is_offscreen() || (dw == 0. && dh == 0.) {
            return Ok(());
        }
        self.frame.size.x = (self.frame.size.x + dw).max(0.);
        self.frame.size.y = (self.frame.size.y + dh).max(0.);
        let root = self.views.root();
        self.views.resize_by(root, dw, dh, &mut Region::new())?;
        self.invalidate_geometry();
        trace!(window = %self.id, frame = ?self.frame, "resized");
        Ok(())
    }

    // - views

    /// Creates a detached view with the default view color.
    pub fn create_view(
        &mut self,
        name: &str,
        frame: Rect,
        flags: ViewFlags,
    ) -> Result<ViewId, WindowError> {
        let id = self.views.create_view(name, frame, flags);
        self.views.set_view_color(id, self.default_view_color)?;
        Ok(id)
    }

    pub fn create_view_with_id(
        &mut self,
        id: ViewId,
        name: &str,
        frame: Rect,
        flags: ViewFlags,
    ) -> Result<(), WindowError> {
        self.views.create_view_with_id(id, name, frame, flags)?;
        self.views.set_view_color(id, self.default_view_color)?;
        Ok(())
    }

    pub fn add_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        before: Option<ViewId>,
    ) -> Result<(), WindowError> {
        let mut dirty = Region::new();
        self.views.add_child(parent, child, before, &mut dirty)?;
        self.mark_dirty(dirty);
        Ok(())
    }

    /// Detaches `child`. It stays around and can be added again.
    pub fn remove_child(&mut self, parent: ViewId, child: ViewId) -> Result<(), WindowError> {
        let mut dirty = Region::new();
        self.views.remove_child(parent, child, &mut dirty)?;
        self.mark_dirty(dirty);
        Ok(())
    }

    /// Drops a detached view and its subtree.
    pub fn destroy_view(&mut self, id: ViewId) -> Result<(), WindowError> {
        self.views.destroy_view(id)?;
        Ok(())
    }

    pub fn move_view_by(&mut self, id: ViewId, dx: f64, dy: f64) -> Result<(), WindowError> {
        let mut dirty = Region::new();
        self.views.move_by(id, dx, dy, &mut dirty)?;
        self.mark_dirty(dirty);
        Ok(())
    }

    pub fn resize_view_by(&mut self, id: ViewId, dw: f64, dh: f64) -> Result<(), WindowError> {
        let mut dirty = Region::new();
        self.views.resize_by(id, dw, dh, &mut dirty)?;
        self.mark_dirty(dirty);
        Ok(())
    }

    pub fn scroll_view_by(&mut self, id: ViewId, dx: f64, dy: f64) -> Result<(), WindowError> {
        let mut dirty = Region::new();
        self.views.scroll_by(id, dx, dy, &mut dirty)?;
        self.mark_dirty(dirty);
        Ok(())
    }

    pub fn set_view_hidden(&mut self, id: ViewId, hidden: bool) -> Result<(), WindowError> {
        let mut dirty = Region::new();
        self.views.set_hidden(id, hidden, &mut dirty)?;
        self.mark_dirty(dirty);
        Ok(())
    }

    pub fn set_view_color(&mut self, id: ViewId, color: Color) -> Result<(), WindowError> {
        self.views.set_view_color(id, color)?;
        Ok(())
    }

    pub fn push_state(&mut self, id: ViewId) -> Result<(), WindowError> {
        self.views.push_state(id)?;
        Ok(())
    }

    pub fn pop_state(&mut self, id: ViewId) -> Result<(), WindowError> {
        self.views.pop_state(id)?;
        self.views.invalidate_clipping();
        Ok(())
    }

    /// Sets the user clipping of the view’s current draw state (view coordinates).
    pub fn set_view_clipping(
        &mut self,
        id: ViewId,
        clipping: Option<Region>,
    ) -> Result<(), WindowError> {
        self.views.draw_state_mut(id)?.current_mut().clipping = clipping;
        Ok(())
    }

    pub fn set_high_color(&mut self, id: ViewId, color: Color) -> Result<(), WindowError> {
        self.views.draw_state_mut(id)?.current_mut().high_color = color;
        Ok(())
    }

    /// Marks `rect` (view coordinates), or the whole view, for repainting.
    pub fn invalidate_view(&mut self, id: ViewId, rect: Option<Rect>) -> Result<(), WindowError> {
        self.ensure_clipping()?;
        let region = self.views.invalidate(id, rect)?;
        self.dirty_region.include(&region);
        Ok(())
    }

    // - drawing

    /// Converts `rect` in view coordinates, as modified by the view’s draw state, to pixels.
    fn view_rect_to_screen(&self, view: ViewId, rect: Rect) -> Result<ClipRect, WindowError> {
        let state = self.views.draw_state(view)?;
        let origin = state.combined_origin();
        let scale = state.combined_scale();
        let rect = Rect::new(
            Point2::new(origin.x, origin.y) + Vector2::new(rect.origin.x, rect.origin.y) * scale,
            rect.size * scale,
        );
        Ok(self.views.convert_rect_to_screen(view, rect)?.to_clip_rect())
    }

    /// Fills `rect` (view coordinates) within the view’s clipping.
    ///
    /// Does nothing once the window is closed.
    pub fn fill_rect(&mut self, view: ViewId, rect: Rect, color: Color) -> Result<(), WindowError> {
        if self.closed {
            return Ok(());
        }
        self.ensure_clipping()?;
        let clipping = self.views.effective_clipping(view)?;
        let rect = self.view_rect_to_screen(view, rect)?;
        self.drawing_engine.constrain_clipping_region(Some(&clipping));
        self.drawing_engine.fill_rect(rect, color);
        self.drawing_engine.constrain_clipping_region(None);
        Ok(())
    }

    /// Outlines `rect` (view coordinates) within the view’s clipping.
    pub fn stroke_rect(
        &mut self,
        view: ViewId,
        rect: Rect,
        color: Color,
    ) -> Result<(), WindowError> {
        if self.closed {
            return Ok(());
        }
        self.ensure_clipping()?;
        let clipping = self.views.effective_clipping(view)?;
        let rect = self.view_rect_to_screen(view, rect)?;
        self.drawing_engine.constrain_clipping_region(Some(&clipping));
        self.drawing_engine.stroke_rect(rect, color);
        self.drawing_engine.constrain_clipping_region(None);
        Ok(())
    }

    /// Paints view backgrounds: whole views whose background changed, and everything inside
    /// the dirty region. Clears the dirty region.
    pub fn redraw(&mut self) -> Result<(), WindowError> {
        if self.closed {
            return Ok(());
        }
        self.ensure_clipping()?;
        let dirty = std::mem::take(&mut self.dirty_region);

        let border = &dirty & self.border_region();
        let border = &border & &self.visible_region;
        if !border.is_empty() {
            self.drawing_engine.fill_region(&border, BORDER_COLOR);
        }

        for id in self.views.preorder() {
            let background_dirty = self.views.take_background_dirty(id)?;
            let clipping = self.views.screen_clipping(id)?;
            let region = if background_dirty {
                clipping.clone()
            } else {
                clipping & &dirty
            };
            if region.is_empty() {
                continue;
            }
            let color = match self.views.get(id) {
                Some(view) => view.view_color(),
                None => continue,
            };
            self.drawing_engine.fill_region(&region, color);
        }
        Ok(())
    }

    // - messaging

    /// Delivers a message to the window’s client. Offscreen windows have none, so nothing is
    /// sent.
    pub fn send_message_to_client(
        &self,
        message: Message,
        target: MessageTarget,
    ) -> Result<(), WindowError> {
        match &self.kind {
            WindowKind::Live { port } => {
                if port.post(Envelope { target, message }) {
                    Ok(())
                } else {
                    Err(WindowError::ClientGone(self.id))
                }
            }
            WindowKind::Offscreen { .. } => {
                trace!(window = %self.id, what = message.what, "offscreen window, not sending");
                Ok(())
            }
        }
    }

    // - lifecycle

    /// Stops drawing and lets go of the hardware interface, shutting it down if the window
    /// owns it. Closing twice does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.drawing_engine.set_hw_interface(None);
        if let Some(hw) = self.hw.take() {
            if self.owns_hw {
                let mut access = hw.lock_exclusive_access();
                hw.shutdown(&mut access);
            }
        }
        debug!(window = %self.id, title = %self.title, "closed");
    }

    pub fn archive(&self) -> Result<WindowArchive, WindowError> {
        Ok(WindowArchive {
            title: self.title.clone(),
            frame: self.frame,
            workspaces: self.workspaces,
            hidden: self.hidden,
            root: self.views.archive(self.views.root())?,
        })
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}
