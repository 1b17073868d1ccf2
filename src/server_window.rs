//! Applying client requests to a window.
//!
//! Clients never touch a window directly. They send [`ClientRequest`]s, which the thread
//! servicing the window applies one at a time, in order.

use crate::error::WindowError;
use crate::message::{Message, MessageTarget, QUIT_REQUESTED, VIEW_MOVED, VIEW_RESIZED};
use crate::window::Window;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use kite_core::{Color, Rect, Region, ViewFlags, ViewId};
use tracing::{debug, warn};

/// A request from a client to its window.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    /// Creates a view and adds it to `parent`.
    AddView {
        parent: ViewId,
        id: ViewId,
        name: String,
        frame: Rect,
        flags: ViewFlags,
        before: Option<ViewId>,
    },
    /// Removes a view from its parent and drops it.
    RemoveView { parent: ViewId, id: ViewId },
    MoveView { id: ViewId, dx: f64, dy: f64 },
    ResizeView { id: ViewId, dw: f64, dh: f64 },
    ScrollView { id: ViewId, dx: f64, dy: f64 },
    SetHidden { id: ViewId, hidden: bool },
    SetViewColor { id: ViewId, color: Color },
    SetHighColor { id: ViewId, color: Color },
    PushState { id: ViewId },
    PopState { id: ViewId },
    /// Sets the user clipping (view coordinates) of the current draw state.
    SetClipping { id: ViewId, clipping: Option<Region> },
    /// Fills with the high color.
    FillRect { id: ViewId, rect: Rect },
    /// Outlines with the high color.
    StrokeRect { id: ViewId, rect: Rect },
    Invalidate { id: ViewId, rect: Option<Rect> },
    MoveWindow { dx: f64, dy: f64 },
    ResizeWindow { dw: f64, dh: f64 },
    Redraw,
    Quit,
}

/// What applying a request did beyond the window itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOutcome {
    /// The client asked to quit.
    pub quit: bool,
    /// The window frame changed, so screen clipping is stale.
    pub geometry_changed: bool,
}

impl Window {
    /// Applies one client request.
    pub fn handle_request(&mut self, request: ClientRequest) -> Result<RequestOutcome, WindowError> {
        let mut outcome = RequestOutcome::default();
        if self.is_closed() && !matches!(request, ClientRequest::Quit) {
            return Err(WindowError::Closed(self.id()));
        }

        match request {
            ClientRequest::AddView {
                parent,
                id,
                name,
                frame,
                flags,
                before,
            } => {
                self.create_view_with_id(id, &name, frame, flags)?;
                if let Err(err) = self.add_child(parent, id, before) {
                    self.destroy_view(id)?;
                    return Err(err);
                }
            }
            ClientRequest::RemoveView { parent, id } => {
                self.remove_child(parent, id)?;
                self.destroy_view(id)?;
            }
            ClientRequest::MoveView { id, dx, dy } => {
                self.move_view_by(id, dx, dy)?;
                self.notify_frame_change(id, VIEW_MOVED)?;
            }
            ClientRequest::ResizeView { id, dw, dh } => {
                self.resize_view_by(id, dw, dh)?;
                self.notify_frame_change(id, VIEW_RESIZED)?;
            }
            ClientRequest::ScrollView { id, dx, dy } => self.scroll_view_by(id, dx, dy)?,
            ClientRequest::SetHidden { id, hidden } => self.set_view_hidden(id, hidden)?,
            ClientRequest::SetViewColor { id, color } => self.set_view_color(id, color)?,
            ClientRequest::SetHighColor { id, color } => self.set_high_color(id, color)?,
            ClientRequest::PushState { id } => self.push_state(id)?,
            ClientRequest::PopState { id } => self.pop_state(id)?,
            ClientRequest::SetClipping { id, clipping } => self.set_view_clipping(id, clipping)?,
            ClientRequest::FillRect { id, rect } => {
                let color = self.views().draw_state(id)?.current().high_color;
                self.fill_rect(id, rect, color)?;
            }
            ClientRequest::StrokeRect { id, rect } => {
                let color = self.views().draw_state(id)?.current().high_color;
                self.stroke_rect(id, rect, color)?;
            }
            ClientRequest::Invalidate { id, rect } => self.invalidate_view(id, rect)?,
            ClientRequest::MoveWindow { dx, dy } => {
                self.move_by(dx, dy)?;
                outcome.geometry_changed = !self.is_visible_region_valid();
            }
            ClientRequest::ResizeWindow { dw, dh } => {
                self.resize_by(dw, dh)?;
                outcome.geometry_changed = !self.is_visible_region_valid();
            }
            ClientRequest::Redraw => self.redraw()?,
            ClientRequest::Quit => outcome.quit = true,
        }
        Ok(outcome)
    }

    /// Tells the client a view’s frame changed, if it asked to know.
    fn notify_frame_change(&self, id: ViewId, what: u32) -> Result<(), WindowError> {
        let view = match self.views().get(id) {
            Some(view) => view,
            None => return Ok(()),
        };
        if !view.flags().contains(ViewFlags::FRAME_EVENTS) {
            return Ok(());
        }
        let frame = view.frame();
        let message = Message::new(what)
            .with("x", frame.origin.x)
            .with("y", frame.origin.y)
            .with("width", frame.size.x)
            .with("height", frame.size.y);
        self.send_message_to_client(message, MessageTarget::View(id))
    }
}

/// A standalone window together with its request queue.
pub struct ServerWindow {
    window: Window,
    requests: Receiver<ClientRequest>,
}

impl ServerWindow {
    /// Wraps `window`, returning the sender clients use to reach it.
    pub fn new(window: Window) -> (ServerWindow, Sender<ClientRequest>) {
        let (sender, requests) = channel::unbounded();
        (ServerWindow { window, requests }, sender)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    /// Applies every queued request. Returns true once the client quit or went away.
    pub fn poll(&mut self) -> bool {
        loop {
            match self.requests.try_recv() {
                Ok(request) => {
                    if self.apply(request) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    debug!(window = %self.window.id(), "client disconnected");
                    return true;
                }
            }
        }
    }

    /// Applies requests until the client quits or disconnects, then closes the window.
    pub fn run(mut self) -> Window {
        while let Ok(request) = self.requests.recv() {
            if self.apply(request) {
                break;
            }
        }
        if let Err(err) = self
            .window
            .send_message_to_client(Message::new(QUIT_REQUESTED), MessageTarget::Window)
        {
            debug!(window = %self.window.id(), %err, "could not confirm quit");
        }
        self.window.close();
        self.window
    }

    fn apply(&mut self, request: ClientRequest) -> bool {
        match self.window.handle_request(request) {
            Ok(outcome) => outcome.quit,
            Err(err) => {
                warn!(window = %self.window.id(), %err, "request failed");
                false
            }
        }
    }
}
