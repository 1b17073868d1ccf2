//! The desktop: every window on one screen, and the workspaces they are on.

use crate::drawing_engine::DrawingEngine;
use crate::error::WindowError;
use crate::hw_interface::HWInterface;
use crate::message::{
    client_port, Envelope, Message, MessageTarget, WINDOW_ACTIVATED, WINDOW_MOVED,
    WINDOW_RESIZED, WORKSPACES_CHANGED, WORKSPACE_ACTIVATED,
};
use crate::server_window::ClientRequest;
use crate::settings::DesktopSettings;
use crate::window::{
    Window, WindowAnchor, WindowId, ALL_WINDOWS_LIST, FOCUS_LIST, LIST_COUNT, MAX_WORKSPACES,
};
use crate::window_list::{AnchorStore, WindowList};
use cgmath::Point2;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use kite_core::{Rect, Region};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Owns the windows; window lists link them through their anchors.
#[derive(Debug, Default)]
pub struct WindowArena {
    windows: HashMap<WindowId, Window>,
}

impl WindowArena {
    pub fn new() -> WindowArena {
        WindowArena::default()
    }

    pub fn insert(&mut self, window: Window) -> WindowId {
        let id = window.id();
        self.windows.insert(id, window);
        id
    }

    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        self.windows.remove(&id)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Window> {
        self.windows.values_mut()
    }
}

impl AnchorStore for WindowArena {
    fn anchor(&self, window: WindowId, index: usize) -> Option<&WindowAnchor> {
        self.windows.get(&window).and_then(|w| w.anchors.get(index))
    }

    fn anchor_mut(&mut self, window: WindowId, index: usize) -> Option<&mut WindowAnchor> {
        self.windows
            .get_mut(&window)
            .and_then(|w| w.anchors.get_mut(index))
    }

    fn workspaces(&self, window: WindowId) -> u32 {
        self.windows.get(&window).map_or(0, |w| w.workspaces)
    }

    fn set_workspaces(&mut self, window: WindowId, workspaces: u32) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.workspaces = workspaces;
        }
    }
}

/// The client’s side of a new window.
#[derive(Debug)]
pub struct ClientConnection {
    pub window: WindowId,
    pub requests: Sender<ClientRequest>,
    pub events: Receiver<Envelope>,
}

/// Composites windows onto the screen.
///
/// All window state is owned here and serviced from one thread: requests are drained by
/// [`poll`](Self::poll), clipping is recomputed after anything moves, and
/// [`redraw`](Self::redraw) pushes pixels.
pub struct Desktop {
    settings: DesktopSettings,
    screen: Arc<dyn HWInterface>,
    engine: DrawingEngine,
    windows: WindowArena,
    lists: Vec<WindowList>,
    current_workspace: usize,
    background_region: Region,
    requests: Vec<(WindowId, Receiver<ClientRequest>)>,
}

impl Desktop {
    /// Creates an empty desktop on `screen`, initializing it.
    pub fn new(
        settings: DesktopSettings,
        screen: Arc<dyn HWInterface>,
    ) -> Result<Desktop, WindowError> {
        let mut settings = settings;
        if settings.validate().is_err() {
            warn!(
                count = settings.workspace_count,
                "invalid workspace count, clamping"
            );
            settings.workspace_count = settings.workspace_count.clamp(1, MAX_WORKSPACES);
        }
        screen.initialize()?;
        let background_region = Region::from_rect(screen.frame());
        debug!(frame = ?screen.frame(), workspaces = settings.workspace_count, "desktop ready");

        Ok(Desktop {
            settings,
            engine: DrawingEngine::new(Some(Arc::clone(&screen))),
            screen,
            windows: WindowArena::new(),
            lists: (0..LIST_COUNT).map(WindowList::new).collect(),
            current_workspace: 0,
            background_region,
            requests: Vec::new(),
        })
    }

    pub fn settings(&self) -> &DesktopSettings {
        &self.settings
    }

    pub fn screen(&self) -> &Arc<dyn HWInterface> {
        &self.screen
    }

    pub fn current_workspace(&self) -> usize {
        self.current_workspace
    }

    /// What no window covers on the current workspace.
    pub fn background_region(&self) -> &Region {
        &self.background_region
    }

    pub fn workspace_list(&self, index: usize) -> Option<&WindowList> {
        if index < self.settings.workspace_count {
            self.lists.get(index)
        } else {
            None
        }
    }

    /// The list of every window on the desktop.
    pub fn all_windows(&self) -> &WindowList {
        &self.lists[ALL_WINDOWS_LIST]
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    pub fn windows(&self) -> &WindowArena {
        &self.windows
    }

    fn workspace_mask(&self) -> u32 {
        if self.settings.workspace_count >= 32 {
            u32::MAX
        } else {
            (1 << self.settings.workspace_count) - 1
        }
    }

    fn notify(&self, id: WindowId, message: Message) {
        if let Some(window) = self.windows.get(id) {
            if let Err(err) = window.send_message_to_client(message, MessageTarget::Window) {
                debug!(window = %id, %err, "could not notify client");
            }
        }
    }

    /// Creates a live window on `workspaces` and returns the client’s end of it.
    pub fn create_window(
        &mut self,
        title: &str,
        frame: Rect,
        workspaces: u32,
    ) -> ClientConnection {
        let (port, events) = client_port();
        let window = Window::new(title, frame, port, Arc::clone(&self.screen), &self.settings);
        let (requests, receiver) = channel::unbounded();
        let id = self.add_window(window, workspaces);
        self.requests.push((id, receiver));
        ClientConnection {
            window: id,
            requests,
            events,
        }
    }

    /// Takes ownership of `window` and puts it on `workspaces` (in front).
    ///
    /// Offscreen windows are only kept in the list of all windows; they never take part in
    /// compositing.
    pub fn add_window(&mut self, window: Window, workspaces: u32) -> WindowId {
        let offscreen = window.is_offscreen();
        let id = self.windows.insert(window);
        self.lists[ALL_WINDOWS_LIST].add_window(&mut self.windows, id, None);
        if offscreen {
            debug!(window = %id, "offscreen window added");
            return id;
        }

        let workspaces = workspaces & self.workspace_mask();
        for index in 0..self.settings.workspace_count {
            if workspaces & 1 << index != 0 {
                self.lists[index].add_window(&mut self.windows, id, None);
            }
        }
        debug!(window = %id, workspaces, "window added");
        self.rebuild_clipping();
        id
    }

    /// Unlinks a window from every list and hands it back.
    pub fn remove_window(&mut self, id: WindowId) -> Result<Window, WindowError> {
        if self.windows.get(id).is_none() {
            return Err(WindowError::NoSuchWindow(id));
        }
        for list in &mut self.lists {
            if list.has_window(&self.windows, id) {
                list.remove_window(&mut self.windows, id);
            }
        }
        self.requests.retain(|(window, _)| *window != id);
        let window = self.windows.remove(id).ok_or(WindowError::NoSuchWindow(id))?;
        debug!(window = %id, "window removed");
        self.rebuild_clipping();
        Ok(window)
    }

    /// Moves a window onto exactly the workspaces in `workspaces`.
    pub fn set_window_workspaces(
        &mut self,
        id: WindowId,
        workspaces: u32,
    ) -> Result<(), WindowError> {
        let window = self.windows.get(id).ok_or(WindowError::NoSuchWindow(id))?;
        if window.is_offscreen() {
            return Ok(());
        }
        let old = window.workspaces();
        let new = workspaces & self.workspace_mask();
        if old == new {
            return Ok(());
        }

        for index in 0..self.settings.workspace_count {
            let wanted = new & 1 << index != 0;
            let present = self.lists[index].has_window(&self.windows, id);
            if wanted && !present {
                self.lists[index].add_window(&mut self.windows, id, None);
            } else if !wanted && present {
                self.lists[index].remove_window(&mut self.windows, id);
            }
        }

        self.notify(
            id,
            Message::new(WORKSPACES_CHANGED)
                .with("old", old)
                .with("new", new),
        );
        if (old ^ new) & 1 << self.current_workspace != 0 {
            self.rebuild_clipping();
        }
        Ok(())
    }

    /// Switches to another workspace.
    ///
    /// Window positions are remembered per workspace: windows on the new workspace go back to
    /// where they were the last time it was shown.
    pub fn set_workspace(&mut self, index: usize) -> Result<(), WindowError> {
        if index >= self.settings.workspace_count {
            return Err(WindowError::NoSuchWorkspace(index));
        }
        let previous = self.current_workspace;
        if index == previous {
            return Ok(());
        }

        let leaving: Vec<_> = self.lists[previous].iter(&self.windows).collect();
        for &id in &leaving {
            if let Some(window) = self.windows.get_mut(id) {
                window.anchors[previous].position = Some(window.frame().origin);
            }
        }

        self.current_workspace = index;
        let entering: Vec<_> = self.lists[index].iter(&self.windows).collect();
        for &id in &entering {
            if let Some(window) = self.windows.get_mut(id) {
                let origin = window.frame().origin;
                match window.anchors[index].position {
                    Some(position) if position != origin => {
                        window.move_by(position.x - origin.x, position.y - origin.y)?;
                    }
                    Some(_) => {}
                    None => window.anchors[index].position = Some(origin),
                }
            }
        }

        for &id in leaving.iter().chain(&entering) {
            let active = entering.contains(&id);
            self.notify(
                id,
                Message::new(WORKSPACE_ACTIVATED)
                    .with("workspace", index as u64)
                    .with("active", active),
            );
        }
        debug!(from = previous, to = index, "switched workspace");
        self.rebuild_clipping();
        Ok(())
    }

    /// Brings a window to the front of the current workspace and gives it focus.
    pub fn activate_window(&mut self, id: WindowId) -> Result<(), WindowError> {
        if self.windows.get(id).is_none() {
            return Err(WindowError::NoSuchWindow(id));
        }
        let current = self.current_workspace;
        if self.lists[current].has_window(&self.windows, id)
            && self.lists[current].last_window() != Some(id)
        {
            self.lists[current].remove_window(&mut self.windows, id);
            self.lists[current].add_window(&mut self.windows, id, None);
            self.rebuild_clipping();
        }

        let focus = &mut self.lists[FOCUS_LIST];
        if focus.last_window() != Some(id) {
            if focus.has_window(&self.windows, id) {
                focus.remove_window(&mut self.windows, id);
            }
            focus.add_window(&mut self.windows, id, None);
        }

        self.notify(id, Message::new(WINDOW_ACTIVATED).with("active", true));
        Ok(())
    }

    /// Puts a window right behind `behind`, or at the very back.
    pub fn send_behind(
        &mut self,
        id: WindowId,
        behind: Option<WindowId>,
    ) -> Result<(), WindowError> {
        if self.windows.get(id).is_none() {
            return Err(WindowError::NoSuchWindow(id));
        }
        if behind == Some(id) {
            return Ok(());
        }
        let list = &mut self.lists[self.current_workspace];
        if !list.has_window(&self.windows, id) {
            return Err(WindowError::NoSuchWindow(id));
        }
        if let Some(behind) = behind {
            if !list.has_window(&self.windows, behind) {
                return Err(WindowError::NoSuchWindow(behind));
            }
        }

        list.remove_window(&mut self.windows, id);
        let before = behind.or_else(|| list.first_window());
        list.add_window(&mut self.windows, id, before);
        self.rebuild_clipping();
        Ok(())
    }

    pub fn show_window(&mut self, id: WindowId) -> Result<(), WindowError> {
        self.set_window_hidden(id, false)
    }

    pub fn hide_window(&mut self, id: WindowId) -> Result<(), WindowError> {
        self.set_window_hidden(id, true)
    }

    fn set_window_hidden(&mut self, id: WindowId, hidden: bool) -> Result<(), WindowError> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or(WindowError::NoSuchWindow(id))?;
        if window.hidden != hidden {
            window.hidden = hidden;
            self.rebuild_clipping();
        }
        Ok(())
    }

    pub fn move_window(&mut self, id: WindowId, dx: f64, dy: f64) -> Result<(), WindowError> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or(WindowError::NoSuchWindow(id))?;
        window.move_by(dx, dy)?;
        let origin = window.frame().origin;
        self.notify(
            id,
            Message::new(WINDOW_MOVED)
                .with("x", origin.x)
                .with("y", origin.y),
        );
        self.rebuild_clipping();
        Ok(())
    }

    pub fn resize_window(&mut self, id: WindowId, dw: f64, dh: f64) -> Result<(), WindowError> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or(WindowError::NoSuchWindow(id))?;
        window.resize_by(dw, dh)?;
        let size = window.frame().size;
        self.notify(
            id,
            Message::new(WINDOW_RESIZED)
                .with("width", size.x)
                .with("height", size.y),
        );
        self.rebuild_clipping();
        Ok(())
    }

    /// The front-most window showing `point` on the current workspace.
    pub fn window_at(&self, point: Point2<f64>) -> Option<WindowId> {
        let (x, y) = (point.x.floor() as i32, point.y.floor() as i32);
        self.lists[self.current_workspace]
            .iter_rev(&self.windows)
            .find(|&id| {
                self.windows
                    .get(id)
                    .map_or(false, |window| window.visible_region().contains(x, y))
            })
    }

    /// Hands out screen area front to back on the current workspace.
    pub fn rebuild_clipping(&mut self) {
        let mut available = Region::from_rect(self.screen.frame());
        let current = self.current_workspace;
        let order: Vec<_> = self.lists[current].iter_rev(&self.windows).collect();
        for id in order {
            if let Some(window) = self.windows.get_mut(id) {
                window.set_clipping(&available);
                available.exclude(window.visible_region());
            }
        }

        let nothing = Region::new();
        for window in self.windows.iter_mut() {
            if !window.is_offscreen() && !window.is_on_workspace(current) {
                window.set_clipping(&nothing);
            }
        }

        trace!(background = available.count_rects(), "rebuilt clipping");
        self.background_region = available;
    }

    /// Paints the background, then every window on the current workspace back to front.
    pub fn redraw(&mut self) {
        self.engine
            .fill_region(&self.background_region, self.settings.desktop_color);
        let order: Vec<_> = self.lists[self.current_workspace]
            .iter(&self.windows)
            .collect();
        for id in order {
            if let Some(window) = self.windows.get_mut(id) {
                if let Err(err) = window.redraw() {
                    warn!(window = %id, %err, "redraw failed");
                }
            }
        }
    }

    /// Applies all pending client requests. Returns the number of requests handled.
    ///
    /// Clipping is rebuilt as soon as a request changes a window's geometry, so requests
    /// handled after it draw within the new visible regions. Windows whose client quit or
    /// went away are removed and closed.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        let queues: Vec<_> = self
            .requests
            .iter()
            .map(|(id, requests)| (*id, requests.clone()))
            .collect();

        for (id, requests) in queues {
            let finished = loop {
                let request = match requests.try_recv() {
                    Ok(request) => request,
                    Err(TryRecvError::Empty) => break false,
                    Err(TryRecvError::Disconnected) => {
                        debug!(window = %id, "client disconnected");
                        break true;
                    }
                };
                let window = match self.windows.get_mut(id) {
                    Some(window) => window,
                    None => break false,
                };
                handled += 1;
                match window.handle_request(request) {
                    Ok(outcome) => {
                        if outcome.geometry_changed {
                            self.rebuild_clipping();
                        }
                        if outcome.quit {
                            break true;
                        }
                    }
                    Err(err) => warn!(window = %id, %err, "request failed"),
                }
            };

            if finished {
                if let Ok(mut window) = self.remove_window(id) {
                    window.close();
                }
            }
        }
        handled
    }

    /// Closes every window, then shuts the screen down.
    pub fn shutdown(&mut self) {
        for window in self.windows.iter_mut() {
            window.close();
        }
        self.engine.set_hw_interface(None);
        let screen = Arc::clone(&self.screen);
        let mut access = screen.lock_exclusive_access();
        screen.shutdown(&mut access);
        debug!("desktop shut down");
    }
}
