//! Per-workspace window stacking order.
//!
//! A window list is an intrusive doubly linked list: the links live in the windows’ anchor
//! slots (one slot per list index), and the list itself only knows its two ends. The first
//! window is the one furthest back; the last is in front.

use crate::window::{WindowAnchor, WindowId, MAX_WORKSPACES};
use kite_core::contract::debugger;
use tracing::trace;

/// Storage for window anchors and workspace masks.
pub trait AnchorStore {
    fn anchor(&self, window: WindowId, index: usize) -> Option<&WindowAnchor>;
    fn anchor_mut(&mut self, window: WindowId, index: usize) -> Option<&mut WindowAnchor>;
    fn workspaces(&self, window: WindowId) -> u32;
    fn set_workspaces(&mut self, window: WindowId, workspaces: u32);
}

/// One stacking order, back to front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowList {
    index: usize,
    first: Option<WindowId>,
    last: Option<WindowId>,
}

impl WindowList {
    /// Creates an empty list using anchor slot `index`.
    pub fn new(index: usize) -> WindowList {
        WindowList {
            index,
            first: None,
            last: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The back-most window.
    pub fn first_window(&self) -> Option<WindowId> {
        self.first
    }

    /// The front-most window.
    pub fn last_window(&self) -> Option<WindowId> {
        self.last
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    fn is_workspace_list(&self) -> bool {
        self.index < MAX_WORKSPACES
    }

    /// Links `window` in front of all others, or right behind `before`.
    ///
    /// Adding a window that is already linked, or naming a `before` that is not in the list,
    /// breaks the calling contract and leaves the list unchanged.
    pub fn add_window<S: AnchorStore>(
        &mut self,
        store: &mut S,
        window: WindowId,
        before: Option<WindowId>,
    ) {
        if self.has_window(store, window) {
            debugger(format_args!(
                "add_window: {} is already in list {}",
                window, self.index
            ));
            return;
        }
        if store.anchor(window, self.index).is_none() {
            debugger(format_args!("add_window: unknown window {}", window));
            return;
        }
        if let Some(before) = before {
            if !self.has_window(store, before) {
                debugger(format_args!(
                    "add_window: {} is not in list {}",
                    before, self.index
                ));
                return;
            }
        }

        let index = self.index;
        let (previous, next) = match before {
            Some(before) => (
                store.anchor(before, index).and_then(|anchor| anchor.previous),
                Some(before),
            ),
            None => (self.last, None),
        };

        if let Some(anchor) = store.anchor_mut(window, index) {
            anchor.previous = previous;
            anchor.next = next;
        }
        match previous {
            Some(previous) => {
                if let Some(anchor) = store.anchor_mut(previous, index) {
                    anchor.next = Some(window);
                }
            }
            None => self.first = Some(window),
        }
        match next {
            Some(next) => {
                if let Some(anchor) = store.anchor_mut(next, index) {
                    anchor.previous = Some(window);
                }
            }
            None => self.last = Some(window),
        }

        if self.is_workspace_list() {
            let workspaces = store.workspaces(window) | 1 << index;
            store.set_workspaces(window, workspaces);
        }
        trace!(%window, list = index, "linked window");
    }

    /// Unlinks `window` and clears its anchor links.
    ///
    /// Removing a window that isn’t in the list breaks the calling contract and does nothing.
    pub fn remove_window<S: AnchorStore>(&mut self, store: &mut S, window: WindowId) {
        if !self.has_window(store, window) {
            debugger(format_args!(
                "remove_window: {} is not in list {}",
                window, self.index
            ));
            return;
        }

        let index = self.index;
        let (previous, next) = match store.anchor_mut(window, index) {
            Some(anchor) => {
                let links = (anchor.previous, anchor.next);
                anchor.previous = None;
                anchor.next = None;
                links
            }
            None => return,
        };

        match previous {
            Some(previous) => {
                if let Some(anchor) = store.anchor_mut(previous, index) {
                    anchor.next = next;
                }
            }
            None => self.first = next,
        }
        match next {
            Some(next) => {
                if let Some(anchor) = store.anchor_mut(next, index) {
                    anchor.previous = previous;
                }
            }
            None => self.last = previous,
        }

        if self.is_workspace_list() {
            let workspaces = store.workspaces(window) & !(1 << index);
            store.set_workspaces(window, workspaces);
        }
        trace!(%window, list = index, "unlinked window");
    }

    /// Returns true if `window` is linked into this list.
    ///
    /// A lone window has no links, so it is recognized by being both ends of the list.
    pub fn has_window<S: AnchorStore>(&self, store: &S, window: WindowId) -> bool {
        match store.anchor(window, self.index) {
            Some(anchor) => {
                anchor.next.is_some()
                    || anchor.previous.is_some()
                    || self.first == Some(window)
                    || self.last == Some(window)
            }
            None => false,
        }
    }

    /// Like [`has_window`](Self::has_window), but walks the list.
    pub fn validate_window<S: AnchorStore>(&self, store: &S, window: WindowId) -> bool {
        self.iter(store).any(|id| id == window)
    }

    pub fn count<S: AnchorStore>(&self, store: &S) -> usize {
        self.iter(store).count()
    }

    /// Iterates back to front.
    pub fn iter<'a, S: AnchorStore>(&self, store: &'a S) -> Iter<'a, S> {
        Iter {
            store,
            index: self.index,
            next: self.first,
            forward: true,
        }
    }

    /// Iterates front to back.
    pub fn iter_rev<'a, S: AnchorStore>(&self, store: &'a S) -> Iter<'a, S> {
        Iter {
            store,
            index: self.index,
            next: self.last,
            forward: false,
        }
    }
}

/// Iterator over the windows of a [`WindowList`].
pub struct Iter<'a, S> {
    store: &'a S,
    index: usize,
    next: Option<WindowId>,
    forward: bool,
}

impl<'a, S: AnchorStore> Iterator for Iter<'a, S> {
    type Item = WindowId;

    fn next(&mut self) -> Option<WindowId> {
        let id = self.next?;
        self.next = self.store.anchor(id, self.index).and_then(|anchor| {
            if self.forward {
                anchor.next
            } else {
                anchor.previous
            }
        });
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::LIST_COUNT;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Store {
        windows: HashMap<WindowId, ([WindowAnchor; LIST_COUNT], u32)>,
    }

    impl Store {
        fn window(&mut self) -> WindowId {
            let id = WindowId::new();
            self.windows.insert(id, ([WindowAnchor::EMPTY; LIST_COUNT], 0));
            id
        }
    }

    impl AnchorStore for Store {
        fn anchor(&self, window: WindowId, index: usize) -> Option<&WindowAnchor> {
            self.windows.get(&window).map(|(anchors, _)| &anchors[index])
        }

        fn anchor_mut(&mut self, window: WindowId, index: usize) -> Option<&mut WindowAnchor> {
            self.windows.get_mut(&window).map(|(anchors, _)| &mut anchors[index])
        }

        fn workspaces(&self, window: WindowId) -> u32 {
            self.windows.get(&window).map_or(0, |(_, workspaces)| *workspaces)
        }

        fn set_workspaces(&mut self, window: WindowId, workspaces: u32) {
            if let Some((_, mask)) = self.windows.get_mut(&window) {
                *mask = workspaces;
            }
        }
    }

    fn forward(list: &WindowList, store: &Store) -> Vec<WindowId> {
        list.iter(store).collect()
    }

    fn backward(list: &WindowList, store: &Store) -> Vec<WindowId> {
        list.iter_rev(store).collect()
    }

    #[test]
    fn test_insert_before() {
        let mut store = Store::default();
        let mut list = WindowList::new(3);
        let (a, b, c) = (store.window(), store.window(), store.window());
        list.add_window(&mut store, a, None);
        list.add_window(&mut store, b, None);
        list.add_window(&mut store, c, Some(b));

        assert_eq!(forward(&list, &store), vec![a, c, b]);
        assert_eq!(backward(&list, &store), vec![b, c, a]);
        assert_eq!(list.first_window(), Some(a));
        assert_eq!(list.last_window(), Some(b));
        assert_eq!(store.workspaces(c), 1 << 3);
    }

    #[test]
    fn test_lone_window() {
        let mut store = Store::default();
        let mut list = WindowList::new(0);
        let a = store.window();
        let other = store.window();
        assert!(!list.has_window(&store, a));

        list.add_window(&mut store, a, None);
        assert_eq!(store.anchor(a, 0), Some(&WindowAnchor::EMPTY));
        assert!(list.has_window(&store, a));
        assert!(!list.has_window(&store, other));
        assert_eq!(list.count(&store), 1);

        list.remove_window(&mut store, a);
        assert!(!list.has_window(&store, a));
        assert!(list.is_empty());
        assert_eq!(store.workspaces(a), 0);
    }

    #[test]
    fn test_add_then_remove_restores_list() {
        for position in 0..3 {
            let mut store = Store::default();
            let mut list = WindowList::new(5);
            let ids: Vec<_> = (0..3).map(|_| store.window()).collect();
            for &id in &ids {
                list.add_window(&mut store, id, None);
            }
            let before = list.clone();
            let forward_before = forward(&list, &store);

            let extra = store.window();
            let target = match position {
                0 => None,
                1 => Some(ids[0]),
                _ => Some(ids[1]),
            };
            list.add_window(&mut store, extra, target);
            assert!(list.has_window(&store, extra));
            assert!(list.validate_window(&store, extra));
            assert_eq!(list.count(&store), 4);

            list.remove_window(&mut store, extra);
            assert!(!list.has_window(&store, extra));
            assert!(!list.validate_window(&store, extra));
            assert_eq!(list, before);
            assert_eq!(forward(&list, &store), forward_before);
            assert_eq!(store.anchor(extra, 5), Some(&WindowAnchor::EMPTY));
            assert_eq!(store.workspaces(extra), 0);
        }
    }

    #[test]
    fn test_traversals_mirror_each_other() {
        for size in [0, 1, 7] {
            let mut store = Store::default();
            let mut list = WindowList::new(1);
            for _ in 0..size {
                let id = store.window();
                list.add_window(&mut store, id, None);
            }
            let mut reversed = backward(&list, &store);
            reversed.reverse();
            assert_eq!(forward(&list, &store), reversed);
            assert_eq!(list.count(&store), size);
        }
    }

    #[test]
    fn test_non_workspace_lists_leave_mask_alone() {
        let mut store = Store::default();
        let mut list = WindowList::new(MAX_WORKSPACES);
        let a = store.window();
        list.add_window(&mut store, a, None);
        assert!(list.has_window(&store, a));
        assert_eq!(store.workspaces(a), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_double_add_traps() {
        let mut store = Store::default();
        let mut list = WindowList::new(0);
        let a = store.window();
        list.add_window(&mut store, a, None);
        list.add_window(&mut store, a, None);
    }
}
