use crate::color::Color;
use crate::contract::debugger;
use crate::draw_state::DrawStateStack;
use crate::error::ViewError;
use crate::rect::Rect;
use crate::region::Region;
use crate::view::{EventMask, EventOptions, View, ViewFlags, ViewId};
use cgmath::{Point2, Vector2};
use std::collections::HashMap;
use tracing::trace;

/// The views of one window.
///
/// Views live in an arena keyed by [`ViewId`]; parent, child and sibling links are plain ids.
/// The tree always has a top view whose frame is in screen coordinates. Views created but not
/// yet added to a parent are *detached*: they stay in the arena but are never visible.
#[derive(Debug)]
pub struct ViewTree {
    nodes: HashMap<ViewId, View>,
    root: ViewId,
    clipping_valid: bool,
}

/// Iterator over the children of a view, in drawing order.
pub struct Children<'a> {
    tree: &'a ViewTree,
    next: Option<ViewId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = ViewId;

    fn next(&mut self) -> Option<ViewId> {
        let id = self.next?;
        self.next = self.tree.nodes.get(&id).and_then(|node| node.next_sibling);
        Some(id)
    }
}

impl ViewTree {
    /// Creates a tree with a top view covering `frame` (in screen coordinates).
    pub fn new(frame: Rect) -> ViewTree {
        ViewTree::with_top_view_color(frame, Color::PANEL)
    }

    /// Creates a tree whose top view is filled with `color`.
    pub fn with_top_view_color(frame: Rect, color: Color) -> ViewTree {
        let root = ViewId::new();
        let mut top_view = View::new(root, "top view", frame, ViewFlags::empty());
        top_view.visible = true;
        top_view.view_color = color;

        let mut nodes = HashMap::new();
        nodes.insert(root, top_view);

        ViewTree {
            nodes,
            root,
            clipping_valid: false,
        }
    }

    /// The top view.
    pub fn root(&self) -> ViewId {
        self.root
    }

    pub fn get(&self, id: ViewId) -> Option<&View> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of views in the arena, attached or not.
    pub fn count_views(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: ViewId) -> Result<&View, ViewError> {
        self.nodes.get(&id).ok_or(ViewError::NoSuchView(id))
    }

    fn node_mut(&mut self, id: ViewId) -> Result<&mut View, ViewError> {
        self.nodes.get_mut(&id).ok_or(ViewError::NoSuchView(id))
    }

    /// Creates a detached view.
    pub fn create_view(&mut self, name: &str, frame: Rect, flags: ViewFlags) -> ViewId {
        let id = ViewId::new();
        self.nodes.insert(id, View::new(id, name, frame, flags));
        id
    }

    /// Creates a detached view with an id chosen by the caller.
    pub fn create_view_with_id(
        &mut self,
        id: ViewId,
        name: &str,
        frame: Rect,
        flags: ViewFlags,
    ) -> Result<(), ViewError> {
        if self.nodes.contains_key(&id) {
            return Err(ViewError::AlreadyExists(id));
        }
        self.nodes.insert(id, View::new(id, name, frame, flags));
        Ok(())
    }

    /// Removes a detached view and all of its descendants from the arena.
    pub fn destroy_view(&mut self, id: ViewId) -> Result<(), ViewError> {
        if id == self.root {
            return Err(ViewError::TopView);
        }
        if self.node(id)?.parent.is_some() {
            return Err(ViewError::AlreadyAttached(id));
        }
        for view in self.preorder_from(id) {
            self.nodes.remove(&view);
        }
        Ok(())
    }

    /// Returns true if `ancestor` is a (strict) ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = self.nodes.get(&id).and_then(|node| node.parent);
        while let Some(view) = current {
            if view == ancestor {
                return true;
            }
            current = self.nodes.get(&view).and_then(|node| node.parent);
        }
        false
    }

    /// Iterates over the children of `id`, back to front.
    pub fn children(&self, id: ViewId) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes.get(&id).and_then(|node| node.first_child),
        }
    }

    pub fn count_children(&self, id: ViewId) -> usize {
        self.children(id).count()
    }

    /// All attached views in drawing order (parents before children, back to front).
    pub fn preorder(&self) -> Vec<ViewId> {
        self.preorder_from(self.root)
    }

    fn preorder_from(&self, id: ViewId) -> Vec<ViewId> {
        let mut order = Vec::new();
        let mut pending = vec![id];
        while let Some(view) = pending.pop() {
            order.push(view);
            let first = pending.len();
            pending.extend(self.children(view));
            pending[first..].reverse();
        }
        order
    }

    /// Adds `child` to `parent`, at the end or right before the sibling `before`.
    ///
    /// The area the child newly covers on screen is added to `dirty`.
    pub fn add_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        before: Option<ViewId>,
        dirty: &mut Region,
    ) -> Result<(), ViewError> {
        self.node(parent)?;
        if child == self.root {
            return Err(ViewError::TopView);
        }
        if self.node(child)?.parent.is_some() {
            return Err(ViewError::AlreadyAttached(child));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(ViewError::Cycle { parent, child });
        }
        if let Some(before) = before {
            if self.node(before)?.parent != Some(parent) {
                debugger(format_args!(
                    "add_child: {} is not a child of {}",
                    before, parent
                ));
                return Err(ViewError::NotAChild {
                    parent,
                    child: before,
                });
            }
        }

        match before {
            Some(before) => {
                let previous = self.node(before)?.previous_sibling;
                {
                    let node = self.node_mut(child)?;
                    node.next_sibling = Some(before);
                    node.previous_sibling = previous;
                }
                self.node_mut(before)?.previous_sibling = Some(child);
                match previous {
                    Some(previous) => self.node_mut(previous)?.next_sibling = Some(child),
                    None => self.node_mut(parent)?.first_child = Some(child),
                }
            }
            None => {
                let last = self.node(parent)?.last_child;
                {
                    let node = self.node_mut(child)?;
                    node.previous_sibling = last;
                    node.next_sibling = None;
                }
                match last {
                    Some(last) => self.node_mut(last)?.next_sibling = Some(child),
                    None => self.node_mut(parent)?.first_child = Some(child),
                }
                self.node_mut(parent)?.last_child = Some(child);
            }
        }

        self.node_mut(child)?.parent = Some(parent);
        let parent_visible = {
            let node = self.node_mut(parent)?;
            node.background_dirty = true;
            node.visible
        };
        self.update_visibility(child, parent_visible);
        self.mark_background_dirty_deep(child);
        self.clipping_valid = false;

        if self.node(child)?.visible {
            dirty.include(&self.exposed_area(child)?);
        }
        trace!(%parent, %child, "added child view");
        Ok(())
    }

    /// Unlinks `child` from `parent`. The child’s subtree stays in the arena, detached.
    ///
    /// The area the child covered on screen is added to `dirty`.
    pub fn remove_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        dirty: &mut Region,
    ) -> Result<(), ViewError> {
        if child == self.root {
            return Err(ViewError::TopView);
        }
        let node = self.node(child)?;
        if node.parent != Some(parent) {
            debugger(format_args!(
                "remove_child: {} is not a child of {}",
                child, parent
            ));
            return Err(ViewError::NotAChild { parent, child });
        }
        let (previous, next, was_visible) =
            (node.previous_sibling, node.next_sibling, node.visible);
        if was_visible {
            dirty.include(&self.exposed_area(child)?);
        }

        match previous {
            Some(previous) => self.node_mut(previous)?.next_sibling = next,
            None => self.node_mut(parent)?.first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next)?.previous_sibling = previous,
            None => self.node_mut(parent)?.last_child = previous,
        }
        {
            let node = self.node_mut(child)?;
            node.parent = None;
            node.next_sibling = None;
            node.previous_sibling = None;
        }

        self.node_mut(parent)?.background_dirty = true;
        self.update_visibility(child, false);
        self.clipping_valid = false;
        trace!(%parent, %child, "removed child view");
        Ok(())
    }

    fn parent_visible(&self, id: ViewId) -> bool {
        if id == self.root {
            return true;
        }
        self.nodes
            .get(&id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.nodes.get(&parent))
            .map_or(false, |parent| parent.visible)
    }

    /// Recomputes the effective visibility of a subtree without touching `hidden` flags.
    fn update_visibility(&mut self, id: ViewId, parent_visible: bool) {
        let mut pending = vec![(id, parent_visible)];
        while let Some((view, parent_visible)) = pending.pop() {
            let visible = match self.nodes.get_mut(&view) {
                Some(node) => {
                    node.visible = parent_visible && !node.hidden;
                    node.visible
                }
                None => continue,
            };
            pending.extend(self.children(view).map(|child| (child, visible)));
        }
    }

    fn mark_background_dirty_deep(&mut self, id: ViewId) {
        for view in self.preorder_from(id) {
            if let Some(node) = self.nodes.get_mut(&view) {
                node.background_dirty = true;
            }
        }
    }

    /// Hides or shows a view. Descendants become implicitly hidden or visible; their own
    /// `hidden` flags are left alone.
    pub fn set_hidden(
        &mut self,
        id: ViewId,
        hidden: bool,
        dirty: &mut Region,
    ) -> Result<(), ViewError> {
        let node = self.node(id)?;
        if node.hidden == hidden {
            return Ok(());
        }
        if node.visible {
            dirty.include(&self.exposed_area(id)?);
        }

        self.node_mut(id)?.hidden = hidden;
        let parent_visible = self.parent_visible(id);
        self.update_visibility(id, parent_visible);
        self.clipping_valid = false;

        if self.node(id)?.visible {
            self.mark_background_dirty_deep(id);
            dirty.include(&self.exposed_area(id)?);
        }
        Ok(())
    }

    pub fn is_hidden(&self, id: ViewId) -> Result<bool, ViewError> {
        Ok(self.node(id)?.hidden)
    }

    pub fn is_visible(&self, id: ViewId) -> Result<bool, ViewError> {
        Ok(self.node(id)?.visible)
    }

    pub fn convert_to_parent(
        &self,
        id: ViewId,
        point: Point2<f64>,
    ) -> Result<Point2<f64>, ViewError> {
        Ok(self.node(id)?.to_parent(point))
    }

    pub fn convert_from_parent(
        &self,
        id: ViewId,
        point: Point2<f64>,
    ) -> Result<Point2<f64>, ViewError> {
        Ok(self.node(id)?.from_parent(point))
    }

    /// Converts a point in the view’s coordinates to screen coordinates.
    pub fn convert_to_screen(
        &self,
        id: ViewId,
        point: Point2<f64>,
    ) -> Result<Point2<f64>, ViewError> {
        let mut point = point;
        let mut current = Some(id);
        while let Some(view) = current {
            let node = self.node(view)?;
            point = node.to_parent(point);
            current = node.parent;
        }
        Ok(point)
    }

    /// Converts a point in screen coordinates to the view’s coordinates.
    pub fn convert_from_screen(
        &self,
        id: ViewId,
        point: Point2<f64>,
    ) -> Result<Point2<f64>, ViewError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(view) = current {
            let node = self.node(view)?;
            chain.push(node);
            current = node.parent;
        }
        Ok(chain
            .iter()
            .rev()
            .fold(point, |point, node| node.from_parent(point)))
    }

    pub fn convert_rect_to_screen(&self, id: ViewId, rect: Rect) -> Result<Rect, ViewError> {
        Ok(rect.with_origin(self.convert_to_screen(id, rect.origin)?))
    }

    pub fn convert_rect_from_screen(&self, id: ViewId, rect: Rect) -> Result<Rect, ViewError> {
        Ok(rect.with_origin(self.convert_from_screen(id, rect.origin)?))
    }

    /// The view’s frame in screen coordinates.
    pub fn screen_frame(&self, id: ViewId) -> Result<Rect, ViewError> {
        let node = self.node(id)?;
        match node.parent {
            Some(parent) => self.convert_rect_to_screen(parent, node.frame),
            None => Ok(node.frame),
        }
    }

    /// The view’s screen frame cut to the screen frames of all of its ancestors.
    ///
    /// Unlike the clipping, this ignores siblings and children.
    pub fn exposed_area(&self, id: ViewId) -> Result<Region, ViewError> {
        let mut area = Region::from_rect(self.screen_frame(id)?.to_clip_rect());
        let mut current = self.node(id)?.parent;
        while let Some(view) = current {
            if area.is_empty() {
                break;
            }
            area.intersect_with_rect(self.screen_frame(view)?.to_clip_rect());
            current = self.node(view)?.parent;
        }
        Ok(area)
    }

    /// Moves a view within its parent.
    pub fn move_by(
        &mut self,
        id: ViewId,
        dx: f64,
        dy: f64,
        dirty: &mut Region,
    ) -> Result<(), ViewError> {
        if dx == 0. && dy == 0. {
            return Ok(());
        }
        let visible = self.node(id)?.visible;
        if visible {
            dirty.include(&self.exposed_area(id)?);
        }
        {
            let node = self.node_mut(id)?;
            node.frame = node.frame + Vector2::new(dx, dy);
        }
        if visible {
            dirty.include(&self.exposed_area(id)?);
        }
        self.clipping_valid = false;
        Ok(())
    }

    /// Resizes a view; sizes never drop below zero.
    ///
    /// Views with [`ViewFlags::FULL_UPDATE_ON_RESIZE`] are repainted entirely; otherwise only
    /// the area gained or lost is dirtied.
    pub fn resize_by(
        &mut self,
        id: ViewId,
        dw: f64,
        dh: f64,
        dirty: &mut Region,
    ) -> Result<(), ViewError> {
        if dw == 0. && dh == 0. {
            return Ok(());
        }
        let old_area = self.exposed_area(id)?;
        let (visible, full_update) = {
            let node = self.node_mut(id)?;
            node.frame.size.x = (node.frame.size.x + dw).max(0.);
            node.frame.size.y = (node.frame.size.y + dh).max(0.);
            let full_update = node.flags.contains(ViewFlags::FULL_UPDATE_ON_RESIZE);
            if full_update {
                node.background_dirty = true;
            }
            (node.visible, full_update)
        };
        if visible {
            let new_area = self.exposed_area(id)?;
            if full_update {
                dirty.include(&old_area);
                dirty.include(&new_area);
            } else {
                dirty.include(&(&new_area - &old_area));
                dirty.include(&(&old_area - &new_area));
            }
        }
        self.clipping_valid = false;
        Ok(())
    }

    /// Shifts the view’s coordinate space; everything it shows moves.
    pub fn scroll_by(
        &mut self,
        id: ViewId,
        dx: f64,
        dy: f64,
        dirty: &mut Region,
    ) -> Result<(), ViewError> {
        if dx == 0. && dy == 0. {
            return Ok(());
        }
        let visible = {
            let node = self.node_mut(id)?;
            node.scroll_offset += Vector2::new(dx, dy);
            node.visible
        };
        if visible {
            self.mark_background_dirty_deep(id);
            dirty.include(&self.exposed_area(id)?);
        }
        self.clipping_valid = false;
        Ok(())
    }

    pub fn set_view_color(&mut self, id: ViewId, color: Color) -> Result<(), ViewError> {
        let node = self.node_mut(id)?;
        if node.view_color != color {
            node.view_color = color;
            node.background_dirty = true;
        }
        Ok(())
    }

    pub fn set_flags(&mut self, id: ViewId, flags: ViewFlags) -> Result<(), ViewError> {
        let node = self.node_mut(id)?;
        if node.flags.contains(ViewFlags::DRAW_ON_CHILDREN)
            != flags.contains(ViewFlags::DRAW_ON_CHILDREN)
        {
            self.clipping_valid = false;
        }
        self.node_mut(id)?.flags = flags;
        Ok(())
    }

    pub fn set_event_mask(
        &mut self,
        id: ViewId,
        mask: EventMask,
        options: EventOptions,
    ) -> Result<(), ViewError> {
        let node = self.node_mut(id)?;
        node.event_mask = mask;
        node.event_options = options;
        Ok(())
    }

    /// Clears the background-dirty flag, returning its previous value.
    pub fn take_background_dirty(&mut self, id: ViewId) -> Result<bool, ViewError> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.background_dirty, false))
    }

    pub fn push_state(&mut self, id: ViewId) -> Result<(), ViewError> {
        self.node_mut(id)?.draw_state.push();
        Ok(())
    }

    /// Restores the previously pushed draw state.
    ///
    /// Popping without a matching push breaks the calling contract.
    pub fn pop_state(&mut self, id: ViewId) -> Result<(), ViewError> {
        if self.node_mut(id)?.draw_state.pop() {
            Ok(())
        } else {
            debugger(format_args!("pop_state: {} has no pushed draw state", id));
            Err(ViewError::StateStackUnderflow(id))
        }
    }

    pub fn draw_state(&self, id: ViewId) -> Result<&DrawStateStack, ViewError> {
        Ok(&self.node(id)?.draw_state)
    }

    pub fn draw_state_mut(&mut self, id: ViewId) -> Result<&mut DrawStateStack, ViewError> {
        Ok(&mut self.node_mut(id)?.draw_state)
    }

    /// The combined user clipping of the view’s draw states, in screen coordinates.
    pub fn user_clipping_in_screen(&self, id: ViewId) -> Result<Option<Region>, ViewError> {
        let mut clipping = match self.node(id)?.draw_state.combined_clipping() {
            Some(clipping) => clipping,
            None => return Ok(None),
        };
        let origin = self.convert_to_screen(id, Point2::new(0., 0.))?;
        clipping.offset_by(origin.x.round() as i32, origin.y.round() as i32);
        Ok(Some(clipping))
    }

    pub fn invalidate_clipping(&mut self) {
        self.clipping_valid = false;
    }

    pub fn is_clipping_valid(&self) -> bool {
        self.clipping_valid
    }

    /// Recomputes the screen clipping of every view.
    ///
    /// - the top view may use its frame within `visible_content`
    /// - a child may use its frame within its parent’s area, minus its later (front) siblings
    /// - a view’s clipping is its area minus its visible children, unless it draws on them
    /// - hidden and detached views have no clipping
    pub fn rebuild_clipping(&mut self, visible_content: &Region) -> Result<(), ViewError> {
        for node in self.nodes.values_mut() {
            node.screen_clipping.make_empty();
        }

        let root = self.root;
        if self.node(root)?.visible {
            let mut area = Region::from_rect(self.screen_frame(root)?.to_clip_rect());
            area.intersect_with(visible_content);

            let mut pending = vec![(root, area)];
            while let Some((id, area)) = pending.pop() {
                let mut frames = Vec::new();
                for child in self.children(id) {
                    if self.node(child)?.visible {
                        let frame = self.screen_frame(child)?.to_clip_rect();
                        frames.push((child, Region::from_rect(frame)));
                    }
                }
                let draw_on_children =
                    self.node(id)?.flags.contains(ViewFlags::DRAW_ON_CHILDREN);

                let mut clipping = area.clone();
                for (i, (child, frame)) in frames.iter().enumerate() {
                    if !draw_on_children {
                        clipping.exclude(frame);
                    }
                    let mut child_area = frame & &area;
                    for (_, later) in &frames[i + 1..] {
                        child_area.exclude(later);
                    }
                    pending.push((*child, child_area));
                }
                self.node_mut(id)?.screen_clipping = clipping;
            }
        }

        self.clipping_valid = true;
        Ok(())
    }

    /// The view’s clipping from the last [`rebuild_clipping`](Self::rebuild_clipping).
    pub fn screen_clipping(&self, id: ViewId) -> Result<&Region, ViewError> {
        Ok(&self.node(id)?.screen_clipping)
    }

    /// Screen clipping restricted by the view’s user clipping.
    pub fn effective_clipping(&self, id: ViewId) -> Result<Region, ViewError> {
        let clipping = self.screen_clipping(id)?;
        Ok(match self.user_clipping_in_screen(id)? {
            Some(user) => clipping & &user,
            None => clipping.clone(),
        })
    }

    /// The part of the view that needs redrawing for an update of `rect` (in view
    /// coordinates), or of the whole view.
    pub fn invalidate(&self, id: ViewId, rect: Option<Rect>) -> Result<Region, ViewError> {
        let clipping = self.screen_clipping(id)?;
        Ok(match rect {
            Some(rect) => {
                let rect = self.convert_rect_to_screen(id, rect)?.to_clip_rect();
                clipping & &Region::from_rect(rect)
            }
            None => clipping.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::ClipRect;

    fn frame(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::from_xywh(x, y, w, h)
    }

    fn tree_with_children(count: usize) -> (ViewTree, Vec<ViewId>) {
        let mut tree = ViewTree::new(frame(100., 100., 200., 200.));
        let mut dirty = Region::new();
        let root = tree.root();
        let ids = (0..count)
            .map(|i| {
                let id = tree.create_view(
                    &format!("child {}", i),
                    frame(10. * i as f64, 0., 50., 50.),
                    ViewFlags::WILL_DRAW,
                );
                tree.add_child(root, id, None, &mut dirty).unwrap();
                id
            })
            .collect();
        (tree, ids)
    }

    fn full_screen() -> Region {
        Region::from_rect(ClipRect::new(0, 0, 1000, 1000))
    }

    #[test]
    fn test_top_view_color() {
        let tree = ViewTree::with_top_view_color(frame(0., 0., 10., 10.), Color::WHITE);
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.view_color(), Color::WHITE);
        assert!(root.is_visible());
        let tree = ViewTree::new(frame(0., 0., 10., 10.));
        assert_eq!(tree.get(tree.root()).unwrap().view_color(), Color::PANEL);
    }

    #[test]
    fn test_add_child_order() {
        let (mut tree, ids) = tree_with_children(2);
        let root = tree.root();
        let mut dirty = Region::new();
        let inserted = tree.create_view("inserted", frame(0., 0., 5., 5.), ViewFlags::empty());
        tree.add_child(root, inserted, Some(ids[1]), &mut dirty).unwrap();

        let order: Vec<_> = tree.children(root).collect();
        assert_eq!(order, vec![ids[0], inserted, ids[1]]);
        assert_eq!(tree.get(root).unwrap().first_child(), Some(ids[0]));
        assert_eq!(tree.get(root).unwrap().last_child(), Some(ids[1]));
        assert_eq!(tree.get(ids[1]).unwrap().previous_sibling(), Some(inserted));
        assert!(tree.get(root).unwrap().is_background_dirty());
        assert!(!dirty.is_empty());
    }

    #[test]
    fn test_add_child_before_first() {
        let (mut tree, ids) = tree_with_children(2);
        let root = tree.root();
        let first = tree.create_view("first", frame(0., 0., 5., 5.), ViewFlags::empty());
        tree.add_child(root, first, Some(ids[0]), &mut Region::new()).unwrap();
        let order: Vec<_> = tree.children(root).collect();
        assert_eq!(order, vec![first, ids[0], ids[1]]);
        assert_eq!(tree.get(first).unwrap().previous_sibling(), None);
    }

    #[test]
    fn test_remove_child_unlinks() {
        let (mut tree, ids) = tree_with_children(3);
        let root = tree.root();
        let mut dirty = Region::new();
        tree.remove_child(root, ids[1], &mut dirty).unwrap();

        let order: Vec<_> = tree.children(root).collect();
        assert_eq!(order, vec![ids[0], ids[2]]);
        let removed = tree.get(ids[1]).unwrap();
        assert_eq!(removed.parent(), None);
        assert_eq!(removed.next_sibling(), None);
        assert_eq!(removed.previous_sibling(), None);
        assert!(!removed.is_visible());
        assert_eq!(
            dirty.rects(),
            &[ClipRect::new(110, 100, 160, 150)],
            "the removed view’s screen area must be repainted"
        );

        tree.remove_child(root, ids[2], &mut dirty).unwrap();
        assert_eq!(tree.get(root).unwrap().last_child(), Some(ids[0]));
        tree.destroy_view(ids[1]).unwrap();
        assert!(!tree.contains(ids[1]));
    }

    #[test]
    fn test_rejects_cycles_and_double_attach() {
        let (mut tree, ids) = tree_with_children(1);
        let root = tree.root();
        let mut dirty = Region::new();
        let grandchild = tree.create_view("grandchild", frame(0., 0., 5., 5.), ViewFlags::empty());
        tree.add_child(ids[0], grandchild, None, &mut dirty).unwrap();

        assert_eq!(
            tree.add_child(root, grandchild, None, &mut dirty),
            Err(ViewError::AlreadyAttached(grandchild))
        );
        assert_eq!(
            tree.add_child(grandchild, root, None, &mut dirty),
            Err(ViewError::TopView)
        );

        tree.remove_child(root, ids[0], &mut dirty).unwrap();
        assert_eq!(
            tree.add_child(grandchild, ids[0], None, &mut dirty),
            Err(ViewError::Cycle {
                parent: grandchild,
                child: ids[0]
            })
        );
        assert_eq!(tree.destroy_view(grandchild), Err(ViewError::AlreadyAttached(grandchild)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "contract violation")]
    fn test_remove_foreign_child_traps() {
        let (mut tree, ids) = tree_with_children(2);
        let _ = tree.remove_child(ids[0], ids[1], &mut Region::new());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "contract violation")]
    fn test_pop_without_push_traps() {
        let (mut tree, ids) = tree_with_children(1);
        tree.push_state(ids[0]).unwrap();
        tree.pop_state(ids[0]).unwrap();
        let _ = tree.pop_state(ids[0]);
    }

    #[test]
    fn test_coordinate_conversion() {
        let mut tree = ViewTree::new(frame(100., 50., 300., 300.));
        let root = tree.root();
        let mut dirty = Region::new();
        let child = tree.create_view("child", frame(10., 20., 100., 100.), ViewFlags::empty());
        let inner = tree.create_view("inner", frame(5., 5., 10., 10.), ViewFlags::empty());
        tree.add_child(root, child, None, &mut dirty).unwrap();
        tree.add_child(child, inner, None, &mut dirty).unwrap();
        tree.scroll_by(child, 3., 0., &mut dirty).unwrap();

        let screen = tree.convert_to_screen(inner, Point2::new(1., 1.)).unwrap();
        assert_eq!(screen, Point2::new(100. + 10. - 3. + 5. + 1., 50. + 20. + 5. + 1.));
        let back = tree.convert_from_screen(inner, screen).unwrap();
        assert_eq!(back, Point2::new(1., 1.));
        assert_eq!(
            tree.screen_frame(inner).unwrap(),
            frame(112., 75., 10., 10.)
        );
    }

    #[test]
    fn test_hidden_parent_hides_descendants_implicitly() {
        let (mut tree, ids) = tree_with_children(1);
        let mut dirty = Region::new();
        let grandchild = tree.create_view("grandchild", frame(0., 0., 5., 5.), ViewFlags::empty());
        tree.add_child(ids[0], grandchild, None, &mut dirty).unwrap();
        assert!(tree.is_visible(grandchild).unwrap());

        tree.set_hidden(ids[0], true, &mut dirty).unwrap();
        assert!(!tree.is_visible(grandchild).unwrap());
        assert!(!tree.is_hidden(grandchild).unwrap());
        assert!(tree.is_hidden(ids[0]).unwrap());

        tree.set_hidden(ids[0], false, &mut dirty).unwrap();
        assert!(tree.is_visible(grandchild).unwrap());

        tree.set_hidden(grandchild, true, &mut dirty).unwrap();
        tree.set_hidden(ids[0], true, &mut dirty).unwrap();
        tree.set_hidden(ids[0], false, &mut dirty).unwrap();
        assert!(!tree.is_visible(grandchild).unwrap(), "own hidden flag must survive");
    }

    #[test]
    fn test_clipping_excludes_children_and_front_siblings() {
        // children at x = 0, 10, 20 (relative), all 50x50, later ones in front
        let (mut tree, ids) = tree_with_children(3);
        let root = tree.root();
        tree.rebuild_clipping(&full_screen()).unwrap();
        assert!(tree.is_clipping_valid());

        let back = tree.screen_clipping(ids[0]).unwrap();
        assert_eq!(back.rects(), &[ClipRect::new(100, 100, 110, 150)]);
        let front = tree.screen_clipping(ids[2]).unwrap();
        assert_eq!(front.rects(), &[ClipRect::new(120, 100, 170, 150)]);

        let top = tree.screen_clipping(root).unwrap();
        assert!(!top.contains(130, 120));
        assert!(top.contains(200, 200));
        for id in &ids {
            let clipping = tree.screen_clipping(*id).unwrap();
            assert!((clipping & top).is_empty());
            assert!(clipping.is_subset_of(&tree.exposed_area(root).unwrap()));
        }
    }

    #[test]
    fn test_clipping_bounded_by_parent_and_content() {
        let mut tree = ViewTree::new(frame(0., 0., 100., 100.));
        let root = tree.root();
        let mut dirty = Region::new();
        let child = tree.create_view("child", frame(50., 50., 100., 100.), ViewFlags::empty());
        let inner = tree.create_view("inner", frame(-10., -10., 500., 500.), ViewFlags::empty());
        tree.add_child(root, child, None, &mut dirty).unwrap();
        tree.add_child(child, inner, None, &mut dirty).unwrap();

        let content = Region::from_rect(ClipRect::new(0, 0, 80, 100));
        tree.rebuild_clipping(&content).unwrap();
        assert_eq!(
            tree.screen_clipping(inner).unwrap().rects(),
            &[ClipRect::new(50, 50, 80, 100)]
        );
        assert!(tree.screen_clipping(child).unwrap().is_empty());

        tree.set_hidden(child, true, &mut dirty).unwrap();
        assert!(!tree.is_clipping_valid());
        tree.rebuild_clipping(&content).unwrap();
        assert!(tree.screen_clipping(inner).unwrap().is_empty());
        assert_eq!(tree.screen_clipping(root).unwrap(), &content);
    }

    #[test]
    fn test_user_clipping_restricts_effective_clipping() {
        let (mut tree, ids) = tree_with_children(1);
        tree.rebuild_clipping(&full_screen()).unwrap();
        tree.draw_state_mut(ids[0]).unwrap().current_mut().clipping =
            Some(Region::from_rect(ClipRect::new(0, 0, 10, 10)));
        let effective = tree.effective_clipping(ids[0]).unwrap();
        assert_eq!(effective.rects(), &[ClipRect::new(100, 100, 110, 110)]);
    }

    #[test]
    fn test_resize_dirties_only_changed_area() {
        let (mut tree, ids) = tree_with_children(1);
        let mut dirty = Region::new();
        tree.resize_by(ids[0], 10., 0., &mut dirty).unwrap();
        assert_eq!(dirty.rects(), &[ClipRect::new(150, 100, 160, 150)]);

        tree.set_flags(ids[0], ViewFlags::FULL_UPDATE_ON_RESIZE).unwrap();
        dirty.make_empty();
        tree.resize_by(ids[0], -10., 0., &mut dirty).unwrap();
        assert_eq!(dirty.rects(), &[ClipRect::new(100, 100, 160, 150)]);
        assert!(tree.get(ids[0]).unwrap().is_background_dirty());
    }
}
