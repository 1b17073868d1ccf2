//! Serializable snapshots of view subtrees.
//!
//! The archive format itself belongs to whoever persists these; this module only guarantees
//! that everything needed to rebuild a subtree is captured.

use crate::color::Color;
use crate::error::ViewError;
use crate::rect::Rect;
use crate::region::Region;
use crate::view::{EventMask, EventOptions, ViewFlags, ViewId};
use crate::view_tree::ViewTree;
use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A snapshot of a view and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewArchive {
    pub name: String,
    pub frame: Rect,
    pub scroll_offset: Vector2<f64>,
    pub flags: u32,
    pub event_mask: u32,
    pub event_options: u32,
    pub hidden: bool,
    pub view_color: Color,
    #[serde(default)]
    pub children: Vec<ViewArchive>,
}

impl ViewTree {
    /// Captures `id` and its subtree.
    pub fn archive(&self, id: ViewId) -> Result<ViewArchive, ViewError> {
        let view = self.get(id).ok_or(ViewError::NoSuchView(id))?;
        let children = self
            .children(id)
            .map(|child| self.archive(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ViewArchive {
            name: view.name().to_owned(),
            frame: view.frame(),
            scroll_offset: view.scroll_offset(),
            flags: view.flags().bits(),
            event_mask: view.event_mask().bits(),
            event_options: view.event_options().bits(),
            hidden: view.is_hidden(),
            view_color: view.view_color(),
            children,
        })
    }

    /// Rebuilds an archived subtree as a new detached view; returns its id.
    ///
    /// Unknown flag bits are dropped. On failure nothing of the subtree is left in the tree.
    pub fn unarchive(&mut self, archive: &ViewArchive) -> Result<ViewId, ViewError> {
        let id = self.create_view(
            &archive.name,
            archive.frame,
            ViewFlags::from_bits_truncate(archive.flags),
        );
        match self.restore(id, archive) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.discard(id);
                Err(err)
            }
        }
    }

    /// Rebuilds an archived subtree and appends it to `parent`.
    pub fn unarchive_into(
        &mut self,
        parent: ViewId,
        archive: &ViewArchive,
        dirty: &mut Region,
    ) -> Result<ViewId, ViewError> {
        let id = self.unarchive(archive)?;
        if let Err(err) = self.add_child(parent, id, None, dirty) {
            self.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    fn restore(&mut self, id: ViewId, archive: &ViewArchive) -> Result<(), ViewError> {
        let mut dirty = Region::new();
        self.set_event_mask(
            id,
            EventMask::from_bits_truncate(archive.event_mask),
            EventOptions::from_bits_truncate(archive.event_options),
        )?;
        self.set_view_color(id, archive.view_color)?;
        self.scroll_by(id, archive.scroll_offset.x, archive.scroll_offset.y, &mut dirty)?;
        self.set_hidden(id, archive.hidden, &mut dirty)?;

        for child in &archive.children {
            self.unarchive_into(id, child, &mut dirty)?;
        }
        Ok(())
    }

    /// Drops a detached, partially restored subtree.
    fn discard(&mut self, id: ViewId) {
        if let Err(err) = self.destroy_view(id) {
            warn!(view = %id, %err, "could not discard restored view");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_survives_json() {
        let mut tree = ViewTree::new(Rect::from_xywh(0., 0., 640., 480.));
        let root = tree.root();
        let mut dirty = Region::new();
        let panel = tree.create_view(
            "panel",
            Rect::from_xywh(10., 10., 200., 100.),
            ViewFlags::WILL_DRAW | ViewFlags::FRAME_EVENTS,
        );
        let label = tree.create_view("label", Rect::from_xywh(5., 5., 50., 20.), ViewFlags::empty());
        tree.add_child(root, panel, None, &mut dirty).unwrap();
        tree.add_child(panel, label, None, &mut dirty).unwrap();
        tree.set_hidden(label, true, &mut dirty).unwrap();
        tree.set_view_color(panel, Color::from_rgb8(10, 20, 30)).unwrap();

        let archive = tree.archive(panel).unwrap();
        let json = serde_json::to_string(&archive).unwrap();
        let restored: ViewArchive = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, archive);

        let copy = tree.unarchive(&restored).unwrap();
        assert_eq!(tree.get(copy).unwrap().parent(), None);
        assert_eq!(tree.count_children(copy), 1);
        assert_eq!(tree.archive(copy).unwrap(), archive);
    }

    #[test]
    fn test_unarchive_into() {
        let mut tree = ViewTree::new(Rect::from_xywh(0., 0., 640., 480.));
        let root = tree.root();
        let mut dirty = Region::new();
        let panel = tree.create_view(
            "panel",
            Rect::from_xywh(10., 10., 200., 100.),
            ViewFlags::empty(),
        );
        let label = tree.create_view("label", Rect::from_xywh(5., 5., 50., 20.), ViewFlags::empty());
        tree.add_child(panel, label, None, &mut dirty).unwrap();
        let archive = tree.archive(panel).unwrap();

        let copy = tree.unarchive_into(root, &archive, &mut dirty).unwrap();
        assert_eq!(tree.get(copy).unwrap().parent(), Some(root));
        assert_eq!(tree.count_children(copy), 1);
        assert!(!dirty.is_empty());
    }

    #[test]
    fn test_failed_unarchive_leaves_no_views() {
        let mut tree = ViewTree::new(Rect::from_xywh(0., 0., 640., 480.));
        let mut dirty = Region::new();
        let panel = tree.create_view(
            "panel",
            Rect::from_xywh(10., 10., 200., 100.),
            ViewFlags::empty(),
        );
        for i in 0..3 {
            let child = tree.create_view(
                &format!("child {}", i),
                Rect::from_xywh(0., 0., 10., 10.),
                ViewFlags::empty(),
            );
            tree.add_child(panel, child, None, &mut dirty).unwrap();
        }
        let archive = tree.archive(panel).unwrap();
        let before = tree.count_views();

        let missing = ViewId::new();
        assert_eq!(
            tree.unarchive_into(missing, &archive, &mut dirty),
            Err(ViewError::NoSuchView(missing))
        );
        assert_eq!(tree.count_views(), before);
    }
}
