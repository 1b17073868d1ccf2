//! Geometry and view trees for the kite window server.
//!
//! # Conceptual overview
//!
//! ## Regions
//! Everything that decides *where* drawing may happen is expressed as a [`Region`]: a set of
//! disjoint pixel rectangles kept in a canonical banded form. Union, intersection and
//! subtraction are exact; they never approximate an area by its bounding box.
//!
//! ## Views
//! A window’s content is a tree of [`View`]s held in a [`ViewTree`]. Each view has a frame in
//! its parent’s coordinate system and a scrolling offset that shifts its own coordinate system.
//! The top view’s frame is in screen coordinates, so converting any point to the screen walks
//! up the ancestor chain.
//!
//! Children are kept in drawing order: later siblings are in front of earlier ones.
//!
//! ## Clipping
//! A view may only draw where it is actually visible. Its clipping is derived from the window’s
//! visible content region and narrowed down at each level of the tree:
//!
//! - a view never draws outside of its parent’s area,
//! - siblings in front of a view occlude it,
//! - a view does not draw over its children (unless it asks to).
//!
//! Clipping is cached per view and rebuilt lazily: any structural or geometry change marks the
//! cache invalid, and the owner rebuilds it before the next draw.
//!
//! ## Draw state
//! Every view owns a stack of [`DrawState`]s. Pushing saves the current state; popping restores
//! it. The bottom state can’t be popped.
//!
//! ## Coordinate System
//! The y-axis is oriented such that positive y points down. Pixel rectangles ([`ClipRect`]) are
//! half-open.

pub mod archive;
pub mod color;
pub mod contract;
pub mod draw_state;
pub mod error;
mod rect;
pub mod region;
mod view;
mod view_tree;

pub use archive::ViewArchive;
pub use color::Color;
pub use draw_state::{DrawState, DrawStateStack, DrawingMode, FontState};
pub use error::{RegionError, ViewError};
pub use rect::{ClipRect, Rect};
pub use region::Region;
pub use view::{EventMask, EventOptions, View, ViewFlags, ViewId};
pub use view_tree::{Children, ViewTree};
