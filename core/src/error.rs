//! Errors.

use crate::view::ViewId;
use thiserror::Error;

/// Errors from region set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("out of memory growing region to {0} rectangles")]
    OutOfMemory(usize),
}

/// Errors that may occur when mutating a view tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("no such view: {0}")]
    NoSuchView(ViewId),

    #[error("a view with id {0} already exists")]
    AlreadyExists(ViewId),

    #[error("view {0} already has a parent")]
    AlreadyAttached(ViewId),

    #[error("view {0} is not attached to any parent")]
    NotAttached(ViewId),

    #[error("the top view cannot be reparented or removed")]
    TopView,

    #[error("adding {child} to {parent} would create a cycle")]
    Cycle { parent: ViewId, child: ViewId },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: ViewId, child: ViewId },

    #[error("draw state stack of {0} has no pushed state to pop")]
    StateStackUnderflow(ViewId),

    #[error(transparent)]
    Region(#[from] RegionError),
}
