//! Errors.

use crate::window::WindowId;
use kite_core::ViewError;
use thiserror::Error;

/// Errors from a hardware interface or its backing memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwError {
    #[error("the hardware interface has been shut down")]
    ShutDown,

    #[error("invalid bitmap size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("out of memory allocating {0} pixels")]
    OutOfMemory(usize),
}

/// Errors from window and desktop operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("no such window: {0}")]
    NoSuchWindow(WindowId),

    #[error("the client of window {0} is gone")]
    ClientGone(WindowId),

    #[error("window {0} is closed")]
    Closed(WindowId),

    #[error("workspace {0} does not exist")]
    NoSuchWorkspace(usize),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Hw(#[from] HwError),
}

/// Errors from loading desktop settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("workspace count must be between 1 and {max}, got {count}")]
    WorkspaceCount { count: usize, max: usize },
}
