//! Hardware interfaces: where pixels end up.

use crate::error::HwError;
use kite_core::{ClipRect, Color, Region};
use parking_lot::MutexGuard;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Lifecycle of a hardware interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwState {
    Uninitialized,
    Ready,
    ShutDown,
}

/// Proof of exclusive access to a hardware interface.
///
/// While the guard lives, no draw dispatch can run on the interface. Dropping it releases the
/// access.
pub struct ExclusiveAccess<'a>(MutexGuard<'a, HwState>);

impl<'a> ExclusiveAccess<'a> {
    pub fn new(guard: MutexGuard<'a, HwState>) -> ExclusiveAccess<'a> {
        ExclusiveAccess(guard)
    }

    pub fn state(&self) -> HwState {
        *self.0
    }
}

impl Deref for ExclusiveAccess<'_> {
    type Target = HwState;

    fn deref(&self) -> &HwState {
        &self.0
    }
}

impl DerefMut for ExclusiveAccess<'_> {
    fn deref_mut(&mut self) -> &mut HwState {
        &mut self.0
    }
}

impl fmt::Debug for ExclusiveAccess<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ExclusiveAccess").field(&*self.0).finish()
    }
}

/// A drawing target: the screen or a bitmap.
///
/// Every draw takes the interface’s lock and checks that it is [`HwState::Ready`], so draws
/// that race a shutdown either finish first or do nothing.
pub trait HWInterface: Send + Sync {
    /// Makes the interface ready to draw.
    fn initialize(&self) -> Result<(), HwError>;

    /// Blocks until no draw is in flight and returns the access guard.
    fn lock_exclusive_access(&self) -> ExclusiveAccess<'_>;

    /// Shuts the interface down. Shutting down twice does nothing.
    fn shutdown(&self, access: &mut ExclusiveAccess<'_>);

    /// The drawable area.
    fn frame(&self) -> ClipRect;

    /// Fills `region` with `color`, clipped to [`frame`](Self::frame).
    fn fill_region(&self, region: &Region, color: Color);

    fn is_ready(&self) -> bool {
        *self.lock_exclusive_access() == HwState::Ready
    }
}
