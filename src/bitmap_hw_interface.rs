//! A hardware interface drawing into a server bitmap.

use crate::bitmap::SharedBitmap;
use crate::error::HwError;
use crate::hw_interface::{ExclusiveAccess, HWInterface, HwState};
use kite_core::{ClipRect, Color, Region};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Draws into a bitmap the caller also holds on to.
pub struct BitmapHWInterface {
    bitmap: SharedBitmap,
    state: Mutex<HwState>,
    frame: ClipRect,
}

impl BitmapHWInterface {
    pub fn new(bitmap: SharedBitmap) -> BitmapHWInterface {
        let frame = bitmap.lock().bounds();
        BitmapHWInterface {
            bitmap,
            state: Mutex::new(HwState::Uninitialized),
            frame,
        }
    }

    pub fn bitmap(&self) -> &SharedBitmap {
        &self.bitmap
    }
}

impl HWInterface for BitmapHWInterface {
    fn initialize(&self) -> Result<(), HwError> {
        let mut state = self.state.lock();
        match *state {
            HwState::ShutDown => Err(HwError::ShutDown),
            HwState::Ready => Ok(()),
            HwState::Uninitialized => {
                *state = HwState::Ready;
                debug!(frame = ?self.frame, "bitmap interface ready");
                Ok(())
            }
        }
    }

    fn lock_exclusive_access(&self) -> ExclusiveAccess<'_> {
        ExclusiveAccess::new(self.state.lock())
    }

    fn shutdown(&self, access: &mut ExclusiveAccess<'_>) {
        if **access == HwState::ShutDown {
            debug!("bitmap interface already shut down");
            return;
        }
        **access = HwState::ShutDown;
        debug!("bitmap interface shut down");
    }

    fn frame(&self) -> ClipRect {
        self.frame
    }

    fn fill_region(&self, region: &Region, color: Color) {
        let state = self.state.lock();
        if *state != HwState::Ready {
            trace!("dropping fill on inactive interface");
            return;
        }
        let pixel = color.to_pixel();
        let mut bitmap = self.bitmap.lock();
        for rect in region.rects() {
            if let Some(rect) = rect.intersect(&self.frame) {
                bitmap.fill_rect(rect, pixel);
            }
        }
    }
}
