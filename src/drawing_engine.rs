//! Turns drawing requests into fills on a hardware interface.

use crate::hw_interface::HWInterface;
use kite_core::{ClipRect, Color, Region};
use std::sync::Arc;
use tracing::trace;

/// Clips drawing to a region and forwards it to the attached interface.
///
/// Without an interface every draw does nothing.
#[derive(Default)]
pub struct DrawingEngine {
    hw: Option<Arc<dyn HWInterface>>,
    clipping: Option<Region>,
}

impl DrawingEngine {
    pub fn new(hw: Option<Arc<dyn HWInterface>>) -> DrawingEngine {
        DrawingEngine { hw, clipping: None }
    }

    /// Attaches or detaches (`None`) the interface.
    pub fn set_hw_interface(&mut self, hw: Option<Arc<dyn HWInterface>>) {
        self.hw = hw;
    }

    pub fn hw_interface(&self) -> Option<&Arc<dyn HWInterface>> {
        self.hw.as_ref()
    }

    /// Limits all following drawing to `region` (screen coordinates). `None` lifts the limit.
    pub fn constrain_clipping_region(&mut self, region: Option<&Region>) {
        self.clipping = region.cloned();
    }

    pub fn clipping(&self) -> Option<&Region> {
        self.clipping.as_ref()
    }

    pub fn fill_rect(&self, rect: ClipRect, color: Color) {
        self.fill_region(&Region::from_rect(rect), color);
    }

    pub fn fill_region(&self, region: &Region, color: Color) {
        let hw = match &self.hw {
            Some(hw) => hw,
            None => {
                trace!("no interface attached, dropping fill");
                return;
            }
        };
        let region = match &self.clipping {
            Some(clipping) => region & clipping,
            None => region.clone(),
        };
        if !region.is_empty() {
            hw.fill_region(&region, color);
        }
    }

    /// Draws a one pixel outline just inside `rect`.
    pub fn stroke_rect(&self, rect: ClipRect, color: Color) {
        if !rect.is_valid() {
            return;
        }
        let edges = [
            ClipRect::new(rect.left, rect.top, rect.right, rect.top + 1),
            ClipRect::new(rect.left, rect.bottom - 1, rect.right, rect.bottom),
            ClipRect::new(rect.left, rect.top, rect.left + 1, rect.bottom),
            ClipRect::new(rect.right - 1, rect.top, rect.right, rect.bottom),
        ];
        self.fill_region(&Region::from_rects(edges), color);
    }
}
