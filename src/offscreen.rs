//! Windows that render into a bitmap instead of the screen.

use crate::bitmap::SharedBitmap;
use crate::bitmap_hw_interface::BitmapHWInterface;
use crate::drawing_engine::DrawingEngine;
use crate::error::WindowError;
use crate::hw_interface::HWInterface;
use crate::server_window::{ClientRequest, ServerWindow};
use crate::settings::DesktopSettings;
use crate::window::{Window, WindowKind};
use crossbeam::channel::Sender;
use kite_core::Region;
use std::sync::Arc;
use tracing::debug;

impl Window {
    /// Creates a window covering `bitmap`.
    ///
    /// The window owns a fresh interface bound to the bitmap, and its regions cover the whole
    /// bitmap from the start; there is no compositing step.
    pub fn offscreen(bitmap: SharedBitmap, title: &str) -> Result<Window, WindowError> {
        let hw = BitmapHWInterface::new(Arc::clone(&bitmap));
        hw.initialize()?;
        let bounds = hw.frame();
        let hw: Arc<dyn HWInterface> = Arc::new(hw);

        let mut window = Window::with_kind(
            title,
            bounds.to_rect(),
            WindowKind::Offscreen { bitmap },
            0,
            DesktopSettings::default().default_view_color,
        );
        window.drawing_engine = DrawingEngine::new(Some(Arc::clone(&hw)));
        window.hw = Some(hw);
        window.owns_hw = true;

        let full = Region::from_rect(bounds);
        window.border_valid = true;
        window.content_region = full.clone();
        window.content_valid = true;
        window.visible_region = full.clone();
        window.visible_valid = true;
        window.visible_content_region = full;
        window.visible_content_valid = true;

        debug!(window = %window.id(), ?bounds, "created offscreen window");
        Ok(window)
    }
}

impl ServerWindow {
    /// Creates a server window for an offscreen window on `bitmap`.
    pub fn offscreen(
        bitmap: SharedBitmap,
        title: &str,
    ) -> Result<(ServerWindow, Sender<ClientRequest>), WindowError> {
        Ok(ServerWindow::new(Window::offscreen(bitmap, title)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{ColorSpace, ServerBitmap};
    use kite_core::{ClipRect, Color, Rect};

    #[test]
    fn test_regions_cover_bitmap() {
        let bitmap = ServerBitmap::new(30, 20, ColorSpace::Rgba32).unwrap().shared();
        let mut window = Window::offscreen(bitmap, "offscreen").unwrap();
        let full = [ClipRect::new(0, 0, 30, 20)];
        assert!(window.is_offscreen());
        assert!(window.is_visible_region_valid());
        assert_eq!(window.visible_region().rects(), &full);
        assert_eq!(window.content_region().rects(), &full);
        assert_eq!(window.visible_content_region().rects(), &full);
        assert!(window.border_region().is_empty());
    }

    #[test]
    fn test_offscreen_windows_stay_put() {
        let bitmap = ServerBitmap::new(30, 20, ColorSpace::Rgba32).unwrap().shared();
        let mut window = Window::offscreen(bitmap, "offscreen").unwrap();
        window.move_by(10., 10.).unwrap();
        window.resize_by(10., 10.).unwrap();
        assert_eq!(window.frame(), Rect::from_xywh(0., 0., 30., 20.));
        assert!(window.is_visible_region_valid());
    }

    #[test]
    fn test_close_shuts_interface_down() {
        let bitmap = ServerBitmap::new(4, 4, ColorSpace::Rgba32).unwrap().shared();
        let mut window = Window::offscreen(bitmap.clone(), "offscreen").unwrap();
        let hw = Arc::clone(window.hw_interface().unwrap());
        window.close();
        assert!(!hw.is_ready());

        let root = window.root_view();
        window
            .fill_rect(root, Rect::from_xywh(0., 0., 4., 4.), Color::WHITE)
            .unwrap();
        hw.fill_region(&Region::from_rect(ClipRect::new(0, 0, 4, 4)), Color::WHITE);
        assert!(bitmap.lock().pixels().iter().all(|&p| p == 0));
    }
}
