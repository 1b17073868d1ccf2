use serde::{Deserialize, Serialize};

/// An RGBA color with components in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0., 0., 0., 1.);
    pub const WHITE: Color = Color::new(1., 1., 1., 1.);

    /// The default panel background.
    pub const PANEL: Color = Color::new(216. / 255., 216. / 255., 216. / 255., 1.);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Color {
        Color { r, g, b, a }
    }

    /// Creates an opaque color from 8-bit components.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Color {
        Color::new(r as f64 / 255., g as f64 / 255., b as f64 / 255., 1.)
    }

    /// Packs the color into a 32-bit `0xAARRGGBB` pixel.
    pub fn to_pixel(&self) -> u32 {
        fn channel(value: f64) -> u32 {
            (value.clamp(0., 1.) * 255.).round() as u32
        }
        channel(self.a) << 24 | channel(self.r) << 16 | channel(self.g) << 8 | channel(self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_packing() {
        assert_eq!(Color::BLACK.to_pixel(), 0xff00_0000);
        assert_eq!(Color::from_rgb8(0x12, 0x34, 0x56).to_pixel(), 0xff12_3456);
        assert_eq!(Color::new(2., -1., 0., 0.).to_pixel(), 0x00ff_0000);
    }
}
