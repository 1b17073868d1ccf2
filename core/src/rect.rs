//! Rectangles.

use cgmath::{Point2, Vector2, Zero};
use serde::{Deserialize, Serialize};
use std::ops;

/// A rectangle in view or screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point2<f64>,

    /// Rectangle size.
    pub size: Vector2<f64>,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(origin: Point2<f64>, size: Vector2<f64>) -> Rect {
        Rect { origin, size }
    }

    /// Creates a rectangle from its origin coordinates and size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect {
            origin: Point2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    /// Returns a zero-sized rectangle at the origin.
    pub fn zero() -> Rect {
        Rect {
            origin: Point2::new(0., 0.),
            size: Vector2::zero(),
        }
    }

    /// The far x edge.
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.x
    }

    /// The far y edge.
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.y
    }

    /// Returns true if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.size.x > 0. && self.size.y > 0.)
    }

    /// Returns the center point.
    pub fn center(&self) -> Point2<f64> {
        self.origin + self.size / 2.
    }

    /// Returns true if the point is inside the rectangle.
    pub fn contains(&self, point: Point2<f64>) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.max_x()
            && point.y < self.max_y()
    }

    /// Returns true if the two rectangles intersect.
    pub fn intersects(&self, rect: Rect) -> bool {
        self.origin.x < rect.max_x()
            && self.origin.y < rect.max_y()
            && rect.origin.x < self.max_x()
            && rect.origin.y < self.max_y()
    }

    /// Returns the intersection rectangle.
    pub fn intersect(&self, rect: Rect) -> Option<Rect> {
        if !self.intersects(rect) {
            return None;
        }

        let min_x = self.origin.x.max(rect.origin.x);
        let min_y = self.origin.y.max(rect.origin.y);
        let max_x = self.max_x().min(rect.max_x());
        let max_y = self.max_y().min(rect.max_y());

        Some(Rect {
            origin: (min_x, min_y).into(),
            size: (max_x - min_x, max_y - min_y).into(),
        })
    }

    /// Returns a new rectangle inset by the specified amount.
    pub fn inset(&self, horiz: f64, vert: f64) -> Rect {
        Rect {
            origin: (self.origin.x + horiz, self.origin.y + vert).into(),
            size: (self.size.x - 2. * horiz, self.size.y - 2. * vert).into(),
        }
    }

    /// Returns a new rectangle with the given origin.
    pub fn with_origin(&self, origin: Point2<f64>) -> Rect {
        Rect {
            origin,
            size: self.size,
        }
    }

    /// Returns a new rectangle with the given size added to the current size.
    pub fn with_added_size(self, size: Vector2<f64>) -> Rect {
        Rect {
            origin: self.origin,
            size: self.size + size,
        }
    }

    /// Returns the smallest pixel rectangle covering this rectangle.
    ///
    /// The origin is floored and the far edges are ceiled, so a rectangle that only partially
    /// covers a pixel still claims it.
    pub fn to_clip_rect(&self) -> ClipRect {
        ClipRect::new(
            self.origin.x.floor() as i32,
            self.origin.y.floor() as i32,
            self.max_x().ceil() as i32,
            self.max_y().ceil() as i32,
        )
    }
}

impl ops::Add<Vector2<f64>> for Rect {
    type Output = Rect;
    fn add(self, offset: Vector2<f64>) -> Rect {
        Rect {
            origin: self.origin + offset,
            size: self.size,
        }
    }
}

impl ops::Sub<Vector2<f64>> for Rect {
    type Output = Rect;
    fn sub(self, offset: Vector2<f64>) -> Rect {
        Rect {
            origin: self.origin - offset,
            size: self.size,
        }
    }
}

/// A pixel rectangle.
///
/// Edges are half-open: `right` and `bottom` are the first column and row *outside* the
/// rectangle. A rectangle is valid only if it covers at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ClipRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ClipRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> ClipRect {
        ClipRect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A rectangle at the origin with the given size.
    pub const fn with_size(width: i32, height: i32) -> ClipRect {
        ClipRect::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Returns true if the rectangle covers at least one pixel.
    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    pub fn area(&self) -> i64 {
        if self.is_valid() {
            (self.right as i64 - self.left as i64) * (self.bottom as i64 - self.top as i64)
        } else {
            0
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn intersects(&self, other: &ClipRect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Returns the common area, if any.
    pub fn intersect(&self, other: &ClipRect) -> Option<ClipRect> {
        let rect = ClipRect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if rect.is_valid() {
            Some(rect)
        } else {
            None
        }
    }

    /// Returns the bounding box of both rectangles.
    pub fn bounding_union(&self, other: &ClipRect) -> ClipRect {
        ClipRect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Returns the rectangle grown by `by` pixels on every side.
    ///
    /// Edges saturate at the `i32` range.
    pub fn inflate(&self, by: i32) -> ClipRect {
        ClipRect::new(
            self.left.saturating_sub(by),
            self.top.saturating_sub(by),
            self.right.saturating_add(by),
            self.bottom.saturating_add(by),
        )
    }

    /// Edges saturate at the `i32` range, so a rectangle pushed past it loses width.
    pub fn offset_by(&self, dx: i32, dy: i32) -> ClipRect {
        ClipRect::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.right.saturating_add(dx),
            self.bottom.saturating_add(dy),
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_xywh(
            self.left as f64,
            self.top as f64,
            self.width() as f64,
            self.height() as f64,
        )
    }
}
