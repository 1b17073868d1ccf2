//! Regions: exact rectangle-set algebra for clipping.
//!
//! A region is stored in banded form. Every rectangle belongs to a band, a horizontal strip in
//! which all rectangles share the same top and bottom edge. Bands are sorted top to bottom and
//! never overlap; within a band, rectangles are sorted left to right and never touch. Two
//! vertically touching bands with identical spans are always merged into one.
//!
//! This form is canonical: two regions covering the same pixels have identical rectangle lists,
//! so `==` compares areas. All set operations are implemented by a single sweep over the band
//! edges of both operands.

use crate::error::RegionError;
use crate::rect::ClipRect;
use std::ops;
use tracing::error;

/// A set of disjoint pixel rectangles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Region {
    rects: Vec<ClipRect>,
}

/// The boolean operation applied by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOp {
    Union,
    Intersect,
    Subtract,
}

impl SetOp {
    fn keep(self, in_a: bool, in_b: bool) -> bool {
        match self {
            SetOp::Union => in_a || in_b,
            SetOp::Intersect => in_a && in_b,
            SetOp::Subtract => in_a && !in_b,
        }
    }
}

impl Region {
    /// Creates an empty region.
    pub fn new() -> Region {
        Region { rects: Vec::new() }
    }

    /// Creates a region covering a single rectangle; invalid rectangles yield an empty region.
    pub fn from_rect(rect: ClipRect) -> Region {
        if rect.is_valid() {
            Region { rects: vec![rect] }
        } else {
            Region::new()
        }
    }

    /// Creates the union of any number of (possibly overlapping) rectangles.
    pub fn from_rects<I: IntoIterator<Item = ClipRect>>(rects: I) -> Region {
        let mut region = Region::new();
        for rect in rects {
            region.include_rect(rect);
        }
        region
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn count_rects(&self) -> usize {
        self.rects.len()
    }

    /// The rectangles in scan order.
    pub fn rects(&self) -> &[ClipRect] {
        &self.rects
    }

    pub fn rect_at(&self, index: usize) -> Option<ClipRect> {
        self.rects.get(index).copied()
    }

    /// The bounding box, or `None` if the region is empty.
    pub fn frame(&self) -> Option<ClipRect> {
        let first = self.rects.first()?;
        let last = self.rects.last()?;
        let mut frame = ClipRect::new(first.left, first.top, first.right, last.bottom);
        for rect in &self.rects {
            frame.left = frame.left.min(rect.left);
            frame.right = frame.right.max(rect.right);
        }
        Some(frame)
    }

    /// Number of pixels covered.
    pub fn area(&self) -> i64 {
        self.rects.iter().map(ClipRect::area).sum()
    }

    /// Returns true if the pixel at `(x, y)` is part of the region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.band_at(y).iter().any(|rect| rect.contains(x, y))
    }

    pub fn intersects_rect(&self, rect: &ClipRect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Returns true if every pixel of this region is also in `other`.
    pub fn is_subset_of(&self, other: &Region) -> bool {
        (self - other).is_empty()
    }

    pub fn make_empty(&mut self) {
        self.rects.clear();
    }

    /// Replaces the region with a single rectangle.
    pub fn set(&mut self, rect: ClipRect) {
        self.rects.clear();
        if rect.is_valid() {
            self.rects.push(rect);
        }
    }

    /// Translates every rectangle. Edges that would leave the `i32` range are clamped to it.
    pub fn offset_by(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let shifted: Vec<ClipRect> = self.rects.iter().map(|r| r.offset_by(dx, dy)).collect();
        let clamped = shifted
            .iter()
            .zip(&self.rects)
            .any(|(new, old)| new.width() != old.width() || new.height() != old.height());
        if clamped {
            // rectangles squeezed against the coordinate limits may now touch or vanish
            *self = Region::from_rects(shifted);
        } else {
            self.rects = shifted;
        }
    }

    /// Reserves room for `additional` more rectangles.
    ///
    /// On failure the region keeps its current buffer and contents.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), RegionError> {
        self.rects
            .try_reserve(additional)
            .map_err(|_| RegionError::OutOfMemory(self.rects.len().saturating_add(additional)))
    }

    /// Adds `other` to this region. On allocation failure the region is left unchanged.
    pub fn try_include(&mut self, other: &Region) -> Result<(), RegionError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            let mut rects = Vec::new();
            rects
                .try_reserve_exact(other.rects.len())
                .map_err(|_| RegionError::OutOfMemory(other.rects.len()))?;
            rects.extend_from_slice(&other.rects);
            self.rects = rects;
            return Ok(());
        }
        *self = self.combine(other, SetOp::Union)?;
        Ok(())
    }

    /// Keeps only the area shared with `other`. On allocation failure the region is left
    /// unchanged.
    pub fn try_intersect_with(&mut self, other: &Region) -> Result<(), RegionError> {
        if self.is_empty() || other.is_empty() {
            self.rects.clear();
            return Ok(());
        }
        *self = self.combine(other, SetOp::Intersect)?;
        Ok(())
    }

    /// Removes `other` from this region. On allocation failure the region is left unchanged.
    pub fn try_exclude(&mut self, other: &Region) -> Result<(), RegionError> {
        if self.is_empty() || other.is_empty() {
            return Ok(());
        }
        *self = self.combine(other, SetOp::Subtract)?;
        Ok(())
    }

    pub fn include(&mut self, other: &Region) {
        if let Err(err) = self.try_include(other) {
            error!(%err, "region union failed; keeping previous area");
        }
    }

    pub fn include_rect(&mut self, rect: ClipRect) {
        self.include(&Region::from_rect(rect));
    }

    pub fn intersect_with(&mut self, other: &Region) {
        if let Err(err) = self.try_intersect_with(other) {
            error!(%err, "region intersection failed; keeping previous area");
        }
    }

    pub fn intersect_with_rect(&mut self, rect: ClipRect) {
        self.intersect_with(&Region::from_rect(rect));
    }

    pub fn exclude(&mut self, other: &Region) {
        if let Err(err) = self.try_exclude(other) {
            error!(%err, "region subtraction failed; keeping previous area");
        }
    }

    pub fn exclude_rect(&mut self, rect: ClipRect) {
        self.exclude(&Region::from_rect(rect));
    }

    pub fn union(&self, other: &Region) -> Region {
        let mut result = self.clone();
        result.include(other);
        result
    }

    pub fn intersection(&self, other: &Region) -> Region {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    pub fn difference(&self, other: &Region) -> Region {
        let mut result = self.clone();
        result.exclude(other);
        result
    }

    /// Returns the band containing row `y`, or an empty slice.
    fn band_at(&self, y: i32) -> &[ClipRect] {
        // rects are sorted by band, and every rect of a band shares its bottom edge
        let start = self.rects.partition_point(|rect| rect.bottom <= y);
        match self.rects.get(start) {
            Some(first) if first.top <= y => {
                let len = self.rects[start..]
                    .iter()
                    .take_while(|rect| rect.top == first.top)
                    .count();
                &self.rects[start..start + len]
            }
            _ => &[],
        }
    }

    /// Runs one sweep over the band edges of both regions.
    fn combine(&self, other: &Region, op: SetOp) -> Result<Region, RegionError> {
        let mut edges = Vec::new();
        edges
            .try_reserve(2 * (self.rects.len() + other.rects.len()))
            .map_err(|_| RegionError::OutOfMemory(self.rects.len() + other.rects.len()))?;
        for rect in self.rects.iter().chain(&other.rects) {
            edges.push(rect.top);
            edges.push(rect.bottom);
        }
        edges.sort_unstable();
        edges.dedup();

        let mut rects: Vec<ClipRect> = Vec::new();
        // start index of the most recently emitted band within `rects`
        let mut last_band = 0;
        let mut spans = Vec::new();

        for pair in edges.windows(2) {
            let (top, bottom) = (pair[0], pair[1]);
            spans.clear();
            combine_spans(self.band_at(top), other.band_at(top), op, &mut spans);
            if spans.is_empty() {
                continue;
            }

            let previous = &rects[last_band..];
            let extends_previous = !previous.is_empty()
                && previous[0].bottom == top
                && previous.len() == spans.len()
                && previous
                    .iter()
                    .zip(&spans)
                    .all(|(rect, &(left, right))| rect.left == left && rect.right == right);

            if extends_previous {
                for rect in &mut rects[last_band..] {
                    rect.bottom = bottom;
                }
            } else {
                rects
                    .try_reserve(spans.len())
                    .map_err(|_| RegionError::OutOfMemory(rects.len() + spans.len()))?;
                last_band = rects.len();
                rects.extend(
                    spans
                        .iter()
                        .map(|&(left, right)| ClipRect::new(left, top, right, bottom)),
                );
            }
        }

        Ok(Region { rects })
    }
}

/// Combines the spans of two bands covering the same rows.
fn combine_spans(a: &[ClipRect], b: &[ClipRect], op: SetOp, out: &mut Vec<(i32, i32)>) {
    let mut xs: Vec<i32> = a
        .iter()
        .chain(b)
        .flat_map(|rect| [rect.left, rect.right])
        .collect();
    xs.sort_unstable();
    xs.dedup();

    let (mut i, mut j) = (0, 0);
    for pair in xs.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        while i < a.len() && a[i].right <= left {
            i += 1;
        }
        while j < b.len() && b[j].right <= left {
            j += 1;
        }
        let in_a = i < a.len() && a[i].left <= left;
        let in_b = j < b.len() && b[j].left <= left;
        if !op.keep(in_a, in_b) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == left => last.1 = right,
            _ => out.push((left, right)),
        }
    }
}

impl From<ClipRect> for Region {
    fn from(rect: ClipRect) -> Region {
        Region::from_rect(rect)
    }
}

impl<'a> ops::BitOr<&'a Region> for &'a Region {
    type Output = Region;
    fn bitor(self, other: &Region) -> Region {
        self.union(other)
    }
}

impl<'a> ops::BitAnd<&'a Region> for &'a Region {
    type Output = Region;
    fn bitand(self, other: &Region) -> Region {
        self.intersection(other)
    }
}

impl<'a> ops::Sub<&'a Region> for &'a Region {
    type Output = Region;
    fn sub(self, other: &Region) -> Region {
        self.difference(other)
    }
}
