//! Draw state and its save/restore stack.

use crate::color::Color;
use crate::region::Region;
use cgmath::{Point2, Vector2, Zero};

/// How drawing operations combine with the existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingMode {
    Copy,
    Over,
    Invert,
}

/// Font selection carried by a draw state.
///
/// Shaping and rendering happen elsewhere; the draw state only remembers the choice.
#[derive(Debug, Clone, PartialEq)]
pub struct FontState {
    pub family: String,
    pub size: f64,
}

impl Default for FontState {
    fn default() -> Self {
        FontState {
            family: String::from("sans-serif"),
            size: 12.,
        }
    }
}

/// One level of drawing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub pen_location: Point2<f64>,
    pub pen_size: f64,
    pub high_color: Color,
    pub low_color: Color,
    pub drawing_mode: DrawingMode,
    pub font: FontState,

    /// Origin of this level, relative to the level below.
    pub origin: Point2<f64>,

    /// Scale of this level, relative to the level below.
    pub scale: f64,

    /// User clipping in this level’s coordinates.
    pub clipping: Option<Region>,
}

impl Default for DrawState {
    fn default() -> Self {
        DrawState {
            pen_location: Point2::new(0., 0.),
            pen_size: 1.,
            high_color: Color::BLACK,
            low_color: Color::WHITE,
            drawing_mode: DrawingMode::Copy,
            font: FontState::default(),
            origin: Point2::new(0., 0.),
            scale: 1.,
            clipping: None,
        }
    }
}

impl DrawState {
    /// Creates the state pushed on top of `self`.
    ///
    /// Pens, colors and font carry over; origin, scale and clipping start fresh since they
    /// are relative to the level below.
    fn derive(&self) -> DrawState {
        DrawState {
            origin: Point2::new(0., 0.),
            scale: 1.,
            clipping: None,
            ..self.clone()
        }
    }
}

/// A stack of draw states with a permanent base level.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawStateStack {
    states: Vec<DrawState>,
}

impl Default for DrawStateStack {
    fn default() -> Self {
        DrawStateStack {
            states: vec![DrawState::default()],
        }
    }
}

impl DrawStateStack {
    /// Number of levels, including the base level.
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn current(&self) -> &DrawState {
        // the base level is never popped
        &self.states[self.states.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut DrawState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    pub fn push(&mut self) {
        let next = self.current().derive();
        self.states.push(next);
    }

    /// Pops the current level. Returns false, leaving the stack unchanged, if only the base
    /// level is left.
    pub fn pop(&mut self) -> bool {
        if self.states.len() > 1 {
            self.states.pop();
            true
        } else {
            false
        }
    }

    /// The origin of the current level in view coordinates.
    pub fn combined_origin(&self) -> Vector2<f64> {
        let mut origin = Vector2::zero();
        let mut scale = 1.;
        for state in &self.states {
            origin += Vector2::new(state.origin.x, state.origin.y) * scale;
            scale *= state.scale;
        }
        origin
    }

    pub fn combined_scale(&self) -> f64 {
        self.states.iter().map(|state| state.scale).product()
    }

    /// The intersection of the clipping of every level, in view coordinates.
    ///
    /// Each level’s clipping is translated by the combined origin of that level. Scaling does
    /// not apply to clipping.
    pub fn combined_clipping(&self) -> Option<Region> {
        let mut origin = Vector2::zero();
        let mut scale = 1.;
        let mut combined: Option<Region> = None;
        for state in &self.states {
            origin += Vector2::new(state.origin.x, state.origin.y) * scale;
            scale *= state.scale;
            if let Some(clipping) = &state.clipping {
                let mut clipping = clipping.clone();
                clipping.offset_by(origin.x.round() as i32, origin.y.round() as i32);
                combined = Some(match combined {
                    Some(region) => &region & &clipping,
                    None => clipping,
                });
            }
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::ClipRect;

    #[test]
    fn test_push_keeps_colors_and_resets_origin() {
        let mut stack = DrawStateStack::default();
        stack.current_mut().high_color = Color::new(1., 0., 0., 1.);
        stack.current_mut().origin = Point2::new(5., 5.);
        stack.push();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current().high_color, Color::new(1., 0., 0., 1.));
        assert_eq!(stack.current().origin, Point2::new(0., 0.));

        stack.current_mut().high_color = Color::BLACK;
        assert!(stack.pop());
        assert_eq!(stack.current().high_color, Color::new(1., 0., 0., 1.));
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_combined_origin_and_clipping() {
        let mut stack = DrawStateStack::default();
        stack.current_mut().origin = Point2::new(10., 0.);
        stack.current_mut().clipping = Some(Region::from_rect(ClipRect::new(0, 0, 50, 50)));
        stack.push();
        stack.current_mut().origin = Point2::new(0., 10.);
        stack.current_mut().clipping = Some(Region::from_rect(ClipRect::new(0, 0, 100, 100)));

        assert_eq!(stack.combined_origin(), Vector2::new(10., 10.));
        let clipping = stack.combined_clipping().unwrap();
        assert_eq!(clipping.rects(), &[ClipRect::new(10, 10, 60, 50)]);

        stack.pop();
        assert_eq!(stack.combined_origin(), Vector2::new(10., 0.));
    }
}
