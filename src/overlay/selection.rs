use serde::Serialize;

/// A selection narrower or shorter than this is treated as a stray click.
pub const MIN_SELECTION_SIZE: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// The axis-aligned rectangle spanning both points.
    pub fn spanning(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            left: ax.min(bx),
            top: ay.min(by),
            width: (bx - ax).abs(),
            height: (by - ay).abs(),
        }
    }
}

pub fn corner_radius_for(width: f64, height: f64) -> f64 {
    (width.min(height) * 0.1).clamp(8.0, 20.0)
}

/// The rectangle being dragged out, anchored at the pointer-down point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    origin_x: f64,
    origin_y: f64,
    bounds: Bounds,
    corner_radius: f64,
}

impl SelectionBox {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            origin_x: x,
            origin_y: y,
            bounds: Bounds {
                left: x,
                top: y,
                width: 0.0,
                height: 0.0,
            },
            corner_radius: corner_radius_for(0.0, 0.0),
        }
    }

    pub fn extend_to(&mut self, x: f64, y: f64) {
        self.bounds = Bounds::spanning(self.origin_x, self.origin_y, x, y);
        self.corner_radius = corner_radius_for(self.bounds.width, self.bounds.height);
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.origin_x, self.origin_y)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    /// Both sides are past the threshold, so the border is worth animating.
    pub fn is_animatable(&self) -> bool {
        self.bounds.width > MIN_SELECTION_SIZE && self.bounds.height > MIN_SELECTION_SIZE
    }

    pub fn is_too_small(&self) -> bool {
        self.bounds.width < MIN_SELECTION_SIZE || self.bounds.height < MIN_SELECTION_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_towards_top_left_normalizes_bounds() {
        let mut selection = SelectionBox::at(300.0, 250.0);
        selection.extend_to(100.0, 100.0);
        assert_eq!(
            selection.bounds(),
            Bounds {
                left: 100.0,
                top: 100.0,
                width: 200.0,
                height: 150.0
            }
        );
        assert_eq!(selection.origin(), (300.0, 250.0));
    }

    #[test]
    fn corner_radius_is_clamped_between_8_and_20() {
        assert_eq!(corner_radius_for(0.0, 0.0), 8.0);
        assert_eq!(corner_radius_for(200.0, 150.0), 15.0);
        assert_eq!(corner_radius_for(1000.0, 900.0), 20.0);
    }

    #[test]
    fn threshold_is_strict_for_animation_and_for_discard() {
        let mut selection = SelectionBox::at(0.0, 0.0);
        selection.extend_to(10.0, 10.0);
        assert!(!selection.is_animatable());
        assert!(!selection.is_too_small());

        selection.extend_to(9.0, 40.0);
        assert!(selection.is_too_small());
    }
}
