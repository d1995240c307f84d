use rand::Rng;

use super::selection::Bounds;

pub const DEGREES_PER_FRAME: f64 = 2.0;

/// Rotation of the rainbow gradient, in degrees within `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    angle_offset_degrees: f64,
}

impl AnimationState {
    pub fn new(angle_offset_degrees: f64) -> Self {
        Self {
            angle_offset_degrees: angle_offset_degrees.rem_euclid(360.0),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0.0..360.0))
    }

    pub fn angle_offset_degrees(&self) -> f64 {
        self.angle_offset_degrees
    }

    pub fn advance(&mut self) {
        self.angle_offset_degrees =
            (self.angle_offset_degrees + DEGREES_PER_FRAME).rem_euclid(360.0);
    }
}

/// Handle for a per-frame animation loop sized to the bounds it was started with.
///
/// Cancelling is the only way to stop a loop, and cancelling twice is fine.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationLoop {
    generation: u64,
    bounds: Bounds,
    corner_radius: f64,
    cancelled: bool,
}

impl AnimationLoop {
    pub fn start(generation: u64, bounds: Bounds, corner_radius: f64) -> Self {
        Self {
            generation,
            bounds,
            corner_radius,
            cancelled: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn is_live(&self) -> bool {
        !self.cancelled
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}
