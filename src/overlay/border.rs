//! Per-frame paint records for the rainbow border, and a CPU rasterizer for them.
//!
//! The overlay webview strokes a [`BorderFrame`] with a canvas conic gradient;
//! [`rasterize`] produces the same picture into a `tiny_skia::Pixmap` (tray icon).

use serde::Serialize;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Path, PathBuilder, Pixmap, PremultipliedColorU8, Stroke,
    Transform,
};

use super::selection::Bounds;

pub const BORDER_WIDTH: f64 = 5.0;

/// Eight stops around a full saturated wheel; the last repeats the first.
pub const HUE_STOPS: [(f32, [u8; 3]); 8] = [
    (0.0, [0xFF, 0x3B, 0x30]),
    (0.14, [0xFF, 0x95, 0x00]),
    (0.28, [0xFF, 0xCC, 0x00]),
    (0.42, [0x34, 0xC7, 0x59]),
    (0.57, [0x00, 0xC7, 0xBE]),
    (0.71, [0x00, 0x7A, 0xFF]),
    (0.85, [0xAF, 0x52, 0xDE]),
    (1.0, [0xFF, 0x3B, 0x30]),
];

// Cubic approximation of a quarter circle.
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientStop {
    pub offset: f32,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
}

/// Everything needed to paint one box for one frame.
///
/// The canvas is the box grown by the stroke width on every side; `outline`
/// is in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderFrame {
    pub id: u64,
    pub canvas_left: f64,
    pub canvas_top: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub outline: RoundedRect,
    pub stroke_width: f64,
    pub angle_degrees: f64,
    pub opacity: f64,
    pub stops: Vec<GradientStop>,
}

impl BorderFrame {
    pub fn new(
        id: u64,
        bounds: Bounds,
        corner_radius: f64,
        angle_degrees: f64,
        opacity: f64,
    ) -> Self {
        let inset = BORDER_WIDTH / 2.0;
        let width = bounds.width + BORDER_WIDTH;
        let height = bounds.height + BORDER_WIDTH;
        Self {
            id,
            canvas_left: bounds.left - BORDER_WIDTH,
            canvas_top: bounds.top - BORDER_WIDTH,
            canvas_width: bounds.width + BORDER_WIDTH * 2.0,
            canvas_height: bounds.height + BORDER_WIDTH * 2.0,
            outline: RoundedRect {
                x: inset,
                y: inset,
                width,
                height,
                radius: corner_radius.min(width.min(height) / 2.0),
            },
            stroke_width: BORDER_WIDTH,
            angle_degrees,
            opacity: opacity.clamp(0.0, 1.0),
            stops: HUE_STOPS
                .iter()
                .map(|(offset, [r, g, b])| GradientStop {
                    offset: *offset,
                    color: format!("#{:02X}{:02X}{:02X}", r, g, b),
                })
                .collect(),
        }
    }
}

/// Colour of the conic gradient at `position` in `[0, 1)` of a turn.
pub fn gradient_color(position: f32) -> [u8; 3] {
    let t = position.rem_euclid(1.0);
    for pair in HUE_STOPS.windows(2) {
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        if t <= end {
            let span = end - start;
            let k = if span > 0.0 { (t - start) / span } else { 0.0 };
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * k).round() as u8;
            return [lerp(from[0], to[0]), lerp(from[1], to[1]), lerp(from[2], to[2])];
        }
    }
    HUE_STOPS[0].1
}

/// Position along the sweep for a point relative to the gradient centre.
///
/// Angles grow clockwise from the +x axis (y points down), starting at
/// `start_degrees`, which is how a canvas conic gradient sweeps.
pub fn sweep_position(dx: f32, dy: f32, start_degrees: f64) -> f32 {
    let angle = dy.atan2(dx) - (start_degrees as f32).to_radians();
    (angle / std::f32::consts::TAU).rem_euclid(1.0)
}

fn rounded_rect_path(rect: &RoundedRect) -> Option<Path> {
    let (x, y) = (rect.x as f32, rect.y as f32);
    let (w, h) = (rect.width as f32, rect.height as f32);
    let r = (rect.radius as f32).min(w.min(h) / 2.0).max(0.0);
    let c = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + c, y, x + w, y + r - c, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + c, x + w - r + c, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - c, y + h, x, y + h - r + c, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - c, x + r - c, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Paints `frame` into a fresh pixmap the size of its canvas.
pub fn rasterize(frame: &BorderFrame) -> Option<Pixmap> {
    let width = frame.canvas_width.ceil().max(1.0) as u32;
    let height = frame.canvas_height.ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height)?;

    let stroke = Stroke {
        width: frame.stroke_width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let outline = rounded_rect_path(&frame.outline)?.stroke(&stroke, 1.0)?;

    let mut mask = Mask::new(width, height)?;
    mask.fill_path(&outline, FillRule::Winding, true, Transform::identity());

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let opacity = frame.opacity as f32;
    let coverage = mask.data();

    for (i, pixel) in pixmap.pixels_mut().iter_mut().enumerate() {
        let cover = coverage[i];
        if cover == 0 {
            continue;
        }
        let px = (i as u32 % width) as f32 + 0.5;
        let py = (i as u32 / width) as f32 + 0.5;
        let [r, g, b] = gradient_color(sweep_position(px - cx, py - cy, frame.angle_degrees));

        let alpha = (cover as f32 * opacity).round() as u8;
        let premultiply = |c: u8| ((c as u16 * alpha as u16 + 127) / 255) as u8;
        *pixel = PremultipliedColorU8::from_rgba(premultiply(r), premultiply(g), premultiply(b), alpha)
            .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }

    Some(pixmap)
}

/// Straight (non-premultiplied) RGBA bytes, as window-system icons expect.
pub fn to_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: f64, height: f64) -> BorderFrame {
        BorderFrame::new(
            1,
            Bounds {
                left: 100.0,
                top: 100.0,
                width,
                height,
            },
            15.0,
            0.0,
            1.0,
        )
    }

    #[test]
    fn canvas_surrounds_the_box_by_the_stroke_width() {
        let frame = frame(200.0, 150.0);
        assert_eq!(frame.canvas_left, 95.0);
        assert_eq!(frame.canvas_top, 95.0);
        assert_eq!(frame.canvas_width, 210.0);
        assert_eq!(frame.canvas_height, 160.0);
        assert_eq!(frame.outline.x, 2.5);
        assert_eq!(frame.outline.width, 205.0);
        assert_eq!(frame.outline.radius, 15.0);
        assert_eq!(frame.stops.len(), 8);
        assert_eq!(frame.stops[0].color, "#FF3B30");
    }

    #[test]
    fn radius_never_exceeds_half_the_short_side() {
        let frame = frame(200.0, 3.0);
        assert_eq!(frame.outline.radius, 4.0);
    }

    #[test]
    fn gradient_wraps_to_its_first_colour() {
        assert_eq!(gradient_color(0.0), [0xFF, 0x3B, 0x30]);
        assert_eq!(gradient_color(1.0), [0xFF, 0x3B, 0x30]);
        assert_eq!(gradient_color(0.42), [0x34, 0xC7, 0x59]);
    }

    #[test]
    fn sweep_starts_at_the_rotation_angle() {
        let near_zero = |p: f32| p < 1e-5 || p > 1.0 - 1e-5;
        assert!(near_zero(sweep_position(1.0, 0.0, 0.0)));
        assert!((sweep_position(0.0, 1.0, 0.0) - 0.25).abs() < 1e-5);
        assert!(near_zero(sweep_position(0.0, 1.0, 90.0)));
    }

    #[test]
    fn rasterized_border_is_opaque_on_the_stroke_and_clear_inside() {
        let frame = frame(60.0, 40.0);
        let pixmap = rasterize(&frame).unwrap();
        assert_eq!(pixmap.width(), 70);
        assert_eq!(pixmap.height(), 50);

        // Middle of the top edge sits on the stroke centre line.
        let on_stroke = pixmap.pixel(35, 2).unwrap();
        assert!(on_stroke.alpha() > 200);

        let inside = pixmap.pixel(35, 25).unwrap();
        assert_eq!(inside.alpha(), 0);
    }

    #[test]
    fn opacity_scales_alpha() {
        let mut faded = frame(60.0, 40.0);
        faded.opacity = 0.5;
        let pixmap = rasterize(&faded).unwrap();
        let alpha = pixmap.pixel(35, 2).unwrap().alpha();
        assert!((120..=135).contains(&alpha));
    }
}
