use std::time::{Duration, Instant};

use rand::Rng;

use super::animation::{AnimationLoop, AnimationState};
use super::border::BorderFrame;
use super::selection::{Bounds, SelectionBox};
use crate::clock::{Clock, Deadline};
use crate::settings::Settings;

/// Extra time a faded box stays around after its transition should be over.
pub const FADE_REMOVAL_MARGIN: Duration = Duration::from_millis(100);

/// How a drag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    /// No drag was active.
    Ignored,
    /// Too small to be a deliberate selection, or never drawn; removed without a fade.
    Discarded,
    /// Fading out; the box is removed after `removal_in`.
    Fading { removal_in: Duration },
}

struct Drag {
    id: u64,
    selection: SelectionBox,
    animation: AnimationState,
    animation_loop: Option<AnimationLoop>,
}

struct FadingBox {
    id: u64,
    selection: SelectionBox,
    animation: AnimationState,
    animation_loop: Option<AnimationLoop>,
    started: Instant,
    duration: Duration,
    removal: Deadline,
}

impl FadingBox {
    fn opacity(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let t = (now.saturating_duration_since(self.started).as_secs_f64()
            / self.duration.as_secs_f64())
        .min(1.0);
        // ease-out
        (1.0 - t) * (1.0 - t)
    }
}

fn fade_duration(settings: &Settings) -> Duration {
    Duration::try_from_secs_f64(settings.fade_out_duration).unwrap_or_else(|e| {
        log::warn!("Fade-out duration {} rejected: {}", settings.fade_out_duration, e);
        Duration::from_secs_f64(Settings::default().fade_out_duration)
    })
}

fn stop_loop(slot: &mut Option<AnimationLoop>) {
    if let Some(mut handle) = slot.take() {
        handle.cancel();
    }
}

fn frame_for(
    id: u64,
    selection: &SelectionBox,
    animation: &AnimationState,
    handle: &AnimationLoop,
    opacity: f64,
) -> BorderFrame {
    // Loop keeps the size it was started with; position follows the box.
    let sized = handle.bounds();
    let current = selection.bounds();
    let bounds = Bounds {
        left: current.left,
        top: current.top,
        width: sized.width,
        height: sized.height,
    };
    BorderFrame::new(
        id,
        bounds,
        handle.corner_radius(),
        animation.angle_offset_degrees(),
        opacity,
    )
}

/// Tracks the box being dragged and the boxes fading out after release.
pub struct OverlayRenderer<C, R> {
    clock: C,
    rng: R,
    enabled: bool,
    drawing_mode: bool,
    fade_out: Duration,
    drag: Option<Drag>,
    fading: Vec<FadingBox>,
    next_id: u64,
    next_generation: u64,
}

impl<C: Clock, R: Rng> OverlayRenderer<C, R> {
    pub fn new(clock: C, rng: R, settings: &Settings) -> Self {
        Self {
            clock,
            rng,
            enabled: true,
            drawing_mode: false,
            fade_out: fade_duration(settings),
            drag: None,
            fading: Vec::new(),
            next_id: 1,
            next_generation: 1,
        }
    }

    pub fn on_enabled_changed(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn on_drawing_mode_changed(&mut self, drawing_mode: bool) {
        self.drawing_mode = drawing_mode;
        if !drawing_mode {
            self.on_drawing_mode_exited();
        }
    }

    pub fn on_config_changed(&mut self, settings: &Settings) {
        self.fade_out = fade_duration(settings);
    }

    /// Drops an in-progress drag without fading it.
    pub fn on_drawing_mode_exited(&mut self) {
        if let Some(mut drag) = self.drag.take() {
            stop_loop(&mut drag.animation_loop);
            log::debug!("Drag {} aborted by drawing-mode exit", drag.id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.enabled && self.drawing_mode
    }

    /// Returns whether a drag was started.
    pub fn on_pointer_down(&mut self, x: f64, y: f64) -> bool {
        if !self.is_armed() || self.drag.is_some() {
            return false;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.drag = Some(Drag {
            id,
            selection: SelectionBox::at(x, y),
            animation: AnimationState::random(&mut self.rng),
            animation_loop: None,
        });
        log::debug!("Drag {} started at ({}, {})", id, x, y);
        true
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        let generation = self.next_generation;
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.selection.extend_to(x, y);

        if drag.selection.is_animatable() {
            stop_loop(&mut drag.animation_loop);
            drag.animation_loop = Some(AnimationLoop::start(
                generation,
                drag.selection.bounds(),
                drag.selection.corner_radius(),
            ));
            self.next_generation += 1;
        }
    }

    pub fn on_pointer_up(&mut self, x: f64, y: f64) -> DragEnd {
        if self.drag.is_none() {
            return DragEnd::Ignored;
        }
        self.on_pointer_move(x, y);
        let Some(mut drag) = self.drag.take() else {
            return DragEnd::Ignored;
        };

        // A box that never grew past the animation threshold has nothing to fade.
        if drag.selection.is_too_small() || drag.animation_loop.is_none() {
            stop_loop(&mut drag.animation_loop);
            log::debug!("Drag {} too small, discarded", drag.id);
            return DragEnd::Discarded;
        }

        let now = self.clock.now();
        let removal_in = self.fade_out + FADE_REMOVAL_MARGIN;
        let mut removal = Deadline::default();
        removal.arm(now, removal_in);
        self.fading.push(FadingBox {
            id: drag.id,
            selection: drag.selection,
            animation: drag.animation,
            animation_loop: drag.animation_loop,
            started: now,
            duration: self.fade_out,
            removal,
        });
        DragEnd::Fading { removal_in }
    }

    /// Renders one display frame and advances every live animation.
    pub fn tick(&mut self) -> Vec<BorderFrame> {
        let now = self.clock.now();

        self.fading.retain_mut(|fading| {
            if fading.removal.fire(now) {
                stop_loop(&mut fading.animation_loop);
                false
            } else {
                true
            }
        });

        let mut frames = Vec::new();
        if let Some(drag) = self.drag.as_mut() {
            if let Some(handle) = drag.animation_loop.as_ref().filter(|h| h.is_live()) {
                frames.push(frame_for(drag.id, &drag.selection, &drag.animation, handle, 1.0));
                drag.animation.advance();
            }
        }
        for fading in &mut self.fading {
            let opacity = fading.opacity(now);
            if let Some(handle) = fading.animation_loop.as_ref().filter(|h| h.is_live()) {
                frames.push(frame_for(
                    fading.id,
                    &fading.selection,
                    &fading.animation,
                    handle,
                    opacity,
                ));
                fading.animation.advance();
            }
        }
        frames
    }

    /// Nothing is being dragged or faded, so frames can stop.
    pub fn is_idle(&self) -> bool {
        self.drag.is_none() && self.fading.is_empty()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn active_selection(&self) -> Option<&SelectionBox> {
        self.drag.as_ref().map(|drag| &drag.selection)
    }

    pub fn active_animation(&self) -> Option<AnimationState> {
        self.drag.as_ref().map(|drag| drag.animation)
    }

    pub fn active_loop(&self) -> Option<&AnimationLoop> {
        self.drag.as_ref().and_then(|drag| drag.animation_loop.as_ref())
    }

    pub fn fading_selections(&self) -> impl Iterator<Item = &SelectionBox> {
        self.fading.iter().map(|fading| &fading.selection)
    }

    pub fn has_live_animation(&self) -> bool {
        let live = |slot: &Option<AnimationLoop>| slot.as_ref().is_some_and(AnimationLoop::is_live);
        self.drag.as_ref().is_some_and(|drag| live(&drag.animation_loop))
            || self.fading.iter().any(|fading| live(&fading.animation_loop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn armed() -> (OverlayRenderer<ManualClock, StdRng>, ManualClock) {
        let clock = ManualClock::new();
        let mut renderer =
            OverlayRenderer::new(clock.clone(), StdRng::seed_from_u64(42), &Settings::default());
        renderer.on_drawing_mode_changed(true);
        (renderer, clock)
    }

    #[test]
    fn pointer_down_is_ignored_until_armed() {
        let clock = ManualClock::new();
        let mut renderer =
            OverlayRenderer::new(clock, StdRng::seed_from_u64(1), &Settings::default());
        assert!(!renderer.on_pointer_down(10.0, 10.0));

        renderer.on_drawing_mode_changed(true);
        renderer.on_enabled_changed(false);
        assert!(!renderer.on_pointer_down(10.0, 10.0));
    }

    #[test]
    fn second_pointer_down_during_a_drag_is_ignored() {
        let (mut renderer, _) = armed();
        assert!(renderer.on_pointer_down(10.0, 10.0));
        assert!(!renderer.on_pointer_down(50.0, 50.0));
        assert_eq!(renderer.active_selection().unwrap().origin(), (10.0, 10.0));
    }

    #[test]
    fn resize_restarts_the_loop_but_keeps_the_angle() {
        let (mut renderer, _) = armed();
        renderer.on_pointer_down(0.0, 0.0);
        renderer.on_pointer_move(5.0, 5.0);
        assert!(renderer.active_loop().is_none());

        renderer.on_pointer_move(50.0, 50.0);
        let first = renderer.active_loop().unwrap().generation();
        renderer.tick();
        renderer.tick();
        let angle = renderer.active_animation().unwrap().angle_offset_degrees();

        renderer.on_pointer_move(80.0, 60.0);
        let restarted = renderer.active_loop().unwrap();
        assert!(restarted.generation() > first);
        assert_eq!(restarted.bounds().width, 80.0);
        assert_eq!(
            renderer.active_animation().unwrap().angle_offset_degrees(),
            angle
        );
    }

    #[test]
    fn each_tick_advances_the_angle_by_two_degrees() {
        let (mut renderer, _) = armed();
        renderer.on_pointer_down(0.0, 0.0);
        renderer.on_pointer_move(100.0, 100.0);
        let start = renderer.active_animation().unwrap().angle_offset_degrees();

        let frames = renderer.tick();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].angle_degrees, start);
        let next = renderer.active_animation().unwrap().angle_offset_degrees();
        assert!(((next - start).rem_euclid(360.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn fading_box_keeps_animating_with_falling_opacity() {
        let (mut renderer, clock) = armed();
        renderer.on_pointer_down(0.0, 0.0);
        renderer.on_pointer_move(100.0, 100.0);
        renderer.on_pointer_up(100.0, 100.0);

        let first = renderer.tick();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].opacity, 1.0);

        clock.advance(Duration::from_millis(750));
        let mid = renderer.tick();
        assert_eq!(mid.len(), 1);
        assert!(mid[0].opacity < 1.0 && mid[0].opacity > 0.0);

        clock.advance(Duration::from_millis(850));
        assert!(renderer.tick().is_empty());
        assert!(renderer.is_idle());
        assert!(!renderer.has_live_animation());
    }

    #[test]
    fn fade_duration_follows_config_changes() {
        let (mut renderer, _) = armed();
        renderer.on_config_changed(&Settings {
            fade_out_duration: 0.5,
            ..Settings::default()
        });
        renderer.on_pointer_down(0.0, 0.0);
        renderer.on_pointer_move(40.0, 40.0);
        assert_eq!(
            renderer.on_pointer_up(40.0, 40.0),
            DragEnd::Fading {
                removal_in: Duration::from_millis(600)
            }
        );
    }

    #[test]
    fn pointer_up_without_a_drag_is_ignored() {
        let (mut renderer, _) = armed();
        assert_eq!(renderer.on_pointer_up(1.0, 1.0), DragEnd::Ignored);
    }
}
