//! The transition protocol and the built-in transition effects.

use std::time::Duration;

use super::clock::{Clock, SystemClock};
use crate::canvas::Canvas;
use crate::error::TransitionError;

/// A visual effect that blends the outgoing scene into the incoming one.
///
/// The manager owns a transition for exactly one hand-off and drops it once
/// [`update`](Transition::update) reports completion. Per transition the calls are:
///
/// 1. `start` once, before anything else.
/// 2. Every frame: `update` after both scenes updated, then `interpolate` after
///    both scenes drew into their off-screen canvases.
pub trait Transition<C: Canvas> {
    /// Called once when the transition begins. Capture a start time or reset progress here.
    fn start(&mut self);

    /// Advance the transition and return whether it has finished.
    ///
    /// The first `true` ends the transition; it is never queried again.
    fn update(&mut self) -> bool;

    /// Composite one frame onto `screen` from the outgoing (`src`) and incoming
    /// (`dest`) scene images.
    fn interpolate(&self, screen: &mut C, src: &C, dest: &C);
}

/// Switches to the next scene on the first frame, without any visual effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleTransition;

impl SimpleTransition {
    pub fn new() -> Self {
        Self
    }
}

impl<C: Canvas> Transition<C> for SimpleTransition {
    fn start(&mut self) {}

    fn update(&mut self) -> bool {
        true
    }

    fn interpolate(&self, _screen: &mut C, _src: &C, _dest: &C) {}
}

fn validate_duration(duration: f64) -> Result<f64, TransitionError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(duration)
    } else {
        Err(TransitionError::InvalidDuration(duration))
    }
}

/// Which image a fade draws for a given progress, and at what alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FadeFrame {
    /// First half: the outgoing scene, fading to transparent.
    Source { alpha: f32 },
    /// Second half: the incoming scene, fading in from transparent.
    Destination { alpha: f32 },
}

/// The two-phase fade law for normalized progress `t`.
///
/// Below `0.5` the source is drawn at `1 - t/0.5`; from `0.5` on the destination
/// is drawn at `t/0.5 - 1`. At exactly `0.5` the destination branch is taken with
/// alpha `0`, so the midpoint frame shows neither scene.
pub fn fade_frame(t: f64) -> FadeFrame {
    if t < 0.5 {
        FadeFrame::Source {
            alpha: (1.0 - t / 0.5) as f32,
        }
    } else {
        FadeFrame::Destination {
            alpha: (t / 0.5 - 1.0) as f32,
        }
    }
}

/// Fades the current scene out during the first half of the duration, then fades
/// the next scene in during the second half.
///
/// Scenes that want to freeze input during the fade can do so in
/// `exit_start`/`enter_start` and unfreeze in `enter_end`.
#[derive(Clone, Debug)]
pub struct FadeTransition<K: Clock = SystemClock> {
    clock: K,
    started_at: Duration,
    duration: f64,
}

impl FadeTransition {
    /// A fade lasting `duration` seconds in total, timed by the system clock.
    pub fn new(duration: f64) -> Result<Self, TransitionError> {
        Self::with_clock(duration, SystemClock::new())
    }
}

impl<K: Clock> FadeTransition<K> {
    /// A fade lasting `duration` seconds, timed by `clock`.
    pub fn with_clock(duration: f64, clock: K) -> Result<Self, TransitionError> {
        let duration = validate_duration(duration)?;
        let started_at = clock.now();
        Ok(Self {
            clock,
            started_at,
            duration,
        })
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds since [`Transition::start`].
    pub fn elapsed(&self) -> f64 {
        self.clock.now().saturating_sub(self.started_at).as_secs_f64()
    }

    /// Normalized progress, `elapsed / duration`. May exceed `1.0` on the last frame.
    pub fn progress(&self) -> f64 {
        self.elapsed() / self.duration
    }

    /// What [`interpolate`](Transition::interpolate) draws right now.
    pub fn frame(&self) -> FadeFrame {
        fade_frame(self.progress())
    }
}

impl<C: Canvas, K: Clock> Transition<C> for FadeTransition<K> {
    fn start(&mut self) {
        self.started_at = self.clock.now();
    }

    fn update(&mut self) -> bool {
        self.elapsed() > self.duration
    }

    fn interpolate(&self, screen: &mut C, src: &C, dest: &C) {
        match self.frame() {
            FadeFrame::Source { alpha } => screen.draw_canvas(src, alpha.clamp(0.0, 1.0)),
            FadeFrame::Destination { alpha } => screen.draw_canvas(dest, alpha.clamp(0.0, 1.0)),
        }
    }
}
