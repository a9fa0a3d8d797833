//! The scene manager state machine.

use log::{debug, trace, warn};

use super::scene::{Handoff, Scene, SceneContext};
use super::transition::Transition;
use crate::canvas::{Canvas, Color};
use crate::error::TransitionError;

/// Owns the current scene and drives hand-offs to the next one.
///
/// The manager is either idle, with only a current scene, or transitioning, with a
/// current scene, a next scene, an active [`Transition`] and two off-screen
/// canvases the scenes draw into while the transition composites them.
///
/// The host calls [`update`](Self::update) then [`draw`](Self::draw) once per
/// frame, and [`layout`](Self::layout) whenever it needs the logical resolution.
///
/// # Example
///
/// ```
/// use prestige::{Canvas, Color, ImageCanvas, SceneContext, Scene, SceneManager, SimpleTransition};
///
/// struct Solid(Color);
///
/// impl Scene<u32, ImageCanvas> for Solid {
///     fn update(&mut self, ctx: &mut SceneContext<'_, u32, ImageCanvas>) -> anyhow::Result<()> {
///         *ctx.state += 1;
///         Ok(())
///     }
///
///     fn draw(&mut self, _state: &mut u32, target: &mut ImageCanvas) {
///         target.fill(self.0);
///     }
/// }
///
/// let mut manager = SceneManager::new(Solid(Color::BLACK), 0u32);
/// manager.transition(Solid(Color::WHITE), SimpleTransition).unwrap();
/// manager.update().unwrap();
///
/// let mut screen = ImageCanvas::new(4, 4);
/// manager.draw(&mut screen);
/// assert_eq!(screen.pixel(0, 0), [255, 255, 255, 255]);
/// assert_eq!(*manager.state(), 2);
/// ```
pub struct SceneManager<T, C: Canvas> {
    state: T,
    current: Box<dyn Scene<T, C>>,

    /// Next scene and the transition bringing it in; present only while transitioning.
    active: Option<Handoff<T, C>>,

    current_image: Option<C>,
    next_image: Option<C>,

    /// Transition requested by a scene during the update in progress.
    request: Option<Handoff<T, C>>,
}

impl<T, C: Canvas> SceneManager<T, C> {
    /// Create a manager that starts fully entered into `first_scene`.
    ///
    /// `enter_start` and then `enter_end` run on the first scene before this returns;
    /// no transition plays for it.
    pub fn new<S>(first_scene: S, state: T) -> Self
    where
        S: Scene<T, C> + 'static,
    {
        let mut state = state;
        let mut current: Box<dyn Scene<T, C>> = Box::new(first_scene);
        current.enter_start(&mut state);
        current.enter_end(&mut state);

        Self {
            state,
            current,
            active: None,
            current_image: None,
            next_image: None,
            request: None,
        }
    }

    /// Start a transition to `dest`.
    ///
    /// Only legal while idle. While another transition is running this returns
    /// [`TransitionError::AlreadyTransitioning`] and changes nothing; requests are
    /// never queued.
    ///
    /// On success `transition.start()`, then the current scene's `exit_start`, then
    /// `dest.enter_start` have run before this returns.
    pub fn transition<S, X>(&mut self, dest: S, transition: X) -> Result<(), TransitionError>
    where
        S: Scene<T, C> + 'static,
        X: Transition<C> + 'static,
    {
        if self.active.is_some() {
            warn!("Rejected transition request: another transition is in flight");
            return Err(TransitionError::AlreadyTransitioning);
        }

        self.begin(Handoff {
            scene: Box::new(dest),
            transition: Box::new(transition),
        });
        Ok(())
    }

    /// Advance one frame.
    ///
    /// While idle only the current scene updates. While transitioning the current
    /// scene, the next scene and then the transition update, in that order; on the
    /// frame the transition reports completion the current scene gets `exit_end`,
    /// the next scene gets `enter_end` and becomes current.
    ///
    /// A scene error is returned as is. Nothing past the failing call is committed.
    pub fn update(&mut self) -> anyhow::Result<()> {
        let Some(active) = self.active.as_mut() else {
            let mut ctx = SceneContext::new(&mut self.state, &mut self.request, false);
            let result = self.current.update(&mut ctx);

            if let Some(handoff) = self.request.take() {
                self.begin(handoff);
            }
            return result;
        };

        let mut ctx = SceneContext::new(&mut self.state, &mut self.request, true);
        self.current.update(&mut ctx)?;
        active.scene.update(&mut ctx)?;

        if active.transition.update() {
            self.finish();
        }
        Ok(())
    }

    /// Render one frame onto `screen`.
    ///
    /// While idle the current scene draws straight onto `screen`. While
    /// transitioning both scenes draw into off-screen canvases sized exactly like
    /// `screen`, and the transition composites them onto it.
    pub fn draw(&mut self, screen: &mut C) {
        let Some(active) = self.active.as_mut() else {
            self.current.draw(&mut self.state, screen);
            return;
        };

        let current_image = fit_offscreen(&mut self.current_image, screen, "current");
        let next_image = fit_offscreen(&mut self.next_image, screen, "next");

        self.current.draw(&mut self.state, current_image);
        active.scene.draw(&mut self.state, next_image);

        active
            .transition
            .interpolate(screen, current_image, next_image);
    }

    /// Logical resolution for the given outer size, as reported by the current scene.
    ///
    /// During a transition the next scene's preference is ignored.
    pub fn layout(&mut self, outside_width: u32, outside_height: u32) -> (u32, u32) {
        self.current
            .layout(&mut self.state, outside_width, outside_height)
    }

    /// Whether a transition is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    /// The shared state.
    ///
    /// Custom hosts and transitions that depend on application state (scores on a
    /// transition screen, say) read it here.
    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    pub fn into_state(self) -> T {
        self.state
    }

    /// Sizes of the current and next off-screen canvases, if allocated.
    pub fn offscreen_sizes(&self) -> (Option<(u32, u32)>, Option<(u32, u32)>) {
        (
            self.current_image.as_ref().map(Canvas::size),
            self.next_image.as_ref().map(Canvas::size),
        )
    }

    fn begin(&mut self, mut handoff: Handoff<T, C>) {
        self.release_offscreen();

        handoff.transition.start();
        self.current.exit_start(&mut self.state);
        handoff.scene.enter_start(&mut self.state);

        debug!("Scene transition started");
        self.active = Some(handoff);
    }

    fn finish(&mut self) {
        let Some(Handoff {
            scene: mut next,
            transition,
        }) = self.active.take()
        else {
            return;
        };

        self.current.exit_end(&mut self.state);
        next.enter_end(&mut self.state);

        drop(transition);
        self.release_offscreen();

        self.current = next;
        debug!("Scene transition finished");
    }

    fn release_offscreen(&mut self) {
        self.current_image = None;
        self.next_image = None;
    }
}

/// Make sure `slot` holds a canvas exactly the size of `screen`, cleared for drawing.
fn fit_offscreen<'a, C: Canvas>(slot: &'a mut Option<C>, screen: &C, name: &str) -> &'a mut C {
    let (width, height) = screen.size();
    if slot
        .as_ref()
        .is_none_or(|canvas| canvas.size() != (width, height))
    {
        trace!("Allocating {name} off-screen canvas at {width}x{height}");
        *slot = Some(screen.create_offscreen(width, height));
    }

    let canvas = slot.get_or_insert_with(|| screen.create_offscreen(width, height));
    canvas.fill(Color::TRANSPARENT);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ImageCanvas;
    use crate::scene::clock::ManualClock;
    use crate::scene::transition::{FadeTransition, SimpleTransition};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct World {
        events: Vec<String>,
        fail: Option<&'static str>,
        switch_to: Option<&'static str>,
    }

    impl World {
        fn drain(&mut self) -> Vec<String> {
            std::mem::take(&mut self.events)
        }
    }

    struct Tracer {
        name: &'static str,
        color: Color,
        resolution: (u32, u32),
    }

    impl Tracer {
        fn new(name: &'static str) -> Self {
            let shade = name.bytes().next().unwrap_or(0);
            Self {
                name,
                color: Color::from_rgba8(shade, 0, 255 - shade, 255),
                resolution: (shade as u32, shade as u32 * 2),
            }
        }
    }

    impl Scene<World, ImageCanvas> for Tracer {
        fn enter_start(&mut self, state: &mut World) {
            state.events.push(format!("{}:enter_start", self.name));
        }

        fn enter_end(&mut self, state: &mut World) {
            state.events.push(format!("{}:enter_end", self.name));
        }

        fn exit_start(&mut self, state: &mut World) {
            state.events.push(format!("{}:exit_start", self.name));
        }

        fn exit_end(&mut self, state: &mut World) {
            state.events.push(format!("{}:exit_end", self.name));
        }

        fn update(&mut self, ctx: &mut SceneContext<'_, World, ImageCanvas>) -> anyhow::Result<()> {
            ctx.state.events.push(format!("{}:update", self.name));
            if ctx.state.fail == Some(self.name) {
                anyhow::bail!("{} failed", self.name);
            }
            if let Some(target) = ctx.state.switch_to.take()
                && ctx.transition_to(Tracer::new(target), SimpleTransition).is_err()
            {
                ctx.state.events.push(format!("{}:rejected", self.name));
            }
            Ok(())
        }

        fn draw(&mut self, state: &mut World, target: &mut ImageCanvas) {
            state.events.push(format!("{}:draw", self.name));
            target.fill(self.color);
        }

        fn layout(&mut self, _state: &mut World, _w: u32, _h: u32) -> (u32, u32) {
            self.resolution
        }
    }

    /// Finishes when told to, and shows the outgoing image while running.
    struct Gate {
        done: Rc<Cell<bool>>,
        starts: Rc<Cell<u32>>,
    }

    impl Transition<ImageCanvas> for Gate {
        fn start(&mut self) {
            self.starts.set(self.starts.get() + 1);
        }

        fn update(&mut self) -> bool {
            self.done.get()
        }

        fn interpolate(&self, screen: &mut ImageCanvas, src: &ImageCanvas, _dest: &ImageCanvas) {
            screen.draw_canvas(src, 1.0);
        }
    }

    fn gate() -> (Gate, Rc<Cell<bool>>, Rc<Cell<u32>>) {
        let done = Rc::new(Cell::new(false));
        let starts = Rc::new(Cell::new(0));
        let gate = Gate {
            done: Rc::clone(&done),
            starts: Rc::clone(&starts),
        };
        (gate, done, starts)
    }

    fn manager() -> SceneManager<World, ImageCanvas> {
        let mut manager = SceneManager::new(Tracer::new("a"), World::default());
        manager.state_mut().drain();
        manager
    }

    fn screen() -> ImageCanvas {
        let mut screen = ImageCanvas::new(4, 3);
        screen.fill(Color::BLACK);
        screen
    }

    #[test]
    fn construction_enters_first_scene() {
        let mut manager = SceneManager::new(Tracer::new("a"), World::default());
        assert_eq!(manager.state().events, ["a:enter_start", "a:enter_end"]);
        assert!(!manager.is_transitioning());
        assert_eq!(manager.layout(640, 360), Tracer::new("a").resolution);
    }

    #[test]
    fn idle_frame_goes_straight_to_current() {
        let mut manager = manager();
        manager.update().unwrap();
        let mut screen = screen();
        manager.draw(&mut screen);

        assert_eq!(manager.state_mut().drain(), ["a:update", "a:draw"]);
        assert_eq!(screen.pixel(0, 0), Tracer::new("a").color.to_rgba8());
        assert_eq!(manager.offscreen_sizes(), (None, None));
    }

    #[test]
    fn transition_runs_start_hooks_before_returning() {
        let mut manager = manager();
        let (gate, _done, starts) = gate();

        manager.transition(Tracer::new("b"), gate).unwrap();

        assert_eq!(starts.get(), 1);
        assert_eq!(manager.state_mut().drain(), ["a:exit_start", "b:enter_start"]);
        assert!(manager.is_transitioning());
        assert_eq!(manager.offscreen_sizes(), (None, None));
    }

    #[test]
    fn second_request_is_rejected_and_changes_nothing() {
        let mut manager = manager();
        let (first, done, starts) = gate();
        manager.transition(Tracer::new("b"), first).unwrap();
        manager.state_mut().drain();

        let (second, _, second_starts) = gate();
        let err = manager.transition(Tracer::new("c"), second).unwrap_err();

        assert_eq!(err, TransitionError::AlreadyTransitioning);
        assert_eq!(second_starts.get(), 0);
        assert_eq!(starts.get(), 1);
        assert!(manager.state().events.is_empty());

        done.set(true);
        manager.update().unwrap();
        assert_eq!(manager.layout(1, 1), Tracer::new("b").resolution);
        assert!(!manager.state().events.iter().any(|e| e.starts_with("c:")));
    }

    #[test]
    fn transition_completes_on_first_finished_frame() {
        let mut manager = manager();
        let (gate, done, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();
        manager.state_mut().drain();

        manager.update().unwrap();
        manager.update().unwrap();
        assert_eq!(
            manager.state_mut().drain(),
            ["a:update", "b:update", "a:update", "b:update"]
        );
        assert!(manager.is_transitioning());

        done.set(true);
        manager.update().unwrap();
        assert_eq!(
            manager.state_mut().drain(),
            ["a:update", "b:update", "a:exit_end", "b:enter_end"]
        );
        assert!(!manager.is_transitioning());

        manager.update().unwrap();
        assert_eq!(manager.state_mut().drain(), ["b:update"]);
    }

    #[test]
    fn offscreen_canvases_live_only_while_transitioning() {
        let mut manager = manager();
        let (gate, done, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();

        let mut screen = screen();
        manager.draw(&mut screen);
        assert_eq!(manager.offscreen_sizes(), (Some((4, 3)), Some((4, 3))));

        done.set(true);
        manager.update().unwrap();
        assert_eq!(manager.offscreen_sizes(), (None, None));

        // Idle again: drawing goes straight to the screen
        manager.draw(&mut screen);
        assert_eq!(manager.offscreen_sizes(), (None, None));
        assert_eq!(screen.pixel(0, 0), Tracer::new("b").color.to_rgba8());
    }

    #[test]
    fn offscreen_canvases_follow_screen_size() {
        let mut manager = manager();
        let (gate, _, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();

        manager.draw(&mut ImageCanvas::new(4, 3));
        assert_eq!(manager.offscreen_sizes(), (Some((4, 3)), Some((4, 3))));

        manager.draw(&mut ImageCanvas::new(8, 6));
        assert_eq!(manager.offscreen_sizes(), (Some((8, 6)), Some((8, 6))));
    }

    #[test]
    fn transitioning_draw_composites_both_scenes() {
        let mut manager = manager();
        let clock = ManualClock::new();
        let fade = FadeTransition::with_clock(1.0, clock.clone()).unwrap();
        manager.transition(Tracer::new("b"), fade).unwrap();
        manager.state_mut().drain();

        let mut first_frame = screen();
        manager.draw(&mut first_frame);
        assert_eq!(manager.state_mut().drain(), ["a:draw", "b:draw"]);
        assert_eq!(first_frame.pixel(2, 2), Tracer::new("a").color.to_rgba8());

        clock.set_secs(1.0);
        let mut last_frame = screen();
        manager.draw(&mut last_frame);
        assert_eq!(last_frame.pixel(2, 2), Tracer::new("b").color.to_rgba8());

        manager.update().unwrap();
        assert!(manager.is_transitioning());
        clock.set_secs(1.01);
        manager.update().unwrap();
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn immediate_cut_switches_after_one_update() {
        let mut manager = manager();
        manager.transition(Tracer::new("b"), SimpleTransition).unwrap();

        // The no-op interpolation leaves the screen as the host cleared it
        let mut screen = screen();
        manager.draw(&mut screen);
        assert_eq!(screen.pixel(0, 0), [0, 0, 0, 255]);

        manager.update().unwrap();
        assert!(!manager.is_transitioning());
        assert_eq!(manager.layout(1, 1), Tracer::new("b").resolution);
        assert_eq!(manager.offscreen_sizes(), (None, None));
    }

    #[test]
    fn layout_ignores_next_scene_during_transition() {
        let mut manager = manager();
        let (gate, _, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();
        assert_eq!(manager.layout(800, 600), Tracer::new("a").resolution);
    }

    #[test]
    fn scene_error_aborts_frame_without_committing() {
        let mut manager = manager();
        let (gate, done, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();
        manager.state_mut().drain();
        done.set(true);

        manager.state_mut().fail = Some("b");
        let err = manager.update().unwrap_err();
        assert_eq!(err.to_string(), "b failed");
        assert!(manager.is_transitioning());
        assert_eq!(manager.state_mut().drain(), ["a:update", "b:update"]);

        manager.state_mut().fail = Some("a");
        let err = manager.update().unwrap_err();
        assert_eq!(err.to_string(), "a failed");
        assert!(manager.is_transitioning());
        assert_eq!(manager.state_mut().drain(), ["a:update"]);

        manager.state_mut().fail = None;
        manager.update().unwrap();
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn idle_error_is_passed_through() {
        #[derive(Debug, thiserror::Error)]
        #[error("save file corrupt")]
        struct Corrupt;

        struct Broken;
        impl Scene<(), ImageCanvas> for Broken {
            fn update(&mut self, _ctx: &mut SceneContext<'_, (), ImageCanvas>) -> anyhow::Result<()> {
                Err(Corrupt.into())
            }
            fn draw(&mut self, _state: &mut (), _target: &mut ImageCanvas) {}
        }

        let mut manager = SceneManager::new(Broken, ());
        let err = manager.update().unwrap_err();
        assert!(err.downcast_ref::<Corrupt>().is_some());
    }

    #[test]
    fn scene_can_request_transition_from_update() {
        let mut manager = manager();
        manager.state_mut().switch_to = Some("b");

        manager.update().unwrap();
        assert_eq!(
            manager.state_mut().drain(),
            ["a:update", "a:exit_start", "b:enter_start"]
        );
        assert!(manager.is_transitioning());

        manager.update().unwrap();
        assert_eq!(
            manager.state_mut().drain(),
            ["a:update", "b:update", "a:exit_end", "b:enter_end"]
        );
        assert_eq!(manager.layout(1, 1), Tracer::new("b").resolution);
    }

    #[test]
    fn scene_request_runs_hooks_after_update_returns() {
        struct Pausing {
            paused: Rc<Cell<bool>>,
        }

        impl Scene<World, ImageCanvas> for Pausing {
            fn exit_start(&mut self, state: &mut World) {
                self.paused.set(true);
                state.events.push("a:exit_start".to_string());
            }

            fn update(&mut self, ctx: &mut SceneContext<'_, World, ImageCanvas>) -> anyhow::Result<()> {
                ctx.transition_to(Tracer::new("b"), SimpleTransition)?;
                assert!(ctx.is_transitioning());
                let paused = self.paused.get();
                ctx.state.events.push(format!("a:requested paused={paused}"));
                Ok(())
            }

            fn draw(&mut self, _state: &mut World, _target: &mut ImageCanvas) {}
        }

        let paused = Rc::new(Cell::new(false));
        let scene = Pausing {
            paused: Rc::clone(&paused),
        };
        let mut manager = SceneManager::new(scene, World::default());
        assert!(!manager.is_transitioning());

        manager.update().unwrap();
        assert_eq!(
            manager.state_mut().drain(),
            ["a:requested paused=false", "a:exit_start", "b:enter_start"]
        );
        assert!(paused.get());
        assert!(manager.is_transitioning());
    }

    #[test]
    fn scene_request_during_transition_is_rejected() {
        let mut manager = manager();
        let (gate, _, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();
        manager.state_mut().drain();

        manager.state_mut().switch_to = Some("c");
        manager.update().unwrap();
        assert_eq!(
            manager.state_mut().drain(),
            ["a:update", "a:rejected", "b:update"]
        );
        assert_eq!(manager.layout(1, 1), Tracer::new("a").resolution);
    }

    #[test]
    fn self_transition_with_shared_scene() {
        let shared = Rc::new(RefCell::new(Tracer::new("a")));
        let mut manager = SceneManager::new(Rc::clone(&shared), World::default());
        manager.state_mut().drain();

        manager
            .transition(Rc::clone(&shared), SimpleTransition)
            .unwrap();
        manager.update().unwrap();

        assert_eq!(
            manager.state_mut().drain(),
            [
                "a:exit_start",
                "a:enter_start",
                "a:update",
                "a:update",
                "a:exit_end",
                "a:enter_end"
            ]
        );
        assert!(!manager.is_transitioning());
        assert_eq!(Rc::strong_count(&shared), 2);
    }

    #[test]
    fn full_cycle_returns_to_clean_idle() {
        let mut manager = manager();
        let (gate, done, _) = gate();
        manager.transition(Tracer::new("b"), gate).unwrap();
        let mut screen = screen();
        manager.update().unwrap();
        manager.draw(&mut screen);
        done.set(true);
        manager.update().unwrap();

        assert!(!manager.is_transitioning());
        assert_eq!(manager.offscreen_sizes(), (None, None));

        // A new transition can start right away
        manager.transition(Tracer::new("c"), SimpleTransition).unwrap();
        manager.update().unwrap();
        assert_eq!(manager.layout(1, 1), Tracer::new("c").resolution);
    }
}
