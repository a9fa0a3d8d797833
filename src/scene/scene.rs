//! The scene capability and the context handed to scenes while they update.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use super::transition::Transition;
use crate::canvas::Canvas;
use crate::error::TransitionError;

/// One self-contained mode of the application: a menu, a level, a cutscene.
///
/// `T` is the shared state owned by the [`SceneManager`](super::SceneManager) and
/// passed to every callback; `C` is the canvas type the host renders with. A scene
/// may also keep any scene-local state it likes.
///
/// The four lifecycle hooks default to doing nothing. For a scene entered at
/// construction time `enter_start` and `enter_end` run back to back; for a scene
/// entered through a transition, `enter_end` runs once the transition finishes.
pub trait Scene<T, C: Canvas> {
    /// A transition into this scene has started. Load resources and reset local state.
    fn enter_start(&mut self, _state: &mut T) {}

    /// The scene is fully active. Re-enable anything disabled during the transition.
    fn enter_end(&mut self, _state: &mut T) {}

    /// A transition away from this scene has started. Pause mechanics if desired.
    fn exit_start(&mut self, _state: &mut T) {}

    /// The transition away from this scene finished. Release resources here.
    fn exit_end(&mut self, _state: &mut T) {}

    /// Advance one frame of logic.
    ///
    /// Called every frame while the scene is current, and while it is either side
    /// of a running transition. An error aborts the frame and reaches the host
    /// unchanged.
    fn update(&mut self, ctx: &mut SceneContext<'_, T, C>) -> anyhow::Result<()>;

    /// Render the scene into `target`, either the screen or an off-screen canvas.
    fn draw(&mut self, state: &mut T, target: &mut C);

    /// Report the logical resolution for the given outer size.
    ///
    /// Only the current scene is asked. The default keeps the outer size.
    fn layout(&mut self, _state: &mut T, outside_width: u32, outside_height: u32) -> (u32, u32) {
        (outside_width, outside_height)
    }
}

/// A scene and the transition that will bring it in.
pub(crate) struct Handoff<T, C: Canvas> {
    pub(crate) scene: Box<dyn Scene<T, C>>,
    pub(crate) transition: Box<dyn Transition<C>>,
}

/// What a scene sees during [`Scene::update`]: the shared state, plus a way to
/// ask the manager for a transition.
pub struct SceneContext<'a, T, C: Canvas> {
    /// The shared application state.
    pub state: &'a mut T,
    transitioning: bool,
    request: &'a mut Option<Handoff<T, C>>,
}

impl<'a, T, C: Canvas> SceneContext<'a, T, C> {
    pub(crate) fn new(
        state: &'a mut T,
        request: &'a mut Option<Handoff<T, C>>,
        transitioning: bool,
    ) -> Self {
        Self {
            state,
            transitioning,
            request,
        }
    }

    /// Whether a transition is running, or has already been requested this frame.
    pub fn is_transitioning(&self) -> bool {
        self.transitioning || self.request.is_some()
    }

    /// Request a transition to `scene`.
    ///
    /// The transition starts as soon as the calling scene's `update` returns, before
    /// the manager hands control back to the host, so `exit_start` on the calling
    /// scene and `enter_start` on `scene` have not run yet when this returns. Fails with
    /// [`TransitionError::AlreadyTransitioning`] if a transition is running or was
    /// already requested; nothing changes in that case.
    pub fn transition_to<S, X>(&mut self, scene: S, transition: X) -> Result<(), TransitionError>
    where
        S: Scene<T, C> + 'static,
        X: Transition<C> + 'static,
    {
        if self.is_transitioning() {
            warn!("Rejected transition request: another transition is in flight");
            return Err(TransitionError::AlreadyTransitioning);
        }
        *self.request = Some(Handoff {
            scene: Box::new(scene),
            transition: Box::new(transition),
        });
        Ok(())
    }
}

impl<T, C: Canvas, S: Scene<T, C> + ?Sized> Scene<T, C> for Box<S> {
    fn enter_start(&mut self, state: &mut T) {
        (**self).enter_start(state)
    }

    fn enter_end(&mut self, state: &mut T) {
        (**self).enter_end(state)
    }

    fn exit_start(&mut self, state: &mut T) {
        (**self).exit_start(state)
    }

    fn exit_end(&mut self, state: &mut T) {
        (**self).exit_end(state)
    }

    fn update(&mut self, ctx: &mut SceneContext<'_, T, C>) -> anyhow::Result<()> {
        (**self).update(ctx)
    }

    fn draw(&mut self, state: &mut T, target: &mut C) {
        (**self).draw(state, target)
    }

    fn layout(&mut self, state: &mut T, outside_width: u32, outside_height: u32) -> (u32, u32) {
        (**self).layout(state, outside_width, outside_height)
    }
}

/// Shared scenes.
///
/// Lets the same scene instance be held as both the current and the next scene,
/// e.g. to replay its enter hooks through a self-transition. Every callback takes a
/// short `borrow_mut`, so a scene must not reach its own `Rc` from inside a callback.
impl<T, C: Canvas, S: Scene<T, C> + ?Sized> Scene<T, C> for Rc<RefCell<S>> {
    fn enter_start(&mut self, state: &mut T) {
        self.borrow_mut().enter_start(state)
    }

    fn enter_end(&mut self, state: &mut T) {
        self.borrow_mut().enter_end(state)
    }

    fn exit_start(&mut self, state: &mut T) {
        self.borrow_mut().exit_start(state)
    }

    fn exit_end(&mut self, state: &mut T) {
        self.borrow_mut().exit_end(state)
    }

    fn update(&mut self, ctx: &mut SceneContext<'_, T, C>) -> anyhow::Result<()> {
        self.borrow_mut().update(ctx)
    }

    fn draw(&mut self, state: &mut T, target: &mut C) {
        self.borrow_mut().draw(state, target)
    }

    fn layout(&mut self, state: &mut T, outside_width: u32, outside_height: u32) -> (u32, u32) {
        self.borrow_mut().layout(state, outside_width, outside_height)
    }
}
