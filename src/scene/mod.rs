//! Scene management.
//!
//! A [`SceneManager`] owns one active scene and, while a transition is in flight,
//! the scene being transitioned to. Visual blending between the two is delegated
//! to a [`Transition`].
//!
//! # Lifecycle
//!
//! ```text
//! new(first)            first.enter_start, first.enter_end
//! transition(b, t)      t.start, a.exit_start, b.enter_start
//! update() per frame    a.update, b.update, t.update
//!   t finished          a.exit_end, b.enter_end, b becomes current
//! ```
//!
//! # Example
//!
//! ```
//! use prestige::scene::{FadeTransition, Scene, SceneContext, SceneManager};
//! use prestige::{Canvas, Color, ImageCanvas};
//!
//! struct Game {
//!     score: u32,
//! }
//!
//! struct Title;
//! struct Level;
//!
//! impl Scene<Game, ImageCanvas> for Title {
//!     fn update(&mut self, ctx: &mut SceneContext<'_, Game, ImageCanvas>) -> anyhow::Result<()> {
//!         ctx.transition_to(Level, FadeTransition::new(0.5)?)?;
//!         Ok(())
//!     }
//!
//!     fn draw(&mut self, _game: &mut Game, target: &mut ImageCanvas) {
//!         target.fill(Color::BLACK);
//!     }
//! }
//!
//! impl Scene<Game, ImageCanvas> for Level {
//!     fn enter_start(&mut self, game: &mut Game) {
//!         game.score = 0;
//!     }
//!
//!     fn update(&mut self, ctx: &mut SceneContext<'_, Game, ImageCanvas>) -> anyhow::Result<()> {
//!         ctx.state.score += 1;
//!         Ok(())
//!     }
//!
//!     fn draw(&mut self, _game: &mut Game, target: &mut ImageCanvas) {
//!         target.fill(Color::WHITE);
//!     }
//! }
//!
//! let mut manager = SceneManager::new(Title, Game { score: 7 });
//! manager.update()?;
//! assert!(manager.is_transitioning());
//! assert_eq!(manager.state().score, 0);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod clock;
mod manager;
mod scene;
mod transition;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::SceneManager;
pub use scene::{Scene, SceneContext};
pub use transition::{FadeFrame, FadeTransition, SimpleTransition, Transition, fade_frame};
