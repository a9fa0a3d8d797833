//! # Prestige
//!
//! **Scene management with animated transitions for frame-driven games.**
//!
//! A [`SceneManager`] owns the current scene plus your shared state, forwards the
//! host's per-frame `update`, `draw` and `layout` calls, and while a transition is
//! running renders both scenes into off-screen canvases and lets a [`Transition`]
//! composite them onto the screen.
//!
//! ## Quick Start
//!
//! ```no_run
//! use prestige::*;
//!
//! struct State {
//!     input: Input,
//! }
//!
//! impl HostState for State {
//!     fn input(&self) -> &Input {
//!         &self.input
//!     }
//!     fn input_mut(&mut self) -> &mut Input {
//!         &mut self.input
//!     }
//! }
//!
//! struct Menu;
//! struct Level;
//!
//! impl Scene<State, GpuCanvas> for Menu {
//!     fn update(&mut self, ctx: &mut SceneContext<'_, State, GpuCanvas>) -> anyhow::Result<()> {
//!         if ctx.state.input().key_pressed(KeyCode::Enter) {
//!             ctx.transition_to(Level, FadeTransition::new(1.0)?)?;
//!         }
//!         Ok(())
//!     }
//!
//!     fn draw(&mut self, _state: &mut State, screen: &mut GpuCanvas) {
//!         screen.fill(Color::BLACK);
//!     }
//! }
//!
//! impl Scene<State, GpuCanvas> for Level {
//!     fn update(&mut self, _ctx: &mut SceneContext<'_, State, GpuCanvas>) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn draw(&mut self, _state: &mut State, screen: &mut GpuCanvas) {
//!         screen.fill(Color::ALABASTER);
//!     }
//! }
//!
//! fn main() -> Result<(), AppError> {
//!     run(AppConfig::new().title("Menu"), |_gpu| {
//!         SceneManager::new(Menu, State { input: Input::new() })
//!     })
//! }
//! ```
//!
//! The manager itself is host-agnostic: anything that implements [`Canvas`] works,
//! including the CPU-side [`ImageCanvas`].

mod app;
mod canvas;
mod canvas_pass;
mod error;
mod gpu;
mod gpu_canvas;
mod input;
pub mod scene;

pub use app::{AppConfig, HostState, run};
pub use canvas::{Canvas, Color, ImageCanvas};
pub use error::{AppError, TransitionError};
pub use gpu::{GpuContext, GpuDevice};
pub use gpu_canvas::GpuCanvas;
pub use input::Input;
pub use scene::{
    Clock, FadeFrame, FadeTransition, ManualClock, Scene, SceneContext, SceneManager,
    SimpleTransition, SystemClock, Transition, fade_frame,
};

// Re-export glam math types for convenience
pub use glam::Vec2;

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
