//! Basic demo: a colored screen with a movable circle.
//!
//! Left/Right move the circle, Space fades to a fresh scene with a new color.

use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;
use log::{info, warn};
use prestige::{
    AppConfig, Canvas, Color, FadeTransition, GpuCanvas, HostState, Input, KeyCode, Scene,
    SceneContext, SceneManager,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

struct State {
    input: Input,
    seed: u32,
}

impl State {
    fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Self {
            input: Input::new(),
            seed: nanos,
        }
    }

    /// Next pseudo-random opaque color.
    fn random_color(&mut self) -> Color {
        self.seed = self.seed.wrapping_add(1);
        let h = hash(self.seed);
        let [r, g, b, _] = h.to_le_bytes();
        Color::from_rgba8(r, g, b, 255)
    }
}

impl HostState for State {
    fn input(&self) -> &Input {
        &self.input
    }

    fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }
}

fn hash(x: u32) -> u32 {
    let mut h = x.wrapping_mul(374761393);
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[derive(Default)]
struct BasicScene {
    x: f32,
    color: Color,
}

impl Scene<State, GpuCanvas> for BasicScene {
    fn enter_start(&mut self, state: &mut State) {
        self.x = 0.0;
        self.color = state.random_color();
    }

    fn update(&mut self, ctx: &mut SceneContext<'_, State, GpuCanvas>) -> anyhow::Result<()> {
        let input = ctx.state.input();
        if input.key_down(KeyCode::ArrowLeft) {
            self.x -= 10.0;
        }
        if input.key_down(KeyCode::ArrowRight) {
            self.x += 10.0;
        }

        if input.key_pressed(KeyCode::Space) {
            info!("Transitioning ...");
            let fade = FadeTransition::new(1.0)?;
            if let Err(err) = ctx.transition_to(BasicScene::default(), fade) {
                warn!("Space ignored: {err}");
            }
        }

        Ok(())
    }

    fn draw(&mut self, _state: &mut State, target: &mut GpuCanvas) {
        target.fill(self.color);
        target.fill_circle(Vec2::new(self.x, 180.0), 30.0, Color::ALABASTER);
    }

    fn layout(&mut self, _state: &mut State, _width: u32, _height: u32) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::new()
        .title("Scenery Example")
        .size(WIDTH, HEIGHT)
        .resizable(true);

    prestige::run(config, |_gpu| {
        SceneManager::new(BasicScene::default(), State::new())
    })?;

    Ok(())
}
