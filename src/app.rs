//! Reference host: a winit window driving a [`SceneManager`] with wgpu canvases.

use std::sync::Arc;

use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::canvas::{Canvas, Color};
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::gpu_canvas::GpuCanvas;
use crate::input::Input;
use crate::scene::SceneManager;

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Prestige".to_string(),
            width: 640,
            height: 360,
            resizable: true,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }
}

/// Shared state the reference host can deliver input to.
pub trait HostState {
    fn input(&self) -> &Input;
    fn input_mut(&mut self) -> &mut Input;
}

/// Open a window and drive the scene manager built by `setup` until the window
/// closes or a scene fails.
///
/// Each redraw runs `layout` with the window size, `update`, then `draw` onto a
/// screen canvas of the logical resolution, which is stretched over the window.
/// A scene error stops the event loop and is returned as [`AppError::Scene`].
///
/// # Example
/// ```ignore
/// prestige::run(AppConfig::new().title("Demo"), |_gpu| {
///     SceneManager::new(TitleScene::default(), GameState::default())
/// })?;
/// ```
pub fn run<T, F>(config: AppConfig, setup: F) -> Result<(), AppError>
where
    T: HostState + 'static,
    F: FnOnce(&GpuContext) -> SceneManager<T, GpuCanvas> + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PrestigeApp {
        phase: HostPhase::Pending {
            config,
            setup: Some(Box::new(setup)),
        },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

type SetupFn<T> = Box<dyn FnOnce(&GpuContext) -> SceneManager<T, GpuCanvas>>;

struct PrestigeApp<T> {
    phase: HostPhase<T>,
    error: Option<AppError>,
}

enum HostPhase<T> {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn<T>>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        manager: SceneManager<T, GpuCanvas>,
        screen: Option<GpuCanvas>,
    },
}

impl<T: HostState + 'static> PrestigeApp<T> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl<T: HostState + 'static> ApplicationHandler for PrestigeApp<T> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let HostPhase::Pending { config, setup } = &mut self.phase else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };
        let gpu = match GpuContext::new(Arc::clone(&window)) {
            Ok(gpu) => gpu,
            Err(err) => return self.fail(event_loop, err),
        };

        info!("Window ready at {}x{}", gpu.width(), gpu.height());
        let manager = setup(&gpu);
        window.request_redraw();

        self.phase = HostPhase::Running {
            window,
            gpu,
            manager,
            screen: None,
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let HostPhase::Running {
            window,
            gpu,
            manager,
            screen,
        } = &mut self.phase
        else {
            return;
        };

        manager.state_mut().input_mut().handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = run_frame(gpu, manager, screen) {
                    return self.fail(event_loop, err);
                }
                manager.state_mut().input_mut().begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}

/// One frame: layout, update, draw, present.
fn run_frame<T>(
    gpu: &GpuContext,
    manager: &mut SceneManager<T, GpuCanvas>,
    screen: &mut Option<GpuCanvas>,
) -> Result<(), AppError> {
    let (width, height) = manager.layout(gpu.width(), gpu.height());
    let logical = (width.max(1), height.max(1));
    if screen.as_ref().is_none_or(|canvas| canvas.size() != logical) {
        *screen = Some(gpu.canvas(logical.0, logical.1));
    }

    manager.update().map_err(AppError::Scene)?;

    let screen = screen.get_or_insert_with(|| gpu.canvas(logical.0, logical.1));
    screen.fill(Color::BLACK);
    manager.draw(screen);

    match gpu.present(screen) {
        Ok(()) => Ok(()),
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            warn!("Surface lost or outdated, reconfiguring");
            gpu.reconfigure();
            Ok(())
        }
        Err(wgpu::SurfaceError::Timeout) => {
            warn!("Timed out acquiring surface texture, skipping frame");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
