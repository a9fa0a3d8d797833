//! Core GPU context and device management for the reference host.
//!
//! [`GpuContext`] holds the window surface and its configuration, plus a shared
//! [`GpuDevice`] (device, queue, surface format and canvas pipelines). Every
//! [`GpuCanvas`] keeps an `Rc` to the same `GpuDevice`, so off-screen canvases can
//! be created from any existing canvas without going back to the context.

use std::rc::Rc;
use std::sync::Arc;

use log::{debug, info};
use winit::window::Window;

use crate::canvas_pass::CanvasPass;
use crate::error::AppError;
use crate::gpu_canvas::GpuCanvas;

/// Device-level wgpu state shared by the context and all canvases.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Format of the surface and of every canvas texture.
    pub format: wgpu::TextureFormat,
    pub(crate) pass: CanvasPass,
}

/// Window surface plus the shared GPU device.
///
/// Created once at startup; the host reconfigures it on resize and presents a
/// canvas to the window each frame.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    device: Rc<GpuDevice>,
}

impl GpuContext {
    /// Create a GPU context for `window`.
    ///
    /// Picks the primary backends, the default adapter compatible with the
    /// window surface, an sRGB surface format when available and Fifo presentation.
    pub fn new(window: Arc<Window>) -> Result<Self, AppError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Prestige Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        debug!(
            "Configured surface {}x{} as {:?}",
            config.width, config.height, format
        );

        let pass = CanvasPass::new(&device, format);

        Ok(Self {
            surface,
            config,
            device: Rc::new(GpuDevice {
                device,
                queue,
                format,
                pass,
            }),
        })
    }

    /// Resize the surface to new dimensions.
    ///
    /// Ignores zero-sized dimensions, which occur while the window is minimized.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device.device, &self.config);
        }
    }

    /// Reapply the current configuration after the surface was lost or outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device.device, &self.config);
    }

    /// Current surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Current surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.device.queue
    }

    /// Create a transparent canvas on this device.
    pub fn canvas(&self, width: u32, height: u32) -> GpuCanvas {
        GpuCanvas::new(Rc::clone(&self.device), width, height, "Prestige Canvas")
    }

    /// Stretch `canvas` over the whole window and present it.
    pub fn present(&self, canvas: &GpuCanvas) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.device.pass.present(
            &self.device.device,
            &self.device.queue,
            &view,
            (self.width(), self.height()),
            canvas.view(),
        );

        output.present();
        Ok(())
    }
}
