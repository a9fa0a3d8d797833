//! wgpu-backed canvas.

use std::rc::Rc;

use glam::Vec2;

use crate::canvas::{Canvas, Color};
use crate::gpu::GpuDevice;

/// An off-screen GPU render target usable as a [`Canvas`].
///
/// The texture can be rendered to (color attachment) and sampled from (texture
/// binding), so one canvas can be composited onto another. Every drawing call
/// records and submits its own render pass.
///
/// wgpu rejects zero-sized textures, so both dimensions are at least 1.
pub struct GpuCanvas {
    gpu: Rc<GpuDevice>,
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuCanvas {
    pub(crate) fn new(gpu: Rc<GpuDevice>, width: u32, height: u32, label: &str) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut canvas = Self {
            gpu,
            texture,
            view,
            width,
            height,
        };
        canvas.fill(Color::TRANSPARENT);
        canvas
    }

    /// The texture view, for binding the canvas in custom passes.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl Canvas for GpuCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Self {
        Self::new(Rc::clone(&self.gpu), width, height, "Prestige Offscreen Canvas")
    }

    fn fill(&mut self, color: Color) {
        self.gpu
            .pass
            .clear(&self.gpu.device, &self.gpu.queue, &self.view, color);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        self.gpu.pass.circle(
            &self.gpu.device,
            &self.gpu.queue,
            &self.view,
            (self.width, self.height),
            center,
            radius,
            color,
        );
    }

    fn draw_canvas(&mut self, src: &Self, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        self.gpu.pass.blit(
            &self.gpu.device,
            &self.gpu.queue,
            &self.view,
            (self.width, self.height),
            &src.view,
            alpha,
        );
    }
}
