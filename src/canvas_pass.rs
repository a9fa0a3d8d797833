//! GPU pipelines behind [`GpuCanvas`](crate::GpuCanvas).
//!
//! Three full-screen-triangle pipelines share one shader module and one uniform
//! buffer:
//! - `blit`: composite a canvas over another, every channel scaled by an alpha
//!   (premultiplied source-over).
//! - `present`: copy a canvas onto the swapchain image, stretched to fit.
//! - `circle`: draw an anti-aliased filled circle (straight-alpha source-over).

use glam::Vec2;

use crate::canvas::Color;

/// Uniforms for every canvas pass.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CanvasUniforms {
    /// Target size in pixels.
    resolution: [f32; 2],
    /// Circle center in target pixels.
    center: [f32; 2],
    /// Circle color (RGBA).
    color: [f32; 4],
    radius: f32,
    /// Color-scale alpha for blits.
    alpha: f32,
    _pad: [f32; 2],
}

impl CanvasUniforms {
    fn new(resolution: (u32, u32)) -> Self {
        Self {
            resolution: [resolution.0 as f32, resolution.1 as f32],
            center: [0.0, 0.0],
            color: [0.0, 0.0, 0.0, 0.0],
            radius: 0.0,
            alpha: 1.0,
            _pad: [0.0, 0.0],
        }
    }
}

/// GPU resources for drawing into canvases.
pub(crate) struct CanvasPass {
    blit_pipeline: wgpu::RenderPipeline,
    present_pipeline: wgpu::RenderPipeline,
    circle_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    /// Uniforms + source texture + sampler.
    texture_bind_group_layout: wgpu::BindGroupLayout,
    /// Uniforms only; the circle pass reads no texture.
    circle_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
}

impl CanvasPass {
    pub(crate) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Shader"),
            source: wgpu::ShaderSource::Wgsl(CANVAS_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Canvas Uniforms"),
            size: std::mem::size_of::<CanvasUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Nearest keeps logical pixels crisp when the screen canvas is stretched
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Canvas Blit Bind Group Layout"),
                entries: &[
                    uniform_entry,
                    // Source canvas
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let circle_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Canvas Circle Bind Group Layout"),
                entries: &[uniform_entry],
            });

        let circle_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Canvas Circle Bind Group"),
            layout: &circle_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Canvas Blit Pipeline Layout"),
            bind_group_layouts: &[&texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let circle_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Canvas Circle Pipeline Layout"),
            bind_group_layouts: &[&circle_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blit_pipeline = create_pipeline(
            device,
            "Canvas Blit Pipeline",
            &texture_layout,
            &shader,
            "fs_blit",
            format,
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        );
        let present_pipeline = create_pipeline(
            device,
            "Canvas Present Pipeline",
            &texture_layout,
            &shader,
            "fs_blit",
            format,
            wgpu::BlendState::REPLACE,
        );
        let circle_pipeline = create_pipeline(
            device,
            "Canvas Circle Pipeline",
            &circle_layout,
            &shader,
            "fs_circle",
            format,
            wgpu::BlendState::ALPHA_BLENDING,
        );

        Self {
            blit_pipeline,
            present_pipeline,
            circle_pipeline,
            uniform_buffer,
            texture_bind_group_layout,
            circle_bind_group,
            sampler,
        }
    }

    /// Overwrite `target` with a solid color.
    pub(crate) fn clear(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        color: Color,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Canvas Clear Encoder"),
        });
        {
            let _pass = begin_pass(
                &mut encoder,
                "Canvas Clear Pass",
                target,
                wgpu::LoadOp::Clear(color.into()),
            );
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Draw a filled circle over `target`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn circle(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        resolution: (u32, u32),
        center: Vec2,
        radius: f32,
        color: Color,
    ) {
        let uniforms = CanvasUniforms {
            center: center.to_array(),
            color: [color.r, color.g, color.b, color.a],
            radius,
            ..CanvasUniforms::new(resolution)
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Canvas Circle Encoder"),
        });
        {
            let mut pass =
                begin_pass(&mut encoder, "Canvas Circle Pass", target, wgpu::LoadOp::Load);
            pass.set_pipeline(&self.circle_pipeline);
            pass.set_bind_group(0, &self.circle_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Composite `source` over `target` with color-scale `alpha`.
    pub(crate) fn blit(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        resolution: (u32, u32),
        source: &wgpu::TextureView,
        alpha: f32,
    ) {
        self.textured(
            device,
            queue,
            target,
            resolution,
            source,
            alpha,
            &self.blit_pipeline,
            wgpu::LoadOp::Load,
        );
    }

    /// Replace `target` (a swapchain image) with `source`, stretched to fit.
    pub(crate) fn present(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        resolution: (u32, u32),
        source: &wgpu::TextureView,
    ) {
        self.textured(
            device,
            queue,
            target,
            resolution,
            source,
            1.0,
            &self.present_pipeline,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn textured(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        resolution: (u32, u32),
        source: &wgpu::TextureView,
        alpha: f32,
        pipeline: &wgpu::RenderPipeline,
        load: wgpu::LoadOp<wgpu::Color>,
    ) {
        let uniforms = CanvasUniforms {
            alpha,
            ..CanvasUniforms::new(resolution)
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Canvas Blit Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Canvas Blit Encoder"),
        });
        {
            let mut pass = begin_pass(&mut encoder, "Canvas Blit Pass", target, load);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

const CANVAS_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2f,
    center: vec2f,
    color: vec4f,
    radius: f32,
    alpha: f32,
    _pad: vec2f,
}

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var source_texture: texture_2d<f32>;
@group(0) @binding(2) var source_sampler: sampler;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4f {
    // Fullscreen triangle
    let uv = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    return vec4f(uv * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_blit(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    // Color scale: every channel, as the source is composited premultiplied
    return textureSample(source_texture, source_sampler, uv) * u.alpha;
}

@fragment
fn fs_circle(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let d = distance(pos.xy, u.center);
    let coverage = clamp(u.radius + 0.5 - d, 0.0, 1.0);
    if (coverage <= 0.0) {
        discard;
    }
    return vec4f(u.color.rgb, u.color.a * coverage);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        // vec2f + vec2f + vec4f + f32 + f32 + vec2f, 16-byte aligned
        assert_eq!(std::mem::size_of::<CanvasUniforms>(), 48);
    }

    #[test]
    fn uniforms_default_to_opaque_blit() {
        let u = CanvasUniforms::new((640, 360));
        assert_eq!(u.resolution, [640.0, 360.0]);
        assert_eq!(u.alpha, 1.0);
    }
}
