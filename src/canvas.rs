//! Drawable surfaces.
//!
//! Everything the scene manager composites goes through the [`Canvas`] trait: the
//! host's screen, the two off-screen buffers used while a transition is in flight,
//! and whatever a scene draws into. Two implementations ship with the crate:
//!
//! - [`ImageCanvas`], a CPU canvas backed by [`image::RgbaImage`], used for headless
//!   hosts and tests.
//! - [`GpuCanvas`](crate::GpuCanvas), a wgpu render target used by the reference host.

use glam::Vec2;
use image::{Rgba, RgbaImage};

/// RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Convert to 8-bit channels, rounding to nearest.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            to_u8(self.a),
        ]
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// A soft off-white, easier on the eyes than pure white.
    pub const ALABASTER: Color = Color::rgba(237.0 / 255.0, 234.0 / 255.0, 224.0 / 255.0, 1.0);
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// A surface scenes draw into and transitions composite onto.
///
/// Off-screen canvases are always created from an existing canvas through
/// [`Canvas::create_offscreen`], so an implementation can share whatever device
/// or format state it needs between the screen and its buffers.
pub trait Canvas: Sized {
    /// Pixel dimensions as `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Allocate a blank, fully transparent canvas compatible with this one.
    fn create_offscreen(&self, width: u32, height: u32) -> Self;

    /// Overwrite every pixel with `color`.
    fn fill(&mut self, color: Color);

    /// Draw a filled, anti-aliased circle over the current contents.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    /// Draw `src` over this canvas with every channel of `src` scaled by `alpha`.
    ///
    /// `src` is read only. Both canvases are expected to have the same size; the
    /// overlapping region is composited otherwise.
    fn draw_canvas(&mut self, src: &Self, alpha: f32);
}

/// CPU canvas backed by an [`RgbaImage`].
///
/// Pixels are straight (non-premultiplied) RGBA8 and compositing is source-over.
#[derive(Clone, Debug)]
pub struct ImageCanvas {
    image: RgbaImage,
}

impl ImageCanvas {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Wrap an existing image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// The pixel at `(x, y)` as RGBA8.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }
}

impl Canvas for ImageCanvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Self {
        Self::new(width, height)
    }

    fn fill(&mut self, color: Color) {
        let px = Rgba(color.to_rgba8());
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let (width, height) = self.size();
        let x0 = (center.x - radius - 1.0).floor().max(0.0) as u32;
        let y0 = (center.y - radius - 1.0).floor().max(0.0) as u32;
        let x1 = ((center.x + radius + 1.0).ceil().max(0.0) as u32).min(width);
        let y1 = ((center.y + radius + 1.0).ceil().max(0.0) as u32).min(height);

        for y in y0..y1 {
            for x in x0..x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                // One pixel wide coverage ramp across the edge
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    blend_over(self.image.get_pixel_mut(x, y), color, coverage);
                }
            }
        }
    }

    fn draw_canvas(&mut self, src: &Self, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        let (width, height) = self.size();
        let (src_w, src_h) = src.size();
        for y in 0..height.min(src_h) {
            for x in 0..width.min(src_w) {
                let [r, g, b, a] = src.image.get_pixel(x, y).0;
                let color = Color::from_rgba8(r, g, b, a);
                blend_over(self.image.get_pixel_mut(x, y), color, alpha);
            }
        }
    }
}

/// Straight-alpha source-over of `src` (alpha scaled by `scale`) onto `dst`.
fn blend_over(dst: &mut Rgba<u8>, src: Color, scale: f32) {
    let sa = src.a * scale;
    if sa <= 0.0 {
        return;
    }
    let [dr, dg, db, da] = dst.0.map(|c| c as f32 / 255.0);
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: f32, d: f32| (s * sa + d * da * (1.0 - sa)) / out_a;
    *dst = Rgba(
        Color::rgba(mix(src.r, dr), mix(src.g, dg), mix(src.b, db), out_a).to_rgba8(),
    );
}
