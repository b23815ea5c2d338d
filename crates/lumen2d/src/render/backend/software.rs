//! CPU rasterizer backend
//!
//! Implements the full graphics backend contract in memory: per-program
//! uniform storage, bound texture, separate-channel blending and an RGBA
//! framebuffer that can be captured. Useful headless and as a reference
//! for what a GPU backend must do with the calls it receives.
//!
//! ## Conventions
//!
//! - The framebuffer is stored top row first.
//! - Triangle coverage samples pixel centers with a top-left fill rule, so
//!   triangles sharing an edge never touch a pixel twice.
//! - Lines and line loops omit their final endpoint.

use super::{GraphicsBackend, GraphicsError, GraphicsResult, TextureId, Uniform};
use crate::backend::Backend;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::blend::{BlendEquation, BlendFactor, BlendMode, BlendTriple, ConcreteBlend};
use crate::render::image::{Image, ImageFormat};
use crate::render::vertex::{Color, PackedVertex, PrimitiveKind, ProgramKind};
use std::collections::HashMap;

/// Coordinates this close below a pixel boundary snap to the next pixel
const SNAP: f32 = 1.0e-3;

#[derive(Debug, Clone, Copy)]
struct ProgramUniforms {
    projection: Mat4,
    modelview: Mat4,
}

impl Default for ProgramUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            modelview: Mat4::identity(),
        }
    }
}

#[derive(Debug)]
struct SoftTexture {
    image: Image,
    smooth: bool,
}

/// Vertex after transformation to pixel space
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    color: [f32; 4],
    uv: [f32; 2],
}

impl ScreenVertex {
    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            color: std::array::from_fn(|i| mix(self.color[i], other.color[i])),
            uv: [mix(self.uv[0], other.uv[0]), mix(self.uv[1], other.uv[1])],
        }
    }
}

/// Software rasterizer
#[derive(Debug)]
pub struct SoftwareGraphics {
    width: u32,
    height: u32,
    framebuffer: Vec<[u8; 4]>,
    vertices: Vec<PackedVertex>,
    textures: HashMap<TextureId, SoftTexture>,
    next_texture: u32,
    bound_texture: Option<TextureId>,
    program: Option<ProgramKind>,
    uniforms: [ProgramUniforms; ProgramKind::COUNT],
    blend: ConcreteBlend,
}

impl Default for SoftwareGraphics {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareGraphics {
    /// Create an uninitialized rasterizer
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            framebuffer: Vec::new(),
            vertices: Vec::new(),
            textures: HashMap::new(),
            next_texture: 0,
            bound_texture: None,
            program: None,
            uniforms: [ProgramUniforms::default(); ProgramKind::COUNT],
            blend: BlendMode::NONE.to_concrete(),
        }
    }

    /// Framebuffer pixel at column `x`, row `y` from the top
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.framebuffer.get((y * self.width + x) as usize).copied()
    }

    fn to_screen(&self, vertex: &PackedVertex, mvp: &Mat4) -> ScreenVertex {
        let (ndc_x, ndc_y) = mvp.transform_point_2d(vertex.position[0], vertex.position[1]);
        ScreenVertex {
            x: (ndc_x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc_y) * 0.5 * self.height as f32,
            color: vertex.color,
            uv: vertex.texcoord,
        }
    }

    fn shade(&self, program: ProgramKind, color: [f32; 4], uv: [f32; 2]) -> [f32; 4] {
        if program == ProgramKind::Solid {
            return color;
        }
        let texel = match self.bound_texture.and_then(|id| self.textures.get(&id)) {
            Some(texture) => sample(texture, uv),
            None => [0.0, 0.0, 0.0, 1.0],
        };
        std::array::from_fn(|i| color[i] * texel[i])
    }

    fn plot(&mut self, program: ProgramKind, x: i64, y: i64, color: [f32; 4], uv: [f32; 2]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let src = self.shade(program, color, uv);
        let index = (y as usize) * self.width as usize + x as usize;
        let dst = self.framebuffer[index].map(|c| f32::from(c) / 255.0);
        let blended = blend_pixel(&self.blend, src, dst);
        self.framebuffer[index] = blended.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    }

    fn plot_vertex(&mut self, program: ProgramKind, vertex: &ScreenVertex) {
        let x = (vertex.x + SNAP).floor() as i64;
        let y = (vertex.y + SNAP).floor() as i64;
        self.plot(program, x, y, vertex.color, vertex.uv);
    }

    fn raster_line(&mut self, program: ProgramKind, a: &ScreenVertex, b: &ScreenVertex) {
        if !(a.is_finite() && b.is_finite()) {
            return;
        }
        let Some((t0, t1)) = clip_segment(a, b, self.width as f32, self.height as f32) else {
            return;
        };
        let (a, b) = (a.lerp(b, t0), a.lerp(b, t1));

        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).round() as usize;
        if steps == 0 {
            self.plot_vertex(program, &a);
            return;
        }
        for step in 0..steps {
            let fragment = a.lerp(&b, step as f32 / steps as f32);
            self.plot_vertex(program, &fragment);
        }
    }

    fn raster_triangle(&mut self, program: ProgramKind, v0: &ScreenVertex, v1: &ScreenVertex, v2: &ScreenVertex) {
        if !(v0.is_finite() && v1.is_finite() && v2.is_finite()) {
            return;
        }
        let (v1, v2) = if edge(v0, v1, v2.x, v2.y) < 0.0 { (v2, v1) } else { (v1, v2) };
        let area = edge(v0, v1, v2.x, v2.y);
        if area <= 0.0 {
            return;
        }

        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i64;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i64;
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(i64::from(self.width));
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(i64::from(self.height));

        for y in min_y..max_y {
            for x in min_x..max_x {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(v1, v2, px, py);
                let w1 = edge(v2, v0, px, py);
                let w2 = edge(v0, v1, px, py);
                if !(covers(w0, v1, v2) && covers(w1, v2, v0) && covers(w2, v0, v1)) {
                    continue;
                }
                let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
                let color = std::array::from_fn(|i| v0.color[i] * l0 + v1.color[i] * l1 + v2.color[i] * l2);
                let uv = [
                    v0.uv[0] * l0 + v1.uv[0] * l1 + v2.uv[0] * l2,
                    v0.uv[1] * l0 + v1.uv[1] * l1 + v2.uv[1] * l2,
                ];
                self.plot(program, x, y, color, uv);
            }
        }
    }
}

/// Liang-Barsky clip of `a..b` against `0..width` x `0..height`
///
/// Returns the parameter range of the visible part, or `None` when the
/// segment misses the surface.
fn clip_segment(a: &ScreenVertex, b: &ScreenVertex, width: f32, height: f32) -> Option<(f32, f32)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [(-dx, a.x), (dx, width - a.x), (-dy, a.y), (dy, height - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Twice the signed area of `(a, b, p)`; positive when `p` is inside for
/// the winding used by the rasterizer (y pointing down)
fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn covers(weight: f32, a: &ScreenVertex, b: &ScreenVertex) -> bool {
    if weight > 0.0 {
        return true;
    }
    if weight < 0.0 {
        return false;
    }
    // Top-left rule
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    (dy == 0.0 && dx > 0.0) || dy < 0.0
}

fn texel(image: &Image, x: i64, row: i64) -> [f32; 4] {
    let x = x.clamp(0, i64::from(image.width()) - 1) as u32;
    let row = row.clamp(0, i64::from(image.height()) - 1) as u32;
    image.texel_rgba(x, row).map(|c| f32::from(c) / 255.0)
}

fn sample(texture: &SoftTexture, uv: [f32; 2]) -> [f32; 4] {
    let image = &texture.image;
    if image.width() == 0 || image.height() == 0 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let x = uv[0] * image.width() as f32;
    let y = uv[1] * image.height() as f32;

    if !texture.smooth {
        return texel(image, x.floor() as i64, y.floor() as i64);
    }

    let (x, y) = (x - 0.5, y - 0.5);
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);
    let c00 = texel(image, x0, y0);
    let c10 = texel(image, x0 + 1, y0);
    let c01 = texel(image, x0, y0 + 1);
    let c11 = texel(image, x0 + 1, y0 + 1);
    std::array::from_fn(|i| {
        let bottom = c00[i] + (c10[i] - c00[i]) * fx;
        let top = c01[i] + (c11[i] - c01[i]) * fx;
        bottom + (top - bottom) * fy
    })
}

fn blend_factor(factor: u32, src: &[f32; 4], dst: &[f32; 4], channel: usize) -> f32 {
    match BlendFactor::from_gl(factor) {
        Some(BlendFactor::Zero) => 0.0,
        Some(BlendFactor::One) | None => 1.0,
        Some(BlendFactor::SrcColor) => src[channel],
        Some(BlendFactor::OneMinusSrcColor) => 1.0 - src[channel],
        Some(BlendFactor::DstColor) => dst[channel],
        Some(BlendFactor::OneMinusDstColor) => 1.0 - dst[channel],
        Some(BlendFactor::SrcAlpha) => src[3],
        Some(BlendFactor::OneMinusSrcAlpha) => 1.0 - src[3],
        Some(BlendFactor::DstAlpha) => dst[3],
        Some(BlendFactor::OneMinusDstAlpha) => 1.0 - dst[3],
    }
}

fn blend_channel(triple: &BlendTriple, src: &[f32; 4], dst: &[f32; 4], channel: usize) -> f32 {
    let s = src[channel] * blend_factor(triple.src, src, dst, channel);
    let d = dst[channel] * blend_factor(triple.dst, src, dst, channel);
    match BlendEquation::from_gl(triple.equation) {
        Some(BlendEquation::Add) | None => s + d,
        Some(BlendEquation::Subtract) => s - d,
        Some(BlendEquation::ReverseSubtract) => d - s,
    }
}

fn blend_pixel(blend: &ConcreteBlend, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    [
        blend_channel(&blend.color, &src, &dst, 0),
        blend_channel(&blend.color, &src, &dst, 1),
        blend_channel(&blend.color, &src, &dst, 2),
        blend_channel(&blend.alpha, &src, &dst, 3),
    ]
}

impl Backend for SoftwareGraphics {
    fn name(&self) -> &'static str {
        "software"
    }

    fn probe(&self) -> bool {
        true
    }
}

impl GraphicsBackend for SoftwareGraphics {
    fn init(&mut self, width: u32, height: u32) -> GraphicsResult<()> {
        self.resize(width, height);
        self.program = None;
        self.bound_texture = None;
        self.uniforms = [ProgramUniforms::default(); ProgramKind::COUNT];
        self.blend = BlendMode::NONE.to_concrete();
        log::debug!("Software rasterizer ready ({}x{})", width, height);
        Ok(())
    }

    fn terminate(&mut self) {
        self.textures.clear();
        self.vertices.clear();
        self.framebuffer.clear();
        self.bound_texture = None;
        self.program = None;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.framebuffer = vec![[0; 4]; width as usize * height as usize];
    }

    fn supports_format(&self, _format: ImageFormat) -> bool {
        true
    }

    fn upload_vertices(&mut self, vertices: &[PackedVertex]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
    }

    fn clear(&mut self, color: Color) {
        let rgba = [color.r, color.g, color.b, color.a];
        self.framebuffer.fill(rgba);
    }

    fn draw(&mut self, kind: PrimitiveKind, first: usize, count: usize) {
        let Some(program) = self.program else {
            log::warn!("Draw issued with no program applied");
            return;
        };
        let Some(source) = self.vertices.get(first..first + count) else {
            log::warn!("Draw range {}..{} outside vertex buffer", first, first + count);
            return;
        };
        let uniforms = &self.uniforms[program.index()];
        let mvp = uniforms.projection.multiply(&uniforms.modelview);
        let screen: Vec<ScreenVertex> = source.iter().map(|v| self.to_screen(v, &mvp)).collect();

        match kind {
            PrimitiveKind::Points => {
                for vertex in &screen {
                    self.plot_vertex(program, vertex);
                }
            }
            PrimitiveKind::Lines => {
                for pair in screen.chunks_exact(2) {
                    self.raster_line(program, &pair[0], &pair[1]);
                }
            }
            PrimitiveKind::LineLoop => {
                for (i, vertex) in screen.iter().enumerate() {
                    let next = &screen[(i + 1) % screen.len()];
                    self.raster_line(program, vertex, next);
                }
            }
            PrimitiveKind::Triangles => {
                for triangle in screen.chunks_exact(3) {
                    self.raster_triangle(program, &triangle[0], &triangle[1], &triangle[2]);
                }
            }
        }
    }

    fn create_texture(&mut self, image: &Image, smooth: bool) -> GraphicsResult<TextureId> {
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.textures.insert(
            id,
            SoftTexture {
                image: image.clone(),
                smooth,
            },
        );
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
    }

    fn set_texture_smooth(&mut self, texture: TextureId, smooth: bool) -> GraphicsResult<()> {
        let entry = self
            .textures
            .get_mut(&texture)
            .ok_or(GraphicsError::UnknownTexture(texture))?;
        entry.smooth = smooth;
        Ok(())
    }

    fn apply_texture(&mut self, texture: Option<TextureId>) {
        self.bound_texture = texture;
    }

    fn apply_program(&mut self, program: ProgramKind) {
        self.program = Some(program);
    }

    fn upload_uniform(&mut self, program: ProgramKind, uniform: Uniform, value: &Mat4) {
        let slot = &mut self.uniforms[program.index()];
        if uniform.contains(Uniform::PROJECTION) {
            slot.projection = *value;
        }
        if uniform.contains(Uniform::MODELVIEW) {
            slot.modelview = *value;
        }
    }

    fn apply_blend_mode(&mut self, blend: &ConcreteBlend) {
        self.blend = *blend;
    }

    fn capture_screen(&mut self) -> GraphicsResult<Image> {
        let width = self.width as usize;
        let pixels: Vec<u8> = if width == 0 {
            Vec::new()
        } else {
            self.framebuffer.chunks_exact(width).rev().flatten().flatten().copied().collect()
        };
        Ok(Image::new(self.width, self.height, 4, pixels)?)
    }
}
