//! Graphics backend that draws nothing
//!
//! Keeps enough bookkeeping (surface size, texture ids) for the façade to
//! behave normally on machines without any display.

use super::{GraphicsBackend, GraphicsError, GraphicsResult, TextureId, Uniform};
use crate::backend::Backend;
use crate::foundation::math::Mat4;
use crate::render::blend::ConcreteBlend;
use crate::render::image::{Image, ImageFormat};
use crate::render::vertex::{Color, PackedVertex, PrimitiveKind, ProgramKind};
use std::collections::HashMap;

/// No-op graphics backend
#[derive(Debug, Default)]
pub struct NullGraphics {
    width: u32,
    height: u32,
    textures: HashMap<TextureId, bool>,
    next_texture: u32,
}

impl NullGraphics {
    /// Create the backend
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for NullGraphics {
    fn name(&self) -> &'static str {
        "null"
    }

    fn probe(&self) -> bool {
        true
    }
}

impl GraphicsBackend for NullGraphics {
    fn init(&mut self, width: u32, height: u32) -> GraphicsResult<()> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn terminate(&mut self) {
        self.textures.clear();
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn supports_format(&self, _format: ImageFormat) -> bool {
        true
    }

    fn upload_vertices(&mut self, _vertices: &[PackedVertex]) {}

    fn clear(&mut self, _color: Color) {}

    fn draw(&mut self, _kind: PrimitiveKind, _first: usize, _count: usize) {}

    fn create_texture(&mut self, _image: &Image, smooth: bool) -> GraphicsResult<TextureId> {
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.textures.insert(id, smooth);
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn set_texture_smooth(&mut self, texture: TextureId, smooth: bool) -> GraphicsResult<()> {
        let entry = self
            .textures
            .get_mut(&texture)
            .ok_or(GraphicsError::UnknownTexture(texture))?;
        *entry = smooth;
        Ok(())
    }

    fn apply_texture(&mut self, _texture: Option<TextureId>) {}

    fn apply_program(&mut self, _program: ProgramKind) {}

    fn upload_uniform(&mut self, _program: ProgramKind, _uniform: Uniform, _value: &Mat4) {}

    fn apply_blend_mode(&mut self, _blend: &ConcreteBlend) {}

    fn capture_screen(&mut self) -> GraphicsResult<Image> {
        Ok(Image::solid_color(self.width, self.height, [0, 0, 0, 0]))
    }
}
