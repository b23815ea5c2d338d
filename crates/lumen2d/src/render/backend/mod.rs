//! Graphics backend abstraction
//!
//! A graphics backend owns the GPU-side objects (vertex buffer, programs,
//! textures, blend state) and executes exactly the state changes the
//! [`DrawPipeline`](crate::render::DrawPipeline) asks for. It never caches or
//! skips calls on its own; redundant-change elimination happens in the
//! pipeline.

pub mod null;
pub mod software;

pub use null::NullGraphics;
pub use software::SoftwareGraphics;

use crate::backend::{Backend, BackendError};
use crate::foundation::handles::HandleError;
use crate::foundation::math::Mat4;
use crate::render::blend::ConcreteBlend;
use crate::render::image::{Image, ImageError, ImageFormat};
use crate::render::vertex::{Color, PackedVertex, PrimitiveKind, ProgramKind};
use bitflags::bitflags;
use thiserror::Error;

/// Result type for graphics operations
pub type GraphicsResult<T> = Result<T, GraphicsError>;

/// Graphics errors
#[derive(Error, Debug)]
pub enum GraphicsError {
    /// Operation issued before initialization or after termination
    #[error("graphics is not initialized")]
    NotInitialized,

    /// Backend selection failed
    #[error(transparent)]
    Selection(#[from] BackendError),

    /// The selected backend failed to start
    #[error("{backend} backend failed to initialize: {reason}")]
    InitFailed {
        /// Backend name
        backend: &'static str,
        /// Failure description
        reason: String,
    },

    /// The backend cannot upload this pixel format
    #[error("{backend} backend does not support {format:?} textures")]
    UnsupportedFormat {
        /// Backend name
        backend: &'static str,
        /// Rejected format
        format: ImageFormat,
    },

    /// Image decode or validation failure
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Unknown or exhausted texture/image handle
    #[error(transparent)]
    Handle(#[from] HandleError),

    /// Unknown backend texture id
    #[error("unknown texture id {0:?}")]
    UnknownTexture(TextureId),

    /// Matrix stack push past its depth or pop while empty
    #[error("matrix stack {0}")]
    MatrixStack(&'static str),

    /// Screen capture failed
    #[error("screen capture failed: {0}")]
    Capture(String),
}

/// Backend-assigned texture object id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

bitflags! {
    /// Per-program uniform slots
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Uniform: u8 {
        /// Projection matrix
        const PROJECTION = 0b01;
        /// Model-view matrix
        const MODELVIEW = 0b10;
    }
}

/// Operations a graphics backend provides
pub trait GraphicsBackend: Backend {
    /// Create GPU resources for a surface of the given size
    fn init(&mut self, width: u32, height: u32) -> GraphicsResult<()>;

    /// Release every GPU resource
    fn terminate(&mut self);

    /// Surface size changed
    fn resize(&mut self, width: u32, height: u32);

    /// Whether textures of `format` can be created
    fn supports_format(&self, format: ImageFormat) -> bool;

    /// Replace the contents of the vertex buffer
    fn upload_vertices(&mut self, vertices: &[PackedVertex]);

    /// Fill the surface with `color`, ignoring blend state
    fn clear(&mut self, color: Color);

    /// Draw `count` vertices starting at `first` from the uploaded buffer
    fn draw(&mut self, kind: PrimitiveKind, first: usize, count: usize);

    /// Create a texture from a bottom-up image
    fn create_texture(&mut self, image: &Image, smooth: bool) -> GraphicsResult<TextureId>;

    /// Delete a texture; a bound texture becomes unbound
    fn destroy_texture(&mut self, texture: TextureId);

    /// Switch between nearest and linear filtering
    fn set_texture_smooth(&mut self, texture: TextureId, smooth: bool) -> GraphicsResult<()>;

    /// Bind a texture, or unbind with `None`
    fn apply_texture(&mut self, texture: Option<TextureId>);

    /// Make a program current
    fn apply_program(&mut self, program: ProgramKind);

    /// Store a matrix uniform of `program`
    fn upload_uniform(&mut self, program: ProgramKind, uniform: Uniform, value: &Mat4);

    /// Set separate color and alpha blending
    fn apply_blend_mode(&mut self, blend: &ConcreteBlend);

    /// Read back the surface, rows bottom-up
    fn capture_screen(&mut self) -> GraphicsResult<Image>;
}

/// Graphics backends in probe order
pub fn default_candidates() -> Vec<Box<dyn GraphicsBackend>> {
    vec![Box::new(SoftwareGraphics::new()), Box::new(NullGraphics::new())]
}
