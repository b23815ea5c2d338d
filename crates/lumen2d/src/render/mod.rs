//! # Graphics
//!
//! Immediate-mode 2D drawing on top of an interchangeable
//! [`GraphicsBackend`].
//!
//! ## Architecture
//!
//! - **Graphics**: the façade. Owns the selected backend, the
//!   [`DrawPipeline`], the image and texture handle tables, and the matrix
//!   stack.
//! - **DrawPipeline**: batches draw calls and applies backend state lazily.
//! - **Backends**: `software` (CPU rasterizer) and `null`.
//!
//! ## Coordinate system
//!
//! The default view maps window pixels directly: origin top-left, x right,
//! y down. [`Graphics::set_view`] installs a camera centred on a point.
//!
//! ## Flush points
//!
//! Queued draws are submitted on present, before [`Graphics::clear`],
//! before a texture is destroyed and before [`Graphics::capture_screen`].

pub mod backend;
pub mod blend;
pub mod image;
pub mod pipeline;
pub mod primitives;
pub mod vertex;

pub use backend::{GraphicsBackend, GraphicsError, GraphicsResult, TextureId, Uniform};
pub use blend::{BlendEquation, BlendFactor, BlendMode, ConcreteBlend};
pub use image::{Image, ImageError, ImageFormat};
pub use pipeline::{DrawCommand, DrawPipeline, DrawState, PipelineStats};
pub use primitives::Rect;
pub use vertex::{Color, PackedVertex, PrimitiveKind, ProgramKind, Vertex};

use crate::backend::select_backend;
use crate::core::{Enter, GraphicsConfig, Leave, Lifecycle};
use crate::foundation::handles::{Handle, HandleTable};
use crate::foundation::math::{Mat4, Mat4Ext};
use std::path::Path;

/// A texture owned by the graphics façade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    smooth: bool,
}

impl Texture {
    /// Width in texels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether bilinear filtering is enabled
    pub const fn is_smooth(&self) -> bool {
        self.smooth
    }
}

/// Graphics façade
pub struct Graphics {
    config: GraphicsConfig,
    preferred: Option<String>,
    lifecycle: Lifecycle,
    candidates: Vec<Box<dyn GraphicsBackend>>,
    backend: Option<Box<dyn GraphicsBackend>>,
    pipeline: DrawPipeline,
    images: HandleTable<Image>,
    textures: HandleTable<Texture>,
    matrix_stack: Vec<Mat4>,
    width: u32,
    height: u32,
}

impl Graphics {
    /// Create an uninitialized façade over `candidates`
    ///
    /// `preferred` names a backend to probe before the others.
    pub fn new(config: GraphicsConfig, preferred: Option<String>, candidates: Vec<Box<dyn GraphicsBackend>>) -> Self {
        let capacity = config.initial_vertex_capacity;
        Self {
            config,
            preferred,
            lifecycle: Lifecycle::new("Graphics"),
            candidates,
            backend: None,
            pipeline: DrawPipeline::new(capacity),
            images: HandleTable::new("image"),
            textures: HandleTable::new("texture"),
            matrix_stack: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// Select a backend (first call only) and start it for a surface of the
    /// given size
    pub fn initialize(&mut self, width: u32, height: u32) -> GraphicsResult<()> {
        if self.lifecycle.enter() == Enter::Nested {
            return Ok(());
        }

        if let Err(e) = self.start(width, height) {
            self.lifecycle.abort();
            return Err(e);
        }

        self.lifecycle.commit();
        Ok(())
    }

    fn start(&mut self, width: u32, height: u32) -> GraphicsResult<()> {
        if self.backend.is_none() {
            let candidates = std::mem::take(&mut self.candidates);
            self.backend = Some(select_backend("graphics", candidates, self.preferred.as_deref())?);
        }
        let backend = self.backend.as_deref_mut().ok_or(GraphicsError::NotInitialized)?;
        backend.init(width, height)?;

        self.pipeline.reset();
        self.matrix_stack.clear();
        self.width = width;
        self.height = height;
        self.pipeline.set_projection(Self::pixel_projection(width, height));
        Ok(())
    }

    /// Release one initialization; the backend stops with the last one
    pub fn terminate(&mut self) -> GraphicsResult<()> {
        match self.lifecycle.leave() {
            Leave::NotInitialized => Err(GraphicsError::NotInitialized),
            Leave::Nested => Ok(()),
            Leave::Last => {
                self.teardown();
                Ok(())
            }
        }
    }

    /// Stop regardless of outstanding initializations
    pub(crate) fn shutdown(&mut self) {
        if self.lifecycle.force_leave() {
            self.teardown();
        }
    }

    fn teardown(&mut self) {
        if let Some(backend) = self.backend.as_deref_mut() {
            for (handle, texture) in self.textures.drain() {
                log::debug!("Releasing texture {} at shutdown", handle.id());
                backend.destroy_texture(texture.id);
            }
            backend.terminate();
        }
        let images = self.images.drain().count();
        if images > 0 {
            log::debug!("Released {} images at shutdown", images);
        }
        self.pipeline.reset();
        self.matrix_stack.clear();
    }

    /// Whether the façade is usable
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    /// Name of the selected backend
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|backend| backend.name())
    }

    /// Surface size in pixels
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pipeline counters since the last frame started
    pub const fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// Draw pipeline, for inspection
    pub const fn pipeline(&self) -> &DrawPipeline {
        &self.pipeline
    }

    fn ensure_initialized(&self) -> GraphicsResult<()> {
        if self.lifecycle.is_initialized() {
            Ok(())
        } else {
            Err(GraphicsError::NotInitialized)
        }
    }

    fn backend_mut(&mut self) -> GraphicsResult<&mut (dyn GraphicsBackend + 'static)> {
        self.ensure_initialized()?;
        self.backend.as_deref_mut().ok_or(GraphicsError::NotInitialized)
    }

    /// Frame boundary bookkeeping
    pub(crate) fn begin_frame(&mut self) {
        self.pipeline.reset_stats();
    }

    /// Submit every queued draw to the backend
    pub fn flush(&mut self) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let backend = self.backend.as_deref_mut().ok_or(GraphicsError::NotInitialized)?;
        self.pipeline.flush(backend);
        Ok(())
    }

    /// The surface was resized: inform the backend and restore the pixel view
    pub fn resize(&mut self, width: u32, height: u32) -> GraphicsResult<()> {
        self.flush()?;
        self.backend_mut()?.resize(width, height);
        self.width = width;
        self.height = height;
        self.reset_view()
    }

    // Drawing

    /// Fill the whole surface
    pub fn clear(&mut self, color: Color) -> GraphicsResult<()> {
        self.flush()?;
        self.backend_mut()?.clear(color);
        Ok(())
    }

    fn submit_solid(&mut self, kind: PrimitiveKind, vertices: &[Vertex]) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        self.pipeline.submit(kind, ProgramKind::Solid, None, vertices);
        Ok(())
    }

    /// Draw a single point
    pub fn draw_point(&mut self, x: f32, y: f32, color: Color) -> GraphicsResult<()> {
        self.submit_solid(PrimitiveKind::Points, &primitives::point(x, y, color))
    }

    /// Draw a line segment
    pub fn draw_line(&mut self, ax: f32, ay: f32, bx: f32, by: f32, color: Color) -> GraphicsResult<()> {
        self.submit_solid(PrimitiveKind::Lines, &primitives::line(ax, ay, bx, by, color))
    }

    /// Draw a triangle
    ///
    /// A transparent `outline` or `fill` skips that part; the fill is drawn
    /// first.
    pub fn draw_triangle(&mut self, a: [f32; 2], b: [f32; 2], c: [f32; 2], outline: Color, fill: Color) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        if !fill.is_transparent() {
            self.submit_solid(PrimitiveKind::Triangles, &primitives::triangle([a, b, c], fill))?;
        }
        if !outline.is_transparent() {
            self.submit_solid(PrimitiveKind::LineLoop, &primitives::triangle([a, b, c], outline))?;
        }
        Ok(())
    }

    /// Draw an axis-aligned rectangle
    ///
    /// A transparent `outline` or `fill` skips that part; the fill is drawn
    /// first.
    pub fn draw_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, outline: Color, fill: Color) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let rect = Rect::new(x, y, w, h);
        if !fill.is_transparent() {
            self.submit_solid(PrimitiveKind::Triangles, &primitives::rectangle_fill(&rect, fill))?;
        }
        if !outline.is_transparent() {
            self.submit_solid(PrimitiveKind::LineLoop, &primitives::rectangle_outline(&rect, outline))?;
        }
        Ok(())
    }

    /// Draw a whole texture stretched over a rectangle
    pub fn draw_texture(&mut self, texture: Handle<Texture>, x: f32, y: f32, w: f32, h: f32) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let id = self.textures.try_get(texture)?.id;
        let vertices = primitives::textured_quad(&Rect::new(x, y, w, h), &Rect::new(0.0, 0.0, 1.0, 1.0));
        self.pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, Some(id), &vertices);
        Ok(())
    }

    /// Draw part of a texture, `region` in texels from its top-left corner
    pub fn draw_subtexture(&mut self, texture: Handle<Texture>, x: f32, y: f32, w: f32, h: f32, region: &Rect) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let record = *self.textures.try_get(texture)?;
        let (tw, th) = (record.width.max(1) as f32, record.height.max(1) as f32);
        let uv = Rect::new(region.x / tw, region.y / th, region.w / tw, region.h / th);
        let vertices = primitives::textured_quad(&Rect::new(x, y, w, h), &uv);
        self.pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, Some(record.id), &vertices);
        Ok(())
    }

    /// Blend mode for subsequent draws
    pub fn set_blend_mode(&mut self, mode: BlendMode) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        self.pipeline.set_blend_mode(mode);
        Ok(())
    }

    /// Blend mode used by subsequent draws
    pub const fn blend_mode(&self) -> BlendMode {
        self.pipeline.blend_mode()
    }

    /// Read back the surface, rows bottom-up
    pub fn capture_screen(&mut self) -> GraphicsResult<Image> {
        self.flush()?;
        self.backend_mut()?.capture_screen()
    }

    // Images and textures

    /// Keep an image for later texture creation
    pub fn create_image(&mut self, image: Image) -> GraphicsResult<Handle<Image>> {
        self.ensure_initialized()?;
        Ok(self.images.create(image)?)
    }

    /// Decode an image file and keep it
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> GraphicsResult<Handle<Image>> {
        self.ensure_initialized()?;
        let image = Image::from_file(path.as_ref()).map_err(|e| {
            log::error!("Failed to load image {:?}: {}", path.as_ref(), e);
            e
        })?;
        self.create_image(image)
    }

    /// Kept image
    pub fn image(&self, handle: Handle<Image>) -> GraphicsResult<&Image> {
        self.ensure_initialized()?;
        Ok(self.images.try_get(handle)?)
    }

    /// Forget a kept image
    pub fn destroy_image(&mut self, handle: Handle<Image>) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        self.images.destroy(handle)?;
        Ok(())
    }

    /// Upload an image as a texture
    ///
    /// Fails with [`GraphicsError::UnsupportedFormat`] when the backend
    /// cannot store the image's pixel format; no handle is created then.
    pub fn create_texture(&mut self, image: &Image) -> GraphicsResult<Handle<Texture>> {
        let smooth = self.config.smooth_textures;
        let backend = self.backend_mut()?;
        if !backend.supports_format(image.format()) {
            let error = GraphicsError::UnsupportedFormat {
                backend: backend.name(),
                format: image.format(),
            };
            log::error!("Texture upload rejected: {}", error);
            return Err(error);
        }

        let id = backend.create_texture(image, smooth)?;
        let texture = Texture {
            id,
            width: image.width(),
            height: image.height(),
            smooth,
        };
        match self.textures.create(texture) {
            Ok(handle) => {
                log::debug!(
                    "Created texture {} ({}x{}, {:?})",
                    handle.id(),
                    image.width(),
                    image.height(),
                    image.format()
                );
                Ok(handle)
            }
            Err(e) => {
                self.backend_mut()?.destroy_texture(id);
                Err(e.into())
            }
        }
    }

    /// Upload a kept image as a texture
    pub fn create_texture_from_image(&mut self, image: Handle<Image>) -> GraphicsResult<Handle<Texture>> {
        self.ensure_initialized()?;
        let image = self.images.try_get(image)?.clone();
        self.create_texture(&image)
    }

    /// Decode an image file straight into a texture
    pub fn load_texture<P: AsRef<Path>>(&mut self, path: P) -> GraphicsResult<Handle<Texture>> {
        self.ensure_initialized()?;
        let image = Image::from_file(path.as_ref()).map_err(|e| {
            log::error!("Failed to load texture {:?}: {}", path.as_ref(), e);
            e
        })?;
        self.create_texture(&image)
    }

    /// Texture record
    pub fn texture(&self, handle: Handle<Texture>) -> GraphicsResult<&Texture> {
        self.ensure_initialized()?;
        Ok(self.textures.try_get(handle)?)
    }

    /// Delete a texture, drawing anything queued first
    pub fn destroy_texture(&mut self, handle: Handle<Texture>) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let id = self.textures.try_get(handle)?.id;
        self.flush()?;
        self.textures.destroy(handle)?;
        self.backend_mut()?.destroy_texture(id);
        self.pipeline.forget_texture(id);
        log::debug!("Destroyed texture {}", handle.id());
        Ok(())
    }

    /// Switch a texture between nearest and bilinear filtering
    pub fn set_texture_smooth(&mut self, handle: Handle<Texture>, smooth: bool) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let id = self.textures.try_get(handle)?.id;
        if self.pipeline.references_texture(id) {
            self.flush()?;
        }
        self.backend_mut()?.set_texture_smooth(id, smooth)?;
        self.textures.try_get_mut(handle)?.smooth = smooth;
        Ok(())
    }

    // Transforms

    fn pixel_projection(width: u32, height: u32) -> Mat4 {
        Mat4::ortho(0.0, width as f32, height as f32, 0.0)
    }

    /// Save the current model-view matrix
    pub fn push_matrix(&mut self) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        if self.matrix_stack.len() >= self.config.matrix_stack_depth {
            return Err(GraphicsError::MatrixStack("overflow"));
        }
        self.matrix_stack.push(*self.pipeline.modelview());
        Ok(())
    }

    /// Restore the last saved model-view matrix
    pub fn pop_matrix(&mut self) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let matrix = self.matrix_stack.pop().ok_or(GraphicsError::MatrixStack("underflow"))?;
        self.pipeline.set_modelview(matrix);
        Ok(())
    }

    fn update_modelview(&mut self, f: impl FnOnce(&Mat4) -> Mat4) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let modelview = f(self.pipeline.modelview());
        self.pipeline.set_modelview(modelview);
        Ok(())
    }

    /// Translate subsequent draws
    pub fn translate(&mut self, x: f32, y: f32) -> GraphicsResult<()> {
        self.update_modelview(|m| m.translated(x, y))
    }

    /// Scale subsequent draws
    pub fn scale(&mut self, x: f32, y: f32) -> GraphicsResult<()> {
        self.update_modelview(|m| m.scaled(x, y))
    }

    /// Rotate subsequent draws, in degrees
    pub fn rotate(&mut self, degrees: f32) -> GraphicsResult<()> {
        self.update_modelview(|m| m.rotated(degrees))
    }

    /// Camera centred on `(x, y)` showing `w` by `h` units, rotated by
    /// `rotation` degrees
    pub fn set_view(&mut self, x: f32, y: f32, w: f32, h: f32, rotation: f32) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        let (half_w, half_h) = (w / 2.0, h / 2.0);
        let projection = Mat4::ortho(-half_w, half_w, half_h, -half_h)
            .rotated(rotation)
            .translated(-x, -y);
        self.pipeline.set_projection(projection);
        Ok(())
    }

    /// Restore the pixel view for the current surface size
    pub fn reset_view(&mut self) -> GraphicsResult<()> {
        self.ensure_initialized()?;
        self.pipeline.set_projection(Self::pixel_projection(self.width, self.height));
        Ok(())
    }
}

impl Drop for Graphics {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::handles::HandleError;
    use crate::testing::{Call, RecordingGraphics, SharedLog};
    use approx::assert_relative_eq;

    fn graphics() -> (Graphics, SharedLog) {
        let (backend, log) = RecordingGraphics::new();
        let mut graphics = Graphics::new(GraphicsConfig::default(), None, vec![Box::new(backend)]);
        graphics.initialize(100, 50).unwrap();
        (graphics, log)
    }

    fn software() -> Graphics {
        let mut graphics = Graphics::new(GraphicsConfig::default(), None, backend::default_candidates());
        graphics.initialize(32, 32).unwrap();
        graphics
    }

    #[test]
    fn test_operations_before_initialize_fail() {
        let (backend, _) = RecordingGraphics::new();
        let mut graphics = Graphics::new(GraphicsConfig::default(), None, vec![Box::new(backend)]);

        assert!(matches!(graphics.clear(Color::BLACK), Err(GraphicsError::NotInitialized)));
        assert!(matches!(
            graphics.draw_point(0.0, 0.0, Color::WHITE),
            Err(GraphicsError::NotInitialized)
        ));
        assert!(matches!(graphics.terminate(), Err(GraphicsError::NotInitialized)));
    }

    #[test]
    fn test_operations_after_terminate_fail() {
        let (mut graphics, _) = graphics();
        graphics.terminate().unwrap();
        assert!(matches!(graphics.flush(), Err(GraphicsError::NotInitialized)));
        assert!(matches!(graphics.terminate(), Err(GraphicsError::NotInitialized)));
    }

    #[test]
    fn test_backend_selected_once_across_reinitialization() {
        let (mut graphics, log) = graphics();
        graphics.terminate().unwrap();
        graphics.initialize(10, 10).unwrap();

        assert_eq!(graphics.backend_name(), Some("recording"));
        let log = log.borrow();
        assert_eq!(log.count(|call| matches!(call, Call::Init(..))), 2);
        assert_eq!(log.count(|call| matches!(call, Call::Terminate)), 1);
    }

    #[test]
    fn test_unavailable_backend_falls_back() {
        let (broken, _) = RecordingGraphics::new();
        let mut graphics = Graphics::new(
            GraphicsConfig::default(),
            None,
            vec![Box::new(broken.unavailable()), Box::new(backend::NullGraphics::new())],
        );
        graphics.initialize(8, 8).unwrap();
        assert_eq!(graphics.backend_name(), Some("null"));
    }

    #[test]
    fn test_fill_is_submitted_before_outline() {
        let (mut graphics, log) = graphics();
        graphics
            .draw_rectangle(1.0, 2.0, 3.0, 4.0, Color::RED, Color::BLUE)
            .unwrap();
        graphics
            .draw_triangle([0.0, 0.0], [1.0, 0.0], [0.0, 1.0], Color::GREEN, Color::WHITE)
            .unwrap();
        graphics.flush().unwrap();

        assert_eq!(
            log.borrow().draws(),
            vec![
                (PrimitiveKind::Triangles, 0, 6),
                (PrimitiveKind::LineLoop, 6, 4),
                (PrimitiveKind::Triangles, 10, 3),
                (PrimitiveKind::LineLoop, 13, 3),
            ]
        );
    }

    #[test]
    fn test_transparent_parts_are_skipped() {
        let (mut graphics, _) = graphics();
        graphics
            .draw_rectangle(0.0, 0.0, 5.0, 5.0, Color::TRANSPARENT, Color::RED)
            .unwrap();
        graphics
            .draw_rectangle(0.0, 0.0, 5.0, 5.0, Color::RED, Color::TRANSPARENT)
            .unwrap();
        graphics
            .draw_triangle([0.0, 0.0], [1.0, 0.0], [0.0, 1.0], Color::TRANSPARENT, Color::TRANSPARENT)
            .unwrap();

        let kinds: Vec<_> = graphics.pipeline().pending_commands().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![PrimitiveKind::Triangles, PrimitiveKind::LineLoop]);
    }

    #[test]
    fn test_uploaded_vertices_are_normalized_and_flipped() {
        let (mut graphics, log) = graphics();
        let texture = graphics.create_texture(&Image::solid_color(4, 4, [255; 4])).unwrap();
        graphics.draw_texture(texture, 0.0, 0.0, 10.0, 10.0).unwrap();
        graphics.draw_point(1.0, 1.0, Color::rgba(255, 0, 0, 51)).unwrap();
        graphics.flush().unwrap();

        let log = log.borrow();
        let uploaded = log.last_upload().unwrap();
        // First textured vertex is the top-left corner with v = 0
        assert_relative_eq!(uploaded[0].texcoord[1], 1.0);
        assert_relative_eq!(uploaded[2].texcoord[1], 0.0);
        assert_relative_eq!(uploaded[6].color[0], 1.0);
        assert_relative_eq!(uploaded[6].color[3], 0.2);
    }

    #[test]
    fn test_unsupported_format_creates_no_handle() {
        let (backend, log) = RecordingGraphics::new();
        let mut graphics = Graphics::new(
            GraphicsConfig::default(),
            None,
            vec![Box::new(backend.without_format(ImageFormat::GrayAlpha))],
        );
        graphics.initialize(16, 16).unwrap();

        let image = Image::new(1, 1, 2, vec![10, 20]).unwrap();
        let result = graphics.create_texture(&image);

        assert!(matches!(
            result,
            Err(GraphicsError::UnsupportedFormat {
                format: ImageFormat::GrayAlpha,
                ..
            })
        ));
        assert_eq!(log.borrow().count(|call| matches!(call, Call::CreateTexture(_))), 0);

        // The next successful texture still gets a fresh handle
        let handle = graphics.create_texture(&Image::solid_color(1, 1, [0; 4])).unwrap();
        assert!(handle.is_valid());
    }

    #[test]
    fn test_destroy_texture_flushes_first() {
        let (mut graphics, log) = graphics();
        let texture = graphics.create_texture(&Image::solid_color(2, 2, [255; 4])).unwrap();
        graphics.draw_texture(texture, 0.0, 0.0, 2.0, 2.0).unwrap();
        graphics.destroy_texture(texture).unwrap();

        let log = log.borrow();
        let draw = log.position(|call| matches!(call, Call::Draw(..))).unwrap();
        let destroy = log.position(|call| matches!(call, Call::DestroyTexture(_))).unwrap();
        assert!(draw < destroy);

        drop(log);
        assert!(matches!(
            graphics.draw_texture(texture, 0.0, 0.0, 2.0, 2.0),
            Err(GraphicsError::Handle(HandleError::NotFound { kind: "texture", .. }))
        ));
    }

    #[test]
    fn test_clear_and_capture_flush_first() {
        let (mut graphics, log) = graphics();
        graphics.draw_point(1.0, 1.0, Color::WHITE).unwrap();
        graphics.clear(Color::BLACK).unwrap();
        graphics.draw_point(2.0, 2.0, Color::WHITE).unwrap();
        graphics.capture_screen().unwrap();

        let log = log.borrow();
        let kinds: Vec<&str> = log
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw(..) => Some("draw"),
                Call::Clear(_) => Some("clear"),
                Call::CaptureScreen => Some("capture"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["draw", "clear", "draw", "capture"]);
    }

    #[test]
    fn test_matrix_stack_limits() {
        let (backend, _) = RecordingGraphics::new();
        let config = GraphicsConfig {
            matrix_stack_depth: 2,
            ..GraphicsConfig::default()
        };
        let mut graphics = Graphics::new(config, None, vec![Box::new(backend)]);
        graphics.initialize(10, 10).unwrap();

        assert!(matches!(graphics.pop_matrix(), Err(GraphicsError::MatrixStack("underflow"))));

        graphics.push_matrix().unwrap();
        graphics.translate(5.0, 0.0).unwrap();
        graphics.push_matrix().unwrap();
        assert!(matches!(graphics.push_matrix(), Err(GraphicsError::MatrixStack("overflow"))));

        graphics.scale(2.0, 2.0).unwrap();
        graphics.pop_matrix().unwrap();
        assert_eq!(*graphics.pipeline().modelview(), Mat4::identity().translated(5.0, 0.0));
        graphics.pop_matrix().unwrap();
        assert_eq!(*graphics.pipeline().modelview(), Mat4::identity());
    }

    #[test]
    fn test_set_view_centres_camera() {
        let (mut graphics, _) = graphics();
        graphics.set_view(50.0, 20.0, 100.0, 40.0, 0.0).unwrap();
        let (x, y) = graphics.pipeline().projection().transform_point_2d(50.0, 20.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);

        let (x, y) = graphics.pipeline().projection().transform_point_2d(100.0, 0.0);
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, 1.0);

        graphics.reset_view().unwrap();
        let (x, y) = graphics.pipeline().projection().transform_point_2d(0.0, 0.0);
        assert_relative_eq!(x, -1.0);
        assert_relative_eq!(y, 1.0);
    }

    #[test]
    fn test_resize_restores_pixel_view() {
        let (mut graphics, log) = graphics();
        graphics.resize(200, 100).unwrap();
        assert_eq!(graphics.size(), (200, 100));
        let (x, y) = graphics.pipeline().projection().transform_point_2d(200.0, 100.0);
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, -1.0);
        assert_eq!(log.borrow().count(|call| *call == Call::Resize(200, 100)), 1);
    }

    #[test]
    fn test_terminate_releases_textures() {
        let (mut graphics, log) = graphics();
        graphics.create_texture(&Image::solid_color(1, 1, [0; 4])).unwrap();
        graphics.create_texture(&Image::solid_color(1, 1, [0; 4])).unwrap();
        graphics.terminate().unwrap();
        assert_eq!(log.borrow().count(|call| matches!(call, Call::DestroyTexture(_))), 2);
    }

    #[test]
    fn test_software_backend_renders_rectangle() {
        let mut graphics = software();
        assert_eq!(graphics.backend_name(), Some("software"));

        graphics.clear(Color::BLACK).unwrap();
        graphics
            .draw_rectangle(4.0, 4.0, 8.0, 8.0, Color::TRANSPARENT, Color::GREEN)
            .unwrap();
        let capture = graphics.capture_screen().unwrap();

        assert_eq!(capture.pixel_rgba(8, 8), [0, 255, 0, 255]);
        assert_eq!(capture.pixel_rgba(2, 2), [0, 0, 0, 255]);
        assert_eq!(capture.pixel_rgba(12, 12), [0, 0, 0, 255]);
    }

    #[test]
    fn test_software_backend_draws_subtexture() {
        let mut graphics = software();
        graphics.set_blend_mode(BlendMode::NONE).unwrap();
        // 2x1 texture, left texel red, right texel blue
        let image = Image::new(2, 1, 3, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let texture = graphics.create_texture(&image).unwrap();

        graphics
            .draw_subtexture(texture, 0.0, 0.0, 8.0, 8.0, &Rect::new(1.0, 0.0, 1.0, 1.0))
            .unwrap();
        let capture = graphics.capture_screen().unwrap();

        assert_eq!(capture.pixel_rgba(4, 4), [0, 0, 255, 255]);
    }

    #[test]
    fn test_software_backend_clips_long_lines() {
        let mut graphics = software();
        graphics.clear(Color::BLACK).unwrap();
        graphics.draw_line(0.5, 0.5, 3.0e8, 0.5, Color::WHITE).unwrap();
        graphics.draw_line(0.5, 4.5, f32::INFINITY, 4.5, Color::WHITE).unwrap();
        graphics.flush().unwrap();
        let capture = graphics.capture_screen().unwrap();

        assert_eq!(capture.pixel_rgba(0, 0), [255, 255, 255, 255]);
        assert_eq!(capture.pixel_rgba(31, 0), [255, 255, 255, 255]);
        assert_eq!(capture.pixel_rgba(0, 4), [0, 0, 0, 255]);
    }

    #[test]
    fn test_translate_moves_drawing() {
        let mut graphics = software();
        graphics.clear(Color::BLACK).unwrap();
        graphics.translate(16.0, 16.0).unwrap();
        graphics
            .draw_rectangle(0.0, 0.0, 4.0, 4.0, Color::TRANSPARENT, Color::WHITE)
            .unwrap();
        let capture = graphics.capture_screen().unwrap();

        assert_eq!(capture.pixel_rgba(1, 1), [0, 0, 0, 255]);
        assert_eq!(capture.pixel_rgba(17, 17), [255, 255, 255, 255]);
    }
}
