//! # Draw Pipeline
//!
//! Accumulates vertices and draw commands during a frame and submits them
//! to the graphics backend with as few state changes as possible.
//!
//! ## Architecture
//!
//! - **Submission**: every draw appends vertices and either extends the
//!   previous [`DrawCommand`] (same primitive, program, texture, blend and
//!   matrices) or starts a new one. Line loops never merge.
//! - **Flush**: vertices are packed and uploaded once, then commands are
//!   replayed in submission order.
//! - **State cache**: [`DrawState`] mirrors what the backend currently has
//!   applied. Programs, textures and blend modes are only re-applied when
//!   they differ from the cache; matrix uniforms are tracked per program
//!   with dirty bits and uploaded lazily when a program is used.

use crate::foundation::math::Mat4;
use crate::render::backend::{GraphicsBackend, TextureId, Uniform};
use crate::render::blend::BlendMode;
use crate::render::vertex::{PackedVertex, PrimitiveKind, ProgramKind, Vertex};

/// One contiguous run of vertices drawn with a single state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Primitive topology
    pub kind: PrimitiveKind,
    /// Program to draw with
    pub program: ProgramKind,
    /// Texture to sample; only meaningful for [`ProgramKind::Textured`]
    pub texture: Option<TextureId>,
    /// Blend mode at submission time
    pub blend: BlendMode,
    /// Projection at submission time
    pub projection: Mat4,
    /// Model-view at submission time
    pub modelview: Mat4,
    /// Index of the first vertex in the frame's vertex buffer
    pub first: usize,
    /// Vertex count
    pub count: usize,
}

impl DrawCommand {
    fn can_extend(&self, other: &DrawCommand) -> bool {
        self.kind.is_batchable()
            && self.kind == other.kind
            && self.program == other.program
            && self.texture == other.texture
            && self.blend == other.blend
            && self.projection == other.projection
            && self.modelview == other.modelview
    }
}

/// Backend state as last applied by the pipeline
#[derive(Debug, Clone)]
pub struct DrawState {
    active_program: Option<ProgramKind>,
    bound_texture: Option<TextureId>,
    applied_blend: Option<BlendMode>,
    projection: Mat4,
    modelview: Mat4,
    dirty: [Uniform; ProgramKind::COUNT],
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            active_program: None,
            bound_texture: None,
            applied_blend: None,
            projection: Mat4::identity(),
            modelview: Mat4::identity(),
            dirty: [Uniform::all(); ProgramKind::COUNT],
        }
    }
}

impl DrawState {
    /// Program currently applied
    pub const fn active_program(&self) -> Option<ProgramKind> {
        self.active_program
    }

    /// Texture currently bound
    pub const fn bound_texture(&self) -> Option<TextureId> {
        self.bound_texture
    }

    /// Blend mode currently applied
    pub const fn applied_blend(&self) -> Option<BlendMode> {
        self.applied_blend
    }

    /// Uniforms of `program` that must be uploaded before its next draw
    pub const fn dirty_uniforms(&self, program: ProgramKind) -> Uniform {
        self.dirty[program.index()]
    }

    fn sync_matrices(&mut self, projection: &Mat4, modelview: &Mat4) {
        if self.projection != *projection {
            self.projection = *projection;
            for bits in &mut self.dirty {
                bits.insert(Uniform::PROJECTION);
            }
        }
        if self.modelview != *modelview {
            self.modelview = *modelview;
            for bits in &mut self.dirty {
                bits.insert(Uniform::MODELVIEW);
            }
        }
    }
}

/// Counters for the last flushes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Flushes that submitted at least one command
    pub flushes: u32,
    /// Backend draw calls
    pub draw_calls: u32,
    /// Vertices uploaded
    pub vertices: u32,
    /// Program switches
    pub program_changes: u32,
    /// Texture binds
    pub texture_changes: u32,
    /// Blend state changes
    pub blend_changes: u32,
    /// Uniform uploads
    pub uniform_uploads: u32,
}

/// Batched 2D draw pipeline
#[derive(Debug)]
pub struct DrawPipeline {
    vertices: Vec<Vertex>,
    packed: Vec<PackedVertex>,
    commands: Vec<DrawCommand>,
    state: DrawState,
    projection: Mat4,
    modelview: Mat4,
    blend: BlendMode,
    stats: PipelineStats,
}

impl Default for DrawPipeline {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DrawPipeline {
    /// Create a pipeline with room for `vertex_capacity` vertices
    pub fn new(vertex_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            packed: Vec::with_capacity(vertex_capacity),
            commands: Vec::new(),
            state: DrawState::default(),
            projection: Mat4::identity(),
            modelview: Mat4::identity(),
            blend: BlendMode::default(),
            stats: PipelineStats::default(),
        }
    }

    /// Projection used by subsequent draws
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Set the projection for subsequent draws
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Model-view used by subsequent draws
    pub const fn modelview(&self) -> &Mat4 {
        &self.modelview
    }

    /// Set the model-view for subsequent draws
    pub fn set_modelview(&mut self, modelview: Mat4) {
        self.modelview = modelview;
    }

    /// Blend mode used by subsequent draws
    pub const fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Set the blend mode for subsequent draws
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Backend state cache
    pub const fn state(&self) -> &DrawState {
        &self.state
    }

    /// Counters accumulated since the last [`DrawPipeline::reset_stats`]
    pub const fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Zero the counters
    pub fn reset_stats(&mut self) {
        self.stats = PipelineStats::default();
    }

    /// Whether nothing is waiting to be flushed
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands, in submission order
    pub fn pending_commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Queued vertex count
    pub fn pending_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Whether any queued command samples `texture`
    pub fn references_texture(&self, texture: TextureId) -> bool {
        self.commands.iter().any(|command| command.texture == Some(texture))
    }

    /// Queue vertices for drawing
    ///
    /// `texture` is ignored for [`ProgramKind::Solid`].
    pub fn submit(&mut self, kind: PrimitiveKind, program: ProgramKind, texture: Option<TextureId>, vertices: &[Vertex]) {
        if vertices.is_empty() {
            return;
        }

        let command = DrawCommand {
            kind,
            program,
            texture: match program {
                ProgramKind::Solid => None,
                ProgramKind::Textured => texture,
            },
            blend: self.blend,
            projection: self.projection,
            modelview: self.modelview,
            first: self.vertices.len(),
            count: vertices.len(),
        };
        self.vertices.extend_from_slice(vertices);

        match self.commands.last_mut() {
            Some(last) if last.can_extend(&command) => last.count += command.count,
            _ => self.commands.push(command),
        }
    }

    /// Submit every queued command to `backend`
    ///
    /// Buffers are emptied but keep their capacity.
    pub fn flush(&mut self, backend: &mut dyn GraphicsBackend) {
        if self.commands.is_empty() {
            self.vertices.clear();
            return;
        }

        self.packed.clear();
        self.packed.extend(self.vertices.iter().map(Vertex::pack));
        backend.upload_vertices(&self.packed);
        self.stats.vertices += self.packed.len() as u32;

        let mut commands = std::mem::take(&mut self.commands);
        for command in &commands {
            self.state.sync_matrices(&command.projection, &command.modelview);
            self.apply_program(backend, command.program);
            if command.program == ProgramKind::Textured {
                self.apply_texture(backend, command.texture);
            }
            self.apply_blend(backend, command.blend);
            backend.draw(command.kind, command.first, command.count);
            self.stats.draw_calls += 1;
        }
        self.stats.flushes += 1;

        commands.clear();
        self.commands = commands;
        self.vertices.clear();
    }

    fn apply_program(&mut self, backend: &mut dyn GraphicsBackend, program: ProgramKind) {
        if self.state.active_program != Some(program) {
            backend.apply_program(program);
            self.state.active_program = Some(program);
            self.stats.program_changes += 1;
        }

        let dirty = self.state.dirty[program.index()];
        if dirty.contains(Uniform::PROJECTION) {
            backend.upload_uniform(program, Uniform::PROJECTION, &self.state.projection);
            self.stats.uniform_uploads += 1;
        }
        if dirty.contains(Uniform::MODELVIEW) {
            backend.upload_uniform(program, Uniform::MODELVIEW, &self.state.modelview);
            self.stats.uniform_uploads += 1;
        }
        self.state.dirty[program.index()] = Uniform::empty();
    }

    fn apply_texture(&mut self, backend: &mut dyn GraphicsBackend, texture: Option<TextureId>) {
        if self.state.bound_texture != texture {
            backend.apply_texture(texture);
            self.state.bound_texture = texture;
            self.stats.texture_changes += 1;
        }
    }

    fn apply_blend(&mut self, backend: &mut dyn GraphicsBackend, blend: BlendMode) {
        if self.state.applied_blend != Some(blend) {
            backend.apply_blend_mode(&blend.to_concrete());
            self.state.applied_blend = Some(blend);
            self.stats.blend_changes += 1;
        }
    }

    /// The backend deleted `texture`; a bound copy no longer exists
    pub fn forget_texture(&mut self, texture: TextureId) {
        if self.state.bound_texture == Some(texture) {
            self.state.bound_texture = None;
        }
    }

    /// Drop queued work and assume nothing about backend state
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.packed.clear();
        self.commands.clear();
        self.state = DrawState::default();
        self.projection = Mat4::identity();
        self.modelview = Mat4::identity();
        self.blend = BlendMode::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use crate::render::vertex::Color;
    use crate::testing::{Call, RecordingGraphics};

    fn solid(count: usize) -> Vec<Vertex> {
        (0..count).map(|i| Vertex::solid(i as f32, 0.0, Color::WHITE)).collect()
    }

    fn textured(count: usize) -> Vec<Vertex> {
        (0..count).map(|i| Vertex::textured(i as f32, 0.0, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_matching_submissions_merge() {
        let mut pipeline = DrawPipeline::new(16);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(6));

        assert_eq!(pipeline.pending_commands().len(), 1);
        assert_eq!(pipeline.pending_commands()[0].count, 9);
        assert_eq!(pipeline.pending_vertices(), 9);
    }

    #[test]
    fn test_line_loops_never_merge() {
        let mut pipeline = DrawPipeline::new(16);
        pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(4));
        pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(4));

        let commands = pipeline.pending_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!((commands[1].first, commands[1].count), (4, 4));
    }

    #[test]
    fn test_state_change_splits_commands() {
        let mut pipeline = DrawPipeline::new(16);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.set_modelview(Mat4::identity().translated(1.0, 0.0));
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.set_blend_mode(BlendMode::ADD);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));

        assert_eq!(pipeline.pending_commands().len(), 3);
    }

    #[test]
    fn test_empty_submission_is_ignored() {
        let mut pipeline = DrawPipeline::new(16);
        pipeline.submit(PrimitiveKind::Points, ProgramKind::Solid, None, &[]);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_flush_uploads_once_and_draws_in_order() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(16);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(4));

        pipeline.flush(&mut backend);

        let log = log.borrow();
        assert_eq!(log.count(|call| matches!(call, Call::UploadVertices(_))), 1);
        assert_eq!(
            log.draws(),
            vec![(PrimitiveKind::Triangles, 0, 3), (PrimitiveKind::LineLoop, 3, 4)]
        );
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.pending_vertices(), 0);
    }

    #[test]
    fn test_flush_with_nothing_queued_touches_nothing() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(16);
        pipeline.flush(&mut backend);
        assert!(log.borrow().calls.is_empty());
    }

    #[test]
    fn test_same_texture_bound_once_per_frame() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(64);
        let texture = Some(TextureId(7));
        for _ in 0..5 {
            pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, texture, &textured(6));
            pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(4));
        }

        pipeline.flush(&mut backend);

        assert_eq!(log.borrow().count(|call| matches!(call, Call::ApplyTexture(_))), 1);
    }

    #[test]
    fn test_texture_binds_follow_changes() {
        let a = Some(TextureId(1));
        let b = Some(TextureId(2));
        let cases: [(&[Option<TextureId>], usize); 3] = [(&[a, a], 1), (&[a, a, b, b], 2), (&[a, b, a], 3)];

        for (sequence, expected) in cases {
            let (mut backend, log) = RecordingGraphics::new();
            let mut pipeline = DrawPipeline::new(64);
            for texture in sequence {
                // Outline between quads keeps every textured draw a separate command
                pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, *texture, &textured(6));
                pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(4));
            }
            pipeline.flush(&mut backend);
            assert_eq!(
                log.borrow().count(|call| matches!(call, Call::ApplyTexture(_))),
                expected,
                "sequence {:?}",
                sequence
            );
        }
    }

    #[test]
    fn test_texture_cache_survives_flushes() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(16);
        for _ in 0..3 {
            pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, Some(TextureId(3)), &textured(3));
            pipeline.flush(&mut backend);
        }
        assert_eq!(log.borrow().count(|call| matches!(call, Call::ApplyTexture(_))), 1);

        pipeline.forget_texture(TextureId(3));
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, Some(TextureId(3)), &textured(3));
        pipeline.flush(&mut backend);
        assert_eq!(log.borrow().count(|call| matches!(call, Call::ApplyTexture(_))), 2);
    }

    #[test]
    fn test_blend_mode_applied_only_on_change() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(64);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(3));
        pipeline.submit(PrimitiveKind::LineLoop, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);
        assert_eq!(log.borrow().count(|call| matches!(call, Call::ApplyBlend(_))), 1);

        pipeline.set_blend_mode(BlendMode::ADD);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.set_blend_mode(BlendMode::ALPHA);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);

        let log = log.borrow();
        assert_eq!(log.count(|call| matches!(call, Call::ApplyBlend(_))), 3);
        assert_eq!(log.last_blend(), Some(BlendMode::ALPHA.to_concrete()));
    }

    #[test]
    fn test_uniforms_uploaded_lazily_per_program() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(64);
        pipeline.set_projection(Mat4::ortho(0.0, 100.0, 100.0, 0.0));

        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);
        {
            let log = log.borrow();
            assert_eq!(log.uniform_uploads(ProgramKind::Solid), 2);
            assert_eq!(log.uniform_uploads(ProgramKind::Textured), 0);
        }
        assert_eq!(pipeline.state().dirty_uniforms(ProgramKind::Solid), Uniform::empty());
        assert_eq!(pipeline.state().dirty_uniforms(ProgramKind::Textured), Uniform::all());

        // Same matrices again: nothing to upload
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);
        assert_eq!(log.borrow().uniform_uploads(ProgramKind::Solid), 2);

        // Model-view change marks only that slot dirty
        pipeline.set_modelview(Mat4::identity().translated(5.0, 5.0));
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);
        let log = log.borrow();
        assert_eq!(log.uniform_uploads(ProgramKind::Solid), 3);
        assert_eq!(
            log.last_uniform(ProgramKind::Solid),
            Some((Uniform::MODELVIEW, Mat4::identity().translated(5.0, 5.0)))
        );
    }

    #[test]
    fn test_switching_programs_uploads_pending_uniforms() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(64);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Textured, Some(TextureId(1)), &textured(3));
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);

        let log = log.borrow();
        assert_eq!(log.count(|call| matches!(call, Call::ApplyProgram(_))), 3);
        assert_eq!(log.uniform_uploads(ProgramKind::Solid), 2);
        assert_eq!(log.uniform_uploads(ProgramKind::Textured), 2);
    }

    #[test]
    fn test_reset_forgets_cached_state() {
        let (mut backend, log) = RecordingGraphics::new();
        let mut pipeline = DrawPipeline::new(16);
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);

        pipeline.reset();
        pipeline.submit(PrimitiveKind::Triangles, ProgramKind::Solid, None, &solid(3));
        pipeline.flush(&mut backend);

        assert_eq!(log.borrow().count(|call| matches!(call, Call::ApplyProgram(_))), 2);
    }
}
