//! Recording backends for unit tests
//!
//! Both backends append every call they receive to a shared [`CallLog`], so
//! a test can assert on the exact order of graphics and platform calls.

use crate::backend::Backend;
use crate::foundation::math::Mat4;
use crate::input::EventQueue;
use crate::platform::{InputScript, NullPlatform, PlatformBackend, PlatformError};
use crate::render::{
    Color, ConcreteBlend, GraphicsBackend, GraphicsResult, Image, ImageFormat, PackedVertex, PrimitiveKind,
    ProgramKind, TextureId, Uniform,
};
use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init(u32, u32),
    Terminate,
    Resize(u32, u32),
    UploadVertices(Vec<PackedVertex>),
    Clear(Color),
    Draw(PrimitiveKind, usize, usize),
    CreateTexture(TextureId),
    DestroyTexture(TextureId),
    SetTextureSmooth(TextureId, bool),
    ApplyTexture(Option<TextureId>),
    ApplyProgram(ProgramKind),
    UploadUniform(ProgramKind, Uniform, Mat4),
    ApplyBlend(ConcreteBlend),
    CaptureScreen,
    SwapBuffers,
    PumpEvents,
}

/// Ordered list of recorded calls
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Vec<Call>,
}

pub type SharedLog = Rc<RefCell<CallLog>>;

impl CallLog {
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }

    pub fn draws(&self) -> Vec<(PrimitiveKind, usize, usize)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                Call::Draw(kind, first, count) => Some((kind, first, count)),
                _ => None,
            })
            .collect()
    }

    pub fn uniform_uploads(&self, program: ProgramKind) -> usize {
        self.count(|call| matches!(call, Call::UploadUniform(p, _, _) if *p == program))
    }

    pub fn last_uniform(&self, program: ProgramKind) -> Option<(Uniform, Mat4)> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::UploadUniform(p, uniform, value) if *p == program => Some((*uniform, *value)),
            _ => None,
        })
    }

    pub fn last_blend(&self) -> Option<ConcreteBlend> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::ApplyBlend(blend) => Some(*blend),
            _ => None,
        })
    }

    pub fn last_upload(&self) -> Option<&[PackedVertex]> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::UploadVertices(vertices) => Some(vertices.as_slice()),
            _ => None,
        })
    }
}

/// Graphics backend that records instead of drawing
pub struct RecordingGraphics {
    log: SharedLog,
    available: bool,
    unsupported: Option<ImageFormat>,
    next_texture: u32,
    width: u32,
    height: u32,
}

impl RecordingGraphics {
    pub fn new() -> (Self, SharedLog) {
        let log = SharedLog::default();
        (Self::with_log(Rc::clone(&log)), log)
    }

    pub fn with_log(log: SharedLog) -> Self {
        Self {
            log,
            available: true,
            unsupported: None,
            next_texture: 0,
            width: 0,
            height: 0,
        }
    }

    /// Fail the availability probe
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Reject textures of `format`
    pub fn without_format(mut self, format: ImageFormat) -> Self {
        self.unsupported = Some(format);
        self
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl Backend for RecordingGraphics {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn probe(&self) -> bool {
        self.available
    }
}

impl GraphicsBackend for RecordingGraphics {
    fn init(&mut self, width: u32, height: u32) -> GraphicsResult<()> {
        self.width = width;
        self.height = height;
        self.record(Call::Init(width, height));
        Ok(())
    }

    fn terminate(&mut self) {
        self.record(Call::Terminate);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.record(Call::Resize(width, height));
    }

    fn supports_format(&self, format: ImageFormat) -> bool {
        self.unsupported != Some(format)
    }

    fn upload_vertices(&mut self, vertices: &[PackedVertex]) {
        self.record(Call::UploadVertices(vertices.to_vec()));
    }

    fn clear(&mut self, color: Color) {
        self.record(Call::Clear(color));
    }

    fn draw(&mut self, kind: PrimitiveKind, first: usize, count: usize) {
        self.record(Call::Draw(kind, first, count));
    }

    fn create_texture(&mut self, _image: &Image, _smooth: bool) -> GraphicsResult<TextureId> {
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.record(Call::CreateTexture(id));
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.record(Call::DestroyTexture(texture));
    }

    fn set_texture_smooth(&mut self, texture: TextureId, smooth: bool) -> GraphicsResult<()> {
        self.record(Call::SetTextureSmooth(texture, smooth));
        Ok(())
    }

    fn apply_texture(&mut self, texture: Option<TextureId>) {
        self.record(Call::ApplyTexture(texture));
    }

    fn apply_program(&mut self, program: ProgramKind) {
        self.record(Call::ApplyProgram(program));
    }

    fn upload_uniform(&mut self, program: ProgramKind, uniform: Uniform, value: &Mat4) {
        self.record(Call::UploadUniform(program, uniform, *value));
    }

    fn apply_blend_mode(&mut self, blend: &ConcreteBlend) {
        self.record(Call::ApplyBlend(*blend));
    }

    fn capture_screen(&mut self) -> GraphicsResult<Image> {
        self.record(Call::CaptureScreen);
        Ok(Image::solid_color(self.width.max(1), self.height.max(1), [0; 4]))
    }
}

/// Headless platform that also records pumps and swaps
pub struct RecordingPlatform {
    inner: NullPlatform,
    log: SharedLog,
}

impl RecordingPlatform {
    pub fn new(log: SharedLog, script: InputScript) -> Self {
        Self {
            inner: NullPlatform::with_script(script),
            log,
        }
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl Backend for RecordingPlatform {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn probe(&self) -> bool {
        true
    }
}

impl PlatformBackend for RecordingPlatform {
    fn init(&mut self, title: &str, width: u32, height: u32) -> Result<(), PlatformError> {
        self.inner.init(title, width, height)
    }

    fn terminate(&mut self) {
        self.inner.terminate();
    }

    fn pump_events(&mut self, queue: &mut EventQueue) -> bool {
        self.record(Call::PumpEvents);
        self.inner.pump_events(queue)
    }

    fn swap_buffers(&mut self) {
        self.record(Call::SwapBuffers);
        self.inner.swap_buffers();
    }

    fn set_title(&mut self, title: &str) -> Result<(), PlatformError> {
        self.inner.set_title(title)
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        self.inner.set_size(width, height)
    }

    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn gl_version(&self) -> u32 {
        self.inner.gl_version()
    }

    fn gl_proc_address(&mut self, name: &str) -> *const c_void {
        self.inner.gl_proc_address(name)
    }
}
