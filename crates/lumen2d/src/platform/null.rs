//! Headless platform backend
//!
//! Keeps window state in memory and replays events from an [`InputScript`],
//! which makes the whole engine drivable without a display.

use super::{check_size, PlatformBackend, PlatformError};
use crate::backend::Backend;
use crate::input::{Event, EventQueue};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;
use std::rc::Rc;

#[derive(Debug, Default)]
struct ScriptState {
    frames: VecDeque<Vec<Event>>,
    quit_requested: bool,
}

/// Shared source of events for a [`NullPlatform`]
///
/// Clones share the same script, so a caller can keep one and feed events
/// after the platform has been handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    state: Rc<RefCell<ScriptState>>,
}

impl InputScript {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue events delivered together by the next pump
    pub fn push_frame<I: IntoIterator<Item = Event>>(&self, events: I) {
        self.state.borrow_mut().frames.push_back(events.into_iter().collect());
    }

    /// Queue one event for the next pump
    ///
    /// Events pushed between two pumps are delivered together.
    pub fn push(&self, event: Event) {
        let mut state = self.state.borrow_mut();
        match state.frames.back_mut() {
            Some(frame) => frame.push(event),
            None => state.frames.push_back(vec![event]),
        }
    }

    /// Ask the platform to report quitting on its next pump
    pub fn request_quit(&self) {
        self.state.borrow_mut().quit_requested = true;
    }

    /// Frames not yet delivered
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    fn next_frame(&self) -> (Vec<Event>, bool) {
        let mut state = self.state.borrow_mut();
        let events = state.frames.pop_front().unwrap_or_default();
        (events, state.quit_requested)
    }
}

/// Platform backend without a window
#[derive(Debug)]
pub struct NullPlatform {
    title: String,
    width: u32,
    height: u32,
    open: bool,
    script: InputScript,
    frame_limit: Option<u64>,
    frames: u64,
    swaps: u64,
}

impl Default for NullPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl NullPlatform {
    /// Platform with an empty script
    pub fn new() -> Self {
        Self::with_script(InputScript::new())
    }

    /// Platform replaying `script`
    pub fn with_script(script: InputScript) -> Self {
        Self {
            title: String::new(),
            width: 0,
            height: 0,
            open: false,
            script,
            frame_limit: None,
            frames: 0,
            swaps: 0,
        }
    }

    /// Request quitting after `frames` pumps
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Current window title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Frames presented so far
    pub const fn swap_count(&self) -> u64 {
        self.swaps
    }
}

impl Backend for NullPlatform {
    fn name(&self) -> &'static str {
        "null"
    }

    fn probe(&self) -> bool {
        true
    }
}

impl PlatformBackend for NullPlatform {
    fn init(&mut self, title: &str, width: u32, height: u32) -> Result<(), PlatformError> {
        check_size(width, height)?;
        self.title = title.to_string();
        self.width = width;
        self.height = height;
        self.open = true;
        self.frames = 0;
        log::debug!("Headless window '{}' {}x{}", title, width, height);
        Ok(())
    }

    fn terminate(&mut self) {
        self.open = false;
    }

    fn pump_events(&mut self, queue: &mut EventQueue) -> bool {
        self.frames += 1;
        let (events, quit_requested) = self.script.next_frame();
        for event in &events {
            if let Event::WindowResized { width, height } = *event {
                self.width = width;
                self.height = height;
            }
        }
        queue.extend(events);
        let limit_reached = self.frame_limit.is_some_and(|limit| self.frames > limit);
        !(quit_requested || limit_reached)
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }

    fn set_title(&mut self, title: &str) -> Result<(), PlatformError> {
        if !self.open {
            return Err(PlatformError::NoWindow);
        }
        self.title = title.to_string();
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        if !self.open {
            return Err(PlatformError::NoWindow);
        }
        check_size(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn gl_version(&self) -> u32 {
        0
    }

    fn gl_proc_address(&mut self, _name: &str) -> *const c_void {
        std::ptr::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn test_script_frames_are_delivered_in_order() {
        let script = InputScript::new();
        script.push_frame([Event::KeyPressed(KeyCode::A), Event::KeyReleased(KeyCode::A)]);
        script.push_frame([Event::WindowDeactivated]);

        let mut platform = NullPlatform::with_script(script.clone());
        platform.init("test", 64, 64).unwrap();
        let mut queue = EventQueue::new();

        assert!(platform.pump_events(&mut queue));
        assert_eq!(queue.len(), 2);
        queue.clear();

        assert!(platform.pump_events(&mut queue));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![Event::WindowDeactivated]);
        assert_eq!(script.pending_frames(), 0);
    }

    #[test]
    fn test_quit_request_still_delivers_events() {
        let script = InputScript::new();
        script.push(Event::KeyPressed(KeyCode::Escape));
        script.request_quit();

        let mut platform = NullPlatform::with_script(script);
        let mut queue = EventQueue::new();
        assert!(!platform.pump_events(&mut queue));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_frame_limit() {
        let mut platform = NullPlatform::new().with_frame_limit(2);
        let mut queue = EventQueue::new();
        assert!(platform.pump_events(&mut queue));
        assert!(platform.pump_events(&mut queue));
        assert!(!platform.pump_events(&mut queue));
    }

    #[test]
    fn test_window_state() {
        let mut platform = NullPlatform::new();
        assert_eq!(platform.set_title("early"), Err(PlatformError::NoWindow));

        platform.init("first", 320, 240).unwrap();
        platform.set_title("second").unwrap();
        platform.set_size(640, 480).unwrap();
        assert_eq!(platform.title(), "second");
        assert_eq!(platform.size(), (640, 480));
        assert_eq!(
            platform.set_size(0, 10),
            Err(PlatformError::InvalidSize { width: 0, height: 10 })
        );
        assert!(platform.gl_proc_address("glClear").is_null());
    }
}
