//! Reference-counted subsystem lifecycle
//!
//! Each façade (engine, graphics, audio) moves through
//! `Uninitialized -> Initialized -> Terminated`. Nested `initialize` calls
//! only bump a counter; the matching number of `terminate` calls is needed
//! before the subsystem is actually torn down.

/// Lifecycle phase of a subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never initialized
    Uninitialized,
    /// Initialized and usable
    Initialized,
    /// Torn down; may be initialized again
    Terminated,
}

/// Result of entering a lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enter {
    /// First initialization: the caller must set the subsystem up
    First,
    /// Already initialized: nothing to do
    Nested,
}

/// Result of leaving a lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leave {
    /// Last reference released: the caller must tear the subsystem down
    Last,
    /// Still referenced: nothing to do
    Nested,
    /// Not initialized: nothing to leave
    NotInitialized,
}

/// Reference-counted lifecycle guard
#[derive(Debug)]
pub struct Lifecycle {
    name: &'static str,
    state: LifecycleState,
    refs: u32,
}

impl Lifecycle {
    /// Create a guard for the named subsystem
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: LifecycleState::Uninitialized,
            refs: 0,
        }
    }

    /// Current phase
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the subsystem is usable
    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    /// Register an initialize call
    pub fn enter(&mut self) -> Enter {
        self.refs += 1;
        if self.refs > 1 {
            log::warn!(
                "{} already initialized ({} references), ignoring",
                self.name,
                self.refs
            );
            return Enter::Nested;
        }
        Enter::First
    }

    /// Mark the first initialization as complete
    pub fn commit(&mut self) {
        self.state = LifecycleState::Initialized;
        log::info!("{} initialized", self.name);
    }

    /// Roll back a failed first initialization
    pub fn abort(&mut self) {
        self.refs = 0;
        self.state = LifecycleState::Uninitialized;
    }

    /// Register a terminate call
    pub fn leave(&mut self) -> Leave {
        if self.state != LifecycleState::Initialized {
            log::warn!("{} terminate called while not initialized", self.name);
            return Leave::NotInitialized;
        }
        self.refs -= 1;
        if self.refs > 0 {
            return Leave::Nested;
        }
        self.state = LifecycleState::Terminated;
        log::info!("{} terminated", self.name);
        Leave::Last
    }

    /// Drop every outstanding reference at once
    ///
    /// Returns whether the subsystem was initialized and must be torn down.
    pub fn force_leave(&mut self) -> bool {
        if self.state != LifecycleState::Initialized {
            return false;
        }
        self.refs = 0;
        self.state = LifecycleState::Terminated;
        log::info!("{} terminated", self.name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_enter_then_commit() {
        let mut lifecycle = Lifecycle::new("test");
        assert_eq!(lifecycle.state(), LifecycleState::Uninitialized);
        assert_eq!(lifecycle.enter(), Enter::First);
        lifecycle.commit();
        assert!(lifecycle.is_initialized());
    }

    #[test]
    fn test_nested_enter_requires_matching_leaves() {
        let mut lifecycle = Lifecycle::new("test");
        lifecycle.enter();
        lifecycle.commit();
        assert_eq!(lifecycle.enter(), Enter::Nested);

        assert_eq!(lifecycle.leave(), Leave::Nested);
        assert!(lifecycle.is_initialized());
        assert_eq!(lifecycle.leave(), Leave::Last);
        assert_eq!(lifecycle.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_leave_without_enter_is_reported() {
        let mut lifecycle = Lifecycle::new("test");
        assert_eq!(lifecycle.leave(), Leave::NotInitialized);
    }

    #[test]
    fn test_double_terminate_is_reported() {
        let mut lifecycle = Lifecycle::new("test");
        lifecycle.enter();
        lifecycle.commit();
        assert_eq!(lifecycle.leave(), Leave::Last);
        assert_eq!(lifecycle.leave(), Leave::NotInitialized);
    }

    #[test]
    fn test_abort_allows_retry() {
        let mut lifecycle = Lifecycle::new("test");
        lifecycle.enter();
        lifecycle.abort();
        assert_eq!(lifecycle.enter(), Enter::First);
    }

    #[test]
    fn test_force_leave_ignores_reference_count() {
        let mut lifecycle = Lifecycle::new("test");
        lifecycle.enter();
        lifecycle.commit();
        lifecycle.enter();

        assert!(lifecycle.force_leave());
        assert_eq!(lifecycle.state(), LifecycleState::Terminated);
        assert!(!lifecycle.force_leave());
    }

    #[test]
    fn test_reinitialize_after_terminate() {
        let mut lifecycle = Lifecycle::new("test");
        lifecycle.enter();
        lifecycle.commit();
        lifecycle.leave();
        assert_eq!(lifecycle.enter(), Enter::First);
        lifecycle.commit();
        assert!(lifecycle.is_initialized());
    }
}
