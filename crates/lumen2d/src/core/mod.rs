//! # Core Engine Module
//!
//! Shared abstractions used by every façade:
//!
//! - **Config**: Unified configuration for all engine subsystems
//! - **Lifecycle**: Reference-counted initialize/terminate guard

pub mod config;
pub mod lifecycle;

pub use config::{AudioConfig, BackendConfig, EngineConfig, GraphicsConfig, LoggingConfig, WindowConfig};
pub use lifecycle::{Enter, Leave, Lifecycle, LifecycleState};
