//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Kind-partitioned resource handles
//! - Time management
//! - Logging utilities

pub mod handles;
pub mod logging;
pub mod math;
pub mod time;
