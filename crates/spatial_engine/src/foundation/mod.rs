//! Foundation module - Core utilities and types
//!
//! - Math types and camera helpers
//! - Logging setup

pub mod logging;
pub mod math;
