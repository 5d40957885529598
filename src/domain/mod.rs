//! Domain layer for smali2java
//!
//! This module contains the conversion models, errors, and the tool ports
//! that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{ConversionError, ConversionResult};
