//! Infrastructure layer module
//!
//! Configuration loading and logging setup. Tool adapters live in
//! `adapters`.

pub mod config;
pub mod logging;
