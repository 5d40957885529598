//! Adapters for external tools and in-memory storage.

pub mod cache;
pub mod tools;
