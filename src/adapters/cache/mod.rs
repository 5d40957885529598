//! In-memory caching layer for conversions.
//!
//! Uses `moka` for bounded concurrent caching. Entries live for the session
//! and are never persisted.

pub mod conversion_cache;

pub use conversion_cache::ConversionCache;
