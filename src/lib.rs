//! smali2java - on-demand Java view of smali sources
//!
//! Converts one smali class at a time into Java text for display next to
//! the smali editor. Each request runs a fallback pipeline:
//!
//! 1. assemble the single unit and decompile it,
//! 2. decompile an enclosing DEX/APK found on disk,
//! 3. read an existing Java file from a conventional source tree.
//!
//! Successful conversions are cached per file and content snapshot. Work runs
//! on a bounded worker pool with at most one task per file; a newer request
//! for the same file cancels the older one, and stale results are dropped.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the tool ports
//! - **Adapters** (`adapters`): smali/jadx process adapters, mocks, the cache
//! - **Service Layer** (`services`): layout heuristics, resolver, scheduler
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use smali2java::{ConversionService, ConversionUpdate, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let (service, mut updates) = ConversionService::from_config(&config)?;
//!     let ticket = service.request("app/smali/com/example/Main.smali", None);
//!     while let Some(update) = updates.recv().await {
//!         if let ConversionUpdate::Finished { result, .. } = update {
//!             println!("{}", result.display_text());
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::cache::ConversionCache;
pub use adapters::tools::{JadxDecompiler, SmaliAssembler, ToolRegistry};
pub use domain::models::{
    ClassIdentity, Config, ContentSnapshot, ConversionUpdate, ConvertedSource, Explanation,
    LoggingConfig, PipelineResult, Provenance, RequestTicket, SourceIdentity, TaskState,
};
pub use domain::ports::{Assembler, Decompiler};
pub use domain::{ConversionError, ConversionResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::LoggerImpl;
pub use services::{ConversionScheduler, ConversionService, PipelineResolver, ProjectLayout};
