pub mod class_identity;
pub mod config;
pub mod conversion;
pub mod snapshot;

pub use class_identity::ClassIdentity;
pub use config::{
    AssemblerConfig, CacheConfig, Config, DecompilerConfig, LayoutConfig, LoggingConfig,
    ToolsConfig,
};
pub use conversion::{
    CacheEntry, ConversionRequest, ConversionUpdate, ConvertedSource, Explanation, OriginDetails,
    PipelineResult, Provenance, RequestTicket, Stage, StageAttempt, TaskState,
};
pub use snapshot::{ContentHash, ContentSnapshot, SourceIdentity};
