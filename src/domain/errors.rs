//! Domain errors for the conversion pipeline.

use thiserror::Error;

/// Errors a single pipeline stage or tool invocation can end with.
///
/// None of these cross the service boundary: the resolver records them per
/// stage and falls through, and only the terminal outcome reaches the UI as
/// a [`PipelineResult`](crate::domain::models::PipelineResult) value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("{tool} is not available: {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("Assembler failed: {0}")]
    AssembleFailed(String),

    #[error("Decompiler failed: {0}")]
    DecompileFailed(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ConversionError {
    /// Whether this failure is outside the documented tool contract.
    ///
    /// The terminal outcome is `Failed` rather than `NotFound` when any stage
    /// ended with one of these.
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn tool_unavailable(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::ToolUnavailable {
            tool: tool.into(),
            hint: hint.into(),
        }
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::Unexpected(err.to_string())
    }
}
