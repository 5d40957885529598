//! Tool ports - interfaces for the external assembler and decompiler.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::domain::errors::ConversionResult;
use crate::domain::models::ClassIdentity;

/// Exit status of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Failed,
}

/// Input for assembling one smali source unit.
#[derive(Debug, Clone)]
pub struct AssembleRequest {
    /// The smali file to assemble.
    pub source_unit: PathBuf,
    /// Class the unit is expected to define.
    pub class: ClassIdentity,
    /// Where the DEX container should be written.
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AssembleResult {
    pub status: ToolStatus,
    /// Set on success.
    pub container: Option<PathBuf>,
    /// Captured tool output.
    pub diagnostics: String,
}

/// Where and how much a decompiler should write.
#[derive(Debug, Clone)]
pub struct OutputScope {
    pub output_dir: PathBuf,
    /// Restrict output to this class when the decompiler supports it.
    pub class_filter: Option<ClassIdentity>,
}

#[derive(Debug, Clone)]
pub struct DecompileResult {
    pub status: ToolStatus,
    /// Root of the generated Java tree; set on success.
    pub source_tree: Option<PathBuf>,
    /// Captured tool output.
    pub diagnostics: String,
}

/// Turns smali source units into a binary container.
///
/// Implementations check `cancel` before spawning and after the tool exits,
/// and do not retry; retry policy belongs to the pipeline. A non-zero exit is
/// reported as `ToolStatus::Failed`, not as an error. `Err` is reserved for
/// cancellation and for tools that cannot be started.
#[async_trait]
pub trait Assembler: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &'static str;

    /// Hint shown to the user when the tool is missing.
    fn install_hint(&self) -> String;

    /// Check if the tool can be invoked.
    async fn is_available(&self) -> bool;

    async fn assemble(
        &self,
        request: &AssembleRequest,
        cancel: &CancellationToken,
    ) -> ConversionResult<AssembleResult>;
}

/// Turns a binary container into Java sources.
#[async_trait]
pub trait Decompiler: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &'static str;

    /// Hint shown to the user when the tool is missing.
    fn install_hint(&self) -> String;

    /// Check if the tool can be invoked.
    async fn is_available(&self) -> bool;

    async fn decompile_container(
        &self,
        container: &Path,
        scope: &OutputScope,
        cancel: &CancellationToken,
    ) -> ConversionResult<DecompileResult>;
}
