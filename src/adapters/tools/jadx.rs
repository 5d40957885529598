//! jadx decompiler adapter.
//!
//! Spawns the jadx CLI to turn a DEX or APK into a Java source tree. jadx
//! writes sources under `<output>/sources/`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::process::{run_tool, AvailabilityProbe};
use crate::domain::errors::ConversionResult;
use crate::domain::models::DecompilerConfig;
use crate::domain::ports::{DecompileResult, Decompiler, OutputScope, ToolStatus};

/// Subdirectory jadx writes Java sources into.
const SOURCES_DIR: &str = "sources";

/// jadx CLI decompiler.
pub struct JadxDecompiler {
    config: DecompilerConfig,
    probe: AvailabilityProbe,
}

impl JadxDecompiler {
    pub fn new(config: DecompilerConfig) -> Self {
        Self {
            config,
            probe: AvailabilityProbe::new(),
        }
    }

    /// Build CLI arguments for a request.
    fn build_args(&self, container: &Path, scope: &OutputScope) -> Vec<String> {
        let mut args = vec![
            "--no-res".to_string(),
            "-d".to_string(),
            scope.output_dir.display().to_string(),
        ];

        if self.config.single_class {
            if let Some(ref class) = scope.class_filter {
                args.push("--single-class".to_string());
                args.push(class.qualified_name());
            }
        }

        if let Some(threads) = self.config.threads {
            args.push("-j".to_string());
            args.push(threads.to_string());
        }

        args.extend(self.config.extra_flags.clone());
        args.push(container.display().to_string());

        args
    }
}

/// The generated source root if jadx wrote anything.
async fn source_tree(output_dir: &Path) -> Option<PathBuf> {
    let sources = output_dir.join(SOURCES_DIR);
    let mut entries = tokio::fs::read_dir(&sources).await.ok()?;
    match entries.next_entry().await {
        Ok(Some(_)) => Some(sources),
        _ => None,
    }
}

#[async_trait]
impl Decompiler for JadxDecompiler {
    fn name(&self) -> &'static str {
        "jadx"
    }

    fn install_hint(&self) -> String {
        format!(
            "install jadx and make '{}' available on PATH, or set tools.decompiler.binary_path",
            self.config.binary_path
        )
    }

    async fn is_available(&self) -> bool {
        self.probe.check(&self.config.binary_path, &[]).await
    }

    async fn decompile_container(
        &self,
        container: &Path,
        scope: &OutputScope,
        cancel: &CancellationToken,
    ) -> ConversionResult<DecompileResult> {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(self.build_args(container, scope));

        tracing::debug!(container = %container.display(), "decompiling container");

        let output = run_tool(self.name(), &self.install_hint(), cmd, cancel).await?;

        // jadx exits non-zero when any class fails to decompile, even if the
        // rest of the tree was written.
        let tree = source_tree(&scope.output_dir).await;
        if !output.success && tree.is_some() {
            tracing::debug!(
                container = %container.display(),
                "jadx finished with errors, using partial output"
            );
        }

        let status = if tree.is_some() {
            ToolStatus::Success
        } else {
            ToolStatus::Failed
        };

        Ok(DecompileResult {
            status,
            source_tree: tree,
            diagnostics: output.diagnostics(),
        })
    }
}
