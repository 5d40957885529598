//! Mock tools for testing.
//!
//! `MockAssembler` "assembles" by copying the smali text into the output
//! container. `MockDecompiler` reads the `.class` directive back out of the
//! container and writes a Java stub for it, plus any fixed outputs.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{ConversionError, ConversionResult};
use crate::domain::models::ClassIdentity;
use crate::domain::ports::{
    AssembleRequest, AssembleResult, Assembler, DecompileResult, Decompiler, OutputScope,
    ToolStatus,
};

/// Sleep for `delay`, returning early with `Cancelled` if `cancel` fires.
async fn simulate_work(delay: Duration, cancel: &CancellationToken) -> ConversionResult<()> {
    if cancel.is_cancelled() {
        return Err(ConversionError::Cancelled);
    }
    tokio::select! {
        () = cancel.cancelled() => Err(ConversionError::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Java stub the mock decompiler writes for a class.
pub fn stub_source(class: &ClassIdentity) -> String {
    let package = class.package();
    let mut text = String::new();
    if !package.is_empty() {
        text.push_str(&format!("package {package};\n\n"));
    }
    text.push_str(&format!("public class {} {{\n}}\n", class.simple_name()));
    text
}

/// Mock assembler.
#[derive(Debug, Default)]
pub struct MockAssembler {
    unavailable: bool,
    failure: Option<String>,
    panic_message: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    cancelled: AtomicUsize,
}

impl MockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// An assembler that reports itself missing.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// An assembler whose invocations exit with an error.
    pub fn failing(diagnostics: impl Into<String>) -> Self {
        Self {
            failure: Some(diagnostics.into()),
            ..Self::default()
        }
    }

    /// An assembler that panics when invoked.
    pub fn panicking(message: impl Into<String>) -> Self {
        Self {
            panic_message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `assemble` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `assemble` invocations that stopped on cancellation.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Assembler for MockAssembler {
    fn name(&self) -> &'static str {
        "mock-assembler"
    }

    fn install_hint(&self) -> String {
        "mock assembler disabled".to_string()
    }

    async fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn assemble(
        &self,
        request: &AssembleRequest,
        cancel: &CancellationToken,
    ) -> ConversionResult<AssembleResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ConversionError::tool_unavailable(self.name(), self.install_hint()));
        }
        if let Some(ref message) = self.panic_message {
            panic!("{message}");
        }

        if let Err(error) = simulate_work(self.delay, cancel).await {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
            return Err(error);
        }

        if let Some(ref diagnostics) = self.failure {
            return Ok(AssembleResult {
                status: ToolStatus::Failed,
                container: None,
                diagnostics: diagnostics.clone(),
            });
        }

        tokio::fs::copy(&request.source_unit, &request.output).await?;

        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        Ok(AssembleResult {
            status: ToolStatus::Success,
            container: Some(request.output.clone()),
            diagnostics: String::new(),
        })
    }
}

/// Mock decompiler.
#[derive(Debug, Default)]
pub struct MockDecompiler {
    unavailable: bool,
    failure: Option<String>,
    delay: Duration,
    fixed_outputs: Vec<(ClassIdentity, String)>,
    calls: AtomicUsize,
}

impl MockDecompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decompiler that reports itself missing.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// A decompiler whose invocations exit with an error.
    pub fn failing(diagnostics: impl Into<String>) -> Self {
        Self {
            failure: Some(diagnostics.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Always write `text` as the source of `class`.
    #[must_use]
    pub fn with_output(mut self, class: ClassIdentity, text: impl Into<String>) -> Self {
        self.fixed_outputs.push((class, text.into()));
        self
    }

    /// Number of `decompile_container` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn write_source(root: &Path, class: &ClassIdentity, text: &str) -> ConversionResult<()> {
        let path = root.join(class.java_relative_path());
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, text).await?;
        Ok(())
    }
}

#[async_trait]
impl Decompiler for MockDecompiler {
    fn name(&self) -> &'static str {
        "mock-decompiler"
    }

    fn install_hint(&self) -> String {
        "mock decompiler disabled".to_string()
    }

    async fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn decompile_container(
        &self,
        container: &Path,
        scope: &OutputScope,
        cancel: &CancellationToken,
    ) -> ConversionResult<DecompileResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ConversionError::tool_unavailable(self.name(), self.install_hint()));
        }

        simulate_work(self.delay, cancel).await?;

        if let Some(ref diagnostics) = self.failure {
            return Ok(DecompileResult {
                status: ToolStatus::Failed,
                source_tree: None,
                diagnostics: diagnostics.clone(),
            });
        }

        let root = scope.output_dir.join("sources");
        tokio::fs::create_dir_all(&root).await?;

        for (class, text) in &self.fixed_outputs {
            Self::write_source(&root, class, text).await?;
        }

        let contents = tokio::fs::read(container).await?;
        let derived = ClassIdentity::from_smali_header(&String::from_utf8_lossy(&contents))
            .or_else(|| scope.class_filter.clone());
        if let Some(class) = derived {
            let already_written = self.fixed_outputs.iter().any(|(c, _)| c.top_level() == class.top_level());
            if !already_written {
                Self::write_source(&root, &class, &stub_source(&class)).await?;
            }
        }

        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        Ok(DecompileResult {
            status: ToolStatus::Success,
            source_tree: Some(root),
            diagnostics: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_round_trip_through_mocks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Main.smali");
        std::fs::write(&source, ".class public Lcom/example/Main;\n").unwrap();

        let class = ClassIdentity::from_binary_name("com/example/Main").unwrap();
        let cancel = CancellationToken::new();
        let assembler = MockAssembler::new();
        let assembled = assembler
            .assemble(
                &AssembleRequest {
                    source_unit: source,
                    class: class.clone(),
                    output: dir.path().join("classes.dex"),
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(assembled.status, ToolStatus::Success);

        let decompiler = MockDecompiler::new();
        let decompiled = decompiler
            .decompile_container(
                &assembled.container.unwrap(),
                &OutputScope {
                    output_dir: dir.path().join("out"),
                    class_filter: None,
                },
                &cancel,
            )
            .await
            .unwrap();

        let tree: PathBuf = decompiled.source_tree.unwrap();
        let text = std::fs::read_to_string(tree.join("com/example/Main.java")).unwrap();
        assert_eq!(text, stub_source(&class));
        assert_eq!(assembler.calls(), 1);
        assert_eq!(decompiler.calls(), 1);
    }

    #[tokio::test]
    async fn test_delay_observes_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = simulate_work(Duration::from_secs(60), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_stub_source() {
        let class = ClassIdentity::from_binary_name("com/example/Main$Inner").unwrap();
        assert_eq!(
            stub_source(&class),
            "package com.example;\n\npublic class Main {\n}\n"
        );
    }
}
