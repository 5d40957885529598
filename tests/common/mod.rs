//! Common test utilities for integration tests
//!
//! Provides decoded-project fixtures, service builders, and helpers for
//! reading the update channel with a timeout.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use smali2java::domain::ports::{Assembler, Decompiler};
use smali2java::{
    Config, ConversionService, ConversionUpdate, PipelineResult, RequestTicket, ToolRegistry,
};

pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Smali text for `com.example.Main`.
pub const MAIN_SMALI: &str = "\
.class public Lcom/example/Main;
.super Ljava/lang/Object;
.source \"Main.java\"
";

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A decoded project laid out under a temp dir:
/// `<tmp>/app/smali/...`.
pub struct Project {
    _dir: TempDir,
    pub root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = temp_dir();
        let root = dir.path().join("app");
        std::fs::create_dir_all(root.join("smali")).expect("Failed to create smali root");
        Self { _dir: dir, root }
    }

    /// Write `text` at `rel` under the project root, returning the path.
    pub fn write(&self, rel: impl AsRef<Path>, text: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, text).expect("Failed to write fixture file");
        path
    }

    /// Write `com/example/Main.smali` under the `smali` root.
    pub fn main_smali(&self) -> PathBuf {
        self.write("smali/com/example/Main.smali", MAIN_SMALI)
    }
}

/// Build a service on the current runtime with the given tools.
pub fn service_with(
    config: &Config,
    assembler: Arc<dyn Assembler>,
    decompiler: Arc<dyn Decompiler>,
) -> (ConversionService, UnboundedReceiver<ConversionUpdate>) {
    ConversionService::new(config, ToolRegistry::with_tools(assembler, decompiler))
        .expect("service should build inside a runtime")
}

/// Next update, failing the test after [`UPDATE_TIMEOUT`].
pub async fn next_update(updates: &mut UnboundedReceiver<ConversionUpdate>) -> ConversionUpdate {
    tokio::time::timeout(UPDATE_TIMEOUT, updates.recv())
        .await
        .expect("timed out waiting for a conversion update")
        .expect("update channel closed")
}

/// Terminal result answering `ticket`, skipping unrelated updates.
pub async fn result_for(
    updates: &mut UnboundedReceiver<ConversionUpdate>,
    ticket: &RequestTicket,
) -> PipelineResult {
    loop {
        let update = next_update(updates).await;
        if !update.matches(ticket) {
            continue;
        }
        if let ConversionUpdate::Finished { result, .. } = update {
            return result;
        }
    }
}

/// Collect every update that arrives within `window`.
pub async fn drain_for(
    updates: &mut UnboundedReceiver<ConversionUpdate>,
    window: Duration,
) -> Vec<ConversionUpdate> {
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Some(update)) = tokio::time::timeout_at(deadline, updates.recv()).await {
        seen.push(update);
    }
    seen
}

pub fn finished_count(updates: &[ConversionUpdate]) -> usize {
    updates
        .iter()
        .filter(|u| matches!(u, ConversionUpdate::Finished { .. }))
        .count()
}
