//! Conversion service: the entry point the UI talks to.
//!
//! Wires configuration, tools, cache, resolver and scheduler together and
//! turns file paths and editor text into scheduled requests.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::conversion_scheduler::ConversionScheduler;
use super::pipeline_resolver::PipelineResolver;
use super::project_layout::ProjectLayout;
use crate::adapters::cache::ConversionCache;
use crate::adapters::tools::ToolRegistry;
use crate::domain::models::{
    Config, ContentSnapshot, ConversionUpdate, ConvertedSource, Explanation, RequestTicket,
    SourceIdentity, TaskState,
};

pub struct ConversionService {
    scheduler: ConversionScheduler,
    tools: ToolRegistry,
    layout: ProjectLayout,
}

impl ConversionService {
    /// Build the service on the current tokio runtime.
    pub fn new(
        config: &Config,
        tools: ToolRegistry,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ConversionUpdate>)> {
        let runtime =
            Handle::try_current().context("conversion service requires a tokio runtime")?;
        Ok(Self::with_runtime(config, tools, runtime))
    }

    /// Build the service with tools taken from `config`.
    pub fn from_config(config: &Config) -> Result<(Self, mpsc::UnboundedReceiver<ConversionUpdate>)> {
        Self::new(config, ToolRegistry::from_config(&config.tools))
    }

    /// Build the service on an explicit runtime, for callers outside one.
    pub fn with_runtime(
        config: &Config,
        tools: ToolRegistry,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<ConversionUpdate>) {
        let layout = ProjectLayout::new(&config.layout);
        let resolver = Arc::new(
            PipelineResolver::new(tools.assembler(), tools.decompiler(), layout.clone())
                .with_work_dir(config.work_dir.clone()),
        );
        let cache = ConversionCache::with_capacity(config.cache.max_entries);
        let (scheduler, updates) =
            ConversionScheduler::new(resolver, cache, config.max_workers, runtime);

        tracing::debug!(
            max_workers = config.max_workers,
            cache_entries = config.cache.max_entries,
            "conversion service ready"
        );

        (
            Self {
                scheduler,
                tools,
                layout,
            },
            updates,
        )
    }

    /// Request the Java view of `source_file`.
    ///
    /// With `editor_text` the in-memory buffer is converted; otherwise the
    /// file on disk is, keyed by its modification time and length.
    pub fn request(&self, source_file: impl AsRef<Path>, editor_text: Option<&str>) -> RequestTicket {
        let path = source_file.as_ref();
        let identity = SourceIdentity::from(path);

        let (snapshot, text) = match editor_text {
            Some(text) => (ContentSnapshot::of_text(text), Some(Arc::from(text))),
            None => match ContentSnapshot::of_file(path) {
                Ok(snapshot) => (snapshot, None),
                Err(error) => {
                    let explanation = Explanation {
                        summary: format!("Unable to read {}: {error}", path.display()),
                        hints: vec!["check that the file exists and is readable".to_string()],
                        ..Explanation::default()
                    };
                    return self.scheduler.deliver_failure(identity, explanation);
                }
            },
        };

        self.scheduler.request(identity, snapshot, text)
    }

    pub fn cancel(&self, source_file: impl AsRef<Path>) -> bool {
        self.scheduler.cancel(&SourceIdentity::from(source_file.as_ref()))
    }

    /// Forget everything about a file whose tab was closed.
    pub fn on_tab_closed(&self, source_file: impl AsRef<Path>) {
        self.scheduler.evict(&SourceIdentity::from(source_file.as_ref()));
    }

    pub fn lookup(
        &self,
        source_file: impl AsRef<Path>,
        snapshot: &ContentSnapshot,
    ) -> Option<ConvertedSource> {
        self.scheduler
            .cache()
            .lookup(&SourceIdentity::from(source_file.as_ref()), snapshot)
    }

    pub fn state(&self, source_file: impl AsRef<Path>) -> TaskState {
        self.scheduler.state(&SourceIdentity::from(source_file.as_ref()))
    }

    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    pub fn cache(&self) -> &ConversionCache {
        self.scheduler.cache()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
