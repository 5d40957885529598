//! Tool registry and factory.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::models::ToolsConfig;
use crate::domain::ports::{Assembler, Decompiler};

use super::jadx::JadxDecompiler;
use super::mock::{MockAssembler, MockDecompiler};
use super::smali::SmaliAssembler;

/// Availability report for one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolAvailability {
    pub role: &'static str,
    pub name: &'static str,
    pub available: bool,
    pub hint: String,
}

/// Holds the assembler and decompiler the pipeline runs with.
#[derive(Clone)]
pub struct ToolRegistry {
    assembler: Arc<dyn Assembler>,
    decompiler: Arc<dyn Decompiler>,
}

impl ToolRegistry {
    /// Build the CLI-backed tools from configuration.
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            assembler: Arc::new(SmaliAssembler::new(config.assembler.clone())),
            decompiler: Arc::new(JadxDecompiler::new(config.decompiler.clone())),
        }
    }

    pub fn with_tools(assembler: Arc<dyn Assembler>, decompiler: Arc<dyn Decompiler>) -> Self {
        Self {
            assembler,
            decompiler,
        }
    }

    /// Mock tools for testing.
    pub fn mock() -> Self {
        Self::with_tools(Arc::new(MockAssembler::new()), Arc::new(MockDecompiler::new()))
    }

    pub fn assembler(&self) -> Arc<dyn Assembler> {
        Arc::clone(&self.assembler)
    }

    pub fn decompiler(&self) -> Arc<dyn Decompiler> {
        Arc::clone(&self.decompiler)
    }

    /// Probe both tools.
    pub async fn probe(&self) -> Vec<ToolAvailability> {
        vec![
            ToolAvailability {
                role: "assembler",
                name: self.assembler.name(),
                available: self.assembler.is_available().await,
                hint: self.assembler.install_hint(),
            },
            ToolAvailability {
                role: "decompiler",
                name: self.decompiler.name(),
                available: self.decompiler.is_available().await,
                hint: self.decompiler.install_hint(),
            },
        ]
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}
