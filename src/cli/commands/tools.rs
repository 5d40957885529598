//! Tools command: report external tool availability.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::adapters::tools::{ToolAvailability, ToolRegistry};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ToolsArgs {}

#[derive(Debug, Serialize)]
pub struct ToolsOutput {
    pub tools: Vec<ToolAvailability>,
}

impl CommandOutput for ToolsOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("{:<12} {:<20} {}", "ROLE", "TOOL", "STATUS")];
        lines.push("-".repeat(48));
        for tool in &self.tools {
            let status = if tool.available {
                "available".to_string()
            } else {
                format!("missing: {}", tool.hint)
            };
            lines.push(format!("{:<12} {:<20} {}", tool.role, tool.name, status));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(_args: ToolsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let registry = ToolRegistry::from_config(&config.tools);
    output(
        &ToolsOutput {
            tools: registry.probe().await,
        },
        json_mode,
    );
    Ok(())
}
