//! Convert command: run the conversion service once for a file.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ConversionUpdate, PipelineResult, Provenance, RequestTicket};
use crate::services::ConversionService;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// smali file to convert
    pub file: PathBuf,

    /// Key the conversion on the file's modification time instead of its text
    #[arg(long)]
    pub from_disk: bool,
}

#[derive(Debug, Serialize)]
pub struct ConvertOutput {
    pub file: String,
    pub status: &'static str,
    pub provenance: Option<Provenance>,
    pub origin: Option<String>,
    pub text: String,
}

impl ConvertOutput {
    fn new(file: &Path, result: &PipelineResult) -> Self {
        let converted = result.converted();
        Self {
            file: file.display().to_string(),
            status: result.status(),
            provenance: converted.map(|c| c.provenance),
            origin: converted
                .and_then(|c| c.origin.as_ref())
                .map(|origin| origin.path.display().to_string()),
            text: result.display_text(),
        }
    }
}

impl CommandOutput for ConvertOutput {
    fn to_human(&self) -> String {
        let mut out = self.text.trim_end().to_string();
        if let Some(provenance) = self.provenance {
            out.push_str(&format!("\n\n// converted by: {provenance}"));
            if let Some(ref origin) = self.origin {
                out.push_str(&format!(" ({origin})"));
            }
        }
        out
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Wait for the terminal update answering `ticket`.
async fn wait_for_result(
    updates: &mut mpsc::UnboundedReceiver<ConversionUpdate>,
    ticket: &RequestTicket,
) -> Result<PipelineResult> {
    while let Some(update) = updates.recv().await {
        if !update.matches(ticket) {
            continue;
        }
        match update {
            ConversionUpdate::Finished { result, .. } => return Ok(result),
            ConversionUpdate::Loading { .. } => {
                tracing::debug!(identity = %ticket.identity, "conversion running");
            }
            ConversionUpdate::Dismissed { .. } => {
                anyhow::bail!("conversion of {} was cancelled", ticket.identity)
            }
        }
    }
    anyhow::bail!("conversion service stopped before delivering a result")
}

pub async fn execute(args: ConvertArgs, config: &Config, json_mode: bool) -> Result<()> {
    let (service, mut updates) = ConversionService::from_config(config)?;

    let ticket = if args.from_disk {
        service.request(&args.file, None)
    } else {
        let bytes = tokio::fs::read(&args.file)
            .await
            .with_context(|| format!("Failed to read {}", args.file.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        service.request(&args.file, Some(text.as_ref()))
    };

    let result = wait_for_result(&mut updates, &ticket).await?;
    service.shutdown().await;

    output(&ConvertOutput::new(&args.file, &result), json_mode);
    Ok(())
}
