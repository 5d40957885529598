//! Locate command: show how a smali file maps onto the project layout.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::output::{exists_marker, output, CommandOutput};
use crate::domain::models::Config;
use crate::services::ProjectLayout;

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// smali file to inspect
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct CandidateOutput {
    pub path: String,
    pub exists: bool,
}

impl CandidateOutput {
    fn from_path(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            exists: path.is_file(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocateOutput {
    pub file: String,
    pub bytecode_root: Option<String>,
    pub class: Option<String>,
    /// "path", "header" or "none"
    pub class_source: &'static str,
    pub anchor: Option<String>,
    pub containers: Vec<CandidateOutput>,
    pub sources: Vec<CandidateOutput>,
}

impl LocateOutput {
    pub async fn build(layout: &ProjectLayout, file: &Path, text: Option<&str>) -> Self {
        let probe = layout.probe(file, text);
        let containers = layout.container_candidates(&probe).await;
        let class_source = match (&probe.path_class, &probe.class) {
            (Some(_), _) => "path",
            (None, Some(_)) => "header",
            (None, None) => "none",
        };

        Self {
            file: file.display().to_string(),
            bytecode_root: probe
                .bytecode_root
                .as_ref()
                .map(|root| root.dir.display().to_string()),
            class: probe.class.as_ref().map(|c| c.qualified_name()),
            class_source,
            anchor: probe.anchor.as_ref().map(|a| a.display().to_string()),
            containers: containers
                .iter()
                .map(|p| CandidateOutput::from_path(p))
                .collect(),
            sources: layout
                .precomputed_candidates(&probe)
                .iter()
                .map(|p| CandidateOutput::from_path(p))
                .collect(),
        }
    }
}

impl CommandOutput for LocateOutput {
    fn to_human(&self) -> String {
        let none = "-".to_string();
        let mut lines = vec![
            format!("File:          {}", self.file),
            format!(
                "Bytecode root: {}",
                self.bytecode_root.as_ref().unwrap_or(&none)
            ),
            format!(
                "Class:         {} (from {})",
                self.class.as_ref().unwrap_or(&none),
                self.class_source
            ),
            format!("Anchor:        {}", self.anchor.as_ref().unwrap_or(&none)),
            String::new(),
            "Containers:".to_string(),
        ];
        for candidate in &self.containers {
            lines.push(format!("  {} {}", exists_marker(candidate.exists), candidate.path));
        }
        lines.push(String::new());
        lines.push("Java sources:".to_string());
        for candidate in &self.sources {
            lines.push(format!("  {} {}", exists_marker(candidate.exists), candidate.path));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: LocateArgs, config: &Config, json_mode: bool) -> Result<()> {
    let text = tokio::fs::read(&args.file)
        .await
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    let layout = ProjectLayout::new(&config.layout);
    output(
        &LocateOutput::build(&layout, &args.file, text.as_deref()).await,
        json_mode,
    );
    Ok(())
}
