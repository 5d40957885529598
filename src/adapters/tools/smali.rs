//! smali assembler adapter.
//!
//! Spawns the smali CLI to assemble a single source unit into a DEX file.

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::process::{run_tool, AvailabilityProbe};
use crate::domain::errors::ConversionResult;
use crate::domain::models::AssemblerConfig;
use crate::domain::ports::{AssembleRequest, AssembleResult, Assembler, ToolStatus};

/// smali CLI assembler.
pub struct SmaliAssembler {
    config: AssemblerConfig,
    probe: AvailabilityProbe,
}

impl SmaliAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            probe: AvailabilityProbe::new(),
        }
    }

    /// Program to launch: the smali script, or java when a jar is configured.
    fn program(&self) -> &str {
        if self.config.jar.is_some() {
            &self.config.java_path
        } else {
            &self.config.binary_path
        }
    }

    /// Arguments placed before the smali subcommand.
    fn launcher_args(&self) -> Vec<String> {
        match self.config.jar {
            Some(ref jar) => vec!["-jar".to_string(), jar.display().to_string()],
            None => vec![],
        }
    }

    /// Build CLI arguments for a request.
    fn build_args(&self, request: &AssembleRequest) -> Vec<String> {
        let mut args = self.launcher_args();

        args.push("assemble".to_string());
        args.push("--output".to_string());
        args.push(request.output.display().to_string());

        if let Some(api) = self.config.api_level {
            args.push("--api".to_string());
            args.push(api.to_string());
        }

        args.extend(self.config.extra_flags.clone());
        args.push(request.source_unit.display().to_string());

        args
    }
}

#[async_trait]
impl Assembler for SmaliAssembler {
    fn name(&self) -> &'static str {
        "smali"
    }

    fn install_hint(&self) -> String {
        match self.config.jar {
            Some(ref jar) => format!(
                "smali jar {} must be runnable with '{}'",
                jar.display(),
                self.config.java_path
            ),
            None => format!(
                "install smali and make '{}' available on PATH, or set tools.assembler.jar",
                self.config.binary_path
            ),
        }
    }

    async fn is_available(&self) -> bool {
        self.probe.check(self.program(), &self.launcher_args()).await
    }

    async fn assemble(
        &self,
        request: &AssembleRequest,
        cancel: &CancellationToken,
    ) -> ConversionResult<AssembleResult> {
        let mut cmd = Command::new(self.program());
        cmd.args(self.build_args(request));

        tracing::debug!(
            class = %request.class,
            source = %request.source_unit.display(),
            "assembling source unit"
        );

        let output = run_tool(self.name(), &self.install_hint(), cmd, cancel).await?;
        let produced = tokio::fs::try_exists(&request.output).await.unwrap_or(false);

        let result = if output.success && produced {
            AssembleResult {
                status: ToolStatus::Success,
                container: Some(request.output.clone()),
                diagnostics: output.diagnostics(),
            }
        } else if output.success {
            AssembleResult {
                status: ToolStatus::Failed,
                container: None,
                diagnostics: format!(
                    "smali reported success but wrote no {}",
                    request.output.display()
                ),
            }
        } else {
            AssembleResult {
                status: ToolStatus::Failed,
                container: None,
                diagnostics: output.diagnostics(),
            }
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ClassIdentity;
    use std::path::PathBuf;

    fn request() -> AssembleRequest {
        AssembleRequest {
            source_unit: PathBuf::from("/work/Main.smali"),
            class: ClassIdentity::from_binary_name("com/example/Main").unwrap(),
            output: PathBuf::from("/work/classes.dex"),
        }
    }

    #[test]
    fn test_build_args_default() {
        let assembler = SmaliAssembler::new(AssemblerConfig::default());
        assert_eq!(assembler.program(), "smali");
        assert_eq!(
            assembler.build_args(&request()),
            vec!["assemble", "--output", "/work/classes.dex", "/work/Main.smali"]
        );
    }

    #[test]
    fn test_build_args_with_jar_and_api() {
        let assembler = SmaliAssembler::new(AssemblerConfig {
            jar: Some(PathBuf::from("/opt/smali.jar")),
            api_level: Some(26),
            extra_flags: vec!["--verbose".to_string()],
            ..AssemblerConfig::default()
        });

        assert_eq!(assembler.program(), "java");
        assert_eq!(
            assembler.build_args(&request()),
            vec![
                "-jar",
                "/opt/smali.jar",
                "assemble",
                "--output",
                "/work/classes.dex",
                "--api",
                "26",
                "--verbose",
                "/work/Main.smali",
            ]
        );
    }

    #[test]
    fn test_install_hint_names_binary() {
        let assembler = SmaliAssembler::new(AssemblerConfig {
            binary_path: "/usr/local/bin/smali".to_string(),
            ..AssemblerConfig::default()
        });
        assert!(assembler.install_hint().contains("/usr/local/bin/smali"));
    }

    #[tokio::test]
    async fn test_missing_binary_not_available() {
        let assembler = SmaliAssembler::new(AssemblerConfig {
            binary_path: "smali2java-missing-smali".to_string(),
            ..AssemblerConfig::default()
        });
        assert!(!assembler.is_available().await);
    }
}
