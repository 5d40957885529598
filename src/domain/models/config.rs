use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for smali2java
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Number of conversions that may run in parallel (1-16)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Scratch directory for tool output (system temp dir if unset)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Conversion cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Project layout search configuration
    #[serde(default)]
    pub layout: LayoutConfig,

    /// External tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_workers() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            work_dir: None,
            cache: CacheConfig::default(),
            layout: LayoutConfig::default(),
            tools: ToolsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Conversion cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Maximum number of cached conversions
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

const fn default_max_entries() -> u64 {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

/// Project layout search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LayoutConfig {
    /// How many directories to walk upward when looking for containers
    /// and precomputed sources
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: usize,
}

const fn default_max_ancestor_depth() -> usize {
    4
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: default_max_ancestor_depth(),
        }
    }
}

/// External tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolsConfig {
    #[serde(default)]
    pub assembler: AssemblerConfig,

    #[serde(default)]
    pub decompiler: DecompilerConfig,
}

/// smali assembler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AssemblerConfig {
    /// Path to the smali launcher
    #[serde(default = "default_assembler_binary")]
    pub binary_path: String,

    /// smali jar; when set the assembler runs as `java -jar <jar>`
    #[serde(default)]
    pub jar: Option<PathBuf>,

    /// Java launcher used with `jar`
    #[serde(default = "default_java_path")]
    pub java_path: String,

    /// Target API level passed as `--api`
    #[serde(default)]
    pub api_level: Option<u32>,

    /// Additional CLI flags
    #[serde(default)]
    pub extra_flags: Vec<String>,
}

fn default_assembler_binary() -> String {
    "smali".to_string()
}

fn default_java_path() -> String {
    "java".to_string()
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            binary_path: default_assembler_binary(),
            jar: None,
            java_path: default_java_path(),
            api_level: None,
            extra_flags: vec![],
        }
    }
}

/// jadx decompiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DecompilerConfig {
    /// Path to the jadx launcher
    #[serde(default = "default_decompiler_binary")]
    pub binary_path: String,

    /// Restrict container decompilation to the requested class
    #[serde(default)]
    pub single_class: bool,

    /// Thread count passed as `-j`
    #[serde(default)]
    pub threads: Option<u32>,

    /// Additional CLI flags
    #[serde(default)]
    pub extra_flags: Vec<String>,
}

fn default_decompiler_binary() -> String {
    "jadx".to_string()
}

impl Default for DecompilerConfig {
    fn default() -> Self {
        Self {
            binary_path: default_decompiler_binary(),
            single_class: false,
            threads: None,
            extra_flags: vec![],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for log files (stdout only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
