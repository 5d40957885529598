//! Filesystem conventions for decoded Android projects.
//!
//! A decoded project keeps smali under a bytecode root named `smali` or
//! `smali_classes<N>`. Class identities, enclosing containers, and
//! precomputed Java sources are all located relative to that root:
//!
//! ```text
//! project/
//!   smali/com/example/Main.smali      <- bytecode root `smali`
//!   smali_classes2/...                <- bytecode root `smali_classes2`
//!   build/apk/classes.dex             <- container candidate
//!   dist/app.apk                      <- container candidate
//!   java_src/com/example/Main.java    <- sibling source root
//!   sources/com/example/Main.java     <- ancestor-relative source root
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::domain::models::{ClassIdentity, LayoutConfig};

const BYTECODE_ROOT: &str = "smali";
const MULTIDEX_PREFIX: &str = "smali_classes";
const SMALI_EXTENSION: &str = "smali";

/// Source directories probed relative to each ancestor of the bytecode root.
const ANCESTOR_SOURCE_DIRS: [&str; 4] = ["sources", "java_src", "jadx/sources", "src/main/java"];

/// The directory a smali file's package path is relative to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BytecodeRoot {
    pub dir: PathBuf,
    /// `None` for `smali`, `Some(n)` for `smali_classes<n>`.
    pub dex_index: Option<String>,
}

impl BytecodeRoot {
    /// Recognise a bytecode root directory name.
    pub fn parse_name(name: &str) -> Option<Option<String>> {
        if name == BYTECODE_ROOT {
            return Some(None);
        }
        let index = name.strip_prefix(MULTIDEX_PREFIX)?;
        if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
            Some(Some(index.to_string()))
        } else {
            None
        }
    }

    pub fn name(&self) -> String {
        match self.dex_index {
            Some(ref index) => format!("{MULTIDEX_PREFIX}{index}"),
            None => BYTECODE_ROOT.to_string(),
        }
    }

    /// DEX file name the root was decoded from.
    pub fn dex_name(&self) -> String {
        match self.dex_index {
            Some(ref index) => format!("classes{index}.dex"),
            None => "classes.dex".to_string(),
        }
    }

    /// Names of parallel Java source roots, in search order.
    pub fn source_root_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(4);
        if let Some(ref index) = self.dex_index {
            names.push(format!("java_src_classes{index}"));
        }
        names.extend(["java_src", "java", "src"].map(String::from));
        names
    }
}

/// Everything the resolver needs to know about where a smali file lives.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutProbe {
    pub file: PathBuf,
    pub bytecode_root: Option<BytecodeRoot>,
    /// Identity from the path convention; drives the realtime stage.
    pub path_class: Option<ClassIdentity>,
    /// Identity used by the fallback stages: path convention, else header.
    pub class: Option<ClassIdentity>,
    /// Directory the upward searches start from.
    pub anchor: Option<PathBuf>,
}

/// Project layout heuristics.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    max_ancestor_depth: usize,
}

impl ProjectLayout {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            max_ancestor_depth: config.max_ancestor_depth.max(1),
        }
    }

    /// Nearest ancestor directory named `smali` or `smali_classes<N>`.
    pub fn bytecode_root(file: &Path) -> Option<BytecodeRoot> {
        file.ancestors().skip(1).find_map(|dir| {
            let name = dir.file_name()?.to_str()?;
            BytecodeRoot::parse_name(name).map(|dex_index| BytecodeRoot {
                dir: dir.to_path_buf(),
                dex_index,
            })
        })
    }

    /// Class identity from the path relative to the bytecode root.
    ///
    /// Files outside a conventional bytecode root have no path identity.
    pub fn class_from_path(file: &Path) -> Option<ClassIdentity> {
        if file.extension().and_then(|e| e.to_str()) != Some(SMALI_EXTENSION) {
            return None;
        }
        let root = Self::bytecode_root(file)?;
        let relative = file.strip_prefix(&root.dir).ok()?.with_extension("");
        let segments = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        ClassIdentity::from_binary_name(&segments.join("/"))
    }

    /// Inspect a file's location; `text` is used for the header fallback.
    pub fn probe(&self, file: &Path, text: Option<&str>) -> LayoutProbe {
        let bytecode_root = Self::bytecode_root(file);
        let path_class = Self::class_from_path(file);
        let class = path_class
            .clone()
            .or_else(|| text.and_then(ClassIdentity::from_smali_header));
        let anchor = bytecode_root
            .as_ref()
            .and_then(|root| root.dir.parent())
            .or_else(|| file.parent())
            .map(Path::to_path_buf);

        LayoutProbe {
            file: file.to_path_buf(),
            bytecode_root,
            path_class,
            class,
            anchor,
        }
    }

    /// The anchor and its ancestors, bounded by the configured depth.
    fn search_dirs<'a>(&self, anchor: &'a Path) -> impl Iterator<Item = &'a Path> {
        anchor
            .ancestors()
            .filter(|dir| !dir.as_os_str().is_empty())
            .take(self.max_ancestor_depth)
    }

    /// Binary containers that may hold the class, in search order.
    ///
    /// Fixed-name candidates are listed whether or not they exist; APKs are
    /// discovered by listing directories.
    pub async fn container_candidates(&self, probe: &LayoutProbe) -> Vec<PathBuf> {
        let Some(ref anchor) = probe.anchor else {
            return vec![];
        };
        let dex = probe
            .bytecode_root
            .as_ref()
            .map_or_else(|| "classes.dex".to_string(), BytecodeRoot::dex_name);

        let mut candidates = Vec::new();
        for dir in self.search_dirs(anchor) {
            candidates.push(dir.join("build").join("apk").join(&dex));
            candidates.push(dir.join(&dex));
            candidates.extend(list_apks(&dir.join("dist")).await);
            candidates.extend(list_apks(dir).await);
            if let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) {
                let mut apk = name.to_os_string();
                apk.push(".apk");
                candidates.push(parent.join(apk));
            }
        }
        dedup(candidates)
    }

    /// Java files that may already hold the class source, in search order.
    pub fn precomputed_candidates(&self, probe: &LayoutProbe) -> Vec<PathBuf> {
        let (Some(class), Some(anchor)) = (&probe.class, &probe.anchor) else {
            return vec![];
        };
        let relative = class.java_relative_path();

        let mut candidates = Vec::new();
        if let Some(ref root) = probe.bytecode_root {
            if let Some(parent) = root.dir.parent() {
                for name in root.source_root_names() {
                    candidates.push(parent.join(name).join(&relative));
                }
            }
        }
        for dir in self.search_dirs(anchor) {
            for source_dir in ANCESTOR_SOURCE_DIRS {
                candidates.push(dir.join(source_dir).join(&relative));
            }
        }
        dedup(candidates)
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

/// `*.apk` files directly inside `dir`, sorted by name.
async fn list_apks(dir: &Path) -> Vec<PathBuf> {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return vec![];
    };
    let mut apks = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_apk = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("apk"));
        if is_apk && tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            apks.push(path);
        }
    }
    apks.sort();
    apks
}

fn dedup(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
