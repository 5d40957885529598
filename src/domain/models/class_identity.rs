//! Class identities derived from smali sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The internal binary name of a class, e.g. `com/example/Main$Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassIdentity {
    binary_name: String,
}

impl ClassIdentity {
    /// Build from a `/`-separated binary name.
    ///
    /// Returns `None` for empty names and names with empty segments.
    pub fn from_binary_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || name.split('/').any(str::is_empty) {
            return None;
        }
        Some(Self {
            binary_name: name.to_string(),
        })
    }

    /// Build from a type descriptor such as `Lcom/example/Main;`.
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let inner = descriptor.strip_prefix('L')?.strip_suffix(';')?;
        Self::from_binary_name(inner)
    }

    /// Read the `.class` directive of a smali source.
    ///
    /// ```text
    /// .class public final Lcom/example/Main;
    /// ```
    pub fn from_smali_header(text: &str) -> Option<Self> {
        text.lines()
            .map(str::trim)
            .find(|line| line.split_whitespace().next() == Some(".class"))
            .and_then(|line| line.split_whitespace().last())
            .and_then(Self::from_descriptor)
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Dotted fully-qualified name, e.g. `com.example.Main$Inner`.
    pub fn qualified_name(&self) -> String {
        self.binary_name.replace('/', ".")
    }

    /// Binary name of the enclosing top-level class.
    pub fn top_level(&self) -> &str {
        let (package, simple) = self.split();
        let simple_len = simple.find('$').unwrap_or(simple.len());
        let end = package.map_or(0, |p| p.len() + 1) + simple_len;
        &self.binary_name[..end]
    }

    /// Simple name of the top-level class, e.g. `Main`.
    pub fn simple_name(&self) -> &str {
        let top = self.top_level();
        top.rsplit('/').next().unwrap_or(top)
    }

    /// Package in dotted form; empty for the default package.
    pub fn package(&self) -> String {
        self.split().0.map(|p| p.replace('/', ".")).unwrap_or_default()
    }

    /// Relative path of the Java file holding this class.
    ///
    /// Inner classes map to the file of their top-level class.
    pub fn java_relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.top_level().split('/').collect();
        path.set_extension("java");
        path
    }

    /// Relative path of the smali file for this class.
    pub fn smali_relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.binary_name.split('/').collect();
        path.set_extension("smali");
        path
    }

    fn split(&self) -> (Option<&str>, &str) {
        match self.binary_name.rsplit_once('/') {
            Some((package, simple)) => (Some(package), simple),
            None => (None, &self.binary_name),
        }
    }
}

impl fmt::Display for ClassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
