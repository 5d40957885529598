//! Source identities and content snapshots.
//!
//! A snapshot is the cache-validity token: a cached conversion is reused only
//! when the snapshot taken for a new request is exactly equal to the one the
//! conversion was computed from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Stable key for a bytecode source unit: the path of the open file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceIdentity(PathBuf);

impl SourceIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&Path> for SourceIdentity {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<PathBuf> for SourceIdentity {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// A 128-bit XXH3 hash of editor text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// The state of a source unit at request time.
///
/// `InMemory` is preferred and describes unsaved editor text. `OnDisk` is the
/// fallback when the caller has no text and uses file metadata instead. The
/// two kinds never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentSnapshot {
    InMemory { hash: ContentHash, len: usize },
    OnDisk { modified: SystemTime, len: u64 },
}

impl ContentSnapshot {
    pub fn of_text(text: &str) -> Self {
        Self::InMemory {
            hash: ContentHash::from_bytes(text.as_bytes()),
            len: text.len(),
        }
    }

    pub fn of_metadata(metadata: &std::fs::Metadata) -> std::io::Result<Self> {
        Ok(Self::OnDisk {
            modified: metadata.modified()?,
            len: metadata.len(),
        })
    }

    /// Snapshot the file on disk.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        Self::of_metadata(&std::fs::metadata(path)?)
    }

    pub const fn is_in_memory(&self) -> bool {
        matches!(self, Self::InMemory { .. })
    }
}

impl fmt::Display for ContentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory { hash, len } => write!(f, "text:{hash}:{len}"),
            Self::OnDisk { modified, len } => {
                let modified = chrono::DateTime::<chrono::Utc>::from(*modified);
                write!(f, "disk:{}:{len}", modified.to_rfc3339())
            }
        }
    }
}
