//! Version manifest of the final output tree
//!
//! The deployed client polls this document to detect when a newer static
//! version is available, so it must be deterministic: entries are sorted
//! by path and the manifest never hashes itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name the manifest is written under at the output root.
pub const MANIFEST_NAME: &str = "contents.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to walk output tree")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Output-root relative path with `/` separators.
    pub path: String,
    /// Hex sha256 of the file contents.
    pub hash: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    /// Hash every file under the output root into a manifest.
    pub fn build(version: &str, root: &Path) -> Result<Self, ManifestError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf();
            if rel == Path::new(MANIFEST_NAME) {
                continue;
            }

            let bytes = std::fs::read(entry.path()).map_err(|source| ManifestError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let mut hasher = Sha256::new();
            hasher.update(&bytes);

            files.push(ManifestEntry {
                path: rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
                hash: hex::encode(hasher.finalize()),
                size: bytes.len() as u64,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self {
            version: version.to_string(),
            files,
        })
    }

    /// Write the manifest at the output root.
    pub fn write(&self, root: &Path, pretty: bool) -> Result<PathBuf, ManifestError> {
        let path = root.join(MANIFEST_NAME);
        let data = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
        .expect("manifest serialization cannot fail");

        std::fs::write(&path, data).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
