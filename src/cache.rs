//! Compile target cache invalidation
//!
//! Recompilation must trigger on two independent signals: source edits
//! (caught by the cheap mtime comparison against the output file) and
//! configuration edits such as toggling the optimization level (invisible
//! to mtimes, caught by a fingerprint of the compiler configuration
//! persisted per target). A marker that is missing or unreadable counts as
//! stale: over-building is always safe, under-building never is.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheMarker {
    fingerprint: String,
}

/// Tracks per-target build freshness through on-disk marker files.
///
/// Each target owns its marker exclusively (keyed by target id), so
/// concurrent compiles need no locking.
#[derive(Debug, Clone)]
pub struct CacheTracker {
    cache_dir: PathBuf,
}

impl CacheTracker {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Stable fingerprint of everything that affects compiler output apart
    /// from the source file contents: sha256 over the canonical JSON
    /// serialization of the configuration value.
    pub fn fingerprint<T: Serialize>(config: &T) -> String {
        let bytes = serde_json::to_vec(config).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    fn marker_path(&self, target_id: &str) -> PathBuf {
        let safe_name: String = target_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            })
            .collect();
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    /// Whether the target needs rebuilding. Fresh means: the output file
    /// exists, it is no older than any declared input, and the recorded
    /// configuration fingerprint matches.
    pub fn is_stale(
        &self,
        target_id: &str,
        fingerprint: &str,
        output: &Path,
        inputs: &[PathBuf],
    ) -> bool {
        let output_mtime = match mtime(output) {
            Some(t) => t,
            None => {
                debug!(target = %target_id, "output missing, target stale");
                return true;
            }
        };

        for input in inputs {
            match mtime(input) {
                Some(t) if t > output_mtime => {
                    debug!(target = %target_id, input = %input.display(), "input newer than output");
                    return true;
                }
                Some(_) => {}
                None => {
                    debug!(target = %target_id, input = %input.display(), "input missing, target stale");
                    return true;
                }
            }
        }

        let marker_path = self.marker_path(target_id);
        let raw = match fs::read_to_string(&marker_path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!(target = %target_id, "no cache marker, target stale");
                return true;
            }
        };

        let marker: CacheMarker = match serde_json::from_str(&raw) {
            Ok(m) => m,
            Err(err) => {
                // Corrupt store: drop it and rebuild.
                warn!(target = %target_id, error = %err, "corrupt cache marker, rebuilding");
                let _ = fs::remove_file(&marker_path);
                return true;
            }
        };

        if marker.fingerprint != fingerprint {
            debug!(target = %target_id, "compiler configuration changed");
            return true;
        }

        false
    }

    /// Persist the fingerprint for a target after a successful build,
    /// overwriting any prior value.
    pub fn record(&self, target_id: &str, fingerprint: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let marker = CacheMarker {
            fingerprint: fingerprint.to_string(),
        };
        let data = serde_json::to_string(&marker).expect("marker serialization cannot fail");
        fs::write(self.marker_path(target_id), data)
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
