//! Locale fanout
//!
//! The translation datastore itself is an external collaborator; this
//! module only consumes its lookup contract. Tables are one JSON file per
//! locale under `_messages/`, in the `{"token": {"message": "..."}}`
//! shape, loaded once before fanout begins.

pub mod fanout;

pub use fanout::{localized_name, FanoutEngine};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Locale whose strings are the fallback source text.
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("missing translation '{token}' for locale '{locale}'")]
    MissingTranslation { token: String, locale: String },

    #[error("failed to read translation table {path}")]
    TableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed translation table {path}")]
    TableParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    message: String,
}

/// Preloaded translation strings for every supported locale.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    locales: BTreeMap<String, BTreeMap<String, String>>,
}

impl TranslationTable {
    /// Load every `<locale>.json` under the messages directory. A missing
    /// directory yields an empty table: the build then fans out to the
    /// default locale only.
    pub fn load(messages_dir: &Path) -> Result<Self, FanoutError> {
        let mut table = Self::default();
        if !messages_dir.is_dir() {
            debug!(dir = %messages_dir.display(), "no messages directory, default locale only");
            return Ok(table);
        }

        let entries = std::fs::read_dir(messages_dir).map_err(|source| FanoutError::TableIo {
            path: messages_dir.to_path_buf(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = std::fs::read_to_string(&path).map_err(|source| FanoutError::TableIo {
                path: path.clone(),
                source,
            })?;
            let messages: BTreeMap<String, MessageEntry> = serde_json::from_str(&raw)
                .map_err(|source| FanoutError::TableParse {
                    path: path.clone(),
                    source,
                })?;

            table.locales.insert(
                locale.to_string(),
                messages
                    .into_iter()
                    .map(|(token, entry)| (token, entry.message))
                    .collect(),
            );
        }
        Ok(table)
    }

    /// Build a table directly. Intended for tests.
    pub fn from_map(
        locales: impl IntoIterator<Item = (String, BTreeMap<String, String>)>,
    ) -> Self {
        Self {
            locales: locales.into_iter().collect(),
        }
    }

    /// Every supported locale, default locale always included, sorted.
    pub fn locales(&self) -> Vec<String> {
        let mut out: Vec<String> = self.locales.keys().cloned().collect();
        if !self.locales.contains_key(DEFAULT_LOCALE) {
            out.push(DEFAULT_LOCALE.to_string());
            out.sort();
        }
        out
    }

    pub fn lookup(&self, token: &str, locale: &str) -> Option<&str> {
        self.locales
            .get(locale)
            .and_then(|messages| messages.get(token))
            .map(|s| s.as_str())
    }
}
