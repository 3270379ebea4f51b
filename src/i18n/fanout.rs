//! Per-locale document expansion
//!
//! Expansion is a pure function of (document, locale, table): identical
//! inputs always give byte-identical output, which manifest hashing
//! depends on. Placeholders are `__MSG_token__`. Strict mode requires
//! every token in the requested locale itself. Otherwise a token missing
//! from a locale falls back to the default-locale string, and a token
//! missing there too is left in place and logged.

use super::{FanoutError, TranslationTable, DEFAULT_LOCALE};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__MSG_([A-Za-z0-9_]+?)__").unwrap())
}

pub struct FanoutEngine<'a> {
    table: &'a TranslationTable,
    strict: bool,
}

impl<'a> FanoutEngine<'a> {
    pub fn new(table: &'a TranslationTable, strict: bool) -> Self {
        Self { table, strict }
    }

    /// Expand one document into a variant per locale.
    pub fn expand(
        &self,
        doc: &str,
        locales: &[String],
    ) -> Result<BTreeMap<String, String>, FanoutError> {
        let mut out = BTreeMap::new();
        for locale in locales {
            out.insert(locale.clone(), self.localize(doc, locale)?);
        }
        Ok(out)
    }

    /// Replace every placeholder with the locale's string.
    pub fn localize(&self, doc: &str, locale: &str) -> Result<String, FanoutError> {
        let mut out = String::with_capacity(doc.len());
        let mut last = 0;

        for caps in token_re().captures_iter(doc) {
            let whole = caps.get(0).unwrap();
            let token = &caps[1];
            out.push_str(&doc[last..whole.start()]);
            last = whole.end();

            let resolved = match self.table.lookup(token, locale) {
                Some(message) => Some(message),
                None if self.strict => {
                    return Err(FanoutError::MissingTranslation {
                        token: token.to_string(),
                        locale: locale.to_string(),
                    });
                }
                None => self.table.lookup(token, DEFAULT_LOCALE),
            };
            match resolved {
                Some(message) => out.push_str(message),
                None => {
                    warn!(token = %token, locale = %locale, "no translation, leaving placeholder");
                    out.push_str(whole.as_str());
                }
            }
        }
        out.push_str(&doc[last..]);
        Ok(out)
    }
}

/// Locale-variant file name: `page.html` becomes `page_<locale>.html`.
pub fn localized_name(path: &Path, locale: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("html");
    path.with_file_name(format!("{}_{}.{}", stem, locale, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TranslationTable {
        TranslationTable::from_map([
            (
                "en".to_string(),
                BTreeMap::from([
                    ("greeting".to_string(), "Hello".to_string()),
                    ("only_en".to_string(), "Source".to_string()),
                ]),
            ),
            (
                "fr".to_string(),
                BTreeMap::from([("greeting".to_string(), "Bonjour".to_string())]),
            ),
        ])
    }

    #[test]
    fn test_expand_per_locale() {
        let table = table();
        let engine = FanoutEngine::new(&table, false);
        let doc = "<h1>__MSG_greeting__</h1>";

        let out = engine
            .expand(doc, &["en".to_string(), "fr".to_string()])
            .unwrap();
        assert_eq!(out["en"], "<h1>Hello</h1>");
        assert_eq!(out["fr"], "<h1>Bonjour</h1>");
    }

    #[test]
    fn test_missing_locale_string_falls_back_to_default() {
        let table = table();
        let engine = FanoutEngine::new(&table, false);
        let out = engine.localize("__MSG_only_en__", "fr").unwrap();
        assert_eq!(out, "Source");
    }

    #[test]
    fn test_strict_mode_fails_on_missing_token() {
        let table = table();
        let engine = FanoutEngine::new(&table, true);
        let err = engine.localize("__MSG_ghost__", "fr").unwrap_err();
        match err {
            FanoutError::MissingTranslation { token, locale } => {
                assert_eq!(token, "ghost");
                assert_eq!(locale, "fr");
            }
            other => panic!("expected missing translation, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_mode_rejects_default_locale_fallback() {
        let table = table();
        let engine = FanoutEngine::new(&table, true);

        // `only_en` has a source string, but strict means translated
        // everywhere, not just translatable.
        let err = engine.localize("__MSG_only_en__", "fr").unwrap_err();
        match err {
            FanoutError::MissingTranslation { token, locale } => {
                assert_eq!(token, "only_en");
                assert_eq!(locale, "fr");
            }
            other => panic!("expected missing translation, got {other:?}"),
        }

        // The default locale itself still passes.
        assert_eq!(engine.localize("__MSG_only_en__", "en").unwrap(), "Source");
    }

    #[test]
    fn test_lenient_mode_keeps_unknown_placeholder() {
        let table = table();
        let engine = FanoutEngine::new(&table, false);
        let out = engine.localize("a __MSG_ghost__ b", "fr").unwrap();
        assert_eq!(out, "a __MSG_ghost__ b");
    }

    #[test]
    fn test_expansion_is_pure() {
        let table = table();
        let engine = FanoutEngine::new(&table, false);
        let doc = "<p>__MSG_greeting__ and __MSG_only_en__</p>";

        let first = engine.localize(doc, "fr").unwrap();
        let second = engine.localize(doc, "fr").unwrap();
        assert_eq!(first, second);
        assert!(!first.contains("__MSG_"));
    }

    #[test]
    fn test_localized_name() {
        assert_eq!(
            localized_name(Path::new("scenes/a/a-scene.html"), "fr"),
            PathBuf::from("scenes/a/a-scene_fr.html")
        );
        assert_eq!(
            localized_name(Path::new("elements/shared_bundle_1.html"), "en"),
            PathBuf::from("elements/shared_bundle_1_en.html")
        );
    }
}
