//! Fanout phase: write one localized variant of every page per locale
//!
//! Only localized variants exist on disk, so import links between output
//! documents are rewritten to the matching locale's file name. Scenes
//! whose catalog entry opts out of fanout (text-free games) get a
//! default-locale variant only, so every page name stays uniform; links
//! into such scenes always take the default locale's name.

use crate::i18n::{localized_name, FanoutEngine, TranslationTable, DEFAULT_LOCALE};
use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct FanoutPhase;

#[async_trait]
impl WorkflowPhase for FanoutPhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let table = TranslationTable::load(&context.layout.messages_dir())
            .context("Failed to load translation tables")?;
        let engine = FanoutEngine::new(&table, context.config.strict_i18n);

        let all_locales = table.locales();
        let default_only = vec![DEFAULT_LOCALE.to_string()];
        let fanout_scenes = context.catalog.fanout_scenes();
        let output_dir = context.output_dir();

        let catalog = &context.catalog;
        let fans_out = |path: &Path| match scene_of(path) {
            Some(id) if catalog.get(id).is_some() && !fanout_scenes.contains(id) => false,
            _ => true,
        };

        let document_names: Vec<(String, bool)> = context
            .documents
            .keys()
            .filter_map(|p| {
                let name = p.file_name().and_then(|n| n.to_str())?;
                Some((name.to_string(), fans_out(p)))
            })
            .collect();

        for (path, html) in &context.documents {
            let locales = if fans_out(path) {
                &all_locales
            } else {
                &default_only
            };

            let expanded = engine
                .expand(html, locales)
                .with_context(|| format!("Failed to localize {}", path.display()))?;
            for (locale, content) in expanded {
                let content = localize_links(&content, &document_names, &locale);
                let out = output_dir.join(localized_name(path, &locale));
                if let Some(parent) = out.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                fs::write(&out, content)
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                context.written_pages.push(out);
            }
        }

        info!(
            locales = all_locales.len(),
            pages = context.written_pages.len(),
            "Fanout complete"
        );
        Ok(())
    }
}

/// Point hrefs between output documents at the variant for this locale.
/// Link hrefs end with the target's file name directly before the closing
/// quote, so suffixing there is unambiguous. Documents that do not fan out
/// exist only under the default locale's name.
fn localize_links(html: &str, document_names: &[(String, bool)], locale: &str) -> String {
    let mut out = html.to_string();
    for (name, fans_out) in document_names {
        let Some(stem) = name.strip_suffix(".html") else {
            continue;
        };
        let target = if *fans_out { locale } else { DEFAULT_LOCALE };
        out = out.replace(
            &format!("{}\"", name),
            &format!("{}_{}.html\"", stem, target),
        );
    }
    out
}

/// Scene id a site-relative page path belongs to, if any.
fn scene_of(path: &Path) -> Option<&str> {
    let mut components = path.components();
    if components.next()?.as_os_str() != "scenes" {
        return None;
    }
    components.next()?.as_os_str().to_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SceneCatalog, SceneConfig};
    use crate::compiler::MockCompiler;
    use crate::config::{BuildConfig, SiteLayout};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(dir: &TempDir, catalog: SceneCatalog) -> BuildContext {
        BuildContext::new(
            catalog,
            BuildConfig::default().with_version("v1"),
            SiteLayout::new(dir.path()),
            Arc::new(MockCompiler::new()),
        )
    }

    fn messages(dir: &TempDir) {
        fs::create_dir_all(dir.path().join("_messages")).unwrap();
        fs::write(
            dir.path().join("_messages/en.json"),
            r#"{"hi": {"message": "Hello"}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("_messages/fr.json"),
            r#"{"hi": {"message": "Bonjour"}}"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_fanout_writes_variant_per_locale() {
        let dir = TempDir::new().unwrap();
        messages(&dir);
        let mut ctx = context(&dir, SceneCatalog::default());
        ctx.documents.insert(
            PathBuf::from("scenes/a/a-scene.html"),
            "<h1>__MSG_hi__</h1>".to_string(),
        );

        FanoutPhase.execute(&mut ctx).await.unwrap();

        let en = dir.path().join("dist_static/v1/scenes/a/a-scene_en.html");
        let fr = dir.path().join("dist_static/v1/scenes/a/a-scene_fr.html");
        assert_eq!(fs::read_to_string(en).unwrap(), "<h1>Hello</h1>");
        assert_eq!(fs::read_to_string(fr).unwrap(), "<h1>Bonjour</h1>");
        assert_eq!(ctx.written_pages.len(), 2);
    }

    #[tokio::test]
    async fn test_fanout_opt_out_gets_default_locale_only() {
        let dir = TempDir::new().unwrap();
        messages(&dir);
        let catalog = SceneCatalog::from_entries([(
            "a".to_string(),
            SceneConfig {
                entry_point: Some("app.A".to_string()),
                fanout: false,
                ..SceneConfig::default()
            },
        )]);
        let mut ctx = context(&dir, catalog);
        ctx.documents.insert(
            PathBuf::from("scenes/a/a-scene.html"),
            "<p>game</p>".to_string(),
        );

        FanoutPhase.execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.written_pages.len(), 1);
        assert!(ctx.written_pages[0].ends_with("a-scene_en.html"));
    }

    #[tokio::test]
    async fn test_import_links_point_at_locale_variant() {
        let dir = TempDir::new().unwrap();
        messages(&dir);
        let mut ctx = context(&dir, SceneCatalog::default());
        ctx.documents.insert(
            PathBuf::from("scenes/a/a-scene.html"),
            "<link rel=\"import\" href=\"../../elements/shared_bundle_1.html\">\n<p>a</p>"
                .to_string(),
        );
        ctx.documents.insert(
            PathBuf::from("elements/shared_bundle_1.html"),
            "<div></div>".to_string(),
        );

        FanoutPhase.execute(&mut ctx).await.unwrap();

        let fr = fs::read_to_string(
            dir.path()
                .join("dist_static/v1/scenes/a/a-scene_fr.html"),
        )
        .unwrap();
        assert!(fr.contains("href=\"../../elements/shared_bundle_1_fr.html\""));
        assert!(dir
            .path()
            .join("dist_static/v1/elements/shared_bundle_1_fr.html")
            .is_file());
    }

    #[tokio::test]
    async fn test_links_into_fanout_opt_out_scene_keep_default_name() {
        let dir = TempDir::new().unwrap();
        messages(&dir);
        let catalog = SceneCatalog::from_entries([(
            "jetpack".to_string(),
            SceneConfig {
                entry_point: Some("app.Jetpack".to_string()),
                fanout: false,
                ..SceneConfig::default()
            },
        )]);
        let mut ctx = context(&dir, catalog);
        ctx.documents.insert(
            PathBuf::from("elements/hub.html"),
            "<link rel=\"import\" href=\"../scenes/jetpack/jetpack-scene.html\">\n<p>hub</p>"
                .to_string(),
        );
        ctx.documents.insert(
            PathBuf::from("scenes/jetpack/jetpack-scene.html"),
            "<p>game</p>".to_string(),
        );

        FanoutPhase.execute(&mut ctx).await.unwrap();

        // The opted-out scene only exists as its default-locale variant,
        // so every hub variant must point there.
        let fr = fs::read_to_string(dir.path().join("dist_static/v1/elements/hub_fr.html")).unwrap();
        assert!(fr.contains("href=\"../scenes/jetpack/jetpack-scene_en.html\""));
        assert!(dir
            .path()
            .join("dist_static/v1/scenes/jetpack/jetpack-scene_en.html")
            .is_file());
        assert!(!dir
            .path()
            .join("dist_static/v1/scenes/jetpack/jetpack-scene_fr.html")
            .exists());
    }

    #[tokio::test]
    async fn test_strict_mode_fails_on_missing_translation() {
        let dir = TempDir::new().unwrap();
        messages(&dir);
        let mut ctx = context(&dir, SceneCatalog::default());
        ctx.config = ctx.config.with_strict_i18n(true);
        ctx.documents.insert(
            PathBuf::from("elements/elements.html"),
            "__MSG_ghost__".to_string(),
        );

        assert!(FanoutPhase.execute(&mut ctx).await.is_err());
    }
}
