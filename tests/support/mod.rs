//! Shared fixture builder for integration tests

use scenery::config::SiteLayout;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway content site assembled file by file.
pub struct SiteFixture {
    dir: TempDir,
}

#[allow(dead_code)]
impl SiteFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> SiteLayout {
        SiteLayout::new(self.root())
    }

    /// Write the scene catalog.
    pub fn catalog(&self, toml: &str) -> &Self {
        self.file("scenes.toml", toml)
    }

    /// Write a scene script under `scenes/<id>/js/`.
    pub fn scene_js(&self, id: &str, name: &str, code: &str) -> &Self {
        self.file(&format!("scenes/{}/js/{}", id, name), code)
    }

    /// Write a scene page under `scenes/<id>/`.
    pub fn scene_page(&self, id: &str, html: &str) -> &Self {
        self.file(&format!("scenes/{}/{}-scene.html", id, id), html)
    }

    /// Write a shared element under `elements/`.
    pub fn element(&self, name: &str, html: &str) -> &Self {
        self.file(&format!("elements/{}", name), html)
    }

    /// Write a locale message table under `_messages/`.
    pub fn messages(&self, locale: &str, json: &str) -> &Self {
        self.file(&format!("_messages/{}.json", locale), json)
    }

    pub fn file(&self, rel: &str, content: &str) -> &Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("failed to read {}: {}", rel, e))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }
}
