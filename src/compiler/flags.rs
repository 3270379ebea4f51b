//! Resolved compiler configuration per scene
//!
//! A closed struct with enumerated options instead of a loose flag bag;
//! this is also the value the cache fingerprints, so every field here
//! participates in invalidation.

use crate::catalog::SceneConfig;
use serde::Serialize;
use std::path::PathBuf;

/// Diagnostic groups every scene is checked against.
pub const BASE_WARNINGS: &[&str] = &["accessControls", "const", "visibility"];

/// Additional groups for scenes that have not opted out of type safety.
pub const SAFE_WARNINGS: &[&str] = &["checkTypes", "checkVars"];

/// Namespacing shim prefix; gives compiled scene code a `global` alias and
/// an `app` slot bound to the scene's namespace. Must stay ES5.
const WRAPPER_PREFIX: &str =
    "var global=window,app=this.app;var $jscomp=this['$jscomp']={global:global};";

/// Core site scripts run in an IIFE over `window`; nothing leaks except
/// what the code exports itself.
const CORE_WRAPPER: &str = "(function(){%output%}).call(window);";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimizationLevel {
    /// Pass-through transpile for fast iteration.
    Whitespace,
    /// Standard optimizations; the level scenes compile at for production.
    Simple,
    /// Aggressive inlining and dead-code elimination; reserved for the
    /// core site scripts.
    Advanced,
}

impl OptimizationLevel {
    pub fn as_flag(&self) -> &'static str {
        match self {
            OptimizationLevel::Whitespace => "WHITESPACE_ONLY",
            OptimizationLevel::Simple => "SIMPLE_OPTIMIZATIONS",
            OptimizationLevel::Advanced => "ADVANCED_OPTIMIZATIONS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningLevel {
    Default,
    Verbose,
}

impl WarningLevel {
    pub fn as_flag(&self) -> &'static str {
        match self {
            WarningLevel::Default => "DEFAULT",
            WarningLevel::Verbose => "VERBOSE",
        }
    }
}

/// The full flag set for one compiler invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompilerFlags {
    pub optimization: OptimizationLevel,
    pub warning_level: WarningLevel,
    /// Named diagnostic groups promoted to warnings.
    pub warnings: Vec<String>,
    pub language_in: String,
    pub language_out: String,
    pub entry_point: Option<String>,
    pub externs: Vec<PathBuf>,
    /// Template the emitted code is substituted into at `%output%`.
    pub output_wrapper: String,
    pub pretty: bool,
}

impl Default for CompilerFlags {
    fn default() -> Self {
        Self {
            optimization: OptimizationLevel::Whitespace,
            warning_level: WarningLevel::Verbose,
            warnings: BASE_WARNINGS.iter().map(|s| s.to_string()).collect(),
            language_in: "ECMASCRIPT6_STRICT".to_string(),
            language_out: "ECMASCRIPT5_STRICT".to_string(),
            entry_point: None,
            externs: Vec::new(),
            output_wrapper: "%output%".to_string(),
            pretty: false,
        }
    }
}

impl CompilerFlags {
    /// Resolve the flag set for a scene from its catalog entry.
    pub fn for_scene(
        scene_id: &str,
        config: &SceneConfig,
        externs: Vec<PathBuf>,
        force_compile: bool,
        pretty: bool,
    ) -> Self {
        let must_compile = config.must_compile(force_compile);

        let (warning_level, warnings) = if config.type_safe {
            (WarningLevel::Verbose, safe_warning_set())
        } else {
            (
                WarningLevel::Default,
                BASE_WARNINGS.iter().map(|s| s.to_string()).collect(),
            )
        };

        Self {
            optimization: if must_compile {
                OptimizationLevel::Simple
            } else {
                OptimizationLevel::Whitespace
            },
            warning_level,
            warnings,
            entry_point: config.entry_point.clone(),
            externs,
            output_wrapper: scene_output_wrapper(scene_id, config.is_frame),
            pretty,
            ..Self::default()
        }
    }

    /// Flag set for the core site scripts. Unlike scenes these always go
    /// through the aggressive optimizer pass.
    pub fn for_core(externs: Vec<PathBuf>, pretty: bool) -> Self {
        Self {
            optimization: OptimizationLevel::Advanced,
            warning_level: WarningLevel::Verbose,
            externs,
            output_wrapper: CORE_WRAPPER.to_string(),
            pretty,
            ..Self::default()
        }
    }

    /// Substitute compiled code into the wrapper template.
    pub fn wrap(&self, code: &str) -> String {
        self.output_wrapper.replace("%output%", code)
    }
}

fn safe_warning_set() -> Vec<String> {
    BASE_WARNINGS
        .iter()
        .chain(SAFE_WARNINGS.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Scenes namespace themselves under `app.*`; the wrapper publishes that
/// namespace at the global `scenes.<sceneId>` slot. Standalone frames are
/// emitted unwrapped.
pub fn scene_output_wrapper(scene_id: &str, is_frame: bool) -> String {
    if is_frame {
        return "%output%".to_string();
    }
    format!(
        "var scenes = scenes || {{}};\n\
         scenes.{id} = scenes.{id} || {{}};\n\
         (function(){{{prefix}%output%}}).call({{app: scenes.{id}}});",
        id = scene_id,
        prefix = WRAPPER_PREFIX,
    )
}
