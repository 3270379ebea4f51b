//! Deterministic mock compiler for tests
//!
//! Concatenates the job's source files with a banner instead of invoking
//! the real optimizer, and counts invocations so tests can assert that the
//! cache actually skipped work.

use super::{CompileJob, CompileOutput, Compiler, CompilerFailure, Diagnostic};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockCompiler {
    invocations: AtomicUsize,
    fail_scenes: Mutex<BTreeSet<String>>,
    warn_scenes: Mutex<BTreeSet<String>>,
    internal_failure: Mutex<Option<String>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `compile` actually ran.
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Make compilation of the given scene fail with an error diagnostic.
    pub fn fail_scene(&self, scene_id: &str) {
        self.fail_scenes.lock().unwrap().insert(scene_id.to_string());
    }

    /// Make compilation of the given scene emit an advisory warning.
    pub fn warn_scene(&self, scene_id: &str) {
        self.warn_scenes.lock().unwrap().insert(scene_id.to_string());
    }

    /// Make every compilation fail as a toolchain fault.
    pub fn fail_internally(&self, message: &str) {
        *self.internal_failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl Compiler for MockCompiler {
    async fn compile(&self, job: &CompileJob) -> Result<CompileOutput, CompilerFailure> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.internal_failure.lock().unwrap().clone() {
            return Err(CompilerFailure::Internal(message));
        }
        if self.fail_scenes.lock().unwrap().contains(&job.scene_id) {
            return Err(CompilerFailure::Diagnostics(vec![Diagnostic::error(
                format!("mock compile error in scene '{}'", job.scene_id),
            )]));
        }

        let mut code = format!(
            "// {}: {}\n",
            job.scene_id,
            job.flags.optimization.as_flag()
        );
        for source in job.sources.iter().chain(job.libraries.iter()) {
            let content = std::fs::read_to_string(source).map_err(|err| {
                CompilerFailure::Diagnostics(vec![Diagnostic::error(format!(
                    "cannot read input {}: {}",
                    source.display(),
                    err
                ))])
            })?;
            code.push_str(&content);
            if !content.ends_with('\n') {
                code.push('\n');
            }
        }

        let warnings = if self.warn_scenes.lock().unwrap().contains(&job.scene_id) {
            vec![Diagnostic::warning(format!(
                "mock warning in scene '{}'",
                job.scene_id
            ))]
        } else {
            Vec::new()
        };

        Ok(CompileOutput { code, warnings })
    }
}
