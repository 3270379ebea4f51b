//! Compiler invocation: the seam to the external optimizing compiler
//!
//! The optimizer itself is an external collaborator behind the [`Compiler`]
//! trait. [`ProcessCompiler`] shells out to the real toolchain;
//! [`MockCompiler`] is a deterministic stand-in for tests. The
//! [`CompilerInvoker`] owns flag construction, the cache consult, output
//! wrapping and the write to disk.

pub mod flags;
pub mod invoker;
pub mod mock;
pub mod process;

pub use flags::{CompilerFlags, OptimizationLevel, WarningLevel};
pub use invoker::{
    core_job, scene_job, CompileError, CompileOutcome, CompileResult, CompilerInvoker, CORE_TARGET,
};
pub use mock::MockCompiler;
pub use process::ProcessCompiler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic reported by the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            file: None,
            line: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: {}", file, line, self.message),
            (Some(file), None) => write!(f, "{}: {}", file, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// One locale-independent compilation unit: a scene's sources plus its
/// resolved compiler configuration. Created per requested scene and
/// discarded when the build completes; only the cache marker persists.
#[derive(Debug, Clone, Serialize)]
pub struct CompileJob {
    pub scene_id: String,
    /// Scene script tree plus shared scene scripts, pre-compiled output
    /// excluded.
    pub sources: Vec<PathBuf>,
    /// Extra library globs the scene declared, resolved to files.
    pub libraries: Vec<PathBuf>,
    pub flags: CompilerFlags,
    /// Scene must go through the real optimizer rather than the fast
    /// whitespace pass.
    pub must_compile: bool,
    pub output_path: PathBuf,
}

impl CompileJob {
    /// Every file whose edit must trigger a rebuild.
    pub fn input_files(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .chain(self.libraries.iter())
            .chain(self.flags.externs.iter())
            .cloned()
            .collect()
    }
}

/// Successful compiler run: emitted code plus any advisory diagnostics.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub code: String,
    pub warnings: Vec<Diagnostic>,
}

/// Failure modes of a compiler run. Error-severity diagnostics fail the
/// scene; an internal toolchain fault is fatal to the whole build.
#[derive(Debug, Error)]
pub enum CompilerFailure {
    #[error("compiler reported {} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    #[error("compiler internal failure: {0}")]
    Internal(String),
}

/// The external optimizing compiler.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, job: &CompileJob) -> Result<CompileOutput, CompilerFailure>;
}
