//! External optimizer invocation
//!
//! Shells out to the real toolchain binary with the resolved flag set and
//! turns its stderr diagnostics back into structured values. Warnings stay
//! advisory; error-severity diagnostics fail the scene; anything the
//! toolchain reports about itself (crash, missing runtime) is fatal to the
//! whole build.

use super::{CompileJob, CompileOutput, Compiler, CompilerFailure, Diagnostic, Severity};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Invokes the optimizing compiler as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: PathBuf,
    /// Arguments prepended before the generated flag set, e.g.
    /// `["-jar", "compiler.jar"]` when the program is a JVM.
    leading_args: Vec<String>,
}

impl ProcessCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// JVM-hosted toolchain: `java -jar <jar> <flags...>`.
    pub fn jvm(jar: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("java"),
            leading_args: vec!["-jar".to_string(), jar.into().display().to_string()],
        }
    }

    fn build_args(&self, job: &CompileJob) -> Vec<String> {
        let mut args = self.leading_args.clone();
        let flags = &job.flags;

        for src in job.sources.iter().chain(job.libraries.iter()) {
            args.push("--js".to_string());
            args.push(src.display().to_string());
        }
        for extern_file in &flags.externs {
            args.push("--externs".to_string());
            args.push(extern_file.display().to_string());
        }

        args.push(format!("--compilation_level={}", flags.optimization.as_flag()));
        args.push(format!("--warning_level={}", flags.warning_level.as_flag()));
        args.push(format!("--language_in={}", flags.language_in));
        args.push(format!("--language_out={}", flags.language_out));
        for warning in &flags.warnings {
            args.push(format!("--jscomp_warning={}", warning));
        }
        if let Some(entry) = &flags.entry_point {
            args.push(format!("--entry_point={}", entry));
            args.push("--dependency_mode=PRUNE".to_string());
        }
        args.push("--assume_function_wrapper".to_string());
        args.push("--rewrite_polyfills=false".to_string());
        if flags.pretty {
            args.push("--formatting=PRETTY_PRINT".to_string());
        }

        args
    }
}

#[async_trait]
impl Compiler for ProcessCompiler {
    async fn compile(&self, job: &CompileJob) -> Result<CompileOutput, CompilerFailure> {
        let args = self.build_args(job);
        debug!(scene = %job.scene_id, program = %self.program.display(), "invoking compiler");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|err| {
                CompilerFailure::Internal(format!(
                    "failed to launch {}: {}",
                    self.program.display(),
                    err
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = parse_diagnostics(&stderr);
        let (errors, warnings): (Vec<_>, Vec<_>) = diagnostics
            .into_iter()
            .partition(|d| d.severity == Severity::Error);

        if output.status.success() {
            return Ok(CompileOutput {
                code: String::from_utf8_lossy(&output.stdout).into_owned(),
                warnings,
            });
        }

        if errors.is_empty() {
            // Non-zero exit with nothing we could parse: the toolchain
            // itself fell over.
            return Err(CompilerFailure::Internal(stderr.trim().to_string()));
        }
        Err(CompilerFailure::Diagnostics(errors))
    }
}

/// Parse `file:line: ERROR - message` / `WARNING - message` stderr lines.
fn parse_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for line in stderr.lines() {
        let severity = if line.contains("ERROR - ") {
            Severity::Error
        } else if line.contains("WARNING - ") {
            Severity::Warning
        } else {
            continue;
        };

        let marker = match severity {
            Severity::Error => "ERROR - ",
            Severity::Warning => "WARNING - ",
        };
        let (location, message) = line.split_once(marker).unwrap_or(("", line));
        let (file, line_no) = parse_location(location);

        out.push(Diagnostic {
            severity,
            message: message.trim().to_string(),
            file,
            line: line_no,
        });
    }
    out
}

fn parse_location(location: &str) -> (Option<String>, Option<u32>) {
    let location = location.trim().trim_end_matches(':');
    if location.is_empty() {
        return (None, None);
    }
    if let Some((file, line)) = location.rsplit_once(':') {
        if let Ok(line_no) = line.parse::<u32>() {
            return (Some(file.to_string()), Some(line_no));
        }
    }
    (Some(location.to_string()), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::flags::CompilerFlags;

    fn job() -> CompileJob {
        CompileJob {
            scene_id: "boatload".to_string(),
            sources: vec![PathBuf::from("scenes/boatload/js/game.js")],
            libraries: vec![PathBuf::from("third_party/lib.js")],
            flags: CompilerFlags {
                entry_point: Some("app.Game".to_string()),
                externs: vec![PathBuf::from("externs/maps.js")],
                ..CompilerFlags::default()
            },
            must_compile: true,
            output_path: PathBuf::from("scenes/boatload/boatload-scene.min.js"),
        }
    }

    #[test]
    fn test_args_cover_sources_and_flags() {
        let compiler = ProcessCompiler::jvm("tools/compiler.jar");
        let args = compiler.build_args(&job());

        assert_eq!(args[0], "-jar");
        assert_eq!(args[1], "tools/compiler.jar");
        assert!(args.contains(&"--js".to_string()));
        assert!(args.contains(&"scenes/boatload/js/game.js".to_string()));
        assert!(args.contains(&"third_party/lib.js".to_string()));
        assert!(args.contains(&"--externs".to_string()));
        assert!(args.contains(&"--compilation_level=WHITESPACE_ONLY".to_string()));
        assert!(args.contains(&"--entry_point=app.Game".to_string()));
        assert!(args.contains(&"--rewrite_polyfills=false".to_string()));
        assert!(!args.iter().any(|a| a.contains("PRETTY_PRINT")));
    }

    #[test]
    fn test_pretty_adds_formatting_flag() {
        let mut j = job();
        j.flags.pretty = true;
        let args = ProcessCompiler::new("closure").build_args(&j);
        assert!(args.contains(&"--formatting=PRETTY_PRINT".to_string()));
    }

    #[test]
    fn test_parse_diagnostics() {
        let stderr = "\
scenes/boatload/js/game.js:42: ERROR - [JSC_TYPE_MISMATCH] found string, required number
scenes/boatload/js/ui.js:7: WARNING - [JSC_UNUSED_LOCAL] unused variable x
1 error(s), 1 warning(s)
";
        let diags = parse_diagnostics(stderr);
        assert_eq!(diags.len(), 2);

        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].file.as_deref(), Some("scenes/boatload/js/game.js"));
        assert_eq!(diags[0].line, Some(42));
        assert!(diags[0].message.contains("JSC_TYPE_MISMATCH"));

        assert_eq!(diags[1].severity, Severity::Warning);
        assert_eq!(diags[1].line, Some(7));
    }

    #[test]
    fn test_parse_diagnostics_without_location() {
        let diags = parse_diagnostics("ERROR - cannot read input file\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, None);
        assert_eq!(diags[0].line, None);
    }

    #[tokio::test]
    async fn test_missing_program_is_internal_failure() {
        let compiler = ProcessCompiler::new("/definitely/not/a/compiler");
        let err = compiler.compile(&job()).await.unwrap_err();
        assert!(matches!(err, CompilerFailure::Internal(_)));
    }
}
