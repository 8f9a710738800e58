//! Ordered LaTeX compiler fallback chain.
//!
//! Backends run strictly in sequence, never in parallel: a later attempt
//! must not race an earlier one's partially written output in the same
//! working directory.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use super::{RenderAttempt, RenderFailure};

const INPUT_TEX: &str = "resume.tex";
const OUTPUT_PDF: &str = "resume.pdf";
const COMPILER_LOG: &str = "resume.log";
/// Per-backend execution budget.
const COMPILE_TIMEOUT_SECS: u64 = 90;
/// Pause between backends; a shared resource like a network-backed package
/// cache should not be hammered back-to-back.
const BACKOFF_BETWEEN_BACKENDS: Duration = Duration::from_millis(500);
const LOG_TAIL_CHARS: usize = 2000;

/// One compiler invocation recipe. The output name is pinned to the job
/// name `resume` so every backend produces the same artifact path.
#[derive(Debug, Clone, Copy)]
pub struct LatexBackend {
    pub name: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// The production chain: bundled-style single-pass compiler first, then the
/// system toolchain wrappers.
pub const BACKENDS: &[LatexBackend] = &[
    LatexBackend {
        name: "tectonic",
        program: "tectonic",
        args: &[INPUT_TEX],
    },
    LatexBackend {
        name: "latexmk",
        program: "latexmk",
        args: &["-pdf", "-interaction=nonstopmode", INPUT_TEX],
    },
    LatexBackend {
        name: "pdflatex",
        program: "pdflatex",
        args: &["-interaction=nonstopmode", INPUT_TEX],
    },
];

/// Renders a filled LaTeX template to PDF bytes using the production
/// backend chain.
pub async fn render_latex(workdir: &Path, filled: &str) -> Result<Vec<u8>, RenderFailure> {
    render_with_backends(workdir, filled, BACKENDS).await
}

/// Same as [`render_latex`] but with an explicit backend list, which is what
/// the tests drive with stub commands.
pub async fn render_with_backends(
    workdir: &Path,
    filled: &str,
    backends: &[LatexBackend],
) -> Result<Vec<u8>, RenderFailure> {
    render_with_timeout(
        workdir,
        filled,
        backends,
        Duration::from_secs(COMPILE_TIMEOUT_SECS),
    )
    .await
}

async fn render_with_timeout(
    workdir: &Path,
    filled: &str,
    backends: &[LatexBackend],
    compile_timeout: Duration,
) -> Result<Vec<u8>, RenderFailure> {
    let tex_path = workdir.join(INPUT_TEX);
    let pdf_path = workdir.join(OUTPUT_PDF);

    if let Err(e) = tokio::fs::write(&tex_path, filled).await {
        // Can't even stage the input; report it as a single failed attempt.
        return Err(RenderFailure {
            attempts: vec![RenderAttempt {
                backend: "workdir".to_string(),
                command: format!("write {}", tex_path.display()),
                succeeded: false,
                error: Some(e.to_string()),
                log_tail: String::new(),
            }],
        });
    }

    let mut attempts = Vec::with_capacity(backends.len());

    for (index, backend) in backends.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(BACKOFF_BETWEEN_BACKENDS).await;
        }

        let command_line = format!("{} {}", backend.program, backend.args.join(" "));
        let mut attempt = RenderAttempt {
            backend: backend.name.to_string(),
            command: command_line,
            succeeded: false,
            error: None,
            log_tail: String::new(),
        };

        let mut cmd = Command::new(backend.program);
        // Kill the child when the timeout drops its future; an orphaned
        // compiler would keep writing into the shared working directory
        // while the next backend runs.
        cmd.args(backend.args)
            .current_dir(workdir)
            .kill_on_drop(true);

        let outcome = tokio::time::timeout(compile_timeout, cmd.output()).await;

        let mut combined_log = String::new();
        let mut process_error: Option<String> = None;
        let mut timed_out = false;
        match outcome {
            Err(_) => {
                timed_out = true;
                process_error = Some(format!("timed out after {}s", compile_timeout.as_secs()));
            }
            Ok(Err(e)) => {
                process_error = Some(e.to_string());
            }
            Ok(Ok(output)) => {
                combined_log.push_str(&String::from_utf8_lossy(&output.stdout));
                combined_log.push_str(&String::from_utf8_lossy(&output.stderr));
                if !output.status.success() {
                    process_error = Some(format!("exited with {}", output.status));
                }
            }
        }

        // The compiler log usually has the real story; append it whenever
        // the process got far enough to write one.
        if let Ok(log) = tokio::fs::read_to_string(workdir.join(COMPILER_LOG)).await {
            combined_log.push('\n');
            combined_log.push_str(&log);
        }
        attempt.log_tail = tail(&combined_log, LOG_TAIL_CHARS);

        // The artifact on disk is the decisive success signal: pdflatex in
        // nonstop mode reports errors while still producing a usable PDF,
        // and a clean exit without a PDF is still a failure. A timed-out
        // backend is the one exception: whatever it left behind may be
        // half-written, so it never counts.
        let produced = !timed_out && tokio::fs::metadata(&pdf_path).await.is_ok();
        if produced {
            match tokio::fs::read(&pdf_path).await {
                Ok(bytes) => {
                    if let Some(ref err) = process_error {
                        info!(
                            "Backend {} produced a PDF despite reporting: {err}",
                            backend.name
                        );
                    }
                    attempt.succeeded = true;
                    attempts.push(attempt);
                    info!("Rendered {} bytes via {}", bytes.len(), backend.name);
                    return Ok(bytes);
                }
                Err(e) => {
                    attempt.error = Some(format!("output file unreadable: {e}"));
                    attempts.push(attempt);
                }
            }
        } else {
            attempt.error = Some(process_error.unwrap_or_else(|| {
                "compiler reported success but produced no PDF".to_string()
            }));
            warn!(
                "Backend {} failed: {}",
                backend.name,
                attempt.error.as_deref().unwrap_or("")
            );
            attempts.push(attempt);
        }

        // Remove any partial artifact so the next backend starts clean.
        let _ = tokio::fs::remove_file(&pdf_path).await;
    }

    Err(RenderFailure { attempts })
}

fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.trim().to_string();
    }
    s.chars()
        .skip(count - max_chars)
        .collect::<String>()
        .trim()
        .to_string()
}
