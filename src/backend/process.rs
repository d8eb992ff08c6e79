//! Bounded execution of external converter binaries.
//!
//! Converters are black boxes that can hang on malformed PostScript, so every
//! invocation runs under a deadline: stdout/stderr are drained on reader
//! threads while the parent polls `try_wait`, and the child is killed once
//! the deadline passes.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::error::{ProofError, ProofResult};

/// Deadline for a rasterization or PDF-export attempt.
pub const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);
/// Deadline for the ink-coverage analysis pass.
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on diagnostic text surfaced from a failed converter, so callers are
/// never flooded with raw tool output.
pub const DIAGNOSTIC_LIMIT: usize = 200;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of a bounded invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub timed_out: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Short human-readable failure text: stderr first, stdout as fallback,
    /// truncated to [`DIAGNOSTIC_LIMIT`].
    pub fn diagnostic(&self) -> String {
        if self.timed_out {
            return "timed out".to_string();
        }
        let raw = if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return "no diagnostic output".to_string();
        }
        truncate_diagnostic(text, DIAGNOSTIC_LIMIT)
    }
}

/// Truncate on a character boundary, appending an ellipsis when cut.
pub fn truncate_diagnostic(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

/// Run `cmd` to completion or kill it at `timeout`.
///
/// A non-zero exit is reported in [`CommandOutput::success`], not as an
/// error; only spawn/wait failures error out.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> ProofResult<CommandOutput> {
    let program = cmd.get_program().to_string_lossy().to_string();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn '{program}' (is it installed and on PATH?)"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ProofError::conversion_failed("failed to open child stdout (unexpected)"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ProofError::conversion_failed("failed to open child stderr (unexpected)"))?;

    let out_reader = std::thread::spawn(move || drain(stdout));
    let err_reader = std::thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + timeout;
    let mut timed_out = false;
    let status = loop {
        match child
            .try_wait()
            .with_context(|| format!("failed to wait for '{program}'"))?
        {
            Some(status) => break Some(status),
            None if Instant::now() >= deadline => {
                // Kill and reap; readers unblock once the pipes close.
                let _ = child.kill();
                let _ = child.wait();
                timed_out = true;
                break None;
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    let stdout = out_reader.join().unwrap_or_default();
    let stderr = err_reader.join().unwrap_or_default();

    Ok(CommandOutput {
        success: status.map(|s| s.success()).unwrap_or(false),
        timed_out,
        stdout,
        stderr,
    })
}

fn drain(mut pipe: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "héllo wörld".repeat(40);
        let cut = truncate_diagnostic(&text, DIAGNOSTIC_LIMIT);
        assert!(cut.len() <= DIAGNOSTIC_LIMIT + '…'.len_utf8());
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn short_diagnostics_pass_through() {
        assert_eq!(truncate_diagnostic("fine", DIAGNOSTIC_LIMIT), "fine");
    }

    #[test]
    fn captures_output_and_status() {
        // `false` exits non-zero without output on every unix.
        if which::which("false").is_err() {
            return;
        }
        let out = run_with_timeout(Command::new("false"), Duration::from_secs(5)).unwrap();
        assert!(!out.success);
        assert!(!out.timed_out);
        assert_eq!(out.diagnostic(), "no diagnostic output");
    }

    #[test]
    fn deadline_kills_the_child() {
        if which::which("sleep").is_err() {
            return;
        }
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let started = Instant::now();
        let out = run_with_timeout(cmd, Duration::from_millis(200)).unwrap();
        assert!(out.timed_out);
        assert!(!out.success);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(out.diagnostic(), "timed out");
    }
}
