//! Common utilities for the k3d client
//!
//! Process execution and output classification shared by every subcommand.

use crate::error::K3dError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Output fragments k3d prints when the named cluster does not exist
pub const CLUSTER_NOT_FOUND: &[&str] = &["no nodes found for given cluster", "no clusters found"];

/// Output fragments k3d prints when the named node does not exist
pub const NODE_NOT_FOUND: &[&str] = &["no node found", "failed to get container for node"];

/// Output fragments k3d prints when its `--timeout` expires
const TIMEOUT_MARKERS: &[&str] = &["context deadline exceeded", "timed out"];

/// Captured result of one k3d invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero
    pub success: bool,
    /// Standard output, ANSI escapes removed
    pub stdout: String,
    /// Standard error, ANSI escapes removed
    pub stderr: String,
}

impl CommandOutput {
    /// Standard error followed by standard output, trimmed
    pub fn combined(&self) -> String {
        let mut combined = self.stderr.trim().to_string();
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(stdout);
        }
        combined
    }
}

/// Runs the k3d binary
#[derive(Debug, Clone)]
pub struct CommandRunner {
    binary: String,
}

impl CommandRunner {
    /// Create a runner for the given binary name or path
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary this runner invokes
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run k3d and capture its output, whatever the exit status
    ///
    /// `stdin` is written to the child and then closed. Arguments are logged,
    /// so they must never carry secret values; pass those on stdin instead.
    pub async fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<CommandOutput, K3dError> {
        debug!("Running {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input).await?;
            // Dropping the pipe closes stdin so k3d sees EOF
        }

        let output = child.wait_with_output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: strip_ansi(&String::from_utf8_lossy(&output.stdout)),
            stderr: strip_ansi(&String::from_utf8_lossy(&output.stderr)),
        })
    }

    /// Run k3d and turn a non-zero exit into a classified error
    ///
    /// `not_found` lists the messages that mean the addressed cluster or node
    /// is absent for this subcommand; pass `&[]` where absence is not an
    /// error (listing).
    pub async fn run_checked(
        &self,
        args: &[&str],
        stdin: Option<&[u8]>,
        not_found: &[&str],
    ) -> Result<CommandOutput, K3dError> {
        let output = self.run(args, stdin).await?;
        if output.success {
            Ok(output)
        } else {
            Err(classify_failure(args.join(" "), output.combined(), not_found))
        }
    }
}

/// Remove terminal colour and cursor escapes from CLI output
pub fn strip_ansi(text: &str) -> String {
    console::strip_ansi_codes(text).into_owned()
}

/// Map a failed invocation to the matching error variant
pub fn classify_failure(command: String, output: String, not_found: &[&str]) -> K3dError {
    let lower = output.to_lowercase();
    if not_found.iter().any(|m| lower.contains(m)) {
        K3dError::NotFound(output)
    } else if TIMEOUT_MARKERS.iter().any(|m| lower.contains(m)) {
        K3dError::Timeout { command, output }
    } else {
        K3dError::CommandFailed { command, output }
    }
}
