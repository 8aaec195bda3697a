//! Azure CLI command execution.
//!
//! Provides utilities for running Azure CLI commands and parsing their output.

use crate::error::{LifecycleError, Result};
use colored::Colorize;
use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;

/// Upper bound on accepted stdout, larger answers are rejected.
const MAX_STDOUT_BYTES: usize = 500_000;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Run a shell command and return its stdout.
///
/// The command string is split on spaces, with quoted substrings preserved.
///
/// # Arguments
/// * `cmd` - The command string to execute
///
/// # Returns
/// * `Ok(String)` - The stdout output on success
/// * `Err(LifecycleError::Cli)` - If the command fails, exits non-zero or produces too much output
pub fn run(cmd: &str) -> Result<String> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let cmds: Vec<&str> = split_and_strip(cmd)
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect();
    log::trace!("split cmds={:?}", cmds);

    let Some((program, args)) = cmds.split_first() else {
        return Err(LifecycleError::Cli("empty command".to_string()));
    };

    let output = Command::new(program).args(args).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        LifecycleError::Cli(format!("Failed to execute {program}: {e}"))
    })?;

    if output.status.success() {
        log::debug!("Success cmd: {cmd}");
        log::debug!("Success output.stdout.len(): {}", output.stdout.len());

        if output.stdout.len() > MAX_STDOUT_BYTES {
            return Err(LifecycleError::Cli(format!(
                "Response too large: {} bytes for command: {:?}",
                output.stdout.len(),
                cmds
            )));
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = cmd.on_blue()
        );
        return Err(LifecycleError::Cli(format!("ERROR running: {}", stderr.trim())));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| LifecycleError::Cli(format!("Invalid UTF-8: {}", e)))
}

/// Run [`run`] on the blocking pool so async callers are not stalled.
pub async fn run_blocking(cmd: String) -> Result<String> {
    tokio::task::spawn_blocking(move || run(&cmd))
        .await
        .map_err(|e| LifecycleError::Cli(format!("command task failed: {e}")))?
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .collect()
}
