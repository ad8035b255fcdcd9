//! Helper process execution

use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Variables passed through from parkbot's own environment
const INHERITED_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "DISPLAY",
    "WAYLAND_DISPLAY",
    "XDG_RUNTIME_DIR",
];

#[derive(Debug, Error)]
pub enum HelperError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("{program} did not finish within {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of one helper run
#[derive(Debug)]
pub struct HelperOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl HelperOutput {
    /// Last non-empty stderr line, which helpers use for the failure reason
    pub fn reason(&self) -> Option<&str> {
        self.stderr
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
    }

    /// Signal that killed the helper, if any
    pub fn signal(&self) -> Option<i32> {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            self.status.signal()
        }
        #[cfg(not(unix))]
        {
            None
        }
    }
}

/// An external program invoked once per request
#[derive(Debug, Clone)]
pub struct HelperCommand {
    argv: Vec<String>,
    env: HashMap<String, String>,
    timeout: Duration,
}

impl HelperCommand {
    pub fn new(argv: Vec<String>, env: HashMap<String, String>, timeout: Duration) -> Self {
        Self { argv, env, timeout }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    /// Run to completion with `extra_env` on top of the configured environment.
    ///
    /// The child is killed if it outlives the timeout.
    pub async fn run(&self, extra_env: &[(&str, String)]) -> Result<HelperOutput, HelperError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| HelperError::SpawnFailed("Empty argv".into()))?;

        let mut cmd = Command::new(program);
        cmd.args(args);

        cmd.env_clear();
        for key in INHERITED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        for (k, v) in extra_env {
            cmd.env(k, v);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| HelperError::SpawnFailed(format!("Failed to spawn {}: {}", program, e)))?;

        debug!(pid = ?child.id(), program = %program, "Helper spawned");

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(HelperError::TimedOut {
                    program: program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        debug!(program = %program, status = %output.status, "Helper exited");

        Ok(HelperOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
