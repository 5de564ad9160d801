//! Subprocess execution
//!
//! This module provides:
//! - `ProcessRunner`: the seam through which every child process is spawned
//! - `SystemRunner`: tokio-backed runner inheriting stdout/stderr
//! - The command guard restricting template-declared commands to package managers

pub mod guard;

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::debug;

pub use guard::{run_guarded, GuardedCommand, PackageManager};

/// One program execution request; never interpreted by a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Bytes written to the child's stdin before it is closed
    pub stdin: Option<Vec<u8>>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.into(),
            stdin: None,
            env: Vec::new(),
        }
    }

    pub fn with_stdin(mut self, payload: Vec<u8>) -> Self {
        self.stdin = Some(payload);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Human-readable command line, for messages only
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs a program to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> io::Result<ExitStatus>;
}

/// Spawns real processes with inherited stdout/stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ExitStatus> {
        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            cwd = %invocation.cwd.display(),
            "spawning process"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        command.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        let mut child = command.spawn()?;

        if let Some(payload) = &invocation.stdin {
            if let Some(stdin) = child.stdin.take() {
                if let Err(e) = feed_stdin(stdin, payload).await {
                    if e.kind() != io::ErrorKind::BrokenPipe {
                        // Reap the child before reporting
                        let _ = child.kill().await;
                        return Err(e);
                    }
                    debug!(program = %invocation.program, "child closed stdin early");
                }
            }
        }

        // Success is decided by the exit status alone
        child.wait().await
    }
}

async fn feed_stdin(mut stdin: ChildStdin, payload: &[u8]) -> io::Result<()> {
    stdin.write_all(payload).await?;
    stdin.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::new(
            "npm",
            vec!["run".to_string(), "dev".to_string()],
            "/tmp",
        );
        assert_eq!(invocation.display(), "npm run dev");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let ok = SystemRunner
            .run(&Invocation::new("true", Vec::new(), dir.path()))
            .await
            .unwrap();
        assert!(ok.success());

        let failed = SystemRunner
            .run(&Invocation::new("false", Vec::new(), dir.path()))
            .await
            .unwrap();
        assert!(!failed.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_feeds_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let invocation = Invocation::new(
            "sh",
            vec!["-c".to_string(), format!("cat > '{}'", out.display())],
            dir.path(),
        )
        .with_stdin(b"payload".to_vec());

        let status = SystemRunner.run(&invocation).await.unwrap();
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(out).unwrap(), "payload");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_ignoring_stdin_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let invocation =
            Invocation::new("true", Vec::new(), dir.path()).with_stdin(vec![b'x'; 1 << 20]);

        let status = SystemRunner.run(&invocation).await.unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_ignoring_stdin_keeps_its_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let invocation =
            Invocation::new("false", Vec::new(), dir.path()).with_stdin(vec![b'x'; 1 << 20]);

        let status = SystemRunner.run(&invocation).await.unwrap();
        assert!(!status.success());
    }
}
