//! Allow-listed execution of template-declared commands
//!
//! Templates declare install/start commands as plain strings. Only a small
//! set of package managers may be launched; the string is split on
//! whitespace and never handed to a shell.

use super::{Invocation, ProcessRunner};
use crate::error::{Result, ScaffoldError};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Programs a template may ask us to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Npm,
    Cnpm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Npm,
        PackageManager::Cnpm,
        PackageManager::Yarn,
        PackageManager::Pnpm,
    ];

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Cnpm => "cnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// Exact, case-sensitive lookup of a program name
    pub fn from_program(program: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pm| pm.program() == program)
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program())
    }
}

/// A command line that passed the allow-list check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedCommand {
    manager: PackageManager,
    args: Vec<String>,
}

impl GuardedCommand {
    /// Split on whitespace and check the program before anything else
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let manager = parts
            .next()
            .and_then(PackageManager::from_program)
            .ok_or_else(|| ScaffoldError::CommandNotAllowed {
                command: command_line.to_string(),
            })?;

        Ok(Self {
            manager,
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn manager(&self) -> PackageManager {
        self.manager
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn invocation(&self, cwd: &Path) -> Invocation {
        Invocation::new(self.manager.program(), self.args.clone(), cwd)
    }
}

/// Run a template command, failing with `failure` on any unsuccessful exit
pub async fn run_guarded(
    runner: &dyn ProcessRunner,
    command_line: &str,
    cwd: &Path,
    failure: &str,
) -> Result<()> {
    let command = GuardedCommand::parse(command_line)?;
    let invocation = command.invocation(cwd);
    info!(command = %invocation.display(), "running template command");

    let status = runner
        .run(&invocation)
        .await
        .map_err(|e| ScaffoldError::CommandFailed {
            command: command_line.to_string(),
            message: format!("{}: {}", failure, e),
            code: None,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ScaffoldError::CommandFailed {
            command: command_line.to_string(),
            message: failure.to_string(),
            code: status.code(),
        })
    }
}
