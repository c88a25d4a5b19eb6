//! Hard system actions: factory reset, soft reset, reboot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};
use vtool_common::{CommandLine, CommandRunner, VtoolError, VtoolResult};

use crate::config::CommandsConfig;

/// A system-wide action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemAction {
    /// Restore factory configuration.
    HardReset,
    /// Reset configuration but keep device identity.
    SoftReset,
    Reboot,
}

impl SystemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemAction::HardReset => "hard-reset",
            SystemAction::SoftReset => "soft-reset",
            SystemAction::Reboot => "reboot",
        }
    }
}

impl fmt::Display for SystemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemAction {
    type Err = VtoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hard-reset" => Ok(SystemAction::HardReset),
            "soft-reset" => Ok(SystemAction::SoftReset),
            "reboot" => Ok(SystemAction::Reboot),
            _ => Err(VtoolError::invalid_argument(
                "action",
                format!("'{}' is not one of hard-reset, soft-reset, reboot", s),
            )),
        }
    }
}

/// Dispatches system actions to their scripts.
pub struct SystemControl {
    runner: Arc<dyn CommandRunner>,
    commands: CommandsConfig,
}

impl SystemControl {
    pub fn new(runner: Arc<dyn CommandRunner>, commands: CommandsConfig) -> Self {
        Self { runner, commands }
    }

    fn command_for(&self, action: SystemAction) -> CommandLine {
        let program = match action {
            SystemAction::HardReset => &self.commands.hard_reset,
            SystemAction::SoftReset => &self.commands.soft_reset,
            SystemAction::Reboot => &self.commands.reboot,
        };
        CommandLine::new(program.as_str())
    }

    /// Runs the action. Output is ignored; only a failure to start (or a
    /// timeout) is returned as an error.
    pub async fn run(&self, action: SystemAction) -> VtoolResult<()> {
        let cmd = self.command_for(action);
        info!(%action, command = %cmd, "Running system action");

        let result = self.runner.run(&cmd).await?;
        if !result.success() {
            warn!(
                %action,
                exit_code = result.exit_code,
                output = %result.combined_output(),
                "System action exited abnormally"
            );
        }
        Ok(())
    }
}
