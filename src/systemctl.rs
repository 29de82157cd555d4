use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::request::Scope;

/// The service-manager operations the installer needs.
pub trait ServiceManager {
    fn daemon_reload(&mut self, scope: Scope) -> Result<()>;
    fn start(&mut self, scope: Scope, unit: &str) -> Result<()>;
    fn enable_now(&mut self, scope: Scope, unit: &str) -> Result<()>;
}

/// Shells out to `systemctl`, adding `--user` for user scope.
pub struct Systemctl;

impl Systemctl {
    fn run(scope: Scope, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("systemctl");
        if scope == Scope::User {
            cmd.arg("--user");
        }
        tracing::debug!(scope = scope.label(), ?args, "running systemctl");

        let output = cmd
            .args(args)
            .output()
            .context("Failed to execute systemctl")?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            bail!(
                "systemctl{} {} failed: {}",
                if scope == Scope::User { " --user" } else { "" },
                args.join(" "),
                stderr.trim()
            );
        }

        Ok(stdout.trim().to_string())
    }
}

impl ServiceManager for Systemctl {
    fn daemon_reload(&mut self, scope: Scope) -> Result<()> {
        Self::run(scope, &["daemon-reload"])?;
        Ok(())
    }

    fn start(&mut self, scope: Scope, unit: &str) -> Result<()> {
        Self::run(scope, &["start", unit])?;
        Ok(())
    }

    fn enable_now(&mut self, scope: Scope, unit: &str) -> Result<()> {
        Self::run(scope, &["enable", "--now", unit])?;
        Ok(())
    }
}
