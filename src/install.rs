//! Applies reconcile decisions to disk and drives the service manager.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::MkunitError;
use crate::materialize::{Materialized, MaterializedUnit};
use crate::reconcile::{self, Confirm, InstallDecision};
use crate::request::{Scope, UnitRequest};
use crate::systemctl::ServiceManager;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub reloaded: bool,
    pub started: bool,
    pub enabled: bool,
}

pub fn write_unit(path: &Path, content: &str) -> Result<(), MkunitError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MkunitError::from_write(parent.to_path_buf(), e))?;
    }
    fs::write(path, content).map_err(|e| MkunitError::from_write(path.to_path_buf(), e))
}

/// Reconcile and write each unit in turn, then reload once if anything was
/// written. A write failure aborts the rest of the run; files already written
/// stay in place.
pub fn install(
    request: &UnitRequest,
    units: &Materialized,
    confirm: &mut dyn Confirm,
    manager: &mut dyn ServiceManager,
) -> Result<InstallReport> {
    let mut report = InstallReport::default();

    for unit in units.units() {
        match reconcile::reconcile(unit, confirm)? {
            InstallDecision::Write => {
                write(unit)?;
                report.written.push(unit.filename.clone());
            }
            InstallDecision::Skip => {
                println!("Skipped: {}", unit.path.display());
                report.skipped.push(unit.filename.clone());
            }
        }
    }

    let scope = request.scope;
    if !report.written.is_empty() {
        manager
            .daemon_reload(scope)
            .context("Failed to reload service manager configuration")?;
        report.reloaded = true;
    } else {
        tracing::info!("nothing written, skipping daemon-reload");
    }

    if request.start_after_install {
        manager
            .start(scope, &units.service.filename)
            .with_context(|| format!("Failed to start {}", units.service.filename))?;
        println!("Started: {}", units.service.filename);
        report.started = true;
    }

    if request.enable_timer_after_install {
        if let Some(timer) = &units.timer {
            manager
                .enable_now(scope, &timer.filename)
                .with_context(|| format!("Failed to enable {}", timer.filename))?;
            println!("Enabled: {}", timer.filename);
            report.enabled = true;
        }
    }

    Ok(report)
}

fn write(unit: &MaterializedUnit) -> Result<()> {
    write_unit(&unit.path, &unit.content)
        .with_context(|| format!("Failed to install {}", unit.filename))?;
    println!("Created: {}", unit.path.display());
    Ok(())
}

/// Human-readable scope hint for follow-up commands.
pub fn systemctl_hint(scope: Scope) -> &'static str {
    match scope {
        Scope::User => "systemctl --user",
        Scope::System => "systemctl",
    }
}
