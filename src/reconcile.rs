//! Decides, per destination file, whether the materialized unit may be written.
//!
//! Each file moves through `Pending → Write` when nothing exists at the
//! destination, or `Pending → Diffed → Confirmed | Declined` when something
//! does. Identical existing content is not a shortcut: it still goes through
//! confirmation.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use inquire::error::InquireError;

use crate::diff;
use crate::materialize::MaterializedUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallDecision {
    Write,
    Skip,
}

/// Asked once per existing destination file, after the diff is known.
pub trait Confirm {
    fn confirm_overwrite(&mut self, path: &Path, diff: &str) -> Result<bool>;
}

/// Interactive yes/no prompt on the terminal. Without a terminal nothing
/// can be confirmed, so every overwrite is declined.
pub struct Prompt;

impl Confirm for Prompt {
    fn confirm_overwrite(&mut self, path: &Path, diff: &str) -> Result<bool> {
        println!("{} already exists.", path.display());
        if diff.is_empty() {
            println!("(existing content is identical)");
        } else {
            print!("{}", diff);
        }

        if !io::stdin().is_terminal() {
            tracing::warn!(path = %path.display(), "not a terminal, cannot confirm overwrite");
            return Ok(false);
        }

        let question = format!("Overwrite {}?", path.display());
        match inquire::Confirm::new(&question).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled) => Ok(false),
            Err(e) => Err(anyhow!("Confirmation prompt failed: {}", e)),
        }
    }
}

/// `--yes`: every overwrite is approved without asking.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm_overwrite(&mut self, path: &Path, _diff: &str) -> Result<bool> {
        tracing::info!(path = %path.display(), "overwriting without confirmation");
        Ok(true)
    }
}

enum Stage {
    Pending,
    Diffed { diff: String },
    Confirmed,
    Declined,
}

pub fn reconcile(unit: &MaterializedUnit, confirm: &mut dyn Confirm) -> Result<InstallDecision> {
    let mut stage = Stage::Pending;
    loop {
        stage = match stage {
            Stage::Pending => match read_existing(&unit.path)? {
                None => return Ok(InstallDecision::Write),
                Some(existing) => Stage::Diffed {
                    diff: diff::unified(
                        &existing,
                        &unit.content,
                        &unit.path.display().to_string(),
                        &format!("{} (new)", unit.filename),
                    ),
                },
            },
            Stage::Diffed { diff } => {
                if confirm.confirm_overwrite(&unit.path, &diff)? {
                    Stage::Confirmed
                } else {
                    Stage::Declined
                }
            }
            Stage::Confirmed => return Ok(InstallDecision::Write),
            Stage::Declined => {
                tracing::info!(path = %unit.path.display(), "overwrite declined");
                return Ok(InstallDecision::Skip);
            }
        };
    }
}

/// Non-UTF-8 bytes are replaced so a mangled file still gets a diff and a prompt.
fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read existing {}", path.display())),
    }
}
