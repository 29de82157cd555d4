use std::fs;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::error::MkunitError;
use crate::materialize::Materialized;

/// `config.editor`, then $VISUAL, then $EDITOR, then vi.
pub fn resolve_editor(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("VISUAL").ok().filter(|v| !v.is_empty()))
        .or_else(|| std::env::var("EDITOR").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "vi".to_string())
}

/// Write every unit into a scratch directory, open them all in one editor
/// session, and read the results back. The scratch directory is removed when
/// this returns, whatever the outcome.
pub fn run(units: &mut Materialized, editor: &str) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("mkunit-")
        .tempdir()
        .context("Failed to create scratch directory")?;

    let mut paths = Vec::new();
    for unit in units.units() {
        let path = scratch.path().join(&unit.filename);
        fs::write(&path, &unit.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        paths.push(path);
    }

    // The editor setting may carry arguments, e.g. "code --wait".
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    tracing::debug!(editor, "opening editor");

    let status = Command::new(program)
        .args(parts)
        .args(&paths)
        .status()
        .with_context(|| format!("Failed to open editor '{}'", editor))?;
    if !status.success() {
        bail!("Editor exited with non-zero status");
    }

    for (unit, path) in units.units_mut().zip(&paths) {
        let edited = fs::read_to_string(path)
            .with_context(|| format!("Failed to read back {}", path.display()))?;
        if edited.trim().is_empty() {
            return Err(MkunitError::render(&unit.filename, "file is empty after editing").into());
        }
        unit.content = edited;
    }

    Ok(())
}
