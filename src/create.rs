use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::{self, Config};
use crate::materialize;
use crate::reconcile::{AssumeYes, Confirm, Prompt};
use crate::request::{RawRequest, UnitRequest};
use crate::systemctl::Systemctl;
use crate::templates::TemplateStore;
use crate::{edit, install};

pub struct CreateOptions {
    pub request: RawRequest,
    pub template_dir: Option<PathBuf>,
    pub edit: bool,
    pub yes: bool,
    pub dry_run: bool,
}

pub fn run(opts: CreateOptions, config: &Config) -> Result<()> {
    // 1. Validate, filling gaps from the config file
    let mut raw = opts.request;
    if raw.scope.is_none() {
        raw.scope = config.scope;
    }
    if raw.description.is_none() {
        raw.description = config.description.clone();
    }
    let request = UnitRequest::from_raw(raw).context("Validation failed")?;

    // 2. Render units from the template
    let store = template_store(opts.template_dir, config);
    let install_dir = config::unit_dir(request.scope)?;
    let mut units = materialize::materialize(&request, &store, &install_dir)
        .with_context(|| format!("Rendering template '{}' failed", request.template_name))?;

    if opts.dry_run {
        for unit in units.units() {
            println!("# {}", unit.path.display());
            print!("{}", unit.content);
            println!();
        }
        return Ok(());
    }

    // 3. Optional manual edit
    if opts.edit {
        let editor = edit::resolve_editor(config.editor.as_deref());
        edit::run(&mut units, &editor).context("Editing failed")?;
    }

    // 4. Reconcile against disk and install
    let mut confirm: Box<dyn Confirm> = if opts.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Prompt)
    };
    let report = install::install(&request, &units, confirm.as_mut(), &mut Systemctl)
        .context("Installation failed")?;

    if !report.skipped.is_empty() {
        println!("Kept existing: {}", report.skipped.join(", "));
    }
    if !report.reloaded {
        println!("Nothing installed for '{}'.", request.name);
        return Ok(());
    }

    let ctl = install::systemctl_hint(request.scope);
    println!("Unit '{}' installed ({} scope).", request.name, request.scope.label());
    if units.timer.is_some() && !report.enabled {
        println!(
            "Hint: run `{} enable --now {}` to activate the timer.",
            ctl,
            request.timer_filename()
        );
    } else if units.timer.is_none() && !report.started {
        println!("Hint: run `{} start {}` to run it now.", ctl, request.service_filename());
    }

    Ok(())
}

/// `--template-dir`, then the config's `template_dir`, then
/// `~/.config/mkunit/templates`.
pub fn template_store(cli_dir: Option<PathBuf>, config: &Config) -> TemplateStore {
    let mut dirs: Vec<PathBuf> = Vec::new();
    dirs.extend(cli_dir);
    dirs.extend(config.template_dir.clone());
    if let Ok(default_dir) = config::default_template_dir() {
        dirs.push(default_dir);
    }
    TemplateStore::new(dirs)
}
