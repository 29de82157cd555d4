use anyhow::{Context, Result};

use crate::templates::TemplateStore;

pub fn run(store: &TemplateStore, json: bool) -> Result<()> {
    let templates = store.list();

    if json {
        let out = serde_json::to_string_pretty(&templates)
            .context("Failed to serialize template list")?;
        println!("{}", out);
        return Ok(());
    }

    let name_width = templates
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<width$}  TIMER  SOURCE", "NAME", width = name_width);
    for t in &templates {
        let timer = if t.has_timer { "yes" } else { "-" };
        let source = match &t.summary {
            Some(summary) => format!("{} ({})", t.source, summary),
            None => t.source.clone(),
        };
        println!("{:<width$}  {:<5}  {}", t.name, timer, source, width = name_width);
    }

    Ok(())
}
