use crate::models::RunResult;
use anyhow::Context;
use chrono::{Duration, NaiveDate};
use log::info;
use minijinja::{context, AutoEscape, Environment};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/dailystrips.html");

/// The template at `path`, or the bundled one.
pub fn load_template(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p)
            .with_context(|| format!("Unable to read template {}", p.display())),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

pub fn digest_filename(date: NaiveDate) -> String {
    format!("dailystrips-{}.html", date.format("%Y-%m-%d"))
}

/// Renders the digest page for a run.
///
/// Everything is escaped, `error_detail` included, so templates show it
/// verbatim inside a `<pre>` block.
pub fn render(result: &RunResult, template: &str) -> anyhow::Result<String> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    let tmpl = env
        .template_from_str(template)
        .context("Invalid digest template")?;

    let day = Duration::days(1);
    let html = tmpl
        .render(context! {
            comics => &result.comics,
            date => result.date.format("%Y-%m-%d").to_string(),
            day => day.num_seconds(),
            previous => (result.date - day).format("%Y-%m-%d").to_string(),
            next => (result.date + day).format("%Y-%m-%d").to_string(),
        })
        .context("Unable to render digest")?;
    Ok(html)
}

/// Writes `dailystrips-<date>.html` into `dir`, replacing any earlier digest
/// for the same day.
pub fn write_digest(dir: &Path, date: NaiveDate, html: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(digest_filename(date));
    fs::write(&path, html).with_context(|| format!("Unable to write {}", path.display()))?;
    info!("Wrote digest {}", path.display());
    Ok(path)
}

/// Renders the digest fully in memory, then writes it. A template that fails
/// to render leaves no page behind.
pub fn publish(result: &RunResult, template: &str, dir: &Path) -> anyhow::Result<PathBuf> {
    let html = render(result, template)?;
    write_digest(dir, result.date, &html)
}
