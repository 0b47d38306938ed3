use std::path::Path;

use anyhow::{Context, Result};

use ankigen_lib::git::diff_revisions;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, repo: &Path, base: &str, release: &str, format: &OutputFormat) -> Result<()> {
    let config = &app.config;
    let diff = diff_revisions(repo, base, release, &config.data_dir, &config.removed_tag)
        .with_context(|| format!("Failed to compare {} with {} in {}", base, release, repo.display()))?;

    let kept = diff.release.len();
    let removed = diff.removed.len();
    let deck = diff.into_deck(app.new_deck());
    app.write_package(deck, None)?;

    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "output": config.output.to_string_lossy(),
                "base": base,
                "release": release,
                "notes": kept,
                "removed": removed,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Plain => {
            println!(
                "Wrote {} ({} notes, {} tagged '{}')",
                config.output.display(),
                kept,
                removed,
                config.removed_tag
            );
        }
    }
    Ok(())
}
