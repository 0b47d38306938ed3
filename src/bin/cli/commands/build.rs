use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ankigen_lib::{Collection, MediaMap};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, files: &[PathBuf], media: Vec<(String, PathBuf)>, format: &OutputFormat) -> Result<()> {
    let collection = Collection::from_files(files).context("Failed to load definition files")?;
    let note_count = collection.len();

    let mut deck = app.new_deck();
    collection.add_to_deck(&mut deck);

    let media_count = media.len();
    if media_count == 0 {
        app.write_package(deck, None)?;
    } else {
        let mut fetcher = MediaMap::from_sources(media, Vec::new());
        app.write_package(deck, Some(&mut fetcher))?;
    }

    print_summary(&app.config.output, note_count, media_count, format)
}

fn print_summary(output: &Path, notes: usize, media: usize, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "output": output.to_string_lossy(),
                "notes": notes,
                "media": media,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Plain => {
            println!("Wrote {} ({} notes, {} media files)", output.display(), notes, media);
        }
    }
    Ok(())
}
