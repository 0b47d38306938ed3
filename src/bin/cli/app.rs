use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ankigen_lib::package::MediaFetcher;
use ankigen_lib::{load_config, Deck, GeneratorConfig, Package};

/// Values given on the command line, applied over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub deck_id: Option<i64>,
    pub deck_name: Option<String>,
    pub deck_description: Option<String>,
}

/// Shared application state for CLI commands
pub struct App {
    pub config: GeneratorConfig,
}

impl App {
    pub fn new(config_path: &Path, overrides: Overrides) -> Result<Self> {
        let mut config = load_config(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        if let Some(output) = overrides.output {
            config.output = output;
        }
        if let Some(id) = overrides.deck_id {
            config.deck_id = id;
        }
        if let Some(name) = overrides.deck_name {
            config.deck_name = name;
        }
        if let Some(desc) = overrides.deck_description {
            config.deck_description = desc;
        }

        Ok(Self { config })
    }

    /// An empty deck with the configured id, name and description
    pub fn new_deck(&self) -> Deck {
        Deck::new(
            self.config.deck_id,
            self.config.deck_name.clone(),
            self.config.deck_description.clone(),
        )
    }

    /// Write `deck` to the configured output path
    pub fn write_package(&self, deck: Deck, media: Option<&mut dyn MediaFetcher>) -> Result<()> {
        let mut package = Package::new(vec![deck]);
        package
            .write_to_file(&self.config.output, media)
            .with_context(|| format!("Failed to write package {}", self.config.output.display()))
    }
}
