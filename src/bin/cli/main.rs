mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use app::Overrides;

#[derive(Parser)]
#[command(name = "ankigen-cli", about = "Generate Anki packages from TOML definitions", version)]
struct Cli {
    /// Config file (default: ankigen.toml in the current directory)
    #[arg(long, global = true, default_value = "ankigen.toml")]
    config: PathBuf,

    /// Destination .apkg file
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Id of the generated deck
    #[arg(long, global = true)]
    deck_id: Option<i64>,

    /// Name of the generated deck
    #[arg(long, global = true)]
    deck_name: Option<String>,

    /// Description of the generated deck
    #[arg(long, global = true)]
    deck_desc: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build a package from definition files
    Build {
        /// TOML files with [[models]] and [[notes]] tables
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Media file to include, as NAME=PATH (repeatable)
        #[arg(long = "media", value_parser = parse_media)]
        media: Vec<(String, PathBuf)>,
    },

    /// Build a package from a git revision, tagging notes removed since a base revision
    Diff {
        /// Repository directory
        #[arg(long, short = 'd')]
        repo: PathBuf,
        /// Base revision
        #[arg(long, short)]
        base: String,
        /// Release revision
        #[arg(long, short, default_value = "HEAD")]
        rel: String,
        /// Directory inside the repository holding definition files
        #[arg(long)]
        data_dir: Option<String>,
    },
}

/// Parse a NAME=PATH media argument
fn parse_media(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", arg)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let overrides = Overrides {
        output: cli.output,
        deck_id: cli.deck_id,
        deck_name: cli.deck_name,
        deck_description: cli.deck_desc,
    };

    match cli.command {
        Command::Build { files, media } => {
            let app = app::App::new(&cli.config, overrides)?;
            commands::build::run(&app, &files, media, &cli.format)?;
        }
        Command::Diff { repo, base, rel, data_dir } => {
            let mut app = app::App::new(&cli.config, overrides)?;
            if let Some(dir) = data_dir {
                app.config.data_dir = dir;
            }
            commands::diff::run(&app, &repo, &base, &rel, &cli.format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media() {
        assert_eq!(
            parse_media("a.mp3=/tmp/a.mp3").unwrap(),
            ("a.mp3".to_string(), PathBuf::from("/tmp/a.mp3"))
        );
        assert!(parse_media("a.mp3").is_err());
        assert!(parse_media("=x").is_err());
    }

    #[test]
    fn test_cli_parses_diff() {
        let cli = Cli::try_parse_from([
            "ankigen-cli",
            "diff",
            "--repo",
            "/tmp/repo",
            "--base",
            "v1",
            "--deck-id",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.deck_id, Some(7));
        match cli.command {
            Command::Diff { base, rel, .. } => {
                assert_eq!(base, "v1");
                assert_eq!(rel, "HEAD");
            }
            Command::Build { .. } => panic!("expected diff"),
        }
    }
}
