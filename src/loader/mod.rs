//! TOML Definition Loader
//!
//! Reads note-type and note definitions from TOML files:
//! - `[[models]]` tables describe note-types (fields, templates, css)
//! - `[[notes]]` tables reference a model by name and carry one key per field
//!
//! Field keys are the field name lower-cased with spaces replaced by `-`, so a
//! field named "Note ID" is read from the key `note-id`.
//!
//! `model`, `guid` and `tags` configure the note itself. A model with a field
//! whose key is one of these reads the same value, so a "Tags" field holds the
//! note's tag string.

mod collection;
mod models;

use std::path::PathBuf;

use thiserror::Error;

pub use collection::{field_key, Collection};
pub use models::{DefinitionFile, ModelDef, NoteDef};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Note {guid} references unknown model '{model}'")]
    UnknownModel { guid: String, model: String },

    #[error("Note {guid} is missing field '{key}'")]
    MissingField { guid: String, key: String },

    #[error("Note {guid} has a non-string value for field '{key}'")]
    FieldType { guid: String, key: String },

    #[error("Package error: {0}")]
    Apkg(#[from] crate::errors::ApkgError),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
