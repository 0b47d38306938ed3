//! Generate Anki `.apkg` packages from note-type and note definitions.
//!
//! The pipeline runs bottom-up: a [`Model`] defines fields and card templates,
//! [`Note`]s hold field values and derive their cards, a [`Deck`] serializes
//! notes into the collection database and a [`Package`] assembles the final
//! archive with optional media.

pub mod config;
pub mod deck;
pub mod errors;
pub mod git;
pub mod loader;
pub mod notes;
pub mod notetype;
pub mod package;
pub mod template;

pub use config::{load_config, GeneratorConfig};
pub use deck::Deck;
pub use errors::{ApkgError, Result};
pub use loader::Collection;
pub use notes::{Card, Note};
pub use notetype::{Field, Model, ModelOptions, ModelType, Template};
pub use package::{MediaFetcher, MediaMap, Package};
pub use template::{FieldRenderer, TemplateRenderer};
