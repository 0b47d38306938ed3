//! Notes, cards and GUIDs
//!
//! A note holds positional field values for a note-type and materializes its
//! cards lazily:
//! - standard note-types: one card per template whose required rule holds
//! - cloze note-types: one card per `{{cN::...}}` group

pub mod cloze;
pub mod guid;
mod models;

pub use guid::{generate_guid, guid_for_fields};
pub use models::*;
