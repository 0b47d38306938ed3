//! Note-types (models) for generated decks
//!
//! This module provides:
//! - Field and card template definitions
//! - Required-field inference for standard note-types
//! - Cloze-field discovery for cloze note-types
//! - JSON snapshots embedded in the collection

mod inference;
pub mod models;

pub use models::*;
