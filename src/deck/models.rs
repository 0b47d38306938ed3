//! Deck model

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::notes::Note;
use crate::notetype::{Model, ModelSnapshot};

/// An ordered collection of notes plus snapshots of the note-types they use.
///
/// Snapshots are keyed by model id and captured once, at registration, so
/// later changes to a shared `Model` do not affect this deck.
#[derive(Debug, Clone)]
pub struct Deck {
    id: i64,
    name: String,
    description: String,
    notes: Vec<Note>,
    models: BTreeMap<i64, ModelSnapshot>,
}

impl Deck {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            notes: Vec::new(),
            models: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn models(&self) -> &BTreeMap<i64, ModelSnapshot> {
        &self.models
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Register a model explicitly; a model already registered keeps its
    /// first snapshot.
    pub fn add_model(&mut self, model: &Model) -> Result<()> {
        if let Entry::Vacant(slot) = self.models.entry(model.id()) {
            slot.insert(model.snapshot(self.id)?);
        }
        Ok(())
    }

    /// Register the model of every note
    pub(super) fn register_note_models(&mut self) -> Result<()> {
        for note in &self.notes {
            let model = note.model();
            if let Entry::Vacant(slot) = self.models.entry(model.id()) {
                slot.insert(model.snapshot(self.id)?);
            }
        }
        Ok(())
    }
}
