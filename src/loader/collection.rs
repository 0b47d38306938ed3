//! Merged models and notes from one or more definition files

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use super::models::{DefinitionFile, NoteDef};
use super::{LoaderError, Result};
use crate::deck::Deck;
use crate::notes::Note;
use crate::notetype::Model;

/// Key under which a note table carries the value of field `name`
pub fn field_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone)]
struct LoadedModel {
    model: Rc<Model>,
    keys: Vec<String>,
}

/// Models keyed by name and notes keyed by guid
#[derive(Debug, Clone, Default)]
pub struct Collection {
    models: BTreeMap<String, LoadedModel>,
    notes: BTreeMap<String, Note>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single TOML document
    pub fn parse(source: &str) -> Result<Self> {
        Self::from_sources([("<string>".to_string(), source.to_string())])
    }

    /// Read and merge definition files from disk
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let text = fs::read_to_string(path).map_err(|source| LoaderError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            sources.push((path.display().to_string(), text));
        }
        Self::from_sources(sources)
    }

    /// Merge `(origin, contents)` documents.
    ///
    /// All models are registered before any note is read, so a note may
    /// reference a model defined in a different document.
    pub fn from_sources(sources: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut files = Vec::new();
        for (origin, text) in sources {
            let file: DefinitionFile =
                toml::from_str(&text).map_err(|source| LoaderError::Parse { origin, source })?;
            files.push(file);
        }

        let mut collection = Self::new();
        for def in files.iter().flat_map(|f| &f.models) {
            let model = def.to_model();
            let keys = model.fields().iter().map(|f| field_key(&f.name)).collect();
            if collection.models.contains_key(&def.name) {
                log::warn!("Model '{}' defined more than once; keeping the last", def.name);
            }
            collection.models.insert(
                def.name.clone(),
                LoadedModel {
                    model: Rc::new(model),
                    keys,
                },
            );
        }
        for def in files.iter().flat_map(|f| &f.notes) {
            collection.insert_note(def)?;
        }

        log::info!(
            "Loaded {} models and {} notes",
            collection.models.len(),
            collection.notes.len()
        );
        Ok(collection)
    }

    fn insert_note(&mut self, def: &NoteDef) -> Result<()> {
        let loaded = self
            .models
            .get(&def.model)
            .ok_or_else(|| LoaderError::UnknownModel {
                guid: def.guid.clone(),
                model: def.model.clone(),
            })?;

        let mut values = Vec::with_capacity(loaded.keys.len());
        for key in &loaded.keys {
            let value = match def.values.get(key) {
                Some(toml::Value::String(s)) => s.clone(),
                Some(toml::Value::Integer(n)) if key == "note-id" => n.to_string(),
                Some(_) => {
                    return Err(LoaderError::FieldType {
                        guid: def.guid.clone(),
                        key: key.clone(),
                    })
                }
                None => {
                    return Err(LoaderError::MissingField {
                        guid: def.guid.clone(),
                        key: key.clone(),
                    })
                }
            };
            values.push(value);
        }

        let note = Note::new(Rc::clone(&loaded.model), values)?
            .with_guid(def.guid.clone())
            .with_tags(def.tags.clone());
        let guid = note.guid().to_string();
        if self.notes.insert(guid.clone(), note).is_some() {
            log::warn!("Note {} defined more than once; keeping the last", guid);
        }
        Ok(())
    }

    pub fn model(&self, name: &str) -> Option<&Rc<Model>> {
        self.models.get(name).map(|m| &m.model)
    }

    pub fn note(&self, guid: &str) -> Option<&Note> {
        self.notes.get(guid)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes whose guid does not appear in `other`
    pub fn minus(&self, other: &Collection) -> Collection {
        let notes = self
            .notes
            .iter()
            .filter(|(guid, _)| !other.notes.contains_key(*guid))
            .map(|(guid, note)| (guid.clone(), note.clone()))
            .collect();
        Collection {
            models: self.models.clone(),
            notes,
        }
    }

    pub fn tag_all(&mut self, tag: &str) {
        for note in self.notes.values_mut() {
            note.add_tag(tag);
        }
    }

    /// Move every note into `deck`, in guid order
    pub fn add_to_deck(self, deck: &mut Deck) {
        for note in self.notes.into_values() {
            deck.add_note(note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notetype::ModelType;
    use tempfile::TempDir;

    const MODELS: &str = r#"
[[models]]
id = 1494703373
name = "Vocab"
type = 0
css = ""
mod = 0
flds = [
  { name = "Note ID", ord = 0, sticky = false, rtl = false, font = "Arial", size = 20 },
  { name = "Front Side", ord = 1, sticky = false, rtl = false, font = "Arial", size = 20 },
  { name = "Back", ord = 2, sticky = false, rtl = false, font = "Arial", size = 20 },
]
tmpls = [{ name = "Card 1", ord = 0, qfmt = "{{Front Side}}", afmt = "{{Back}}", bqfmt = "", bafmt = "" }]
"#;

    const NOTES: &str = r#"
[[notes]]
model = "Vocab"
guid = "n1"
tags = "lang"
note-id = 17
front-side = "hola"
back = "hello"

[[notes]]
model = "Vocab"
guid = "n2"
tags = ""
note-id = "18"
front-side = "adios"
back = "bye"
"#;

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("Note ID"), "note-id");
        assert_eq!(field_key("Front Side Extra"), "front-side-extra");
        assert_eq!(field_key("Back"), "back");
    }

    #[test]
    fn test_load_single_document() {
        let collection = Collection::parse(&format!("{}{}", MODELS, NOTES)).unwrap();
        assert_eq!(collection.len(), 2);

        let note = collection.note("n1").unwrap();
        assert_eq!(note.fields(), &["17", "hola", "hello"]);
        assert_eq!(note.sort_field(), "17");
        assert_eq!(note.tags(), "lang");
        assert_eq!(collection.model("Vocab").unwrap().model_type(), ModelType::Standard);
    }

    #[test]
    fn test_notes_may_reference_models_in_other_files() {
        let temp = TempDir::new().unwrap();
        let notes = temp.path().join("a_notes.toml");
        let models = temp.path().join("b_models.toml");
        std::fs::write(&notes, NOTES).unwrap();
        std::fs::write(&models, MODELS).unwrap();

        let collection = Collection::from_files(&[notes, models]).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_unknown_model() {
        let err = Collection::parse(NOTES).unwrap_err();
        assert!(matches!(err, LoaderError::UnknownModel { .. }));
    }

    #[test]
    fn test_missing_field() {
        let source = format!(
            "{}\n[[notes]]\nmodel = \"Vocab\"\nguid = \"x\"\nnote-id = 1\nback = \"b\"\n",
            MODELS
        );
        let err = Collection::parse(&source).unwrap_err();
        match err {
            LoaderError::MissingField { key, .. } => assert_eq!(key, "front-side"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_integer_only_for_note_id() {
        let source = format!(
            "{}\n[[notes]]\nmodel = \"Vocab\"\nguid = \"x\"\nnote-id = 1\nfront-side = 2\nback = \"b\"\n",
            MODELS
        );
        let err = Collection::parse(&source).unwrap_err();
        assert!(matches!(err, LoaderError::FieldType { .. }));
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = Collection::from_sources([("broken.toml".to_string(), "[[models]\n".to_string())])
            .unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_minus_and_tag() {
        let base = Collection::parse(&format!("{}{}", MODELS, NOTES)).unwrap();
        let release = Collection::parse(&format!(
            "{}\n[[notes]]\nmodel = \"Vocab\"\nguid = \"n2\"\nnote-id = 18\nfront-side = \"adios\"\nback = \"bye\"\n",
            MODELS
        ))
        .unwrap();

        let mut removed = base.minus(&release);
        assert_eq!(removed.len(), 1);
        removed.tag_all("removed");
        assert_eq!(removed.note("n1").unwrap().formatted_tags(), " lang removed ");

        let mut deck = Deck::new(123456, "Generated", "Generated");
        release.add_to_deck(&mut deck);
        removed.add_to_deck(&mut deck);
        let guids: Vec<&str> = deck.notes().iter().map(|n| n.guid()).collect();
        assert_eq!(guids, vec!["n2", "n1"]);
    }

    #[test]
    fn test_missing_guid_is_derived() {
        let source = format!(
            "{}\n[[notes]]\nmodel = \"Vocab\"\nnote-id = 1\nfront-side = \"a\"\nback = \"b\"\n",
            MODELS
        );
        let collection = Collection::parse(&source).unwrap();
        let note = collection.notes().next().unwrap();
        assert!(!note.guid().is_empty());
    }

    #[test]
    fn test_field_named_like_a_note_key() {
        let definitions = r#"
[[models]]
id = 9
name = "Atlas"
flds = [{ name = "Place" }, { name = "Tags" }]
tmpls = [{ name = "Card 1", qfmt = "{{Place}}", afmt = "{{Tags}}" }]

[[notes]]
model = "Atlas"
guid = "a1"
place = "Lima"
tags = "geo"
"#;
        let collection = Collection::parse(definitions).unwrap();
        let note = collection.note("a1").unwrap();
        assert_eq!(note.fields(), &["Lima", "geo"]);
        assert_eq!(note.tags(), "geo");
    }
}
