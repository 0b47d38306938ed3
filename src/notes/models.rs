//! Notes and the cards generated from them

use std::rc::Rc;

use once_cell::unsync::OnceCell;

use super::cloze::cloze_ordinals;
use super::guid::guid_for_fields;
use crate::errors::{ApkgError, Result};
use crate::notetype::{Model, ModelType};

/// Separator between field values in the collection's `flds` column
pub const FIELD_SEPARATOR: char = '\x1f';

/// A single generated card: a template (or cloze group) ordinal of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    ord: usize,
}

impl Card {
    pub fn new(ord: usize) -> Self {
        Self { ord }
    }

    pub fn ord(&self) -> usize {
        self.ord
    }
}

/// Field values bound to a note-type.
///
/// The GUID and card list are derived on first access and never change
/// afterwards. Field values must not be changed once either has been read.
#[derive(Debug, Clone)]
pub struct Note {
    model: Rc<Model>,
    fields: Vec<String>,
    sort_field: Option<String>,
    tags: String,
    guid: OnceCell<String>,
    cards: OnceCell<Vec<Card>>,
}

impl Note {
    /// Create a note; `fields` must have one value per model field, in field order.
    pub fn new(model: Rc<Model>, fields: Vec<String>) -> Result<Self> {
        let expected = model.fields().len();
        if fields.len() != expected {
            return Err(ApkgError::FieldCount {
                model_id: model.id(),
                expected,
                actual: fields.len(),
            });
        }

        Ok(Self {
            model,
            fields,
            sort_field: None,
            tags: String::new(),
            guid: OnceCell::new(),
            cards: OnceCell::new(),
        })
    }

    /// Use a caller-supplied GUID; an empty string keeps the derived one
    pub fn with_guid(self, guid: impl Into<String>) -> Self {
        let guid = guid.into();
        if guid.is_empty() {
            return self;
        }
        Self {
            guid: OnceCell::with_value(guid),
            ..self
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Override the sort-field value; an empty string keeps the default
    pub fn with_sort_field(mut self, sort_field: impl Into<String>) -> Self {
        let sort_field = sort_field.into();
        self.sort_field = (!sort_field.is_empty()).then_some(sort_field);
        self
    }

    pub fn model(&self) -> &Rc<Model> {
        &self.model
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// The supplied GUID, or one derived from the field values
    pub fn guid(&self) -> &str {
        self.guid.get_or_init(|| guid_for_fields(&self.fields))
    }

    /// Explicit sort-field value, falling back to the first field
    pub fn sort_field(&self) -> &str {
        match &self.sort_field {
            Some(value) => value,
            None => self.fields.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Append a tag, space-separated
    pub fn add_tag(&mut self, tag: &str) {
        self.tags.push(' ');
        self.tags.push_str(tag);
    }

    /// Tags as stored in the collection: trimmed and padded with one space
    /// on each side
    pub fn formatted_tags(&self) -> String {
        format!(" {} ", self.tags.trim())
    }

    /// Field values joined for the collection's `flds` column
    pub fn formatted_fields(&self) -> String {
        self.fields.join(&FIELD_SEPARATOR.to_string())
    }

    /// Cards this note generates, computed once.
    ///
    /// Standard notes get one card per satisfied required rule, in template
    /// order. Cloze notes get one card per cloze group, ascending. Fails if
    /// the model's required rules cannot be inferred.
    pub fn cards(&self) -> Result<&[Card]> {
        if let Some(cards) = self.cards.get() {
            return Ok(cards);
        }

        let cards: Vec<Card> = match self.model.model_type() {
            ModelType::Standard => self
                .model
                .required_rules()?
                .iter()
                .filter(|rule| rule.is_satisfied_by(&self.fields))
                .map(|rule| Card::new(rule.template_ord))
                .collect(),
            ModelType::Cloze => cloze_ordinals(&self.model, &self.fields)
                .into_iter()
                .map(Card::new)
                .collect(),
        };

        Ok(self.cards.get_or_init(|| cards))
    }
}
