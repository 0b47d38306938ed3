//! Raw definition records as they appear in TOML files

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::notetype::{Field, Model, ModelType, Template};

/// One parsed definition file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionFile {
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub notes: Vec<NoteDef>,
}

/// A `[[models]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDef {
    pub id: i64,
    pub name: String,
    /// `0` standard, `1` cloze
    #[serde(rename = "type", default)]
    pub model_type: i64,
    #[serde(default)]
    pub css: String,
    /// Modification time in epoch ms; `0` means "now"
    #[serde(rename = "mod", default)]
    pub modified: i64,
    #[serde(default)]
    pub flds: Vec<Field>,
    #[serde(default)]
    pub tmpls: Vec<Template>,
}

impl ModelDef {
    /// Build the model, ordering fields and templates by their `ord` keys
    pub fn to_model(&self) -> Model {
        let mut fields = self.flds.clone();
        fields.sort_by_key(|f| f.ord);
        let mut templates = self.tmpls.clone();
        templates.sort_by_key(|t| t.ord);

        let model_type = if self.model_type == 1 {
            ModelType::Cloze
        } else {
            ModelType::Standard
        };

        Model::new(self.id, self.name.clone(), fields, templates)
            .with_css(self.css.clone())
            .with_type(model_type)
            .with_modified(self.modified)
    }
}

/// A `[[notes]]` table.
///
/// `model` names the note-type, `guid` and `tags` are optional. Every key,
/// including those three, stays in `values`, so a model may also have fields
/// named "Model", "Guid" or "Tags".
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "BTreeMap<String, toml::Value>")]
pub struct NoteDef {
    pub model: String,
    pub guid: String,
    pub tags: String,
    pub values: BTreeMap<String, toml::Value>,
}

impl TryFrom<BTreeMap<String, toml::Value>> for NoteDef {
    type Error = String;

    fn try_from(values: BTreeMap<String, toml::Value>) -> Result<Self, Self::Error> {
        let text = |key: &str| match values.get(key) {
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(format!("note key `{}` must be a string", key)),
            None => Ok(None),
        };

        let model = text("model")?.ok_or_else(|| "note is missing `model`".to_string())?;
        let guid = text("guid")?.unwrap_or_default();
        let tags = text("tags")?.unwrap_or_default();

        Ok(Self {
            model,
            guid,
            tags,
            values,
        })
    }
}
