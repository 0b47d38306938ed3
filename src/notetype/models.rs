//! Data models for note-types

use std::collections::HashMap;

use chrono::Utc;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize, Serializer};

use super::inference::{find_cloze_fields, infer_required};
use crate::errors::Result;
use crate::template::{FieldRenderer, TemplateRenderer};

pub const DEFAULT_LATEX_PRE: &str = r"\documentclass[12pt]{article}
\special{papersize=3in,5in}
\usepackage{amssymb,amsmath}
\pagestyle{empty}
\setlength{\parindent}{0in}
\begin{document}
";

pub const DEFAULT_LATEX_POST: &str = r"\end{document}";

fn default_font() -> String {
    "Helvetica".to_string()
}

fn default_size() -> u32 {
    20
}

/// A field definition within a note-type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Position in the model's field list, assigned by `Model::new`
    #[serde(default)]
    pub ord: usize,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub rtl: bool,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub media: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ord: 0,
            sticky: false,
            rtl: false,
            font: default_font(),
            size: default_size(),
            media: Vec::new(),
        }
    }
}

/// Build default fields from a list of names
pub fn make_fields(names: &[&str]) -> Vec<Field> {
    names.iter().map(|name| Field::new(*name)).collect()
}

/// A card template: one question/answer format pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Position in the model's template list, assigned by `Model::new`
    #[serde(default)]
    pub ord: usize,
    pub qfmt: String,
    pub afmt: String,
    /// Deck override for cards generated from this template
    #[serde(default)]
    pub did: Option<i64>,
    #[serde(default)]
    pub bqfmt: String,
    #[serde(default)]
    pub bafmt: String,
}

impl Template {
    pub fn new(name: impl Into<String>, qfmt: impl Into<String>, afmt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ord: 0,
            qfmt: qfmt.into(),
            afmt: afmt.into(),
            did: None,
            bqfmt: String::new(),
            bafmt: String::new(),
        }
    }
}

/// How a required rule combines its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    /// Every listed field must be non-empty
    All,
    /// At least one listed field must be non-empty
    Any,
}

/// Which fields a template needs in order to produce a card.
///
/// Serializes as `[template_ord, "all"|"any", [field_ords...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredRule {
    pub template_ord: usize,
    pub quantifier: Quantifier,
    pub field_ords: Vec<usize>,
}

impl RequiredRule {
    /// Check the rule against a note's positional field values
    pub fn is_satisfied_by(&self, values: &[String]) -> bool {
        let present = |ord: &usize| values.get(*ord).map_or(false, |v| !v.is_empty());
        match self.quantifier {
            Quantifier::All => self.field_ords.iter().all(present),
            Quantifier::Any => self.field_ords.iter().any(present),
        }
    }
}

impl Serialize for RequiredRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.template_ord, self.quantifier, &self.field_ords).serialize(serializer)
    }
}

/// Card generation mode of a note-type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// One card per template whose required rule is satisfied
    #[default]
    Standard,
    /// One card per cloze group found in the note's cloze fields
    Cloze,
}

impl Serialize for ModelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            ModelType::Standard => 0,
            ModelType::Cloze => 1,
        })
    }
}

/// Optional overrides applied at model construction
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub sort_field: usize,
    pub latex_pre: Option<String>,
    pub latex_post: Option<String>,
    pub usn: i64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            sort_field: 0,
            latex_pre: None,
            latex_post: None,
            usn: -1,
        }
    }
}

/// A note-type: ordered fields, ordered card templates and a generation mode.
///
/// The id must stay stable across regenerations so that the importing
/// application recognizes the same note-type. Required rules and cloze fields
/// are derived lazily and memoized in the model itself.
#[derive(Debug)]
pub struct Model {
    id: i64,
    name: String,
    sort_field: usize,
    latex_pre: String,
    latex_post: String,
    modified: i64,
    usn: i64,
    model_type: ModelType,
    css: String,
    fields: Vec<Field>,
    templates: Vec<Template>,
    field_index: HashMap<String, usize>,
    renderer: Box<dyn TemplateRenderer>,
    required: OnceCell<Vec<RequiredRule>>,
    cloze_fields: OnceCell<Vec<String>>,
}

impl Model {
    pub fn new(id: i64, name: impl Into<String>, mut fields: Vec<Field>, mut templates: Vec<Template>) -> Self {
        for (ord, field) in fields.iter_mut().enumerate() {
            field.ord = ord;
        }
        for (ord, template) in templates.iter_mut().enumerate() {
            template.ord = ord;
        }
        let field_index = fields
            .iter()
            .map(|f| (f.name.clone(), f.ord))
            .collect();

        Self {
            id,
            name: name.into(),
            sort_field: 0,
            latex_pre: DEFAULT_LATEX_PRE.to_string(),
            latex_post: DEFAULT_LATEX_POST.to_string(),
            modified: Utc::now().timestamp_millis(),
            usn: -1,
            model_type: ModelType::Standard,
            css: String::new(),
            fields,
            templates,
            field_index,
            renderer: Box::new(FieldRenderer),
            required: OnceCell::new(),
            cloze_fields: OnceCell::new(),
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    pub fn with_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    /// Set the modification time in epoch milliseconds; `0` keeps "now"
    pub fn with_modified(mut self, modified: i64) -> Self {
        if modified != 0 {
            self.modified = modified;
        }
        self
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.sort_field = options.sort_field;
        self.usn = options.usn;
        if let Some(pre) = options.latex_pre.filter(|s| !s.is_empty()) {
            self.latex_pre = pre;
        }
        if let Some(post) = options.latex_post.filter(|s| !s.is_empty()) {
            self.latex_post = post;
        }
        self
    }

    /// Replace the renderer used for required-field inference
    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self.required = OnceCell::new();
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.field_index.get(name).map(|&ord| &self.fields[ord])
    }

    /// Required rules, one per template in template order.
    ///
    /// Computed on first call and cached; a failed computation is not cached
    /// and fails again on the next call.
    pub fn required_rules(&self) -> Result<&[RequiredRule]> {
        if let Some(rules) = self.required.get() {
            return Ok(rules);
        }
        let rules = infer_required(&self.fields, &self.templates, self.renderer.as_ref())?;
        log::debug!("Inferred {} required rules for model {} ({})", rules.len(), self.name, self.id);
        Ok(self.required.get_or_init(|| rules))
    }

    /// The memoized required rules, if already computed
    pub fn cached_required_rules(&self) -> Option<&[RequiredRule]> {
        self.required.get().map(Vec::as_slice)
    }

    /// Names of the fields referenced by cloze tags in the first template's
    /// question format. Only the first template is inspected.
    pub fn cloze_fields(&self) -> &[String] {
        self.cloze_fields.get_or_init(|| match self.templates.first() {
            Some(template) => find_cloze_fields(&template.qfmt, &self.field_index),
            None => Vec::new(),
        })
    }

    /// Capture the JSON-ready state of this model for a deck.
    ///
    /// Standard models resolve their required rules first; cloze models carry
    /// no rules.
    pub fn snapshot(&self, deck_id: i64) -> Result<ModelSnapshot> {
        let req = match self.model_type {
            ModelType::Standard => self.required_rules()?.to_vec(),
            ModelType::Cloze => Vec::new(),
        };

        Ok(ModelSnapshot {
            id: self.id,
            name: self.name.clone(),
            sort_field: self.sort_field,
            did: deck_id,
            latex_pre: self.latex_pre.clone(),
            latex_post: self.latex_post.clone(),
            req,
            modified: self.modified,
            usn: self.usn,
            model_type: self.model_type,
            css: self.css.clone(),
            fields: self.fields.clone(),
            templates: self.templates.clone(),
            vers: Vec::new(),
        })
    }
}

/// Immutable copy of a model as embedded in a deck's collection row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub id: i64,
    pub name: String,
    #[serde(rename = "sortf")]
    pub sort_field: usize,
    pub did: i64,
    #[serde(rename = "latexPre")]
    pub latex_pre: String,
    #[serde(rename = "latexPost")]
    pub latex_post: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub req: Vec<RequiredRule>,
    #[serde(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub css: String,
    #[serde(rename = "flds")]
    pub fields: Vec<Field>,
    #[serde(rename = "tmpls")]
    pub templates: Vec<Template>,
    pub vers: Vec<i64>,
}
