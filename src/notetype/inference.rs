//! Required-field inference and cloze-field discovery
//!
//! Both work purely from a model's fields and templates; results are cached
//! by `Model`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{Field, Quantifier, RequiredRule, Template};
use crate::errors::{ApkgError, Result};
use crate::template::TemplateRenderer;

const SENTINEL: &str = "SeNtInEl";

static TEMPLATE_CLOZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^}]*?cloze:(?:[^}]?:)*(.+?)\}\}").unwrap());

static LEGACY_CLOZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<%cloze:(.+?)%>").unwrap());

/// Compute one required rule per template.
///
/// A field belongs to an "all" rule when clearing it alone (with every other
/// field set) removes all field content from the question. When no field
/// qualifies, a field belongs to an "any" rule when setting it alone (with
/// every other field empty) produces field content.
pub(super) fn infer_required(
    fields: &[Field],
    templates: &[Template],
    renderer: &dyn TemplateRenderer,
) -> Result<Vec<RequiredRule>> {
    let mut sentinel_map: HashMap<String, String> = fields
        .iter()
        .map(|f| (f.name.clone(), SENTINEL.to_string()))
        .collect();
    let mut empty_map: HashMap<String, String> = fields
        .iter()
        .map(|f| (f.name.clone(), String::new()))
        .collect();

    let mut rules = Vec::with_capacity(templates.len());

    for (template_ord, template) in templates.iter().enumerate() {
        let mut field_ords = Vec::new();

        // A question that shows no field content even with every field set
        // cannot have an "all" dependency.
        let baseline = renderer.render(&template.qfmt, &sentinel_map)?;
        let all_fields: &[Field] = if baseline.contains(SENTINEL) { fields } else { &[] };

        for (field_ord, field) in all_fields.iter().enumerate() {
            set_value(&mut sentinel_map, &field.name, "");
            let rendered = renderer.render(&template.qfmt, &sentinel_map)?;
            set_value(&mut sentinel_map, &field.name, SENTINEL);

            if !rendered.contains(SENTINEL) {
                field_ords.push(field_ord);
            }
        }

        if !field_ords.is_empty() {
            rules.push(RequiredRule {
                template_ord,
                quantifier: Quantifier::All,
                field_ords,
            });
            continue;
        }

        for (field_ord, field) in fields.iter().enumerate() {
            set_value(&mut empty_map, &field.name, SENTINEL);
            let rendered = renderer.render(&template.qfmt, &empty_map)?;
            set_value(&mut empty_map, &field.name, "");

            if rendered.contains(SENTINEL) {
                field_ords.push(field_ord);
            }
        }

        if field_ords.is_empty() {
            return Err(ApkgError::RequiredFields {
                qfmt: template.qfmt.clone(),
            });
        }

        rules.push(RequiredRule {
            template_ord,
            quantifier: Quantifier::Any,
            field_ords,
        });
    }

    Ok(rules)
}

fn set_value(map: &mut HashMap<String, String>, name: &str, value: &str) {
    if let Some(slot) = map.get_mut(name) {
        slot.clear();
        slot.push_str(value);
    }
}

/// Field names referenced by `{{cloze:Name}}` or `<%cloze:Name%>` tags in
/// `qfmt`, restricted to fields the model actually has.
pub(super) fn find_cloze_fields(qfmt: &str, field_index: &HashMap<String, usize>) -> Vec<String> {
    TEMPLATE_CLOZE_RE
        .captures_iter(qfmt)
        .chain(LEGACY_CLOZE_RE.captures_iter(qfmt))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| field_index.contains_key(*name))
        .map(str::to_string)
        .collect()
}
