//! Cloze group discovery in note field values

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::notetype::Model;

static FIELD_CLOZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{c(\d+)::.+?\}\}").unwrap());

/// Zero-based card ordinals for the cloze groups present in a note.
///
/// Scans the values of the model's cloze fields for `{{cN::...}}` markers.
/// Group numbers that are zero or do not parse are skipped. The result is
/// deduplicated and sorted ascending.
pub fn cloze_ordinals(model: &Model, values: &[String]) -> Vec<usize> {
    let mut ords = BTreeSet::new();

    for name in model.cloze_fields() {
        let Some(value) = model
            .field_by_name(name)
            .and_then(|field| values.get(field.ord))
        else {
            continue;
        };

        for caps in FIELD_CLOZE_RE.captures_iter(value) {
            match caps[1].parse::<usize>() {
                Ok(group) if group > 0 => {
                    ords.insert(group - 1);
                }
                _ => log::warn!("Skipping cloze marker with invalid group '{}'", &caps[1]),
            }
        }
    }

    ords.into_iter().collect()
}
