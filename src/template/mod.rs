//! Card template rendering
//!
//! Card templates use the mustache-style syntax of the target application:
//! - `{{Field}}` substitutes a field value (HTML-escaped)
//! - `{{{Field}}}` / `{{&Field}}` substitute without escaping
//! - `{{#Field}}..{{/Field}}` renders only when the field is non-empty
//! - `{{^Field}}..{{/Field}}` renders only when the field is empty
//!
//! The engine only depends on the `TemplateRenderer` trait; `FieldRenderer`
//! is the bundled implementation.

mod renderer;

pub use renderer::{FieldRenderer, FieldTemplate, TemplateError, TemplateRenderer};
