use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed tag at byte {0}")]
    UnclosedTag(usize),

    #[error("Unclosed section: {0}")]
    UnclosedSection(String),

    #[error("Unexpected closing tag: {0}")]
    UnexpectedClose(String),

    #[error("Section '{expected}' closed by '{found}'")]
    MismatchedSection { expected: String, found: String },

    #[error("Unsupported tag: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Renders a card template against a field name → value mapping.
///
/// Implementations must be pure: the same template and fields always produce
/// the same output.
pub trait TemplateRenderer: fmt::Debug {
    fn render(&self, template: &str, fields: &HashMap<String, String>) -> Result<String>;
}

/// The bundled renderer, backed by `FieldTemplate`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldRenderer;

impl TemplateRenderer for FieldRenderer {
    fn render(&self, template: &str, fields: &HashMap<String, String>) -> Result<String> {
        Ok(FieldTemplate::parse(template)?.render(fields))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Variable { name: String, escape: bool },
    Section { name: String, inverted: bool, children: Vec<Node> },
}

/// A parsed card template.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTemplate {
    nodes: Vec<Node>,
}

/// An open section while parsing: its name, whether it is inverted, and the
/// nodes of the enclosing scope.
struct OpenSection {
    name: String,
    inverted: bool,
    parent: Vec<Node>,
}

impl FieldTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut stack: Vec<OpenSection> = Vec::new();
        let mut current: Vec<Node> = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                current.push(Node::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];

            // Triple mustache: {{{name}}}
            if let Some(inner) = after.strip_prefix('{') {
                let end = inner
                    .find("}}}")
                    .ok_or(TemplateError::UnclosedTag(offset + start))?;
                current.push(Node::Variable {
                    name: inner[..end].trim().to_string(),
                    escape: false,
                });
                let consumed = start + 3 + end + 3;
                rest = &rest[consumed..];
                offset += consumed;
                continue;
            }

            let end = after
                .find("}}")
                .ok_or(TemplateError::UnclosedTag(offset + start))?;
            let tag = after[..end].trim();
            let consumed = start + 2 + end + 2;
            rest = &rest[consumed..];
            offset += consumed;

            let mut chars = tag.chars();
            match chars.next() {
                Some('!') | Some('>') => {}
                Some('=') => return Err(TemplateError::Unsupported(tag.to_string())),
                Some(sigil @ ('#' | '^')) => {
                    stack.push(OpenSection {
                        name: chars.as_str().trim().to_string(),
                        inverted: sigil == '^',
                        parent: std::mem::take(&mut current),
                    });
                }
                Some('/') => {
                    let found = chars.as_str().trim().to_string();
                    let open = stack
                        .pop()
                        .ok_or_else(|| TemplateError::UnexpectedClose(found.clone()))?;
                    if open.name != found {
                        return Err(TemplateError::MismatchedSection {
                            expected: open.name,
                            found,
                        });
                    }
                    let children = std::mem::replace(&mut current, open.parent);
                    current.push(Node::Section {
                        name: open.name,
                        inverted: open.inverted,
                        children,
                    });
                }
                Some('&') => current.push(Node::Variable {
                    name: chars.as_str().trim().to_string(),
                    escape: false,
                }),
                _ => current.push(Node::Variable {
                    name: tag.to_string(),
                    escape: true,
                }),
            }
        }

        if !rest.is_empty() {
            current.push(Node::Text(rest.to_string()));
        }
        if let Some(open) = stack.pop() {
            return Err(TemplateError::UnclosedSection(open.name));
        }

        Ok(Self { nodes: current })
    }

    /// Render against `fields`. Names missing from the map render empty.
    pub fn render(&self, fields: &HashMap<String, String>) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, fields, &mut out);
        out
    }
}

fn render_nodes(nodes: &[Node], fields: &HashMap<String, String>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable { name, escape } => {
                if let Some(value) = fields.get(name) {
                    if *escape {
                        out.push_str(&escape_html(value));
                    } else {
                        out.push_str(value);
                    }
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let present = fields.get(name).map_or(false, |v| !v.is_empty());
                if present != *inverted {
                    render_nodes(children, fields, out);
                }
            }
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
