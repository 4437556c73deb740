//! Tagged schema trees for carrier body templates
//!
//! Carrier templates arrive as JSON trees of typed-null leaves. Rather than
//! inferring structure at merge time from whatever shape the JSON happens to
//! have, each template is parsed into an explicit tree once, at catalogue
//! load, and malformed templates fail there. Array nodes carry at most one
//! exemplar element describing the element shape.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Placeholder leaf. `default` is `null` for caller-supplied fields or a
    /// fixed scalar the carrier requires verbatim (e.g. `grant_type`).
    Leaf { default: Value },
    Object(Vec<(String, TemplateNode)>),
    /// Array with an optional exemplar describing element shape. Templates
    /// with an explicitly empty array keep it empty.
    Array(Option<Box<TemplateNode>>),
}

/// A validated body template for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSchema {
    root: TemplateNode,
}

impl TemplateSchema {
    /// Parse and validate a raw template tree. The root must be an object.
    pub fn parse(template: &Value) -> Result<Self> {
        if !template.is_object() {
            return Err(Error::Configuration {
                message: "body template root must be a JSON object".into(),
                source: None,
            });
        }
        Ok(Self {
            root: parse_node(template, "$")?,
        })
    }

    /// Re-instantiate the placeholder tree the schema was parsed from.
    pub fn blank(&self) -> Value {
        instantiate(&self.root)
    }
}

fn parse_node(value: &Value, path: &str) -> Result<TemplateNode> {
    match value {
        Value::Object(fields) => {
            let mut parsed = Vec::with_capacity(fields.len());
            for (key, child) in fields {
                parsed.push((key.clone(), parse_node(child, &format!("{path}.{key}"))?));
            }
            Ok(TemplateNode::Object(parsed))
        }
        Value::Array(items) => match items.len() {
            0 => Ok(TemplateNode::Array(None)),
            1 => Ok(TemplateNode::Array(Some(Box::new(parse_node(
                &items[0],
                &format!("{path}[0]"),
            )?)))),
            n => Err(Error::Configuration {
                message: format!(
                    "template array at {path} has {n} exemplar elements, expected at most one"
                ),
                source: None,
            }),
        },
        scalar => Ok(TemplateNode::Leaf {
            default: scalar.clone(),
        }),
    }
}

fn instantiate(node: &TemplateNode) -> Value {
    match node {
        TemplateNode::Leaf { default } => default.clone(),
        TemplateNode::Object(fields) => {
            let mut map = Map::with_capacity(fields.len());
            for (key, child) in fields {
                map.insert(key.clone(), instantiate(child));
            }
            Value::Object(map)
        }
        TemplateNode::Array(None) => Value::Array(vec![]),
        TemplateNode::Array(Some(exemplar)) => Value::Array(vec![instantiate(exemplar)]),
    }
}
