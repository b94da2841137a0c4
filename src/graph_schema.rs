//! Diagram graph schema: nodes, edges and subgraphs annotated with
//! LLM-assigned importance.
//!
//! The JSON form mirrors the declared shape: camelCase fields, `type` as the
//! discriminator, lowercase variant names. Extra fields are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::style_parser::parse_style;

/// Aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub subgraphs: Vec<Node>,
}

impl Graph {
    /// Parse a graph document, failing when it does not match the schema.
    pub fn from_json(input: &str) -> Result<Graph> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let out = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(out)
    }
}

/// A labelled vertex, possibly containing other vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Node,
    Subgraph,
    /// A vertex standing for an edge-like concept. Laid out like any other
    /// vertex.
    Edge,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Node => write!(f, "node"),
            NodeKind::Subgraph => write!(f, "subgraph"),
            NodeKind::Edge => write!(f, "edge"),
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "node" => Ok(NodeKind::Node),
            "subgraph" => Ok(NodeKind::Subgraph),
            "edge" => Ok(NodeKind::Edge),
            other => Err(format!("unknown node type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub style: StyleProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// LLM-assigned weight. No range is implied.
    pub importance: f64,
}

/// Centre of a node in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Visual style of a node.
///
/// Accepted in JSON either as an object or as a declaration string such as
/// `"fill:#f9f;stroke:#333"`; always written as an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StyleRepr")]
pub struct StyleProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FromStr for StyleProps {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_style(s)
    }
}

impl fmt::Display for StyleProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decls: Vec<String> = Vec::new();
        if let Some(v) = &self.fill {
            decls.push(format!("fill:{v}"));
        }
        if let Some(v) = &self.stroke {
            decls.push(format!("stroke:{v}"));
        }
        if let Some(v) = self.stroke_width {
            decls.push(format!("stroke-width:{v}px"));
        }
        if let Some(v) = &self.stroke_dasharray {
            decls.push(format!("stroke-dasharray:{v}"));
        }
        if let Some(v) = &self.color {
            decls.push(format!("color:{v}"));
        }
        if let Some(v) = self.font_size {
            decls.push(format!("font-size:{v}px"));
        }
        if let Some(v) = &self.font_weight {
            decls.push(format!("font-weight:{v}"));
        }
        if let Some(v) = self.opacity {
            decls.push(format!("opacity:{v}"));
        }
        for (name, value) in &self.extra {
            match value {
                Value::String(s) => decls.push(format!("{name}:{s}")),
                other => decls.push(format!("{name}:{other}")),
            }
        }
        write!(f, "{}", decls.join(";"))
    }
}

/// Object form of [`StyleProps`], deserialized without the string fallback.
/// Accepts the same property spellings as the declaration string.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleFields {
    #[serde(default, alias = "background")]
    fill: Option<String>,
    #[serde(default)]
    stroke: Option<String>,
    #[serde(default, alias = "stroke-width")]
    stroke_width: Option<f64>,
    #[serde(default, alias = "stroke-dasharray")]
    stroke_dasharray: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, alias = "font-size")]
    font_size: Option<f64>,
    #[serde(default, alias = "font-weight")]
    font_weight: Option<String>,
    #[serde(default)]
    opacity: Option<f64>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StyleRepr {
    Declarations(String),
    Fields(StyleFields),
}

impl TryFrom<StyleRepr> for StyleProps {
    type Error = Error;

    fn try_from(repr: StyleRepr) -> Result<Self> {
        match repr {
            StyleRepr::Declarations(s) => parse_style(&s),
            StyleRepr::Fields(f) => Ok(StyleProps {
                fill: f.fill,
                stroke: f.stroke,
                stroke_width: f.stroke_width,
                stroke_dasharray: f.stroke_dasharray,
                color: f.color,
                font_size: f.font_size,
                font_weight: f.font_weight,
                opacity: f.opacity,
                extra: f.extra,
            }),
        }
    }
}

/// A directed connection between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Normal,
    Emphasis,
    Subflow,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Normal => write!(f, "normal"),
            EdgeKind::Emphasis => write!(f, "emphasis"),
            EdgeKind::Subflow => write!(f, "subflow"),
        }
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" => Ok(EdgeKind::Normal),
            "emphasis" => Ok(EdgeKind::Emphasis),
            "subflow" => Ok(EdgeKind::Subflow),
            other => Err(format!("unknown edge type: {other}")),
        }
    }
}
