//! Layout constraints, loaded from TOML and overridable from the command line.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::importance::ImportanceMode;

/// Flow direction: the axis along which ranks advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TD", alias = "TB", alias = "td", alias = "tb")]
    TopDown,
    #[serde(rename = "LR", alias = "lr")]
    LeftRight,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::TopDown => write!(f, "TD"),
            Direction::LeftRight => write!(f, "LR"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TD" | "TB" => Ok(Direction::TopDown),
            "LR" => Ok(Direction::LeftRight),
            _ => Err(format!("unknown direction: {s} (expected TD, TB or LR)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    pub direction: Direction,
    /// Force simulation steps.
    pub iterations: usize,
    pub time_step: f32,
    /// Gap between consecutive ranks.
    pub rank_spacing: f64,
    /// Gap between neighbours within a rank.
    pub node_gap: f64,
    /// 0 keeps the force position along the rank axis, 1 snaps to the rank.
    pub hierarchy_weight: f64,
    /// Size growth of the most important node (1.0 doubles it).
    pub importance_scale: f64,
    /// Pull of important nodes toward the middle of their rank.
    pub importance_pull: f64,
    pub importance: ImportanceMode,
    pub margin: f64,
    pub log_level: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::TopDown,
            iterations: 300,
            time_step: 0.016,
            rank_spacing: 2.0,
            node_gap: 3.0,
            hierarchy_weight: 1.0,
            importance_scale: 0.5,
            importance_pull: 0.5,
            importance: ImportanceMode::Auto,
            margin: 0.0,
            log_level: "warn".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: LayoutConfig = toml::from_str(input)?;
        Ok(config.clamped())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Bring weights into `[0, 1]` and spacings to non-negative values.
    pub fn clamped(mut self) -> Self {
        self.hierarchy_weight = unit(self.hierarchy_weight);
        self.importance_pull = unit(self.importance_pull);
        self.importance_scale = non_negative(self.importance_scale);
        self.rank_spacing = non_negative(self.rank_spacing);
        self.node_gap = non_negative(self.node_gap);
        self.margin = non_negative(self.margin);
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            self.time_step = LayoutConfig::default().time_step;
        }
        self
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}
