//! Tunable thresholds for each analysis stage.
//!
//! Every field has a default; a TOML file may override any subset of them.

use std::path::Path;

use serde::Deserialize;

use crate::StructureError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub segmentation: SegmentationConfig,
    pub assembly: AssemblyConfig,
    pub roles: RoleConfig,
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, StructureError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StructureError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Gaps at or above this many times the run's font size are ignored when
    /// estimating char spacing.
    pub outlier_gap_factor: f32,
    /// When the largest gap is within this percentage of the smallest, the
    /// line is treated as uniformly spaced.
    pub uniform_gap_percent: f32,
    /// Runs taller than `font_size * y_scale * factor` are dropped as malformed.
    pub max_height_factor: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            outlier_gap_factor: 6.0,
            uniform_gap_percent: 10.0,
            max_height_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Fraction of the shorter height two tops may differ by and still share a line.
    pub line_y_tolerance: f32,
    /// How far right of its paragraph a line must start to count as indented.
    pub indent_threshold: f32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            line_y_tolerance: 0.5,
            indent_threshold: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Words whose top lies in this top percentage of the page may be head-notes.
    pub headnote_percent: f32,
    /// Words whose top lies in this bottom percentage of the page may be foot-notes.
    pub footnote_percent: f32,
    pub page_number_max_len: usize,
    pub detect_footnotes: bool,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            headnote_percent: 5.0,
            footnote_percent: 50.0,
            page_number_max_len: 4,
            detect_footnotes: false,
        }
    }
}
