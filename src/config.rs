// src/config.rs

// Process-wide plotting settings. They are read once (defaults or a JSON file)
// and passed by reference into every plotting call.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_COLORMAP, DEFAULT_COLOR_OVER, DEFAULT_COLOR_UNDER, DEFAULT_CUTOFF_PERCENTILE,
    DEFAULT_RASTERIZE_THRESHOLD, PLOT_HEIGHT, PLOT_WIDTH, SI_UNITS_FOR_RESCALING,
};
use crate::error::Result;

/// Defaults for the outlier-robust color scale of 2D plots.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AutoColorScaleSettings {
    pub enabled: bool,
    /// Percentiles allowed to be clipped from the (top, bottom) of the distribution.
    pub cutoff_percentile: (f64, f64),
    /// Hex color (`#rrggbb`) for values above the color range.
    pub color_over: String,
    /// Hex color (`#rrggbb`) for values below the color range.
    pub color_under: String,
}

impl Default for AutoColorScaleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            cutoff_percentile: DEFAULT_CUTOFF_PERCENTILE,
            color_over: DEFAULT_COLOR_OVER.to_string(),
            color_under: DEFAULT_COLOR_UNDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub default_colormap: String,
    pub rasterize_threshold: usize,
    /// Units that receive an SI prefix (`nV`, `kHz`) when axes are rescaled.
    pub rescalable_units: Vec<String>,
    pub auto_color_scale: AutoColorScaleSettings,
    /// Root of the `{root}/{experiment}/{sample}/{format}` image tree.
    pub mainfolder: PathBuf,
    pub canvas_size: (u32, u32),
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            default_colormap: DEFAULT_COLORMAP.to_string(),
            rasterize_threshold: DEFAULT_RASTERIZE_THRESHOLD,
            rescalable_units: SI_UNITS_FOR_RESCALING.iter().map(|u| u.to_string()).collect(),
            auto_color_scale: AutoColorScaleSettings::default(),
            mainfolder: PathBuf::from("."),
            canvas_size: (PLOT_WIDTH, PLOT_HEIGHT),
        }
    }
}

impl PlotSettings {
    /// Reads settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings: PlotSettings = serde_json::from_str(&text)?;
        log::debug!("Loaded plot settings from '{}'", path.display());
        Ok(settings)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn is_rescalable_unit(&self, unit: &str) -> bool {
        self.rescalable_units.iter().any(|u| u == unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: PlotSettings =
            serde_json::from_str(r#"{"rasterize_threshold": 10, "default_colormap": "magma"}"#)
                .unwrap();
        assert_eq!(settings.rasterize_threshold, 10);
        assert_eq!(settings.default_colormap, "magma");
        assert_eq!(settings.canvas_size, (PLOT_WIDTH, PLOT_HEIGHT));
        assert!(settings.is_rescalable_unit("V"));
        assert!(!settings.auto_color_scale.enabled);
    }

    #[test]
    fn test_unit_set_can_be_replaced() {
        let settings: PlotSettings =
            serde_json::from_str(r#"{"rescalable_units": ["Hz"]}"#).unwrap();
        assert!(settings.is_rescalable_unit("Hz"));
        assert!(!settings.is_rescalable_unit("V"));
    }
}

// src/config.rs
