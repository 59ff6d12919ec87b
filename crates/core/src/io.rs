//! Importer and exporter contracts.
//!
//! File formats live outside this workspace; the engine only fixes the
//! shapes that cross the boundary. Importers turn external sources into a
//! problem definition, exporters turn a finished [`CuttingPlan`] into some
//! rendering. Importer failures are reported as [`Error::UnsupportedFormat`]
//! or [`Error::Parse`](crate::Error::Parse) and never originate in the
//! engine itself.

use crate::error::Result;
use crate::piece::Piece;
use crate::plan::CuttingPlan;
use crate::settings::OptimizationSettings;
use crate::stock::Stock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[allow(unused_imports)] // doc link
use crate::error::Error;

/// A problem definition produced by an importer.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportedProblem {
    /// Imported stock sheets.
    pub stocks: Vec<Stock>,

    /// Imported pieces.
    pub pieces: Vec<Piece>,

    /// Settings carried in the source, when it defines any.
    pub settings: Option<OptimizationSettings>,
}

/// Parses a problem definition from raw bytes.
pub trait ProblemImporter {
    /// Short format name, e.g. `"csv"`.
    fn format(&self) -> &str;

    /// Parses the input into a problem definition.
    fn import(&self, input: &[u8]) -> Result<ImportedProblem>;
}

/// Rendering options recognized by exporters.
///
/// Individual exporters may ignore options that do not apply to their
/// medium; visual faithfulness to the placements is the only contract.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportOptions {
    /// Draw a background grid.
    pub show_grid: bool,

    /// Label each placed piece.
    pub show_labels: bool,

    /// Mark rotated pieces.
    pub show_rotations: bool,

    /// Print per-sheet utilization.
    pub show_utilization: bool,

    /// Named color scheme.
    pub color_scheme: String,

    /// Raster width in pixels.
    pub image_width: u32,

    /// Raster height in pixels.
    pub image_height: u32,

    /// Scale factor for vector output.
    pub scale: f64,

    /// Include plan metadata (settings, metrics) in the output.
    pub include_metadata: bool,

    /// Document title.
    pub title: Option<String>,

    /// Document description.
    pub description: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_labels: true,
            show_rotations: true,
            show_utilization: true,
            color_scheme: "default".to_string(),
            image_width: 1920,
            image_height: 1080,
            scale: 1.0,
            include_metadata: true,
            title: None,
            description: None,
        }
    }
}

impl ExportOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the document description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the raster output dimensions.
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Sets the vector scale factor.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the color scheme.
    pub fn with_color_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.color_scheme = scheme.into();
        self
    }
}

/// Renders a cutting plan into some output medium.
pub trait PlanExporter {
    /// Short format name, e.g. `"svg"`.
    fn format(&self) -> &str;

    /// Renders the plan.
    fn export(&self, plan: &CuttingPlan, options: &ExportOptions) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_options_defaults() {
        let options = ExportOptions::default();
        assert!(options.show_grid);
        assert_eq!(options.image_width, 1920);
        assert_eq!(options.scale, 1.0);
        assert!(options.title.is_none());
    }

    #[test]
    fn test_export_options_builder() {
        let options = ExportOptions::new()
            .with_title("Workshop batch 7")
            .with_image_size(800, 600)
            .with_scale(2.0)
            .with_color_scheme("mono");

        assert_eq!(options.title.as_deref(), Some("Workshop batch 7"));
        assert_eq!(options.image_width, 800);
        assert_eq!(options.image_height, 600);
        assert_eq!(options.scale, 2.0);
        assert_eq!(options.color_scheme, "mono");
    }
}
