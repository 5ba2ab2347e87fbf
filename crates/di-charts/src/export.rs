//! Chart image export boundary
//!
//! The core's contract with the rasterizing collaborator: a complete spec
//! plus scale, optional explicit dimensions, and background. A failed
//! export surfaces as an error and leaves all in-memory state untouched.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spec::ChartSpec;
use crate::ChartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Background {
    White,
    Transparent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageExportOptions {
    /// Rasterization scale factor.
    pub scale: f64,
    /// Explicit width in pixels; `None` keeps the spec's auto-size.
    pub width: Option<u32>,
    /// Explicit height in pixels; `None` keeps the spec's auto-size.
    pub height: Option<u32>,
    pub background: Background,
}

impl Default for ImageExportOptions {
    fn default() -> Self {
        Self { scale: 2.0, width: None, height: None, background: Background::White }
    }
}

/// Inject export options into a spec, returning the finalized copy the
/// renderer receives.
pub fn apply_export_options(spec: &ChartSpec, options: &ImageExportOptions) -> ChartSpec {
    debug!(scale = options.scale, "finalizing spec for export");
    let mut finalized = spec.clone();
    finalized.set_size(options.width, options.height);
    match options.background {
        Background::White => finalized.set_background(Some("white")),
        Background::Transparent => finalized.set_background(None),
    }
    finalized
}

/// Rasterizing collaborator. Implementations live outside the core.
pub trait ChartRenderer {
    fn render_png(&self, spec: &ChartSpec, options: &ImageExportOptions) -> Result<Vec<u8>, ChartError>;
}
