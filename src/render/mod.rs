//! Lowering of curve geometries into replayable path programs.
//!
//! [`CurveBuilder`] appends 2D coordinates to one shared buffer and emits
//! [`Instruction`]s that reference ranges of it. Arc runs store four points
//! per arc (start, middle, center, end); line runs store one point per
//! vertex. [`executor::replay`] walks the program and drives a
//! [`executor::PathSink`].

pub mod curve_builder;
pub mod executor;
pub mod feature;
pub mod style;

pub use curve_builder::CurveBuilder;
pub use executor::{replay, PathSink};
pub use feature::{build_instructions, Feature, FeatureId, FeatureStore};
pub use style::{Color, FillStyle, Style, StrokeStyle, HIT_DETECTION_COLOR};

use crate::math::Extent;

/// Numbers stored per arc in an arc run.
pub const ARC_STRIDE: usize = 8;

/// One step of a path program.
///
/// `start` and `end` are offsets into the coordinate buffer of the
/// [`BuiltInstructions`] the instruction belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    BeginGeometry(FeatureId),
    EndGeometry(FeatureId),
    BeginPath,
    /// Arcs through `(start, middle, center, end)` quads. The pen moves to
    /// the first start point unless it is already there.
    MoveToArcTo { start: usize, end: usize },
    /// A polyline. The pen moves to the first point unless it is already
    /// there.
    MoveToLineTo { start: usize, end: usize },
    ClosePath,
    Fill,
    Stroke,
    SetFillStyle(FillStyle),
    SetStrokeStyle(StrokeStyle),
}

/// Parameters controlling instruction building.
#[derive(Debug, Clone, Copy)]
pub struct BuilderParams {
    /// Vertices of line runs closer than `tolerance` pixels to the previous
    /// vertex are dropped.
    pub tolerance: f64,
    /// Map units per pixel.
    pub resolution: f64,
    /// Device pixels per CSS pixel; stroke widths are multiplied by it.
    pub pixel_ratio: f64,
    /// Geometries whose extent misses this extent are not drawn.
    pub max_extent: Option<Extent>,
}

impl Default for BuilderParams {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            resolution: 1.0,
            pixel_ratio: 1.0,
            max_extent: None,
        }
    }
}

/// The output of a [`CurveBuilder`].
#[derive(Debug, Clone, Default)]
pub struct BuiltInstructions {
    /// Program painting the features.
    pub instructions: Vec<Instruction>,
    /// Program painting every feature in the hit-detection color, last
    /// drawn feature first.
    pub hit_detection_instructions: Vec<Instruction>,
    /// Coordinates referenced by both programs.
    pub coordinates: Vec<f64>,
}
