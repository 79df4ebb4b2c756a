//! Instruction builder for curve geometries.
//!
//! Open curves sharing a stroke style accumulate into one path that is
//! stroked once, when the style changes, when a polygon needs the canvas, or
//! at [`CurveBuilder::finish`]. Polygons are always closed off with their own
//! fill and stroke. The hit-detection program carries the same paths, each
//! geometry block self-contained and painted in [`HIT_DETECTION_COLOR`].

use tracing::{debug, trace};

use crate::geometry::{
    CircularString, CompoundCurve, CurveGeometry, CurvePolygon, CurveSegment, Geometry, GeometryType, Ring,
};
use crate::math::{points_equal, Extent, Point2};

use super::{
    BuilderParams, BuiltInstructions, FeatureId, FillStyle, Instruction, Style, StrokeStyle, ARC_STRIDE,
    HIT_DETECTION_COLOR,
};

#[derive(Debug, Default)]
struct BuilderState {
    fill: Option<FillStyle>,
    stroke: Option<StrokeStyle>,
    applied_fill: Option<FillStyle>,
    applied_stroke: Option<StrokeStyle>,
    /// Coordinate count when the open stroke path was last flushed; `None`
    /// when no stroke path is open.
    last_stroke: Option<usize>,
}

#[derive(Debug)]
pub struct CurveBuilder {
    params: BuilderParams,
    state: BuilderState,
    instructions: Vec<Instruction>,
    hit_detection_instructions: Vec<Instruction>,
    /// Start of every geometry block in the hit-detection program.
    hit_detection_blocks: Vec<usize>,
    coordinates: Vec<f64>,
}

impl CurveBuilder {
    #[must_use]
    pub fn new(params: BuilderParams) -> Self {
        Self {
            params,
            state: BuilderState::default(),
            instructions: Vec::new(),
            hit_detection_instructions: Vec::new(),
            hit_detection_blocks: Vec::new(),
            coordinates: Vec::new(),
        }
    }

    /// Sets the styles for the geometries drawn next.
    pub fn set_fill_stroke_style(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        self.state.fill = fill;
        self.state.stroke = stroke.map(|s| s.scaled(self.params.pixel_ratio));
    }

    pub fn set_style(&mut self, style: &Style) {
        self.set_fill_stroke_style(style.fill, style.stroke);
    }

    pub fn draw_geometry(&mut self, geometry: &Geometry, feature: FeatureId) {
        match geometry {
            Geometry::CircularString(g) => self.draw_circular_string(g, feature),
            Geometry::CompoundCurve(g) => self.draw_compound_curve(g, feature),
            Geometry::CurvePolygon(g) => self.draw_curve_polygon(g, feature),
        }
    }

    pub fn draw_circular_string(&mut self, geometry: &CircularString, feature: FeatureId) {
        let extent = geometry.extent();
        if !self.begin_open_curve(GeometryType::CircularString, |e| extent.intersects(e), feature) {
            return;
        }
        self.append_circular_string(geometry, false);
        self.end_open_curve(feature);
    }

    pub fn draw_compound_curve(&mut self, geometry: &CompoundCurve, feature: FeatureId) {
        if !self.begin_open_curve(GeometryType::CompoundCurve, |e| geometry.intersects_extent(e), feature) {
            return;
        }
        self.append_compound_curve(geometry, false);
        self.end_open_curve(feature);
    }

    pub fn draw_curve_polygon(&mut self, geometry: &CurvePolygon, feature: FeatureId) {
        let (fill, stroke) = (self.state.fill, self.state.stroke);
        if fill.is_none() && stroke.is_none() {
            trace!(?feature, "polygon has neither fill nor stroke");
            return;
        }
        let extent = geometry.extent();
        if self.is_culled(GeometryType::CurvePolygon, |e| extent.intersects(e)) {
            return;
        }

        // A pending open-curve path must be painted before this one starts.
        self.flush_stroke();
        self.begin_geometry(feature);
        if let Some(fill) = fill {
            if self.state.applied_fill != Some(fill) {
                self.instructions.push(Instruction::SetFillStyle(fill));
                self.state.applied_fill = Some(fill);
            }
            self.hit_detection_instructions
                .push(Instruction::SetFillStyle(FillStyle::new(HIT_DETECTION_COLOR)));
        }
        if let Some(stroke) = stroke {
            self.apply_stroke_style(stroke);
        }

        self.push_path(Instruction::BeginPath);
        for ring in geometry.rings() {
            match ring {
                Ring::Line(line) => self.append_line(line.flat_coordinates(), line.stride(), false),
                Ring::Circular(cs) => self.append_circular_string(cs, false),
                Ring::Compound(cc) => self.append_compound_curve(cc, false),
            }
            if stroke.is_some() {
                self.push_path(Instruction::ClosePath);
            }
        }
        if fill.is_some() {
            self.push_path(Instruction::Fill);
        }
        if stroke.is_some() {
            self.push_path(Instruction::Stroke);
        }
        self.state.last_stroke = None;
        self.end_geometry(feature);
    }

    /// Flushes any pending stroke and returns the two programs.
    #[must_use]
    pub fn finish(mut self) -> BuiltInstructions {
        self.flush_stroke();
        let hit_detection_instructions = reverse_blocks(&self.hit_detection_instructions, &self.hit_detection_blocks);
        BuiltInstructions {
            instructions: self.instructions,
            hit_detection_instructions,
            coordinates: self.coordinates,
        }
    }

    /// Returns whether the geometry misses the max extent, widened by the
    /// reach of the stroke.
    fn is_culled(&self, geometry_type: GeometryType, intersects: impl Fn(&Extent) -> bool) -> bool {
        let Some(max_extent) = self.params.max_extent else {
            return false;
        };
        let margin = self.state.stroke.map_or(0.0, |s| s.width() * 0.5) * self.params.resolution;
        let mut buffered = max_extent;
        buffered.extend_xy(max_extent.min_x - margin, max_extent.min_y - margin);
        buffered.extend_xy(max_extent.max_x + margin, max_extent.max_y + margin);
        if intersects(&buffered) {
            return false;
        }
        trace!(geometry = geometry_type.name(), "culled outside max extent");
        true
    }

    /// Prepares an open curve; returns `false` if it is not drawn.
    fn begin_open_curve(
        &mut self,
        geometry_type: GeometryType,
        intersects: impl Fn(&Extent) -> bool,
        feature: FeatureId,
    ) -> bool {
        let Some(stroke) = self.state.stroke else {
            trace!(?feature, "open curve without stroke is not drawn");
            return false;
        };
        if self.is_culled(geometry_type, intersects) {
            return false;
        }
        if self.state.applied_stroke != Some(stroke) {
            self.flush_stroke();
        }
        self.begin_geometry(feature);
        self.apply_stroke_style(stroke);
        if self.state.last_stroke.is_none() {
            self.instructions.push(Instruction::BeginPath);
            self.state.last_stroke = Some(self.coordinates.len());
        }
        self.hit_detection_instructions.push(Instruction::BeginPath);
        true
    }

    fn end_open_curve(&mut self, feature: FeatureId) {
        self.hit_detection_instructions.push(Instruction::Stroke);
        self.end_geometry(feature);
    }

    fn apply_stroke_style(&mut self, stroke: StrokeStyle) {
        if self.state.applied_stroke != Some(stroke) {
            self.instructions.push(Instruction::SetStrokeStyle(stroke));
            self.state.applied_stroke = Some(stroke);
        }
        self.hit_detection_instructions
            .push(Instruction::SetStrokeStyle(stroke.recolored(HIT_DETECTION_COLOR)));
    }

    /// Strokes the open path if coordinates were added since the last flush.
    fn flush_stroke(&mut self) {
        if let Some(last_stroke) = self.state.last_stroke.take() {
            if last_stroke != self.coordinates.len() {
                debug!(from = last_stroke, to = self.coordinates.len(), "flushing stroke");
                self.instructions.push(Instruction::Stroke);
            }
        }
    }

    fn begin_geometry(&mut self, feature: FeatureId) {
        self.instructions.push(Instruction::BeginGeometry(feature));
        self.hit_detection_blocks.push(self.hit_detection_instructions.len());
        self.hit_detection_instructions.push(Instruction::BeginGeometry(feature));
    }

    fn end_geometry(&mut self, feature: FeatureId) {
        self.instructions.push(Instruction::EndGeometry(feature));
        self.hit_detection_instructions.push(Instruction::EndGeometry(feature));
    }

    /// Pushes a path instruction to both programs.
    fn push_path(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
        self.hit_detection_instructions.push(instruction);
    }

    /// Returns whether the last appended point is `(x, y)`.
    fn ends_at(&self, x: f64, y: f64) -> bool {
        match self.coordinates.as_slice() {
            [.., last_x, last_y] => points_equal(&Point2::new(*last_x, *last_y), &Point2::new(x, y)),
            _ => false,
        }
    }

    fn append_compound_curve(&mut self, geometry: &CompoundCurve, continuation: bool) {
        for (i, segment) in geometry.segments().iter().enumerate() {
            let continuation = continuation || i > 0;
            match segment {
                CurveSegment::Line(line) => self.append_line(line.flat_coordinates(), line.stride(), continuation),
                CurveSegment::Circular(cs) => self.append_circular_string(cs, continuation),
            }
        }
    }

    /// Appends the drawable quads of `geometry` and emits one arc run.
    ///
    /// Quads of degenerate arcs are left out. When continuing the path, the
    /// first quad borrows its start from the last appended point.
    fn append_circular_string(&mut self, geometry: &CircularString, continuation: bool) {
        let continuation = continuation && {
            let first = geometry.first_point();
            self.ends_at(first.x, first.y)
        };
        let mut start = None;
        for (i, quad) in geometry.drawable_flat_coordinates().chunks_exact(ARC_STRIDE).enumerate() {
            if !(quad[4].is_finite() && quad[5].is_finite()) {
                debug!(arc = i, "skipping degenerate arc");
                continue;
            }
            if i == 0 && continuation {
                start = Some(self.coordinates.len() - 2);
                self.coordinates.extend_from_slice(&quad[2..]);
            } else {
                start.get_or_insert(self.coordinates.len());
                self.coordinates.extend_from_slice(quad);
            }
        }
        if let Some(start) = start {
            let end = self.coordinates.len();
            self.push_path(Instruction::MoveToArcTo { start, end });
        }
    }

    /// Appends the x and y of a flat buffer and emits one line run.
    ///
    /// Vertices closer than the tolerance to the previously kept vertex are
    /// dropped; the last vertex is always kept.
    fn append_line(&mut self, flat: &[f64], stride: usize, continuation: bool) {
        let continuation = continuation && self.ends_at(flat[0], flat[1]);
        let min_squared = (self.params.tolerance * self.params.resolution).powi(2);
        let start = if continuation {
            self.coordinates.len() - 2
        } else {
            self.coordinates.extend_from_slice(&flat[..2]);
            self.coordinates.len() - 2
        };
        let count = flat.len() / stride;
        for (i, chunk) in flat.chunks_exact(stride).enumerate().skip(1) {
            let n = self.coordinates.len();
            let (dx, dy) = (chunk[0] - self.coordinates[n - 2], chunk[1] - self.coordinates[n - 1]);
            if i + 1 < count && dx * dx + dy * dy < min_squared {
                continue;
            }
            self.coordinates.extend_from_slice(&chunk[..2]);
        }
        let end = self.coordinates.len();
        if end - start >= 4 {
            self.push_path(Instruction::MoveToLineTo { start, end });
        }
    }
}

/// Reverses the order of the blocks starting at `starts`, keeping each
/// block's own order.
fn reverse_blocks(instructions: &[Instruction], starts: &[usize]) -> Vec<Instruction> {
    let mut reversed = Vec::with_capacity(instructions.len());
    let mut end = instructions.len();
    for &start in starts.iter().rev() {
        reversed.extend_from_slice(&instructions[start..end]);
        end = start;
    }
    reversed.extend_from_slice(&instructions[..end]);
    reversed
}
