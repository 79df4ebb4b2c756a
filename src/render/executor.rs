use tracing::trace;

use crate::error::{RenderError, Result};
use crate::math::Point2;

use super::{FeatureId, FillStyle, Instruction, StrokeStyle, ARC_STRIDE};

/// Receiver of the drawing calls produced by [`replay`].
///
/// Mirrors an immediate-mode 2D canvas. Geometry markers and style changes
/// have empty default implementations.
pub trait PathSink {
    fn begin_geometry(&mut self, _feature: FeatureId) {}

    fn end_geometry(&mut self, _feature: FeatureId) {}

    fn begin_path(&mut self);

    /// Starts a new sub-path at `to`.
    fn move_to(&mut self, to: Point2);

    /// Adds the circular arc from the current position through `through` to
    /// `to`. `center` is the center of that circle.
    fn arc_through_point(&mut self, through: Point2, to: Point2, center: Point2);

    fn line_to(&mut self, to: Point2);

    fn close_path(&mut self);

    fn fill(&mut self);

    fn stroke(&mut self);

    fn set_fill_style(&mut self, _style: &FillStyle) {}

    fn set_stroke_style(&mut self, _style: &StrokeStyle) {}
}

fn point(c: &[f64], i: usize) -> Point2 {
    Point2::new(c[i], c[i + 1])
}

/// Returns `coordinates[start..end]` after checking that it holds whole
/// groups of `stride` numbers.
fn coordinate_run(coordinates: &[f64], index: usize, start: usize, end: usize, stride: usize) -> Result<&[f64]> {
    let invalid = |reason: String| RenderError::InvalidInstruction { index, reason };
    if start > end || end > coordinates.len() {
        return Err(invalid(format!(
            "range {start}..{end} outside {} coordinates",
            coordinates.len()
        ))
        .into());
    }
    if end == start || (end - start) % stride != 0 {
        return Err(invalid(format!("range {start}..{end} is not a multiple of {stride}")).into());
    }
    Ok(&coordinates[start..end])
}

/// Executes `instructions` against `coordinates`, driving `sink`.
///
/// Within one geometry the pen position is tracked so that a run starting
/// where the previous one ended continues the sub-path instead of moving.
/// Every geometry starts a new sub-path, even when strokes of consecutive
/// geometries share one path. An arc whose center is not finite is skipped,
/// leaving a gap.
///
/// # Errors
///
/// Returns `RenderError::InvalidInstruction` if an instruction references
/// coordinates outside the buffer or a partial point or arc.
pub fn replay<S: PathSink + ?Sized>(instructions: &[Instruction], coordinates: &[f64], sink: &mut S) -> Result<()> {
    let mut pen: Option<Point2> = None;
    for (index, instruction) in instructions.iter().enumerate() {
        match *instruction {
            Instruction::BeginGeometry(feature) => {
                pen = None;
                sink.begin_geometry(feature);
            }
            Instruction::EndGeometry(feature) => {
                pen = None;
                sink.end_geometry(feature);
            }
            Instruction::BeginPath => {
                pen = None;
                sink.begin_path();
            }
            Instruction::MoveToArcTo { start, end } => {
                let run = coordinate_run(coordinates, index, start, end, ARC_STRIDE)?;
                for quad in run.chunks_exact(ARC_STRIDE) {
                    let center = point(quad, 4);
                    if !(center.x.is_finite() && center.y.is_finite()) {
                        trace!(index, "arc without center left as a gap");
                        pen = None;
                        continue;
                    }
                    let from = point(quad, 0);
                    if pen != Some(from) {
                        sink.move_to(from);
                    }
                    let to = point(quad, 6);
                    sink.arc_through_point(point(quad, 2), to, center);
                    pen = Some(to);
                }
            }
            Instruction::MoveToLineTo { start, end } => {
                let run = coordinate_run(coordinates, index, start, end, 2)?;
                let first = point(run, 0);
                if pen != Some(first) {
                    sink.move_to(first);
                }
                for i in (2..run.len()).step_by(2) {
                    sink.line_to(point(run, i));
                }
                pen = Some(point(run, run.len() - 2));
            }
            Instruction::ClosePath => {
                pen = None;
                sink.close_path();
            }
            Instruction::Fill => sink.fill(),
            Instruction::Stroke => sink.stroke(),
            Instruction::SetFillStyle(ref style) => sink.set_fill_style(style),
            Instruction::SetStrokeStyle(ref style) => sink.set_stroke_style(style),
        }
    }
    Ok(())
}
