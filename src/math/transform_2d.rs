//! Transform functions over flat coordinate buffers.
//!
//! A transform function receives a flat buffer and its stride and rewrites
//! x and y in place; any further ordinates are left untouched.

use nalgebra::Matrix3;

use super::{Point2, Vector2};

/// Returns a transform applying the homogeneous 2D matrix `m`.
pub fn affine(m: Matrix3<f64>) -> impl Fn(&mut [f64], usize) {
    move |flat: &mut [f64], stride: usize| {
        for chunk in flat.chunks_exact_mut(stride) {
            let p = m.transform_point(&Point2::new(chunk[0], chunk[1]));
            chunk[0] = p.x;
            chunk[1] = p.y;
        }
    }
}

/// Returns a transform moving every coordinate by `(dx, dy)`.
pub fn translate(dx: f64, dy: f64) -> impl Fn(&mut [f64], usize) {
    affine(Matrix3::new_translation(&Vector2::new(dx, dy)))
}

/// Returns a transform rotating counter-clockwise by `angle` radians
/// around `anchor`.
pub fn rotate(angle: f64, anchor: Point2) -> impl Fn(&mut [f64], usize) {
    affine(about(anchor, Matrix3::new_rotation(angle)))
}

/// Returns a transform scaling by `(sx, sy)` relative to `anchor`.
pub fn scale(sx: f64, sy: f64, anchor: Point2) -> impl Fn(&mut [f64], usize) {
    affine(about(anchor, Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy))))
}

/// Conjugates `m` so that it acts around `anchor` instead of the origin.
fn about(anchor: Point2, m: Matrix3<f64>) -> Matrix3<f64> {
    let to_anchor = Matrix3::new_translation(&anchor.coords);
    let from_anchor = Matrix3::new_translation(&-anchor.coords);
    to_anchor * m * from_anchor
}
