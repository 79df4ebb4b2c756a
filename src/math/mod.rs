pub mod arc_2d;
pub mod extent;
pub mod flat;
pub mod transform_2d;

pub use arc_2d::{angle_from_origin, ArcAngles, CircularArc};
pub use extent::Extent;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns whether two points coincide within [`TOLERANCE`].
#[must_use]
pub fn points_equal(a: &Point2, b: &Point2) -> bool {
    (a - b).norm() < TOLERANCE
}
