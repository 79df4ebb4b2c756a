//! Three-point circular arc math.
//!
//! Angles are measured counter-clockwise from the positive x-axis and are
//! normalized to `[0, 2π)`. An arc is given by its start point, any point
//! strictly between start and end, and its end point.
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::{points_equal, Point2, Vector2, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Tolerance used when comparing angles.
const ANGLE_TOLERANCE: f64 = 1e-9;

/// Returns the angle of `point - origin` in `[0, 2π)`.
///
/// # Errors
///
/// Returns `GeometryError::ZeroVector` if `point` coincides with `origin`.
pub fn angle_from_origin(origin: &Point2, point: &Point2) -> Result<f64> {
    let d = point - origin;
    if d.norm() < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    Ok(normalize_angle(d.y.atan2(d.x)))
}

/// Wraps an angle into `[0, 2π)`.
fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly 2π.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Evaluates the point at `angle` on the circle around `center`.
#[must_use]
pub fn circle_point_at(center: &Point2, radius: f64, angle: f64) -> Point2 {
    center + Vector2::new(radius * angle.cos(), radius * angle.sin())
}

/// Evaluates a point on an arc at parameter `t` in `[0, 1]`.
///
/// `sweep` is signed: positive for counter-clockwise arcs.
#[must_use]
pub fn arc_point_at(center: &Point2, radius: f64, start_angle: f64, sweep: f64, t: f64) -> Point2 {
    circle_point_at(center, radius, start_angle + sweep * t)
}

/// Angles of the three defining points of an arc, seen from its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcAngles {
    pub start: f64,
    pub middle: f64,
    pub end: f64,
}

/// A circular arc through three points.
///
/// The points must not be collinear. The only exception is a full circle,
/// where `start == end` and `middle` is the diametrically opposite point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArc {
    pub start: Point2,
    pub middle: Point2,
    pub end: Point2,
}

impl CircularArc {
    /// Creates a new arc from its start, middle and end points.
    #[must_use]
    pub fn new(start: Point2, middle: Point2, end: Point2) -> Self {
        Self { start, middle, end }
    }

    /// Returns whether the arc closes back onto its start point.
    #[must_use]
    pub fn is_full_circle(&self) -> bool {
        points_equal(&self.start, &self.end)
    }

    /// Computes the center of the circle through the three points.
    ///
    /// For a full circle the center is the midpoint of start and middle.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the points are collinear or
    /// coincide, since no unique circle passes through them.
    pub fn center_of_circle(&self) -> Result<Point2> {
        if self.is_full_circle() {
            if points_equal(&self.start, &self.middle) {
                return Err(GeometryError::Degenerate("arc collapses to a point".into()).into());
            }
            return Ok(nalgebra::center(&self.start, &self.middle));
        }

        // Intersection of the perpendicular bisectors, solved relative to `start`.
        let a = self.middle - self.start;
        let b = self.end - self.start;
        let d = 2.0 * (a.x * b.y - a.y * b.x);
        if d.abs() <= TOLERANCE * a.norm() * b.norm() {
            return Err(GeometryError::Degenerate(format!(
                "collinear arc points ({}, {}), ({}, {}), ({}, {})",
                self.start.x, self.start.y, self.middle.x, self.middle.y, self.end.x, self.end.y
            ))
            .into());
        }
        let a2 = a.norm_squared();
        let b2 = b.norm_squared();
        let ux = (b.y * a2 - a.y * b2) / d;
        let uy = (a.x * b2 - b.x * a2) / d;
        Ok(self.start + Vector2::new(ux, uy))
    }

    /// Returns the distance from `center` to the start point.
    #[must_use]
    pub fn radius(&self, center: &Point2) -> f64 {
        (self.start - center).norm()
    }

    /// Returns the angles of start, middle and end as seen from `center`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` if any point coincides with `center`.
    pub fn angles(&self, center: &Point2) -> Result<ArcAngles> {
        Ok(ArcAngles {
            start: angle_from_origin(center, &self.start)?,
            middle: angle_from_origin(center, &self.middle)?,
            end: angle_from_origin(center, &self.end)?,
        })
    }

    /// Returns whether the arc runs clockwise from start through middle to end.
    ///
    /// The arc is counter-clockwise exactly when the middle angle lies on the
    /// counter-clockwise sweep from the start angle to the end angle. A full
    /// circle is counter-clockwise.
    #[must_use]
    pub fn clockwise(&self, angles: &ArcAngles) -> bool {
        let to_end = Self::angle_distance(angles.start, angles.end);
        if to_end < ANGLE_TOLERANCE {
            return false;
        }
        Self::angle_distance(angles.start, angles.middle) > to_end
    }

    /// Counter-clockwise angular distance from `from` to `to`, in `[0, 2π)`.
    #[must_use]
    pub fn angle_distance(from: f64, to: f64) -> f64 {
        if to >= from {
            to - from
        } else {
            TAU - from + to
        }
    }

    /// Returns the signed sweep angle: positive counter-clockwise, negative
    /// clockwise, `±2π` for a full circle.
    #[must_use]
    pub fn sweep(angles: &ArcAngles, clockwise: bool) -> f64 {
        let (from, to, sign) = if clockwise {
            (angles.end, angles.start, -1.0)
        } else {
            (angles.start, angles.end, 1.0)
        };
        let magnitude = Self::angle_distance(from, to);
        if magnitude < ANGLE_TOLERANCE {
            sign * TAU
        } else {
            sign * magnitude
        }
    }

    /// Returns the points bounding the arc: the start point, every axis
    /// crossing (angles at multiples of `π/2`) met while sweeping in the
    /// given direction, and the end point.
    ///
    /// The extremes of an arc's bounding box can only occur at these points,
    /// so their box is the arc's box. An axis crossing within
    /// `ANGLE_TOLERANCE` of the start is the start itself and is skipped; a
    /// crossing at the end is kept. A full circle yields the start, the other
    /// three crossings and the closing end.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn bounding_coords(
        &self,
        center: &Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
    ) -> Vec<Point2> {
        let sweep = Self::sweep(
            &ArcAngles {
                start: start_angle,
                middle: start_angle,
                end: end_angle,
            },
            clockwise,
        )
        .abs();

        let mut coords = vec![circle_point_at(center, radius, start_angle)];

        let rem = start_angle.rem_euclid(FRAC_PI_2);
        let mut offset = if clockwise { rem } else { FRAC_PI_2 - rem };
        if offset <= ANGLE_TOLERANCE {
            offset += FRAC_PI_2;
        }
        let direction = if clockwise { -1.0 } else { 1.0 };
        while offset <= sweep + ANGLE_TOLERANCE && offset < TAU - ANGLE_TOLERANCE {
            let axis = ((start_angle + direction * offset) / FRAC_PI_2).round() * FRAC_PI_2;
            coords.push(circle_point_at(center, radius, axis));
            offset += FRAC_PI_2;
        }

        coords.push(circle_point_at(center, radius, end_angle));
        coords
    }

    /// Densifies the arc into points no further than `tolerance` from the
    /// true arc, starting at `start` and ending at `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the arc is degenerate.
    pub fn flatten(&self, tolerance: f64) -> Result<Vec<Point2>> {
        let center = self.center_of_circle()?;
        let radius = self.radius(&center);
        let angles = self.angles(&center)?;
        let sweep = Self::sweep(&angles, self.clockwise(&angles));

        let n_sub = arc_subdivision_count(radius, sweep.abs(), tolerance);
        let mut points = Vec::with_capacity(n_sub as usize + 1);
        points.push(self.start);
        for j in 1..n_sub {
            let t = f64::from(j) / f64::from(n_sub);
            points.push(arc_point_at(&center, radius, angles.start, sweep, t));
        }
        points.push(self.end);
        Ok(points)
    }
}

/// Computes the number of line segments needed to approximate an arc
/// within the given tolerance.
fn arc_subdivision_count(radius: f64, abs_sweep: f64, tolerance: f64) -> u32 {
    if radius < 1e-12 || abs_sweep < 1e-12 || tolerance <= 0.0 {
        return 1;
    }
    // From the sagitta formula: sagitta = r * (1 - cos(θ/2))
    let max_angle = if tolerance >= radius {
        PI
    } else {
        2.0 * (1.0 - tolerance / radius).acos()
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = (abs_sweep / max_angle).ceil() as u32;
    // A full circle needs at least a triangle to keep its area.
    n.max(if abs_sweep > PI { 3 } else { 1 })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: f64 = 1e-9;

    fn on_circle(x: f64, y: f64, radius: f64) -> Point2 {
        Point2::from(Vector2::new(x, y).normalize() * radius)
    }

    fn quarter(start: Point2, middle: Point2, end: Point2) -> CircularArc {
        CircularArc::new(start, middle, end)
    }

    #[test]
    fn angle_from_origin_cardinal_and_diagonal() {
        let o = Point2::origin();
        let cases = [
            ((5.0, 0.0), 0.0),
            ((5.0, 5.0), PI * 0.25),
            ((0.0, 5.0), PI * 0.5),
            ((-5.0, 0.0), PI),
            ((-5.0, -5.0), PI * 1.25),
            ((0.0, -5.0), PI * 1.5),
            ((5.0, -5.0), PI * 1.75),
        ];
        for ((x, y), expected) in cases {
            let angle = angle_from_origin(&o, &Point2::new(x, y)).unwrap();
            assert_relative_eq!(angle, expected, epsilon = TOL);
            assert!((0.0..TAU).contains(&angle), "angle={angle}");
        }
    }

    #[test]
    fn angle_from_origin_zero_vector_fails() {
        let p = Point2::new(1.0, 1.0);
        assert!(angle_from_origin(&p, &p).is_err());
    }

    #[test]
    fn normalize_never_returns_full_turn() {
        assert!(normalize_angle(-1e-18) < TAU);
        assert_relative_eq!(normalize_angle(-FRAC_PI_2), 1.5 * PI, epsilon = TOL);
    }

    #[test]
    fn angles_in_all_quadrants() {
        let top_right = quarter(
            Point2::new(5.0, 0.0),
            on_circle(5.0, 5.0, 5.0),
            Point2::new(0.0, 5.0),
        );
        let angles = top_right.angles(&Point2::origin()).unwrap();
        assert_relative_eq!(angles.start, 0.0, epsilon = TOL);
        assert_relative_eq!(angles.middle, PI * 0.25, epsilon = TOL);
        assert_relative_eq!(angles.end, PI * 0.5, epsilon = TOL);

        let bottom_right = quarter(
            Point2::new(0.0, -5.0),
            on_circle(5.0, -5.0, 5.0),
            Point2::new(5.0, 0.0),
        );
        let angles = bottom_right.angles(&Point2::origin()).unwrap();
        assert_relative_eq!(angles.start, PI * 1.5, epsilon = TOL);
        assert_relative_eq!(angles.middle, PI * 1.75, epsilon = TOL);
        assert_relative_eq!(angles.end, 0.0, epsilon = TOL);
    }

    #[test]
    fn angle_distance_wraps() {
        let (start, middle, end) = (0.0, PI * 0.25, PI * 0.5);
        assert_relative_eq!(CircularArc::angle_distance(start, middle), PI * 0.25, epsilon = TOL);
        assert_relative_eq!(CircularArc::angle_distance(middle, end), PI * 0.25, epsilon = TOL);
        assert_relative_eq!(CircularArc::angle_distance(start, end), PI * 0.5, epsilon = TOL);
        assert_relative_eq!(CircularArc::angle_distance(end, start), PI * 1.5, epsilon = TOL);
        assert_relative_eq!(CircularArc::angle_distance(middle, start), PI * 1.75, epsilon = TOL);
    }

    #[test]
    fn clockwise_quarter_arcs_in_every_quadrant() {
        let r = 5.0;
        let quadrants = [
            (Point2::new(r, 0.0), on_circle(1.0, 1.0, r), Point2::new(0.0, r)),
            (Point2::new(0.0, r), on_circle(-1.0, 1.0, r), Point2::new(-r, 0.0)),
            (Point2::new(-r, 0.0), on_circle(-1.0, -1.0, r), Point2::new(0.0, -r)),
            (Point2::new(0.0, -r), on_circle(1.0, -1.0, r), Point2::new(r, 0.0)),
        ];
        for (start, middle, end) in quadrants {
            let ccw = CircularArc::new(start, middle, end);
            let center = ccw.center_of_circle().unwrap();
            assert!(!ccw.clockwise(&ccw.angles(&center).unwrap()));

            let cw = CircularArc::new(end, middle, start);
            let center = cw.center_of_circle().unwrap();
            assert!(cw.clockwise(&cw.angles(&center).unwrap()));
        }
    }

    #[test]
    fn center_of_circle_simple_cases() {
        let around_origin = quarter(
            Point2::new(5.0, 0.0),
            on_circle(5.0, 5.0, 5.0),
            Point2::new(0.0, 5.0),
        );
        assert!(points_equal(&around_origin.center_of_circle().unwrap(), &Point2::origin()));

        let around_two_two = quarter(
            Point2::new(7.0, 2.0),
            on_circle(5.0, 5.0, 5.0) + Vector2::new(2.0, 2.0),
            Point2::new(2.0, 7.0),
        );
        let center = around_two_two.center_of_circle().unwrap();
        assert_relative_eq!(center.x, 2.0, epsilon = TOL);
        assert_relative_eq!(center.y, 2.0, epsilon = TOL);
    }

    #[test]
    fn center_is_equidistant_from_all_points() {
        let triples = [
            ((1.0, 2.0), (2.0, 4.0), (4.0, 2.0)),
            ((4.0, 5.0), (3.0, 6.0), (4.0, 8.0)),
            ((-120.5, 33.0), (10.25, 900.0), (400.0, -17.0)),
            ((1.5, 2.5), (2.0, 3.0), (3.0, 1.5)),
        ];
        for ((x0, y0), (x1, y1), (x2, y2)) in triples {
            let arc = CircularArc::new(Point2::new(x0, y0), Point2::new(x1, y1), Point2::new(x2, y2));
            let center = arc.center_of_circle().unwrap();
            let r0 = (arc.start - center).norm();
            let r1 = (arc.middle - center).norm();
            let r2 = (arc.end - center).norm();
            assert_relative_eq!(r0, r1, max_relative = TOL);
            assert_relative_eq!(r0, r2, max_relative = TOL);
            assert_relative_eq!(arc.radius(&center), r0);
        }
    }

    #[test]
    fn collinear_points_have_no_center() {
        let arc = CircularArc::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0));
        assert!(arc.center_of_circle().is_err());

        let coincident = CircularArc::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0), Point2::new(1.0, 1.0));
        assert!(coincident.center_of_circle().is_err());
    }

    #[test]
    fn full_circle_center_is_diameter_midpoint() {
        let arc = CircularArc::new(Point2::new(2.0, 0.0), Point2::new(3.0, 0.0), Point2::new(2.0, 0.0));
        assert!(arc.is_full_circle());
        let center = arc.center_of_circle().unwrap();
        assert_relative_eq!(center.x, 2.5, epsilon = TOL);
        assert_relative_eq!(center.y, 0.0, epsilon = TOL);
        let angles = arc.angles(&center).unwrap();
        assert!(!arc.clockwise(&angles));
        assert_relative_eq!(CircularArc::sweep(&angles, false), TAU, epsilon = TOL);
    }

    #[test]
    fn bounding_coords_counts() {
        let arc = quarter(
            Point2::new(5.0, 0.0),
            on_circle(5.0, 5.0, 5.0),
            Point2::new(0.0, 5.0),
        );
        let center = arc.center_of_circle().unwrap();
        let angles = arc.angles(&center).unwrap();
        let coords = arc.bounding_coords(&center, 5.0, angles.start, angles.end, arc.clockwise(&angles));
        assert_eq!(coords.len(), 3);

        let half = CircularArc::new(
            on_circle(5.0, -5.0, 5.0),
            on_circle(5.0, 5.0, 5.0),
            on_circle(-5.0, 5.0, 5.0),
        );
        let center = half.center_of_circle().unwrap();
        let angles = half.angles(&center).unwrap();
        let coords = half.bounding_coords(&center, 5.0, angles.start, angles.end, half.clockwise(&angles));
        assert_eq!(coords.len(), 4);

        let full = CircularArc::new(Point2::new(5.0, 0.0), Point2::new(-5.0, 0.0), Point2::new(5.0, 0.0));
        let center = full.center_of_circle().unwrap();
        let angles = full.angles(&center).unwrap();
        let coords = full.bounding_coords(&center, 5.0, angles.start, angles.end, full.clockwise(&angles));
        assert_eq!(coords.len(), 5);
        assert!(points_equal(&coords[0], &coords[4]));
    }

    #[test]
    fn bounding_coords_clockwise_half_circle_over_the_top() {
        // Clockwise from (-5, 0) over the top to (5, 0): crosses π/2, then
        // ends on the 0 axis.
        let arc = CircularArc::new(Point2::new(-5.0, 0.0), Point2::new(0.0, 5.0), Point2::new(5.0, 0.0));
        let center = arc.center_of_circle().unwrap();
        let angles = arc.angles(&center).unwrap();
        assert!(arc.clockwise(&angles));
        let coords = arc.bounding_coords(&center, 5.0, angles.start, angles.end, true);
        assert_eq!(coords.len(), 4);
        let max_y = coords.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let min_y = coords.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        assert_relative_eq!(max_y, 5.0, epsilon = TOL);
        assert!(min_y > -TOL);
    }

    #[test]
    fn flatten_stays_on_circle() {
        let arc = CircularArc::new(Point2::new(1.0, 2.0), Point2::new(2.0, 4.0), Point2::new(4.0, 2.0));
        let center = arc.center_of_circle().unwrap();
        let radius = arc.radius(&center);
        let points = arc.flatten(0.01).unwrap();
        assert!(points.len() > 3);
        assert_eq!(points[0], arc.start);
        assert_eq!(*points.last().unwrap(), arc.end);
        for p in &points {
            assert_relative_eq!((p - center).norm(), radius, epsilon = 1e-9);
        }
    }

    #[test]
    fn subdivision_count_large_tolerance() {
        assert_eq!(arc_subdivision_count(1.0, PI, 10.0), 1);
        assert!(arc_subdivision_count(1.0, PI, 0.001) > 10);
        assert_eq!(arc_subdivision_count(1.0, TAU, 10.0), 3);
    }
}
