pub mod circular_string;
pub mod compound_curve;
pub mod curve_polygon;
pub mod line_string;

pub use circular_string::CircularString;
pub use compound_curve::{CompoundCurve, CurveSegment, SegmentDescription};
pub use curve_polygon::{CurvePolygon, InteriorPoint, Ring};
pub use line_string::LineString;

pub use crate::math::flat::ClosestPoint;

use std::cell::OnceCell;

use crate::error::{GeometryError, Result};
use crate::math::{transform_2d, Extent, Point2};

/// Ordinate layout of a coordinate: which of Z and M accompany X and Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl Layout {
    /// Number of ordinates per coordinate.
    #[must_use]
    pub fn stride(self) -> usize {
        match self {
            Layout::Xy => 2,
            Layout::Xyz | Layout::Xym => 3,
            Layout::Xyzm => 4,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Layout::Xy => "XY",
            Layout::Xyz => "XYZ",
            Layout::Xym => "XYM",
            Layout::Xyzm => "XYZM",
        }
    }

    /// Returns the layout matching the ordinates present in `coordinate`.
    #[must_use]
    pub fn of(coordinate: &Coordinate) -> Self {
        match (coordinate.z.is_some(), coordinate.m.is_some()) {
            (false, false) => Layout::Xy,
            (true, false) => Layout::Xyz,
            (false, true) => Layout::Xym,
            (true, true) => Layout::Xyzm,
        }
    }
}

/// A single position with optional elevation and measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coordinate {
    #[must_use]
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None, m: None }
    }

    #[must_use]
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z), m: None }
    }

    #[must_use]
    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Self { x, y, z: None, m: Some(m) }
    }

    #[must_use]
    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }

    /// Reads one coordinate from `layout.stride()` ordinates.
    #[must_use]
    pub fn from_ordinates(ordinates: &[f64], layout: Layout) -> Self {
        let (x, y) = (ordinates[0], ordinates[1]);
        match layout {
            Layout::Xy => Self::xy(x, y),
            Layout::Xyz => Self::xyz(x, y, ordinates[2]),
            Layout::Xym => Self::xym(x, y, ordinates[2]),
            Layout::Xyzm => Self::xyzm(x, y, ordinates[2], ordinates[3]),
        }
    }
}

/// Flattens coordinates into a buffer with `layout.stride()` ordinates each.
///
/// # Errors
///
/// Returns `GeometryError::LayoutMismatch` if a coordinate carries other
/// ordinates than `layout` describes.
pub fn deflate_coordinates(coordinates: &[Coordinate], layout: Layout) -> Result<Vec<f64>> {
    let mut flat = Vec::with_capacity(coordinates.len() * layout.stride());
    for c in coordinates {
        let found = Layout::of(c);
        if found != layout {
            return Err(GeometryError::LayoutMismatch {
                expected: layout.name(),
                found: found.name(),
            }
            .into());
        }
        flat.extend_from_slice(&[c.x, c.y]);
        flat.extend(c.z);
        flat.extend(c.m);
    }
    Ok(flat)
}

/// Rebuilds coordinates from a flat buffer.
#[must_use]
pub fn inflate_coordinates(flat: &[f64], layout: Layout) -> Vec<Coordinate> {
    flat.chunks_exact(layout.stride())
        .map(|chunk| Coordinate::from_ordinates(chunk, layout))
        .collect()
}

/// Checks that a flat buffer holds whole coordinates and returns their count.
fn coordinate_count(flat: &[f64], layout: Layout, geometry: &'static str) -> Result<usize> {
    let stride = layout.stride();
    if flat.len() % stride != 0 {
        return Err(GeometryError::InvalidCoordinateCount {
            geometry,
            count: flat.len() / stride,
            expected: "whole coordinates for the layout",
        }
        .into());
    }
    Ok(flat.len() / stride)
}

/// Value derived from a geometry's coordinates, computed on first access
/// and dropped whenever the owning geometry changes.
#[derive(Debug, Clone)]
pub(crate) struct Memo<T>(OnceCell<T>);

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self(OnceCell::new())
    }
}

impl<T> Memo<T> {
    pub(crate) fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(f)
    }

    pub(crate) fn invalidate(&mut self) {
        self.0.take();
    }
}

/// Geometry type tag, as named by SQL/MM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    LineString,
    CircularString,
    CompoundCurve,
    CurvePolygon,
}

impl GeometryType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            GeometryType::LineString => "LineString",
            GeometryType::CircularString => "CircularString",
            GeometryType::CompoundCurve => "CompoundCurve",
            GeometryType::CurvePolygon => "CurvePolygon",
        }
    }
}

/// Behaviour shared by every one-dimensional geometry.
///
/// Every mutating method bumps [`CurveGeometry::revision`] and drops the
/// geometry's derived buffers.
pub trait CurveGeometry {
    fn geometry_type(&self) -> GeometryType;

    fn layout(&self) -> Layout;

    fn stride(&self) -> usize {
        self.layout().stride()
    }

    /// Returns the coordinates as one flat buffer.
    fn flat_coordinates(&self) -> &[f64];

    /// Returns the coordinates in the construction layout.
    fn coordinates(&self) -> Vec<Coordinate> {
        inflate_coordinates(self.flat_coordinates(), self.layout())
    }

    /// Counter advanced by every mutation.
    fn revision(&self) -> u64;

    fn extent(&self) -> Extent;

    /// Updates `best` if a point of this geometry is closer to `(x, y)`,
    /// returning the best squared distance.
    fn closest_point_xy(&self, x: f64, y: f64, best: &mut ClosestPoint) -> f64;

    /// Rewrites the coordinates in place through `transform`.
    fn apply_transform(&mut self, transform: &mut dyn FnMut(&mut [f64], usize));

    /// Reverses the traversal direction.
    fn reverse(&mut self);

    /// Replaces every coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinates are invalid for the geometry type,
    /// or if the geometry cannot be rebuilt from coordinates alone.
    fn set_coordinates(&mut self, coordinates: &[Coordinate], layout: Layout) -> Result<()>;

    fn first_point(&self) -> Point2 {
        let flat = self.flat_coordinates();
        Point2::new(flat[0], flat[1])
    }

    fn last_point(&self) -> Point2 {
        let flat = self.flat_coordinates();
        let last = flat.len() - self.stride();
        Point2::new(flat[last], flat[last + 1])
    }
}

/// Any curved geometry this crate renders.
#[derive(Debug, Clone)]
pub enum Geometry {
    CircularString(CircularString),
    CompoundCurve(CompoundCurve),
    CurvePolygon(CurvePolygon),
}

impl From<CircularString> for Geometry {
    fn from(value: CircularString) -> Self {
        Geometry::CircularString(value)
    }
}

impl From<CompoundCurve> for Geometry {
    fn from(value: CompoundCurve) -> Self {
        Geometry::CompoundCurve(value)
    }
}

impl From<CurvePolygon> for Geometry {
    fn from(value: CurvePolygon) -> Self {
        Geometry::CurvePolygon(value)
    }
}

impl Geometry {
    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::CircularString(_) => GeometryType::CircularString,
            Geometry::CompoundCurve(_) => GeometryType::CompoundCurve,
            Geometry::CurvePolygon(_) => GeometryType::CurvePolygon,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        match self {
            Geometry::CircularString(g) => g.layout(),
            Geometry::CompoundCurve(g) => g.layout(),
            Geometry::CurvePolygon(g) => g.layout(),
        }
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        match self {
            Geometry::CircularString(g) => g.revision(),
            Geometry::CompoundCurve(g) => g.revision(),
            Geometry::CurvePolygon(g) => g.revision(),
        }
    }

    #[must_use]
    pub fn flat_coordinates(&self) -> &[f64] {
        match self {
            Geometry::CircularString(g) => g.flat_coordinates(),
            Geometry::CompoundCurve(g) => g.flat_coordinates(),
            Geometry::CurvePolygon(g) => g.flat_coordinates(),
        }
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        match self {
            Geometry::CircularString(g) => g.extent(),
            Geometry::CompoundCurve(g) => g.extent(),
            Geometry::CurvePolygon(g) => g.extent(),
        }
    }

    #[must_use]
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        match self {
            Geometry::CompoundCurve(g) => g.intersects_extent(extent),
            _ => self.extent().intersects(extent),
        }
    }

    /// See [`CurveGeometry::closest_point_xy`].
    pub fn closest_point_xy(&self, x: f64, y: f64, best: &mut ClosestPoint) -> f64 {
        match self {
            Geometry::CircularString(g) => g.closest_point_xy(x, y, best),
            Geometry::CompoundCurve(g) => g.closest_point_xy(x, y, best),
            Geometry::CurvePolygon(g) => g.closest_point_xy(x, y, best),
        }
    }

    /// Returns the point of the geometry closest to `(x, y)`.
    ///
    /// Arcs are searched along their control-point chords, so the result
    /// approximates the true closest point on a curved stretch.
    #[must_use]
    pub fn closest_point(&self, x: f64, y: f64) -> ClosestPoint {
        let mut best = ClosestPoint::new();
        self.closest_point_xy(x, y, &mut best);
        best
    }

    /// Rewrites the coordinates in place through `transform`.
    pub fn apply_transform(&mut self, mut transform: impl FnMut(&mut [f64], usize)) {
        match self {
            Geometry::CircularString(g) => g.apply_transform(&mut transform),
            Geometry::CompoundCurve(g) => g.apply_transform(&mut transform),
            Geometry::CurvePolygon(g) => g.apply_transform(&mut transform),
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.apply_transform(transform_2d::translate(dx, dy));
    }

    /// Rotates counter-clockwise by `angle` radians around `anchor`.
    pub fn rotate(&mut self, angle: f64, anchor: Point2) {
        self.apply_transform(transform_2d::rotate(angle, anchor));
    }

    pub fn scale(&mut self, sx: f64, sy: f64, anchor: Point2) {
        self.apply_transform(transform_2d::scale(sx, sy, anchor));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn layout_strides() {
        assert_eq!(Layout::Xy.stride(), 2);
        assert_eq!(Layout::Xyz.stride(), 3);
        assert_eq!(Layout::Xym.stride(), 3);
        assert_eq!(Layout::Xyzm.stride(), 4);
        assert_eq!(Layout::of(&Coordinate::xym(0.0, 0.0, 1.0)), Layout::Xym);
    }

    #[test]
    fn deflate_inflate_keeps_measures() {
        let coords = vec![Coordinate::xym(1.0, 2.0, 9.0), Coordinate::xym(3.0, 4.0, 8.0)];
        let flat = deflate_coordinates(&coords, Layout::Xym).unwrap();
        assert_eq!(flat, vec![1.0, 2.0, 9.0, 3.0, 4.0, 8.0]);
        assert_eq!(inflate_coordinates(&flat, Layout::Xym), coords);
    }

    #[test]
    fn deflate_rejects_mixed_layouts() {
        let coords = vec![Coordinate::xy(1.0, 2.0), Coordinate::xyz(3.0, 4.0, 5.0)];
        let err = deflate_coordinates(&coords, Layout::Xy).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Geometry(GeometryError::LayoutMismatch { expected: "XY", found: "XYZ" })
        ));
    }

    #[test]
    fn partial_coordinates_are_rejected() {
        assert!(coordinate_count(&[1.0, 2.0, 3.0], Layout::Xy, "LineString").is_err());
        assert_eq!(coordinate_count(&[1.0, 2.0, 3.0], Layout::Xyz, "LineString").unwrap(), 1);
    }

    #[test]
    fn memo_recomputes_after_invalidate() {
        let mut memo = Memo::default();
        assert_eq!(*memo.get_or_init(|| 1), 1);
        assert_eq!(*memo.get_or_init(|| 2), 1);
        memo.invalidate();
        assert_eq!(*memo.get_or_init(|| 3), 3);
    }
}
