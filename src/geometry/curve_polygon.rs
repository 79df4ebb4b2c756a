//! Polygons bounded by curved rings.
//!
//! Ring 0 is the outer boundary and winds clockwise; every following ring is
//! a hole and winds counter-clockwise. The winding is restored after every
//! construction and transform, reversing offending rings in place.

use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::flat::{linear_rings_contain_xy, signed_area};
use crate::math::{points_equal, Extent, Point2, TOLERANCE};

use super::{
    ClosestPoint, CircularString, CompoundCurve, Coordinate, CurveGeometry, CurveSegment, GeometryType, Layout,
    LineString, Memo,
};

/// One closed ring of a curve polygon.
#[derive(Debug, Clone)]
pub enum Ring {
    Line(LineString),
    Circular(CircularString),
    Compound(CompoundCurve),
}

impl From<LineString> for Ring {
    fn from(value: LineString) -> Self {
        Ring::Line(value)
    }
}

impl From<CircularString> for Ring {
    fn from(value: CircularString) -> Self {
        Ring::Circular(value)
    }
}

impl From<CompoundCurve> for Ring {
    fn from(value: CompoundCurve) -> Self {
        Ring::Compound(value)
    }
}

impl Ring {
    #[must_use]
    pub fn as_curve(&self) -> &dyn CurveGeometry {
        match self {
            Ring::Line(g) => g,
            Ring::Circular(g) => g,
            Ring::Compound(g) => g,
        }
    }

    pub fn as_curve_mut(&mut self) -> &mut dyn CurveGeometry {
        match self {
            Ring::Line(g) => g,
            Ring::Circular(g) => g,
            Ring::Compound(g) => g,
        }
    }

    /// Densifies the ring; arcs are split so that no point strays further
    /// than `tolerance` from them.
    #[must_use]
    pub fn flatten(&self, tolerance: f64) -> Vec<Point2> {
        match self {
            Ring::Line(g) => g.points(),
            Ring::Circular(g) => g.flatten(tolerance),
            Ring::Compound(g) => {
                let mut points: Vec<Point2> = Vec::new();
                for segment in g.segments() {
                    let segment_points = match segment {
                        CurveSegment::Line(line) => line.points(),
                        CurveSegment::Circular(cs) => cs.flatten(tolerance),
                    };
                    let skip = usize::from(!points.is_empty());
                    points.extend(segment_points.into_iter().skip(skip));
                }
                points
            }
        }
    }

    /// A full-circle arc reads the same in both directions; splitting it
    /// makes the ring reversible.
    fn split_full_circles(&mut self) -> bool {
        match self {
            Ring::Line(_) => false,
            Ring::Circular(g) => g.split_full_circles(),
            Ring::Compound(g) => g.split_full_circles(),
        }
    }

    fn signed_area(&self, tolerance: f64) -> f64 {
        let flat: Vec<f64> = self.flatten(tolerance).iter().flat_map(|p| [p.x, p.y]).collect();
        signed_area(&flat, 2)
    }
}

/// A point inside a polygon together with the width of the horizontal span
/// it was taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteriorPoint {
    pub point: Point2,
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct CurvePolygon {
    layout: Layout,
    rings: Vec<Ring>,
    flat: Vec<f64>,
    ends: Vec<usize>,
    revision: u64,
    extent: Memo<Extent>,
    interior_point: Memo<InteriorPoint>,
}

impl CurvePolygon {
    /// Creates a polygon from its outer ring followed by its holes.
    ///
    /// # Errors
    ///
    /// Returns an error if `rings` is empty, if the rings do not share one
    /// layout, or if a ring does not end where it starts.
    pub fn new(rings: Vec<Ring>) -> Result<Self> {
        let layout = Self::validate(&rings)?;
        let mut polygon = Self {
            layout,
            rings,
            flat: Vec::new(),
            ends: Vec::new(),
            revision: 0,
            extent: Memo::default(),
            interior_point: Memo::default(),
        };
        polygon.orient_rings();
        Ok(polygon)
    }

    fn validate(rings: &[Ring]) -> Result<Layout> {
        let Some(first) = rings.first() else {
            return Err(GeometryError::Degenerate("curve polygon without rings".into()).into());
        };
        let layout = first.as_curve().layout();
        for (index, ring) in rings.iter().enumerate() {
            let curve = ring.as_curve();
            if curve.layout() != layout {
                return Err(GeometryError::LayoutMismatch {
                    expected: layout.name(),
                    found: curve.layout().name(),
                }
                .into());
            }
            if !points_equal(&curve.first_point(), &curve.last_point()) {
                return Err(GeometryError::RingNotClosed { index }.into());
            }
        }
        Ok(layout)
    }

    /// Replaces every ring.
    ///
    /// # Errors
    ///
    /// See [`CurvePolygon::new`]. On error the polygon is left unchanged.
    pub fn set_rings(&mut self, rings: Vec<Ring>) -> Result<()> {
        self.layout = Self::validate(&rings)?;
        self.rings = rings;
        self.orient_rings();
        self.changed();
        Ok(())
    }

    /// Reverses every ring whose winding disagrees with its role, then
    /// refreshes the concatenated buffer.
    fn orient_rings(&mut self) {
        let extent = self.compute_extent();
        let tolerance = extent.width().max(extent.height()) * 1e-3;
        for (index, ring) in self.rings.iter_mut().enumerate() {
            let area = ring.signed_area(tolerance);
            if area.abs() < TOLERANCE {
                continue;
            }
            // Outer ring clockwise (negative area), holes counter-clockwise.
            let wrong = if index == 0 { area > 0.0 } else { area < 0.0 };
            if wrong {
                debug!(ring = index, area, "reversing ring to restore winding");
                ring.split_full_circles();
                ring.as_curve_mut().reverse();
            }
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.flat.clear();
        self.ends.clear();
        for ring in &self.rings {
            self.flat.extend_from_slice(ring.as_curve().flat_coordinates());
            self.ends.push(self.flat.len());
        }
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.extent.invalidate();
        self.interior_point.invalidate();
    }

    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        GeometryType::CurvePolygon
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Coordinates of every ring, concatenated.
    #[must_use]
    pub fn flat_coordinates(&self) -> &[f64] {
        &self.flat
    }

    /// Offsets into [`CurvePolygon::flat_coordinates`] where each ring ends.
    #[must_use]
    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// Coordinates of every ring, ring by ring.
    #[must_use]
    pub fn coordinates(&self) -> Vec<Vec<Coordinate>> {
        self.rings.iter().map(|ring| ring.as_curve().coordinates()).collect()
    }

    fn compute_extent(&self) -> Extent {
        let mut extent = Extent::empty();
        for ring in &self.rings {
            extent.extend(&ring.as_curve().extent());
        }
        extent
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        *self.extent.get_or_init(|| self.compute_extent())
    }

    fn flattened_rings(&self) -> Vec<Vec<Point2>> {
        let extent = self.extent();
        let tolerance = extent.width().max(extent.height()) * 1e-3;
        self.rings.iter().map(|ring| ring.flatten(tolerance)).collect()
    }

    /// Returns whether `(x, y)` lies inside the outer ring and outside every
    /// hole, testing against the densified rings.
    #[must_use]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.extent().contains_xy(x, y) && linear_rings_contain_xy(&self.flattened_rings(), x, y)
    }

    /// Returns a point inside the polygon suitable for a label.
    ///
    /// A horizontal line through the middle of the extent is cut by the
    /// rings; the result is the center of the widest span that lies inside
    /// the polygon. Falls back to the extent center with zero width when the
    /// line finds no such span.
    pub fn interior_point(&self) -> InteriorPoint {
        *self.interior_point.get_or_init(|| self.compute_interior_point())
    }

    fn compute_interior_point(&self) -> InteriorPoint {
        let extent = self.extent();
        let y = extent.center().y;
        let rings = self.flattened_rings();

        let mut crossings = Vec::new();
        for ring in &rings {
            for edge in ring.windows(2) {
                let (a, b) = (edge[0], edge[1]);
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        let mut best: Option<InteriorPoint> = None;
        for span in crossings.windows(2) {
            let width = span[1] - span[0];
            let x = (span[0] + span[1]) * 0.5;
            if best.is_some_and(|b| width <= b.width) || !linear_rings_contain_xy(&rings, x, y) {
                continue;
            }
            best = Some(InteriorPoint {
                point: Point2::new(x, y),
                width,
            });
        }
        best.unwrap_or_else(|| {
            debug!("scan line found no interior span, using extent center");
            InteriorPoint {
                point: extent.center(),
                width: 0.0,
            }
        })
    }

    /// Searches every ring; arcs are approximated by their chords.
    pub fn closest_point_xy(&self, x: f64, y: f64, best: &mut ClosestPoint) -> f64 {
        if best.squared_distance < self.extent().closest_squared_distance_xy(x, y) {
            return best.squared_distance;
        }
        for ring in &self.rings {
            ring.as_curve().closest_point_xy(x, y, best);
        }
        best.squared_distance
    }

    /// Rewrites every ring through `transform` and restores the winding,
    /// which a mirroring transform flips.
    pub fn apply_transform(&mut self, transform: &mut dyn FnMut(&mut [f64], usize)) {
        for ring in &mut self.rings {
            ring.as_curve_mut().apply_transform(transform);
        }
        self.orient_rings();
        self.changed();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{flat, transform_2d};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-9;

    fn xy(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| Coordinate::xy(x, y)).collect()
    }

    fn line_ring(points: &[(f64, f64)]) -> Ring {
        LineString::new(&xy(points), Layout::Xy).unwrap().into()
    }

    fn ring_area(ring: &Ring) -> f64 {
        let curve = ring.as_curve();
        flat::signed_area(curve.flat_coordinates(), curve.stride())
    }

    fn square_with_hole() -> CurvePolygon {
        CurvePolygon::new(vec![
            // Counter-clockwise outer ring.
            line_ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
            // Clockwise hole.
            line_ring(&[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0), (1.0, 1.0)]),
        ])
        .unwrap()
    }

    /// Four arcs forming a full circle, control points off the axes.
    fn circle_ring(radius: f64) -> Ring {
        let mut points: Vec<(f64, f64)> = (0..8)
            .map(|k| {
                let angle = PI / 8.0 + f64::from(k) * PI / 4.0;
                (radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        points.push(points[0]);
        CircularString::new(&xy(&points), Layout::Xy).unwrap().into()
    }

    #[test]
    fn rings_are_reoriented() {
        let polygon = square_with_hole();
        assert!(ring_area(&polygon.rings()[0]) < 0.0);
        assert!(ring_area(&polygon.rings()[1]) > 0.0);
        // The concatenated buffer follows the reversed rings.
        assert_eq!(polygon.ends(), &[10, 20]);
        assert_eq!(&polygon.flat_coordinates()[..4], &[0.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn correctly_wound_rings_are_kept() {
        let polygon = CurvePolygon::new(vec![line_ring(&[
            (0.0, 0.0),
            (0.0, 4.0),
            (4.0, 4.0),
            (4.0, 0.0),
            (0.0, 0.0),
        ])])
        .unwrap();
        assert_eq!(polygon.coordinates()[0][1], Coordinate::xy(0.0, 4.0));
    }

    #[test]
    fn open_ring_is_rejected() {
        let err = CurvePolygon::new(vec![
            line_ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]),
            line_ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Geometry(GeometryError::RingNotClosed { index: 1 })
        ));
        assert!(CurvePolygon::new(Vec::new()).is_err());
    }

    #[test]
    fn full_circle_ring_extent_is_the_circle_square() {
        let polygon = CurvePolygon::new(vec![circle_ring(3.0)]).unwrap();
        let e = polygon.extent();
        assert!(!e.is_empty());
        assert_relative_eq!(e.min_x, -3.0, epsilon = TOL);
        assert_relative_eq!(e.min_y, -3.0, epsilon = TOL);
        assert_relative_eq!(e.max_x, 3.0, epsilon = TOL);
        assert_relative_eq!(e.max_y, 3.0, epsilon = TOL);
        // The counter-clockwise control points were reversed.
        let Ring::Circular(cs) = &polygon.rings()[0] else {
            panic!("ring should stay circular");
        };
        assert_eq!(cs.arc_count(), 4);
        assert!(polygon.rings()[0].signed_area(0.01) < 0.0);
    }

    #[test]
    fn interior_point_avoids_holes() {
        let polygon = square_with_hole();
        let interior = polygon.interior_point();
        assert_relative_eq!(interior.point.x, 0.5, epsilon = TOL);
        assert_relative_eq!(interior.point.y, 2.0, epsilon = TOL);
        assert_relative_eq!(interior.width, 1.0, epsilon = TOL);
        assert!(polygon.contains_xy(interior.point.x, interior.point.y));
        assert!(!polygon.contains_xy(2.0, 2.0));
    }

    #[test]
    fn interior_point_of_circle_is_its_center() {
        let polygon = CurvePolygon::new(vec![circle_ring(2.0)]).unwrap();
        let interior = polygon.interior_point();
        assert!(interior.point.x.abs() < 1e-2);
        assert!(interior.point.y.abs() < TOL);
        assert_relative_eq!(interior.width, 4.0, epsilon = 1e-2);
    }

    #[test]
    fn zero_area_polygon_falls_back_to_extent_center() {
        let polygon =
            CurvePolygon::new(vec![line_ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)])]).unwrap();
        let interior = polygon.interior_point();
        assert_eq!(interior.point, Point2::new(1.0, 0.0));
        assert!(interior.width.abs() < TOL);
    }

    #[test]
    fn mirroring_keeps_winding() {
        let mut polygon = square_with_hole();
        polygon.apply_transform(&mut transform_2d::scale(-1.0, 1.0, Point2::origin()));
        assert_eq!(polygon.revision(), 1);
        assert!(ring_area(&polygon.rings()[0]) < 0.0);
        assert!(ring_area(&polygon.rings()[1]) > 0.0);
        assert_relative_eq!(polygon.extent().min_x, -4.0, epsilon = TOL);
        assert_relative_eq!(polygon.interior_point().point.x, -3.5, epsilon = TOL);
    }

    #[test]
    fn compound_and_circular_rings() {
        let outer = CompoundCurve::new(vec![
            CircularString::new(&xy(&[(1.0, 2.0), (2.0, 4.0), (4.0, 2.0)]), Layout::Xy).unwrap().into(),
            LineString::new(&xy(&[(4.0, 2.0), (5.0, 4.0), (4.0, 5.0)]), Layout::Xy).unwrap().into(),
            CircularString::new(&xy(&[(4.0, 5.0), (3.0, 6.0), (4.0, 8.0)]), Layout::Xy).unwrap().into(),
            LineString::new(&xy(&[(4.0, 8.0), (8.0, 4.0), (8.0, -2.0), (2.0, -2.0), (1.0, 2.0)]), Layout::Xy)
                .unwrap()
                .into(),
        ])
        .unwrap();
        let polygon = CurvePolygon::new(vec![
            outer.into(),
            CircularString::new(&xy(&[(1.5, 2.5), (2.0, 3.0), (3.0, 1.5), (2.0, 1.0), (1.5, 2.5)]), Layout::Xy)
                .unwrap()
                .into(),
            CircularString::new(&xy(&[(2.0, 0.0), (3.0, 0.0), (2.0, 0.0)]), Layout::Xy).unwrap().into(),
            line_ring(&[(7.0, 1.0), (6.0, 2.0), (5.0, 1.0), (7.0, 1.0)]),
        ])
        .unwrap();
        assert_eq!(polygon.rings().len(), 4);
        assert_eq!(polygon.ends().len(), 4);
        assert!(polygon.rings()[0].signed_area(0.01) < 0.0);
        for hole in &polygon.rings()[1..] {
            assert!(hole.signed_area(0.01) > 0.0);
        }
        assert!(polygon.contains_xy(6.0, 0.0));
        assert!(!polygon.contains_xy(2.5, 0.0));
        let mut best = ClosestPoint::new();
        polygon.closest_point_xy(8.5, 0.0, &mut best);
        assert_relative_eq!(best.x(), 8.0, epsilon = TOL);
        assert_relative_eq!(best.distance(), 0.5, epsilon = TOL);
    }

    #[test]
    fn single_arc_circle_outer_ring_winds_clockwise() {
        let polygon = CurvePolygon::new(vec![
            CircularString::new(&xy(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]), Layout::Xy)
                .unwrap()
                .into(),
            line_ring(&[(4.0, -1.0), (6.0, -1.0), (6.0, 1.0), (4.0, 1.0), (4.0, -1.0)]),
        ])
        .unwrap();
        let Ring::Circular(outer) = &polygon.rings()[0] else {
            panic!("ring should stay circular");
        };
        assert_eq!(outer.arc_count(), 2);
        for arc in outer.arcs() {
            let center = arc.center_of_circle().unwrap();
            assert_relative_eq!(center.x, 5.0, epsilon = TOL);
            assert_relative_eq!(center.y, 0.0, epsilon = TOL);
            assert!(arc.clockwise(&arc.angles(&center).unwrap()));
        }
        assert!(polygon.rings()[0].signed_area(0.01) < 0.0);
        assert_relative_eq!(ring_area(&polygon.rings()[1]), 4.0, epsilon = TOL);
        assert_eq!(polygon.ends(), &[10, 20]);

        let e = polygon.extent();
        assert_relative_eq!(e.min_x, 0.0, epsilon = TOL);
        assert_relative_eq!(e.max_x, 10.0, epsilon = TOL);
        assert_relative_eq!(e.min_y, -5.0, epsilon = TOL);
        assert_relative_eq!(e.max_y, 5.0, epsilon = TOL);
        assert!(polygon.contains_xy(2.0, 0.0));
        assert!(!polygon.contains_xy(5.0, 0.0));
    }

    #[test]
    fn single_arc_circle_hole_is_kept() {
        let polygon = CurvePolygon::new(vec![
            line_ring(&[(0.0, 0.0), (0.0, 8.0), (8.0, 8.0), (8.0, 0.0), (0.0, 0.0)]),
            CircularString::new(&xy(&[(2.0, 4.0), (6.0, 4.0), (2.0, 4.0)]), Layout::Xy)
                .unwrap()
                .into(),
        ])
        .unwrap();
        assert_eq!(polygon.rings()[1].as_curve().flat_coordinates().len(), 6);
        assert!(polygon.rings()[1].signed_area(0.01) > 0.0);
    }
}
