//! Consecutive three-point arcs sharing their endpoints.
//!
//! Besides the logical coordinates, a circular string derives two buffers on
//! demand: the centers of the fitted circles (two numbers per arc) and the
//! drawable buffer (start, middle, center, end per arc, eight numbers) read by
//! the extent computation and the instruction builder. An arc whose points
//! became collinear after a transform gets a NaN center in both buffers.

use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::flat::{assign_closest_point, max_squared_delta, reverse_coordinates};
use crate::math::{CircularArc, Extent, Point2, Vector2};

use super::{coordinate_count, deflate_coordinates, ClosestPoint, Coordinate, CurveGeometry, GeometryType, Layout, Memo};

#[derive(Debug, Clone)]
pub struct CircularString {
    layout: Layout,
    flat: Vec<f64>,
    revision: u64,
    centers: Memo<Vec<f64>>,
    drawable: Memo<Vec<f64>>,
    extent: Memo<Extent>,
    max_delta: Memo<f64>,
}

fn arc_from_flat(flat: &[f64], stride: usize, index: usize) -> CircularArc {
    let o = 2 * index * stride;
    CircularArc::new(
        Point2::new(flat[o], flat[o + 1]),
        Point2::new(flat[o + stride], flat[o + stride + 1]),
        Point2::new(flat[o + 2 * stride], flat[o + 2 * stride + 1]),
    )
}

impl CircularString {
    /// Creates a circular string from `2n + 1` coordinates forming `n` arcs.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate count is not odd and at least 3,
    /// if a coordinate does not match `layout`, or if any arc is collinear.
    pub fn new(coordinates: &[Coordinate], layout: Layout) -> Result<Self> {
        Self::from_flat_coordinates(deflate_coordinates(coordinates, layout)?, layout)
    }

    /// Creates a circular string from a flat buffer.
    ///
    /// # Errors
    ///
    /// See [`CircularString::new`].
    pub fn from_flat_coordinates(flat: Vec<f64>, layout: Layout) -> Result<Self> {
        Self::validate(&flat, layout)?;
        Ok(Self {
            layout,
            flat,
            revision: 0,
            centers: Memo::default(),
            drawable: Memo::default(),
            extent: Memo::default(),
            max_delta: Memo::default(),
        })
    }

    fn validate(flat: &[f64], layout: Layout) -> Result<()> {
        let count = coordinate_count(flat, layout, "CircularString")?;
        if count < 3 || count % 2 == 0 {
            return Err(GeometryError::InvalidCoordinateCount {
                geometry: "CircularString",
                count,
                expected: "an odd number, at least 3",
            }
            .into());
        }
        let stride = layout.stride();
        for i in 0..count / 2 {
            arc_from_flat(flat, stride, i).center_of_circle()?;
        }
        Ok(())
    }

    /// Replaces the coordinates from a flat buffer.
    ///
    /// # Errors
    ///
    /// See [`CircularString::new`]. On error the string is left unchanged.
    pub fn set_flat_coordinates(&mut self, flat: Vec<f64>, layout: Layout) -> Result<()> {
        Self::validate(&flat, layout)?;
        self.flat = flat;
        self.layout = layout;
        self.changed();
        Ok(())
    }

    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.flat.len() / self.layout.stride() / 2
    }

    /// Returns arc `index`, built from coordinates `2i`, `2i + 1` and `2i + 2`.
    #[must_use]
    pub fn arc(&self, index: usize) -> Option<CircularArc> {
        (index < self.arc_count()).then(|| arc_from_flat(&self.flat, self.layout.stride(), index))
    }

    pub fn arcs(&self) -> impl Iterator<Item = CircularArc> + '_ {
        let stride = self.layout.stride();
        (0..self.arc_count()).map(move |i| arc_from_flat(&self.flat, stride, i))
    }

    /// Circle centers, two numbers per arc; NaN for degenerate arcs.
    pub fn flat_centers_of_circle(&self) -> &[f64] {
        self.centers.get_or_init(|| {
            let mut centers = Vec::with_capacity(self.arc_count() * 2);
            for (i, arc) in self.arcs().enumerate() {
                match arc.center_of_circle() {
                    Ok(c) => centers.extend_from_slice(&[c.x, c.y]),
                    Err(err) => {
                        debug!(arc = i, %err, "degenerate arc has no center");
                        centers.extend_from_slice(&[f64::NAN, f64::NAN]);
                    }
                }
            }
            centers
        })
    }

    /// Center of arc `index`, or `None` if the index is out of range or the
    /// arc is degenerate.
    #[must_use]
    pub fn flat_center_of_circle(&self, index: usize) -> Option<Point2> {
        let centers = self.flat_centers_of_circle();
        let (x, y) = (*centers.get(2 * index)?, *centers.get(2 * index + 1)?);
        (x.is_finite() && y.is_finite()).then(|| Point2::new(x, y))
    }

    /// Start, middle, center and end of every arc, eight numbers per arc.
    pub fn drawable_flat_coordinates(&self) -> &[f64] {
        self.drawable.get_or_init(|| {
            let centers = self.flat_centers_of_circle();
            let mut drawable = Vec::with_capacity(self.arc_count() * 8);
            for (i, arc) in self.arcs().enumerate() {
                drawable.extend_from_slice(&[
                    arc.start.x,
                    arc.start.y,
                    arc.middle.x,
                    arc.middle.y,
                    centers[2 * i],
                    centers[2 * i + 1],
                    arc.end.x,
                    arc.end.y,
                ]);
            }
            drawable
        })
    }

    /// Densifies the string into points within `tolerance` of the arcs.
    ///
    /// Degenerate arcs contribute their chord.
    #[must_use]
    pub fn flatten(&self, tolerance: f64) -> Vec<Point2> {
        let mut points = Vec::new();
        for arc in self.arcs() {
            let arc_points = arc.flatten(tolerance).unwrap_or_else(|_| vec![arc.start, arc.end]);
            let skip = usize::from(!points.is_empty());
            points.extend(arc_points.into_iter().skip(skip));
        }
        points
    }

    /// Replaces every full-circle arc with two counter-clockwise half arcs
    /// through the quarter points, so that reversing the string flips its
    /// winding. Returns whether any arc was split.
    pub(crate) fn split_full_circles(&mut self) -> bool {
        if !self.arcs().any(|arc| arc.is_full_circle()) {
            return false;
        }
        let stride = self.layout.stride();
        let mut flat = Vec::with_capacity(self.flat.len() + 2 * stride);
        let push_xy = |flat: &mut Vec<f64>, ordinates: &[f64], at: Point2| {
            flat.push(at.x);
            flat.push(at.y);
            flat.extend_from_slice(&ordinates[2..]);
        };
        for (i, arc) in self.arcs().enumerate() {
            let o = 2 * i * stride;
            let start = &self.flat[o..o + stride];
            let middle = &self.flat[o + stride..o + 2 * stride];
            flat.extend_from_slice(start);
            match arc.center_of_circle() {
                Ok(center) if arc.is_full_circle() => {
                    let radial = arc.start - center;
                    let quarter = Vector2::new(-radial.y, radial.x);
                    push_xy(&mut flat, start, center + quarter);
                    flat.extend_from_slice(middle);
                    push_xy(&mut flat, middle, center - quarter);
                }
                _ => flat.extend_from_slice(middle),
            }
        }
        flat.extend_from_slice(&self.flat[self.flat.len() - stride..]);
        debug!(arcs = self.arc_count(), "split full-circle arcs into half arcs");
        self.flat = flat;
        self.changed();
        true
    }

    fn compute_extent(&self) -> Extent {
        let mut extent = Extent::empty();
        for (i, arc) in self.arcs().enumerate() {
            let bounds = self.flat_center_of_circle(i).and_then(|center| {
                let angles = arc.angles(&center).ok()?;
                let radius = arc.radius(&center);
                Some(arc.bounding_coords(&center, radius, angles.start, angles.end, arc.clockwise(&angles)))
            });
            match bounds {
                Some(points) => extent.extend(&Extent::from_points(&points)),
                None => {
                    debug!(arc = i, "extent of degenerate arc taken from its control points");
                    extent.extend(&Extent::from_points(&[arc.start, arc.middle, arc.end]));
                }
            }
        }
        extent
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.centers.invalidate();
        self.drawable.invalidate();
        self.extent.invalidate();
        self.max_delta.invalidate();
    }
}

impl CurveGeometry for CircularString {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::CircularString
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn flat_coordinates(&self) -> &[f64] {
        &self.flat
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn extent(&self) -> Extent {
        *self.extent.get_or_init(|| self.compute_extent())
    }

    /// Searches the chords between control points, so on a curved stretch
    /// the result only approximates the true closest point of the arc.
    fn closest_point_xy(&self, x: f64, y: f64, best: &mut ClosestPoint) -> f64 {
        if best.squared_distance < self.extent().closest_squared_distance_xy(x, y) {
            return best.squared_distance;
        }
        let stride = self.layout.stride();
        let max_delta = *self
            .max_delta
            .get_or_init(|| max_squared_delta(&self.flat, stride, false).sqrt());
        assign_closest_point(&self.flat, stride, max_delta, false, x, y, best)
    }

    fn apply_transform(&mut self, transform: &mut dyn FnMut(&mut [f64], usize)) {
        transform(&mut self.flat, self.layout.stride());
        self.changed();
    }

    fn reverse(&mut self) {
        reverse_coordinates(&mut self.flat, self.layout.stride());
        self.changed();
    }

    fn set_coordinates(&mut self, coordinates: &[Coordinate], layout: Layout) -> Result<()> {
        self.set_flat_coordinates(deflate_coordinates(coordinates, layout)?, layout)
    }
}
