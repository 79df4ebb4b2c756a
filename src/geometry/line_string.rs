use crate::error::{GeometryError, Result};
use crate::math::flat::{assign_closest_point, max_squared_delta, reverse_coordinates};
use crate::math::{Extent, Point2};

use super::{coordinate_count, deflate_coordinates, ClosestPoint, Coordinate, CurveGeometry, GeometryType, Layout, Memo};

/// A run of straight segments: the linear segment of a compound curve or a
/// straight polygon ring.
#[derive(Debug, Clone)]
pub struct LineString {
    layout: Layout,
    flat: Vec<f64>,
    revision: u64,
    extent: Memo<Extent>,
    max_delta: Memo<f64>,
}

impl LineString {
    /// Creates a line string from at least two coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two coordinates are given or a
    /// coordinate does not match `layout`.
    pub fn new(coordinates: &[Coordinate], layout: Layout) -> Result<Self> {
        Self::from_flat_coordinates(deflate_coordinates(coordinates, layout)?, layout)
    }

    /// Creates a line string from a flat buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer does not hold at least two whole
    /// coordinates.
    pub fn from_flat_coordinates(flat: Vec<f64>, layout: Layout) -> Result<Self> {
        Self::validate(&flat, layout)?;
        Ok(Self {
            layout,
            flat,
            revision: 0,
            extent: Memo::default(),
            max_delta: Memo::default(),
        })
    }

    fn validate(flat: &[f64], layout: Layout) -> Result<()> {
        let count = coordinate_count(flat, layout, "LineString")?;
        if count < 2 {
            return Err(GeometryError::InvalidCoordinateCount {
                geometry: "LineString",
                count,
                expected: "at least 2",
            }
            .into());
        }
        Ok(())
    }

    /// Returns the 2D positions of the coordinates.
    #[must_use]
    pub fn points(&self) -> Vec<Point2> {
        self.flat
            .chunks_exact(self.layout.stride())
            .map(|c| Point2::new(c[0], c[1]))
            .collect()
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.extent.invalidate();
        self.max_delta.invalidate();
    }
}

impl CurveGeometry for LineString {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::LineString
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
        *self
            .extent
            .get_or_init(|| Extent::from_flat_coordinates(&self.flat, self.layout.stride()))
    }

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
        let flat = deflate_coordinates(coordinates, layout)?;
        Self::validate(&flat, layout)?;
        self.flat = flat;
        self.layout = layout;
        self.changed();
        Ok(())
    }
}
