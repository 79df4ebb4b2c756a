use super::Point2;

/// A 2D axis-aligned bounding box.
///
/// The empty extent has inverted infinite bounds so that extending it with
/// any point yields that point's box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self::empty()
    }
}

impl Extent {
    /// Creates an extent from its bounds.
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Returns an extent containing nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    /// Builds the extent of a flat coordinate buffer with the given stride.
    #[must_use]
    pub fn from_flat_coordinates(flat: &[f64], stride: usize) -> Self {
        let mut extent = Self::empty();
        for chunk in flat.chunks_exact(stride) {
            extent.extend_xy(chunk[0], chunk[1]);
        }
        extent
    }

    /// Builds the extent of a set of points.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Self {
        let mut extent = Self::empty();
        for p in points {
            extent.extend_xy(p.x, p.y);
        }
        extent
    }

    /// Returns whether the extent contains no point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Grows the extent to include `(x, y)`.
    pub fn extend_xy(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Grows the extent to include `other`.
    pub fn extend(&mut self, other: &Extent) {
        if other.is_empty() {
            return;
        }
        self.extend_xy(other.min_x, other.min_y);
        self.extend_xy(other.max_x, other.max_y);
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        Point2::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// Returns whether `(x, y)` lies inside or on the boundary.
    #[must_use]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Returns whether the two extents overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Squared distance from `(x, y)` to the nearest point of the extent;
    /// zero inside. Infinite for the empty extent.
    #[must_use]
    pub fn closest_squared_distance_xy(&self, x: f64, y: f64) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        let dx = if x < self.min_x {
            self.min_x - x
        } else if x > self.max_x {
            x - self.max_x
        } else {
            0.0
        };
        let dy = if y < self.min_y {
            self.min_y - y
        } else if y > self.max_y {
            y - self.max_y
        } else {
            0.0
        };
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn empty_extent() {
        let e = Extent::empty();
        assert!(e.is_empty());
        assert!(e.closest_squared_distance_xy(0.0, 0.0).is_infinite());
        assert!(!e.intersects(&Extent::new(-1.0, -1.0, 1.0, 1.0)));
    }

    #[test]
    fn extend_from_flat_with_stride() {
        let flat = [1.0, 2.0, 100.0, -3.0, 4.0, 100.0];
        let e = Extent::from_flat_coordinates(&flat, 3);
        assert_eq!(e, Extent::new(-3.0, 2.0, 1.0, 4.0));
        assert!((e.width() - 4.0).abs() < TOL);
        assert!((e.height() - 2.0).abs() < TOL);
    }

    #[test]
    fn extend_ignores_empty_other() {
        let mut e = Extent::new(0.0, 0.0, 1.0, 1.0);
        e.extend(&Extent::empty());
        assert_eq!(e, Extent::new(0.0, 0.0, 1.0, 1.0));
        e.extend(&Extent::new(-1.0, 0.5, 0.5, 3.0));
        assert_eq!(e, Extent::new(-1.0, 0.0, 1.0, 3.0));
    }

    #[test]
    fn closest_squared_distance() {
        let e = Extent::new(0.0, 0.0, 2.0, 2.0);
        assert!(e.closest_squared_distance_xy(1.0, 1.0).abs() < TOL);
        assert!((e.closest_squared_distance_xy(5.0, 1.0) - 9.0).abs() < TOL);
        assert!((e.closest_squared_distance_xy(-3.0, 6.0) - 25.0).abs() < TOL);
    }

    #[test]
    fn center_and_containment() {
        let e = Extent::new(-2.0, 0.0, 2.0, 4.0);
        let c = e.center();
        assert!(c.x.abs() < TOL);
        assert!((c.y - 2.0).abs() < TOL);
        assert!(e.contains_xy(2.0, 4.0));
        assert!(!e.contains_xy(2.1, 4.0));
    }
}
