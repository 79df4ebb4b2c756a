//! Kernels over flat coordinate buffers.
//!
//! A flat buffer stores `stride` ordinates per coordinate, x and y first.

use super::Point2;

/// Best candidate found by a closest-point search.
///
/// Starts out empty with an infinite distance; searches only replace it with
/// strictly closer candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestPoint {
    /// All ordinates of the closest point, in the geometry's layout.
    pub ordinates: Vec<f64>,
    /// Squared distance from the query point.
    pub squared_distance: f64,
}

impl Default for ClosestPoint {
    fn default() -> Self {
        Self::new()
    }
}

impl ClosestPoint {
    /// Creates an empty candidate.
    #[must_use]
    pub fn new() -> Self {
        Self::within(f64::INFINITY)
    }

    /// Creates an empty candidate that only accepts points closer than
    /// `squared_distance`.
    #[must_use]
    pub fn within(squared_distance: f64) -> Self {
        Self {
            ordinates: Vec::new(),
            squared_distance,
        }
    }

    /// Returns whether a point has been found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !self.ordinates.is_empty()
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.ordinates.first().copied().unwrap_or(f64::NAN)
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.ordinates.get(1).copied().unwrap_or(f64::NAN)
    }

    #[must_use]
    pub fn distance(&self) -> f64 {
        self.squared_distance.sqrt()
    }
}

fn squared_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Reverses the coordinate order in place, keeping each coordinate's
/// ordinates together.
pub fn reverse_coordinates(flat: &mut [f64], stride: usize) {
    let n = flat.len() / stride;
    for i in 0..n / 2 {
        let j = n - 1 - i;
        for k in 0..stride {
            flat.swap(i * stride + k, j * stride + k);
        }
    }
}

/// Returns the largest squared distance between consecutive coordinates,
/// including the closing pair for rings.
#[must_use]
pub fn max_squared_delta(flat: &[f64], stride: usize, is_ring: bool) -> f64 {
    let n = flat.len() / stride;
    if n < 2 {
        return 0.0;
    }
    let mut max = 0.0_f64;
    for i in 1..n {
        let (a, b) = ((i - 1) * stride, i * stride);
        max = max.max(squared_distance(flat[a], flat[a + 1], flat[b], flat[b + 1]));
    }
    if is_ring {
        let last = (n - 1) * stride;
        max = max.max(squared_distance(flat[last], flat[last + 1], flat[0], flat[1]));
    }
    max
}

/// Writes into `out` the point of segment `[o1, o2]` closest to `(x, y)`,
/// interpolating every ordinate.
fn project_on_segment(flat: &[f64], o1: usize, o2: usize, stride: usize, x: f64, y: f64, out: &mut [f64]) {
    let (x1, y1) = (flat[o1], flat[o1 + 1]);
    let dx = flat[o2] - x1;
    let dy = flat[o2 + 1] - y1;
    let len_sq = dx * dx + dy * dy;

    let offset = if len_sq < 1e-20 {
        o1
    } else {
        let t = ((x - x1) * dx + (y - y1) * dy) / len_sq;
        if t >= 1.0 {
            o2
        } else if t > 0.0 {
            for (k, slot) in out.iter_mut().enumerate().take(stride) {
                *slot = flat[o1 + k] + t * (flat[o2 + k] - flat[o1 + k]);
            }
            return;
        } else {
            o1
        }
    };
    out[..stride].copy_from_slice(&flat[offset..offset + stride]);
}

/// Walks the segments of a flat buffer looking for a point closer to
/// `(x, y)` than `best`, and returns the best squared distance.
///
/// `max_delta` is the largest distance between consecutive coordinates
/// (see [`max_squared_delta`]); it lets the walk skip runs of coordinates
/// that cannot beat the current best.
pub fn assign_closest_point(
    flat: &[f64],
    stride: usize,
    max_delta: f64,
    is_ring: bool,
    x: f64,
    y: f64,
    best: &mut ClosestPoint,
) -> f64 {
    let n = flat.len() / stride;
    if n == 0 {
        return best.squared_distance;
    }
    if max_delta <= 0.0 {
        // All coordinates coincide.
        let d = squared_distance(x, y, flat[0], flat[1]);
        if d < best.squared_distance {
            best.ordinates = flat[..stride].to_vec();
            best.squared_distance = d;
        }
        return best.squared_distance;
    }

    let mut tmp = vec![0.0; stride];
    let mut index = 1;
    while index < n {
        project_on_segment(flat, (index - 1) * stride, index * stride, stride, x, y, &mut tmp);
        let d = squared_distance(x, y, tmp[0], tmp[1]);
        if d < best.squared_distance {
            best.squared_distance = d;
            best.ordinates.clone_from(&tmp);
            index += 1;
        } else {
            // No coordinate within this many steps can be closer than the best.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let skip = ((d.sqrt() - best.squared_distance.sqrt()) / max_delta) as usize;
            index += skip.max(1);
        }
    }
    if is_ring {
        project_on_segment(flat, (n - 1) * stride, 0, stride, x, y, &mut tmp);
        let d = squared_distance(x, y, tmp[0], tmp[1]);
        if d < best.squared_distance {
            best.squared_distance = d;
            best.ordinates.clone_from(&tmp);
        }
    }
    best.squared_distance
}

/// Sum of the straight distances between consecutive coordinates.
#[must_use]
pub fn chord_length(flat: &[f64], stride: usize) -> f64 {
    let n = flat.len() / stride;
    (1..n)
        .map(|i| {
            let (a, b) = ((i - 1) * stride, i * stride);
            squared_distance(flat[a], flat[a + 1], flat[b], flat[b + 1]).sqrt()
        })
        .sum()
}

/// Returns the coordinate at `fraction` (clamped to `[0, 1]`) of the
/// cumulative chord length, interpolating every ordinate.
///
/// Returns `None` for an empty buffer.
#[must_use]
pub fn interpolate_point(flat: &[f64], stride: usize, fraction: f64) -> Option<Vec<f64>> {
    let n = flat.len() / stride;
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(flat[..stride].to_vec());
    }

    let mut cumulative = Vec::with_capacity(n);
    cumulative.push(0.0);
    let mut length = 0.0;
    for i in 1..n {
        let (a, b) = ((i - 1) * stride, i * stride);
        length += squared_distance(flat[a], flat[a + 1], flat[b], flat[b + 1]).sqrt();
        cumulative.push(length);
    }

    let target = fraction.clamp(0.0, 1.0) * length;
    let index = cumulative.partition_point(|&l| l < target);
    if index == 0 {
        return Some(flat[..stride].to_vec());
    }
    if index >= n {
        return Some(flat[(n - 1) * stride..n * stride].to_vec());
    }
    let span = cumulative[index] - cumulative[index - 1];
    let t = if span > 0.0 {
        (target - cumulative[index - 1]) / span
    } else {
        0.0
    };
    let (o1, o2) = ((index - 1) * stride, index * stride);
    Some((0..stride).map(|k| flat[o1 + k] + t * (flat[o2 + k] - flat[o1 + k])).collect())
}

/// Signed area of a ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. The closing
/// segment is implied, so explicitly closed rings give the same result.
#[must_use]
pub fn signed_area(flat: &[f64], stride: usize) -> f64 {
    let n = flat.len() / stride;
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let (a, b) = (i * stride, ((i + 1) % n) * stride);
        sum += flat[a] * flat[b + 1] - flat[b] * flat[a + 1];
    }
    sum * 0.5
}

/// Even-odd containment test of `(x, y)` against one ring.
#[must_use]
pub fn linear_ring_contains_xy(ring: &[Point2], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&ring[i], &ring[j]);
        if (pi.y > y) != (pj.y > y) && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Returns whether `(x, y)` is inside the first ring and outside every
/// following ring.
#[must_use]
pub fn linear_rings_contain_xy(rings: &[Vec<Point2>], x: f64, y: f64) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    linear_ring_contains_xy(outer, x, y) && !holes.iter().any(|h| linear_ring_contains_xy(h, x, y))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-10;

    #[test]
    fn reverse_keeps_ordinates_together() {
        let mut flat = vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0];
        reverse_coordinates(&mut flat, 3);
        assert_eq!(flat, vec![2.0, 2.0, 3.0, 1.0, 1.0, 2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn max_delta_includes_closing_segment() {
        let flat = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 5.0, 1.0];
        assert_abs_diff_eq!(max_squared_delta(&flat, 2, false), 16.0, epsilon = TOL);
        assert_abs_diff_eq!(max_squared_delta(&flat, 2, true), 26.0, epsilon = TOL);
    }

    #[test]
    fn closest_point_on_polyline() {
        let flat = [0.0, 0.0, 2.0, 0.0, 2.0, 2.0];
        let max_delta = max_squared_delta(&flat, 2, false).sqrt();
        let mut best = ClosestPoint::new();
        let d = assign_closest_point(&flat, 2, max_delta, false, 1.0, 1.0, &mut best);
        assert_abs_diff_eq!(d, 1.0, epsilon = TOL);
        assert!(best.is_found());
        // Tie between the two segments: the first one wins.
        assert_abs_diff_eq!(best.x(), 1.0, epsilon = TOL);
        assert_abs_diff_eq!(best.y(), 0.0, epsilon = TOL);
    }

    #[test]
    fn closest_point_interpolates_extra_ordinates() {
        let flat = [0.0, 0.0, 10.0, 4.0, 0.0, 20.0];
        let mut best = ClosestPoint::new();
        assign_closest_point(&flat, 3, 4.0, false, 2.0, 3.0, &mut best);
        assert_eq!(best.ordinates.len(), 3);
        assert_abs_diff_eq!(best.x(), 2.0, epsilon = TOL);
        assert_abs_diff_eq!(best.ordinates[2], 15.0, epsilon = TOL);
    }

    #[test]
    fn closest_point_keeps_better_candidate() {
        let flat = [0.0, 0.0, 2.0, 0.0];
        let mut best = ClosestPoint::within(0.25);
        let d = assign_closest_point(&flat, 2, 2.0, false, 1.0, 1.0, &mut best);
        assert_abs_diff_eq!(d, 0.25, epsilon = TOL);
        assert!(!best.is_found());
    }

    #[test]
    fn closest_point_on_coincident_coordinates() {
        let flat = [3.0, 4.0, 3.0, 4.0];
        let mut best = ClosestPoint::new();
        let d = assign_closest_point(&flat, 2, 0.0, false, 0.0, 0.0, &mut best);
        assert_abs_diff_eq!(d, 25.0, epsilon = TOL);
    }

    #[test]
    fn interpolate_by_chord_length() {
        let flat = [0.0, 0.0, 3.0, 0.0, 3.0, 1.0];
        let mid = interpolate_point(&flat, 2, 0.5).unwrap();
        assert_abs_diff_eq!(mid[0], 2.0, epsilon = TOL);
        assert_abs_diff_eq!(mid[1], 0.0, epsilon = TOL);
        let end = interpolate_point(&flat, 2, 1.0).unwrap();
        assert_abs_diff_eq!(end[0], 3.0, epsilon = TOL);
        assert_abs_diff_eq!(end[1], 1.0, epsilon = TOL);
        let start = interpolate_point(&flat, 2, -1.0).unwrap();
        assert_abs_diff_eq!(start[0], 0.0, epsilon = TOL);
        assert!(interpolate_point(&[], 2, 0.5).is_none());
        assert_abs_diff_eq!(chord_length(&flat, 2), 4.0, epsilon = TOL);
    }

    #[test]
    fn signed_area_orientation() {
        let ccw = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        assert_abs_diff_eq!(signed_area(&ccw, 2), 1.0, epsilon = TOL);

        let mut cw = ccw;
        reverse_coordinates(&mut cw, 2);
        assert_abs_diff_eq!(signed_area(&cw, 2), -1.0, epsilon = TOL);
        assert!(signed_area(&[0.0, 0.0, 1.0, 1.0], 2).abs() < TOL);
    }

    #[test]
    fn rings_containment_with_hole() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let hole = vec![
            Point2::new(1.0, 1.0),
            Point2::new(3.0, 1.0),
            Point2::new(3.0, 3.0),
            Point2::new(1.0, 3.0),
        ];
        let rings = vec![outer, hole];
        assert!(linear_rings_contain_xy(&rings, 0.5, 2.0));
        assert!(!linear_rings_contain_xy(&rings, 2.0, 2.0));
        assert!(!linear_rings_contain_xy(&rings, 5.0, 2.0));
        assert!(!linear_rings_contain_xy(&[], 0.0, 0.0));
    }
}
