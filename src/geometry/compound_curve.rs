use crate::error::{GeometryError, Result};
use crate::math::flat::{chord_length, interpolate_point};
use crate::math::{points_equal, Extent};

use super::{ClosestPoint, Coordinate, CircularString, CurveGeometry, GeometryType, Layout, LineString, Memo};

/// One segment of a compound curve.
#[derive(Debug, Clone)]
pub enum CurveSegment {
    Line(LineString),
    Circular(CircularString),
}

impl From<LineString> for CurveSegment {
    fn from(value: LineString) -> Self {
        CurveSegment::Line(value)
    }
}

impl From<CircularString> for CurveSegment {
    fn from(value: CircularString) -> Self {
        CurveSegment::Circular(value)
    }
}

impl CurveSegment {
    #[must_use]
    pub fn as_curve(&self) -> &dyn CurveGeometry {
        match self {
            CurveSegment::Line(g) => g,
            CurveSegment::Circular(g) => g,
        }
    }

    pub fn as_curve_mut(&mut self) -> &mut dyn CurveGeometry {
        match self {
            CurveSegment::Line(g) => g,
            CurveSegment::Circular(g) => g,
        }
    }
}

/// Where a segment sits inside the concatenated coordinates of its curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescription {
    pub geometry_type: GeometryType,
    /// Index of the segment's first coordinate. It is shared with the
    /// previous segment's last coordinate.
    pub start: usize,
    /// Number of coordinates of the segment, including the shared one.
    pub count: usize,
}

/// A continuous path of arc and line segments.
///
/// Each segment starts where the previous one ends. The curve's own flat
/// buffer holds every coordinate once: junction coordinates appear only as
/// the end of the earlier segment.
#[derive(Debug, Clone)]
pub struct CompoundCurve {
    layout: Layout,
    segments: Vec<CurveSegment>,
    flat: Vec<f64>,
    revision: u64,
    extent: Memo<Extent>,
}

impl CompoundCurve {
    /// Creates a compound curve from consecutive segments.
    ///
    /// # Errors
    ///
    /// Returns an error if `segments` is empty, if the segments do not share
    /// one layout, or if a segment does not start where the previous one
    /// ends.
    pub fn new(segments: Vec<CurveSegment>) -> Result<Self> {
        let layout = Self::validate(&segments)?;
        let mut curve = Self {
            layout,
            segments,
            flat: Vec::new(),
            revision: 0,
            extent: Memo::default(),
        };
        curve.rebuild();
        Ok(curve)
    }

    fn validate(segments: &[CurveSegment]) -> Result<Layout> {
        let Some(first) = segments.first() else {
            return Err(GeometryError::Degenerate("compound curve without segments".into()).into());
        };
        let layout = first.as_curve().layout();
        for (index, pair) in segments.windows(2).enumerate() {
            let (prev, next) = (pair[0].as_curve(), pair[1].as_curve());
            if next.layout() != layout {
                return Err(GeometryError::LayoutMismatch {
                    expected: layout.name(),
                    found: next.layout().name(),
                }
                .into());
            }
            if !points_equal(&prev.last_point(), &next.first_point()) {
                return Err(GeometryError::EndpointMismatch { index: index + 1 }.into());
            }
        }
        Ok(layout)
    }

    /// Replaces every segment.
    ///
    /// # Errors
    ///
    /// See [`CompoundCurve::new`]. On error the curve is left unchanged.
    pub fn set_segments(&mut self, segments: Vec<CurveSegment>) -> Result<()> {
        self.layout = Self::validate(&segments)?;
        self.segments = segments;
        self.rebuild();
        self.changed();
        Ok(())
    }

    #[must_use]
    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// Folds the segment buffers into the curve's buffer, dropping the
    /// duplicated first coordinate of every segment after the first.
    fn rebuild(&mut self) {
        let stride = self.layout.stride();
        self.flat.clear();
        for (i, segment) in self.segments.iter().enumerate() {
            let flat = segment.as_curve().flat_coordinates();
            let skip = if i == 0 { 0 } else { stride };
            self.flat.extend_from_slice(&flat[skip..]);
        }
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.extent.invalidate();
    }

    #[must_use]
    pub fn segment_descriptions(&self) -> Vec<SegmentDescription> {
        let stride = self.layout.stride();
        let mut start = 0;
        self.segments
            .iter()
            .map(|segment| {
                let curve = segment.as_curve();
                let count = curve.flat_coordinates().len() / stride;
                let description = SegmentDescription {
                    geometry_type: curve.geometry_type(),
                    start,
                    count,
                };
                start += count - 1;
                description
            })
            .collect()
    }

    /// Returns the coordinate at `fraction` of the way along the curve.
    ///
    /// Distances are measured along the chords between coordinates, so on
    /// arc segments the position is an approximation.
    #[must_use]
    pub fn coordinate_at(&self, fraction: f64) -> Option<Coordinate> {
        interpolate_point(&self.flat, self.layout.stride(), fraction)
            .map(|ordinates| Coordinate::from_ordinates(&ordinates, self.layout))
    }

    /// Total chord length.
    #[must_use]
    pub fn length(&self) -> f64 {
        chord_length(&self.flat, self.layout.stride())
    }

    /// Splits the full-circle arcs of every circular segment in two, see
    /// [`CircularString::split_full_circles`].
    pub(crate) fn split_full_circles(&mut self) -> bool {
        let mut split = false;
        for segment in &mut self.segments {
            if let CurveSegment::Circular(cs) = segment {
                split |= cs.split_full_circles();
            }
        }
        if split {
            self.rebuild();
            self.changed();
        }
        split
    }

    #[must_use]
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.as_curve().extent().intersects(extent))
    }
}

impl CurveGeometry for CompoundCurve {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::CompoundCurve
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
        *self.extent.get_or_init(|| {
            let mut extent = Extent::empty();
            for segment in &self.segments {
                extent.extend(&segment.as_curve().extent());
            }
            extent
        })
    }

    fn closest_point_xy(&self, x: f64, y: f64, best: &mut ClosestPoint) -> f64 {
        if best.squared_distance < self.extent().closest_squared_distance_xy(x, y) {
            return best.squared_distance;
        }
        for segment in &self.segments {
            segment.as_curve().closest_point_xy(x, y, best);
        }
        best.squared_distance
    }

    fn apply_transform(&mut self, transform: &mut dyn FnMut(&mut [f64], usize)) {
        for segment in &mut self.segments {
            segment.as_curve_mut().apply_transform(transform);
        }
        self.rebuild();
        self.changed();
    }

    fn reverse(&mut self) {
        for segment in &mut self.segments {
            segment.as_curve_mut().reverse();
        }
        self.segments.reverse();
        self.rebuild();
        self.changed();
    }

    /// Always fails: the coordinates of a compound curve are owned by its
    /// segments. Use [`CompoundCurve::set_segments`].
    fn set_coordinates(&mut self, _coordinates: &[Coordinate], _layout: Layout) -> Result<()> {
        Err(GeometryError::Unsupported("CompoundCurve coordinates are set through its segments").into())
    }
}
