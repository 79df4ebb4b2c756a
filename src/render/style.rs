use crate::error::{RenderError, Result};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

/// Color every hit-detection path is painted with.
pub const HIT_DETECTION_COLOR: Color = Color::BLACK;

/// Style for filling the interior of a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Color,
}

impl FillStyle {
    #[must_use]
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

/// Style for stroking a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    color: Color,
    width: f64,
}

impl StrokeStyle {
    /// Creates a new stroke style with `width` in pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if `width` is not positive.
    pub fn new(color: Color, width: f64) -> Result<Self> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(RenderError::InvalidStyle(format!(
                "stroke width must be positive, got {width}"
            ))
            .into());
        }
        Ok(Self { color, width })
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the style with its width multiplied by `factor`.
    #[must_use]
    pub(crate) fn scaled(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            ..self
        }
    }

    /// Returns the same stroke painted in `color`.
    #[must_use]
    pub(crate) fn recolored(self, color: Color) -> Self {
        Self { color, ..self }
    }
}

/// Fill and stroke of a feature. Either may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Style {
    pub fill: Option<FillStyle>,
    pub stroke: Option<StrokeStyle>,
}

impl Style {
    #[must_use]
    pub fn new(fill: Option<FillStyle>, stroke: Option<StrokeStyle>) -> Self {
        Self { fill, stroke }
    }

    #[must_use]
    pub fn fill(color: Color) -> Self {
        Self::new(Some(FillStyle::new(color)), None)
    }

    #[must_use]
    pub fn stroke(stroke: StrokeStyle) -> Self {
        Self::new(None, Some(stroke))
    }
}
