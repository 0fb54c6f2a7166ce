//! Core value types for synthesis requests
//!
//! Plain request-scoped objects: axis ranges, grid shape, region of
//! interest, normalization and interpolation selectors, and the
//! `SynthesisRequest` bundle the engine consumes. No state outlives a call.

use serde::{Deserialize, Serialize};

// ── Axis Range ───────────────────────────────────────────────

/// Physical coordinate interval one grid axis maps onto.
///
/// `min > max` is legal and flips the mapping direction. `min == max` is
/// the degenerate case: every pixel on that axis maps to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Coordinate of index 0.
    pub min: f64,
    /// Coordinate of index `dim - 1`.
    pub max: f64,
}

impl AxisRange {
    /// Create a range from endpoints.
    pub fn new(min: f64, max: f64) -> Self {
        AxisRange { min, max }
    }

    /// Signed span `max - min`.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Absolute extent, the value bound to the `w`/`h`/`s` domain variables.
    #[inline]
    pub fn extent(&self) -> f64 {
        (self.max - self.min).abs()
    }

    /// True when both endpoints coincide.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        AxisRange { min: -1.0, max: 1.0 }
    }
}

// ── Grid Shape ───────────────────────────────────────────────

/// Pixel grid dimensions of a stack: width x height per slice, slice count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Pixels per row.
    pub width: u32,
    /// Rows per slice.
    pub height: u32,
    /// Number of slices.
    pub slices: u32,
}

impl GridShape {
    /// Create a shape; `slices` of 0 is normalized to 1.
    pub fn new(width: u32, height: u32, slices: u32) -> Self {
        GridShape {
            width,
            height,
            slices: slices.max(1),
        }
    }

    /// Pixels in one slice.
    #[inline]
    pub fn slice_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ── Region ───────────────────────────────────────────────────

/// Rectangular region of interest within a slice.
///
/// Synthesis and normalization touch only pixels inside the region;
/// everything outside keeps its existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Region {
    /// Create a region at `(x, y)` with size `w x h`.
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Region { x, y, w, h }
    }

    /// Region covering a whole slice of `shape`.
    pub fn full(shape: GridShape) -> Self {
        Region {
            x: 0,
            y: 0,
            w: shape.width,
            h: shape.height,
        }
    }

    /// True when the region contains no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Number of pixels inside the region.
    #[inline]
    pub fn len(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// True when pixel `(px, py)` lies inside the region.
    #[inline]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    /// Intersect with the slice bounds of `shape`, clipping overhang.
    pub fn clipped_to(&self, shape: GridShape) -> Region {
        let x = self.x.min(shape.width);
        let y = self.y.min(shape.height);
        Region {
            x,
            y,
            w: self.w.min(shape.width - x),
            h: self.h.min(shape.height - y),
        }
    }
}

// ── Mode Selectors ───────────────────────────────────────────

/// How evaluated values are rescaled before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalizationMode {
    /// Encode raw values, clamped to the encoding range.
    #[default]
    None,
    /// Rescale each slice (each channel for RGB) to its own min/max.
    Local,
    /// Rescale with one min/max shared across all slices and channels.
    Global,
}

/// Resampling kernel used by the preview pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Nearest-neighbor lookup.
    None,
    /// 2x2 linear blend.
    #[default]
    Bilinear,
    /// 4x4 cubic convolution.
    Bicubic,
}

// ── Expressions ──────────────────────────────────────────────

/// The user expression(s) a request evaluates per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionSet {
    /// One expression producing `v` (applied per channel on RGB stacks).
    Scalar(String),
    /// Three expressions producing `r_new`, `g_new`, `b_new`; valid only
    /// against RGB stacks.
    PerChannel([String; 3]),
}

impl ExpressionSet {
    /// All source strings in the set.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        match self {
            ExpressionSet::Scalar(s) => std::slice::from_ref(s).iter().map(String::as_str),
            ExpressionSet::PerChannel(s) => s[..].iter().map(String::as_str),
        }
    }

    /// True for the three-expression form.
    #[inline]
    pub fn is_per_channel(&self) -> bool {
        matches!(self, ExpressionSet::PerChannel(_))
    }
}

// ── Synthesis Request ────────────────────────────────────────

/// Everything a synthesis pass needs besides the target stack.
///
/// The target's shape, encoding, and region of interest live on the stack
/// itself; the request is a plain value object and can be serialized for
/// host-side persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Coordinate ranges for the X, Y, Z axes.
    pub axes: [AxisRange; 3],
    /// Expression(s) to evaluate per pixel.
    pub expressions: ExpressionSet,
    /// Value rescaling applied before encoding.
    pub normalization: NormalizationMode,
    /// Bind the whole packed RGB integer as `v` instead of per-channel
    /// values. Implied when the program references `getPixel`.
    pub read_existing_pixel: bool,
}

impl SynthesisRequest {
    /// Request evaluating one scalar expression with default axes.
    pub fn scalar(expression: impl Into<String>) -> Self {
        SynthesisRequest {
            axes: [AxisRange::default(); 3],
            expressions: ExpressionSet::Scalar(expression.into()),
            normalization: NormalizationMode::None,
            read_existing_pixel: false,
        }
    }

    /// Request evaluating three per-channel expressions with default axes.
    pub fn per_channel(expressions: [impl Into<String>; 3]) -> Self {
        let [r, g, b] = expressions;
        SynthesisRequest {
            axes: [AxisRange::default(); 3],
            expressions: ExpressionSet::PerChannel([r.into(), g.into(), b.into()]),
            normalization: NormalizationMode::None,
            read_existing_pixel: false,
        }
    }

    /// Replace the axis ranges.
    pub fn with_axes(mut self, x: AxisRange, y: AxisRange, z: AxisRange) -> Self {
        self.axes = [x, y, z];
        self
    }

    /// Replace the normalization mode.
    pub fn with_normalization(mut self, mode: NormalizationMode) -> Self {
        self.normalization = mode;
        self
    }

    /// Force whole-packed-integer binding on RGB stacks.
    pub fn with_read_existing_pixel(mut self, on: bool) -> Self {
        self.read_existing_pixel = on;
        self
    }

    /// X axis range.
    #[inline]
    pub fn x_range(&self) -> AxisRange {
        self.axes[0]
    }

    /// Y axis range.
    #[inline]
    pub fn y_range(&self) -> AxisRange {
        self.axes[1]
    }

    /// Z axis range.
    #[inline]
    pub fn z_range(&self) -> AxisRange {
        self.axes[2]
    }
}
