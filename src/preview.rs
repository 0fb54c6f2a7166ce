//! Bounded preview rendering
//!
//! Renders one slice of a stack as a small RGB frame without paying the
//! full-resolution cost: downsize the source slice so neither dimension
//! exceeds [`PREVIEW_BOUND`], synthesize it through the exact same
//! dispatcher and normalization as a full run, enlarge the result if it
//! came out tiny, convert to packed RGB, and optionally overlay the zero
//! axes. The Z coordinate is driven by the source stack's slice count, so
//! the preview of slice 7 of 12 sees the same `z` as the real pass would.
//!
//! The pipeline walks `Idle → Downsizing → Synthesizing → Enlarging →
//! OverlayDrawing → Done` and retains the last successfully rendered
//! frame. Any evaluator failure parks it in `Failed` and leaves that frame
//! untouched, so a caller can keep showing the stale preview while the
//! user fixes the expression.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;
use crate::expr::Evaluator;
use crate::normalize::rescale;
use crate::pixel::{pack_rgb, PixelEncoding, PixelSlice};
use crate::resample::{downsized_dims, enlarged_dims, resize_slice};
use crate::stack::ImageStack;
use crate::synth::synthesize_slice;
use crate::types::{AxisRange, GridShape, Interpolation, SynthesisRequest};

/// Neither preview dimension exceeds this; small results are grown
/// towards it.
pub const PREVIEW_BOUND: u32 = 256;

// ── Stage & Options ──────────────────────────────────────────

/// Where the pipeline currently is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreviewStage {
    /// No render attempted yet.
    #[default]
    Idle,
    /// Resampling the source slice down to the bound.
    Downsizing,
    /// Running the expression over the downsized slice.
    Synthesizing,
    /// Growing a small result up to the bound.
    Enlarging,
    /// Drawing the zero-axis overlay.
    OverlayDrawing,
    /// Last render completed.
    Done,
    /// Last render failed; the previous frame is still available.
    Failed,
}

/// Per-render settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOptions {
    /// Source slice to render, 0-based.
    pub slice: u32,
    /// Resampling used for both downsize and enlarge.
    pub interpolation: Interpolation,
    /// Overlay the zero axes on the finished frame.
    pub draw_axes: bool,
    /// Packed overlay color.
    pub axis_color: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        PreviewOptions {
            slice: 0,
            interpolation: Interpolation::default(),
            draw_axes: false,
            axis_color: 0xFF00_0000,
        }
    }
}

impl PreviewOptions {
    /// Options rendering `slice` with the defaults.
    pub fn new(slice: u32) -> Self {
        PreviewOptions {
            slice,
            ..PreviewOptions::default()
        }
    }

    /// Select the resampling mode.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Toggle the zero-axis overlay.
    pub fn with_axes(mut self, draw: bool) -> Self {
        self.draw_axes = draw;
        self
    }

    /// Overlay color as packed RGB.
    pub fn with_axis_color(mut self, color: u32) -> Self {
        self.axis_color = color;
        self
    }
}

// ── Frame ────────────────────────────────────────────────────

/// A finished preview: packed RGB pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewFrame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PreviewFrame {
    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major packed RGB pixels.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Packed pixel at `(x, y)`. Panics out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }

    fn put(&mut self, x: u32, y: u32, color: u32) {
        self.pixels[(y * self.width + x) as usize] = color;
    }
}

// ── Pipeline ─────────────────────────────────────────────────

/// Renders previews and retains the last good frame across failures.
#[derive(Debug, Clone, Default)]
pub struct PreviewPipeline {
    stage: PreviewStage,
    frame: Option<PreviewFrame>,
}

impl PreviewPipeline {
    /// An idle pipeline with no frame yet.
    pub fn new() -> Self {
        PreviewPipeline::default()
    }

    /// Stage reached by the most recent render.
    pub fn stage(&self) -> PreviewStage {
        self.stage
    }

    /// Most recently completed frame, surviving later failures.
    pub fn frame(&self) -> Option<&PreviewFrame> {
        self.frame.as_ref()
    }

    /// Render one slice of `stack` through `request`.
    ///
    /// On success the returned frame is also retained as the pipeline's
    /// current frame. On failure the retained frame is left untouched and
    /// the stage reads [`PreviewStage::Failed`].
    pub fn render<E: Evaluator>(
        &mut self,
        stack: &ImageStack,
        request: &SynthesisRequest,
        options: PreviewOptions,
        eval: &mut E,
    ) -> Result<&PreviewFrame, SynthesisError> {
        let shape = stack.shape();
        if options.slice >= shape.slices {
            self.stage = PreviewStage::Failed;
            return Err(SynthesisError::SliceOutOfRange {
                slice: options.slice,
                slices: shape.slices,
            });
        }
        let inverted = stack.is_inverted_lut();

        self.stage = PreviewStage::Downsizing;
        let (mut w, mut h) = downsized_dims(shape.width, shape.height, PREVIEW_BOUND);
        debug!(
            "preview slice {}: {}x{} source, {}x{} working grid",
            options.slice, shape.width, shape.height, w, h
        );
        let resized = resize_slice(
            stack.slice(options.slice),
            shape.width,
            shape.height,
            w,
            h,
            options.interpolation,
        );
        let mut working = ImageStack::from_slices(GridShape::new(w, h, 1), vec![resized]);

        self.stage = PreviewStage::Synthesizing;
        if let Err(err) = synthesize_slice(
            &mut working,
            0,
            options.slice,
            shape.slices,
            request,
            eval,
            &mut (),
        ) {
            self.stage = PreviewStage::Failed;
            return Err(err);
        }

        self.stage = PreviewStage::Enlarging;
        if let Some((ew, eh)) = enlarged_dims(w, h, PREVIEW_BOUND) {
            let grown = resize_slice(working.slice(0), w, h, ew, eh, options.interpolation);
            working = ImageStack::from_slices(GridShape::new(ew, eh, 1), vec![grown]);
            w = ew;
            h = eh;
        }

        let mut frame = to_rgb_frame(working.slice(0), w, h, inverted);

        if options.draw_axes {
            self.stage = PreviewStage::OverlayDrawing;
            draw_axis_overlay(&mut frame, request, options.axis_color);
        }

        self.stage = PreviewStage::Done;
        Ok(self.frame.insert(frame))
    }
}

// ── Display Conversion ───────────────────────────────────────

/// Convert a slice to packed RGB for display.
///
/// 8-bit levels map directly; deeper gray encodings stretch their own
/// value range onto 0..255. An inverting LUT reflects the gray levels.
fn to_rgb_frame(slice: &PixelSlice, width: u32, height: u32, inverted: bool) -> PreviewFrame {
    let mut pixels = Vec::with_capacity(slice.len());
    match slice {
        PixelSlice::Rgb24(data) => {
            pixels.extend(data.iter().map(|&p| 0xFF00_0000 | (p & 0x00FF_FFFF)));
        }
        _ => {
            let (lo, hi) = display_range(slice);
            for idx in 0..slice.len() {
                let mut level = rescale(slice.decode(idx), lo, hi, 255.0).round();
                if inverted {
                    level = 255.0 - level;
                }
                pixels.push(pack_rgb(level, level, level));
            }
        }
    }
    PreviewFrame {
        width,
        height,
        pixels,
    }
}

fn display_range(slice: &PixelSlice) -> (f64, f64) {
    if slice.encoding() == PixelEncoding::Gray8 {
        return (0.0, 255.0);
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for idx in 0..slice.len() {
        let value = slice.decode(idx);
        lo = lo.min(value);
        hi = hi.max(value);
    }
    (lo, hi)
}

// ── Axis Overlay ─────────────────────────────────────────────

/// Pixel index where an axis coordinate crosses zero, via the inverse of
/// the forward index mapping. `None` when the crossing is off-image or
/// the range is collapsed; an exact hit on the exclusive bound pulls back
/// to the last pixel.
fn axis_pixel(range: AxisRange, dim: u32) -> Option<u32> {
    if range.is_degenerate() || dim == 0 {
        return None;
    }
    let mut pos = (-range.min * (dim - 1) as f64 / range.span()).round() as i64;
    if pos == dim as i64 {
        pos = dim as i64 - 1;
    }
    if (0..dim as i64).contains(&pos) {
        Some(pos as u32)
    } else {
        None
    }
}

fn draw_axis_overlay(frame: &mut PreviewFrame, request: &SynthesisRequest, color: u32) {
    if let Some(x0) = axis_pixel(request.x_range(), frame.width) {
        for y in 0..frame.height {
            frame.put(x0, y, color);
        }
    }
    if let Some(y0) = axis_pixel(request.y_range(), frame.height) {
        for x in 0..frame.width {
            frame.put(x, y0, color);
        }
    }
}
