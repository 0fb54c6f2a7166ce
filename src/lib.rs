//! # pixsynth
//!
//! Procedural image synthesis: fills pixel grids by evaluating a user
//! expression once per pixel over calibrated coordinate axes.
//!
//! Each pixel sees its coordinates (`x`, `y`, `z` mapped into caller
//! ranges, polar `d`/`a`), the existing value `v` (or `r`,`g`,`b`), and
//! the domain extents. Results land in one of five storage encodings,
//! optionally rescaled to the encoding's range per slice or across the
//! whole stack.
//!
//! ## Features
//!
//! - **Encodings**: 8/16-bit gray, signed calibrated 16-bit, 32-bit float,
//!   packed RGB
//! - **Expression modes**: one scalar expression, or three per-channel
//!   expressions for RGB
//! - **Normalization**: none, per-slice local, or stack-global rescaling
//! - **Regions**: synthesis confined to a rectangular ROI
//! - **Preview**: bounded-size RGB rendering with axis overlay, consistent
//!   with full-resolution output
//! - **Evaluators**: pluggable expression backend; [`NativeEvaluator`]
//!   runs Rust closures for embedding and tests
//!
//! ## Example
//!
//! ```rust
//! use pixsynth::prelude::*;
//!
//! // A 256x256 8-bit canvas.
//! let mut stack = ImageStack::new(PixelEncoding::Gray8, GridShape::new(256, 256, 1));
//!
//! // Radial sine rings over x,y in [-2, 2].
//! let request = SynthesisRequest::scalar("128 + 127 * sin(8 * d)").with_axes(
//!     AxisRange::new(-2.0, 2.0),
//!     AxisRange::new(-2.0, 2.0),
//!     AxisRange::default(),
//! );
//!
//! // Expressions run through an Evaluator; NativeEvaluator wraps a closure.
//! let mut eval = NativeEvaluator::scalar(|vars| {
//!     128.0 + 127.0 * (8.0 * vars.get(Variable::D)).sin()
//! });
//!
//! synthesize(&mut stack, &request, &mut eval, &mut ())?;
//!
//! assert!((0.0..=255.0).contains(&stack.pixel(128, 128, 0)));
//! # Ok::<(), pixsynth::SynthesisError>(())
//! ```

#![warn(missing_docs)]

pub mod coords;
pub mod error;
pub mod expr;
pub mod native;
pub mod normalize;
pub mod pixel;
pub mod preview;
pub mod resample;
pub mod stack;
pub mod synth;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::coords::{map_index, polar, CoordGrid};
    pub use crate::error::{EvalFault, SynthesisError};
    pub use crate::expr::{Evaluator, NeededVars, Program, ProgramLayout, Variable};
    pub use crate::native::{NativeEvaluator, TokenProgram, VarTable};
    pub use crate::normalize::rescale;
    pub use crate::pixel::{pack_rgb, unpack_rgb, PixelEncoding, PixelSlice};
    pub use crate::preview::{
        PreviewFrame, PreviewOptions, PreviewPipeline, PreviewStage, PREVIEW_BOUND,
    };
    pub use crate::resample::{downsized_dims, enlarged_dims, resize_slice};
    pub use crate::stack::ImageStack;
    pub use crate::synth::{synthesize, synthesize_slice, ProgressSink};
    pub use crate::types::{
        AxisRange, ExpressionSet, GridShape, Interpolation, NormalizationMode, Region,
        SynthesisRequest,
    };
}

// Re-exports for convenience
pub use error::SynthesisError;
pub use pixel::PixelEncoding;
pub use stack::ImageStack;
pub use synth::{synthesize, synthesize_slice};
pub use types::SynthesisRequest;
