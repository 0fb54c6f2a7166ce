//! Pixel synthesis dispatcher
//!
//! One generic slice/row/column loop drives every encoding and expression
//! mode; everything storage-specific is delegated to the [`PixelSlice`]
//! codec. The compiled program is prepared once per request and re-executed
//! per pixel from the layout's entry offset with rebound variables.
//!
//! # Binding cadence
//!
//! - `w`, `h`, `s` and (if referenced) `E`: once per request.
//! - `z`: once per slice, if referenced.
//! - `y`: every row.
//! - `v` (or `r`,`g`,`b`): every pixel.
//! - `x`, `d`, `a`: every pixel, if referenced.
//!
//! # Failure atomicity
//!
//! Every mode evaluates into request-owned scratch buffers and commits only
//! after the full pass succeeds. A compile fault aborts before any
//! evaluation; a runtime fault discards the scratch. Either way the
//! destination stack is left exactly as it was, and a program reading
//! existing pixels always sees pre-request values.

use log::warn;

use crate::coords::{polar, CoordGrid};
use crate::error::{EvalFault, SynthesisError};
use crate::expr::{Evaluator, NeededVars, ProgramLayout, Variable};
use crate::normalize;
use crate::pixel::PixelSlice;
use crate::stack::ImageStack;
use crate::types::{GridShape, Region, SynthesisRequest};

// ── Progress ─────────────────────────────────────────────────

/// Receiver for coarse synthesis progress.
///
/// Reports arrive roughly fifty times per slice pass (every
/// `region.h / 50` rows) plus a final `1.0` when the request commits.
/// Reporting never affects control flow.
pub trait ProgressSink {
    /// Receive a completion fraction in `[0, 1]`.
    fn report(&mut self, fraction: f64);
}

/// Discards all reports.
impl ProgressSink for () {
    fn report(&mut self, _fraction: f64) {}
}

/// Collects every reported fraction in order.
impl ProgressSink for Vec<f64> {
    fn report(&mut self, fraction: f64) {
        self.push(fraction);
    }
}

// ── Scratch ──────────────────────────────────────────────────

/// Evaluated values of one slice pass, region-sized, pre-encode.
#[derive(Debug, Clone)]
pub(crate) enum SliceScratch {
    /// Scalar results: gray values, or whole packed integers in
    /// packed-RGB mode.
    Gray(Vec<f64>),
    /// Per-channel results.
    Rgb {
        /// Red channel values.
        r: Vec<f64>,
        /// Green channel values.
        g: Vec<f64>,
        /// Blue channel values.
        b: Vec<f64>,
    },
}

impl SliceScratch {
    fn gray(capacity: usize) -> Self {
        SliceScratch::Gray(Vec::with_capacity(capacity))
    }

    fn rgb(capacity: usize) -> Self {
        SliceScratch::Rgb {
            r: Vec::with_capacity(capacity),
            g: Vec::with_capacity(capacity),
            b: Vec::with_capacity(capacity),
        }
    }
}

// ── Pass Plan ────────────────────────────────────────────────

/// Per-request state: compiled layout, needed-variable gates, coordinate
/// lookup, and the resolved evaluation mode.
struct PassPlan {
    entry: u32,
    needed: NeededVars,
    /// Three-expression mode: bind `r,g,b`, one run, read the `_new` trio.
    per_channel: bool,
    /// RGB stack evaluated channel-wise (scalar mode without packed access).
    use_channels: bool,
    roi: Region,
    width: u32,
    grid: CoordGrid,
}

impl PassPlan {
    /// Validate the request against the stack, compile the program, and
    /// bind the per-request variables. `z_count` is the slice count that
    /// drives the Z mapping (the stack's own count for full synthesis, the
    /// source stack's for single-frame use).
    fn prepare<E: Evaluator>(
        stack: &ImageStack,
        request: &SynthesisRequest,
        eval: &mut E,
        z_count: u32,
    ) -> Result<PassPlan, SynthesisError> {
        let shape = stack.shape();
        let encoding = stack.encoding();
        let per_channel = request.expressions.is_per_channel();

        if per_channel && !encoding.is_rgb() {
            return Err(SynthesisError::EncodingMismatch {
                expected: "RGB24",
                found: encoding.name(),
            });
        }

        let roi = stack.roi();
        if roi.is_empty() {
            return Err(SynthesisError::EmptyRegion {
                width: roi.w,
                height: roi.h,
            });
        }

        let programs: Vec<E::Prog> = request
            .expressions
            .sources()
            .map(|source| eval.scan(source))
            .collect();
        let needed = NeededVars::from_programs(&programs);

        warn_degenerate_axes(request, shape, z_count);

        let layout = ProgramLayout::for_expressions(&request.expressions);
        let source = layout.source_for(&request.expressions);
        eval.prepare(&source, layout)
            .map_err(|fault| SynthesisError::from_fault(fault, 0))?;

        eval.bind(Variable::W, request.x_range().extent());
        eval.bind(Variable::H, request.y_range().extent());
        eval.bind(Variable::S, request.z_range().extent());
        if needed.contains(NeededVars::E) {
            eval.bind(Variable::E, std::f64::consts::E);
        }

        let packed = encoding.is_rgb()
            && !per_channel
            && (request.read_existing_pixel || needed.contains(NeededVars::GET_PIXEL));

        let z_shape = GridShape {
            slices: z_count.max(1),
            ..shape
        };
        let grid = CoordGrid::new(z_shape, roi, &request.axes);

        Ok(PassPlan {
            entry: layout.entry_offset(),
            needed,
            per_channel,
            use_channels: encoding.is_rgb() && !packed,
            roi,
            width: shape.width,
            grid,
        })
    }

    /// Evaluate one slice into scratch. `z` is the 0-based coordinate
    /// index along the slice axis.
    fn run_slice<E, P>(
        &self,
        src: &PixelSlice,
        z: u32,
        eval: &mut E,
        progress: &mut P,
    ) -> Result<SliceScratch, EvalFault>
    where
        E: Evaluator,
        P: ProgressSink + ?Sized,
    {
        let roi = self.roi;
        let inc = (roi.h / 50).max(1);

        if self.needed.contains(NeededVars::Z) {
            eval.bind(Variable::Z, self.grid.z(z));
        }

        let mut scratch = if self.use_channels {
            SliceScratch::rgb(roi.len())
        } else {
            SliceScratch::gray(roi.len())
        };

        for y in roi.y..roi.y + roi.h {
            if y % inc == 0 {
                progress.report((y - roi.y) as f64 / roi.h as f64);
            }
            let dy = self.grid.y(y);
            eval.bind(Variable::Y, dy);

            for col in 0..roi.w {
                let x = roi.x + col;
                let pos = y as usize * self.width as usize + x as usize;
                let dx = self.grid.x(col as usize);

                if self.needed.contains(NeededVars::X) {
                    eval.bind(Variable::X, dx);
                }
                if self.needed.wants_polar() {
                    let (d, a) = polar(dx, dy);
                    if self.needed.contains(NeededVars::D) {
                        eval.bind(Variable::D, d);
                    }
                    if self.needed.contains(NeededVars::A) {
                        eval.bind(Variable::A, a);
                    }
                }

                match &mut scratch {
                    SliceScratch::Gray(values) => {
                        eval.bind(Variable::V, src.decode(pos));
                        eval.run_from(self.entry)?;
                        values.push(eval.read(Variable::V));
                    }
                    SliceScratch::Rgb { r, g, b } => {
                        let (cr, cg, cb) = src.rgb_channels(pos);
                        if self.per_channel {
                            eval.bind(Variable::R, cr);
                            eval.bind(Variable::G, cg);
                            eval.bind(Variable::B, cb);
                            eval.run_from(self.entry)?;
                            r.push(eval.read(Variable::RNew));
                            g.push(eval.read(Variable::GNew));
                            b.push(eval.read(Variable::BNew));
                        } else {
                            for (input, out) in
                                [(cr, &mut *r), (cg, &mut *g), (cb, &mut *b)]
                            {
                                eval.bind(Variable::V, input);
                                eval.run_from(self.entry)?;
                                out.push(eval.read(Variable::V));
                            }
                        }
                    }
                }
            }
        }
        Ok(scratch)
    }
}

fn warn_degenerate_axes(request: &SynthesisRequest, shape: GridShape, z_count: u32) {
    let dims = [shape.width, shape.height, z_count];
    for (i, name) in ["X", "Y", "Z"].iter().enumerate() {
        let range = request.axes[i];
        if range.is_degenerate() && dims[i] > 1 {
            warn!(
                "degenerate {name} range [{}, {}]: all coordinates collapse to {}",
                range.min, range.max, range.min
            );
        }
    }
}

// ── Entry Points ─────────────────────────────────────────────

/// Synthesize every slice of `stack` per `request`.
///
/// Evaluates the expression(s) over the stack's active region, then commits
/// through the request's normalization mode. On any error the stack is
/// unchanged.
pub fn synthesize<E, P>(
    stack: &mut ImageStack,
    request: &SynthesisRequest,
    eval: &mut E,
    progress: &mut P,
) -> Result<(), SynthesisError>
where
    E: Evaluator,
    P: ProgressSink + ?Sized,
{
    let slices = stack.shape().slices;
    let plan = PassPlan::prepare(stack, request, eval, slices)?;

    let mut scratches = Vec::with_capacity(slices as usize);
    for z in 0..slices {
        let scratch = plan
            .run_slice(stack.slice(z), z, eval, progress)
            .map_err(|fault| SynthesisError::from_fault(fault, z + 1))?;
        scratches.push((z, scratch));
    }

    normalize::commit(stack, request.normalization, plan.roi, &scratches);
    progress.report(1.0);
    Ok(())
}

/// Synthesize one slice of `stack`, with the Z coordinate driven by an
/// explicit context.
///
/// `slice` selects the destination slice; `z` and `z_count` drive the Z
/// mapping independently, so a downsized single-slice preview of slice 7 of
/// a 12-slice stack passes `z = 7, z_count = 12`.
pub fn synthesize_slice<E, P>(
    stack: &mut ImageStack,
    slice: u32,
    z: u32,
    z_count: u32,
    request: &SynthesisRequest,
    eval: &mut E,
    progress: &mut P,
) -> Result<(), SynthesisError>
where
    E: Evaluator,
    P: ProgressSink + ?Sized,
{
    let slices = stack.shape().slices;
    if slice >= slices {
        return Err(SynthesisError::SliceOutOfRange { slice, slices });
    }

    let plan = PassPlan::prepare(stack, request, eval, z_count)?;
    let scratch = plan
        .run_slice(stack.slice(slice), z, eval, progress)
        .map_err(|fault| SynthesisError::from_fault(fault, slice + 1))?;

    normalize::commit(stack, request.normalization, plan.roi, &[(slice, scratch)]);
    progress.report(1.0);
    Ok(())
}
