//! Scratch commit and value normalization
//!
//! Every synthesis pass evaluates into per-slice scratch buffers; this
//! module owns the single commit step that encodes them into the stack.
//! With [`NormalizationMode::None`] values are encoded as-is. Local mode
//! rescales each scratch buffer against its own min/max; Global mode takes
//! one min/max across every buffer (and every RGB channel) so a multi-slice
//! animation keeps a steady brightness.
//!
//! Rescaling maps `[min, max]` onto `[0, encoding max]` and rounds. A
//! collapsed value range maps everything to the midpoint. Float stacks have
//! no fixed encoding range, so normalization degrades to a raw commit.
//!
//! Stored values are never reflected for an inverting LUT; that is the
//! display layer's job (see the preview's RGB conversion).

use log::debug;

use crate::stack::ImageStack;
use crate::synth::SliceScratch;
use crate::types::{NormalizationMode, Region};

/// Rescale `value` from `[min, max]` onto `[0, scale_max]`.
///
/// When the input range is collapsed (`max <= min`) every value maps to
/// `scale_max / 2`. The result is not yet rounded.
pub fn rescale(value: f64, min: f64, max: f64, scale_max: f64) -> f64 {
    if max > min {
        (value - min) / (max - min) * scale_max
    } else {
        scale_max / 2.0
    }
}

// ── Stats ────────────────────────────────────────────────────

/// Running min/max over scratch values. NaN values are skipped.
#[derive(Debug, Clone, Copy)]
struct ValueStats {
    min: f64,
    max: f64,
}

impl ValueStats {
    fn empty() -> Self {
        ValueStats {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn of(values: &[f64]) -> Self {
        let mut stats = ValueStats::empty();
        stats.include_all(values);
        stats
    }

    fn include_all(&mut self, values: &[f64]) {
        for &value in values {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }
}

fn global_stats(slices: &[(u32, SliceScratch)]) -> ValueStats {
    let mut stats = ValueStats::empty();
    for (_, scratch) in slices {
        match scratch {
            SliceScratch::Gray(values) => stats.include_all(values),
            SliceScratch::Rgb { r, g, b } => {
                stats.include_all(r);
                stats.include_all(g);
                stats.include_all(b);
            }
        }
    }
    stats
}

// ── Commit ───────────────────────────────────────────────────

/// Encode evaluated scratch buffers into their destination slices.
///
/// `slices` pairs each scratch with its destination slice index; buffers
/// are region-sized in row-major order over `roi`.
pub(crate) fn commit(
    stack: &mut ImageStack,
    mode: NormalizationMode,
    roi: Region,
    slices: &[(u32, SliceScratch)],
) {
    let scale_max = match mode {
        NormalizationMode::None => None,
        NormalizationMode::Local | NormalizationMode::Global => {
            let scale = stack.encoding().scale_max();
            if scale.is_none() {
                debug!(
                    "{} has no fixed range: normalization commits raw values",
                    stack.encoding().name()
                );
            }
            // Packed whole-pixel results cannot be rescaled channel-wise.
            let packed_rgb = stack.encoding().is_rgb()
                && matches!(slices.first(), Some((_, SliceScratch::Gray(_))));
            if packed_rgb {
                debug!("packed RGB results are committed raw; use channel mode to normalize");
                None
            } else {
                scale
            }
        }
    };

    match scale_max {
        None => commit_raw(stack, roi, slices),
        Some(scale) => {
            let global = match mode {
                NormalizationMode::Global => Some(global_stats(slices)),
                _ => None,
            };
            commit_scaled(stack, roi, slices, global, scale);
        }
    }
}

fn commit_raw(stack: &mut ImageStack, roi: Region, slices: &[(u32, SliceScratch)]) {
    let width = stack.shape().width as usize;
    for (index, scratch) in slices {
        let slice = stack.slice_mut(*index);
        match scratch {
            SliceScratch::Gray(values) => {
                for (&value, pos) in values.iter().zip(positions(roi, width)) {
                    slice.encode(pos, value);
                }
            }
            SliceScratch::Rgb { r, g, b } => {
                for (i, pos) in positions(roi, width).enumerate() {
                    slice.encode_rgb(pos, r[i], g[i], b[i]);
                }
            }
        }
    }
}

fn commit_scaled(
    stack: &mut ImageStack,
    roi: Region,
    slices: &[(u32, SliceScratch)],
    global: Option<ValueStats>,
    scale_max: f64,
) {
    let width = stack.shape().width as usize;
    for (index, scratch) in slices {
        let slice = stack.slice_mut(*index);
        match scratch {
            SliceScratch::Gray(values) => {
                let stats = global.unwrap_or_else(|| ValueStats::of(values));
                for (&value, pos) in values.iter().zip(positions(roi, width)) {
                    slice.encode_scaled(pos, rescale(value, stats.min, stats.max, scale_max));
                }
            }
            SliceScratch::Rgb { r, g, b } => {
                let sr = global.unwrap_or_else(|| ValueStats::of(r));
                let sg = global.unwrap_or_else(|| ValueStats::of(g));
                let sb = global.unwrap_or_else(|| ValueStats::of(b));
                for (i, pos) in positions(roi, width).enumerate() {
                    slice.encode_rgb(
                        pos,
                        rescale(r[i], sr.min, sr.max, scale_max).round(),
                        rescale(g[i], sg.min, sg.max, scale_max).round(),
                        rescale(b[i], sb.min, sb.max, scale_max).round(),
                    );
                }
            }
        }
    }
}

/// Row-major absolute buffer positions covered by `roi`.
fn positions(roi: Region, width: usize) -> impl Iterator<Item = usize> {
    (roi.y..roi.y + roi.h)
        .flat_map(move |y| (roi.x..roi.x + roi.w).map(move |x| y as usize * width + x as usize))
}
