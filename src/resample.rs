//! Slice resampling for preview scaling
//!
//! Center-aligned resize of a single [`PixelSlice`] with nearest, bilinear
//! or Catmull-Rom bicubic sampling. Gray encodings resample the decoded
//! value field and round on the way back in; RGB resamples each channel
//! independently. Also hosts the preview sizing rules: downsizing applies
//! the width clamp then the height clamp in sequence, enlarging only kicks
//! in when both dimensions are under the minimum and scales the larger one
//! up to it.

use crate::pixel::{PixelEncoding, PixelSlice};
use crate::types::Interpolation;

// ── Target Dimensions ────────────────────────────────────────

/// Dimensions after shrinking `(width, height)` to fit `bound`, keeping
/// aspect ratio. Dimensions already within the bound pass through.
pub fn downsized_dims(width: u32, height: u32, bound: u32) -> (u32, u32) {
    let mut w = width;
    let mut h = height;
    if w > bound {
        h = (h * bound / w).max(1);
        w = bound;
    }
    if h > bound {
        w = (w * bound / h).max(1);
        h = bound;
    }
    (w, h)
}

/// Dimensions after growing `(width, height)` so the larger dimension
/// reaches `min_size`. `None` unless both dimensions are under the
/// minimum; an image with one large dimension is left alone.
pub fn enlarged_dims(width: u32, height: u32, min_size: u32) -> Option<(u32, u32)> {
    if width >= min_size || height >= min_size {
        return None;
    }
    if height < width {
        Some((min_size, height * min_size / width))
    } else {
        Some((width * min_size / height, min_size))
    }
}

// ── Resize ───────────────────────────────────────────────────

/// Resample `src` (of `src_w`×`src_h`) to `dst_w`×`dst_h`.
///
/// A same-size request returns a plain copy.
pub fn resize_slice(
    src: &PixelSlice,
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    interpolation: Interpolation,
) -> PixelSlice {
    if (src_w, src_h) == (dst_w, dst_h) {
        return src.clone();
    }

    let mut dst = PixelSlice::zeroed(src.encoding(), dst_w as usize * dst_h as usize);
    let map = CenterMap::new(src_w, src_h, dst_w, dst_h, interpolation);

    match src.encoding() {
        PixelEncoding::Rgb24 => {
            for y in 0..dst_h {
                for x in 0..dst_w {
                    let (xs, ys) = map.source_pos(x, y);
                    let r = sample(|i| src.rgb_channels(i).0, src_w, src_h, xs, ys, interpolation);
                    let g = sample(|i| src.rgb_channels(i).1, src_w, src_h, xs, ys, interpolation);
                    let b = sample(|i| src.rgb_channels(i).2, src_w, src_h, xs, ys, interpolation);
                    let pos = (y * dst_w + x) as usize;
                    dst.encode_rgb(pos, r.round(), g.round(), b.round());
                }
            }
        }
        encoding => {
            let round = encoding != PixelEncoding::Gray32Float;
            for y in 0..dst_h {
                for x in 0..dst_w {
                    let (xs, ys) = map.source_pos(x, y);
                    let mut value = sample(|i| src.decode(i), src_w, src_h, xs, ys, interpolation);
                    if round {
                        value = value.round();
                    }
                    dst.encode((y * dst_w + x) as usize, value);
                }
            }
        }
    }
    dst
}

/// Maps destination pixel centers back into source coordinates.
struct CenterMap {
    src_cx: f64,
    src_cy: f64,
    dst_cx: f64,
    dst_cy: f64,
    x_scale: f64,
    y_scale: f64,
}

impl CenterMap {
    fn new(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, interpolation: Interpolation) -> Self {
        let x_scale = dst_w as f64 / src_w as f64;
        let y_scale = dst_h as f64 / src_h as f64;
        let mut dst_cx = dst_w as f64 / 2.0;
        let mut dst_cy = dst_h as f64 / 2.0;
        if interpolation != Interpolation::None {
            dst_cx += x_scale / 2.0;
            dst_cy += y_scale / 2.0;
        }
        CenterMap {
            src_cx: src_w as f64 / 2.0,
            src_cy: src_h as f64 / 2.0,
            dst_cx,
            dst_cy,
            x_scale,
            y_scale,
        }
    }

    fn source_pos(&self, x: u32, y: u32) -> (f64, f64) {
        (
            (x as f64 - self.dst_cx) / self.x_scale + self.src_cx,
            (y as f64 - self.dst_cy) / self.y_scale + self.src_cy,
        )
    }
}

// ── Sampling ─────────────────────────────────────────────────

fn sample<F: Fn(usize) -> f64>(
    get: F,
    width: u32,
    height: u32,
    x: f64,
    y: f64,
    interpolation: Interpolation,
) -> f64 {
    match interpolation {
        Interpolation::None => sample_nearest(get, width, height, x, y),
        Interpolation::Bilinear => sample_bilinear(get, width, height, x, y),
        Interpolation::Bicubic => sample_bicubic(get, width, height, x, y),
    }
}

fn sample_nearest<F: Fn(usize) -> f64>(get: F, width: u32, height: u32, x: f64, y: f64) -> f64 {
    let xi = ((x + 0.5).floor() as i64).clamp(0, width as i64 - 1) as usize;
    let yi = ((y + 0.5).floor() as i64).clamp(0, height as i64 - 1) as usize;
    get(yi * width as usize + xi)
}

fn sample_bilinear<F: Fn(usize) -> f64>(get: F, width: u32, height: u32, x: f64, y: f64) -> f64 {
    let w = width as usize;
    let h = height as usize;
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let top = get(y0 * w + x0) * (1.0 - fx) + get(y0 * w + x1) * fx;
    let bottom = get(y1 * w + x0) * (1.0 - fx) + get(y1 * w + x1) * fx;
    top * (1.0 - fy) + bottom * fy
}

fn sample_bicubic<F: Fn(usize) -> f64>(get: F, width: u32, height: u32, x: f64, y: f64) -> f64 {
    let w = width as i64;
    let h = height as i64;
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let mut acc = 0.0;
    for n in -1i64..=2 {
        let py = (y0 + n).clamp(0, h - 1) as usize;
        let wy = cubic_weight(fy - n as f64);
        for m in -1i64..=2 {
            let px = (x0 + m).clamp(0, w - 1) as usize;
            let wx = cubic_weight(fx - m as f64);
            acc += get(py * w as usize + px) * wx * wy;
        }
    }
    acc
}

/// Catmull-Rom kernel (a = -0.5), support [-2, 2].
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        (1.5 * t - 2.5) * t * t + 1.0
    } else if t < 2.0 {
        ((-0.5 * t + 2.5) * t - 4.0) * t + 2.0
    } else {
        0.0
    }
}
