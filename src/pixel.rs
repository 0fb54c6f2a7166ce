//! Pixel encodings and the per-slice codec
//!
//! Five storage encodings share one synthesis loop; everything
//! encoding-specific lives here as decode/encode pairs on [`PixelSlice`].
//!
//! Write semantics per encoding:
//! - `Gray8` / `Gray16`: truncate toward zero, clamp to the storage range.
//! - `Gray16Signed`: calibrated values (raw − 32768); the setter rounds,
//!   shifts back to raw, and clamps to the 16-bit range.
//! - `Gray32Float`: stored as-is, no clamp.
//! - `Rgb24`: channels truncate and clamp to `[0, 255]` and repack with an
//!   opaque alpha; whole-packed writes reinterpret the value as a signed
//!   32-bit integer, NaN becoming 0.
//!
//! Normalized commits go through [`PixelSlice::encode_scaled`], which
//! expects a value already mapped onto the raw storage range and rounds
//! instead of truncating.

use serde::{Deserialize, Serialize};

/// Calibration offset of the signed 16-bit encoding: `value = raw - 32768`.
pub const SIGNED16_OFFSET: f64 = 32768.0;

// ── Encoding ─────────────────────────────────────────────────

/// Storage encoding of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelEncoding {
    /// Unsigned 8-bit gray.
    Gray8,
    /// Unsigned 16-bit gray.
    Gray16,
    /// Calibrated 16-bit gray: stored raw, valued `raw - 32768`.
    Gray16Signed,
    /// 32-bit float gray.
    Gray32Float,
    /// Packed 24-bit color, `0xAARRGGBB` in a `u32`.
    Rgb24,
}

impl PixelEncoding {
    /// Short name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            PixelEncoding::Gray8 => "Gray8",
            PixelEncoding::Gray16 => "Gray16",
            PixelEncoding::Gray16Signed => "Gray16Signed",
            PixelEncoding::Gray32Float => "Gray32Float",
            PixelEncoding::Rgb24 => "RGB24",
        }
    }

    /// True for the packed color encoding.
    #[inline]
    pub fn is_rgb(self) -> bool {
        matches!(self, PixelEncoding::Rgb24)
    }

    /// Top of the raw storage range normalization rescales onto.
    ///
    /// `None` for floats: they have no bounded destination, so
    /// normalization degrades to the plain path.
    pub fn scale_max(self) -> Option<f64> {
        match self {
            PixelEncoding::Gray8 => Some(255.0),
            PixelEncoding::Gray16 | PixelEncoding::Gray16Signed => Some(65535.0),
            PixelEncoding::Gray32Float => None,
            // Per channel.
            PixelEncoding::Rgb24 => Some(255.0),
        }
    }
}

// ── Packing Helpers ──────────────────────────────────────────

/// Pack clamped channel values into `0xFFRRGGBB`.
#[inline]
pub fn pack_rgb(r: f64, g: f64, b: f64) -> u32 {
    0xFF00_0000 | (clamp_channel(r) << 16) | (clamp_channel(g) << 8) | clamp_channel(b)
}

/// Unpack the three channels of a packed pixel.
#[inline]
pub fn unpack_rgb(pixel: u32) -> (f64, f64, f64) {
    (
        ((pixel >> 16) & 0xFF) as f64,
        ((pixel >> 8) & 0xFF) as f64,
        (pixel & 0xFF) as f64,
    )
}

#[inline]
fn clamp_channel(v: f64) -> u32 {
    (v as i64).clamp(0, 255) as u32
}

#[inline]
fn clamp_u8(v: f64) -> u8 {
    (v as i64).clamp(0, 255) as u8
}

#[inline]
fn clamp_u16(v: f64) -> u16 {
    (v as i64).clamp(0, 65535) as u16
}

// ── Pixel Slice ──────────────────────────────────────────────

/// One slice of encoded pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PixelSlice {
    /// Unsigned bytes.
    Gray8(Vec<u8>),
    /// Unsigned shorts.
    Gray16(Vec<u16>),
    /// Raw shorts valued `raw - 32768`.
    Gray16Signed(Vec<u16>),
    /// Floats.
    Gray32Float(Vec<f32>),
    /// Packed `0xAARRGGBB`.
    Rgb24(Vec<u32>),
}

impl PixelSlice {
    /// Fresh slice of `len` pixels: gray encodings zero, RGB opaque black.
    pub fn zeroed(encoding: PixelEncoding, len: usize) -> Self {
        match encoding {
            PixelEncoding::Gray8 => PixelSlice::Gray8(vec![0; len]),
            PixelEncoding::Gray16 => PixelSlice::Gray16(vec![0; len]),
            PixelEncoding::Gray16Signed => PixelSlice::Gray16Signed(vec![0; len]),
            PixelEncoding::Gray32Float => PixelSlice::Gray32Float(vec![0.0; len]),
            PixelEncoding::Rgb24 => PixelSlice::Rgb24(vec![0xFF00_0000; len]),
        }
    }

    /// Encoding of this slice.
    pub fn encoding(&self) -> PixelEncoding {
        match self {
            PixelSlice::Gray8(_) => PixelEncoding::Gray8,
            PixelSlice::Gray16(_) => PixelEncoding::Gray16,
            PixelSlice::Gray16Signed(_) => PixelEncoding::Gray16Signed,
            PixelSlice::Gray32Float(_) => PixelEncoding::Gray32Float,
            PixelSlice::Rgb24(_) => PixelEncoding::Rgb24,
        }
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        match self {
            PixelSlice::Gray8(p) => p.len(),
            PixelSlice::Gray16(p) => p.len(),
            PixelSlice::Gray16Signed(p) => p.len(),
            PixelSlice::Gray32Float(p) => p.len(),
            PixelSlice::Rgb24(p) => p.len(),
        }
    }

    /// True when the slice holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value bound as `v` for the pixel at `idx`.
    ///
    /// For `Rgb24` this is the whole packed integer reinterpreted as a
    /// signed 32-bit value (opaque alpha makes it negative); channel-wise
    /// access goes through [`rgb_channels`](PixelSlice::rgb_channels).
    #[inline]
    pub fn decode(&self, idx: usize) -> f64 {
        match self {
            PixelSlice::Gray8(p) => p[idx] as f64,
            PixelSlice::Gray16(p) => p[idx] as f64,
            PixelSlice::Gray16Signed(p) => p[idx] as f64 - SIGNED16_OFFSET,
            PixelSlice::Gray32Float(p) => p[idx] as f64,
            PixelSlice::Rgb24(p) => p[idx] as i32 as f64,
        }
    }

    /// Channel values of an RGB pixel; 0 for gray encodings.
    #[inline]
    pub fn rgb_channels(&self, idx: usize) -> (f64, f64, f64) {
        match self {
            PixelSlice::Rgb24(p) => unpack_rgb(p[idx]),
            _ => (0.0, 0.0, 0.0),
        }
    }

    /// Write an evaluated value with the encoding's clamp semantics.
    #[inline]
    pub fn encode(&mut self, idx: usize, value: f64) {
        match self {
            PixelSlice::Gray8(p) => p[idx] = clamp_u8(value),
            PixelSlice::Gray16(p) => p[idx] = clamp_u16(value),
            PixelSlice::Gray16Signed(p) => {
                p[idx] = clamp_u16(value.round() + SIGNED16_OFFSET);
            }
            PixelSlice::Gray32Float(p) => p[idx] = value as f32,
            PixelSlice::Rgb24(p) => p[idx] = value as i32 as u32,
        }
    }

    /// Write three channel results as one packed RGB pixel.
    ///
    /// No-op on gray encodings; the dispatcher never routes channel results
    /// to them.
    #[inline]
    pub fn encode_rgb(&mut self, idx: usize, r: f64, g: f64, b: f64) {
        if let PixelSlice::Rgb24(p) = self {
            p[idx] = pack_rgb(r, g, b);
        }
    }

    /// Normalized commit: `value` is already mapped onto the raw storage
    /// range; round and store without calibration.
    #[inline]
    pub fn encode_scaled(&mut self, idx: usize, value: f64) {
        match self {
            PixelSlice::Gray8(p) => p[idx] = clamp_u8(value.round()),
            PixelSlice::Gray16(p) | PixelSlice::Gray16Signed(p) => {
                p[idx] = clamp_u16(value.round());
            }
            PixelSlice::Gray32Float(p) => p[idx] = value as f32,
            PixelSlice::Rgb24(p) => p[idx] = value as i32 as u32,
        }
    }
}
