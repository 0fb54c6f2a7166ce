//! In-memory pixel-buffer host
//!
//! [`ImageStack`] owns the per-slice encoded buffers the engine reads and
//! writes, plus the host-side attributes synthesis consults: region of
//! interest, inverted-LUT flag, and the fixed signed-16 calibration that
//! [`PixelSlice`] applies on decode/encode. Hosts with their own storage
//! build one of these around copies or staging buffers; the engine never
//! does file or display I/O.

use serde::{Deserialize, Serialize};

use crate::pixel::{PixelEncoding, PixelSlice};
use crate::types::{GridShape, Region};

/// A stack of equally shaped, equally encoded pixel slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStack {
    shape: GridShape,
    slices: Vec<PixelSlice>,
    roi: Option<Region>,
    inverted_lut: bool,
}

impl ImageStack {
    /// Create a stack of zeroed slices.
    pub fn new(encoding: PixelEncoding, shape: GridShape) -> Self {
        let len = shape.slice_len();
        let slices = (0..shape.slices)
            .map(|_| PixelSlice::zeroed(encoding, len))
            .collect();
        ImageStack {
            shape,
            slices,
            roi: None,
            inverted_lut: false,
        }
    }

    /// Wrap existing slice buffers.
    ///
    /// Panics if the slice count, lengths, or encodings disagree with
    /// `shape`; buffer geometry is a construction invariant.
    pub fn from_slices(shape: GridShape, slices: Vec<PixelSlice>) -> Self {
        assert_eq!(slices.len(), shape.slices as usize);
        let encoding = slices[0].encoding();
        for s in &slices {
            assert_eq!(s.len(), shape.slice_len());
            assert_eq!(s.encoding(), encoding);
        }
        ImageStack {
            shape,
            slices,
            roi: None,
            inverted_lut: false,
        }
    }

    /// Grid dimensions.
    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Storage encoding.
    #[inline]
    pub fn encoding(&self) -> PixelEncoding {
        self.slices[0].encoding()
    }

    /// Active region: the set ROI clipped to the slice, or the full slice.
    pub fn roi(&self) -> Region {
        match self.roi {
            Some(r) => r.clipped_to(self.shape),
            None => Region::full(self.shape),
        }
    }

    /// Restrict synthesis to a region (`None` resets to the full slice).
    pub fn set_roi(&mut self, roi: Option<Region>) {
        self.roi = roi;
    }

    /// True when the host displays this stack through an inverted LUT.
    #[inline]
    pub fn is_inverted_lut(&self) -> bool {
        self.inverted_lut
    }

    /// Set the inverted-LUT display flag.
    pub fn set_inverted_lut(&mut self, inverted: bool) {
        self.inverted_lut = inverted;
    }

    /// Borrow a slice (0-based).
    #[inline]
    pub fn slice(&self, index: u32) -> &PixelSlice {
        &self.slices[index as usize]
    }

    /// Mutably borrow a slice (0-based).
    #[inline]
    pub fn slice_mut(&mut self, index: u32) -> &mut PixelSlice {
        &mut self.slices[index as usize]
    }

    /// All slices in order.
    pub fn slices(&self) -> &[PixelSlice] {
        &self.slices
    }

    /// Decoded value at `(x, y)` of a slice.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32, slice: u32) -> f64 {
        let pos = y as usize * self.shape.width as usize + x as usize;
        self.slices[slice as usize].decode(pos)
    }

    /// Encode `value` at `(x, y)` of a slice.
    pub fn set_pixel(&mut self, x: u32, y: u32, slice: u32, value: f64) {
        let pos = y as usize * self.shape.width as usize + x as usize;
        self.slices[slice as usize].encode(pos, value);
    }

    /// Encode `value` into every pixel of every slice.
    pub fn fill(&mut self, value: f64) {
        let len = self.shape.slice_len();
        for slice in &mut self.slices {
            for pos in 0..len {
                slice.encode(pos, value);
            }
        }
    }
}
