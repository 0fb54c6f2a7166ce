//! Coordinate mapping from pixel indices to the physical domain
//!
//! Each axis maps index `i` in `[0, dim)` onto `[min, max]` with
//! `min + (max - min) / (dim - 1) * i`, so index 0 lands exactly on `min`
//! and index `dim - 1` exactly on `max`. A single-sample axis collapses to
//! `min` (the division yields NaN, which is guarded here, not downstream).
//!
//! The X row of a region is precomputed once per request; Y is computed per
//! row and Z per slice.

use std::f64::consts::TAU;

use glam::DVec2;

use crate::types::{AxisRange, GridShape, Region};

/// Map one pixel index along an axis of `dim` samples into `range`.
#[inline]
pub fn map_index(index: u32, dim: u32, range: AxisRange) -> f64 {
    let coord = range.min + range.span() / (dim as f64 - 1.0) * index as f64;
    if coord.is_nan() {
        range.min
    } else {
        coord
    }
}

/// Radius and angle of the offset `(dx, dy)` from the domain origin.
///
/// The angle is `atan2(dy, dx)` lifted into `[0, 2π)`.
#[inline]
pub fn polar(dx: f64, dy: f64) -> (f64, f64) {
    let d = DVec2::new(dx, dy).length();
    let mut a = dy.atan2(dx);
    if a < 0.0 {
        a += TAU;
    }
    // TAU plus a tiny negative angle rounds to TAU itself; the interval
    // is half-open.
    if a >= TAU {
        a = 0.0;
    }
    (d, a)
}

/// Per-request coordinate lookup for a region of a stack.
///
/// Holds the precomputed X coordinates of the region's columns plus the
/// axis ranges needed for per-row and per-slice lookups.
#[derive(Debug, Clone)]
pub struct CoordGrid {
    xs: Vec<f64>,
    y_range: AxisRange,
    z_range: AxisRange,
    height: u32,
    slices: u32,
}

impl CoordGrid {
    /// Build the lookup for `region` within `shape` under the given axis
    /// ranges (X, Y, Z order).
    pub fn new(shape: GridShape, region: Region, axes: &[AxisRange; 3]) -> Self {
        let xs = (region.x..region.x + region.w)
            .map(|px| map_index(px, shape.width, axes[0]))
            .collect();
        CoordGrid {
            xs,
            y_range: axes[1],
            z_range: axes[2],
            height: shape.height,
            slices: shape.slices,
        }
    }

    /// Physical X of the region column `col` (0-based within the region).
    #[inline]
    pub fn x(&self, col: usize) -> f64 {
        self.xs[col]
    }

    /// Physical Y of the absolute pixel row `py`.
    #[inline]
    pub fn y(&self, py: u32) -> f64 {
        map_index(py, self.height, self.y_range)
    }

    /// Physical Z of the 0-based slice index.
    #[inline]
    pub fn z(&self, slice: u32) -> f64 {
        map_index(slice, self.slices, self.z_range)
    }

    /// Number of precomputed columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.xs.len()
    }
}
