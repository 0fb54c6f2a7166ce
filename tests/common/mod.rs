//! Common test helpers for pixsynth integration tests

#![allow(dead_code)]

use pixsynth::prelude::*;

/// Initialize logging so `debug!`/`warn!` traces show up in failed tests.
///
/// `try_init` keeps repeated calls harmless.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

// ============================================================================
// Standard test stacks
// ============================================================================

/// 8-bit stack, all zero.
pub fn gray8_stack(width: u32, height: u32, slices: u32) -> ImageStack {
    init_logging();
    ImageStack::new(PixelEncoding::Gray8, GridShape::new(width, height, slices))
}

/// 16-bit stack, all zero.
pub fn gray16_stack(width: u32, height: u32, slices: u32) -> ImageStack {
    init_logging();
    ImageStack::new(PixelEncoding::Gray16, GridShape::new(width, height, slices))
}

/// RGB stack, opaque black.
pub fn rgb_stack(width: u32, height: u32, slices: u32) -> ImageStack {
    init_logging();
    ImageStack::new(PixelEncoding::Rgb24, GridShape::new(width, height, slices))
}

/// Request whose x/y mappings are the identity on pixel indices.
pub fn identity_request(expression: &str, width: u32, height: u32) -> SynthesisRequest {
    SynthesisRequest::scalar(expression).with_axes(
        AxisRange::new(0.0, (width - 1) as f64),
        AxisRange::new(0.0, (height - 1) as f64),
        AxisRange::default(),
    )
}

// ============================================================================
// Evaluator recipes
// ============================================================================

/// Evaluates `v = x + y`.
pub fn coordinate_sum() -> NativeEvaluator {
    NativeEvaluator::scalar(|vars| vars.get(Variable::X) + vars.get(Variable::Y))
}

/// Evaluates a constant.
pub fn constant(value: f64) -> NativeEvaluator {
    NativeEvaluator::scalar(move |_| value)
}

/// Reads back one variable unchanged.
pub fn read_back(var: Variable) -> NativeEvaluator {
    NativeEvaluator::scalar(move |vars| vars.get(var))
}

/// Per-channel identity: `r_new=r, g_new=g, b_new=b`.
pub fn channel_identity() -> NativeEvaluator {
    NativeEvaluator::per_channel(|vars| {
        (
            vars.get(Variable::R),
            vars.get(Variable::G),
            vars.get(Variable::B),
        )
    })
}

/// Succeeds until run number `k` (1-based), then raises a runtime fault.
pub fn failing_at(k: u32) -> NativeEvaluator {
    let mut runs = 0;
    NativeEvaluator::new(move |vars| {
        runs += 1;
        if runs >= k {
            return Err(EvalFault::Runtime(format!("injected fault at run {runs}")));
        }
        vars.set(Variable::V, 0.0);
        Ok(())
    })
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two f64 values are close within tolerance
pub fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff={}, tol={})",
        msg,
        a,
        b,
        (a - b).abs(),
        tol
    );
}

/// Assert every pixel of `slice` in `stack` equals `expected`.
pub fn assert_slice_constant(stack: &ImageStack, slice: u32, expected: f64) {
    let shape = stack.shape();
    for y in 0..shape.height {
        for x in 0..shape.width {
            assert_eq!(
                stack.pixel(x, y, slice),
                expected,
                "pixel ({x}, {y}) of slice {slice}"
            );
        }
    }
}
