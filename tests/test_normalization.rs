//! Integration tests: normalization engine
//!
//! Verifies local vs. global rescaling, per-channel behavior on RGB,
//! degenerate ranges, raw-space handling of calibrated stacks, and the
//! no-partial-commit contract in normalized modes.

mod common;

use common::*;
use pixsynth::prelude::*;

fn two_slice_ramp() -> (ImageStack, SynthesisRequest, NativeEvaluator) {
    // Slice 0 spans raw values [0, 10], slice 1 spans [0, 100].
    let stack = gray8_stack(11, 1, 2);
    let request = SynthesisRequest::scalar("x * (z == 0 ? 1 : 10)").with_axes(
        AxisRange::new(0.0, 10.0),
        AxisRange::default(),
        AxisRange::new(0.0, 1.0),
    );
    let eval = NativeEvaluator::scalar(|vars| {
        let scale = if vars.get(Variable::Z) == 0.0 { 1.0 } else { 10.0 };
        vars.get(Variable::X) * scale
    });
    (stack, request, eval)
}

// ============================================================================
// Local vs. global
// ============================================================================

#[test]
fn local_maps_each_slice_max_to_full_brightness() {
    let (mut stack, request, mut eval) = two_slice_ramp();
    let request = request.with_normalization(NormalizationMode::Local);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // Raw max 10 and raw max 100 both display at the encoding ceiling.
    assert_eq!(stack.pixel(10, 0, 0), 255.0);
    assert_eq!(stack.pixel(10, 0, 1), 255.0);
    assert_eq!(stack.pixel(0, 0, 0), 0.0);
    assert_eq!(stack.pixel(0, 0, 1), 0.0);
}

#[test]
fn global_compresses_the_smaller_slice() {
    let (mut stack, request, mut eval) = two_slice_ramp();
    let request = request.with_normalization(NormalizationMode::Global);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // One scale across the stack: only the stack-wide max hits the ceiling.
    assert_eq!(stack.pixel(10, 0, 1), 255.0);
    assert_eq!(stack.pixel(10, 0, 0), 26.0); // 10/100 of the range
    assert_eq!(stack.pixel(0, 0, 0), 0.0);
}

#[test]
fn sixteen_bit_local_uses_the_wider_ceiling() {
    let mut stack = gray16_stack(2, 1, 1);
    let request = identity_request("x", 2, 1).with_normalization(NormalizationMode::Local);
    let mut eval = read_back(Variable::X);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    assert_eq!(stack.pixel(0, 0, 0), 0.0);
    assert_eq!(stack.pixel(1, 0, 0), 65535.0);
}

// ============================================================================
// RGB channels
// ============================================================================

#[test]
fn rgb_local_rescales_channels_independently() {
    let mut stack = rgb_stack(2, 1, 1);
    let request = SynthesisRequest::per_channel(["x", "x * 10", "5"])
        .with_axes(
            AxisRange::new(0.0, 1.0),
            AxisRange::default(),
            AxisRange::default(),
        )
        .with_normalization(NormalizationMode::Local);
    let mut eval = NativeEvaluator::per_channel(|vars| {
        let x = vars.get(Variable::X);
        (x, x * 10.0, 5.0)
    });
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // r spans [0,1], g spans [0,10]: both stretch to [0,255].
    // b is constant: the degenerate range maps to the midpoint.
    assert_eq!(stack.slice(0).rgb_channels(0), (0.0, 0.0, 128.0));
    assert_eq!(stack.slice(0).rgb_channels(1), (255.0, 255.0, 128.0));
}

#[test]
fn rgb_global_shares_one_scale_across_channels() {
    let mut stack = rgb_stack(2, 1, 1);
    let request = SynthesisRequest::per_channel(["x", "x * 10", "5"])
        .with_axes(
            AxisRange::new(0.0, 1.0),
            AxisRange::default(),
            AxisRange::default(),
        )
        .with_normalization(NormalizationMode::Global);
    let mut eval = NativeEvaluator::per_channel(|vars| {
        let x = vars.get(Variable::X);
        (x, x * 10.0, 5.0)
    });
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // Channel range union is [0,10]: r max 1 -> 26, g max 10 -> 255, b 5 -> 128.
    assert_eq!(stack.slice(0).rgb_channels(1), (26.0, 255.0, 128.0));
}

// ============================================================================
// Edge behavior
// ============================================================================

#[test]
fn constant_output_maps_to_midpoint() {
    let mut stack = gray8_stack(3, 3, 1);
    let request =
        SynthesisRequest::scalar("42").with_normalization(NormalizationMode::Local);
    let mut eval = constant(42.0);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    assert_slice_constant(&stack, 0, 128.0);
}

#[test]
fn float_stacks_skip_rescaling() {
    let mut stack = ImageStack::new(PixelEncoding::Gray32Float, GridShape::new(2, 1, 1));
    let request = identity_request("x", 2, 1).with_normalization(NormalizationMode::Local);
    let mut eval = read_back(Variable::X);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // No fixed ceiling to stretch to: values land raw.
    assert_eq!(stack.pixel(0, 0, 0), 0.0);
    assert_eq!(stack.pixel(1, 0, 0), 1.0);
}

#[test]
fn signed16_normalizes_in_raw_space() {
    let mut stack = ImageStack::new(PixelEncoding::Gray16Signed, GridShape::new(2, 1, 1));
    let request = SynthesisRequest::scalar("x")
        .with_axes(
            AxisRange::new(-5.0, 5.0),
            AxisRange::default(),
            AxisRange::default(),
        )
        .with_normalization(NormalizationMode::Local);
    let mut eval = read_back(Variable::X);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // Raw range [0, 65535] reads back through the calibration offset.
    assert_eq!(stack.pixel(0, 0, 0), -32768.0);
    assert_eq!(stack.pixel(1, 0, 0), 32767.0);
}

#[test]
fn normalization_respects_the_region() {
    let mut stack = gray8_stack(4, 4, 1);
    stack.fill(7.0);
    stack.set_roi(Some(Region::new(0, 0, 2, 4)));

    let request = identity_request("y", 4, 4).with_normalization(NormalizationMode::Local);
    let mut eval = read_back(Variable::Y);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // Inside: y in [0,3] stretched to [0,255]. Outside: untouched.
    assert_eq!(stack.pixel(0, 0, 0), 0.0);
    assert_eq!(stack.pixel(1, 3, 0), 255.0);
    assert_eq!(stack.pixel(1, 1, 0), 85.0);
    for y in 0..4 {
        assert_eq!(stack.pixel(2, y, 0), 7.0, "outside column, row {y}");
        assert_eq!(stack.pixel(3, y, 0), 7.0, "outside column, row {y}");
    }
}

#[test]
fn inverting_lut_never_reaches_stored_values() {
    let mut stack = gray8_stack(2, 1, 1);
    stack.set_inverted_lut(true);
    let request = identity_request("x", 2, 1).with_normalization(NormalizationMode::Local);
    let mut eval = read_back(Variable::X);
    synthesize(&mut stack, &request, &mut eval, &mut ()).expect("synthesis");

    // The flag describes how a display should draw the data, not the data:
    // the committed ramp is identical to a plain stack's.
    assert_eq!(stack.pixel(0, 0, 0), 0.0);
    assert_eq!(stack.pixel(1, 0, 0), 255.0);
}

// ============================================================================
// Atomicity
// ============================================================================

#[test]
fn fault_before_commit_preserves_the_stack() {
    let mut stack = gray16_stack(8, 8, 2);
    stack.fill(1234.0);
    let before = stack.clone();

    let request =
        SynthesisRequest::scalar("boom").with_normalization(NormalizationMode::Global);
    // Fail on the very last pixel of the second slice.
    let mut eval = failing_at(128);
    let err = synthesize(&mut stack, &request, &mut eval, &mut ()).unwrap_err();

    assert!(matches!(err, SynthesisError::Runtime { slice: 2, .. }));
    assert_eq!(stack, before, "normalized mode must not partially commit");
}

#[test]
fn single_frame_normalization_is_frame_local() {
    // Normalizing one slice of a stack leaves the others alone.
    let mut stack = gray8_stack(2, 1, 3);
    stack.fill(10.0);

    let request = identity_request("x", 2, 1).with_normalization(NormalizationMode::Local);
    let mut eval = read_back(Variable::X);
    synthesize_slice(&mut stack, 1, 1, 3, &request, &mut eval, &mut ())
        .expect("synthesis");

    assert_slice_constant(&stack, 0, 10.0);
    assert_eq!(stack.pixel(0, 0, 1), 0.0);
    assert_eq!(stack.pixel(1, 0, 1), 255.0);
    assert_slice_constant(&stack, 2, 10.0);
}
