//! Error types for the synthesis engine
//!
//! Every fallible seam returns an explicit `Result`; nothing is swallowed.
//! A failed request never leaves a partially written destination: scratch
//! buffers are discarded and the live pixel data stays as it was.

use thiserror::Error;

/// Fault reported by an expression evaluator.
///
/// The engine treats the evaluator as a black box: compilation problems and
/// runtime problems are the only two shapes it needs to distinguish.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalFault {
    /// The source (preamble + user expression) failed to compile.
    #[error("expression failed to compile: {0}")]
    Compile(String),

    /// An execution raised an error (division fault, unknown identifier
    /// reached at run time, host callback failure).
    #[error("expression raised at run time: {0}")]
    Runtime(String),
}

/// Errors produced by synthesis, normalization, and preview requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// Expression compilation failed before any pixel was evaluated.
    #[error("compile error: {message}")]
    Compile {
        /// Evaluator-supplied diagnostic text.
        message: String,
    },

    /// The evaluator faulted mid-pass; the destination was left untouched.
    #[error("runtime error in slice {slice}: {message}")]
    Runtime {
        /// 1-based slice index being synthesized when the fault surfaced.
        slice: u32,
        /// Evaluator-supplied diagnostic text.
        message: String,
    },

    /// A three-channel request was made against a non-RGB stack.
    #[error("encoding mismatch: request needs {expected}, stack is {found}")]
    EncodingMismatch {
        /// Encoding the request requires.
        expected: &'static str,
        /// Encoding the target stack actually has.
        found: &'static str,
    },

    /// The active region contains no pixels.
    #[error("region is empty: {width}x{height}")]
    EmptyRegion {
        /// Region width in pixels.
        width: u32,
        /// Region height in pixels.
        height: u32,
    },

    /// The requested slice index is outside the stack.
    #[error("slice {slice} out of range (stack has {slices})")]
    SliceOutOfRange {
        /// Slice index requested.
        slice: u32,
        /// Number of slices in the stack.
        slices: u32,
    },
}

impl SynthesisError {
    /// Wrap an evaluator fault that surfaced while synthesizing `slice`.
    pub(crate) fn from_fault(fault: EvalFault, slice: u32) -> Self {
        match fault {
            EvalFault::Compile(message) => SynthesisError::Compile { message },
            EvalFault::Runtime(message) => SynthesisError::Runtime { slice, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_to_error_mapping() {
        let e = SynthesisError::from_fault(EvalFault::Compile("bad token".into()), 3);
        assert!(matches!(e, SynthesisError::Compile { .. }));

        let e = SynthesisError::from_fault(EvalFault::Runtime("div by zero".into()), 3);
        match e {
            SynthesisError::Runtime { slice, .. } => assert_eq!(slice, 3),
            other => panic!("expected Runtime, got {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let e = SynthesisError::EncodingMismatch {
            expected: "RGB24",
            found: "Gray8",
        };
        let text = e.to_string();
        assert!(text.contains("RGB24"));
        assert!(text.contains("Gray8"));
    }
}
