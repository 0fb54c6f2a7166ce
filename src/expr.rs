//! Expression evaluator boundary
//!
//! The engine never parses or executes expressions itself. It compiles a
//! fixed preamble plus the user expression(s) once per request through an
//! [`Evaluator`], then re-executes the compiled form per pixel from a pinned
//! entry offset with rebound variables. Everything the engine knows about a
//! program is token membership: which of the sixteen well-known identifiers
//! it mentions, and whether it calls `getPixel`.
//!
//! # Preamble
//!
//! ```text
//! var v,x,y,z,w,h,s,d,a,E;      (three-channel adds r,g,b after v)
//! function dummy() {}
//! <expression>;                  (three statements in three-channel mode)
//! ```
//!
//! The priming run executes declarations only; per-pixel runs start at the
//! first token after the no-op function, so rebinding a variable and
//! re-running evaluates just the user statements.

use bitflags::bitflags;

use crate::error::EvalFault;
use crate::types::ExpressionSet;

// ── Variables ────────────────────────────────────────────────

/// The well-known identifiers a program may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// Current pixel value (or whole packed RGB integer).
    V,
    /// Physical X coordinate.
    X,
    /// Physical Y coordinate.
    Y,
    /// Physical Z coordinate (slice axis).
    Z,
    /// Absolute X-domain extent.
    W,
    /// Absolute Y-domain extent.
    H,
    /// Absolute Z-domain extent.
    S,
    /// Distance from the domain origin.
    D,
    /// Angle around the domain origin, in `[0, 2π)`.
    A,
    /// Red channel in `[0, 255]` (three-channel mode).
    R,
    /// Green channel in `[0, 255]` (three-channel mode).
    G,
    /// Blue channel in `[0, 255]` (three-channel mode).
    B,
    /// Euler's number.
    E,
    /// Red result written by a three-channel program.
    RNew,
    /// Green result written by a three-channel program.
    GNew,
    /// Blue result written by a three-channel program.
    BNew,
}

impl Variable {
    /// Number of well-known identifiers.
    pub const COUNT: usize = 16;

    /// Every variable, in table order.
    pub const ALL: [Variable; Self::COUNT] = [
        Variable::V,
        Variable::X,
        Variable::Y,
        Variable::Z,
        Variable::W,
        Variable::H,
        Variable::S,
        Variable::D,
        Variable::A,
        Variable::R,
        Variable::G,
        Variable::B,
        Variable::E,
        Variable::RNew,
        Variable::GNew,
        Variable::BNew,
    ];

    /// Identifier text as it appears in program source.
    pub fn name(self) -> &'static str {
        match self {
            Variable::V => "v",
            Variable::X => "x",
            Variable::Y => "y",
            Variable::Z => "z",
            Variable::W => "w",
            Variable::H => "h",
            Variable::S => "s",
            Variable::D => "d",
            Variable::A => "a",
            Variable::R => "r",
            Variable::G => "g",
            Variable::B => "b",
            Variable::E => "E",
            Variable::RNew => "r_new",
            Variable::GNew => "g_new",
            Variable::BNew => "b_new",
        }
    }

    /// Stable index into a 16-slot variable table.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Which variables a request's program(s) reference, plus the
    /// `getPixel` marker that switches RGB stacks into packed-integer mode.
    ///
    /// Computed once per request; per-pixel binding work is gated on it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NeededVars: u32 {
        /// `x` appears in the program.
        const X = 1 << 0;
        /// `y` appears in the program.
        const Y = 1 << 1;
        /// `z` appears in the program.
        const Z = 1 << 2;
        /// `d` appears in the program.
        const D = 1 << 3;
        /// `a` appears in the program.
        const A = 1 << 4;
        /// `E` appears in the program.
        const E = 1 << 5;
        /// `getPixel` appears in the program.
        const GET_PIXEL = 1 << 6;
    }
}

impl NeededVars {
    /// Union the membership of every program in a request.
    pub fn from_programs<P: Program>(programs: &[P]) -> NeededVars {
        let mut needed = NeededVars::empty();
        for p in programs {
            if p.references(Variable::X.name()) {
                needed |= NeededVars::X;
            }
            if p.references(Variable::Y.name()) {
                needed |= NeededVars::Y;
            }
            if p.references(Variable::Z.name()) {
                needed |= NeededVars::Z;
            }
            if p.references(Variable::D.name()) {
                needed |= NeededVars::D;
            }
            if p.references(Variable::A.name()) {
                needed |= NeededVars::A;
            }
            if p.references(Variable::E.name()) {
                needed |= NeededVars::E;
            }
            if p.references("getPixel") {
                needed |= NeededVars::GET_PIXEL;
            }
        }
        needed
    }

    /// True when polar coordinates must be computed for each pixel.
    #[inline]
    pub fn wants_polar(self) -> bool {
        self.intersects(NeededVars::D | NeededVars::A)
    }
}

// ── Program Layout ───────────────────────────────────────────

/// Token layout of a compiled request: which preamble shape is in force and
/// where per-pixel execution re-enters.
///
/// The entry offset is derived from the declaration list, never hard-coded:
/// `var` is one token, each of the `n` names one, the `n - 1` commas one
/// each, the closing `;` one, and `function dummy ( ) { }` six more, so the
/// first user token sits at `2n + 7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLayout {
    per_channel: bool,
}

const SCALAR_DECLS: [Variable; 10] = [
    Variable::V,
    Variable::X,
    Variable::Y,
    Variable::Z,
    Variable::W,
    Variable::H,
    Variable::S,
    Variable::D,
    Variable::A,
    Variable::E,
];

const PER_CHANNEL_DECLS: [Variable; 13] = [
    Variable::V,
    Variable::R,
    Variable::G,
    Variable::B,
    Variable::X,
    Variable::Y,
    Variable::Z,
    Variable::W,
    Variable::H,
    Variable::S,
    Variable::D,
    Variable::A,
    Variable::E,
];

impl ProgramLayout {
    /// Layout for the given expression set.
    pub fn for_expressions(set: &ExpressionSet) -> Self {
        ProgramLayout {
            per_channel: set.is_per_channel(),
        }
    }

    /// Variables the preamble declares, in declaration order.
    ///
    /// `r_new`/`g_new`/`b_new` are not declared; a three-channel program
    /// creates them by assignment.
    pub fn declared(self) -> &'static [Variable] {
        if self.per_channel {
            &PER_CHANNEL_DECLS
        } else {
            &SCALAR_DECLS
        }
    }

    /// Token position of the first user statement.
    #[inline]
    pub fn entry_offset(self) -> u32 {
        (2 * self.declared().len() + 7) as u32
    }

    /// Render the full compilable source: preamble plus the user
    /// expression(s), each terminated by `;`.
    pub fn source_for(self, set: &ExpressionSet) -> String {
        let mut source = String::from("var ");
        for (i, var) in self.declared().iter().enumerate() {
            if i > 0 {
                source.push(',');
            }
            source.push_str(var.name());
        }
        source.push_str(";\nfunction dummy() {}\n");
        for expr in set.sources() {
            source.push_str(expr);
            source.push_str(";\n");
        }
        source
    }
}

// ── Evaluator Traits ─────────────────────────────────────────

/// A tokenized program, queryable for identifier membership.
pub trait Program {
    /// True when `ident` appears as a whole word anywhere in the source.
    fn references(&self, ident: &str) -> bool;
}

/// An expression evaluator the engine drives.
///
/// Contract: [`prepare`](Evaluator::prepare) compiles the rendered source
/// and runs it once (the priming pass, which executes declarations only).
/// Afterwards any number of [`bind`](Evaluator::bind) /
/// [`run_from`](Evaluator::run_from) / [`read`](Evaluator::read) cycles
/// re-execute the user statements from the layout's entry offset. A runtime
/// fault is sticky: [`faulted`](Evaluator::faulted) stays set until the next
/// `prepare`.
pub trait Evaluator {
    /// Tokenized-program handle for membership queries.
    type Prog: Program;

    /// Tokenize `source` without compiling or mutating evaluator state.
    fn scan(&self, source: &str) -> Self::Prog;

    /// Compile `source` (preamble + expressions) and run the priming pass.
    fn prepare(&mut self, source: &str, layout: ProgramLayout) -> Result<(), EvalFault>;

    /// Bind a variable's value for subsequent executions.
    fn bind(&mut self, var: Variable, value: f64);

    /// Execute the prepared program from `entry` (a layout entry offset).
    fn run_from(&mut self, entry: u32) -> Result<(), EvalFault>;

    /// Read a variable after an execution.
    fn read(&self, var: Variable) -> f64;

    /// True once any execution since the last `prepare` has faulted.
    fn faulted(&self) -> bool;
}
