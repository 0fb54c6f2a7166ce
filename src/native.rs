//! Closure-backed evaluator for Rust-native hosts
//!
//! [`NativeEvaluator`] implements the [`Evaluator`] boundary without an
//! expression language: the host supplies the per-execution semantics as a
//! Rust closure over a [`VarTable`], and optionally a compiler closure that
//! builds that body from the rendered source at prepare time. The engine
//! drives it exactly like an external interpreter, so the same synthesis
//! code serves scripted hosts and pure-Rust hosts.
//!
//! Identifier membership is answered by a word scanner over the expression
//! text. It is membership-grade tokenization, not a parser: runs of
//! `[A-Za-z0-9_]` are words, everything else separates them.

use std::collections::HashSet;

use crate::error::EvalFault;
use crate::expr::{Evaluator, Program, ProgramLayout, Variable};

// ── Variable Table ───────────────────────────────────────────

/// Working storage for the sixteen well-known variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarTable {
    slots: [f64; Variable::COUNT],
}

impl VarTable {
    /// Read a variable.
    #[inline]
    pub fn get(&self, var: Variable) -> f64 {
        self.slots[var.index()]
    }

    /// Write a variable.
    #[inline]
    pub fn set(&mut self, var: Variable, value: f64) {
        self.slots[var.index()] = value;
    }

    /// Zero every slot (the priming pass).
    pub fn reset(&mut self) {
        self.slots = [0.0; Variable::COUNT];
    }
}

// ── Token Scanner ────────────────────────────────────────────

/// A scanned program: the set of words appearing in its source.
#[derive(Debug, Clone)]
pub struct TokenProgram {
    words: HashSet<String>,
}

impl TokenProgram {
    /// Scan `source` into its word set.
    pub fn scan(source: &str) -> Self {
        let mut words = HashSet::new();
        let mut current = String::new();
        for ch in source.chars() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                current.push(ch);
            } else if !current.is_empty() {
                words.insert(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            words.insert(current);
        }
        TokenProgram { words }
    }
}

impl Program for TokenProgram {
    fn references(&self, ident: &str) -> bool {
        self.words.contains(ident)
    }
}

// ── Native Evaluator ─────────────────────────────────────────

/// Executable body: one per-pixel run over the variable table.
pub type NativeBody = Box<dyn FnMut(&mut VarTable) -> Result<(), EvalFault>>;

/// Compiler hook: builds a body from the rendered source.
pub type NativeCompiler = Box<dyn FnMut(&str, ProgramLayout) -> Result<NativeBody, EvalFault>>;

/// [`Evaluator`] implementation backed by Rust closures.
pub struct NativeEvaluator {
    vars: VarTable,
    compiler: Option<NativeCompiler>,
    body: Option<NativeBody>,
    entry: Option<u32>,
    faulted: bool,
}

impl NativeEvaluator {
    /// Evaluator with a fixed body, independent of the prepared source.
    pub fn new<F>(body: F) -> Self
    where
        F: FnMut(&mut VarTable) -> Result<(), EvalFault> + 'static,
    {
        NativeEvaluator {
            vars: VarTable::default(),
            compiler: None,
            body: Some(Box::new(body)),
            entry: None,
            faulted: false,
        }
    }

    /// Evaluator whose body is built from the rendered source at
    /// [`prepare`](Evaluator::prepare) time. Lets a host hook a real
    /// expression compiler behind the boundary.
    pub fn with_compiler<F>(compiler: F) -> Self
    where
        F: FnMut(&str, ProgramLayout) -> Result<NativeBody, EvalFault> + 'static,
    {
        NativeEvaluator {
            vars: VarTable::default(),
            compiler: Some(Box::new(compiler)),
            body: None,
            entry: None,
            faulted: false,
        }
    }

    /// Scalar convenience: the body computes `v` from the table.
    pub fn scalar<F>(mut f: F) -> Self
    where
        F: FnMut(&VarTable) -> f64 + 'static,
    {
        Self::new(move |vars| {
            let v = f(vars);
            vars.set(Variable::V, v);
            Ok(())
        })
    }

    /// Three-channel convenience: the body computes `(r_new, g_new, b_new)`
    /// from the table.
    pub fn per_channel<F>(mut f: F) -> Self
    where
        F: FnMut(&VarTable) -> (f64, f64, f64) + 'static,
    {
        Self::new(move |vars| {
            let (r, g, b) = f(vars);
            vars.set(Variable::RNew, r);
            vars.set(Variable::GNew, g);
            vars.set(Variable::BNew, b);
            Ok(())
        })
    }
}

impl Evaluator for NativeEvaluator {
    type Prog = TokenProgram;

    fn scan(&self, source: &str) -> TokenProgram {
        TokenProgram::scan(source)
    }

    fn prepare(&mut self, source: &str, layout: ProgramLayout) -> Result<(), EvalFault> {
        if let Some(compiler) = self.compiler.as_mut() {
            self.body = Some(compiler(source, layout)?);
        }
        self.vars.reset();
        self.entry = Some(layout.entry_offset());
        self.faulted = false;
        Ok(())
    }

    fn bind(&mut self, var: Variable, value: f64) {
        self.vars.set(var, value);
    }

    fn run_from(&mut self, entry: u32) -> Result<(), EvalFault> {
        if self.entry != Some(entry) {
            self.faulted = true;
            return Err(EvalFault::Runtime(format!(
                "entry {entry} does not match prepared layout"
            )));
        }
        let body = self.body.as_mut().ok_or_else(|| {
            EvalFault::Runtime("run before prepare".to_string())
        })?;
        match body(&mut self.vars) {
            Ok(()) => Ok(()),
            Err(fault) => {
                self.faulted = true;
                Err(fault)
            }
        }
    }

    fn read(&self, var: Variable) -> f64 {
        self.vars.get(var)
    }

    fn faulted(&self) -> bool {
        self.faulted
    }
}
