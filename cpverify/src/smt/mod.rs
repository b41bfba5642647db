// CpVerify: Symbolic Control-Plane Verification
// Copyright (C) 2026  The CpVerify Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Smt
//!
//! Solver independent term language used by the encoder, and the interface to the solver.
//!
//! The encoder builds [`BoolExpr`] and [`IntExpr`] terms, creates variables through a [`Context`]
//! and asserts constraints on it. A [`SolverBackend`] then takes the context, asserts every
//! constraint on a fresh [`Solver`], checks satisfiability and reads back the [`Model`].
//!
//! Only booleans and mathematical integers are used. IP addresses are integers in `[0, 2^32)`,
//! and prefix matching is expressed as a range check on the destination address.

mod eval;
mod expr;
#[cfg(feature = "z3")]
mod z3_backend;

pub use eval::{Assignment, PartialAssignment};
pub use expr::{BoolExpr, Context, IntExpr, Sort, Var};
#[cfg(feature = "z3")]
pub use z3_backend::Z3Backend;

use log::*;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Solver Error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SolverError {
    /// A term cannot be translated for the backend
    #[error("Cannot translate term: {0}")]
    Translation(String),
    /// The solver reported SAT, but no model is available
    #[error("The solver reported SAT, but returned no model")]
    NoModel,
    /// Error reported by the backend itself
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result of a satisfiability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    /// Satisfiable
    Sat,
    /// Unsatisfiable
    Unsat,
    /// The solver gave up (timeout or incompleteness)
    Unknown,
}

/// Values of the variables in a satisfying assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    bools: BTreeMap<String, bool>,
    ints: BTreeMap<String, i64>,
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the value of a boolean variable
    pub fn insert_bool(&mut self, name: impl Into<String>, value: bool) {
        self.bools.insert(name.into(), value);
    }

    /// Store the value of an integer variable
    pub fn insert_int(&mut self, name: impl Into<String>, value: i64) {
        self.ints.insert(name.into(), value);
    }

    /// Evaluate a boolean term in the model. Variables that are not part of the model are treated
    /// as unknown.
    pub fn eval_bool(&self, e: &BoolExpr) -> Option<bool> {
        e.eval(self)
    }

    /// Evaluate an integer term in the model.
    pub fn eval_int(&self, e: &IntExpr) -> Option<i64> {
        e.eval(self)
    }

    /// Number of assigned variables
    pub fn len(&self) -> usize {
        self.bools.len() + self.ints.len()
    }

    /// Returns `true` if no variable is assigned
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Assignment for Model {
    fn bool_value(&self, name: &str) -> Option<bool> {
        self.bools.get(name).copied()
    }

    fn int_value(&self, name: &str) -> Option<i64> {
        self.ints.get(name).copied()
    }
}

/// Outcome of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutput {
    /// The constraints are satisfiable, with the given model
    Sat(Model),
    /// The constraints are unsatisfiable
    Unsat,
    /// The solver could not decide, with the reason
    Unknown(String),
}

/// A single solver instance
pub trait Solver {
    /// Assert a constraint
    fn assert(&mut self, constraint: &BoolExpr) -> Result<(), SolverError>;
    /// Check the satisfiability of all asserted constraints
    fn check(&mut self) -> Result<SatResult, SolverError>;
    /// Read the values of the variables after a `Sat` answer
    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError>;
    /// Explanation of the last `Unknown` answer
    fn reason_unknown(&self) -> String {
        String::from("unknown")
    }
}

/// Assert all constraints of the context on the solver, check them and extract the model.
pub fn run_solver(solver: &mut dyn Solver, ctx: &Context) -> Result<SolverOutput, SolverError> {
    for c in ctx.constraints() {
        solver.assert(c)?;
    }
    debug!(
        "Checking {} constraints over {} variables",
        ctx.num_constraints(),
        ctx.num_variables()
    );
    Ok(match solver.check()? {
        SatResult::Sat => SolverOutput::Sat(solver.model(ctx.variables())?),
        SatResult::Unsat => SolverOutput::Unsat,
        SatResult::Unknown => SolverOutput::Unknown(solver.reason_unknown()),
    })
}

/// Factory of solvers. Backends are shared between threads, every query creates its own solver.
pub trait SolverBackend: Sync {
    /// Name of the backend
    fn name(&self) -> &'static str;

    /// Decide the constraints of the context.
    fn solve(&self, ctx: &Context, timeout: Option<Duration>) -> Result<SolverOutput, SolverError>;
}

/// Fallback backend when compiled without the feature `z3`. Every query is reported as unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSolverBackend;

impl NoSolverBackend {
    /// Create the fallback backend
    pub fn new() -> Self {
        Self
    }
}

/// Solver of the [`NoSolverBackend`]. Accepts all constraints and decides nothing.
#[derive(Debug, Default)]
struct NoSolver {
    num_asserted: usize,
}

impl Solver for NoSolver {
    fn assert(&mut self, _constraint: &BoolExpr) -> Result<(), SolverError> {
        self.num_asserted += 1;
        Ok(())
    }

    fn check(&mut self) -> Result<SatResult, SolverError> {
        Ok(SatResult::Unknown)
    }

    fn model(&mut self, _vars: &[Var]) -> Result<Model, SolverError> {
        Err(SolverError::NoModel)
    }

    fn reason_unknown(&self) -> String {
        format!(
            "No solver backend enabled ({} constraints not checked). Rebuild with `--features z3`.",
            self.num_asserted
        )
    }
}

impl SolverBackend for NoSolverBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn solve(&self, ctx: &Context, _timeout: Option<Duration>) -> Result<SolverOutput, SolverError> {
        run_solver(&mut NoSolver::default(), ctx)
    }
}
