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

//! # Z3 backend
//!
//! Translates terms into Z3 ASTs. Shared sub-terms are translated only once.

use super::expr::{BoolExpr, IntExpr, Term};
use super::{run_solver, Context, Model, SatResult, Solver, SolverBackend, SolverError, SolverOutput};
use super::{Sort, Var};

use log::*;
use std::collections::HashMap;
use std::time::Duration;
use z3::ast::{Ast, Bool, Int};

/// Backend using the Z3 SMT solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct Z3Backend;

impl Z3Backend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for Z3Backend {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn solve(&self, ctx: &Context, timeout: Option<Duration>) -> Result<SolverOutput, SolverError> {
        let mut cfg = z3::Config::new();
        cfg.set_model_generation(true);
        let z3_ctx = z3::Context::new(&cfg);
        let solver = z3::Solver::new(&z3_ctx);
        let mut params = z3::Params::new(&z3_ctx);
        // deterministic answers across runs
        params.set_u32("smt.random_seed", 0);
        params.set_u32("sat.random_seed", 0);
        if let Some(t) = timeout {
            params.set_u32("timeout", t.as_millis().min(u32::MAX as u128) as u32);
        }
        solver.set_params(&params);
        let mut session = Z3Solver { ctx: &z3_ctx, solver, bools: HashMap::new(), ints: HashMap::new() };
        run_solver(&mut session, ctx)
    }
}

struct Z3Solver<'ctx> {
    ctx: &'ctx z3::Context,
    solver: z3::Solver<'ctx>,
    bools: HashMap<*const (), Bool<'ctx>>,
    ints: HashMap<*const (), Int<'ctx>>,
}

impl<'ctx> Z3Solver<'ctx> {
    fn bool(&mut self, e: &BoolExpr) -> Result<Bool<'ctx>, SolverError> {
        if let Some(b) = self.bools.get(&e.id()) {
            return Ok(b.clone());
        }
        let ctx = self.ctx;
        let result = match e.term() {
            Term::Bool(b) => Bool::from_bool(ctx, *b),
            Term::Var(v) => Bool::new_const(ctx, v.name().to_string()),
            Term::Not(x) => self.bool(x)?.not(),
            Term::And(xs) => {
                let xs = xs.iter().map(|x| self.bool(x)).collect::<Result<Vec<_>, _>>()?;
                Bool::and(ctx, &xs.iter().collect::<Vec<_>>())
            }
            Term::Or(xs) => {
                let xs = xs.iter().map(|x| self.bool(x)).collect::<Result<Vec<_>, _>>()?;
                Bool::or(ctx, &xs.iter().collect::<Vec<_>>())
            }
            Term::Implies(a, b) => self.bool(a)?.implies(&self.bool(b)?),
            Term::Iff(a, b) => self.bool(a)?.iff(&self.bool(b)?),
            Term::IteBool(c, t, f) => self.bool(c)?.ite(&self.bool(t)?, &self.bool(f)?),
            Term::Eq(a, b) => self.int(a)?._eq(&self.int(b)?),
            Term::Le(a, b) => self.int(a)?.le(&self.int(b)?),
            Term::Lt(a, b) => self.int(a)?.lt(&self.int(b)?),
            Term::Int(_) | Term::Add(..) | Term::Sub(..) | Term::IteInt(..) => {
                return Err(SolverError::Translation(format!("{} is not a boolean", e)))
            }
        };
        self.bools.insert(e.id(), result.clone());
        Ok(result)
    }

    fn int(&mut self, e: &IntExpr) -> Result<Int<'ctx>, SolverError> {
        if let Some(i) = self.ints.get(&e.id()) {
            return Ok(i.clone());
        }
        let ctx = self.ctx;
        let result = match e.term() {
            Term::Int(x) => Int::from_i64(ctx, *x),
            Term::Var(v) => Int::new_const(ctx, v.name().to_string()),
            Term::Add(a, b) => {
                let (a, b) = (self.int(a)?, self.int(b)?);
                Int::add(ctx, &[&a, &b])
            }
            Term::Sub(a, b) => {
                let (a, b) = (self.int(a)?, self.int(b)?);
                Int::sub(ctx, &[&a, &b])
            }
            Term::IteInt(c, t, f) => self.bool(c)?.ite(&self.int(t)?, &self.int(f)?),
            _ => return Err(SolverError::Translation(format!("{} is not an integer", e))),
        };
        self.ints.insert(e.id(), result.clone());
        Ok(result)
    }
}

impl<'ctx> Solver for Z3Solver<'ctx> {
    fn assert(&mut self, constraint: &BoolExpr) -> Result<(), SolverError> {
        let c = self.bool(constraint)?;
        self.solver.assert(&c);
        Ok(())
    }

    fn check(&mut self) -> Result<SatResult, SolverError> {
        Ok(match self.solver.check() {
            z3::SatResult::Sat => SatResult::Sat,
            z3::SatResult::Unsat => SatResult::Unsat,
            z3::SatResult::Unknown => SatResult::Unknown,
        })
    }

    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError> {
        let z3_model = self.solver.get_model().ok_or(SolverError::NoModel)?;
        let mut model = Model::new();
        for v in vars {
            match v.sort() {
                Sort::Bool => {
                    let x = Bool::new_const(self.ctx, v.name().to_string());
                    if let Some(b) = z3_model.eval(&x, true).and_then(|b| b.as_bool()) {
                        model.insert_bool(v.name(), b);
                    }
                }
                Sort::Int => {
                    let x = Int::new_const(self.ctx, v.name().to_string());
                    match z3_model.eval(&x, true).and_then(|i| i.as_i64()) {
                        Some(i) => model.insert_int(v.name(), i),
                        None => warn!("Cannot read the value of {} from the model", v.name()),
                    }
                }
            }
        }
        Ok(model)
    }

    fn reason_unknown(&self) -> String {
        self.solver.get_reason_unknown().unwrap_or_else(|| String::from("unknown"))
    }
}
