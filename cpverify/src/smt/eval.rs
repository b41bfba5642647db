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

//! # Partial evaluation
//!
//! Three-valued evaluation of terms under a (partial) assignment of variables. A term evaluates to
//! `None` if its value depends on an unassigned variable.

use super::expr::{BoolExpr, Context, IntExpr, Term};
use std::collections::BTreeMap;

/// Assignment of values to variables
pub trait Assignment {
    /// Value of a boolean variable, if assigned
    fn bool_value(&self, name: &str) -> Option<bool>;
    /// Value of an integer variable, if assigned
    fn int_value(&self, name: &str) -> Option<i64>;
}

/// Assignment built by hand, mostly used for testing the encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAssignment {
    bools: BTreeMap<String, bool>,
    ints: BTreeMap<String, i64>,
}

impl PartialAssignment {
    /// Empty assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a boolean variable. Terms that are not variables are ignored.
    pub fn set_bool(&mut self, var: &BoolExpr, value: bool) -> &mut Self {
        if let Some(v) = var.as_var() {
            self.bools.insert(v.name().to_string(), value);
        }
        self
    }

    /// Assign an integer variable. Terms that are not variables are ignored.
    pub fn set_int(&mut self, var: &IntExpr, value: i64) -> &mut Self {
        if let Some(v) = var.as_var() {
            self.ints.insert(v.name().to_string(), value);
        }
        self
    }

    /// Extend the assignment with every value forced by the constraints of `ctx`. A constraint
    /// forces a value if it asserts a variable, or if it equates an unassigned variable with a term
    /// that already evaluates. Conjunctions, implications and conditionals are followed as soon as
    /// their premise evaluates. Repeats until no constraint assigns anything new.
    pub fn propagate(&mut self, ctx: &Context) -> &mut Self {
        loop {
            let before = self.bools.len() + self.ints.len();
            for c in ctx.constraints() {
                self.assume(c);
            }
            if self.bools.len() + self.ints.len() == before {
                return self;
            }
        }
    }

    /// Assign what follows from `fact` being true.
    fn assume(&mut self, fact: &BoolExpr) {
        match fact.term() {
            Term::Var(v) => {
                self.bools.entry(v.name().to_string()).or_insert(true);
            }
            Term::Not(x) => {
                if let Some(v) = x.as_var() {
                    self.bools.entry(v.name().to_string()).or_insert(false);
                }
            }
            Term::And(xs) => xs.iter().for_each(|x| self.assume(x)),
            Term::Implies(x, y) => {
                if x.eval(&*self) == Some(true) {
                    self.assume(y);
                }
            }
            Term::IteBool(c, t, e) => match c.eval(&*self) {
                Some(true) => self.assume(t),
                Some(false) => self.assume(e),
                None => {}
            },
            Term::Iff(x, y) => match (x.eval(&*self), y.eval(&*self)) {
                (None, Some(b)) => {
                    self.set_bool(x, b);
                }
                (Some(b), None) => {
                    self.set_bool(y, b);
                }
                _ => {}
            },
            Term::Eq(x, y) => match (x.eval(&*self), y.eval(&*self)) {
                (None, Some(i)) => {
                    self.set_int(x, i);
                }
                (Some(i), None) => {
                    self.set_int(y, i);
                }
                _ => {}
            },
            _ => {}
        }
    }
}

impl Assignment for PartialAssignment {
    fn bool_value(&self, name: &str) -> Option<bool> {
        self.bools.get(name).copied()
    }

    fn int_value(&self, name: &str) -> Option<i64> {
        self.ints.get(name).copied()
    }
}

impl BoolExpr {
    /// Evaluate the term. Returns `None` if the value is not determined by the assignment.
    pub fn eval(&self, a: &dyn Assignment) -> Option<bool> {
        match self.term() {
            Term::Bool(b) => Some(*b),
            Term::Var(v) => a.bool_value(v.name()),
            Term::Not(x) => x.eval(a).map(|b| !b),
            Term::And(xs) => {
                let mut all_known = true;
                for x in xs {
                    match x.eval(a) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => all_known = false,
                    }
                }
                if all_known {
                    Some(true)
                } else {
                    None
                }
            }
            Term::Or(xs) => {
                let mut all_known = true;
                for x in xs {
                    match x.eval(a) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => all_known = false,
                    }
                }
                if all_known {
                    Some(false)
                } else {
                    None
                }
            }
            Term::Implies(x, y) => match (x.eval(a), y.eval(a)) {
                (Some(false), _) | (_, Some(true)) => Some(true),
                (Some(true), Some(false)) => Some(false),
                _ => None,
            },
            Term::Iff(x, y) => Some(x.eval(a)? == y.eval(a)?),
            Term::IteBool(c, t, e) => match c.eval(a) {
                Some(true) => t.eval(a),
                Some(false) => e.eval(a),
                None => match (t.eval(a), e.eval(a)) {
                    (Some(x), Some(y)) if x == y => Some(x),
                    _ => None,
                },
            },
            Term::Eq(x, y) => Some(x.eval(a)? == y.eval(a)?),
            Term::Le(x, y) => Some(x.eval(a)? <= y.eval(a)?),
            Term::Lt(x, y) => Some(x.eval(a)? < y.eval(a)?),
            Term::Int(_) | Term::Add(..) | Term::Sub(..) | Term::IteInt(..) => None,
        }
    }
}

impl IntExpr {
    /// Evaluate the term. Returns `None` if the value is not determined by the assignment.
    pub fn eval(&self, a: &dyn Assignment) -> Option<i64> {
        match self.term() {
            Term::Int(x) => Some(*x),
            Term::Var(v) => a.int_value(v.name()),
            Term::Add(x, y) => Some(x.eval(a)? + y.eval(a)?),
            Term::Sub(x, y) => Some(x.eval(a)? - y.eval(a)?),
            Term::IteInt(c, t, e) => match c.eval(a) {
                Some(true) => t.eval(a),
                Some(false) => e.eval(a),
                None => match (t.eval(a), e.eval(a)) {
                    (Some(x), Some(y)) if x == y => Some(x),
                    _ => None,
                },
            },
            _ => None,
        }
    }
}
