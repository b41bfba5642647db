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

//! # Terms
//!
//! Boolean and integer terms. Terms are immutable, reference counted trees. All constructors fold
//! constants, such that unused branches of the encoding disappear before reaching the solver.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use log::*;

/// Sort of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    /// Boolean
    Bool,
    /// Mathematical integer
    Int,
}

/// Named solver variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var {
    name: Rc<str>,
    sort: Sort,
}

impl Var {
    /// Name of the variable, unique within a [`Context`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sort of the variable
    pub fn sort(&self) -> Sort {
        self.sort
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) enum Term {
    Bool(bool),
    Int(i64),
    Var(Var),
    Not(BoolExpr),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Implies(BoolExpr, BoolExpr),
    Iff(BoolExpr, BoolExpr),
    IteBool(BoolExpr, BoolExpr, BoolExpr),
    Eq(IntExpr, IntExpr),
    Le(IntExpr, IntExpr),
    Lt(IntExpr, IntExpr),
    Add(IntExpr, IntExpr),
    Sub(IntExpr, IntExpr),
    IteInt(BoolExpr, IntExpr, IntExpr),
}

/// Boolean term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoolExpr(Rc<Term>);

/// Integer term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntExpr(Rc<Term>);

impl BoolExpr {
    fn new(t: Term) -> Self {
        Self(Rc::new(t))
    }

    pub(crate) fn term(&self) -> &Term {
        &self.0
    }

    pub(crate) fn id(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// Boolean constant
    pub fn constant(b: bool) -> Self {
        Self::new(Term::Bool(b))
    }

    /// Constant `true`
    pub fn tt() -> Self {
        Self::constant(true)
    }

    /// Constant `false`
    pub fn ff() -> Self {
        Self::constant(false)
    }

    /// Returns the value if the term is a constant
    pub fn as_const(&self) -> Option<bool> {
        match self.term() {
            Term::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns `true` if the term is the constant `true`
    pub fn is_true(&self) -> bool {
        self.as_const() == Some(true)
    }

    /// Returns `true` if the term is the constant `false`
    pub fn is_false(&self) -> bool {
        self.as_const() == Some(false)
    }

    /// Returns the variable if the term is a single variable
    pub fn as_var(&self) -> Option<&Var> {
        match self.term() {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Cheap syntactic equality: the same node, or the same constant.
    pub fn same(&self, other: &BoolExpr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || matches!((self.as_const(), other.as_const()), (Some(a), Some(b)) if a == b)
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        match self.term() {
            Term::Bool(b) => Self::constant(!b),
            Term::Not(x) => x.clone(),
            _ => Self::new(Term::Not(self.clone())),
        }
    }

    /// Conjunction of two terms
    pub fn and(&self, other: &BoolExpr) -> Self {
        Self::and_all(vec![self.clone(), other.clone()])
    }

    /// Conjunction of all terms. The empty conjunction is `true`.
    pub fn and_all<I: IntoIterator<Item = BoolExpr>>(iter: I) -> Self {
        let mut args: Vec<BoolExpr> = Vec::new();
        for e in iter {
            match e.term() {
                Term::Bool(true) => {}
                Term::Bool(false) => return Self::ff(),
                Term::And(xs) => args.extend(xs.iter().cloned()),
                _ => args.push(e),
            }
        }
        match args.len() {
            0 => Self::tt(),
            1 => args.swap_remove(0),
            _ => Self::new(Term::And(args)),
        }
    }

    /// Disjunction of two terms
    pub fn or(&self, other: &BoolExpr) -> Self {
        Self::or_all(vec![self.clone(), other.clone()])
    }

    /// Disjunction of all terms. The empty disjunction is `false`.
    pub fn or_all<I: IntoIterator<Item = BoolExpr>>(iter: I) -> Self {
        let mut args: Vec<BoolExpr> = Vec::new();
        for e in iter {
            match e.term() {
                Term::Bool(false) => {}
                Term::Bool(true) => return Self::tt(),
                Term::Or(xs) => args.extend(xs.iter().cloned()),
                _ => args.push(e),
            }
        }
        match args.len() {
            0 => Self::ff(),
            1 => args.swap_remove(0),
            _ => Self::new(Term::Or(args)),
        }
    }

    /// Implication `self => other`
    pub fn implies(&self, other: &BoolExpr) -> Self {
        match (self.as_const(), other.as_const()) {
            (Some(false), _) | (_, Some(true)) => Self::tt(),
            (Some(true), _) => other.clone(),
            (_, Some(false)) => self.not(),
            _ => Self::new(Term::Implies(self.clone(), other.clone())),
        }
    }

    /// Equivalence `self <=> other`
    pub fn iff(&self, other: &BoolExpr) -> Self {
        if self.same(other) {
            return Self::tt();
        }
        match (self.as_const(), other.as_const()) {
            (Some(a), Some(b)) => Self::constant(a == b),
            (Some(true), None) => other.clone(),
            (Some(false), None) => other.not(),
            (None, Some(true)) => self.clone(),
            (None, Some(false)) => self.not(),
            (None, None) => Self::new(Term::Iff(self.clone(), other.clone())),
        }
    }

    /// Boolean if-then-else, using `self` as condition
    pub fn ite(&self, t: &BoolExpr, e: &BoolExpr) -> BoolExpr {
        match self.as_const() {
            Some(true) => return t.clone(),
            Some(false) => return e.clone(),
            None => {}
        }
        if t.same(e) {
            return t.clone();
        }
        match (t.as_const(), e.as_const()) {
            (Some(true), Some(false)) => self.clone(),
            (Some(false), Some(true)) => self.not(),
            (Some(b), Some(_)) => Self::constant(b),
            (Some(true), None) => self.or(e),
            (Some(false), None) => self.not().and(e),
            (None, Some(true)) => self.not().or(t),
            (None, Some(false)) => self.and(t),
            (None, None) => Self::new(Term::IteBool(self.clone(), t.clone(), e.clone())),
        }
    }

    /// Integer if-then-else, using `self` as condition
    pub fn ite_int(&self, t: &IntExpr, e: &IntExpr) -> IntExpr {
        match self.as_const() {
            Some(true) => t.clone(),
            Some(false) => e.clone(),
            None if t.same(e) => t.clone(),
            None => IntExpr::new(Term::IteInt(self.clone(), t.clone(), e.clone())),
        }
    }
}

impl IntExpr {
    fn new(t: Term) -> Self {
        Self(Rc::new(t))
    }

    pub(crate) fn term(&self) -> &Term {
        &self.0
    }

    pub(crate) fn id(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// Integer constant
    pub fn constant(x: i64) -> Self {
        Self::new(Term::Int(x))
    }

    /// Returns the value if the term is a constant
    pub fn as_const(&self) -> Option<i64> {
        match self.term() {
            Term::Int(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the variable if the term is a single variable
    pub fn as_var(&self) -> Option<&Var> {
        match self.term() {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Cheap syntactic equality: the same node, or the same constant.
    pub fn same(&self, other: &IntExpr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || matches!((self.as_const(), other.as_const()), (Some(a), Some(b)) if a == b)
    }

    /// Sum of two terms
    pub fn add(&self, other: &IntExpr) -> IntExpr {
        match (self.as_const(), other.as_const()) {
            (Some(a), Some(b)) => Self::constant(a + b),
            (Some(0), None) => other.clone(),
            (None, Some(0)) => self.clone(),
            _ => Self::new(Term::Add(self.clone(), other.clone())),
        }
    }

    /// Add a constant
    pub fn add_const(&self, x: i64) -> IntExpr {
        self.add(&Self::constant(x))
    }

    /// Difference of two terms
    pub fn sub(&self, other: &IntExpr) -> IntExpr {
        match (self.as_const(), other.as_const()) {
            (Some(a), Some(b)) => Self::constant(a - b),
            (None, Some(0)) => self.clone(),
            _ => Self::new(Term::Sub(self.clone(), other.clone())),
        }
    }

    /// Equality `self == other`
    pub fn equals(&self, other: &IntExpr) -> BoolExpr {
        if self.same(other) {
            return BoolExpr::tt();
        }
        match (self.as_const(), other.as_const()) {
            (Some(a), Some(b)) => BoolExpr::constant(a == b),
            _ => BoolExpr::new(Term::Eq(self.clone(), other.clone())),
        }
    }

    /// `self <= other`
    pub fn le(&self, other: &IntExpr) -> BoolExpr {
        if self.same(other) {
            return BoolExpr::tt();
        }
        match (self.as_const(), other.as_const()) {
            (Some(a), Some(b)) => BoolExpr::constant(a <= b),
            _ => BoolExpr::new(Term::Le(self.clone(), other.clone())),
        }
    }

    /// `self < other`
    pub fn lt(&self, other: &IntExpr) -> BoolExpr {
        if self.same(other) {
            return BoolExpr::ff();
        }
        match (self.as_const(), other.as_const()) {
            (Some(a), Some(b)) => BoolExpr::constant(a < b),
            _ => BoolExpr::new(Term::Lt(self.clone(), other.clone())),
        }
    }

    /// `self >= other`
    pub fn ge(&self, other: &IntExpr) -> BoolExpr {
        other.le(self)
    }

    /// `self > other`
    pub fn gt(&self, other: &IntExpr) -> BoolExpr {
        other.lt(self)
    }

    /// `lo <= self <= hi`
    pub fn in_range(&self, lo: i64, hi: i64) -> BoolExpr {
        Self::constant(lo).le(self).and(&self.le(&Self::constant(hi)))
    }
}

/// # Context
/// Factory for variables, and the list of asserted constraints. Variable names are unique: asking
/// for a name that exists already yields a new variable with a numeric suffix.
#[derive(Debug, Default)]
pub struct Context {
    vars: Vec<Var>,
    names: HashSet<Rc<str>>,
    constraints: Vec<BoolExpr>,
    print_constraints: bool,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// If enabled, every added constraint is logged at debug level.
    pub fn set_print_constraints(&mut self, print: bool) {
        self.print_constraints = print;
    }

    fn fresh(&mut self, name: &str, sort: Sort) -> Var {
        let mut candidate: Rc<str> = Rc::from(name);
        let mut k = 1;
        while self.names.contains(&candidate) {
            candidate = Rc::from(format!("{}_{}", name, k).as_str());
            k += 1;
        }
        self.names.insert(candidate.clone());
        let var = Var { name: candidate, sort };
        self.vars.push(var.clone());
        var
    }

    /// Create a new boolean variable
    pub fn bool_var(&mut self, name: &str) -> BoolExpr {
        BoolExpr::new(Term::Var(self.fresh(name, Sort::Bool)))
    }

    /// Create a new integer variable
    pub fn int_var(&mut self, name: &str) -> IntExpr {
        IntExpr::new(Term::Var(self.fresh(name, Sort::Int)))
    }

    /// Assert a constraint. Constraints that fold to `true` are dropped.
    pub fn add(&mut self, c: BoolExpr) {
        if c.is_true() {
            return;
        }
        if c.is_false() {
            debug!("Asserting a constraint that is trivially false");
        }
        if self.print_constraints {
            debug!("(assert {})", c);
        }
        self.constraints.push(c);
    }

    /// All variables, in order of creation
    pub fn variables(&self) -> &[Var] {
        &self.vars
    }

    /// All asserted constraints, in order of assertion
    pub fn constraints(&self) -> &[BoolExpr] {
        &self.constraints
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.vars.len()
    }

    /// Number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, op: &str, xs: &[T]) -> fmt::Result {
    write!(f, "({}", op)?;
    for x in xs {
        write!(f, " {}", x)?;
    }
    write!(f, ")")
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Bool(b) => write!(f, "{}", b),
            Term::Int(x) if *x < 0 => write!(f, "(- {})", -x),
            Term::Int(x) => write!(f, "{}", x),
            Term::Var(v) => write!(f, "|{}|", v.name),
            Term::Not(a) => write!(f, "(not {})", a),
            Term::And(xs) => write_list(f, "and", xs),
            Term::Or(xs) => write_list(f, "or", xs),
            Term::Implies(a, b) => write!(f, "(=> {} {})", a, b),
            Term::Iff(a, b) => write!(f, "(= {} {})", a, b),
            Term::IteBool(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
            Term::Eq(a, b) => write!(f, "(= {} {})", a, b),
            Term::Le(a, b) => write!(f, "(<= {} {})", a, b),
            Term::Lt(a, b) => write!(f, "(< {} {})", a, b),
            Term::Add(a, b) => write!(f, "(+ {} {})", a, b),
            Term::Sub(a, b) => write!(f, "(- {} {})", a, b),
            Term::IteInt(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.term().fmt(f)
    }
}

impl fmt::Display for IntExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.term().fmt(f)
    }
}
