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

use crate::smt::*;

#[test]
fn constant_folding() {
    let mut ctx = Context::new();
    let a = ctx.bool_var("a");
    let x = ctx.int_var("x");

    assert!(a.and(&BoolExpr::ff()).is_false());
    assert!(a.or(&BoolExpr::tt()).is_true());
    assert!(a.and(&BoolExpr::tt()).same(&a));
    assert!(a.not().not().same(&a));
    assert!(BoolExpr::ff().implies(&a).is_true());
    assert!(a.implies(&BoolExpr::tt()).is_true());
    assert!(a.iff(&a).is_true());
    assert!(BoolExpr::and_all(vec![]).is_true());
    assert!(BoolExpr::or_all(vec![]).is_false());
    assert!(BoolExpr::tt().ite(&a, &BoolExpr::ff()).same(&a));
    assert!(a.ite(&BoolExpr::tt(), &BoolExpr::ff()).same(&a));
    assert!(a.ite(&BoolExpr::ff(), &BoolExpr::tt()).same(&a.not()));
    assert!(a.ite(&BoolExpr::tt(), &BoolExpr::tt()).is_true());
    assert!(a.ite(&BoolExpr::ff(), &BoolExpr::ff()).is_false());

    assert_eq!(IntExpr::constant(3).add_const(4).as_const(), Some(7));
    assert!(x.add_const(0).same(&x));
    assert!(x.equals(&x).is_true());
    assert!(x.lt(&x).is_false());
    assert!(IntExpr::constant(3).le(&IntExpr::constant(2)).is_false());
    assert!(a.ite_int(&x, &x).same(&x));
}

#[test]
fn partial_evaluation() {
    let mut ctx = Context::new();
    let a = ctx.bool_var("a");
    let b = ctx.bool_var("b");
    let x = ctx.int_var("x");
    let y = ctx.int_var("y");

    let mut asg = PartialAssignment::new();
    asg.set_bool(&a, false).set_int(&x, 5);

    // a conjunction is false as soon as one element is false
    assert_eq!(a.and(&b).eval(&asg), Some(false));
    assert_eq!(a.or(&b).eval(&asg), None);
    assert_eq!(a.implies(&b).eval(&asg), Some(true));
    assert_eq!(x.add_const(3).eval(&asg), Some(8));
    assert_eq!(x.add(&y).eval(&asg), None);
    assert_eq!(x.gt(&IntExpr::constant(4)).eval(&asg), Some(true));
    assert_eq!(x.in_range(0, 4).eval(&asg), Some(false));
    assert_eq!(a.ite_int(&y, &x).eval(&asg), Some(5));
    // both branches agree
    assert_eq!(b.ite_int(&x, &IntExpr::constant(5)).eval(&asg), Some(5));
    assert_eq!(b.ite_int(&x, &IntExpr::constant(6)).eval(&asg), None);

    let mut model = Model::new();
    model.insert_bool("b", true);
    model.insert_int("y", -1);
    assert_eq!(model.len(), 2);
    assert_eq!(model.eval_bool(&a.not().and(&b)), None);
    assert_eq!(model.eval_bool(&b), Some(true));
    assert_eq!(model.eval_int(&y.sub(&IntExpr::constant(1))), Some(-2));
}

#[test]
fn propagation() {
    let mut ctx = Context::new();
    let a = ctx.bool_var("a");
    let b = ctx.bool_var("b");
    let c = ctx.bool_var("c");
    let d = ctx.bool_var("d");
    let x = ctx.int_var("x");
    let y = ctx.int_var("y");
    let z = ctx.int_var("z");
    let w = ctx.int_var("w");
    ctx.add(b.iff(&x.gt(&IntExpr::constant(5))));
    ctx.add(y.equals(&b.ite_int(&IntExpr::constant(1), &IntExpr::constant(2))));
    ctx.add(b.implies(&c.and(&d.not())));
    ctx.add(a.ite(&c.not(), &d));
    ctx.add(z.equals(&w));

    let mut asg = PartialAssignment::new();
    asg.set_int(&x, 7).propagate(&ctx);
    assert_eq!(b.eval(&asg), Some(true));
    assert_eq!(y.eval(&asg), Some(1));
    assert_eq!(c.eval(&asg), Some(true));
    assert_eq!(d.eval(&asg), Some(false));
    // nothing forces the other variables
    assert_eq!(a.eval(&asg), None);
    assert_eq!(z.eval(&asg), None);

    let mut asg = PartialAssignment::new();
    asg.set_int(&x, 3).set_bool(&a, false).set_int(&w, 4).propagate(&ctx);
    assert_eq!(b.eval(&asg), Some(false));
    assert_eq!(y.eval(&asg), Some(2));
    assert_eq!(c.eval(&asg), None);
    assert_eq!(d.eval(&asg), Some(true));
    assert_eq!(z.eval(&asg), Some(4));
}

#[test]
fn unique_variable_names() {
    let mut ctx = Context::new();
    let a = ctx.bool_var("a");
    let a2 = ctx.bool_var("a");
    assert_eq!(a.as_var().unwrap().name(), "a");
    assert_eq!(a2.as_var().unwrap().name(), "a_1");
    assert!(!a.same(&a2));
    assert_eq!(ctx.num_variables(), 2);
    assert_eq!(ctx.variables()[1].sort(), Sort::Bool);

    // trivially true constraints are dropped
    ctx.add(BoolExpr::tt());
    ctx.add(a.or(&a2));
    assert_eq!(ctx.num_constraints(), 1);
}

#[test]
fn no_solver_backend() {
    let mut ctx = Context::new();
    let a = ctx.bool_var("a");
    ctx.add(a.clone());
    ctx.add(a.not());
    let backend = NoSolverBackend::new();
    assert_eq!(backend.name(), "none");
    match backend.solve(&ctx, None).unwrap() {
        SolverOutput::Unknown(reason) => assert!(reason.contains("2 constraints")),
        output => panic!("unexpected output: {:?}", output),
    }
}

#[cfg(feature = "z3")]
#[test]
fn z3_backend() {
    let backend = Z3Backend::new();

    let mut ctx = Context::new();
    let x = ctx.int_var("x");
    let a = ctx.bool_var("a");
    ctx.add(x.gt(&IntExpr::constant(10)));
    ctx.add(a.implies(&x.lt(&IntExpr::constant(5))));
    match backend.solve(&ctx, None).unwrap() {
        SolverOutput::Sat(model) => {
            assert_eq!(model.eval_bool(&a), Some(false));
            assert!(model.eval_int(&x).unwrap() > 10);
        }
        output => panic!("unexpected output: {:?}", output),
    }

    ctx.add(a);
    assert_eq!(backend.solve(&ctx, None).unwrap(), SolverOutput::Unsat);
}
