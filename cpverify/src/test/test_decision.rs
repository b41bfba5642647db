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

use crate::encoder::IntField::*;
use crate::encoder::*;
use crate::netconf::Protocol::*;
use crate::netconf::{Network, Protocol};
use crate::smt::*;

use lazy_static::lazy_static;
use maplit::btreemap;
use std::collections::BTreeMap;

lazy_static! {
    static ref BASE: BTreeMap<IntField, i64> = btreemap! {
        IntField::PrefixLength => 24,
        IntField::AdminDist => 20,
        IntField::LocalPref => 100,
        IntField::Metric => 2,
        IntField::Med => 0,
        IntField::RouterId => 5,
    };
}

fn shape() -> RecordShape {
    RecordShape {
        admin_dist: true,
        local_pref: true,
        metric: true,
        med: true,
        router_id: true,
        bgp_internal: true,
        ..Default::default()
    }
}

fn route(ctx: &mut Context, name: &str, shape: RecordShape) -> SymbolicRoute {
    let registry = CommunityRegistry::from_network(&Network::new()).unwrap();
    SymbolicRoute::new(ctx, name, Some(Bgp), RecordKind::BestPerProtocol, shape, &registry)
}

/// Assign a permitted route, with the base values changed by `changes`.
fn assign(asg: &mut PartialAssignment, r: &SymbolicRoute, changes: &[(IntField, i64)], internal: bool) {
    let mut values = BASE.clone();
    values.extend(changes.iter().copied());
    asg.set_bool(&r.permitted, true);
    for (f, v) in values {
        if let Some(x) = r.int_attr(f).get() {
            asg.set_int(x, v);
        }
    }
    if let Some(b) = r.bgp_internal.get() {
        asg.set_bool(b, internal);
    }
}

/// Compare two routes in both directions: `(a >= b, b >= a)`.
fn compare(
    a: &[(IntField, i64)],
    b: &[(IntField, i64)],
    internal: (bool, bool),
    proto: Option<Protocol>,
    router_id: bool,
) -> (Option<bool>, Option<bool>) {
    let mut ctx = Context::new();
    let (ra, rb) = (route(&mut ctx, "a", shape()), route(&mut ctx, "b", shape()));
    let mut asg = PartialAssignment::new();
    assign(&mut asg, &ra, a, internal.0);
    assign(&mut asg, &rb, b, internal.1);
    (
        greater_or_equal(&ra, &rb, proto, router_id).eval(&asg),
        greater_or_equal(&rb, &ra, proto, router_id).eval(&asg),
    )
}

#[test]
fn comparator_ordering() {
    let no = (false, false);
    let bgp = Some(Bgp);
    // equal routes
    assert_eq!(compare(&[], &[], no, bgp, true), (Some(true), Some(true)));
    // longer prefixes first
    assert_eq!(compare(&[], &[(PrefixLength, 16)], no, bgp, true), (Some(true), Some(false)));
    // then the administrative distance, if routes of different protocols are compared
    assert_eq!(compare(&[], &[(AdminDist, 200)], no, None, true), (Some(true), Some(false)));
    assert_eq!(compare(&[], &[(AdminDist, 200)], no, bgp, true), (Some(true), Some(true)));
    // higher local preference
    assert_eq!(compare(&[], &[(LocalPref, 200)], no, bgp, true), (Some(false), Some(true)));
    // lower metric and MED
    assert_eq!(compare(&[], &[(Metric, 1)], no, bgp, true), (Some(false), Some(true)));
    assert_eq!(compare(&[(Med, 10)], &[], no, bgp, true), (Some(false), Some(true)));
    // eBGP over iBGP
    assert_eq!(compare(&[], &[], (false, true), bgp, true), (Some(true), Some(false)));
    // the lower router id breaks ties, but only if enabled
    assert_eq!(compare(&[], &[(RouterId, 1)], no, bgp, true), (Some(false), Some(true)));
    assert_eq!(compare(&[], &[(RouterId, 1)], no, bgp, false), (Some(true), Some(true)));

    // more significant attributes dominate
    let b = [(PrefixLength, 25), (LocalPref, 50), (Metric, 9)];
    assert_eq!(compare(&[], &b, no, bgp, true), (Some(false), Some(true)));
    let b = [(LocalPref, 150), (Metric, 9), (RouterId, 9)];
    assert_eq!(compare(&[], &b, (false, true), bgp, true), (Some(false), Some(true)));
}

#[test]
fn elided_attributes_compare_equal() {
    let mut ctx = Context::new();
    let plain = RecordShape::default();
    let (a, b) = (route(&mut ctx, "a", plain), route(&mut ctx, "b", plain));
    let mut asg = PartialAssignment::new();
    assign(&mut asg, &a, &[], false);
    assign(&mut asg, &b, &[], false);
    assert_eq!(greater_or_equal(&a, &b, Some(Bgp), true).eval(&asg), Some(true));
    // only the prefix length is left
    asg.set_int(b.prefix_length.get().unwrap(), 25);
    assert_eq!(greater_or_equal(&a, &b, Some(Bgp), true).eval(&asg), Some(false));
}

/// Best route with two candidates differing in the local preference.
struct Selection {
    ctx: Context,
    best: SymbolicRoute,
    c1: SymbolicRoute,
    c2: SymbolicRoute,
}

impl Selection {
    fn new() -> Self {
        let mut ctx = Context::new();
        let best = route(&mut ctx, "best", shape());
        let c1 = route(&mut ctx, "c1", shape());
        let c2 = route(&mut ctx, "c2", shape());
        select_best(&mut ctx, &best, &[&c1, &c2], Some(Bgp), true);
        Self { ctx, best, c1, c2 }
    }

    /// Candidates: `c1` with local preference 100 and `c2` with 200, each one only if permitted.
    fn candidates(&self, p1: bool, p2: bool) -> PartialAssignment {
        let mut asg = PartialAssignment::new();
        assign(&mut asg, &self.c1, &[], false);
        assign(&mut asg, &self.c2, &[(LocalPref, 200)], false);
        asg.set_bool(&self.c1.permitted, p1).set_bool(&self.c2.permitted, p2);
        asg
    }

    /// All constraints hold
    fn holds(&self, asg: &PartialAssignment) -> Option<bool> {
        BoolExpr::and_all(self.ctx.constraints().iter().cloned()).eval(asg)
    }
}

#[test]
fn best_exists_iff_a_candidate_is_permitted() {
    let sel = Selection::new();
    for (p1, p2) in [(false, false), (true, false), (false, true), (true, true)] {
        let mut asg = sel.candidates(p1, p2);
        asg.propagate(&sel.ctx);
        assert_eq!(sel.best.permitted.eval(&asg), Some(p1 || p2));
    }

    // a best route without candidates is impossible
    let mut asg = sel.candidates(false, false);
    assign(&mut asg, &sel.best, &[], false);
    assert_eq!(sel.holds(&asg), Some(false));
}

#[test]
fn best_is_the_preferred_candidate() {
    let sel = Selection::new();

    // c2 has the higher local preference
    let mut asg = sel.candidates(true, true);
    assign(&mut asg, &sel.best, &[(LocalPref, 200)], false);
    assert_eq!(sel.holds(&asg), Some(true));
    assert_eq!(is_chosen(&sel.best, &sel.c2).eval(&asg), Some(true));
    assert_eq!(is_chosen(&sel.best, &sel.c1).eval(&asg), Some(false));
    let mut asg = sel.candidates(true, true);
    assign(&mut asg, &sel.best, &[], false);
    assert_eq!(sel.holds(&asg), Some(false));

    // without c2, c1 is the best route
    let mut asg = sel.candidates(true, false);
    assign(&mut asg, &sel.best, &[], false);
    assert_eq!(sel.holds(&asg), Some(true));
    assert_eq!(is_chosen(&sel.best, &sel.c1).eval(&asg), Some(true));
    assert_eq!(is_chosen(&sel.best, &sel.c2).eval(&asg), Some(false));
    // the best route must be one of the permitted candidates
    let mut asg = sel.candidates(true, false);
    assign(&mut asg, &sel.best, &[(LocalPref, 200)], false);
    assert_eq!(sel.holds(&asg), Some(false));
    // and not better than all of them
    let mut asg = sel.candidates(true, false);
    assign(&mut asg, &sel.best, &[(LocalPref, 300)], false);
    assert_eq!(sel.holds(&asg), Some(false));
}
