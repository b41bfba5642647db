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

//! # Decision Process
//!
//! Encoding of the best route selection. Routes are compared lexicographically by prefix length
//! (longer first), administrative distance, local preference, metric, MED, OSPF type, eBGP over
//! iBGP, and finally the router id. The comparator is built from the least significant attribute
//! up as a chain of `ite` terms: if two routes are equal in an attribute, the next one decides.
//! Attributes that are not encoded compare equal, so their step folds away.

use super::symbolic_route::{IntField, SymbolicRoute};
use crate::netconf::Protocol;
use crate::smt::{BoolExpr, Context};

/// `best` is at least as preferred as `cand`. `proto` is `None` when comparing the best routes of
/// different protocols; `router_id` enables the final tie break.
pub fn greater_or_equal(
    best: &SymbolicRoute,
    cand: &SymbolicRoute,
    proto: Option<Protocol>,
    router_id: bool,
) -> BoolExpr {
    let mut acc = BoolExpr::tt();
    let mut step = |eq: BoolExpr, better: BoolExpr| {
        acc = eq.ite(&acc, &better);
    };

    let encoded = |f: IntField| best.int_attr(f).is_present() || cand.int_attr(f).is_present();
    let smaller = |f: IntField| (best.value(f).equals(&cand.value(f)), best.value(f).lt(&cand.value(f)));
    let larger = |f: IntField| (best.value(f).equals(&cand.value(f)), best.value(f).gt(&cand.value(f)));

    if router_id && encoded(IntField::RouterId) {
        let (eq, better) = smaller(IntField::RouterId);
        step(eq, better);
    }
    if best.bgp_internal.is_present() || cand.bgp_internal.is_present() {
        let (b, c) = (best.internal(), cand.internal());
        step(b.iff(&c), b.not().and(&c));
    }
    for (f, prefer_larger) in [
        (IntField::OspfType, false),
        (IntField::Med, false),
        (IntField::Metric, false),
        (IntField::LocalPref, true),
        (IntField::AdminDist, false),
        (IntField::PrefixLength, true),
    ] {
        // BGP routes of one router are not ranked by their administrative distance
        if f == IntField::AdminDist && proto == Some(Protocol::Bgp) {
            continue;
        }
        if encoded(f) {
            let (eq, better) = if prefer_larger { larger(f) } else { smaller(f) };
            step(eq, better);
        }
    }
    acc
}

/// Constrain `best` to be the best of all candidates:
///
/// - a best route exists iff some candidate is permitted,
/// - it is at least as good as every permitted candidate,
/// - and it is equal to one of the permitted candidates.
pub fn select_best(
    ctx: &mut Context,
    best: &SymbolicRoute,
    candidates: &[&SymbolicRoute],
    proto: Option<Protocol>,
    router_id: bool,
) {
    ctx.add(
        best.permitted
            .iff(&BoolExpr::or_all(candidates.iter().map(|c| c.permitted.clone()))),
    );
    for c in candidates.iter() {
        ctx.add(c.permitted.implies(&greater_or_equal(best, c, proto, router_id)));
    }
    let communities = proto.is_none() || proto == Some(Protocol::Bgp);
    ctx.add(best.permitted.implies(&BoolExpr::or_all(candidates.iter().map(|c| {
        BoolExpr::and_all(
            std::iter::once(c.permitted.clone()).chain(best.equal_attributes(c, communities)),
        )
    }))));
}

/// The candidate is permitted and equal to the best route
pub fn is_chosen(best: &SymbolicRoute, cand: &SymbolicRoute) -> BoolExpr {
    let communities = best.proto == Some(Protocol::Bgp);
    BoolExpr::and_all(
        std::iter::once(cand.permitted.clone()).chain(best.equal_attributes(cand, communities)),
    )
}
