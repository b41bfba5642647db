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

//! # Property Instrumentation
//!
//! Auxiliary relations over the data forwarding variables of a slice. All relations are least
//! fixpoints: a router only reaches a target if it forwards to a neighbor that reaches it with a
//! strictly smaller rank, such that a forwarding loop can never justify itself. The ranks are
//! free integer variables; the reverse implication forces a router to reach the target as soon as
//! it forwards to a neighbor that does.

use crate::encoder::{EdgeId, EncoderSlice};
use crate::smt::{BoolExpr, Context, IntExpr};

use std::collections::BTreeMap;

fn var_prefix(slice: &EncoderSlice<'_>) -> String {
    if slice.name().is_empty() {
        String::new()
    } else {
        format!("{}_", slice.name())
    }
}

/// Reachability of a set of targets. `targets` maps routers to the condition under which they
/// deliver the packet directly. The router `skip` does not propagate reachability (it gets no
/// variable), which is used for loop detection. Returns one boolean per router.
pub fn reachability(
    ctx: &mut Context,
    slice: &EncoderSlice<'_>,
    targets: &BTreeMap<String, BoolExpr>,
    skip: Option<&str>,
    name: &str,
) -> BTreeMap<String, BoolExpr> {
    let graph = slice.graph();
    let prefix = var_prefix(slice);
    let routers: Vec<&str> = graph.routers().filter(|r| Some(*r) != skip).collect();
    let n = routers.len() as i64;

    let mut reach = BTreeMap::new();
    let mut rank = BTreeMap::new();
    for r in routers.iter() {
        reach.insert(r.to_string(), ctx.bool_var(&format!("{}{}_{}", prefix, name, r)));
        let id = ctx.int_var(&format!("{}{}-id_{}", prefix, name, r));
        ctx.add(id.in_range(0, n));
        rank.insert(r.to_string(), id);
    }

    for r in routers.iter() {
        let target = targets.get(*r).cloned().unwrap_or_else(BoolExpr::ff);
        let mut any = vec![target.clone()];
        let mut ranked = vec![target];
        for e in graph.edges_of(r).iter().copied() {
            let peer = match graph.edge(e).peer.as_deref() {
                Some(p) if Some(p) != skip => p,
                _ => continue,
            };
            let step = slice.data_forwarding(e).and(&reach[peer]);
            ranked.push(step.and(&rank[peer].lt(&rank[*r])));
            any.push(step);
        }
        let x = &reach[*r];
        ctx.add(BoolExpr::or_all(any).implies(x));
        ctx.add(x.implies(&BoolExpr::or_all(ranked)));
    }
    reach
}

/// Length of the shortest forwarding path towards the targets, or `-1` if the target is not
/// reached. Builds on the result of [`reachability`].
pub fn path_length(
    ctx: &mut Context,
    slice: &EncoderSlice<'_>,
    targets: &BTreeMap<String, BoolExpr>,
    reach: &BTreeMap<String, BoolExpr>,
) -> BTreeMap<String, IntExpr> {
    let graph = slice.graph();
    let prefix = var_prefix(slice);
    let minus_one = IntExpr::constant(-1);
    let zero = IntExpr::constant(0);

    let len: BTreeMap<String, IntExpr> = reach
        .keys()
        .map(|r| (r.clone(), ctx.int_var(&format!("{}path-length_{}", prefix, r))))
        .collect();

    for (r, x) in len.iter() {
        let target = targets.get(r).cloned().unwrap_or_else(BoolExpr::ff);
        ctx.add(reach[r].not().implies(&x.equals(&minus_one)));
        ctx.add(target.implies(&x.equals(&zero)));
        let mut witnesses = Vec::new();
        for e in graph.edges_of(r).iter().copied() {
            let peer = match graph.edge(e).peer.as_deref() {
                Some(p) if len.contains_key(p) => p,
                _ => continue,
            };
            let step = slice.data_forwarding(e).and(&reach[peer]);
            let via = len[peer].add_const(1);
            ctx.add(step.implies(&x.le(&via)));
            witnesses.push(step.and(&x.equals(&via)));
        }
        ctx.add(reach[r].and(&target.not()).implies(&BoolExpr::or_all(witnesses)));
    }
    len
}

/// Number of routers whose traffic passes through each router, counting the router itself.
/// Traffic is only followed along edges decreasing the path length, which keeps the relation
/// well founded.
pub fn load(
    ctx: &mut Context,
    slice: &EncoderSlice<'_>,
    reach: &BTreeMap<String, BoolExpr>,
    len: &BTreeMap<String, IntExpr>,
) -> BTreeMap<String, IntExpr> {
    let graph = slice.graph();
    let prefix = var_prefix(slice);
    let zero = IntExpr::constant(0);

    let load: BTreeMap<String, IntExpr> = reach
        .keys()
        .map(|r| (r.clone(), ctx.int_var(&format!("{}load_{}", prefix, r))))
        .collect();

    for (r, x) in load.iter() {
        let mut sum = IntExpr::constant(1);
        for e in graph.edges_of(r).iter().copied() {
            let (peer, back) = match (graph.edge(e).peer.as_deref(), graph.other_end(e)) {
                (Some(p), Some(b)) if load.contains_key(p) => (p, b),
                _ => continue,
            };
            let incoming = slice
                .data_forwarding(back)
                .and(&reach[peer])
                .and(&len[peer].gt(&len[r]));
            sum = sum.add(&incoming.ite_int(&load[peer], &zero));
        }
        ctx.add(reach[r].ite(&x.equals(&sum), &x.equals(&zero)));
    }
    load
}

/// For every router that is a loop candidate, a boolean that is true if the packet forwarded by
/// the router eventually returns to it.
pub fn routing_loops(ctx: &mut Context, slice: &EncoderSlice<'_>) -> BTreeMap<String, BoolExpr> {
    let graph = slice.graph();
    let mut result = BTreeMap::new();
    for candidate in graph.loop_candidates() {
        let mut targets = BTreeMap::new();
        for r in graph.routers().filter(|r| *r != candidate) {
            let into: Vec<BoolExpr> = graph
                .edges_of(r)
                .iter()
                .filter(|e| graph.edge(**e).peer.as_deref() == Some(candidate.as_str()))
                .map(|e| slice.data_forwarding(*e))
                .collect();
            if !into.is_empty() {
                targets.insert(r.to_string(), BoolExpr::or_all(into));
            }
        }
        let reach = reachability(ctx, slice, &targets, Some(candidate.as_str()), &format!("on-loop-{}", candidate));
        let back = BoolExpr::or_all(graph.edges_of(&candidate).iter().filter_map(|e| {
            let peer = graph.edge(*e).peer.as_deref()?;
            reach.get(peer).map(|x| slice.data_forwarding(*e).and(x))
        }));
        result.insert(candidate, back);
    }
    result
}

/// For every router without an environment edge, a boolean that is true if a neighbor forwards
/// the packet to it, but it forwards the packet nowhere.
pub fn black_holes(slice: &EncoderSlice<'_>) -> BTreeMap<String, BoolExpr> {
    let graph = slice.graph();
    graph
        .routers()
        .filter(|r| !graph.has_environment_edge(r))
        .map(|r| {
            let edges = graph.edges_of(r);
            let received = BoolExpr::or_all(
                edges.iter().filter_map(|e| graph.other_end(*e)).map(|b| slice.data_forwarding(b)),
            );
            let forwards = BoolExpr::or_all(edges.iter().map(|e| slice.data_forwarding(*e)));
            (r.to_string(), received.and(&forwards.not()))
        })
        .collect()
}

/// For every router, a boolean that is true if some forwarding path of the router reaches the
/// target while another one does not. A path does not reach the target if the packet is dropped
/// by an access list, leaves the network elsewhere, or ends at a router not reaching the target.
pub fn multipath_violations(
    slice: &EncoderSlice<'_>,
    target_edges: &[EdgeId],
    reach: &BTreeMap<String, BoolExpr>,
) -> BTreeMap<String, BoolExpr> {
    let graph = slice.graph();
    reach
        .keys()
        .map(|r| {
            let mut good = Vec::new();
            let mut bad = Vec::new();
            for e in graph.edges_of(r).iter().copied() {
                let delivers = if target_edges.contains(&e) {
                    slice.data_forwarding(e)
                } else {
                    match graph.edge(e).peer.as_deref().and_then(|p| reach.get(p)) {
                        Some(x) => slice.data_forwarding(e).and(x),
                        None => BoolExpr::ff(),
                    }
                };
                bad.push(slice.control_forwarding(e).and(&delivers.not()));
                good.push(delivers);
            }
            (r.clone(), BoolExpr::or_all(good).and(&BoolExpr::or_all(bad)))
        })
        .collect()
}
