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

//! # Properties
//!
//! Verification queries on top of the encoding. Every query encodes the network for the header
//! space of a [`HeaderQuestion`], adds the relations needed by the property (see
//! [`instrument`]), asserts the *negation* of the property and asks the solver for a model. If no
//! model exists, the property holds for every environment, every packet of the header space and
//! every combination of link failures. Otherwise, the model is decoded into a
//! [`Counterexample`].
//!
//! ## Example usage
//!
//! ```
//! use cpverify::example_networks::*;
//! use cpverify::properties::{Outcome, PropertyChecker};
//! use cpverify::smt::NoSolverBackend;
//!
//! fn main() -> Result<(), cpverify::Error> {
//!     let net = BlackHoleNet::net();
//!     let backend = NoSolverBackend::new();
//!     let checker = PropertyChecker::new(&net, &backend);
//!     let result = checker.compute_black_hole(&BlackHoleNet::question())?;
//!     assert!(matches!(result.outcome, Outcome::Unknown(_)));
//!     Ok(())
//! }
//! ```

pub mod instrument;
pub mod printer;
mod result;

pub use result::{
    decode_route, Counterexample, Outcome, PropertyVars, RouteValues, Stats, VerificationResult,
};

use crate::encoder::{EdgeId, Encoder, EncoderSlice, Graph, Settings};
use crate::netconf::{Endpoint, HeaderSpace, Network};
use crate::smt::{BoolExpr, Context, IntExpr, SolverBackend, SolverOutput};
use crate::Error;

use itertools::Itertools;
use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// Packets, failures, sources and destinations of a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderQuestion {
    /// Packets considered by the query
    pub header_space: HeaderSpace,
    /// Maximal number of failed links
    pub failures: usize,
    /// Routers the property is checked for. All routers if empty.
    pub sources: Vec<String>,
    /// Interfaces where the packet is delivered
    pub destinations: Vec<Endpoint>,
}

impl HeaderQuestion {
    /// Question over all packets, without failures, sources or destinations
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header space
    pub fn header_space(mut self, hs: HeaderSpace) -> Self {
        self.header_space = hs;
        self
    }

    /// Set the number of failures
    pub fn failures(mut self, k: usize) -> Self {
        self.failures = k;
        self
    }

    /// Add a source router
    pub fn source(mut self, router: impl Into<String>) -> Self {
        self.sources.push(router.into());
        self
    }

    /// Add a destination interface
    pub fn destination(mut self, router: impl Into<String>, interface: impl Into<String>) -> Self {
        self.destinations.push(Endpoint { router: router.into(), interface: interface.into() });
        self
    }
}

/// Targets of a question inside a slice
struct Targets {
    by_router: BTreeMap<String, BoolExpr>,
    edges: Vec<EdgeId>,
}

impl Targets {
    fn new(slice: &EncoderSlice<'_>, q: &HeaderQuestion) -> Result<Self, Error> {
        if q.destinations.is_empty() {
            return Err(Error::InvalidQuestion("the question has no destination".to_string()));
        }
        let graph = slice.graph();
        let mut dfs: BTreeMap<String, Vec<BoolExpr>> = BTreeMap::new();
        let mut edges = Vec::new();
        for d in q.destinations.iter() {
            let e = graph.find_edge(&d.router, &d.interface).ok_or_else(|| {
                Error::InvalidQuestion(format!("unknown destination {} {}", d.router, d.interface))
            })?;
            dfs.entry(d.router.clone()).or_default().push(slice.data_forwarding(e));
            edges.push(e);
        }
        let by_router = dfs.into_iter().map(|(r, x)| (r, BoolExpr::or_all(x))).collect();
        Ok(Self { by_router, edges })
    }

    /// Routers the property is checked for: the sources of the question, or all routers except
    /// the destinations.
    fn sources(&self, slice: &EncoderSlice<'_>, q: &HeaderQuestion) -> Result<Vec<String>, Error> {
        sources(slice, q, |r| !self.by_router.contains_key(r))
    }
}

fn sources<F>(slice: &EncoderSlice<'_>, q: &HeaderQuestion, default: F) -> Result<Vec<String>, Error>
where
    F: Fn(&str) -> bool,
{
    let graph = slice.graph();
    if q.sources.is_empty() {
        return Ok(graph.routers().filter(|r| default(*r)).map(|r| r.to_string()).collect());
    }
    for s in q.sources.iter() {
        if !graph.contains_router(s) {
            return Err(Error::InvalidQuestion(format!("unknown source {}", s)));
        }
    }
    Ok(q.sources.clone())
}

/// # Property Checker
///
/// Executes the verification queries on a network with a solver backend. The checker only holds
/// shared references, such that queries can run in parallel.
pub struct PropertyChecker<'n> {
    net: &'n Network,
    backend: &'n dyn SolverBackend,
    settings: Settings,
}

impl<'n> std::fmt::Debug for PropertyChecker<'n> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyChecker")
            .field("backend", &self.backend.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<'n> PropertyChecker<'n> {
    /// Create a checker with the default settings
    pub fn new(net: &'n Network, backend: &'n dyn SolverBackend) -> Self {
        Self { net, backend, settings: Settings::default() }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Settings used for every query
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Encode the network once for the question, add the property built by `instrument`, assert
    /// its negation and solve.
    fn check<F>(&self, property: &str, q: &HeaderQuestion, instrument: F) -> Result<VerificationResult, Error>
    where
        F: FnOnce(&mut Context, &EncoderSlice<'_>, &mut PropertyVars) -> Result<BoolExpr, Error>,
    {
        info!("Checking {}", property);
        let graph = Graph::new(self.net)?;
        let mut enc = Encoder::new(self.settings.clone());
        let idx = enc.add_slice(&graph, q.header_space.clone(), q.failures, "")?;
        let mut vars = PropertyVars::new();
        {
            let (ctx, slices) = enc.parts_mut();
            let holds = instrument(ctx, &slices[idx], &mut vars)?;
            ctx.add(holds.not());
        }
        self.finish(property, &enc, &vars)
    }

    fn finish(&self, property: &str, enc: &Encoder<'_>, vars: &PropertyVars) -> Result<VerificationResult, Error> {
        let (output, solve_time) = enc.solve(self.backend)?;
        let stats = Stats {
            num_variables: enc.ctx().num_variables(),
            num_constraints: enc.ctx().num_constraints(),
            solve_time,
        };
        let (verified, outcome, counterexample) = match output {
            SolverOutput::Unsat => (true, Outcome::Verified, None),
            SolverOutput::Sat(model) => {
                (false, Outcome::Violated, Some(Counterexample::decode(&model, enc.slices(), vars)))
            }
            SolverOutput::Unknown(reason) => {
                warn!("{} is inconclusive: {}", property, reason);
                (false, Outcome::Unknown(reason), None)
            }
        };
        info!("{}: {:?}", property, outcome);
        Ok(VerificationResult { property: property.to_string(), verified, outcome, counterexample, stats })
    }

    /// Compute a stable forwarding state for the header space. The property asserted is that no
    /// such state exists, so the result is violated for every well-formed network, with the
    /// forwarding state as counterexample.
    pub fn compute_forwarding(&self, q: &HeaderQuestion) -> Result<VerificationResult, Error> {
        self.check("forwarding", q, |_, _, _| Ok(BoolExpr::ff()))
    }

    /// All sources deliver every packet of the header space to one of the destinations.
    pub fn compute_reachability(&self, q: &HeaderQuestion) -> Result<VerificationResult, Error> {
        self.check("reachability", q, |ctx, slice, vars| {
            let t = Targets::new(slice, q)?;
            let reach = instrument::reachability(ctx, slice, &t.by_router, None, "reachable");
            let sources = t.sources(slice, q)?;
            for s in sources.iter() {
                vars.add_bool(format!("reachable({})", s), reach[s.as_str()].clone());
            }
            Ok(BoolExpr::and_all(sources.iter().map(|s| reach[s.as_str()].clone())))
        })
    }

    /// Reachability for every destination of the question on its own. The queries run in
    /// parallel, on as many threads as there are CPUs. The results are in the order of the
    /// destinations.
    pub fn compute_reachability_per_edge(
        &self,
        q: &HeaderQuestion,
    ) -> Result<Vec<(Endpoint, VerificationResult)>, Error> {
        let questions: Vec<HeaderQuestion> = q
            .destinations
            .iter()
            .map(|d| HeaderQuestion { destinations: vec![d.clone()], ..q.clone() })
            .collect();
        let num_threads = num_cpus::get().max(1).min(questions.len().max(1));
        let chunk_size = (questions.len() + num_threads - 1) / num_threads.max(1);
        debug!("Checking {} destinations on {} threads", questions.len(), num_threads);

        let mut results = Vec::with_capacity(questions.len());
        std::thread::scope(|s| -> Result<(), Error> {
            let handles: Vec<_> = questions
                .chunks(chunk_size.max(1))
                .map(|chunk| {
                    s.spawn(move || {
                        chunk.iter().map(|q| self.compute_reachability(q)).collect::<Result<Vec<_>, Error>>()
                    })
                })
                .collect();
            for h in handles {
                results.extend(h.join().map_err(|_| Error::WorkerPanicked)??);
            }
            Ok(())
        })?;
        Ok(q.destinations.iter().cloned().zip(results).collect())
    }

    /// No router without an environment edge receives packets of the header space and drops
    /// them.
    pub fn compute_black_hole(&self, q: &HeaderQuestion) -> Result<VerificationResult, Error> {
        self.check("black hole", q, |_, slice, vars| {
            let holes = instrument::black_holes(slice);
            for (r, x) in holes.iter() {
                vars.add_bool(format!("black-hole({})", r), x.clone());
            }
            Ok(BoolExpr::or_all(holes.into_values()).not())
        })
    }

    /// The forwarding path of every source towards the destinations is at most `k` hops long.
    pub fn compute_bounded_length(&self, q: &HeaderQuestion, k: i64) -> Result<VerificationResult, Error> {
        self.check("bounded length", q, |ctx, slice, vars| {
            let (sources, len) = self.path_lengths(ctx, slice, q, vars)?;
            let bound = IntExpr::constant(k);
            Ok(BoolExpr::and_all(sources.iter().map(|s| len[s.as_str()].le(&bound))))
        })
    }

    /// All sources reach the destinations over paths of equal length.
    pub fn compute_equal_length(&self, q: &HeaderQuestion) -> Result<VerificationResult, Error> {
        self.check("equal length", q, |ctx, slice, vars| {
            let (sources, len) = self.path_lengths(ctx, slice, q, vars)?;
            let mut iter = sources.iter();
            Ok(match iter.next() {
                Some(first) => {
                    let first = &len[first.as_str()];
                    BoolExpr::and_all(iter.map(|s| len[s.as_str()].equals(first)))
                }
                None => BoolExpr::tt(),
            })
        })
    }

    fn path_lengths(
        &self,
        ctx: &mut Context,
        slice: &EncoderSlice<'_>,
        q: &HeaderQuestion,
        vars: &mut PropertyVars,
    ) -> Result<(Vec<String>, BTreeMap<String, IntExpr>), Error> {
        let t = Targets::new(slice, q)?;
        let reach = instrument::reachability(ctx, slice, &t.by_router, None, "reachable");
        let len = instrument::path_length(ctx, slice, &t.by_router, &reach);
        let sources = t.sources(slice, q)?;
        for s in sources.iter() {
            vars.add_int(format!("path-length({})", s), len[s.as_str()].clone());
        }
        Ok((sources, len))
    }

    /// The load of the sources (the number of routers forwarding traffic through them towards the
    /// destinations) differs by at most `threshold`.
    pub fn compute_load_balance(&self, q: &HeaderQuestion, threshold: i64) -> Result<VerificationResult, Error> {
        self.check("load balance", q, |ctx, slice, vars| {
            let t = Targets::new(slice, q)?;
            let reach = instrument::reachability(ctx, slice, &t.by_router, None, "reachable");
            let len = instrument::path_length(ctx, slice, &t.by_router, &reach);
            let load = instrument::load(ctx, slice, &reach, &len);
            let sources = t.sources(slice, q)?;
            for s in sources.iter() {
                vars.add_int(format!("load({})", s), load[s.as_str()].clone());
            }
            Ok(BoolExpr::and_all(sources.iter().tuple_combinations().map(|(a, b)| {
                load[a.as_str()].sub(&load[b.as_str()]).in_range(-threshold, threshold)
            })))
        })
    }

    /// If a source delivers the packet over one of its forwarding paths, it does so over all of
    /// them.
    pub fn compute_multipath_consistency(&self, q: &HeaderQuestion) -> Result<VerificationResult, Error> {
        self.check("multipath consistency", q, |ctx, slice, vars| {
            let t = Targets::new(slice, q)?;
            let reach = instrument::reachability(ctx, slice, &t.by_router, None, "reachable");
            let violations = instrument::multipath_violations(slice, &t.edges, &reach);
            let sources: BTreeSet<String> = sources(slice, q, |_| true)?.into_iter().collect();
            let relevant: Vec<BoolExpr> = violations
                .into_iter()
                .filter(|(r, _)| sources.contains(r))
                .map(|(r, x)| {
                    vars.add_bool(format!("inconsistent({})", r), x.clone());
                    x
                })
                .collect();
            Ok(BoolExpr::or_all(relevant).not())
        })
    }

    /// No packet of the header space is forwarded in a loop.
    pub fn compute_routing_loop(&self, q: &HeaderQuestion) -> Result<VerificationResult, Error> {
        self.check("routing loop", q, |ctx, slice, vars| {
            let loops = instrument::routing_loops(ctx, slice);
            for (r, x) in loops.iter() {
                vars.add_bool(format!("loop({})", r), x.clone());
            }
            Ok(BoolExpr::or_all(loops.into_values()).not())
        })
    }

    /// Every pair of the source routers (all routers if no sources are given) forwards every
    /// packet of the header space the same way, given the same routes from the environment. Only
    /// routers with the same interface names can be compared; all other pairs are reported as
    /// [`Outcome::CannotCompare`]. A pair whose encoding fails is reported as [`Outcome::Error`],
    /// and the remaining pairs are still checked. Fails only if a source router does not exist.
    pub fn compute_local_consistency(
        &self,
        q: &HeaderQuestion,
    ) -> Result<Vec<(String, String, VerificationResult)>, Error> {
        let routers: Vec<String> = if q.sources.is_empty() {
            self.net.configs().keys().cloned().collect()
        } else {
            q.sources.clone()
        };
        for r in routers.iter() {
            self.net.config(r)?;
        }
        Ok(routers
            .iter()
            .tuple_combinations()
            .map(|(a, b)| {
                let property = local_consistency_name(a, b);
                let result = self.local_consistency(q, a, b).unwrap_or_else(|e| {
                    warn!("{}: {}", property, e);
                    VerificationResult::error(property, e)
                });
                (a.clone(), b.clone(), result)
            })
            .collect())
    }

    fn local_consistency(&self, q: &HeaderQuestion, a: &str, b: &str) -> Result<VerificationResult, Error> {
        let property = local_consistency_name(a, b);
        let (conf_a, conf_b) = (self.net.config(a)?, self.net.config(b)?);
        let ifaces_a: BTreeSet<&String> = conf_a.active_interfaces().map(|i| &i.name).collect();
        let ifaces_b: BTreeSet<&String> = conf_b.active_interfaces().map(|i| &i.name).collect();
        if ifaces_a != ifaces_b {
            info!("Cannot compare {} and {}: interfaces differ", a, b);
            return Ok(VerificationResult::cannot_compare(property, "the routers have different interfaces"));
        }

        let (net_a, net_b) = (self.net.single_router(a)?, self.net.single_router(b)?);
        let (graph_a, graph_b) = (Graph::new(&net_a)?, Graph::new(&net_b)?);
        let mut enc = Encoder::new(self.settings.clone());
        let ia = enc.add_slice(&graph_a, q.header_space.clone(), q.failures, a)?;
        let ib = enc.add_slice(&graph_b, q.header_space.clone(), q.failures, b)?;
        let mut vars = PropertyVars::new();
        {
            let (ctx, slices) = enc.parts_mut();
            let (sa, sb) = (&slices[ia], &slices[ib]);
            ctx.add(sa.packet().equal(sb.packet()));

            let env_b: BTreeMap<&str, _> = sb
                .environment_records()
                .into_iter()
                .map(|(e, r)| (graph_b.edge(e).interface.as_str(), r))
                .collect();
            for (e, ra) in sa.environment_records() {
                if let Some(rb) = env_b.get(graph_a.edge(e).interface.as_str()) {
                    ctx.add(ra.equal(rb, true));
                    ctx.add(rb.equal(ra, true));
                }
            }

            let mut differ = Vec::new();
            for ea in graph_a.edges_of(a).iter().copied() {
                let iface = &graph_a.edge(ea).interface;
                let eb = match graph_b.find_edge(b, iface) {
                    Some(eb) => eb,
                    None => continue,
                };
                ctx.add(sa.failed(ea).iff(&sb.failed(eb)));
                let (dfa, dfb) = (sa.data_forwarding(ea), sb.data_forwarding(eb));
                vars.add_bool(format!("{}.{}", a, iface), dfa.clone());
                vars.add_bool(format!("{}.{}", b, iface), dfb.clone());
                differ.push(dfa.iff(&dfb).not());
            }
            ctx.add(BoolExpr::or_all(differ));
        }
        self.finish(&property, &enc, &vars)
    }
}

fn local_consistency_name(a: &str, b: &str) -> String {
    format!("local consistency {} {}", a, b)
}
