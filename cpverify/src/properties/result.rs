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

//! # Verification Results
//!
//! Results of the queries, and the counterexamples decoded from the model of the solver.

use crate::encoder::{Attr, EncoderSlice, IntField, SymbolicRoute, TCP_FLAG_NAMES};
use crate::netconf::Ip;
use crate::smt::{Assignment, BoolExpr, IntExpr, Model};

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The property holds for every environment (the negated property is unsatisfiable)
    Verified,
    /// The property can be violated, a counterexample is available
    Violated,
    /// The solver could not decide, with the reason
    Unknown(String),
    /// The question cannot be asked for the routers, with the reason
    CannotCompare(String),
    /// The query could not be encoded, with the error
    Error(String),
}

/// Size of the encoding and time spent in the solver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Number of variables
    pub num_variables: usize,
    /// Number of asserted constraints
    pub num_constraints: usize,
    /// Time spent in the solver
    pub solve_time: Duration,
}

/// Concrete values of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteValues {
    /// The record carries a route
    pub permitted: bool,
    /// Values of the encoded integer attributes
    pub attributes: BTreeMap<String, i64>,
    /// The route was learned over iBGP
    pub bgp_internal: Option<bool>,
    /// Communities attached to the route
    pub communities: Vec<String>,
}

/// Decoded model of a violated property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counterexample {
    /// Header fields of the packet
    pub packet: BTreeMap<String, String>,
    /// Failed links
    pub failed_links: Vec<String>,
    /// Routes announced by the environment (only permitted ones)
    pub environment: BTreeMap<String, RouteValues>,
    /// Best routes of every router and protocol (only permitted ones)
    pub best_routes: BTreeMap<String, RouteValues>,
    /// Edges the control plane forwards the packet on
    pub control_forwarding: Vec<String>,
    /// Edges the packet is actually forwarded on
    pub data_forwarding: Vec<String>,
    /// Values of the variables added by the property
    pub property: BTreeMap<String, String>,
}

/// # Verification Result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Name of the query
    pub property: String,
    /// The property holds
    pub verified: bool,
    /// Outcome of the query
    pub outcome: Outcome,
    /// Counterexample, if the property is violated
    pub counterexample: Option<Counterexample>,
    /// Statistics
    pub stats: Stats,
}

impl VerificationResult {
    /// Result of a pair of routers that cannot be compared
    pub fn cannot_compare(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            verified: false,
            outcome: Outcome::CannotCompare(reason.into()),
            counterexample: None,
            stats: Stats::default(),
        }
    }

    /// Result of a query that failed before reaching the solver
    pub fn error(property: impl Into<String>, error: impl ToString) -> Self {
        Self {
            property: property.into(),
            verified: false,
            outcome: Outcome::Error(error.to_string()),
            counterexample: None,
            stats: Stats::default(),
        }
    }
}

/// Variables added by a property, decoded into the counterexample by name
#[derive(Debug, Clone, Default)]
pub struct PropertyVars {
    bools: BTreeMap<String, BoolExpr>,
    ints: BTreeMap<String, IntExpr>,
}

impl PropertyVars {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boolean
    pub fn add_bool(&mut self, name: impl Into<String>, x: BoolExpr) {
        self.bools.insert(name.into(), x);
    }

    /// Add an integer
    pub fn add_int(&mut self, name: impl Into<String>, x: IntExpr) {
        self.ints.insert(name.into(), x);
    }

    fn decode(&self, model: &Model) -> BTreeMap<String, String> {
        let bools = self.bools.iter().filter_map(|(n, x)| x.eval(model).map(|v| (n.clone(), v.to_string())));
        let ints = self.ints.iter().filter_map(|(n, x)| x.eval(model).map(|v| (n.clone(), v.to_string())));
        bools.chain(ints).collect()
    }
}

impl Counterexample {
    /// Decode the model for all slices, together with the variables of the property.
    pub fn decode(model: &Model, slices: &[EncoderSlice<'_>], vars: &PropertyVars) -> Self {
        let mut cex = Counterexample { property: vars.decode(model), ..Default::default() };
        for (i, slice) in slices.iter().enumerate() {
            if i == 0 {
                cex.packet = decode_packet(model, slice);
            }
            let graph = slice.graph();
            for (e, f) in slice.failure_variables() {
                if f.eval(model) == Some(true) {
                    cex.failed_links.push(graph.edge(*e).to_string());
                }
            }
            for (_, r) in slice.environment_records() {
                if let Some(v) = decode_route(model, r) {
                    cex.environment.insert(r.name.clone(), v);
                }
            }
            for router in graph.routers() {
                for proto in slice.optimizations().protocols(router) {
                    if let Some(v) = slice.best_per_protocol(router, *proto).and_then(|r| decode_route(model, r)) {
                        cex.best_routes.insert(format!("{} {}", router, proto.name()), v);
                    }
                }
                for e in graph.edges_of(router).iter().copied() {
                    if slice.control_forwarding(e).eval(model) == Some(true) {
                        cex.control_forwarding.push(graph.edge(e).to_string());
                    }
                    if slice.data_forwarding(e).eval(model) == Some(true) {
                        cex.data_forwarding.push(graph.edge(e).to_string());
                    }
                }
            }
        }
        cex
    }
}

fn decode_packet(model: &Model, slice: &EncoderSlice<'_>) -> BTreeMap<String, String> {
    let p = slice.packet();
    let mut result = BTreeMap::new();
    let mut int = |name: &str, x: &IntExpr, ip: bool| {
        if let Some(v) = x.eval(model) {
            let s = if ip { Ip(v as u32).to_string() } else { v.to_string() };
            result.insert(name.to_string(), s);
        }
    };
    int("dstIp", &p.dst_ip, true);
    int("srcIp", &p.src_ip, true);
    int("dstPort", &p.dst_port, false);
    int("srcPort", &p.src_port, false);
    int("ipProtocol", &p.ip_protocol, false);
    int("icmpType", &p.icmp_type, false);
    int("icmpCode", &p.icmp_code, false);
    let flags: Vec<&str> = TCP_FLAG_NAMES
        .iter()
        .zip(p.tcp_flags.iter())
        .filter(|(_, f)| f.eval(model) == Some(true))
        .map(|(n, _)| *n)
        .collect();
    if !flags.is_empty() {
        result.insert("tcpFlags".to_string(), flags.join(","));
    }
    result
}

/// Values of a record, or `None` if it does not carry a route in the model
pub fn decode_route(model: &dyn Assignment, r: &SymbolicRoute) -> Option<RouteValues> {
    if r.permitted.eval(model) != Some(true) {
        return None;
    }
    let attributes = IntField::ALL
        .iter()
        .filter_map(|f| match r.int_attr(*f) {
            Attr::Present(x) => x.eval(model).map(|v| (f.label().to_string(), v)),
            Attr::Elided => None,
        })
        .collect();
    let bgp_internal = r.bgp_internal.get().and_then(|b| b.eval(model));
    let communities = r
        .communities
        .iter()
        .filter(|(c, x)| !c.is_regex() && x.eval(model) == Some(true))
        .map(|(c, _)| c.to_string())
        .collect();
    Some(RouteValues { permitted: true, attributes, bgp_internal, communities })
}
