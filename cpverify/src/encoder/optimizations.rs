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

//! # Optimizations
//!
//! Static analysis of the configurations, executed once per slice before any variable is
//! allocated. It decides which protocols are active on each router, which attributes of the
//! records must be encoded, and which records can be shared between logical edges. Whenever the
//! analysis is inconclusive, the variable is kept.

use super::graph::{EdgeId, Graph};
use super::symbolic_route::RecordShape;
use super::Settings;
use crate::netconf::{
    BooleanExpr, Configuration, HeaderSpace, Prefix, Protocol, RoutingPolicy, Statement,
};

use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// Result of the static analysis. See the [module documentation](self).
#[derive(Debug, Clone, Default)]
pub struct Optimizations {
    protocols: BTreeMap<String, Vec<Protocol>>,
    keep_local_pref: bool,
    keep_admin_dist: bool,
    keep_med: bool,
    keep_ospf_type: bool,
    keep_ospf_area: bool,
    need_router_id: BTreeMap<String, BTreeSet<Protocol>>,
    need_bgp_internal: BTreeSet<String>,
    can_merge_export: BTreeMap<String, BTreeSet<Protocol>>,
    can_merge_import_export: BTreeMap<String, BTreeMap<Protocol, BTreeSet<EdgeId>>>,
    redistributed: BTreeMap<String, BTreeMap<Protocol, BTreeSet<Protocol>>>,
    originated: BTreeMap<String, BTreeMap<Protocol, Vec<Prefix>>>,
    suppressed_aggregates: BTreeMap<String, Vec<Prefix>>,
    connected_edges: BTreeSet<EdgeId>,
    static_edges: BTreeSet<EdgeId>,
    history_protocols: BTreeSet<Protocol>,
    ospf_areas: BTreeSet<u32>,
}

/// Usage of route attributes by the routing policies
#[derive(Debug, Default)]
struct PolicyUsage {
    local_pref: bool,
    med: bool,
    admin_dist: bool,
    ospf_type: bool,
}

impl Optimizations {
    /// Analyze the network for a slice with the given header space and number of failures.
    pub fn compute(
        graph: &Graph<'_>,
        hs: &HeaderSpace,
        settings: &Settings,
        failures: usize,
    ) -> Self {
        let slicing = settings.enable_slicing;
        let relevant = |p: &Prefix| !slicing || hs.may_match_dst(p);
        let mut opt = Self::default();

        // edges carrying connected or static routes
        for (id, edge) in graph.edges().iter().enumerate() {
            if graph.interface(id).prefix().map(|p| relevant(&p)).unwrap_or(false) {
                opt.connected_edges.insert(id);
            }
            if graph.static_routes(id).iter().any(|r| relevant(&r.network)) {
                opt.static_edges.insert(id);
            }
            trace!("edge {} connected: {}", edge, opt.connected_edges.contains(&id));
        }

        for router in graph.routers() {
            let conf = graph.config(router);
            for iface in conf.active_interfaces() {
                if let (Some(o), true) = (&iface.ospf, conf.runs_ospf()) {
                    opt.ospf_areas.insert(o.area);
                }
            }
        }

        // active protocols
        for router in graph.routers() {
            let conf = graph.config(router);
            let edges = graph.edges_of(router);
            let mut protos = Vec::new();
            if edges.iter().any(|e| opt.connected_edges.contains(e)) {
                protos.push(Protocol::Connected);
            }
            if edges.iter().any(|e| opt.static_edges.contains(e)) {
                protos.push(Protocol::Static);
            }
            if conf.runs_ospf() {
                protos.push(Protocol::Ospf);
            }
            if conf.bgp.is_some() && edges.iter().any(|e| graph.bgp_neighbor(*e).is_some()) {
                protos.push(Protocol::Bgp);
            }
            debug!("{} runs {:?}", router, protos);
            opt.protocols.insert(router.to_string(), protos);
        }

        // policy usage
        let mut usage = PolicyUsage::default();
        for conf in graph.network().configs().values() {
            for policy in conf.routing_policies.values() {
                scan_usage(policy, &mut usage);
            }
        }
        let static_admin = graph.network().configs().values().any(|c| {
            c.static_routes.iter().any(|r| r.admin_cost as i64 != Protocol::Static.default_admin_distance())
        });
        opt.keep_local_pref = usage.local_pref;
        opt.keep_med = usage.med;
        opt.keep_admin_dist =
            usage.admin_dist || static_admin || opt.protocols.values().any(|p| p.len() > 1);
        opt.keep_ospf_area = opt.ospf_areas.len() > 1;

        // redistribution, origination and aggregation
        for router in graph.routers() {
            let conf = graph.config(router);
            let protos = opt.protocols[router].clone();
            let mut redist: BTreeMap<Protocol, BTreeSet<Protocol>> = BTreeMap::new();
            let mut orig: BTreeMap<Protocol, Vec<Prefix>> = BTreeMap::new();
            for proto in protos.iter().copied().filter(|p| p.is_dynamic()) {
                let policies: Vec<&str> = match proto {
                    Protocol::Ospf => conf.ospf.iter().filter_map(|o| o.export_policy.as_deref()).collect(),
                    Protocol::Bgp => conf
                        .bgp
                        .iter()
                        .flat_map(|b| b.neighbors.values())
                        .filter_map(|n| n.export_policy.as_deref())
                        .collect(),
                    _ => Vec::new(),
                };
                let matched = matched_protocols(conf, &policies);
                let sources: BTreeSet<Protocol> = matched
                    .into_iter()
                    .filter(|q| *q != proto && protos.contains(q))
                    .collect();
                if !sources.is_empty() {
                    opt.history_protocols.insert(proto);
                    redist.insert(proto, sources);
                }

                let mut prefixes: Vec<Prefix> = match proto {
                    Protocol::Ospf => conf
                        .active_interfaces()
                        .filter(|i| i.ospf.is_some())
                        .filter_map(|i| i.prefix())
                        .filter(|p| relevant(p))
                        .collect(),
                    _ => conf
                        .bgp
                        .iter()
                        .flat_map(|b| b.networks.iter().copied())
                        .filter(|p| relevant(p))
                        .collect(),
                };
                prefixes.sort_by_key(|p| (p.len(), *p));
                prefixes.dedup();
                if !prefixes.is_empty() {
                    orig.insert(proto, prefixes);
                }
            }
            if redist.contains_key(&Protocol::Ospf) {
                opt.keep_ospf_type = true;
            }
            opt.redistributed.insert(router.to_string(), redist);
            opt.originated.insert(router.to_string(), orig);

            let mut aggregates: Vec<Prefix> = conf
                .generated_routes
                .iter()
                .filter(|g| g.suppress_more_specifics && relevant(&g.network))
                .map(|g| g.network)
                .collect();
            aggregates.sort_by_key(|p| (p.len(), *p));
            if !aggregates.is_empty() && protos.contains(&Protocol::Bgp) {
                opt.suppressed_aggregates.insert(router.to_string(), aggregates);
            }

            let mut rid = BTreeSet::new();
            if let Some(bgp) = conf.bgp.as_ref() {
                if !(bgp.multipath_ebgp || bgp.multipath_ibgp) {
                    rid.insert(Protocol::Bgp);
                }
                if bgp.neighbors.values().any(|n| bgp.is_ibgp(n)) {
                    opt.need_bgp_internal.insert(router.to_string());
                }
            }
            if let Some(ospf) = conf.ospf.as_ref() {
                if ospf.max_paths <= 1 {
                    rid.insert(Protocol::Ospf);
                }
            }
            rid.retain(|p| protos.contains(p));
            opt.need_router_id.insert(router.to_string(), rid);
        }
        opt.keep_ospf_type |= usage.ospf_type || opt.ospf_areas.len() > 1;

        // merging
        if settings.enable_merging {
            for router in graph.routers() {
                let protos = opt.protocols[router].clone();
                for proto in protos.into_iter().filter(|p| p.is_dynamic()) {
                    if opt.export_mergeable(graph, router, proto) {
                        opt.can_merge_export.entry(router.to_string()).or_default().insert(proto);
                    }
                    if failures > 0 || !opt.originated(router, proto).is_empty() {
                        continue;
                    }
                    let edges: BTreeSet<EdgeId> = graph
                        .edges_of(router)
                        .iter()
                        .copied()
                        .filter(|e| opt.import_mergeable(graph, router, proto, *e))
                        .collect();
                    if !edges.is_empty() {
                        opt.can_merge_import_export
                            .entry(router.to_string())
                            .or_default()
                            .insert(proto, edges);
                    }
                }
            }
        }

        info!(
            "Optimizations: local-pref: {}, admin: {}, med: {}, ospf-type: {}, ospf-area: {}",
            opt.keep_local_pref,
            opt.keep_admin_dist,
            opt.keep_med,
            opt.keep_ospf_type,
            opt.keep_ospf_area
        );
        opt
    }

    fn export_mergeable(&self, graph: &Graph<'_>, router: &str, proto: Protocol) -> bool {
        let edges: Vec<EdgeId> = graph
            .edges_of(router)
            .iter()
            .copied()
            .filter(|e| self.exports_over(graph, router, proto, *e))
            .collect();
        if edges.len() < 2 {
            return !edges.is_empty();
        }
        match proto {
            Protocol::Ospf => {
                let keys: BTreeSet<(Option<u32>, Option<u32>)> = edges
                    .iter()
                    .map(|e| {
                        (
                            graph.peer_interface(*e).and_then(|i| i.ospf.as_ref()).map(|o| o.cost),
                            graph.interface(*e).ospf.as_ref().map(|o| o.area),
                        )
                    })
                    .collect();
                keys.len() == 1
            }
            Protocol::Bgp => {
                let conf = graph.config(router);
                let keys: Vec<(Option<&Vec<Statement>>, bool, bool)> = edges
                    .iter()
                    .filter_map(|e| graph.bgp_neighbor(*e).map(|n| (*e, n)))
                    .map(|(e, n)| {
                        let stmts = n
                            .export_policy
                            .as_ref()
                            .and_then(|p| conf.routing_policies.get(p))
                            .map(|p| &p.statements);
                        (stmts, graph.is_ibgp(e), n.send_community)
                    })
                    .collect();
                keys.windows(2).all(|w| w[0] == w[1])
            }
            _ => false,
        }
    }

    fn import_mergeable(&self, graph: &Graph<'_>, router: &str, proto: Protocol, e: EdgeId) -> bool {
        if !self.imports_over(graph, router, proto, e) {
            return false;
        }
        let (peer, back) = match (graph.edge(e).peer.as_deref(), graph.other_end(e)) {
            (Some(p), Some(b)) => (p, b),
            _ => return false,
        };
        if !self.exports_over(graph, peer, proto, back) {
            return false;
        }
        match proto {
            Protocol::Ospf => true,
            Protocol::Bgp => graph.bgp_neighbor(e).map(|n| n.import_policy.is_none()).unwrap_or(false),
            _ => false,
        }
    }

    /// The protocol imports routes over the edge.
    pub fn imports_over(&self, graph: &Graph<'_>, router: &str, proto: Protocol, e: EdgeId) -> bool {
        if !self.protocols(router).contains(&proto) {
            return false;
        }
        match proto {
            Protocol::Connected => self.connected_edges.contains(&e),
            Protocol::Static => self.static_edges.contains(&e),
            Protocol::Ospf => self.ospf_adjacency(graph, e),
            Protocol::Bgp => match graph.other_end(e) {
                Some(back) => self.bgp_session(graph, e, back),
                None => graph.bgp_neighbor(e).is_some(),
            },
        }
    }

    /// The protocol exports routes over the edge. Nothing is exported to the environment.
    pub fn exports_over(&self, graph: &Graph<'_>, router: &str, proto: Protocol, e: EdgeId) -> bool {
        if !self.protocols(router).contains(&proto) {
            return false;
        }
        match proto {
            Protocol::Ospf => self.ospf_adjacency(graph, e),
            Protocol::Bgp => graph.other_end(e).map(|b| self.bgp_session(graph, e, b)).unwrap_or(false),
            _ => false,
        }
    }

    fn ospf_adjacency(&self, graph: &Graph<'_>, e: EdgeId) -> bool {
        let active = |i: Option<&crate::netconf::Interface>| {
            i.and_then(|i| i.ospf.as_ref()).map(|o| !o.passive).unwrap_or(false)
        };
        let peer_runs = graph
            .edge(e)
            .peer
            .as_deref()
            .map(|p| self.protocols(p).contains(&Protocol::Ospf))
            .unwrap_or(false);
        peer_runs && active(Some(graph.interface(e))) && active(graph.peer_interface(e))
    }

    fn bgp_session(&self, graph: &Graph<'_>, e: EdgeId, back: EdgeId) -> bool {
        let peer_runs = graph
            .edge(e)
            .peer
            .as_deref()
            .map(|p| self.protocols(p).contains(&Protocol::Bgp))
            .unwrap_or(false);
        peer_runs && graph.bgp_neighbor(e).is_some() && graph.bgp_neighbor(back).is_some()
    }

    /// Active protocols of a router
    pub fn protocols(&self, router: &str) -> &[Protocol] {
        self.protocols.get(router).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// The router runs exactly one protocol, and its per-protocol best route is the overall best.
    pub fn has_single_protocol(&self, router: &str) -> bool {
        self.protocols(router).len() == 1
    }

    /// Local preference is encoded
    pub fn keep_local_pref(&self) -> bool {
        self.keep_local_pref
    }

    /// Administrative distance is encoded
    pub fn keep_admin_dist(&self) -> bool {
        self.keep_admin_dist
    }

    /// MED is encoded
    pub fn keep_med(&self) -> bool {
        self.keep_med
    }

    /// OSPF type is encoded
    pub fn keep_ospf_type(&self) -> bool {
        self.keep_ospf_type
    }

    /// OSPF area is encoded
    pub fn keep_ospf_area(&self) -> bool {
        self.keep_ospf_area
    }

    /// The router id breaks ties for this protocol on this router
    pub fn need_router_id(&self, router: &str, proto: Protocol) -> bool {
        self.need_router_id.get(router).map(|s| s.contains(&proto)).unwrap_or(false)
    }

    /// The router has iBGP sessions
    pub fn need_bgp_internal(&self, router: &str) -> bool {
        self.need_bgp_internal.contains(router)
    }

    /// All export edges of the protocol share one record
    pub fn can_merge_export(&self, router: &str, proto: Protocol) -> bool {
        self.can_merge_export.get(router).map(|s| s.contains(&proto)).unwrap_or(false)
    }

    /// The import over the edge reuses the neighbor's export record
    pub fn can_merge_import_export(&self, router: &str, proto: Protocol, e: EdgeId) -> bool {
        self.can_merge_import_export
            .get(router)
            .and_then(|m| m.get(&proto))
            .map(|s| s.contains(&e))
            .unwrap_or(false)
    }

    /// Protocols redistributed into `proto` on the router
    pub fn redistributed_protocols(&self, router: &str, proto: Protocol) -> Vec<Protocol> {
        self.redistributed
            .get(router)
            .and_then(|m| m.get(&proto))
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Relevant prefixes originated by the router through the protocol, least specific first.
    pub fn originated(&self, router: &str, proto: Protocol) -> &[Prefix] {
        self.originated
            .get(router)
            .and_then(|m| m.get(&proto))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Relevant aggregates suppressing more specific routes in BGP, least specific first.
    pub fn suppressed_aggregates(&self, router: &str) -> &[Prefix] {
        self.suppressed_aggregates.get(router).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All OSPF areas of the network
    pub fn ospf_areas(&self) -> &BTreeSet<u32> {
        &self.ospf_areas
    }

    /// Attributes encoded in records of the protocol. `None` describes the overall best route of
    /// the router.
    pub fn shape(&self, router: &str, proto: Option<Protocol>) -> RecordShape {
        let protos = self.protocols(router);
        let (bgp, ospf) = match proto {
            Some(p) => (p == Protocol::Bgp, p == Protocol::Ospf),
            None => (protos.contains(&Protocol::Bgp), protos.contains(&Protocol::Ospf)),
        };
        let router_id = match proto {
            Some(p) => self.need_router_id.values().any(|s| s.contains(&p)),
            None => false,
        };
        RecordShape {
            admin_dist: self.keep_admin_dist,
            local_pref: bgp && self.keep_local_pref,
            metric: match proto {
                Some(p) => p.is_dynamic(),
                None => protos.iter().any(|p| p.is_dynamic()),
            },
            med: bgp && self.keep_med,
            router_id,
            ospf_area: ospf && self.keep_ospf_area,
            ospf_type: ospf && self.keep_ospf_type,
            bgp_internal: bgp && !self.need_bgp_internal.is_empty(),
            history: proto.map(|p| self.history_protocols.contains(&p)).unwrap_or(false),
            communities: bgp,
        }
    }
}

/// Record which attributes are read or written by the policy
fn scan_usage(policy: &RoutingPolicy, usage: &mut PolicyUsage) {
    let mut stmts: Vec<&Statement> = Vec::new();
    let mut exprs: Vec<&BooleanExpr> = Vec::new();
    policy.walk(&mut |s| stmts.push(s), &mut |e| exprs.push(e));
    for s in stmts {
        match s {
            Statement::SetLocalPreference(_) => usage.local_pref = true,
            Statement::SetMetric(_) | Statement::SetMed(_) => usage.med = true,
            Statement::SetAdministrativeCost(_) => usage.admin_dist = true,
            Statement::SetOspfMetricType(_) => usage.ospf_type = true,
            _ => {}
        }
    }
    for e in exprs {
        match e {
            BooleanExpr::MatchLocalPreference(..) => usage.local_pref = true,
            BooleanExpr::MatchMetric(..) => usage.med = true,
            _ => {}
        }
    }
}

/// Protocols matched by the policies and all policies they call
fn matched_protocols(conf: &Configuration, roots: &[&str]) -> BTreeSet<Protocol> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut todo: Vec<&str> = roots.to_vec();
    let mut matched = BTreeSet::new();
    while let Some(name) = todo.pop() {
        if !visited.insert(name) {
            continue;
        }
        let policy = match conf.routing_policies.get(name) {
            Some(p) => p,
            None => continue,
        };
        policy.walk(&mut |_| {}, &mut |e| {
            if let BooleanExpr::MatchProtocol(ps) = e {
                matched.extend(ps.iter().copied())
            }
        });
        todo.extend(policy.callees());
    }
    matched
}
