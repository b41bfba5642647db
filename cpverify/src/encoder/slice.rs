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

//! # Encoder Slice
//!
//! One complete encoding of the network for a set of packets (the header space of the slice). A
//! slice allocates the packet variables, the link failure variables, all records of the logical
//! graph, and constrains them by the transfer functions, the best route selection and the
//! forwarding decisions. Several slices can live in the same [`Context`]; their variables are
//! distinguished by the name of the slice.

use super::community::CommunityRegistry;
use super::decision::{is_chosen, select_best};
use super::graph::{EdgeId, Graph};
use super::logical_graph::{LogicalEdgeId, LogicalEdgeKind, LogicalGraph};
use super::optimizations::Optimizations;
use super::packet::SymbolicPacket;
use super::symbolic_route::{Attr, IntField, RecordId, RecordKind, RecordStore, SymbolicRoute};
use super::transfer::{TransferFunction, TransferKind, TransferParams};
use super::{EncoderError, Settings};
use crate::netconf::{Configuration, HeaderSpace, Interface, Protocol, RoutingPolicy};
use crate::smt::{BoolExpr, Context, IntExpr};

use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// # Encoder Slice
/// See the [module documentation](self).
#[derive(Debug)]
pub struct EncoderSlice<'a> {
    name: String,
    graph: &'a Graph<'a>,
    header_space: HeaderSpace,
    failures: usize,
    opt: Optimizations,
    registry: CommunityRegistry,
    logical: LogicalGraph,
    records: RecordStore,
    packet: SymbolicPacket,
    failed: BTreeMap<EdgeId, BoolExpr>,
    failure_vars: Vec<(EdgeId, BoolExpr)>,
    best: BTreeMap<(String, Protocol), RecordId>,
    best_overall: BTreeMap<String, RecordId>,
    choice: BTreeMap<LogicalEdgeId, BoolExpr>,
    control_forwarding: BTreeMap<EdgeId, BoolExpr>,
    data_forwarding: BTreeMap<EdgeId, BoolExpr>,
}

impl<'a> EncoderSlice<'a> {
    /// Encode the network for the packets of the header space, with at most `failures` failed
    /// links. All variables are prefixed with `name`.
    pub fn new(
        ctx: &mut Context,
        graph: &'a Graph<'a>,
        header_space: HeaderSpace,
        failures: usize,
        settings: &Settings,
        name: &str,
    ) -> Result<Self, EncoderError> {
        let prefix = if name.is_empty() { String::new() } else { format!("{}_", name) };
        info!("Encoding slice {:?} with {} failures", name, failures);

        let registry = CommunityRegistry::from_network(graph.network())?;
        let opt = Optimizations::compute(graph, &header_space, settings, failures);

        let packet = SymbolicPacket::new(ctx, &prefix);
        ctx.add(packet.bounds());
        ctx.add(packet.matches(&header_space));

        let (failed, failure_vars) = failure_variables(ctx, graph, failures, &prefix);

        let mut records = RecordStore::new();
        let logical = LogicalGraph::build(ctx, graph, &opt, &registry, &mut records, &prefix);

        let mut best = BTreeMap::new();
        let mut best_overall = BTreeMap::new();
        for router in graph.routers() {
            for proto in opt.protocols(router).iter().copied() {
                let id = records.alloc(
                    ctx,
                    format!("{}{}_{}_BEST", prefix, router, proto.name()),
                    Some(proto),
                    RecordKind::BestPerProtocol,
                    opt.shape(router, Some(proto)),
                    &registry,
                );
                best.insert((router.to_string(), proto), id);
            }
            if opt.protocols(router).len() > 1 {
                let id = records.alloc(
                    ctx,
                    format!("{}{}_OVERALL_BEST", prefix, router),
                    None,
                    RecordKind::BestOverall,
                    opt.shape(router, None),
                    &registry,
                );
                best_overall.insert(router.to_string(), id);
            }
        }

        let mut slice = Self {
            name: name.to_string(),
            graph,
            header_space,
            failures,
            opt,
            registry,
            logical,
            records,
            packet,
            failed,
            failure_vars,
            best,
            best_overall,
            choice: BTreeMap::new(),
            control_forwarding: BTreeMap::new(),
            data_forwarding: BTreeMap::new(),
        };

        slice.add_record_constraints(ctx);
        slice.add_environment_constraints(ctx);
        slice.add_transfer_functions(ctx, &prefix)?;
        slice.choice = slice.add_best_routes(ctx, &prefix);
        let (cf, df) = slice.add_forwarding(ctx, &prefix)?;
        slice.control_forwarding = cf;
        slice.data_forwarding = df;

        debug!(
            "Slice {:?}: {} records, {} variables, {} constraints so far",
            name,
            slice.records.len(),
            ctx.num_variables(),
            ctx.num_constraints()
        );
        Ok(slice)
    }

    /// Domain, default and community constraints of every record
    fn add_record_constraints(&self, ctx: &mut Context) {
        for (_, r) in self.records.iter() {
            ctx.add(r.bounds(self.opt.ospf_areas()));
            ctx.add(r.unused_defaults());
            ctx.add(r.community_dependencies(&self.registry));
        }
    }

    /// Routes announced by the environment are free, apart from the attributes fixed by the
    /// session type.
    fn add_environment_constraints(&self, ctx: &mut Context) {
        for (le, rec) in self.logical.environment_records() {
            let e = match self.logical.edge(le).edge() {
                Some(e) => e,
                None => continue,
            };
            let ibgp = self.graph.is_ibgp(e);
            let r = self.records.get(rec);
            let mut cs = Vec::new();
            if let Attr::Present(b) = &r.bgp_internal {
                cs.push(b.iff(&BoolExpr::constant(ibgp)));
            }
            if let Attr::Present(a) = &r.admin_dist {
                let admin = if ibgp { Protocol::IBGP_ADMIN_DISTANCE } else { Protocol::Bgp.default_admin_distance() };
                cs.push(a.equals(&IntExpr::constant(admin)));
            }
            if let (Attr::Present(lp), false) = (&r.local_pref, ibgp) {
                cs.push(lp.equals(&IntExpr::constant(r.default_value(IntField::LocalPref))));
            }
            if let Attr::Present(h) = &r.history {
                cs.push(h.equals(&IntExpr::constant(Protocol::Bgp.index())));
            }
            ctx.add(r.permitted.implies(&BoolExpr::and_all(cs)));
        }
    }

    fn add_transfer_functions(&self, ctx: &mut Context, prefix: &str) -> Result<(), EncoderError> {
        let graph = self.graph;
        for router in graph.routers() {
            let conf = graph.config(router);
            for proto in self.opt.protocols(router).iter().copied() {
                let best = self.records.get(self.best[&(router.to_string(), proto)]);

                let mut done: BTreeSet<RecordId> = BTreeSet::new();
                for le in self.logical.exports(router, proto).iter().copied() {
                    let ledge = self.logical.edge(le);
                    let e = match ledge.edge() {
                        Some(e) => e,
                        None => continue,
                    };
                    if !done.insert(ledge.record) {
                        continue;
                    }
                    let output = self.records.get(ledge.record);
                    let params = self.export_params(router, proto, e, &output.name)?;
                    let input = self.export_input(router, proto, best);
                    TransferFunction::new(ctx, conf, &self.registry, &self.packet, params)
                        .compute(&input, output)?;
                }

                for le in self.logical.imports(router, proto).iter().copied() {
                    if self.logical.is_merged(le) {
                        continue;
                    }
                    let ledge = self.logical.edge(le);
                    let e = match ledge.edge() {
                        Some(e) => e,
                        None => continue,
                    };
                    let output = self.records.get(ledge.record);
                    match proto {
                        Protocol::Connected => self.connected_import(ctx, e, output),
                        Protocol::Static => self.static_import(ctx, e, output),
                        Protocol::Ospf | Protocol::Bgp => {
                            let input = match (self.logical.other_end(le), self.logical.environment(le)) {
                                (Some(pe), _) => self.records.get(self.logical.edge(pe).record),
                                (None, Some(env)) => self.records.get(env),
                                (None, None) => continue,
                            };
                            let policy = match (proto, graph.bgp_neighbor(e)) {
                                (Protocol::Bgp, Some(n)) => self.policy(router, n.import_policy.as_deref())?,
                                _ => None,
                            };
                            let mut params = TransferParams::new(output.name.clone(), proto, TransferKind::Import);
                            params.policy = policy;
                            params.guard = self.failed(e).not();
                            TransferFunction::new(ctx, conf, &self.registry, &self.packet, params)
                                .compute(input, output)?;
                        }
                    }
                }

                for le in self.logical.redistributions(router, proto).iter().copied() {
                    let ledge = self.logical.edge(le);
                    let from = match ledge.kind {
                        LogicalEdgeKind::Redistribution(from) => from,
                        LogicalEdgeKind::Interface(_) => continue,
                    };
                    let input = match self.best.get(&(router.to_string(), from)) {
                        Some(id) => self.records.get(*id),
                        None => continue,
                    };
                    let output = self.records.get(ledge.record);
                    let mut params = TransferParams::new(
                        output.name.clone(),
                        proto,
                        TransferKind::Redistribution { from },
                    );
                    let name = match proto {
                        Protocol::Ospf => conf.ospf.as_ref().and_then(|o| o.export_policy.as_deref()),
                        Protocol::Bgp => bgp_redistribution_policy(router, conf),
                        _ => None,
                    };
                    params.policy = self.policy(router, name)?;
                    TransferFunction::new(ctx, conf, &self.registry, &self.packet, params)
                        .compute(input, output)?;
                }
            }
            trace!("{}{}: transfer functions done", prefix, router);
        }
        Ok(())
    }

    fn policy(&self, router: &str, name: Option<&str>) -> Result<Option<&'a RoutingPolicy>, EncoderError> {
        match name {
            None => Ok(None),
            Some(n) => self.graph.config(router).routing_policies.get(n).map(Some).ok_or_else(|| {
                EncoderError::UndefinedPolicy(router.to_string(), n.to_string())
            }),
        }
    }

    fn export_params(
        &self,
        router: &str,
        proto: Protocol,
        e: EdgeId,
        name: &str,
    ) -> Result<TransferParams<'a>, EncoderError> {
        let conf = self.graph.config(router);
        let mut params = TransferParams::new(name, proto, TransferKind::Import);
        match proto {
            Protocol::Ospf => {
                let cost = self
                    .graph
                    .peer_interface(e)
                    .and_then(|i| i.ospf.as_ref())
                    .map(|o| o.cost as i64)
                    .unwrap_or(1);
                params.cost = cost;
                params.kind = TransferKind::Export {
                    ibgp: false,
                    reflector: false,
                    send_community: false,
                    router_id: conf.ospf.as_ref().map(|o| o.router_id.as_u32() as i64),
                    area: self.graph.interface(e).ospf.as_ref().map(|o| o.area),
                };
            }
            Protocol::Bgp => {
                let bgp = conf.bgp.as_ref();
                let neighbor = self.graph.bgp_neighbor(e);
                let ibgp = self.graph.is_ibgp(e);
                params.cost = if ibgp { 0 } else { 1 };
                params.kind = TransferKind::Export {
                    ibgp,
                    reflector: bgp.map(|b| b.is_route_reflector()).unwrap_or(false),
                    send_community: neighbor.map(|n| n.send_community).unwrap_or(true),
                    router_id: bgp.map(|b| b.router_id.as_u32() as i64),
                    area: None,
                };
                params.policy = self.policy(router, neighbor.and_then(|n| n.export_policy.as_deref()))?;
                params.aggregates = self.opt.suppressed_aggregates(router).to_vec();
            }
            Protocol::Connected | Protocol::Static => {}
        }
        Ok(params)
    }

    /// Input of the export transfer functions: the best route of the protocol, replaced by a route
    /// originated on this router whenever an originated prefix covers the destination and the
    /// best route is not more specific.
    fn export_input(&self, router: &str, proto: Protocol, best: &SymbolicRoute) -> SymbolicRoute {
        let prefixes = self.opt.originated(router, proto);
        if prefixes.is_empty() {
            return best.clone();
        }
        let conf = self.graph.config(router);
        let mut plen = IntExpr::constant(0);
        let mut area = IntExpr::constant(0);
        for p in prefixes {
            let inside = self.packet.dst_in(p);
            plen = inside.ite_int(&IntExpr::constant(p.len() as i64), &plen);
            let a = conf
                .active_interfaces()
                .find(|i| i.prefix() == Some(*p))
                .and_then(|i| i.ospf.as_ref())
                .map(|o| o.area)
                .unwrap_or(0);
            area = inside.ite_int(&IntExpr::constant(a as i64), &area);
        }
        let originated = BoolExpr::or_all(prefixes.iter().map(|p| self.packet.dst_in(p)));
        let more_specific = best.permitted.and(&best.value(IntField::PrefixLength).gt(&plen));
        let use_orig = originated.and(&more_specific.not());

        let mut r = best.clone();
        r.permitted = originated.or(&best.permitted);
        for f in IntField::ALL.iter() {
            if !best.int_attr(*f).is_present() {
                continue;
            }
            let value = match f {
                IntField::PrefixLength => plen.clone(),
                IntField::OspfArea => area.clone(),
                _ => IntExpr::constant(best.default_value(*f)),
            };
            r.set_int_attr(*f, Attr::Present(use_orig.ite_int(&value, &best.value(*f))));
        }
        if let Attr::Present(b) = &best.bgp_internal {
            r.bgp_internal = Attr::Present(use_orig.ite(&BoolExpr::ff(), b));
        }
        for c in r.communities.values_mut() {
            *c = use_orig.ite(&BoolExpr::ff(), c);
        }
        r
    }

    /// Connected routes exist for destinations inside the subnet of the interface.
    fn connected_import(&self, ctx: &mut Context, e: EdgeId, output: &SymbolicRoute) {
        let subnet = match self.graph.interface(e).prefix() {
            Some(p) => p,
            None => return,
        };
        ctx.add(output.permitted.iff(&self.packet.dst_in(&subnet).and(&self.failed(e).not())));
        ctx.add(output.permitted.implies(&local_route(output, IntExpr::constant(subnet.len() as i64), None)));
    }

    /// Static routes exist if the destination is covered by one of the routes using this edge.
    /// The longest matching route decides the prefix length and administrative distance.
    fn static_import(&self, ctx: &mut Context, e: EdgeId, output: &SymbolicRoute) {
        let mut routes: Vec<_> = self.graph.static_routes(e).iter().collect();
        routes.sort_by_key(|r| (r.network.len(), std::cmp::Reverse(r.admin_cost)));
        let mut plen = IntExpr::constant(0);
        let mut admin = IntExpr::constant(Protocol::Static.default_admin_distance());
        for r in routes.iter() {
            let inside = self.packet.dst_in(&r.network);
            plen = inside.ite_int(&IntExpr::constant(r.network.len() as i64), &plen);
            admin = inside.ite_int(&IntExpr::constant(r.admin_cost as i64), &admin);
        }
        let matches = BoolExpr::or_all(routes.iter().map(|r| self.packet.dst_in(&r.network)));
        ctx.add(output.permitted.iff(&matches.and(&self.failed(e).not())));
        ctx.add(output.permitted.implies(&local_route(output, plen, Some(admin))));
    }

    fn add_best_routes(&self, ctx: &mut Context, prefix: &str) -> BTreeMap<LogicalEdgeId, BoolExpr> {
        let mut choice = BTreeMap::new();
        for router in self.graph.routers() {
            for proto in self.opt.protocols(router).iter().copied() {
                let best = self.records.get(self.best[&(router.to_string(), proto)]);
                let imports = self.logical.imports(router, proto);
                let candidates: Vec<&SymbolicRoute> = imports
                    .iter()
                    .chain(self.logical.redistributions(router, proto).iter())
                    .map(|le| self.records.get(self.logical.edge(*le).record))
                    .collect();
                select_best(ctx, best, &candidates, Some(proto), self.opt.need_router_id(router, proto));

                for le in imports.iter().copied() {
                    let ledge = self.logical.edge(le);
                    let iface = match ledge.edge() {
                        Some(e) => &self.graph.edge(e).interface,
                        None => continue,
                    };
                    let var = ctx.bool_var(&format!("{}{}_{}_choice_{}", prefix, router, proto.name(), iface));
                    ctx.add(var.iff(&is_chosen(best, self.records.get(ledge.record))));
                    choice.insert(le, var);
                }
            }
            if let Some(overall) = self.best_overall.get(router) {
                let overall = self.records.get(*overall);
                let candidates: Vec<&SymbolicRoute> = self
                    .opt
                    .protocols(router)
                    .iter()
                    .map(|p| self.records.get(self.best[&(router.to_string(), *p)]))
                    .collect();
                select_best(ctx, overall, &candidates, None, false);
            }
        }
        choice
    }

    #[allow(clippy::type_complexity)]
    fn add_forwarding(
        &self,
        ctx: &mut Context,
        prefix: &str,
    ) -> Result<(BTreeMap<EdgeId, BoolExpr>, BTreeMap<EdgeId, BoolExpr>), EncoderError> {
        let mut cf_map = BTreeMap::new();
        let mut df_map = BTreeMap::new();
        let mut acl_cache: BTreeMap<(String, String), BoolExpr> = BTreeMap::new();
        for router in self.graph.routers() {
            let overall = self.best_overall.get(router).map(|id| self.records.get(*id));
            for e in self.graph.edges_of(router).iter().copied() {
                let mut terms = Vec::new();
                for proto in self.opt.protocols(router).iter().copied() {
                    let best = self.records.get(self.best[&(router.to_string(), proto)]);
                    for le in self.logical.imports(router, proto).iter().copied() {
                        if self.logical.edge(le).edge() != Some(e) {
                            continue;
                        }
                        let chosen = self.choice.get(&le).cloned().unwrap_or_else(BoolExpr::ff);
                        terms.push(match overall {
                            Some(o) => BoolExpr::and_all(
                                std::iter::once(chosen)
                                    .chain(std::iter::once(o.permitted.clone()))
                                    .chain(o.equal_attributes(best, true)),
                            ),
                            None => chosen,
                        });
                    }
                }
                let iface = &self.graph.edge(e).interface;
                let cf = ctx.bool_var(&format!("{}{}_CONTROL_FORWARDING_{}", prefix, router, iface));
                ctx.add(cf.iff(&BoolExpr::or_all(terms)));

                let out_acl = self.acl(&mut acl_cache, router, self.graph.interface(e), false)?;
                let in_acl = match (self.graph.edge(e).peer.as_deref(), self.graph.peer_interface(e)) {
                    (Some(peer), Some(pi)) => self.acl(&mut acl_cache, peer, pi, true)?,
                    _ => BoolExpr::tt(),
                };
                let df = ctx.bool_var(&format!("{}{}_DATA_FORWARDING_{}", prefix, router, iface));
                ctx.add(df.iff(&BoolExpr::and_all(vec![
                    cf.clone(),
                    out_acl,
                    in_acl,
                    self.failed(e).not(),
                ])));
                cf_map.insert(e, cf);
                df_map.insert(e, df);
            }
        }
        Ok((cf_map, df_map))
    }

    fn acl(
        &self,
        cache: &mut BTreeMap<(String, String), BoolExpr>,
        router: &str,
        iface: &Interface,
        incoming: bool,
    ) -> Result<BoolExpr, EncoderError> {
        let name = match if incoming { &iface.incoming_filter } else { &iface.outgoing_filter } {
            Some(n) => n,
            None => return Ok(BoolExpr::tt()),
        };
        let key = (router.to_string(), name.clone());
        if let Some(x) = cache.get(&key) {
            return Ok(x.clone());
        }
        let acl = self
            .graph
            .config(router)
            .ip_access_lists
            .get(name)
            .ok_or_else(|| EncoderError::UndefinedAcl(router.to_string(), name.clone()))?;
        let permitted = self.packet.permitted_by(acl);
        cache.insert(key, permitted.clone());
        Ok(permitted)
    }

    /// Name of the slice
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topology of the slice
    pub fn graph(&self) -> &'a Graph<'a> {
        self.graph
    }

    /// Packets of the slice
    pub fn header_space(&self) -> &HeaderSpace {
        &self.header_space
    }

    /// Maximal number of failed links
    pub fn max_failures(&self) -> usize {
        self.failures
    }

    /// Result of the static analysis
    pub fn optimizations(&self) -> &Optimizations {
        &self.opt
    }

    /// Community variables
    pub fn registry(&self) -> &CommunityRegistry {
        &self.registry
    }

    /// The logical graph
    pub fn logical_graph(&self) -> &LogicalGraph {
        &self.logical
    }

    /// All records
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Packet variables
    pub fn packet(&self) -> &SymbolicPacket {
        &self.packet
    }

    /// The edge failed. Always `false` if no failures are allowed.
    pub fn failed(&self, e: EdgeId) -> BoolExpr {
        self.failed.get(&e).cloned().unwrap_or_else(BoolExpr::ff)
    }

    /// Failure variables, one per link and per environment edge
    pub fn failure_variables(&self) -> &[(EdgeId, BoolExpr)] {
        &self.failure_vars
    }

    /// Best route of a protocol on a router
    pub fn best_per_protocol(&self, router: &str, proto: Protocol) -> Option<&SymbolicRoute> {
        self.best.get(&(router.to_string(), proto)).map(|id| self.records.get(*id))
    }

    /// Best route of a router across all protocols
    pub fn best_overall(&self, router: &str) -> Option<&SymbolicRoute> {
        match self.best_overall.get(router) {
            Some(id) => Some(self.records.get(*id)),
            None => self
                .opt
                .protocols(router)
                .first()
                .and_then(|p| self.best_per_protocol(router, *p)),
        }
    }

    /// The import over the logical edge is the best route of its protocol
    pub fn choice(&self, le: LogicalEdgeId) -> Option<&BoolExpr> {
        self.choice.get(&le)
    }

    /// The control plane forwards the packet over the edge
    pub fn control_forwarding(&self, e: EdgeId) -> BoolExpr {
        self.control_forwarding.get(&e).cloned().unwrap_or_else(BoolExpr::ff)
    }

    /// The packet is forwarded over the edge, after access lists and failures
    pub fn data_forwarding(&self, e: EdgeId) -> BoolExpr {
        self.data_forwarding.get(&e).cloned().unwrap_or_else(BoolExpr::ff)
    }

    /// Environment records, with the graph edge they are announced on
    pub fn environment_records(&self) -> Vec<(EdgeId, &SymbolicRoute)> {
        self.logical
            .environment_records()
            .filter_map(|(le, rec)| self.logical.edge(le).edge().map(|e| (e, self.records.get(rec))))
            .collect()
    }
}

/// Attributes of a route originated by the router itself. Everything except the prefix length and
/// the administrative distance carries the default value.
fn local_route(r: &SymbolicRoute, plen: IntExpr, admin: Option<IntExpr>) -> BoolExpr {
    let mut cs = Vec::new();
    for f in IntField::ALL.iter() {
        let x = match r.int_attr(*f) {
            Attr::Present(x) => x,
            Attr::Elided => continue,
        };
        let value = match (f, &admin) {
            (IntField::PrefixLength, _) => plen.clone(),
            (IntField::AdminDist, Some(a)) => a.clone(),
            _ => IntExpr::constant(r.default_value(*f)),
        };
        cs.push(x.equals(&value));
    }
    if let Attr::Present(b) = &r.bgp_internal {
        cs.push(b.not());
    }
    cs.extend(r.communities.values().map(|c| c.not()));
    BoolExpr::and_all(cs)
}

/// Policy filtering the routes redistributed into BGP: the export policy of the BGP neighbors.
/// If the neighbors disagree, the first one in address order is used.
fn bgp_redistribution_policy<'c>(router: &str, conf: &'c Configuration) -> Option<&'c str> {
    let mut names = conf
        .bgp
        .iter()
        .flat_map(|b| b.neighbors.values())
        .filter_map(|n| n.export_policy.as_deref());
    let first = names.next()?;
    if names.any(|n| n != first) {
        warn!(
            "{}: BGP neighbors use different export policies, filtering redistributed routes with {}",
            router, first
        );
    }
    Some(first)
}

/// One failure variable per link (shared by both directions) and per environment edge, at most
/// `k` of them true.
fn failure_variables(
    ctx: &mut Context,
    graph: &Graph<'_>,
    k: usize,
    prefix: &str,
) -> (BTreeMap<EdgeId, BoolExpr>, Vec<(EdgeId, BoolExpr)>) {
    let mut failed = BTreeMap::new();
    let mut vars = Vec::new();
    if k == 0 {
        return (failed, vars);
    }
    for (id, edge) in graph.edges().iter().enumerate() {
        if let Some(v) = graph.other_end(id).and_then(|back| failed.get(&back).cloned()) {
            failed.insert(id, v);
            continue;
        }
        let v = ctx.bool_var(&format!("{}failed_{}", prefix, edge.name()));
        failed.insert(id, v.clone());
        vars.push((id, v));
    }
    let sum = vars.iter().fold(IntExpr::constant(0), |acc, (_, v)| {
        acc.add(&v.ite_int(&IntExpr::constant(1), &IntExpr::constant(0)))
    });
    ctx.add(sum.le(&IntExpr::constant(k as i64)));
    (failed, vars)
}
