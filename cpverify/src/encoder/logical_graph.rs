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

//! # Logical Graph
//!
//! For every router and active protocol, the logical graph contains one import and one export
//! [`LogicalEdge`] per graph edge on which the protocol exchanges routes, and one redistribution
//! edge per protocol redistributed into it. Every logical edge owns a record in the
//! [`RecordStore`]. Merged edges share their record: all export edges of a protocol without
//! peer-specific behavior, and imports that are an identity of the neighbor's export.

use super::community::CommunityRegistry;
use super::graph::{EdgeId, Graph};
use super::optimizations::Optimizations;
use super::symbolic_route::{RecordId, RecordKind, RecordStore};
use crate::netconf::Protocol;
use crate::smt::Context;

use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// Index of a logical edge
pub type LogicalEdgeId = usize;

/// Direction of a logical edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// Routes received by the router
    Import,
    /// Routes sent by the router
    Export,
}

/// Kind of a logical edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalEdgeKind {
    /// Route exchange over an interface
    Interface(EdgeId),
    /// Best route of another protocol on the same router
    Redistribution(Protocol),
}

/// Edge of the logical graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalEdge {
    /// Router owning the edge
    pub router: String,
    /// Protocol of the edge
    pub proto: Protocol,
    /// Direction
    pub direction: Direction,
    /// Interface or redistribution
    pub kind: LogicalEdgeKind,
    /// Record carried over the edge
    pub record: RecordId,
}

impl LogicalEdge {
    /// Graph edge of interface edges
    pub fn edge(&self) -> Option<EdgeId> {
        match self.kind {
            LogicalEdgeKind::Interface(e) => Some(e),
            LogicalEdgeKind::Redistribution(_) => None,
        }
    }
}

/// # Logical Graph
/// See the [module documentation](self).
#[derive(Debug, Clone, Default)]
pub struct LogicalGraph {
    edges: Vec<LogicalEdge>,
    imports: BTreeMap<(String, Protocol), Vec<LogicalEdgeId>>,
    exports: BTreeMap<(String, Protocol), Vec<LogicalEdgeId>>,
    redistributions: BTreeMap<(String, Protocol), Vec<LogicalEdgeId>>,
    export_of: BTreeMap<(EdgeId, Protocol), LogicalEdgeId>,
    other_end: BTreeMap<LogicalEdgeId, LogicalEdgeId>,
    environment: BTreeMap<LogicalEdgeId, RecordId>,
    merged: BTreeSet<LogicalEdgeId>,
}

impl LogicalGraph {
    /// Build the logical graph and allocate all import, export, environment and redistribution
    /// records. `prefix` is prepended to every record name.
    pub fn build(
        ctx: &mut Context,
        graph: &Graph<'_>,
        opt: &Optimizations,
        registry: &CommunityRegistry,
        records: &mut RecordStore,
        prefix: &str,
    ) -> Self {
        let mut lg = Self::default();

        // exports first, such that imports can reuse them
        for router in graph.routers() {
            for proto in opt.protocols(router).iter().copied() {
                let shape = opt.shape(router, Some(proto));
                let edges: Vec<EdgeId> = graph
                    .edges_of(router)
                    .iter()
                    .copied()
                    .filter(|e| opt.exports_over(graph, router, proto, *e))
                    .collect();
                if edges.is_empty() {
                    continue;
                }
                let mut shared = None;
                for e in edges {
                    let record = match (opt.can_merge_export(router, proto), shared) {
                        (true, Some(r)) => r,
                        (merge, _) => {
                            let name = if merge {
                                format!("{}{}_{}_EXPORT", prefix, router, proto.name())
                            } else {
                                format!(
                                    "{}{}_{}_EXPORT_{}",
                                    prefix,
                                    router,
                                    proto.name(),
                                    graph.edge(e).interface
                                )
                            };
                            let r = records.alloc(ctx, name, Some(proto), RecordKind::Export, shape, registry);
                            if merge {
                                shared = Some(r);
                            }
                            r
                        }
                    };
                    let id = lg.push(router, proto, Direction::Export, LogicalEdgeKind::Interface(e), record);
                    lg.export_of.insert((e, proto), id);
                }
            }
        }

        for router in graph.routers() {
            for proto in opt.protocols(router).iter().copied() {
                let shape = opt.shape(router, Some(proto));
                for e in graph.edges_of(router).iter().copied() {
                    if !opt.imports_over(graph, router, proto, e) {
                        continue;
                    }
                    let iface = &graph.edge(e).interface;
                    let import_name = format!("{}{}_{}_IMPORT_{}", prefix, router, proto.name(), iface);
                    let peer_export = graph
                        .other_end(e)
                        .and_then(|back| lg.export_of.get(&(back, proto)).copied());
                    let merge = opt.can_merge_import_export(router, proto, e);
                    let record = match (merge, peer_export) {
                        (true, Some(pe)) => lg.edges[pe].record,
                        _ => records.alloc(ctx, import_name, Some(proto), RecordKind::Import, shape, registry),
                    };
                    let id = lg.push(router, proto, Direction::Import, LogicalEdgeKind::Interface(e), record);
                    if merge && peer_export.is_some() {
                        lg.merged.insert(id);
                    }
                    if let Some(pe) = peer_export {
                        lg.other_end.insert(id, pe);
                    } else if proto == Protocol::Bgp && graph.edge(e).is_environment() {
                        let env = records.alloc(
                            ctx,
                            format!("{}{}_BGP_ENV_{}", prefix, router, iface),
                            Some(proto),
                            RecordKind::Environment,
                            shape,
                            registry,
                        );
                        lg.environment.insert(id, env);
                    }
                }

                for from in opt.redistributed_protocols(router, proto) {
                    let record = records.alloc(
                        ctx,
                        format!("{}{}_{}_REDIST_{}", prefix, router, proto.name(), from.name()),
                        Some(proto),
                        RecordKind::Redistribution,
                        shape,
                        registry,
                    );
                    let id = lg.edges.len();
                    lg.edges.push(LogicalEdge {
                        router: router.to_string(),
                        proto,
                        direction: Direction::Import,
                        kind: LogicalEdgeKind::Redistribution(from),
                        record,
                    });
                    lg.redistributions.entry((router.to_string(), proto)).or_default().push(id);
                }
            }
        }

        debug!(
            "Logical graph: {} edges, {} merged imports, {} environment records",
            lg.edges.len(),
            lg.merged.len(),
            lg.environment.len()
        );
        lg
    }

    fn push(
        &mut self,
        router: &str,
        proto: Protocol,
        direction: Direction,
        kind: LogicalEdgeKind,
        record: RecordId,
    ) -> LogicalEdgeId {
        let id = self.edges.len();
        self.edges.push(LogicalEdge { router: router.to_string(), proto, direction, kind, record });
        let map = match direction {
            Direction::Import => &mut self.imports,
            Direction::Export => &mut self.exports,
        };
        map.entry((router.to_string(), proto)).or_default().push(id);
        id
    }

    /// Access a logical edge
    pub fn edge(&self, id: LogicalEdgeId) -> &LogicalEdge {
        &self.edges[id]
    }

    /// All logical edges
    pub fn edges(&self) -> &[LogicalEdge] {
        &self.edges
    }

    /// Interface import edges of the protocol on the router
    pub fn imports(&self, router: &str, proto: Protocol) -> &[LogicalEdgeId] {
        self.imports.get(&(router.to_string(), proto)).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Export edges of the protocol on the router
    pub fn exports(&self, router: &str, proto: Protocol) -> &[LogicalEdgeId] {
        self.exports.get(&(router.to_string(), proto)).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Redistribution edges into the protocol on the router
    pub fn redistributions(&self, router: &str, proto: Protocol) -> &[LogicalEdgeId] {
        self.redistributions
            .get(&(router.to_string(), proto))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Export edge of the neighbor feeding an import edge
    pub fn other_end(&self, import: LogicalEdgeId) -> Option<LogicalEdgeId> {
        self.other_end.get(&import).copied()
    }

    /// Environment record feeding an import edge
    pub fn environment(&self, import: LogicalEdgeId) -> Option<RecordId> {
        self.environment.get(&import).copied()
    }

    /// All environment records, with their import edge
    pub fn environment_records(&self) -> impl Iterator<Item = (LogicalEdgeId, RecordId)> + '_ {
        self.environment.iter().map(|(l, r)| (*l, *r))
    }

    /// The import edge shares the record of the neighbor's export edge
    pub fn is_merged(&self, import: LogicalEdgeId) -> bool {
        self.merged.contains(&import)
    }
}
