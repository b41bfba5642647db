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

//! # Topology Graph
//!
//! Joins the interfaces of every router with the physical links. Every active interface becomes
//! one directed [`GraphEdge`]. Interfaces connected to exactly one other configured router become
//! peered edges (created in both directions, and paired through [`Graph::other_end`]); all other
//! interfaces with an address become environment edges.

use crate::netconf::{
    BgpNeighbor, ConfigError, Configuration, Interface, Ip, Network, StaticRoute,
};

use log::*;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Index of a [`GraphEdge`] in the [`Graph`]
pub type EdgeId = usize;

/// Directed edge from an interface of a router towards its peer (if any)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    /// Router owning the interface
    pub router: String,
    /// Name of the local interface
    pub interface: String,
    /// Peer router, or `None` for environment edges
    pub peer: Option<String>,
    /// Interface of the peer router
    pub peer_interface: Option<String>,
}

impl GraphEdge {
    /// Returns `true` if the edge connects the router to the environment
    pub fn is_environment(&self) -> bool {
        self.peer.is_none()
    }

    /// Short name of the edge, used in variable names
    pub fn name(&self) -> String {
        format!("{}_{}", self.router, self.interface)
    }
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.peer, &self.peer_interface) {
            (Some(p), Some(pi)) => {
                write!(f, "{},{} --> {},{}", self.router, self.interface, p, pi)
            }
            _ => write!(f, "{},{} --> _", self.router, self.interface),
        }
    }
}

/// # Topology Graph
/// See the [module documentation](self).
#[derive(Debug)]
pub struct Graph<'n> {
    network: &'n Network,
    edges: Vec<GraphEdge>,
    edge_map: BTreeMap<String, Vec<EdgeId>>,
    other_end: BTreeMap<EdgeId, EdgeId>,
    static_routes: BTreeMap<EdgeId, Vec<StaticRoute>>,
    bgp_neighbors: BTreeMap<EdgeId, BgpNeighbor>,
    adjacency: DiGraph<String, EdgeId>,
}

impl<'n> Graph<'n> {
    /// Build the graph of a network
    pub fn new(network: &'n Network) -> Result<Self, ConfigError> {
        let configs = network.configs();

        // all remote endpoints of every interface
        let mut remote: BTreeMap<(&str, &str), Vec<(&str, &str)>> = BTreeMap::new();
        for link in network.links() {
            for (end, other) in [(&link.a, &link.b), (&link.b, &link.a)] {
                if let Some(c) = configs.get(&end.router) {
                    if !c.interfaces.contains_key(&end.interface) {
                        return Err(ConfigError::UnknownInterface(
                            end.router.clone(),
                            end.interface.clone(),
                        ));
                    }
                }
                remote
                    .entry((end.router.as_str(), end.interface.as_str()))
                    .or_default()
                    .push((other.router.as_str(), other.interface.as_str()));
            }
        }

        let mut edges: Vec<GraphEdge> = Vec::new();
        let mut edge_map: BTreeMap<String, Vec<EdgeId>> = BTreeMap::new();
        let mut lookup: BTreeMap<(String, String), EdgeId> = BTreeMap::new();

        for (router, conf) in configs.iter() {
            edge_map.insert(router.clone(), Vec::new());
            for iface in conf.active_interfaces() {
                let remotes: Vec<(&str, &str)> = remote
                    .get(&(router.as_str(), iface.name.as_str()))
                    .map(|r| {
                        r.iter()
                            .copied()
                            .filter(|(pr, pi)| match configs.get(*pr) {
                                Some(pc) => pc.interfaces.get(*pi).map(|i| i.active).unwrap_or(false),
                                None => true,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let (peer, peer_interface) = match remotes.as_slice() {
                    [(pr, pi)] if configs.contains_key(*pr) => {
                        (Some(pr.to_string()), Some(pi.to_string()))
                    }
                    [] | [_] => (None, None),
                    _ => {
                        warn!(
                            "Interface {} of {} is connected to a shared segment of {} routers. \
                             Treating it as an environment edge.",
                            iface.name,
                            router,
                            remotes.len()
                        );
                        (None, None)
                    }
                };
                if peer.is_none() && iface.address.is_none() {
                    debug!("Skipping interface {} of {} without address", iface.name, router);
                    continue;
                }
                let id = edges.len();
                edges.push(GraphEdge {
                    router: router.clone(),
                    interface: iface.name.clone(),
                    peer,
                    peer_interface,
                });
                lookup.insert((router.clone(), iface.name.clone()), id);
                edge_map.entry(router.clone()).or_default().push(id);
            }
        }

        // pair the edges
        let mut other_end: BTreeMap<EdgeId, EdgeId> = BTreeMap::new();
        for (id, edge) in edges.iter_mut().enumerate() {
            let key = match (&edge.peer, &edge.peer_interface) {
                (Some(p), Some(pi)) => (p.clone(), pi.clone()),
                _ => continue,
            };
            match lookup.get(&key) {
                Some(other) => {
                    other_end.insert(id, *other);
                }
                None => {
                    warn!("Edge {} has no reverse edge. Treating it as environment edge.", edge);
                    edge.peer = None;
                    edge.peer_interface = None;
                }
            }
        }
        // drop pairings towards edges that were downgraded
        let valid: BTreeSet<EdgeId> =
            edges.iter().enumerate().filter(|(_, e)| !e.is_environment()).map(|(i, _)| i).collect();
        other_end.retain(|a, b| valid.contains(a) && valid.contains(b));
        for (id, edge) in edges.iter_mut().enumerate() {
            if !edge.is_environment() && !other_end.contains_key(&id) {
                edge.peer = None;
                edge.peer_interface = None;
            }
        }

        // router adjacency
        let mut adjacency: DiGraph<String, EdgeId> = DiGraph::new();
        let nodes: BTreeMap<&str, NodeIndex> =
            configs.keys().map(|r| (r.as_str(), adjacency.add_node(r.clone()))).collect();
        for (id, edge) in edges.iter().enumerate() {
            if let Some(p) = &edge.peer {
                if let (Some(a), Some(b)) = (nodes.get(edge.router.as_str()), nodes.get(p.as_str()))
                {
                    adjacency.add_edge(*a, *b, id);
                }
            }
        }

        let mut g = Self {
            network,
            edges,
            edge_map,
            other_end,
            static_routes: BTreeMap::new(),
            bgp_neighbors: BTreeMap::new(),
            adjacency,
        };
        g.index_static_routes()?;
        g.index_bgp_neighbors();
        info!(
            "Graph with {} routers and {} edges ({} environment edges)",
            g.edge_map.len(),
            g.edges.len(),
            g.edges.iter().filter(|e| e.is_environment()).count()
        );
        Ok(g)
    }

    fn index_static_routes(&mut self) -> Result<(), ConfigError> {
        let network = self.network;
        for (router, conf) in network.configs() {
            for sr in conf.static_routes.iter() {
                let edge = match (&sr.next_hop_interface, sr.next_hop_ip) {
                    (Some(iface), _) => {
                        if !conf.interfaces.contains_key(iface) {
                            return Err(ConfigError::UnknownInterface(router.clone(), iface.clone()));
                        }
                        self.edges_of(router).iter().copied().find(|e| &self.edges[*e].interface == iface)
                    }
                    (None, Some(nh)) => self.resolve_next_hop(router, nh),
                    (None, None) => None,
                };
                match edge {
                    Some(e) => self.static_routes.entry(e).or_default().push(sr.clone()),
                    None => warn!(
                        "Static route for {} on {} does not resolve to any interface. Dropping it.",
                        sr.network, router
                    ),
                }
            }
        }
        Ok(())
    }

    /// Find the edge towards a next-hop address: first the peer interface owning the address,
    /// then any interface whose subnet contains it.
    fn resolve_next_hop(&self, router: &str, nh: Ip) -> Option<EdgeId> {
        let edges = self.edges_of(router);
        edges
            .iter()
            .copied()
            .find(|e| self.peer_interface(*e).and_then(|i| i.address).map(|a| a.ip) == Some(nh))
            .or_else(|| {
                edges.iter().copied().find(|e| {
                    self.interface(*e).prefix().map(|p| p.contains_ip(nh)).unwrap_or(false)
                })
            })
    }

    fn index_bgp_neighbors(&mut self) {
        let network = self.network;
        for (router, conf) in network.configs() {
            let bgp = match &conf.bgp {
                Some(bgp) => bgp,
                None => continue,
            };
            for n in bgp.neighbors.values() {
                let edges = self.edges_of(router);
                let peered = edges.iter().copied().find(|e| {
                    self.peer_interface(*e).and_then(|i| i.address).map(|a| a.ip)
                        == Some(n.peer_address)
                });
                let env = || {
                    edges.iter().copied().find(|e| {
                        self.edges[*e].is_environment()
                            && self
                                .interface(*e)
                                .prefix()
                                .map(|p| p.contains_ip(n.peer_address))
                                .unwrap_or(false)
                    })
                };
                match peered.or_else(env) {
                    Some(e) => {
                        self.bgp_neighbors.insert(e, n.clone());
                    }
                    None => warn!(
                        "BGP neighbor {} of {} is not directly connected. Ignoring the session.",
                        n.peer_address, router
                    ),
                }
            }
        }
    }

    /// The network of the graph
    pub fn network(&self) -> &'n Network {
        self.network
    }

    /// All routers, sorted by name
    pub fn routers(&self) -> impl Iterator<Item = &str> {
        self.edge_map.keys().map(|r| r.as_str())
    }

    /// Returns `true` if the router is part of the graph
    pub fn contains_router(&self, router: &str) -> bool {
        self.edge_map.contains_key(router)
    }

    /// Configuration of a router.
    ///
    /// # Panics
    /// Panics if the router is not part of the graph.
    pub fn config(&self, router: &str) -> &'n Configuration {
        &self.network.configs()[router]
    }

    /// All edges
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edge with the given id
    pub fn edge(&self, e: EdgeId) -> &GraphEdge {
        &self.edges[e]
    }

    /// All edges starting at a router
    pub fn edges_of(&self, router: &str) -> &[EdgeId] {
        self.edge_map.get(router).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Edge of a router on the given interface
    pub fn find_edge(&self, router: &str, interface: &str) -> Option<EdgeId> {
        self.edges_of(router).iter().copied().find(|e| self.edges[*e].interface == interface)
    }

    /// Reverse edge of a peered edge
    pub fn other_end(&self, e: EdgeId) -> Option<EdgeId> {
        self.other_end.get(&e).copied()
    }

    /// Local interface of an edge
    pub fn interface(&self, e: EdgeId) -> &'n Interface {
        let edge = &self.edges[e];
        &self.config(&edge.router).interfaces[&edge.interface]
    }

    /// Interface of the peer, if the edge is peered
    pub fn peer_interface(&self, e: EdgeId) -> Option<&'n Interface> {
        let edge = &self.edges[e];
        match (&edge.peer, &edge.peer_interface) {
            (Some(p), Some(pi)) => self.network.configs().get(p).and_then(|c| c.interfaces.get(pi)),
            _ => None,
        }
    }

    /// Static routes using this edge
    pub fn static_routes(&self, e: EdgeId) -> &[StaticRoute] {
        self.static_routes.get(&e).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// BGP neighbor reachable over this edge
    pub fn bgp_neighbor(&self, e: EdgeId) -> Option<&BgpNeighbor> {
        self.bgp_neighbors.get(&e)
    }

    /// Returns `true` if the BGP session over this edge is an iBGP session
    pub fn is_ibgp(&self, e: EdgeId) -> bool {
        let local_as = self.config(&self.edges[e].router).bgp.as_ref().map(|b| b.local_as);
        match (self.bgp_neighbor(e), local_as) {
            (Some(n), Some(las)) => n.remote_as == las,
            _ => false,
        }
    }

    /// Returns `true` if the router has at least one environment edge
    pub fn has_environment_edge(&self, router: &str) -> bool {
        self.edges_of(router).iter().any(|e| self.edges[*e].is_environment())
    }

    /// Routers that can take part in a forwarding loop: members of a strongly connected component
    /// with more than one router, or routers with a self loop.
    pub fn loop_candidates(&self) -> BTreeSet<String> {
        kosaraju_scc(&self.adjacency)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|n| self.adjacency.find_edge(*n, *n).is_some())
            })
            .flatten()
            .map(|n| self.adjacency[n].clone())
            .collect()
    }
}
