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

use crate::encoder::Graph;
use crate::example_networks::*;
use crate::netconf::*;

use maplit::btreeset;

#[test]
fn static_chain_edges() {
    let net = StaticChain::net();
    let g = Graph::new(&net).unwrap();

    assert_eq!(g.routers().collect::<Vec<_>>(), vec!["r1", "r2", "r3"]);
    assert_eq!(g.edges().len(), 5);

    let r1_eth0 = g.find_edge("r1", "eth0").unwrap();
    let r2_eth0 = g.find_edge("r2", "eth0").unwrap();
    let r3_eth1 = g.find_edge("r3", "eth1").unwrap();
    assert_eq!(g.edge(r1_eth0).peer.as_deref(), Some("r2"));
    assert_eq!(g.edge(r1_eth0).peer_interface.as_deref(), Some("eth0"));
    assert_eq!(g.other_end(r1_eth0), Some(r2_eth0));
    assert_eq!(g.other_end(r2_eth0), Some(r1_eth0));

    // the subnet of r3 is not connected to any router
    assert!(g.edge(r3_eth1).is_environment());
    assert_eq!(g.other_end(r3_eth1), None);
    assert!(g.has_environment_edge("r3"));
    assert!(!g.has_environment_edge("r1"));
    assert_eq!(g.edge(r3_eth1).to_string(), "r3,eth1 --> _");
    assert_eq!(g.edge(r1_eth0).to_string(), "r1,eth0 --> r2,eth0");

    // static routes resolve to the edge towards the next hop
    assert_eq!(g.static_routes(r1_eth0).len(), 1);
    assert_eq!(g.static_routes(r2_eth0).len(), 0);
    let r2_eth1 = g.find_edge("r2", "eth1").unwrap();
    assert_eq!(g.static_routes(r2_eth1).len(), 1);
}

#[test]
fn loop_candidates() {
    let net = StaticChain::net();
    let g = Graph::new(&net).unwrap();
    assert_eq!(g.loop_candidates(), btreeset! {"r1".to_string(), "r2".to_string(), "r3".to_string()});

    // a single router without links cannot be part of a loop
    let single = ConsistencyNet::net().single_router("r1").unwrap();
    let g = Graph::new(&single).unwrap();
    assert!(g.loop_candidates().is_empty());
    assert!(g.edges().iter().all(|e| e.is_environment()));
}

#[test]
fn bgp_sessions() {
    let net = BgpCommunityNet::net();
    let g = Graph::new(&net).unwrap();

    let env = g.find_edge("r1", "eth0").unwrap();
    let internal = g.find_edge("r1", "eth1").unwrap();
    assert!(g.edge(env).is_environment());
    assert_eq!(g.bgp_neighbor(env).map(|n| n.remote_as), Some(65001));
    assert!(!g.is_ibgp(env));
    assert_eq!(g.bgp_neighbor(internal).map(|n| n.remote_as), Some(65000));
    assert!(g.is_ibgp(internal));
}

#[test]
fn shutdown_interfaces() {
    let mut r1 = Configuration::new("r1");
    r1.add_interface(Interface::new("eth0").address("10.0.0.1/30".parse().unwrap()))
        .add_interface(Interface::new("eth1").address("10.0.1.1/24".parse().unwrap()).shutdown())
        .add_interface(Interface::new("lo"));
    let mut r2 = Configuration::new("r2");
    r2.add_interface(Interface::new("eth0").address("10.0.0.2/30".parse().unwrap()).shutdown());
    let mut net = Network::new();
    net.add_config(r1).unwrap();
    net.add_config(r2).unwrap();
    net.add_link("r1", "eth0", "r2", "eth0");

    let g = Graph::new(&net).unwrap();
    // eth1 is shut down, lo has no address, and the link towards r2 is down on the other side.
    assert_eq!(g.edges().len(), 1);
    let e = g.find_edge("r1", "eth0").unwrap();
    assert!(g.edge(e).is_environment());
    assert!(g.edges_of("r2").is_empty());
}

#[test]
fn invalid_references() {
    let mut net = StaticChain::net();
    net.add_link("r1", "eth9", "r3", "eth1");
    assert_eq!(
        Graph::new(&net).unwrap_err(),
        ConfigError::UnknownInterface("r1".to_string(), "eth9".to_string())
    );

    let mut net = StaticChain::net();
    net.config_mut("r1")
        .unwrap()
        .add_static_route(StaticRoute::via_interface("10.9.0.0/16".parse().unwrap(), "eth7"));
    assert_eq!(
        Graph::new(&net).unwrap_err(),
        ConfigError::UnknownInterface("r1".to_string(), "eth7".to_string())
    );
}
