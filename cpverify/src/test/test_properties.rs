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

use crate::example_networks::*;
use crate::netconf::{Configuration, HeaderSpace, Interface, IpAccessList, Network, StaticRoute};
use crate::properties::*;
use crate::smt::Z3Backend;

use lazy_static::lazy_static;

lazy_static! {
    static ref BACKEND: Z3Backend = Z3Backend::new();
}

fn property(result: &VerificationResult, name: &str) -> Option<String> {
    result.counterexample.as_ref().and_then(|c| c.property.get(name).cloned())
}

#[test]
fn static_chain_reachability() {
    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_reachability(&StaticChain::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Verified);
    assert!(result.verified);
    assert!(result.counterexample.is_none());
    assert!(result.stats.num_constraints > 0);

    // a single failed link disconnects r1
    let result = checker.compute_reachability(&StaticChain::question().failures(1)).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    let cex = result.counterexample.unwrap();
    assert_eq!(cex.failed_links.len(), 1);
    assert_eq!(cex.property.get("reachable(r1)").map(|s| s.as_str()), Some("false"));
}

#[test]
fn reachability_per_edge() {
    let net = BgpCommunityNet::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let results = checker.compute_reachability_per_edge(&BgpCommunityNet::question()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.router, "r1");
    assert_eq!(results[1].0.router, "r2");
    // the environment may not announce any route
    for (_, result) in results {
        assert_eq!(result.outcome, Outcome::Violated);
    }
}

#[test]
fn forwarding_witness() {
    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_forwarding(&StaticChain::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    let cex = result.counterexample.unwrap();
    assert_eq!(
        cex.data_forwarding,
        vec!["r1,eth0 --> r2,eth0", "r2,eth1 --> r3,eth0", "r3,eth1 --> _"]
    );
    assert!(cex.best_routes.contains_key("r1 STATIC"));
    assert!(cex.packet["dstIp"].starts_with("10.0.0."));
}

#[test]
fn black_hole() {
    let net = BlackHoleNet::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_black_hole(&BlackHoleNet::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    assert_eq!(property(&result, "black-hole(r2)").as_deref(), Some("true"));

    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_black_hole(&StaticChain::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Verified);
}

#[test]
fn routing_loop() {
    let net = LoopNet::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_routing_loop(&LoopNet::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);

    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_routing_loop(&StaticChain::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Verified);
}

#[test]
fn path_length() {
    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let q = StaticChain::question();
    assert_eq!(checker.compute_bounded_length(&q, 2).unwrap().outcome, Outcome::Verified);

    let result = checker.compute_bounded_length(&q, 1).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    assert_eq!(property(&result, "path-length(r1)").as_deref(), Some("2"));

    // r1 and r2 are at different distances from r3
    let result = checker.compute_equal_length(&q).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    let q = StaticChain::question().source("r2");
    assert_eq!(checker.compute_equal_length(&q).unwrap().outcome, Outcome::Verified);
}

#[test]
fn load_balance() {
    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    // r2 carries the traffic of r1 and its own
    let q = StaticChain::question();
    let result = checker.compute_load_balance(&q, 0).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    assert_eq!(property(&result, "load(r1)").as_deref(), Some("1"));
    assert_eq!(property(&result, "load(r2)").as_deref(), Some("2"));
    assert_eq!(checker.compute_load_balance(&q, 1).unwrap().outcome, Outcome::Verified);
}

#[test]
fn multipath_consistency() {
    let net = StaticChain::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_multipath_consistency(&StaticChain::question()).unwrap();
    assert_eq!(result.outcome, Outcome::Verified);
}

/// `r1` load-balances towards `10.0.0.0/24` over `r2` and `r3`, which both forward to `r4`. If
/// `drop` is set, `r3` filters the traffic towards `r4`.
fn diamond(drop: bool) -> Network {
    let mut r1 = Configuration::new("r1");
    r1.add_interface(Interface::new("eth0").address(addr("192.168.0.1/30")))
        .add_interface(Interface::new("eth1").address(addr("192.168.1.1/30")))
        .add_static_route(StaticRoute::via_ip(pfx("10.0.0.0/24"), ip("192.168.0.2")))
        .add_static_route(StaticRoute::via_ip(pfx("10.0.0.0/24"), ip("192.168.1.2")));
    let mut r2 = Configuration::new("r2");
    r2.add_interface(Interface::new("eth0").address(addr("192.168.0.2/30")))
        .add_interface(Interface::new("eth1").address(addr("192.168.2.1/30")))
        .add_static_route(StaticRoute::via_ip(pfx("10.0.0.0/24"), ip("192.168.2.2")));
    let mut r3 = Configuration::new("r3");
    let mut uplink = Interface::new("eth1").address(addr("192.168.3.1/30"));
    if drop {
        uplink = uplink.outgoing_filter("DROP");
        r3.add_ip_access_list(IpAccessList::new("DROP"));
    }
    r3.add_interface(Interface::new("eth0").address(addr("192.168.1.2/30")))
        .add_interface(uplink)
        .add_static_route(StaticRoute::via_ip(pfx("10.0.0.0/24"), ip("192.168.3.2")));
    let mut r4 = Configuration::new("r4");
    r4.add_interface(Interface::new("eth0").address(addr("192.168.2.2/30")))
        .add_interface(Interface::new("eth1").address(addr("192.168.3.2/30")))
        .add_interface(Interface::new("eth2").address(addr("10.0.0.1/24")));

    let mut net = Network::new();
    for r in [r1, r2, r3, r4] {
        net.add_config(r).unwrap();
    }
    net.add_link("r1", "eth0", "r2", "eth0");
    net.add_link("r1", "eth1", "r3", "eth0");
    net.add_link("r2", "eth1", "r4", "eth0");
    net.add_link("r3", "eth1", "r4", "eth1");
    net
}

#[test]
fn multipath_inconsistency() {
    let q = HeaderQuestion::new()
        .header_space(HeaderSpace::new().dst_ip(pfx("10.0.0.0/24")))
        .destination("r4", "eth2");

    let net = diamond(false);
    let checker = PropertyChecker::new(&net, &*BACKEND);
    assert_eq!(checker.compute_reachability(&q).unwrap().outcome, Outcome::Verified);
    assert_eq!(checker.compute_multipath_consistency(&q).unwrap().outcome, Outcome::Verified);

    // one of the two paths of r1 drops the packet
    let net = diamond(true);
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let result = checker.compute_multipath_consistency(&q).unwrap();
    assert_eq!(result.outcome, Outcome::Violated);
    assert_eq!(property(&result, "inconsistent(r1)").as_deref(), Some("true"));
    assert_eq!(property(&result, "inconsistent(r2)").as_deref(), Some("false"));
    let cex = result.counterexample.unwrap();
    assert!(cex.control_forwarding.iter().any(|e| e.starts_with("r3,")));
    assert!(!cex.data_forwarding.iter().any(|e| e.starts_with("r3,")));
}

#[test]
fn local_consistency() {
    let net = ConsistencyNet::net();
    let checker = PropertyChecker::new(&net, &*BACKEND);
    let results = checker.compute_local_consistency(&ConsistencyNet::question()).unwrap();
    assert_eq!(results.len(), 3);

    let (a, b, r1_r2) = &results[0];
    assert_eq!((a.as_str(), b.as_str()), ("r1", "r2"));
    assert_eq!(r1_r2.outcome, Outcome::Violated);
    assert!(!r1_r2.verified);

    for (_, b, result) in results.iter().skip(1) {
        assert_eq!(b, "r3");
        assert!(matches!(result.outcome, Outcome::CannotCompare(_)));
    }
}
