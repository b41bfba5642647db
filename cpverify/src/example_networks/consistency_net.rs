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

//! ConsistencyNet

use super::{addr, ip, pfx, ExampleNetwork};
use crate::netconf::{
    BgpNeighbor, BgpProcess, Configuration, HeaderSpace, Interface, Network, RouteMapBuilder,
    RoutingPolicyBuilder,
};
use crate::properties::HeaderQuestion;

/// # ConsistencyNet
///
/// Three unconnected border routers. `r1` and `r2` have the same interfaces and the same eBGP
/// neighbors, but `r2` raises the local preference of routes tagged with `30:1` on `eth1`, which
/// changes its forwarding decision. `r3` has a single interface, and cannot be compared with the
/// other two.
pub struct ConsistencyNet;

fn border(name: &str, router_id: &str, prefer_tagged: bool) -> Configuration {
    let mut bgp = BgpProcess::new(ip(router_id), 65000).neighbor(BgpNeighbor::new(ip("10.0.0.2"), 65001));
    let mut neighbor = BgpNeighbor::new(ip("10.0.1.2"), 65002);
    let mut conf = Configuration::new(name);
    conf.add_interface(Interface::new("eth0").address(addr("10.0.0.1/30")))
        .add_interface(Interface::new("eth1").address(addr("10.0.1.1/30")));
    if prefer_tagged {
        conf.add_routing_policy(
            RoutingPolicyBuilder::new("PREFER")
                .clause(
                    RouteMapBuilder::new()
                        .order(10)
                        .allow()
                        .match_community("30:1".parse().unwrap())
                        .set_local_pref(200)
                        .build(),
                )
                .clause(RouteMapBuilder::new().order(20).allow().build())
                .build(),
        );
        neighbor = neighbor.import_policy("PREFER");
    }
    bgp = bgp.neighbor(neighbor);
    conf.set_bgp(bgp);
    conf
}

impl ExampleNetwork for ConsistencyNet {
    fn net() -> Network {
        let mut r3 = Configuration::new("r3");
        r3.add_interface(Interface::new("eth0").address(addr("10.0.0.1/30")))
            .set_bgp(BgpProcess::new(ip("3.3.3.3"), 65000).neighbor(BgpNeighbor::new(ip("10.0.0.2"), 65001)));

        let mut net = Network::new();
        net.add_config(border("r1", "1.1.1.1", false)).unwrap();
        net.add_config(border("r2", "2.2.2.2", true)).unwrap();
        net.add_config(r3).unwrap();
        net
    }

    /// Packets towards `100.0.0.0/8`
    fn question() -> HeaderQuestion {
        HeaderQuestion::new().header_space(HeaderSpace::new().dst_ip(pfx("100.0.0.0/8")))
    }
}
