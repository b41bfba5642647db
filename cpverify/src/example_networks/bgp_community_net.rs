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

//! BgpCommunityNet

use super::{addr, ip, pfx, ExampleNetwork};
use crate::netconf::{
    BgpNeighbor, BgpProcess, Configuration, HeaderSpace, Interface, Network, RouteMapBuilder,
    RoutingPolicyBuilder,
};
use crate::properties::HeaderQuestion;

/// # BgpCommunityNet
///
/// Two routers of AS 65000 connected by iBGP, each with one eBGP neighbor in the environment.
/// `r1` prefers routes of its neighbor tagged with the community `30:1` (local preference 200),
/// all other routes keep the default local preference of 100.
///
/// ```text
/// AS 65001 ---- (eth0) r1 (eth1) ---- (eth0) r2 (eth1) ---- AS 65002
/// ```
pub struct BgpCommunityNet;

impl ExampleNetwork for BgpCommunityNet {
    fn net() -> Network {
        let import = RoutingPolicyBuilder::new("IMPORT")
            .clause(
                RouteMapBuilder::new()
                    .order(10)
                    .allow()
                    .match_community("30:1".parse().unwrap())
                    .set_local_pref(200)
                    .build(),
            )
            .clause(RouteMapBuilder::new().order(20).allow().build())
            .build();

        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("eth0").address(addr("10.1.0.1/30")))
            .add_interface(Interface::new("eth1").address(addr("192.168.0.1/30")))
            .add_routing_policy(import)
            .set_bgp(
                BgpProcess::new(ip("1.1.1.1"), 65000)
                    .neighbor(BgpNeighbor::new(ip("10.1.0.2"), 65001).import_policy("IMPORT"))
                    .neighbor(BgpNeighbor::new(ip("192.168.0.2"), 65000)),
            );

        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("eth0").address(addr("192.168.0.2/30")))
            .add_interface(Interface::new("eth1").address(addr("10.2.0.1/30")))
            .set_bgp(
                BgpProcess::new(ip("2.2.2.2"), 65000)
                    .neighbor(BgpNeighbor::new(ip("192.168.0.1"), 65000))
                    .neighbor(BgpNeighbor::new(ip("10.2.0.2"), 65002)),
            );

        let mut net = Network::new();
        net.add_config(r1).unwrap();
        net.add_config(r2).unwrap();
        net.add_link("r1", "eth1", "r2", "eth0");
        net
    }

    /// Both routers deliver packets towards `100.0.0.0/8` to one of the two neighbors.
    fn question() -> HeaderQuestion {
        HeaderQuestion::new()
            .header_space(HeaderSpace::new().dst_ip(pfx("100.0.0.0/8")))
            .source("r1")
            .source("r2")
            .destination("r1", "eth0")
            .destination("r2", "eth1")
    }
}
