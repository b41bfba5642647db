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

//! AggregateNet

use super::{addr, ip, pfx, ExampleNetwork};
use crate::netconf::{
    BgpNeighbor, BgpProcess, Configuration, HeaderSpace, Interface, Network, Protocol,
    RouteMapBuilder, RoutingPolicyBuilder, StaticRoute,
};
use crate::properties::HeaderQuestion;

/// # AggregateNet
///
/// `r1` owns `10.0.1.0/24` through a static route, and redistributes static routes into BGP
/// towards its eBGP neighbor `r2`. It is configured with the aggregate `10.0.0.0/16`, which
/// suppresses all more specific routes, so `r2` only learns the `/16`.
///
/// ```text
/// 10.0.1.0/24 ---- (eth1) r1 (eth0) ---- (eth0) r2 (eth1) ---- 172.16.0.0/24
/// ```
pub struct AggregateNet;

impl ExampleNetwork for AggregateNet {
    fn net() -> Network {
        let export = RoutingPolicyBuilder::new("EXPORT")
            .clause(RouteMapBuilder::new().order(10).allow().match_protocol(Protocol::Static).build())
            .clause(RouteMapBuilder::new().order(20).allow().match_protocol(Protocol::Bgp).build())
            .build();

        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("eth0").address(addr("192.168.0.1/30")))
            .add_interface(Interface::new("eth1").address(addr("10.0.1.1/24")))
            .add_static_route(StaticRoute::via_interface(pfx("10.0.1.0/24"), "eth1"))
            .add_aggregate(pfx("10.0.0.0/16"), true)
            .add_routing_policy(export)
            .set_bgp(
                BgpProcess::new(ip("1.1.1.1"), 65000)
                    .neighbor(BgpNeighbor::new(ip("192.168.0.2"), 65001).export_policy("EXPORT")),
            );

        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("eth0").address(addr("192.168.0.2/30")))
            .add_interface(Interface::new("eth1").address(addr("172.16.0.1/24")))
            .set_bgp(BgpProcess::new(ip("2.2.2.2"), 65001).neighbor(BgpNeighbor::new(ip("192.168.0.1"), 65000)));

        let mut net = Network::new();
        net.add_config(r1).unwrap();
        net.add_config(r2).unwrap();
        net.add_link("r1", "eth0", "r2", "eth0");
        net
    }

    /// `r2` delivers packets towards `10.0.1.0/24` to `r1`.
    fn question() -> HeaderQuestion {
        HeaderQuestion::new()
            .header_space(HeaderSpace::new().dst_ip(pfx("10.0.1.0/24")))
            .source("r2")
            .destination("r1", "eth1")
    }
}
