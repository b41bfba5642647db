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

//! MergeNet

use super::{addr, ip, pfx, ExampleNetwork};
use crate::netconf::{BgpNeighbor, BgpProcess, Configuration, HeaderSpace, Interface, Network};
use crate::properties::HeaderQuestion;

/// # MergeNet
///
/// Chain of three eBGP routers without any policy. `r1` learns routes from its neighbor in the
/// environment. Since no router changes the routes it receives, every import shares the record of
/// the export of its neighbor.
///
/// ```text
/// AS 65000 ---- (eth1) r1 (eth0) ---- (eth0) r2 (eth1) ---- (eth0) r3
/// ```
pub struct MergeNet;

impl ExampleNetwork for MergeNet {
    fn net() -> Network {
        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("eth0").address(addr("192.168.0.1/30")))
            .add_interface(Interface::new("eth1").address(addr("10.1.0.1/30")))
            .set_bgp(
                BgpProcess::new(ip("1.1.1.1"), 65001)
                    .neighbor(BgpNeighbor::new(ip("192.168.0.2"), 65002))
                    .neighbor(BgpNeighbor::new(ip("10.1.0.2"), 65000)),
            );

        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("eth0").address(addr("192.168.0.2/30")))
            .add_interface(Interface::new("eth1").address(addr("192.168.1.1/30")))
            .set_bgp(
                BgpProcess::new(ip("2.2.2.2"), 65002)
                    .neighbor(BgpNeighbor::new(ip("192.168.0.1"), 65001))
                    .neighbor(BgpNeighbor::new(ip("192.168.1.2"), 65003)),
            );

        let mut r3 = Configuration::new("r3");
        r3.add_interface(Interface::new("eth0").address(addr("192.168.1.2/30")))
            .set_bgp(BgpProcess::new(ip("3.3.3.3"), 65003).neighbor(BgpNeighbor::new(ip("192.168.1.1"), 65002)));

        let mut net = Network::new();
        net.add_config(r1).unwrap();
        net.add_config(r2).unwrap();
        net.add_config(r3).unwrap();
        net.add_link("r1", "eth0", "r2", "eth0");
        net.add_link("r2", "eth1", "r3", "eth0");
        net
    }

    /// `r3` delivers packets towards `8.8.8.0/24` to the environment of `r1`.
    fn question() -> HeaderQuestion {
        HeaderQuestion::new()
            .header_space(HeaderSpace::new().dst_ip(pfx("8.8.8.0/24")))
            .source("r3")
            .destination("r1", "eth1")
    }
}
