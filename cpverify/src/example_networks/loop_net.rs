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

//! LoopNet

use super::{addr, ip, pfx, ExampleNetwork};
use crate::netconf::{Configuration, HeaderSpace, Interface, Network, StaticRoute};
use crate::properties::HeaderQuestion;

/// # LoopNet
///
/// Two routers with static routes for `10.0.0.0/24` pointing at each other. Every packet towards
/// this prefix is forwarded in a loop.
pub struct LoopNet;

impl ExampleNetwork for LoopNet {
    fn net() -> Network {
        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("eth0").address(addr("192.168.0.1/30")))
            .add_interface(Interface::new("eth1").address(addr("172.16.0.1/24")))
            .add_static_route(StaticRoute::via_ip(pfx("10.0.0.0/24"), ip("192.168.0.2")));

        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("eth0").address(addr("192.168.0.2/30")))
            .add_static_route(StaticRoute::via_ip(pfx("10.0.0.0/24"), ip("192.168.0.1")));

        let mut net = Network::new();
        net.add_config(r1).unwrap();
        net.add_config(r2).unwrap();
        net.add_link("r1", "eth0", "r2", "eth0");
        net
    }

    /// Packets towards `10.0.0.0/24`, which should leave the network at `r1`.
    fn question() -> HeaderQuestion {
        HeaderQuestion::new()
            .header_space(HeaderSpace::new().dst_ip(pfx("10.0.0.0/24")))
            .destination("r1", "eth1")
    }
}
