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

//! OspfOverflowNet

use super::{addr, ip, pfx, ExampleNetwork};
use crate::netconf::{Configuration, HeaderSpace, Interface, Network, OspfProcess};
use crate::properties::HeaderQuestion;

/// # OspfOverflowNet
///
/// Two OSPF routers in area 0. `r1` announces its passive interface `10.0.0.0/24`, and `r2`
/// receives it over a link with cost 5. Routes whose metric would exceed the maximal OSPF metric
/// after adding the link cost are dropped.
///
/// ```text
/// 10.0.0.0/24 ---- (eth1) r1 (eth0) ---- (eth0) r2
/// ```
pub struct OspfOverflowNet;

impl ExampleNetwork for OspfOverflowNet {
    fn net() -> Network {
        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("eth0").address(addr("192.168.0.1/30")).ospf(0, 1))
            .add_interface(Interface::new("eth1").address(addr("10.0.0.1/24")).ospf_passive(0, 1))
            .set_ospf(OspfProcess::new(ip("1.1.1.1")));

        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("eth0").address(addr("192.168.0.2/30")).ospf(0, 5))
            .set_ospf(OspfProcess::new(ip("2.2.2.2")));

        let mut net = Network::new();
        net.add_config(r1).unwrap();
        net.add_config(r2).unwrap();
        net.add_link("r1", "eth0", "r2", "eth0");
        net
    }

    /// `r2` delivers packets towards `10.0.0.0/24` to `r1`.
    fn question() -> HeaderQuestion {
        HeaderQuestion::new()
            .header_space(HeaderSpace::new().dst_ip(pfx("10.0.0.0/24")))
            .source("r2")
            .destination("r1", "eth1")
    }
}
