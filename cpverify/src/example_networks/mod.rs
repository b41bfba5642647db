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

//! Networks for testing
//!
//! Small, hand-written networks exercising one feature of the encoding each. They are used by the
//! tests and by the command line interface.

use crate::netconf::{InterfaceAddress, Ip, Network, Prefix};
use crate::properties::HeaderQuestion;

mod static_chain;
pub use static_chain::StaticChain;

mod bgp_community_net;
pub use bgp_community_net::BgpCommunityNet;

mod aggregate_net;
pub use aggregate_net::AggregateNet;

mod ospf_overflow_net;
pub use ospf_overflow_net::OspfOverflowNet;

mod black_hole_net;
pub use black_hole_net::BlackHoleNet;

mod merge_net;
pub use merge_net::MergeNet;

mod loop_net;
pub use loop_net::LoopNet;

mod consistency_net;
pub use consistency_net::ConsistencyNet;

/// Trait for easier access to example networks.
pub trait ExampleNetwork {
    /// Get the configured network
    fn net() -> Network;
    /// Get the question the network was built for
    fn question() -> HeaderQuestion;
}

/// Names of all example networks, as accepted by [`example_by_name`]
pub const EXAMPLE_NAMES: [&str; 8] = [
    "static-chain",
    "bgp-community",
    "aggregate",
    "ospf-overflow",
    "black-hole",
    "merge",
    "loop",
    "consistency",
];

/// Get the network and the question of an example network by its name
pub fn example_by_name(name: &str) -> Option<(Network, HeaderQuestion)> {
    Some(match name {
        "static-chain" => (StaticChain::net(), StaticChain::question()),
        "bgp-community" => (BgpCommunityNet::net(), BgpCommunityNet::question()),
        "aggregate" => (AggregateNet::net(), AggregateNet::question()),
        "ospf-overflow" => (OspfOverflowNet::net(), OspfOverflowNet::question()),
        "black-hole" => (BlackHoleNet::net(), BlackHoleNet::question()),
        "merge" => (MergeNet::net(), MergeNet::question()),
        "loop" => (LoopNet::net(), LoopNet::question()),
        "consistency" => (ConsistencyNet::net(), ConsistencyNet::question()),
        _ => return None,
    })
}

/// Parse a prefix
///
/// # Panics
/// Panics if the string is not a valid prefix.
pub(crate) fn pfx(s: &str) -> Prefix {
    s.parse().unwrap()
}

/// Parse an interface address
///
/// # Panics
/// Panics if the string is not a valid interface address.
pub(crate) fn addr(s: &str) -> InterfaceAddress {
    s.parse().unwrap()
}

/// Parse an IP address
///
/// # Panics
/// Panics if the string is not a valid address.
pub(crate) fn ip(s: &str) -> Ip {
    s.parse().unwrap()
}
