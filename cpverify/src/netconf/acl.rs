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

//! # Header spaces and access lists
//!
//! A [`HeaderSpace`] describes a set of packets. It is used both for the lines of an
//! [`IpAccessList`], and to describe the packets a verification question is about.

use crate::netconf::{LineAction, Prefix, SubRange};

/// Value of the TCP flags to match. `None` means that the flag is not considered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TcpFlags {
    /// ACK flag
    pub ack: Option<bool>,
    /// CWR flag
    pub cwr: Option<bool>,
    /// ECE flag
    pub ece: Option<bool>,
    /// FIN flag
    pub fin: Option<bool>,
    /// PSH flag
    pub psh: Option<bool>,
    /// RST flag
    pub rst: Option<bool>,
    /// SYN flag
    pub syn: Option<bool>,
    /// URG flag
    pub urg: Option<bool>,
}

impl TcpFlags {
    /// Matches packets with the SYN flag set and the ACK flag cleared.
    pub fn syn_only() -> Self {
        Self { syn: Some(true), ack: Some(false), ..Default::default() }
    }

    /// Matches established connections (ACK or RST set), expressed as two alternatives.
    pub fn established() -> Vec<Self> {
        vec![
            Self { ack: Some(true), ..Default::default() },
            Self { rst: Some(true), ..Default::default() },
        ]
    }
}

/// Set of packets. Every non-empty positive list restricts the set to packets matching at least one
/// of its elements, and every negative list (`not_*`) removes the matching packets.
///
/// ```
/// # use cpverify::netconf::*;
/// let hs = HeaderSpace::new()
///     .dst_ip("10.0.0.0/24".parse().unwrap())
///     .ip_protocol(6)
///     .dst_port(SubRange::single(80));
/// assert!(hs.may_match_dst(&"10.0.0.128/25".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HeaderSpace {
    /// Destination addresses
    pub dst_ips: Vec<Prefix>,
    /// Excluded destination addresses
    pub not_dst_ips: Vec<Prefix>,
    /// Source addresses
    pub src_ips: Vec<Prefix>,
    /// Excluded source addresses
    pub not_src_ips: Vec<Prefix>,
    /// Destination ports
    pub dst_ports: Vec<SubRange>,
    /// Excluded destination ports
    pub not_dst_ports: Vec<SubRange>,
    /// Source ports
    pub src_ports: Vec<SubRange>,
    /// Excluded source ports
    pub not_src_ports: Vec<SubRange>,
    /// ICMP types
    pub icmp_types: Vec<SubRange>,
    /// Excluded ICMP types
    pub not_icmp_types: Vec<SubRange>,
    /// ICMP codes
    pub icmp_codes: Vec<SubRange>,
    /// Excluded ICMP codes
    pub not_icmp_codes: Vec<SubRange>,
    /// IP protocol numbers
    pub ip_protocols: Vec<u8>,
    /// Excluded IP protocol numbers
    pub not_ip_protocols: Vec<u8>,
    /// TCP flag combinations (any of them must match)
    pub tcp_flags: Vec<TcpFlags>,
}

impl HeaderSpace {
    /// Header space containing all packets
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a destination prefix
    pub fn dst_ip(mut self, p: Prefix) -> Self {
        self.dst_ips.push(p);
        self
    }

    /// Exclude a destination prefix
    pub fn not_dst_ip(mut self, p: Prefix) -> Self {
        self.not_dst_ips.push(p);
        self
    }

    /// Add a source prefix
    pub fn src_ip(mut self, p: Prefix) -> Self {
        self.src_ips.push(p);
        self
    }

    /// Exclude a source prefix
    pub fn not_src_ip(mut self, p: Prefix) -> Self {
        self.not_src_ips.push(p);
        self
    }

    /// Add a range of destination ports
    pub fn dst_port(mut self, r: SubRange) -> Self {
        self.dst_ports.push(r);
        self
    }

    /// Exclude a range of destination ports
    pub fn not_dst_port(mut self, r: SubRange) -> Self {
        self.not_dst_ports.push(r);
        self
    }

    /// Add a range of source ports
    pub fn src_port(mut self, r: SubRange) -> Self {
        self.src_ports.push(r);
        self
    }

    /// Exclude a range of source ports
    pub fn not_src_port(mut self, r: SubRange) -> Self {
        self.not_src_ports.push(r);
        self
    }

    /// Add a range of ICMP types
    pub fn icmp_type(mut self, r: SubRange) -> Self {
        self.icmp_types.push(r);
        self
    }

    /// Add a range of ICMP codes
    pub fn icmp_code(mut self, r: SubRange) -> Self {
        self.icmp_codes.push(r);
        self
    }

    /// Add an IP protocol number
    pub fn ip_protocol(mut self, p: u8) -> Self {
        self.ip_protocols.push(p);
        self
    }

    /// Exclude an IP protocol number
    pub fn not_ip_protocol(mut self, p: u8) -> Self {
        self.not_ip_protocols.push(p);
        self
    }

    /// Add an alternative of TCP flags
    pub fn tcp_flags(mut self, flags: TcpFlags) -> Self {
        self.tcp_flags.push(flags);
        self
    }

    /// Returns `false` only if no packet of this header space can have a destination address inside
    /// `p`. Negative constraints are ignored, so the answer is conservative.
    pub fn may_match_dst(&self, p: &Prefix) -> bool {
        self.dst_ips.is_empty() || self.dst_ips.iter().any(|d| d.overlaps(p))
    }
}

/// Line of an IP access list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclLine {
    /// Action applied to matching packets
    pub action: LineAction,
    /// Packets matched by this line
    pub header_space: HeaderSpace,
}

/// IP access list. Lines are checked in order, the first matching line decides. Packets matching
/// no line are denied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpAccessList {
    /// Name of the access list
    pub name: String,
    /// Lines of the access list
    pub lines: Vec<AclLine>,
}

impl IpAccessList {
    /// Create an empty access list (denying everything)
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), lines: Vec::new() }
    }

    /// Append a permit line
    pub fn permit(mut self, header_space: HeaderSpace) -> Self {
        self.lines.push(AclLine { action: LineAction::Permit, header_space });
        self
    }

    /// Append a deny line
    pub fn deny(mut self, header_space: HeaderSpace) -> Self {
        self.lines.push(AclLine { action: LineAction::Deny, header_space });
        self
    }
}
