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

//! # Symbolic Packet
//!
//! The packet whose forwarding is verified. All header fields are integer variables with their
//! natural bounds, and the TCP flags are booleans. Header spaces and access lists are translated
//! into predicates over these variables.

use crate::netconf::{HeaderSpace, IpAccessList, Prefix, SubRange, TcpFlags};
use crate::smt::{BoolExpr, Context, IntExpr};

/// Variables of the packet header
#[derive(Debug, Clone)]
pub struct SymbolicPacket {
    /// Destination address
    pub dst_ip: IntExpr,
    /// Source address
    pub src_ip: IntExpr,
    /// Destination port
    pub dst_port: IntExpr,
    /// Source port
    pub src_port: IntExpr,
    /// ICMP type
    pub icmp_type: IntExpr,
    /// ICMP code
    pub icmp_code: IntExpr,
    /// IP protocol number
    pub ip_protocol: IntExpr,
    /// TCP flags, in the order ack, cwr, ece, fin, psh, rst, syn, urg
    pub tcp_flags: [BoolExpr; 8],
}

/// Names of the TCP flags, in the order of [`SymbolicPacket::tcp_flags`]
pub const TCP_FLAG_NAMES: [&str; 8] = ["ack", "cwr", "ece", "fin", "psh", "rst", "syn", "urg"];

impl SymbolicPacket {
    /// Allocate the variables of a packet. `prefix` is prepended to every variable name.
    pub fn new(ctx: &mut Context, prefix: &str) -> Self {
        let mut int = |n: &str| ctx.int_var(&format!("{}{}", prefix, n));
        let dst_ip = int("dst-ip");
        let src_ip = int("src-ip");
        let dst_port = int("dst-port");
        let src_port = int("src-port");
        let icmp_type = int("icmp-type");
        let icmp_code = int("icmp-code");
        let ip_protocol = int("ip-protocol");
        let tcp_flags = TCP_FLAG_NAMES.map(|f| ctx.bool_var(&format!("{}tcp-{}", prefix, f)));
        Self { dst_ip, src_ip, dst_port, src_port, icmp_type, icmp_code, ip_protocol, tcp_flags }
    }

    /// Domain of all header fields
    pub fn bounds(&self) -> BoolExpr {
        BoolExpr::and_all(vec![
            self.dst_ip.in_range(0, u32::MAX as i64),
            self.src_ip.in_range(0, u32::MAX as i64),
            self.dst_port.in_range(0, 65535),
            self.src_port.in_range(0, 65535),
            self.icmp_type.in_range(0, 255),
            self.icmp_code.in_range(0, 255),
            self.ip_protocol.in_range(0, 255),
        ])
    }

    /// Both packets have equal headers
    pub fn equal(&self, other: &SymbolicPacket) -> BoolExpr {
        let mut cs = vec![
            self.dst_ip.equals(&other.dst_ip),
            self.src_ip.equals(&other.src_ip),
            self.dst_port.equals(&other.dst_port),
            self.src_port.equals(&other.src_port),
            self.icmp_type.equals(&other.icmp_type),
            self.icmp_code.equals(&other.icmp_code),
            self.ip_protocol.equals(&other.ip_protocol),
        ];
        cs.extend(self.tcp_flags.iter().zip(other.tcp_flags.iter()).map(|(a, b)| a.iff(b)));
        BoolExpr::and_all(cs)
    }

    /// The destination address lies inside the prefix
    pub fn dst_in(&self, p: &Prefix) -> BoolExpr {
        in_prefix(&self.dst_ip, p)
    }

    /// The packet is part of the header space
    pub fn matches(&self, hs: &HeaderSpace) -> BoolExpr {
        let mut cs = Vec::new();
        let mut prefixes = |ip: &IntExpr, pos: &[Prefix], neg: &[Prefix]| {
            if !pos.is_empty() {
                cs.push(BoolExpr::or_all(pos.iter().map(|p| in_prefix(ip, p))));
            }
            cs.push(BoolExpr::or_all(neg.iter().map(|p| in_prefix(ip, p))).not());
        };
        prefixes(&self.dst_ip, &hs.dst_ips, &hs.not_dst_ips);
        prefixes(&self.src_ip, &hs.src_ips, &hs.not_src_ips);

        let ranges = [
            (&self.dst_port, &hs.dst_ports, &hs.not_dst_ports),
            (&self.src_port, &hs.src_ports, &hs.not_src_ports),
            (&self.icmp_type, &hs.icmp_types, &hs.not_icmp_types),
            (&self.icmp_code, &hs.icmp_codes, &hs.not_icmp_codes),
        ];
        for (x, pos, neg) in ranges.iter() {
            if !pos.is_empty() {
                cs.push(BoolExpr::or_all(pos.iter().map(|r| in_range(x, r))));
            }
            cs.push(BoolExpr::or_all(neg.iter().map(|r| in_range(x, r))).not());
        }

        if !hs.ip_protocols.is_empty() {
            cs.push(BoolExpr::or_all(
                hs.ip_protocols.iter().map(|p| self.ip_protocol.equals(&IntExpr::constant(*p as i64))),
            ));
        }
        cs.push(
            BoolExpr::or_all(
                hs.not_ip_protocols
                    .iter()
                    .map(|p| self.ip_protocol.equals(&IntExpr::constant(*p as i64))),
            )
            .not(),
        );

        if !hs.tcp_flags.is_empty() {
            cs.push(BoolExpr::or_all(hs.tcp_flags.iter().map(|f| self.flags_match(f))));
        }
        BoolExpr::and_all(cs)
    }

    fn flags_match(&self, f: &TcpFlags) -> BoolExpr {
        let wanted = [f.ack, f.cwr, f.ece, f.fin, f.psh, f.rst, f.syn, f.urg];
        BoolExpr::and_all(wanted.iter().zip(self.tcp_flags.iter()).filter_map(|(w, v)| {
            w.map(|w| if w { v.clone() } else { v.not() })
        }))
    }

    /// The access list permits the packet. Lines are checked in order, and packets matching no
    /// line are denied.
    pub fn permitted_by(&self, acl: &IpAccessList) -> BoolExpr {
        acl.lines.iter().rev().fold(BoolExpr::ff(), |acc, line| {
            self.matches(&line.header_space)
                .ite(&BoolExpr::constant(line.action.is_permit()), &acc)
        })
    }
}

/// The address lies inside the prefix
pub fn in_prefix(ip: &IntExpr, p: &Prefix) -> BoolExpr {
    if p.len() == 0 {
        BoolExpr::tt()
    } else {
        ip.in_range(p.first() as i64, p.last() as i64)
    }
}

fn in_range(x: &IntExpr, r: &SubRange) -> BoolExpr {
    x.in_range(r.start, r.end)
}
