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

//! Module containing the basic types of the configuration model

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Configuration Error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The string cannot be parsed as an IP address
    #[error("Invalid IP address: {0}")]
    InvalidIp(String),
    /// The string cannot be parsed as a prefix
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),
    /// The string cannot be parsed as a community
    #[error("Invalid community: {0}")]
    InvalidCommunity(String),
    /// The protocol name is not recognized
    #[error("Unrecognized protocol: {0}")]
    UnknownProtocol(String),
    /// The community regex is invalid
    #[error("Invalid community regex {0}: {1}")]
    InvalidRegex(String, String),
    /// A configuration with the same hostname already exists
    #[error("Duplicate router: {0}")]
    DuplicateRouter(String),
    /// A link or a static route references an interface that is not configured
    #[error("Router {0} has no interface {1}")]
    UnknownInterface(String, String),
    /// The router is not part of the network
    #[error("Router {0} is not configured")]
    UnknownRouter(String),
}

/// IPv4 address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ip(pub u32);

impl Ip {
    /// Create a new IP address from its four octets
    pub fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(u32::from_be_bytes([a, b, c, d]))
    }

    /// Returns the numeric value of the address
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl FromStr for Ip {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::InvalidIp(s.to_string());
        let octets: Vec<u8> =
            s.split('.').map(|x| x.parse::<u8>()).collect::<Result<_, _>>().map_err(|_| err())?;
        match octets.as_slice() {
            [a, b, c, d] => Ok(Self::new(*a, *b, *c, *d)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0.to_be_bytes();
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl fmt::Debug for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// IPv4 prefix. The network address is always masked with the prefix length.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Prefix {
    network: Ip,
    len: u8,
}

impl Prefix {
    /// Create a new prefix. Bits after the prefix length are cleared. Lengths above 32 are
    /// truncated to 32.
    pub fn new(ip: Ip, len: u8) -> Self {
        let len = len.min(32);
        Self { network: Ip(ip.0 & Self::mask(len)), len }
    }

    fn mask(len: u8) -> u32 {
        if len == 0 {
            0
        } else {
            u32::MAX << (32 - len as u32)
        }
    }

    /// Network address
    pub fn network(&self) -> Ip {
        self.network
    }

    /// Prefix length
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Returns `true` if the prefix is `0.0.0.0/0`
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First address of the prefix
    pub fn first(&self) -> u32 {
        self.network.0
    }

    /// Last address of the prefix
    pub fn last(&self) -> u32 {
        self.network.0 | !Self::mask(self.len)
    }

    /// Returns `true` if the address lies inside the prefix
    pub fn contains_ip(&self, ip: Ip) -> bool {
        ip.0 & Self::mask(self.len) == self.network.0
    }

    /// Returns `true` if `other` is equal to, or more specific than `self`.
    pub fn contains_prefix(&self, other: &Prefix) -> bool {
        other.len >= self.len && self.contains_ip(other.network)
    }

    /// Returns `true` if both prefixes share at least one address.
    pub fn overlaps(&self, other: &Prefix) -> bool {
        self.contains_prefix(other) || other.contains_prefix(self)
    }
}

impl FromStr for Prefix {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::InvalidPrefix(s.to_string());
        let (ip, len) = s.split_once('/').ok_or_else(err)?;
        let ip: Ip = ip.parse().map_err(|_| err())?;
        let len: u8 = len.parse().map_err(|_| err())?;
        if len > 32 {
            return Err(err());
        }
        Ok(Self::new(ip, len))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.len)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Address of an interface, consisting of the host address and the length of the subnet.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InterfaceAddress {
    /// Host address
    pub ip: Ip,
    /// Length of the subnet
    pub len: u8,
}

impl InterfaceAddress {
    /// The subnet of the interface
    pub fn prefix(&self) -> Prefix {
        Prefix::new(self.ip, self.len)
    }
}

impl FromStr for InterfaceAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::InvalidPrefix(s.to_string());
        let (ip, len) = s.split_once('/').ok_or_else(err)?;
        let ip: Ip = ip.parse().map_err(|_| err())?;
        let len: u8 = len.parse().map_err(|_| err())?;
        if len > 32 {
            return Err(err());
        }
        Ok(Self { ip, len })
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.len)
    }
}

impl fmt::Debug for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Inclusive range of integers, used for ports, ICMP types and prefix lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubRange {
    /// First value (inclusive)
    pub start: i64,
    /// Last value (inclusive)
    pub end: i64,
}

impl SubRange {
    /// Create a new range (inclusive on both ends)
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Range containing a single value
    pub fn single(x: i64) -> Self {
        Self { start: x, end: x }
    }

    /// Returns `true` if the value lies inside the range
    pub fn contains(&self, x: i64) -> bool {
        self.start <= x && x <= self.end
    }
}

/// Prefix together with a range of prefix lengths, like `10.0.0.0/8 ge 16 le 24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PrefixRange {
    /// The covering prefix
    pub prefix: Prefix,
    /// Allowed prefix lengths
    pub lengths: SubRange,
}

impl PrefixRange {
    /// Matches exactly the prefix
    pub fn exact(prefix: Prefix) -> Self {
        let l = prefix.len() as i64;
        Self { prefix, lengths: SubRange::single(l) }
    }

    /// Matches the prefix and all more specific prefixes with a length in `[ge, le]`.
    pub fn new(prefix: Prefix, ge: u8, le: u8) -> Self {
        Self { prefix, lengths: SubRange::new(ge as i64, le as i64) }
    }

    /// Matches the prefix and every more specific prefix
    pub fn orlonger(prefix: Prefix) -> Self {
        Self::new(prefix, prefix.len(), 32)
    }
}

/// Routing protocols known to the encoder. The order of the variants is the order in which the
/// protocols of a router are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Protocol {
    /// Directly connected subnets
    Connected,
    /// Static routes
    Static,
    /// OSPF
    Ospf,
    /// BGP
    Bgp,
}

impl Protocol {
    /// All protocols, in their canonical order
    pub const ALL: [Protocol; 4] =
        [Protocol::Connected, Protocol::Static, Protocol::Ospf, Protocol::Bgp];

    /// Default administrative distance. For BGP, the eBGP value is returned.
    pub fn default_admin_distance(&self) -> i64 {
        match self {
            Self::Connected => 0,
            Self::Static => 1,
            Self::Ospf => 110,
            Self::Bgp => 20,
        }
    }

    /// Administrative distance of routes learned over iBGP
    pub const IBGP_ADMIN_DISTANCE: i64 = 200;

    /// Largest metric that is still valid for this protocol.
    pub fn max_metric(&self) -> i64 {
        match self {
            Self::Ospf => 65535,
            Self::Connected | Self::Static | Self::Bgp => 255,
        }
    }

    /// Integer used to encode the protocol (for the `history` attribute)
    pub fn index(&self) -> i64 {
        match self {
            Self::Connected => 0,
            Self::Static => 1,
            Self::Ospf => 2,
            Self::Bgp => 3,
        }
    }

    /// Inverse of [`Protocol::index`]
    pub fn from_index(idx: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.index() == idx)
    }

    /// Returns `true` for protocols that exchange routes with neighbors
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Ospf | Self::Bgp)
    }

    /// Short name, used for variable names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::Static => "STATIC",
            Self::Ospf => "OSPF",
            Self::Bgp => "BGP",
        }
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "connected" | "direct" => Ok(Self::Connected),
            "static" => Ok(Self::Static),
            "ospf" => Ok(Self::Ospf),
            "bgp" | "ibgp" | "ebgp" => Ok(Self::Bgp),
            _ => Err(ConfigError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action of a line in a filter (route filter list, community list or access list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LineAction {
    /// Matching elements are permitted
    Permit,
    /// Matching elements are denied
    Deny,
}

impl LineAction {
    /// Returns `true` if the action is `Permit`
    pub fn is_permit(&self) -> bool {
        self == &Self::Permit
    }
}

/// BGP standard community, stored as `(asn << 16) | value`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Community(pub u32);

impl Community {
    /// Create a community from its two halves
    pub fn new(asn: u16, value: u16) -> Self {
        Self(((asn as u32) << 16) | value as u32)
    }
}

impl FromStr for Community {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::InvalidCommunity(s.to_string());
        match s.split_once(':') {
            Some((a, v)) => Ok(Self::new(a.parse().map_err(|_| err())?, v.parse().map_err(|_| err())?)),
            None => s.parse::<u32>().map(Self).map_err(|_| err()),
        }
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0 >> 16, self.0 & 0xffff)
    }
}

impl fmt::Debug for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
