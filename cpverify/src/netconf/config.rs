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

//! # Router configuration
//!
//! Vendor independent configuration of a single router. All lists and policies are referenced by
//! name, exactly as they would be in a device configuration.

use crate::netconf::{
    Community, ConfigError, InterfaceAddress, Ip, IpAccessList, LineAction, Prefix, PrefixRange,
    RoutingPolicy,
};
use regex::Regex;
use std::collections::BTreeMap;

/// OSPF settings of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OspfInterface {
    /// OSPF area of the interface
    pub area: u32,
    /// Cost of the interface
    pub cost: u32,
    /// Passive interfaces advertise their subnet, but form no adjacency
    pub passive: bool,
}

/// Interface of a router
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interface {
    /// Name of the interface
    pub name: String,
    /// Address of the interface
    pub address: Option<InterfaceAddress>,
    /// Inactive interfaces are ignored
    pub active: bool,
    /// OSPF settings, or `None` if OSPF is not enabled on this interface
    pub ospf: Option<OspfInterface>,
    /// Name of the access list applied to incoming packets
    pub incoming_filter: Option<String>,
    /// Name of the access list applied to outgoing packets
    pub outgoing_filter: Option<String>,
}

impl Interface {
    /// Create a new, active interface without address.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            active: true,
            ospf: None,
            incoming_filter: None,
            outgoing_filter: None,
        }
    }

    /// Set the address of the interface.
    pub fn address(mut self, address: InterfaceAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Enable OSPF on the interface.
    pub fn ospf(mut self, area: u32, cost: u32) -> Self {
        self.ospf = Some(OspfInterface { area, cost, passive: false });
        self
    }

    /// Enable OSPF on the interface, without forming an adjacency.
    pub fn ospf_passive(mut self, area: u32, cost: u32) -> Self {
        self.ospf = Some(OspfInterface { area, cost, passive: true });
        self
    }

    /// Apply an access list to incoming packets.
    pub fn incoming_filter(mut self, acl: impl Into<String>) -> Self {
        self.incoming_filter = Some(acl.into());
        self
    }

    /// Apply an access list to outgoing packets.
    pub fn outgoing_filter(mut self, acl: impl Into<String>) -> Self {
        self.outgoing_filter = Some(acl.into());
        self
    }

    /// Shut down the interface.
    pub fn shutdown(mut self) -> Self {
        self.active = false;
        self
    }

    /// Subnet of the interface, if it has an address
    pub fn prefix(&self) -> Option<Prefix> {
        self.address.map(|a| a.prefix())
    }
}

/// Static route
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StaticRoute {
    /// Destination network
    pub network: Prefix,
    /// Next hop address
    pub next_hop_ip: Option<Ip>,
    /// Outgoing interface
    pub next_hop_interface: Option<String>,
    /// Administrative cost of the route
    pub admin_cost: u32,
}

impl StaticRoute {
    /// Static route towards a next-hop address
    pub fn via_ip(network: Prefix, next_hop: Ip) -> Self {
        Self { network, next_hop_ip: Some(next_hop), next_hop_interface: None, admin_cost: 1 }
    }

    /// Static route out of an interface
    pub fn via_interface(network: Prefix, iface: impl Into<String>) -> Self {
        Self {
            network,
            next_hop_ip: None,
            next_hop_interface: Some(iface.into()),
            admin_cost: 1,
        }
    }

    /// Change the administrative cost (floating static route)
    pub fn admin_cost(mut self, cost: u32) -> Self {
        self.admin_cost = cost;
        self
    }
}

/// Generated (aggregate) route
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneratedRoute {
    /// The aggregate
    pub network: Prefix,
    /// If set, more specific routes are not announced to BGP neighbors, only the aggregate.
    pub suppress_more_specifics: bool,
}

/// BGP neighbor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BgpNeighbor {
    /// Address of the peer
    pub peer_address: Ip,
    /// AS of the peer
    pub remote_as: u32,
    /// Routing policy applied to received routes
    pub import_policy: Option<String>,
    /// Routing policy applied to sent routes
    pub export_policy: Option<String>,
    /// Send communities to this neighbor
    pub send_community: bool,
    /// The neighbor is a route reflector client
    pub route_reflector_client: bool,
}

impl BgpNeighbor {
    /// New neighbor without policies, sending communities.
    pub fn new(peer_address: Ip, remote_as: u32) -> Self {
        Self {
            peer_address,
            remote_as,
            import_policy: None,
            export_policy: None,
            send_community: true,
            route_reflector_client: false,
        }
    }

    /// Set the import policy
    pub fn import_policy(mut self, policy: impl Into<String>) -> Self {
        self.import_policy = Some(policy.into());
        self
    }

    /// Set the export policy
    pub fn export_policy(mut self, policy: impl Into<String>) -> Self {
        self.export_policy = Some(policy.into());
        self
    }

    /// Disable sending communities
    pub fn no_send_community(mut self) -> Self {
        self.send_community = false;
        self
    }

    /// Mark the neighbor as route reflector client
    pub fn route_reflector_client(mut self) -> Self {
        self.route_reflector_client = true;
        self
    }
}

/// BGP process
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BgpProcess {
    /// Router id
    pub router_id: Ip,
    /// Local AS
    pub local_as: u32,
    /// Multipath for routes learned over eBGP
    pub multipath_ebgp: bool,
    /// Multipath for routes learned over iBGP
    pub multipath_ibgp: bool,
    /// Networks originated by this router
    pub networks: Vec<Prefix>,
    /// Neighbors, indexed by their address
    pub neighbors: BTreeMap<Ip, BgpNeighbor>,
}

impl BgpProcess {
    /// New BGP process without neighbors
    pub fn new(router_id: Ip, local_as: u32) -> Self {
        Self {
            router_id,
            local_as,
            multipath_ebgp: false,
            multipath_ibgp: false,
            networks: Vec::new(),
            neighbors: BTreeMap::new(),
        }
    }

    /// Add a neighbor
    pub fn neighbor(mut self, neighbor: BgpNeighbor) -> Self {
        self.neighbors.insert(neighbor.peer_address, neighbor);
        self
    }

    /// Originate a network
    pub fn network(mut self, prefix: Prefix) -> Self {
        self.networks.push(prefix);
        self
    }

    /// Enable multipath for both eBGP and iBGP
    pub fn multipath(mut self) -> Self {
        self.multipath_ebgp = true;
        self.multipath_ibgp = true;
        self
    }

    /// Returns `true` if the neighbor is in the same AS
    pub fn is_ibgp(&self, n: &BgpNeighbor) -> bool {
        n.remote_as == self.local_as
    }

    /// Returns `true` if any neighbor is a route reflector client
    pub fn is_route_reflector(&self) -> bool {
        self.neighbors.values().any(|n| n.route_reflector_client)
    }
}

/// OSPF process
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OspfProcess {
    /// Router id
    pub router_id: Ip,
    /// Maximum number of equal cost paths. Values above 1 enable multipath.
    pub max_paths: usize,
    /// Policy deciding which routes of other protocols are redistributed into OSPF
    pub export_policy: Option<String>,
}

impl OspfProcess {
    /// New OSPF process without multipath and without redistribution
    pub fn new(router_id: Ip) -> Self {
        Self { router_id, max_paths: 1, export_policy: None }
    }

    /// Enable multipath
    pub fn multipath(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    /// Set the redistribution policy
    pub fn export_policy(mut self, policy: impl Into<String>) -> Self {
        self.export_policy = Some(policy.into());
        self
    }
}

/// Line of a route filter list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteFilterLine {
    /// Action for matching routes
    pub action: LineAction,
    /// Matched prefixes
    pub range: PrefixRange,
}

/// Route filter list (prefix list). The first matching line decides, routes matching no line are
/// denied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteFilterList {
    /// Name of the list
    pub name: String,
    /// Lines of the list
    pub lines: Vec<RouteFilterLine>,
}

impl RouteFilterList {
    /// Empty route filter list
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), lines: Vec::new() }
    }

    /// Append a permit line
    pub fn permit(mut self, range: PrefixRange) -> Self {
        self.lines.push(RouteFilterLine { action: LineAction::Permit, range });
        self
    }

    /// Append a deny line
    pub fn deny(mut self, range: PrefixRange) -> Self {
        self.lines.push(RouteFilterLine { action: LineAction::Deny, range });
        self
    }
}

/// What a community list line matches on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommunityMatch {
    /// A single community
    Exact(Community),
    /// All communities whose string representation (`asn:value`) matches the regex
    Regex(String),
}

impl CommunityMatch {
    /// Returns `true` if the community matches. Invalid regexes match nothing.
    pub fn matches(&self, c: &Community) -> bool {
        match self {
            Self::Exact(x) => x == c,
            Self::Regex(r) => Regex::new(r).map(|re| re.is_match(&c.to_string())).unwrap_or(false),
        }
    }
}

/// Line of a community list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunityListLine {
    /// Action for matching routes
    pub action: LineAction,
    /// Community to match
    pub matcher: CommunityMatch,
}

/// Community list. The first line whose community is attached to the route decides, routes
/// matching no line are denied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunityList {
    /// Name of the list
    pub name: String,
    /// Lines of the list
    pub lines: Vec<CommunityListLine>,
}

impl CommunityList {
    /// Empty community list
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), lines: Vec::new() }
    }

    /// Append a line permitting a single community
    pub fn permit(mut self, c: Community) -> Self {
        self.lines.push(CommunityListLine {
            action: LineAction::Permit,
            matcher: CommunityMatch::Exact(c),
        });
        self
    }

    /// Append a line denying a single community
    pub fn deny(mut self, c: Community) -> Self {
        self.lines
            .push(CommunityListLine { action: LineAction::Deny, matcher: CommunityMatch::Exact(c) });
        self
    }

    /// Append a line permitting all communities matching the regex
    pub fn permit_regex(mut self, regex: impl Into<String>) -> Result<Self, ConfigError> {
        let regex = regex.into();
        Regex::new(&regex).map_err(|e| ConfigError::InvalidRegex(regex.clone(), e.to_string()))?;
        self.lines.push(CommunityListLine {
            action: LineAction::Permit,
            matcher: CommunityMatch::Regex(regex),
        });
        Ok(self)
    }
}

/// Configuration of a single router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Hostname, identifying the router
    pub hostname: String,
    /// Interfaces, indexed by their name
    pub interfaces: BTreeMap<String, Interface>,
    /// Static routes
    pub static_routes: Vec<StaticRoute>,
    /// Generated (aggregate) routes
    pub generated_routes: Vec<GeneratedRoute>,
    /// BGP process
    pub bgp: Option<BgpProcess>,
    /// OSPF process
    pub ospf: Option<OspfProcess>,
    /// Routing policies, indexed by their name
    pub routing_policies: BTreeMap<String, RoutingPolicy>,
    /// Route filter lists, indexed by their name
    pub route_filter_lists: BTreeMap<String, RouteFilterList>,
    /// Community lists, indexed by their name
    pub community_lists: BTreeMap<String, CommunityList>,
    /// IP access lists, indexed by their name
    pub ip_access_lists: BTreeMap<String, IpAccessList>,
}

impl Configuration {
    /// Create an empty configuration
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            interfaces: BTreeMap::new(),
            static_routes: Vec::new(),
            generated_routes: Vec::new(),
            bgp: None,
            ospf: None,
            routing_policies: BTreeMap::new(),
            route_filter_lists: BTreeMap::new(),
            community_lists: BTreeMap::new(),
            ip_access_lists: BTreeMap::new(),
        }
    }

    /// Add an interface
    pub fn add_interface(&mut self, iface: Interface) -> &mut Self {
        self.interfaces.insert(iface.name.clone(), iface);
        self
    }

    /// Add a static route
    pub fn add_static_route(&mut self, route: StaticRoute) -> &mut Self {
        self.static_routes.push(route);
        self
    }

    /// Add an aggregate
    pub fn add_aggregate(&mut self, network: Prefix, suppress_more_specifics: bool) -> &mut Self {
        self.generated_routes.push(GeneratedRoute { network, suppress_more_specifics });
        self
    }

    /// Set the BGP process
    pub fn set_bgp(&mut self, bgp: BgpProcess) -> &mut Self {
        self.bgp = Some(bgp);
        self
    }

    /// Set the OSPF process
    pub fn set_ospf(&mut self, ospf: OspfProcess) -> &mut Self {
        self.ospf = Some(ospf);
        self
    }

    /// Add a routing policy
    pub fn add_routing_policy(&mut self, policy: RoutingPolicy) -> &mut Self {
        self.routing_policies.insert(policy.name.clone(), policy);
        self
    }

    /// Add a route filter list
    pub fn add_route_filter_list(&mut self, list: RouteFilterList) -> &mut Self {
        self.route_filter_lists.insert(list.name.clone(), list);
        self
    }

    /// Add a community list
    pub fn add_community_list(&mut self, list: CommunityList) -> &mut Self {
        self.community_lists.insert(list.name.clone(), list);
        self
    }

    /// Add an IP access list
    pub fn add_ip_access_list(&mut self, acl: IpAccessList) -> &mut Self {
        self.ip_access_lists.insert(acl.name.clone(), acl);
        self
    }

    /// Iterator over all active interfaces
    pub fn active_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values().filter(|i| i.active)
    }

    /// Returns `true` if OSPF is configured and enabled on some interface
    pub fn runs_ospf(&self) -> bool {
        self.ospf.is_some() && self.active_interfaces().any(|i| i.ospf.is_some())
    }
}
