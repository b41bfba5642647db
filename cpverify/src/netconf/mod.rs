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

//! # NetConf
//!
//! Canonical configuration model of a network. A [`Network`] consists of the configuration of every
//! router, and the physical links connecting interfaces of these routers. The model is vendor
//! independent, parsing device configurations is out of scope.
//!
//! ## Example usage
//!
//! ```rust
//! use cpverify::netconf::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let mut r1 = Configuration::new("r1");
//!     r1.add_interface(Interface::new("eth0").address("10.0.0.1/30".parse()?).ospf(0, 1));
//!     r1.set_ospf(OspfProcess::new("1.1.1.1".parse()?));
//!
//!     let mut r2 = Configuration::new("r2");
//!     r2.add_interface(Interface::new("eth0").address("10.0.0.2/30".parse()?).ospf(0, 1));
//!     r2.set_ospf(OspfProcess::new("2.2.2.2".parse()?));
//!
//!     let mut net = Network::new();
//!     net.add_config(r1)?;
//!     net.add_config(r2)?;
//!     net.add_link("r1", "eth0", "r2", "eth0");
//!     assert_eq!(net.links().len(), 1);
//!     Ok(())
//! }
//! ```

mod acl;
mod config;
mod policy;
mod types;

pub use acl::{AclLine, HeaderSpace, IpAccessList, TcpFlags};
pub use config::{
    BgpNeighbor, BgpProcess, CommunityList, CommunityListLine, CommunityMatch, Configuration,
    GeneratedRoute, Interface, OspfInterface, OspfProcess, RouteFilterLine, RouteFilterList,
    StaticRoute,
};
pub use policy::{
    BooleanExpr, CommunitySetExpr, IntComparator, OspfMetricType, PrefixSetExpr, RouteMapBuilder,
    RouteMapClause, RouteMapState, RoutingPolicy, RoutingPolicyBuilder, Statement, ValueExpr,
};
pub use types::{
    Community, ConfigError, InterfaceAddress, Ip, LineAction, Prefix, PrefixRange, Protocol,
    SubRange,
};

use std::collections::BTreeMap;

/// One end of a physical link
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    /// Hostname of the router
    pub router: String,
    /// Name of the interface
    pub interface: String,
}

/// Physical link between two interfaces
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    /// First endpoint
    pub a: Endpoint,
    /// Second endpoint
    pub b: Endpoint,
}

/// # Network
/// All router configurations, together with the physical topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    configs: BTreeMap<String, Configuration>,
    links: Vec<Link>,
}

impl Network {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the configuration of a router. Returns an error if a router with the same hostname
    /// exists already.
    pub fn add_config(&mut self, config: Configuration) -> Result<(), ConfigError> {
        if self.configs.contains_key(&config.hostname) {
            return Err(ConfigError::DuplicateRouter(config.hostname));
        }
        self.configs.insert(config.hostname.clone(), config);
        Ok(())
    }

    /// Connect two interfaces. The routers do not need to be configured (yet).
    pub fn add_link(&mut self, r1: &str, i1: &str, r2: &str, i2: &str) {
        self.links.push(Link {
            a: Endpoint { router: r1.to_string(), interface: i1.to_string() },
            b: Endpoint { router: r2.to_string(), interface: i2.to_string() },
        })
    }

    /// All configurations, indexed by hostname
    pub fn configs(&self) -> &BTreeMap<String, Configuration> {
        &self.configs
    }

    /// Configuration of a single router
    pub fn config(&self, router: &str) -> Result<&Configuration, ConfigError> {
        self.configs.get(router).ok_or_else(|| ConfigError::UnknownRouter(router.to_string()))
    }

    /// Mutable access to the configuration of a single router
    pub fn config_mut(&mut self, router: &str) -> Result<&mut Configuration, ConfigError> {
        self.configs.get_mut(router).ok_or_else(|| ConfigError::UnknownRouter(router.to_string()))
    }

    /// All physical links
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Network containing only a single router, without any link. Every interface of the router
    /// becomes an environment edge.
    pub fn single_router(&self, router: &str) -> Result<Network, ConfigError> {
        let mut net = Network::new();
        net.add_config(self.config(router)?.clone())?;
        Ok(net)
    }
}
