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

use crate::example_networks::*;
use crate::netconf::*;

#[test]
fn parse_addresses() {
    let ip: Ip = "10.1.2.3".parse().unwrap();
    assert_eq!(ip, Ip::new(10, 1, 2, 3));
    assert_eq!(ip.to_string(), "10.1.2.3");
    assert!("10.1.2".parse::<Ip>().is_err());
    assert!("10.1.2.256".parse::<Ip>().is_err());

    // the network address is masked
    let p: Prefix = "10.1.2.3/16".parse().unwrap();
    assert_eq!(p.to_string(), "10.1.0.0/16");
    assert_eq!(p.first(), Ip::new(10, 1, 0, 0).as_u32());
    assert_eq!(p.last(), Ip::new(10, 1, 255, 255).as_u32());
    assert!("10.0.0.0/33".parse::<Prefix>().is_err());
    assert!("10.0.0.0".parse::<Prefix>().is_err());

    let default: Prefix = "0.0.0.0/0".parse().unwrap();
    assert!(default.is_empty());
    assert_eq!(default.last(), u32::MAX);

    // interface addresses keep the host part
    let a: InterfaceAddress = "10.0.0.1/24".parse().unwrap();
    assert_eq!(a.to_string(), "10.0.0.1/24");
    assert_eq!(a.prefix().to_string(), "10.0.0.0/24");
}

#[test]
fn prefix_containment() {
    let p16: Prefix = "10.0.0.0/16".parse().unwrap();
    let p24: Prefix = "10.0.1.0/24".parse().unwrap();
    let other: Prefix = "10.1.0.0/24".parse().unwrap();
    assert!(p16.contains_prefix(&p24));
    assert!(!p24.contains_prefix(&p16));
    assert!(p16.overlaps(&p24));
    assert!(p24.overlaps(&p16));
    assert!(!p16.overlaps(&other));
    assert!(p24.contains_ip(Ip::new(10, 0, 1, 200)));
    assert!(!p24.contains_ip(Ip::new(10, 0, 2, 1)));
}

#[test]
fn parse_communities() {
    let c: Community = "30:1".parse().unwrap();
    assert_eq!(c, Community::new(30, 1));
    assert_eq!(c.to_string(), "30:1");
    assert_eq!("1966081".parse::<Community>().unwrap(), c);
    assert!("30:x".parse::<Community>().is_err());
    assert!("70000:1".parse::<Community>().is_err());

    assert!(CommunityMatch::Exact(c).matches(&Community::new(30, 1)));
    assert!(!CommunityMatch::Exact(c).matches(&Community::new(30, 2)));
    assert!(CommunityMatch::Regex("^30:".to_string()).matches(&Community::new(30, 2)));
    assert!(!CommunityMatch::Regex("^30:".to_string()).matches(&Community::new(31, 2)));
    assert!(CommunityList::new("bad").permit_regex("(").is_err());
}

#[test]
fn parse_protocols() {
    assert_eq!("OSPF".parse::<Protocol>(), Ok(Protocol::Ospf));
    assert_eq!("ebgp".parse::<Protocol>(), Ok(Protocol::Bgp));
    assert_eq!("direct".parse::<Protocol>(), Ok(Protocol::Connected));
    assert_eq!(
        "rip".parse::<Protocol>(),
        Err(ConfigError::UnknownProtocol("rip".to_string()))
    );
    for p in Protocol::ALL.iter() {
        assert_eq!(Protocol::from_index(p.index()), Some(*p));
    }
    assert_eq!(Protocol::from_index(7), None);
}

#[test]
fn network_construction() {
    let mut net = Network::new();
    net.add_config(Configuration::new("r1")).unwrap();
    assert_eq!(
        net.add_config(Configuration::new("r1")),
        Err(ConfigError::DuplicateRouter("r1".to_string()))
    );
    assert_eq!(net.config("r2"), Err(ConfigError::UnknownRouter("r2".to_string())));

    let net = StaticChain::net();
    assert_eq!(net.configs().len(), 3);
    assert_eq!(net.links().len(), 2);

    let single = net.single_router("r2").unwrap();
    assert_eq!(single.configs().len(), 1);
    assert!(single.links().is_empty());
    assert_eq!(single.config("r2").unwrap(), net.config("r2").unwrap());
}

#[test]
fn header_space_slicing() {
    let hs = HeaderSpace::new().dst_ip("10.0.0.0/24".parse().unwrap());
    assert!(hs.may_match_dst(&"10.0.0.0/16".parse().unwrap()));
    assert!(hs.may_match_dst(&"10.0.0.128/25".parse().unwrap()));
    assert!(!hs.may_match_dst(&"10.0.1.0/24".parse().unwrap()));
    assert!(HeaderSpace::new().may_match_dst(&"192.168.0.0/16".parse().unwrap()));
}

#[test]
fn route_map_builder() {
    let clause = RouteMapBuilder::new()
        .order(10)
        .allow()
        .match_community(Community::new(30, 1))
        .set_local_pref(200)
        .build();
    assert_eq!(clause.order(), 10);
    assert!(clause.state().is_allow());

    let deny = RouteMapBuilder::new().order(5).deny().build();
    assert!(deny.state().is_deny());

    let policy = RoutingPolicyBuilder::new("IMPORT").clause(clause).clause(deny).build();
    assert_eq!(policy.name, "IMPORT");
    assert!(!policy.statements.is_empty());
    assert!(policy.callees().is_empty());
}

#[test]
fn all_examples_are_valid() {
    for name in EXAMPLE_NAMES.iter() {
        let (net, q) = example_by_name(name).unwrap();
        assert!(!net.configs().is_empty(), "{}", name);
        for d in q.destinations.iter() {
            assert!(net.config(&d.router).unwrap().interfaces.contains_key(&d.interface), "{}", name);
        }
    }
    assert!(example_by_name("unknown").is_none());
}
