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

use crate::encoder::{Graph, Optimizations, Settings};
use crate::example_networks::*;
use crate::netconf::Prefix;
use crate::netconf::Protocol::*;

use lazy_static::lazy_static;
use maplit::btreeset;

lazy_static! {
    static ref DEFAULT: Settings = Settings::new();
    static ref NO_SLICING: Settings = Settings::new().slicing(false);
    static ref NO_MERGING: Settings = Settings::new().merging(false);
}

#[test]
fn slicing_drops_irrelevant_protocols() {
    let net = StaticChain::net();
    let q = StaticChain::question();
    let g = Graph::new(&net).unwrap();

    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 0);
    assert_eq!(opt.protocols("r1"), &[Static]);
    assert_eq!(opt.protocols("r2"), &[Static]);
    assert_eq!(opt.protocols("r3"), &[Connected]);
    assert!(opt.has_single_protocol("r1"));
    assert!(!opt.keep_admin_dist());
    assert!(!opt.keep_local_pref());
    assert!(!opt.keep_med());

    // without slicing, every router owns connected routes for its links
    let opt = Optimizations::compute(&g, &q.header_space, &NO_SLICING, 0);
    assert_eq!(opt.protocols("r1"), &[Connected, Static]);
    assert_eq!(opt.protocols("r3"), &[Connected]);
    assert!(opt.keep_admin_dist());
}

#[test]
fn bgp_attributes() {
    let net = BgpCommunityNet::net();
    let q = BgpCommunityNet::question();
    let g = Graph::new(&net).unwrap();
    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 0);

    assert_eq!(opt.protocols("r1"), &[Bgp]);
    assert!(opt.keep_local_pref());
    assert!(!opt.keep_med());
    assert!(opt.need_bgp_internal("r1"));
    assert!(opt.need_bgp_internal("r2"));
    assert!(opt.need_router_id("r1", Bgp));

    let shape = opt.shape("r1", Some(Bgp));
    assert!(shape.local_pref);
    assert!(shape.metric);
    assert!(shape.bgp_internal);
    assert!(shape.communities);
    assert!(!shape.ospf_area);
    assert!(!shape.ospf_type);
}

#[test]
fn merging() {
    let net = MergeNet::net();
    let q = MergeNet::question();
    let g = Graph::new(&net).unwrap();
    let r2_eth0 = g.find_edge("r2", "eth0").unwrap();
    let r3_eth0 = g.find_edge("r3", "eth0").unwrap();
    let r1_eth1 = g.find_edge("r1", "eth1").unwrap();

    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 0);
    assert!(opt.can_merge_export("r1", Bgp));
    assert!(opt.can_merge_export("r2", Bgp));
    assert!(opt.can_merge_import_export("r2", Bgp, r2_eth0));
    assert!(opt.can_merge_import_export("r3", Bgp, r3_eth0));
    // the environment has no export record to share
    assert!(!opt.can_merge_import_export("r1", Bgp, r1_eth1));

    // failures make every import individual
    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 1);
    assert!(!opt.can_merge_import_export("r2", Bgp, r2_eth0));

    let opt = Optimizations::compute(&g, &q.header_space, &NO_MERGING, 0);
    assert!(!opt.can_merge_export("r1", Bgp));
    assert!(!opt.can_merge_import_export("r2", Bgp, r2_eth0));
}

#[test]
fn import_policies_prevent_merging() {
    let net = BgpCommunityNet::net();
    let q = BgpCommunityNet::question();
    let g = Graph::new(&net).unwrap();
    let r1_eth1 = g.find_edge("r1", "eth1").unwrap();
    let r2_eth0 = g.find_edge("r2", "eth0").unwrap();
    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 0);
    // neither import over the iBGP session has a policy
    assert!(opt.can_merge_import_export("r1", Bgp, r1_eth1));
    assert!(opt.can_merge_import_export("r2", Bgp, r2_eth0));
    // the import from the environment has a policy
    let r1_eth0 = g.find_edge("r1", "eth0").unwrap();
    assert!(!opt.can_merge_import_export("r1", Bgp, r1_eth0));
}

#[test]
fn redistribution_and_aggregation() {
    let net = AggregateNet::net();
    let q = AggregateNet::question();
    let g = Graph::new(&net).unwrap();
    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 0);

    assert_eq!(opt.protocols("r1"), &[Connected, Static, Bgp]);
    assert_eq!(opt.redistributed_protocols("r1", Bgp), vec![Static]);
    assert_eq!(opt.suppressed_aggregates("r1"), &["10.0.0.0/16".parse::<Prefix>().unwrap()]);
    assert!(opt.suppressed_aggregates("r2").is_empty());
    assert!(opt.shape("r1", Some(Bgp)).history);
    assert!(opt.keep_admin_dist());
}

#[test]
fn ospf_origination() {
    let net = OspfOverflowNet::net();
    let q = OspfOverflowNet::question();
    let g = Graph::new(&net).unwrap();
    let opt = Optimizations::compute(&g, &q.header_space, &DEFAULT, 0);

    assert_eq!(opt.protocols("r1"), &[Connected, Ospf]);
    assert_eq!(opt.protocols("r2"), &[Ospf]);
    assert_eq!(opt.originated("r1", Ospf), &["10.0.0.0/24".parse::<Prefix>().unwrap()]);
    assert!(opt.originated("r2", Ospf).is_empty());
    assert_eq!(opt.ospf_areas(), &btreeset! {0});
    assert!(!opt.keep_ospf_area());
    assert!(!opt.keep_ospf_type());

    let r1_eth0 = g.find_edge("r1", "eth0").unwrap();
    let r1_eth1 = g.find_edge("r1", "eth1").unwrap();
    assert!(opt.exports_over(&g, "r1", Ospf, r1_eth0));
    // passive interfaces form no adjacency
    assert!(!opt.exports_over(&g, "r1", Ospf, r1_eth1));
    assert!(!opt.imports_over(&g, "r1", Ospf, r1_eth1));
}
