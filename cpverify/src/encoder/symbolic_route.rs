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

//! # Symbolic Route Records
//!
//! A [`SymbolicRoute`] is a named bundle of solver terms describing one route: whether a route
//! exists at all (`permitted`), and the value of each of its attributes. Attributes that the
//! optimizer proved to be irrelevant are [`Attr::Elided`], and behave as if they always carried the
//! protocol's default value.

use super::community::{CommunityRegistry, CommunityVar};
use crate::netconf::Protocol;
use crate::smt::{BoolExpr, Context, IntExpr};

use std::collections::{BTreeMap, BTreeSet};

/// Optional attribute of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr<T> {
    /// The attribute is a solver term
    Present(T),
    /// The attribute is not encoded, and always equal to its default value
    Elided,
}

impl<T> Attr<T> {
    /// Returns the term, if present
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Present(x) => Some(x),
            Self::Elided => None,
        }
    }

    /// Returns `true` if the attribute is present
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Integer attributes of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntField {
    /// Prefix length of the route
    PrefixLength,
    /// Administrative distance
    AdminDist,
    /// BGP local preference
    LocalPref,
    /// Metric (OSPF cost, BGP AS path length)
    Metric,
    /// BGP multi-exit discriminator
    Med,
    /// Router id of the announcing router
    RouterId,
    /// OSPF area
    OspfArea,
    /// OSPF route type (0: intra-area, 1: inter-area, 2: external type 1, 3: external type 2)
    OspfType,
    /// Protocol that originally produced a redistributed route
    History,
}

impl IntField {
    /// All integer fields
    pub const ALL: [IntField; 9] = [
        IntField::PrefixLength,
        IntField::AdminDist,
        IntField::LocalPref,
        IntField::Metric,
        IntField::Med,
        IntField::RouterId,
        IntField::OspfArea,
        IntField::OspfType,
        IntField::History,
    ];

    /// Name used in variable names
    pub fn label(&self) -> &'static str {
        match self {
            Self::PrefixLength => "prefixLength",
            Self::AdminDist => "adminDist",
            Self::LocalPref => "localPref",
            Self::Metric => "metric",
            Self::Med => "med",
            Self::RouterId => "routerID",
            Self::OspfArea => "ospfArea",
            Self::OspfType => "ospfType",
            Self::History => "history",
        }
    }
}

/// OSPF type of intra-area routes
pub const OSPF_TYPE_O: i64 = 0;
/// OSPF type of inter-area routes
pub const OSPF_TYPE_OIA: i64 = 1;
/// OSPF type of external routes (type 1)
pub const OSPF_TYPE_E1: i64 = 2;
/// OSPF type of external routes (type 2)
pub const OSPF_TYPE_E2: i64 = 3;
/// Default local preference
pub const DEFAULT_LOCAL_PREF: i64 = 100;
/// Default metric of routes redistributed into OSPF
pub const DEFAULT_OSPF_REDISTRIBUTION_METRIC: i64 = 20;

/// Role of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    /// Route received over a logical edge
    Import,
    /// Route sent over a logical edge
    Export,
    /// Route announced by the environment
    Environment,
    /// Route of another protocol redistributed on the same router
    Redistribution,
    /// Best route of a protocol
    BestPerProtocol,
    /// Best route across all protocols
    BestOverall,
}

/// Which attributes of a record are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordShape {
    /// Administrative distance
    pub admin_dist: bool,
    /// Local preference
    pub local_pref: bool,
    /// Metric
    pub metric: bool,
    /// MED
    pub med: bool,
    /// Router id
    pub router_id: bool,
    /// OSPF area
    pub ospf_area: bool,
    /// OSPF type
    pub ospf_type: bool,
    /// iBGP flag
    pub bgp_internal: bool,
    /// History (redistribution source)
    pub history: bool,
    /// Communities
    pub communities: bool,
}

impl RecordShape {
    fn has(&self, f: IntField) -> bool {
        match f {
            IntField::PrefixLength => true,
            IntField::AdminDist => self.admin_dist,
            IntField::LocalPref => self.local_pref,
            IntField::Metric => self.metric,
            IntField::Med => self.med,
            IntField::RouterId => self.router_id,
            IntField::OspfArea => self.ospf_area,
            IntField::OspfType => self.ospf_type,
            IntField::History => self.history,
        }
    }
}

/// Index of a record in the [`RecordStore`]
pub type RecordId = usize;

/// # Symbolic Route
/// See the [module documentation](self).
#[derive(Debug, Clone)]
pub struct SymbolicRoute {
    /// Name of the record, prefix of all its variables
    pub name: String,
    /// Protocol of the record. `None` for the overall best route of a router.
    pub proto: Option<Protocol>,
    /// Role of the record
    pub kind: RecordKind,
    /// A route exists
    pub permitted: BoolExpr,
    /// Prefix length
    pub prefix_length: Attr<IntExpr>,
    /// Administrative distance
    pub admin_dist: Attr<IntExpr>,
    /// Local preference
    pub local_pref: Attr<IntExpr>,
    /// Metric
    pub metric: Attr<IntExpr>,
    /// MED
    pub med: Attr<IntExpr>,
    /// Router id
    pub router_id: Attr<IntExpr>,
    /// OSPF area
    pub ospf_area: Attr<IntExpr>,
    /// OSPF type
    pub ospf_type: Attr<IntExpr>,
    /// Route learned over iBGP
    pub bgp_internal: Attr<BoolExpr>,
    /// Protocol that produced the route
    pub history: Attr<IntExpr>,
    /// One boolean per community variable
    pub communities: BTreeMap<CommunityVar, BoolExpr>,
}

impl SymbolicRoute {
    /// Allocate a new record with fresh variables for all attributes of the shape
    pub fn new(
        ctx: &mut Context,
        name: impl Into<String>,
        proto: Option<Protocol>,
        kind: RecordKind,
        shape: RecordShape,
        registry: &CommunityRegistry,
    ) -> Self {
        let name = name.into();
        let mut int = |present: bool, label: &str| {
            if present {
                Attr::Present(ctx.int_var(&format!("{}_{}", name, label)))
            } else {
                Attr::Elided
            }
        };
        let prefix_length = int(true, IntField::PrefixLength.label());
        let admin_dist = int(shape.admin_dist, IntField::AdminDist.label());
        let local_pref = int(shape.local_pref, IntField::LocalPref.label());
        let metric = int(shape.metric, IntField::Metric.label());
        let med = int(shape.med, IntField::Med.label());
        let router_id = int(shape.router_id, IntField::RouterId.label());
        let ospf_area = int(shape.ospf_area, IntField::OspfArea.label());
        let ospf_type = int(shape.ospf_type, IntField::OspfType.label());
        let history = int(shape.history, IntField::History.label());
        let permitted = ctx.bool_var(&format!("{}_permitted", name));
        let bgp_internal = if shape.bgp_internal {
            Attr::Present(ctx.bool_var(&format!("{}_bgpInternal", name)))
        } else {
            Attr::Elided
        };
        let communities = if shape.communities {
            registry
                .vars()
                .map(|cv| (cv.clone(), ctx.bool_var(&format!("{}_{}", name, cv.name()))))
                .collect()
        } else {
            BTreeMap::new()
        };
        Self {
            name,
            proto,
            kind,
            permitted,
            prefix_length,
            admin_dist,
            local_pref,
            metric,
            med,
            router_id,
            ospf_area,
            ospf_type,
            bgp_internal,
            history,
            communities,
        }
    }

    /// Shape of the record
    pub fn shape(&self) -> RecordShape {
        RecordShape {
            admin_dist: self.admin_dist.is_present(),
            local_pref: self.local_pref.is_present(),
            metric: self.metric.is_present(),
            med: self.med.is_present(),
            router_id: self.router_id.is_present(),
            ospf_area: self.ospf_area.is_present(),
            ospf_type: self.ospf_type.is_present(),
            bgp_internal: self.bgp_internal.is_present(),
            history: self.history.is_present(),
            communities: !self.communities.is_empty(),
        }
    }

    /// Integer attribute
    pub fn int_attr(&self, f: IntField) -> &Attr<IntExpr> {
        match f {
            IntField::PrefixLength => &self.prefix_length,
            IntField::AdminDist => &self.admin_dist,
            IntField::LocalPref => &self.local_pref,
            IntField::Metric => &self.metric,
            IntField::Med => &self.med,
            IntField::RouterId => &self.router_id,
            IntField::OspfArea => &self.ospf_area,
            IntField::OspfType => &self.ospf_type,
            IntField::History => &self.history,
        }
    }

    /// Replace an integer attribute
    pub fn set_int_attr(&mut self, f: IntField, value: Attr<IntExpr>) {
        let slot = match f {
            IntField::PrefixLength => &mut self.prefix_length,
            IntField::AdminDist => &mut self.admin_dist,
            IntField::LocalPref => &mut self.local_pref,
            IntField::Metric => &mut self.metric,
            IntField::Med => &mut self.med,
            IntField::RouterId => &mut self.router_id,
            IntField::OspfArea => &mut self.ospf_area,
            IntField::OspfType => &mut self.ospf_type,
            IntField::History => &mut self.history,
        };
        *slot = value;
    }

    /// Overwrite an integer attribute if it is present.
    pub fn overwrite(&mut self, f: IntField, value: IntExpr) {
        if self.int_attr(f).is_present() {
            self.set_int_attr(f, Attr::Present(value));
        }
    }

    /// Default value of an integer attribute for the protocol of this record.
    pub fn default_value(&self, f: IntField) -> i64 {
        match f {
            IntField::PrefixLength => 0,
            IntField::AdminDist => self.proto.map(|p| p.default_admin_distance()).unwrap_or(0),
            IntField::LocalPref => DEFAULT_LOCAL_PREF,
            IntField::Metric => 0,
            IntField::Med => 0,
            IntField::RouterId => 0,
            IntField::OspfArea => 0,
            IntField::OspfType => OSPF_TYPE_O,
            IntField::History => self.proto.map(|p| p.index()).unwrap_or(0),
        }
    }

    /// Value of an integer attribute, using the default if it is elided.
    pub fn value(&self, f: IntField) -> IntExpr {
        match self.int_attr(f) {
            Attr::Present(x) => x.clone(),
            Attr::Elided => IntExpr::constant(self.default_value(f)),
        }
    }

    /// Value of the iBGP flag, `false` if elided.
    pub fn internal(&self) -> BoolExpr {
        match &self.bgp_internal {
            Attr::Present(x) => x.clone(),
            Attr::Elided => BoolExpr::ff(),
        }
    }

    /// Value of a community variable, `false` if the record carries no communities.
    pub fn community(&self, cv: &CommunityVar) -> BoolExpr {
        self.communities.get(cv).cloned().unwrap_or_else(BoolExpr::ff)
    }

    /// Domain constraints of all present attributes.
    pub fn bounds(&self, ospf_areas: &BTreeSet<u32>) -> BoolExpr {
        let mut cs = Vec::new();
        for f in IntField::ALL.iter() {
            let x = match self.int_attr(*f) {
                Attr::Present(x) => x,
                Attr::Elided => continue,
            };
            cs.push(match f {
                IntField::PrefixLength => x.in_range(0, 32),
                IntField::AdminDist => x.in_range(0, 255),
                IntField::LocalPref | IntField::Med | IntField::RouterId => {
                    x.in_range(0, u32::MAX as i64)
                }
                IntField::Metric => {
                    x.in_range(0, self.proto.map(|p| p.max_metric()).unwrap_or(65535))
                }
                IntField::OspfArea if !ospf_areas.is_empty() => BoolExpr::or_all(
                    ospf_areas.iter().map(|a| x.equals(&IntExpr::constant(*a as i64))),
                ),
                IntField::OspfArea => x.in_range(0, u32::MAX as i64),
                IntField::OspfType => x.in_range(OSPF_TYPE_O, OSPF_TYPE_E2),
                IntField::History => x.in_range(0, 3),
            });
        }
        BoolExpr::and_all(cs)
    }

    /// If no route exists, all attributes carry their default values.
    pub fn unused_defaults(&self) -> BoolExpr {
        let mut cs = Vec::new();
        for f in IntField::ALL.iter() {
            if let Attr::Present(x) = self.int_attr(*f) {
                cs.push(x.equals(&IntExpr::constant(self.default_value(*f))));
            }
        }
        if let Attr::Present(b) = &self.bgp_internal {
            cs.push(b.not());
        }
        cs.extend(self.communities.values().map(|c| c.not()));
        self.permitted.not().implies(&BoolExpr::and_all(cs))
    }

    /// Regex community variables are equal to the disjunction of their dependencies.
    pub fn community_dependencies(&self, registry: &CommunityRegistry) -> BoolExpr {
        BoolExpr::and_all(registry.all_dependencies().filter_map(|(re, deps)| {
            let var = self.communities.get(&re)?;
            Some(var.iff(&BoolExpr::or_all(deps.iter().map(|d| self.community(d)))))
        }))
    }

    /// Both records describe the same route. Both records must have the same shape, and
    /// communities are only compared if `communities` is set.
    pub fn equal(&self, other: &SymbolicRoute, communities: bool) -> BoolExpr {
        let mut cs: Vec<BoolExpr> = vec![self.permitted.iff(&other.permitted)];
        cs.extend(self.equal_attributes(other, communities));
        BoolExpr::and_all(cs)
    }

    /// Equality of all attributes encoded in `self` (without `permitted`). Attributes elided in
    /// `other` compare by their defaults.
    pub fn equal_attributes(&self, other: &SymbolicRoute, communities: bool) -> Vec<BoolExpr> {
        let mut cs = Vec::new();
        for f in IntField::ALL.iter() {
            if self.int_attr(*f).is_present() {
                cs.push(self.value(*f).equals(&other.value(*f)));
            }
        }
        if self.bgp_internal.is_present() {
            cs.push(self.internal().iff(&other.internal()));
        }
        if communities {
            for (cv, c) in self.communities.iter() {
                if !cv.is_regex() {
                    cs.push(c.iff(&other.community(cv)));
                }
            }
        }
        cs
    }
}

/// Arena of all records of a slice
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<SymbolicRoute>,
}

impl RecordStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new record
    pub fn alloc(
        &mut self,
        ctx: &mut Context,
        name: impl Into<String>,
        proto: Option<Protocol>,
        kind: RecordKind,
        shape: RecordShape,
        registry: &CommunityRegistry,
    ) -> RecordId {
        self.records.push(SymbolicRoute::new(ctx, name, proto, kind, shape, registry));
        self.records.len() - 1
    }

    /// Access a record
    pub fn get(&self, id: RecordId) -> &SymbolicRoute {
        &self.records[id]
    }

    /// All records
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &SymbolicRoute)> {
        self.records.iter().enumerate()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record is allocated
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
