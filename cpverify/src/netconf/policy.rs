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

//! # Routing Policies
//!
//! Routing policies are imperative programs over a route. They consist of [`Statement`]s, which can
//! modify the route, branch on a [`BooleanExpr`], call other policies, and terminate with an
//! accept or reject decision. Route maps (ordered permit/deny clauses) are a special case, and can
//! be built using the [`RouteMapBuilder`] and [`RoutingPolicyBuilder`].

use crate::netconf::{Community, Prefix, PrefixRange, Protocol};
use std::fmt;

/// Integer value written by a set statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueExpr {
    /// Constant value
    Literal(u32),
    /// Increment the current value
    Increment(u32),
    /// Decrement the current value
    Decrement(u32),
}

/// Comparison operator used in match statements on integer attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntComparator {
    /// Equal
    Eq,
    /// Greater or equal
    Ge,
    /// Strictly greater
    Gt,
    /// Less or equal
    Le,
    /// Strictly less
    Lt,
}

/// Set of prefixes used in a match statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrefixSetExpr {
    /// Explicit list of prefix ranges
    Explicit(Vec<PrefixRange>),
    /// Reference to a route filter list
    Named(String),
}

/// Set of communities used in match and set statements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommunitySetExpr {
    /// Explicit list of communities
    Literal(Vec<Community>),
    /// Reference to a community list
    Named(String),
}

/// OSPF external metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OspfMetricType {
    /// External type 1 (cost increases along the path)
    E1,
    /// External type 2 (cost stays constant)
    E2,
}

/// Boolean expression of a routing policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BooleanExpr {
    /// Always true
    True,
    /// Always false
    False,
    /// Negation
    Not(Box<BooleanExpr>),
    /// All sub-expressions must be true
    Conjunction(Vec<BooleanExpr>),
    /// Some sub-expression must be true
    Disjunction(Vec<BooleanExpr>),
    /// Chain of policies. The chain stops at the first policy rejecting the route; policies that
    /// fall through pass on to the next one, and at the end the default policy decides.
    ConjunctionChain(Vec<BooleanExpr>),
    /// Chain of policies. The chain stops at the first policy accepting the route.
    DisjunctionChain(Vec<BooleanExpr>),
    /// Matches routes of one of the protocols
    MatchProtocol(Vec<Protocol>),
    /// Matches the destination prefix
    MatchPrefixSet(PrefixSetExpr),
    /// Matches the communities of the route
    MatchCommunitySet(CommunitySetExpr),
    /// Compares the local preference
    MatchLocalPreference(IntComparator, u32),
    /// Compares the metric
    MatchMetric(IntComparator, u32),
    /// Evaluates another policy and uses its result
    CallExpr(String),
    /// True if the current policy was called as an expression
    CallExprContext,
    /// True if the current policy was called as a statement
    CallStatementContext,
    /// Expression that cannot be encoded
    Unsupported(String),
}

impl BooleanExpr {
    /// Negate the expression
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Visit the expression and all its children.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a BooleanExpr)) {
        f(self);
        match self {
            Self::Not(e) => e.walk(f),
            Self::Conjunction(es)
            | Self::Disjunction(es)
            | Self::ConjunctionChain(es)
            | Self::DisjunctionChain(es) => {
                for e in es {
                    e.walk(f)
                }
            }
            _ => {}
        }
    }
}

/// Statement of a routing policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Branch on a condition
    If {
        /// Condition
        guard: BooleanExpr,
        /// Statements executed if the condition is true
        true_statements: Vec<Statement>,
        /// Statements executed if the condition is false
        false_statements: Vec<Statement>,
    },
    /// Write the local preference
    SetLocalPreference(ValueExpr),
    /// Write the metric (for BGP, this writes the MED)
    SetMetric(ValueExpr),
    /// Write the MED
    SetMed(ValueExpr),
    /// Write the OSPF external metric type
    SetOspfMetricType(OspfMetricType),
    /// Write the administrative distance
    SetAdministrativeCost(ValueExpr),
    /// Attach communities
    AddCommunity(CommunitySetExpr),
    /// Remove communities
    DeleteCommunity(CommunitySetExpr),
    /// Remove all communities except the given ones
    RetainCommunity(CommunitySetExpr),
    /// Replace all communities
    SetCommunity(CommunitySetExpr),
    /// Prepend the own AS `n` times
    PrependAsPath(u32),
    /// Accept the route and stop
    ExitAccept,
    /// Reject the route and stop
    ExitReject,
    /// Return true from the current policy
    ReturnTrue,
    /// Return false from the current policy
    ReturnFalse,
    /// Return the local default action
    ReturnLocalDefaultAction,
    /// Return without a decision (used by chains)
    FallThrough,
    /// Accept routes if no decision is taken
    SetDefaultActionAccept,
    /// Reject routes if no decision is taken
    SetDefaultActionReject,
    /// Local default action of the current policy is accept
    SetLocalDefaultActionAccept,
    /// Local default action of the current policy is reject
    SetLocalDefaultActionReject,
    /// Policy called at the end of a chain
    SetDefaultPolicy(String),
    /// Call another policy, ignoring its result
    CallStatement(String),
    /// Comment, no effect
    Comment(String),
    /// Statement that cannot be encoded
    Unsupported(String),
}

impl Statement {
    /// Visit all statements and all boolean expressions of the statement, recursively.
    pub fn walk<'a>(
        &'a self,
        on_stmt: &mut dyn FnMut(&'a Statement),
        on_expr: &mut dyn FnMut(&'a BooleanExpr),
    ) {
        on_stmt(self);
        if let Self::If { guard, true_statements, false_statements } = self {
            guard.walk(on_expr);
            for s in true_statements.iter().chain(false_statements.iter()) {
                s.walk(on_stmt, on_expr);
            }
        }
    }
}

/// Routing policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingPolicy {
    /// Name of the policy
    pub name: String,
    /// Statements, executed in order
    pub statements: Vec<Statement>,
}

impl RoutingPolicy {
    /// Create a new policy from a list of statements
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self { name: name.into(), statements }
    }

    /// Visit all statements and expressions of the policy
    pub fn walk<'a>(
        &'a self,
        on_stmt: &mut dyn FnMut(&'a Statement),
        on_expr: &mut dyn FnMut(&'a BooleanExpr),
    ) {
        for s in self.statements.iter() {
            s.walk(on_stmt, on_expr);
        }
    }

    /// Names of all policies called by this policy (not recursively)
    pub fn callees(&self) -> Vec<&str> {
        let mut called: Vec<&str> = Vec::new();
        let mut exprs: Vec<&str> = Vec::new();
        self.walk(
            &mut |s| match s {
                Statement::CallStatement(n) | Statement::SetDefaultPolicy(n) => called.push(n),
                _ => {}
            },
            &mut |e| {
                if let BooleanExpr::CallExpr(n) = e {
                    exprs.push(n)
                }
            },
        );
        called.extend(exprs);
        called
    }
}

/// # Route Map clause
/// A clause of a route map matches routes with a conjunction of expressions. Matching routes are
/// either denied, or modified by the set statements and accepted. Use the [`RouteMapBuilder`] to
/// build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMapClause {
    /// In which order should the clauses be checked. Lower values are checked earlier.
    pub(crate) order: usize,
    /// Either Allow or Deny.
    pub(crate) state: RouteMapState,
    /// Match expressions, connected in an and
    pub(crate) conds: Vec<BooleanExpr>,
    /// Set statements
    pub(crate) set: Vec<Statement>,
}

impl RouteMapClause {
    /// Returns the order of the clause.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the state, either Allow or Deny.
    pub fn state(&self) -> RouteMapState {
        self.state
    }

    /// Compile the clause into an `If` statement, continuing with `otherwise` if the clause does
    /// not match.
    fn compile(&self, otherwise: Vec<Statement>) -> Vec<Statement> {
        let mut body = self.set.clone();
        body.push(match self.state {
            RouteMapState::Allow => Statement::ExitAccept,
            RouteMapState::Deny => Statement::ExitReject,
        });
        let guard = match self.conds.len() {
            0 => BooleanExpr::True,
            1 => self.conds[0].clone(),
            _ => BooleanExpr::Conjunction(self.conds.clone()),
        };
        vec![Statement::If { guard, true_statements: body, false_statements: otherwise }]
    }
}

/// State of a route map clause, which can either be allow or deny
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMapState {
    /// Matching routes are accepted
    Allow,
    /// Matching routes are rejected
    Deny,
}

impl RouteMapState {
    /// Returns `true` if the state is set to `Allow`.
    pub fn is_allow(&self) -> bool {
        self == &Self::Allow
    }

    /// Returns `true` if the state is set to `Deny`.
    pub fn is_deny(&self) -> bool {
        self == &Self::Deny
    }
}

/// # Route Map Builder
///
/// Convenience type to build a route map clause. You are required to at least call `order` and
/// `state` once on the builder, before you can call `build`. If you don't add any match
/// condition, the clause matches any route.
/// ```
/// # use cpverify::netconf::*;
/// let clause = RouteMapBuilder::new()
///     .order(10)
///     .allow()
///     .match_community("30:1".parse().unwrap())
///     .set_local_pref(200)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct RouteMapBuilder {
    order: Option<usize>,
    state: Option<RouteMapState>,
    conds: Vec<BooleanExpr>,
    set: Vec<Statement>,
}

impl RouteMapBuilder {
    /// Create an empty RouteMapBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the order of the clause.
    pub fn order(&mut self, order: usize) -> &mut Self {
        self.order = Some(order);
        self
    }

    /// Set the state of the clause.
    pub fn state(&mut self, state: RouteMapState) -> &mut Self {
        self.state = Some(state);
        self
    }

    /// Set the state of the clause to allow.
    pub fn allow(&mut self) -> &mut Self {
        self.state = Some(RouteMapState::Allow);
        self
    }

    /// Set the state of the clause to deny.
    pub fn deny(&mut self) -> &mut Self {
        self.state = Some(RouteMapState::Deny);
        self
    }

    /// Add an arbitrary match condition.
    pub fn cond(&mut self, cond: BooleanExpr) -> &mut Self {
        self.conds.push(cond);
        self
    }

    /// Match the destination prefix exactly
    pub fn match_prefix(&mut self, prefix: Prefix) -> &mut Self {
        self.conds.push(BooleanExpr::MatchPrefixSet(PrefixSetExpr::Explicit(vec![
            PrefixRange::exact(prefix),
        ])));
        self
    }

    /// Match the destination prefix with a prefix range
    pub fn match_prefix_range(&mut self, range: PrefixRange) -> &mut Self {
        self.conds.push(BooleanExpr::MatchPrefixSet(PrefixSetExpr::Explicit(vec![range])));
        self
    }

    /// Match the destination prefix with a named route filter list
    pub fn match_prefix_list(&mut self, list: impl Into<String>) -> &mut Self {
        self.conds.push(BooleanExpr::MatchPrefixSet(PrefixSetExpr::Named(list.into())));
        self
    }

    /// Match routes carrying the community
    pub fn match_community(&mut self, community: Community) -> &mut Self {
        self.conds
            .push(BooleanExpr::MatchCommunitySet(CommunitySetExpr::Literal(vec![community])));
        self
    }

    /// Match routes using a named community list
    pub fn match_community_list(&mut self, list: impl Into<String>) -> &mut Self {
        self.conds.push(BooleanExpr::MatchCommunitySet(CommunitySetExpr::Named(list.into())));
        self
    }

    /// Match routes of a protocol
    pub fn match_protocol(&mut self, proto: Protocol) -> &mut Self {
        self.conds.push(BooleanExpr::MatchProtocol(vec![proto]));
        self
    }

    /// Add an arbitrary set statement.
    pub fn add_set(&mut self, set: Statement) -> &mut Self {
        self.set.push(set);
        self
    }

    /// Overwrite the local preference
    pub fn set_local_pref(&mut self, local_pref: u32) -> &mut Self {
        self.set.push(Statement::SetLocalPreference(ValueExpr::Literal(local_pref)));
        self
    }

    /// Overwrite the metric
    pub fn set_metric(&mut self, metric: u32) -> &mut Self {
        self.set.push(Statement::SetMetric(ValueExpr::Literal(metric)));
        self
    }

    /// Overwrite the MED
    pub fn set_med(&mut self, med: u32) -> &mut Self {
        self.set.push(Statement::SetMed(ValueExpr::Literal(med)));
        self
    }

    /// Attach a community
    pub fn add_community(&mut self, community: Community) -> &mut Self {
        self.set.push(Statement::AddCommunity(CommunitySetExpr::Literal(vec![community])));
        self
    }

    /// Remove a community
    pub fn delete_community(&mut self, community: Community) -> &mut Self {
        self.set.push(Statement::DeleteCommunity(CommunitySetExpr::Literal(vec![community])));
        self
    }

    /// Prepend the AS path
    pub fn prepend(&mut self, n: u32) -> &mut Self {
        self.set.push(Statement::PrependAsPath(n));
        self
    }

    /// Set the OSPF external type
    pub fn set_ospf_type(&mut self, t: OspfMetricType) -> &mut Self {
        self.set.push(Statement::SetOspfMetricType(t));
        self
    }

    /// Build the clause.
    ///
    /// # Panics
    /// The function panics in the following cases:
    /// - The order is not set (`order` was not called),
    /// - The state is not set (neither `state`, `allow` nor `deny` were called),
    pub fn build(&self) -> RouteMapClause {
        let order = match self.order {
            Some(o) => o,
            None => panic!("Order was not set for a Route-Map!"),
        };
        let state = match self.state {
            Some(s) => s,
            None => panic!("State was not set for a Route-Map!"),
        };
        let conds = self.conds.clone();
        let set = if state.is_deny() { vec![] } else { self.set.clone() };
        RouteMapClause { order, state, conds, set }
    }
}

/// # Routing Policy Builder
///
/// Builds a [`RoutingPolicy`] out of route map clauses. Clauses are checked by increasing order;
/// routes matching no clause are rejected.
///
/// ```
/// # use cpverify::netconf::*;
/// let policy = RoutingPolicyBuilder::new("IMPORT")
///     .clause(RouteMapBuilder::new().order(10).deny().match_prefix("10.0.0.0/8".parse().unwrap()).build())
///     .clause(RouteMapBuilder::new().order(20).allow().build())
///     .build();
/// assert_eq!(policy.name, "IMPORT");
/// ```
#[derive(Debug)]
pub struct RoutingPolicyBuilder {
    name: String,
    clauses: Vec<RouteMapClause>,
    prefix: Vec<Statement>,
}

impl RoutingPolicyBuilder {
    /// Create a builder for a policy with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), clauses: Vec::new(), prefix: Vec::new() }
    }

    /// Add a clause
    pub fn clause(mut self, clause: RouteMapClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Add a statement executed before the clauses
    pub fn statement(mut self, stmt: Statement) -> Self {
        self.prefix.push(stmt);
        self
    }

    /// Build the policy
    pub fn build(mut self) -> RoutingPolicy {
        self.clauses.sort_by_key(|c| c.order);
        let body = self
            .clauses
            .iter()
            .rev()
            .fold(vec![Statement::ExitReject], |otherwise, clause| clause.compile(otherwise));
        let mut statements = self.prefix;
        statements.extend(body);
        RoutingPolicy::new(self.name, statements)
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(x) => write!(f, "{}", x),
            Self::Increment(x) => write!(f, "+{}", x),
            Self::Decrement(x) => write!(f, "-{}", x),
        }
    }
}
