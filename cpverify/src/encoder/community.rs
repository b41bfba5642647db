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

//! # Community Registry
//!
//! Communities are encoded as one boolean per community variable. The registry collects every
//! community mentioned anywhere in the network (in policies or community lists). Regular
//! expressions get their own variable, together with an `Other` bucket standing for communities
//! matching the regex that do not appear literally in any configuration.

use crate::netconf::{
    BooleanExpr, Community, CommunityMatch, CommunitySetExpr, ConfigError, Configuration, Network,
    Statement,
};

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Community variable
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommunityVar {
    /// A single community
    Exact(Community),
    /// All communities matching the regex
    Regex(String),
    /// Communities matching the regex that are not enumerated in the configuration
    Other(String),
}

impl CommunityVar {
    /// Name used in variable names
    pub fn name(&self) -> String {
        match self {
            Self::Exact(c) => format!("community_{}", c),
            Self::Regex(r) => format!("community_regex({})", r),
            Self::Other(r) => format!("community_other({})", r),
        }
    }

    /// Returns `true` for regex variables, which are derived from the other variables.
    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }
}

impl fmt::Display for CommunityVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(c) => write!(f, "{}", c),
            Self::Regex(r) => write!(f, "/{}/", r),
            Self::Other(r) => write!(f, "other(/{}/)", r),
        }
    }
}

/// # Community Registry
/// See the [module documentation](self).
#[derive(Debug, Clone, Default)]
pub struct CommunityRegistry {
    vars: BTreeSet<CommunityVar>,
    dependencies: BTreeMap<String, Vec<CommunityVar>>,
}

impl CommunityRegistry {
    /// Scan all configurations of the network
    pub fn from_network(net: &Network) -> Result<Self, ConfigError> {
        let mut exact: BTreeSet<Community> = BTreeSet::new();
        let mut regexes: BTreeSet<String> = BTreeSet::new();

        for conf in net.configs().values() {
            for list in conf.community_lists.values() {
                for line in list.lines.iter() {
                    match &line.matcher {
                        CommunityMatch::Exact(c) => {
                            exact.insert(*c);
                        }
                        CommunityMatch::Regex(r) => {
                            regexes.insert(r.clone());
                        }
                    }
                }
            }
            for policy in conf.routing_policies.values() {
                let mut literals: Vec<&CommunitySetExpr> = Vec::new();
                let mut expr_literals: Vec<&CommunitySetExpr> = Vec::new();
                policy.walk(
                    &mut |s| match s {
                        Statement::AddCommunity(c)
                        | Statement::DeleteCommunity(c)
                        | Statement::RetainCommunity(c)
                        | Statement::SetCommunity(c) => literals.push(c),
                        _ => {}
                    },
                    &mut |e| {
                        if let BooleanExpr::MatchCommunitySet(c) = e {
                            expr_literals.push(c)
                        }
                    },
                );
                for set in literals.into_iter().chain(expr_literals) {
                    if let CommunitySetExpr::Literal(cs) = set {
                        exact.extend(cs.iter().copied());
                    }
                }
            }
        }

        let mut vars: BTreeSet<CommunityVar> = exact.iter().map(|c| CommunityVar::Exact(*c)).collect();
        let mut dependencies = BTreeMap::new();
        for r in regexes {
            let re = Regex::new(&r).map_err(|e| ConfigError::InvalidRegex(r.clone(), e.to_string()))?;
            let mut deps: Vec<CommunityVar> = exact
                .iter()
                .filter(|c| re.is_match(&c.to_string()))
                .map(|c| CommunityVar::Exact(*c))
                .collect();
            deps.push(CommunityVar::Other(r.clone()));
            vars.insert(CommunityVar::Regex(r.clone()));
            vars.insert(CommunityVar::Other(r.clone()));
            dependencies.insert(r, deps);
        }

        Ok(Self { vars, dependencies })
    }

    /// All community variables
    pub fn vars(&self) -> impl Iterator<Item = &CommunityVar> {
        self.vars.iter()
    }

    /// Number of community variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if the network uses no communities
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables a regex variable is derived from: all exact communities matching it, and its
    /// `Other` bucket.
    pub fn dependencies(&self, regex: &str) -> &[CommunityVar] {
        self.dependencies.get(regex).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All regex variables together with their dependencies
    pub fn all_dependencies(&self) -> impl Iterator<Item = (CommunityVar, &[CommunityVar])> {
        self.dependencies.iter().map(|(r, d)| (CommunityVar::Regex(r.clone()), d.as_slice()))
    }

    /// Variables written when a community set is added, deleted or retained. For named lists, only
    /// permit lines are considered. Regular expressions expand to their dependencies.
    pub fn resolve_write(
        &self,
        conf: &Configuration,
        set: &CommunitySetExpr,
    ) -> Option<Vec<CommunityVar>> {
        match set {
            CommunitySetExpr::Literal(cs) => Some(cs.iter().map(|c| CommunityVar::Exact(*c)).collect()),
            CommunitySetExpr::Named(n) => {
                let list = conf.community_lists.get(n)?;
                Some(
                    list.lines
                        .iter()
                        .filter(|l| l.action.is_permit())
                        .flat_map(|l| match &l.matcher {
                            CommunityMatch::Exact(c) => vec![CommunityVar::Exact(*c)],
                            CommunityMatch::Regex(r) => self.dependencies(r).to_vec(),
                        })
                        .collect(),
                )
            }
        }
    }
}
