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

//! # Encoder
//!
//! Translation of the network into constraints over routing attributes. The encoder works in
//! stages, each one building on the previous:
//!
//! 1. The [`Graph`] joins the interfaces of the routers with the physical links.
//! 2. The [`Optimizations`] decide which protocols, attributes and records are needed for the
//!    header space of the query.
//! 3. The [`LogicalGraph`] allocates one [`SymbolicRoute`] per import, export and redistribution
//!    edge, sharing records where the optimizations allow it.
//! 4. The [`TransferFunction`] interpreter encodes the routing policies between the records.
//! 5. The [`EncoderSlice`] adds the best route selection and the forwarding decisions.
//!
//! An [`Encoder`] owns the solver [`Context`] and one or more slices. Properties are added on top
//! of the forwarding variables by the [`properties`](crate::properties) module.

mod community;
mod decision;
mod graph;
mod logical_graph;
mod optimizations;
mod packet;
mod slice;
mod symbolic_route;
pub mod transfer;

pub use community::{CommunityRegistry, CommunityVar};
pub use decision::{greater_or_equal, is_chosen, select_best};
pub use graph::{EdgeId, Graph, GraphEdge};
pub use logical_graph::{Direction, LogicalEdge, LogicalEdgeId, LogicalEdgeKind, LogicalGraph};
pub use optimizations::Optimizations;
pub use packet::{in_prefix, SymbolicPacket, TCP_FLAG_NAMES};
pub use slice::EncoderSlice;
pub use symbolic_route::{
    Attr, IntField, RecordId, RecordKind, RecordShape, RecordStore, SymbolicRoute,
    DEFAULT_LOCAL_PREF, DEFAULT_OSPF_REDISTRIBUTION_METRIC, OSPF_TYPE_E1, OSPF_TYPE_E2, OSPF_TYPE_O,
    OSPF_TYPE_OIA,
};
pub use transfer::{TransferFunction, TransferKind, TransferParams};

use crate::netconf::{ConfigError, HeaderSpace};
use crate::smt::{Context, SolverBackend, SolverError, SolverOutput};

use log::*;
use std::time::{Duration, Instant};
use thiserror::Error;

/// # Encoder Error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncoderError {
    /// A statement of a routing policy is not supported
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),
    /// An expression of a routing policy is not supported
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    /// A routing policy is referenced, but not defined
    #[error("Router {0} references the undefined routing policy {1}")]
    UndefinedPolicy(String, String),
    /// A route filter list is referenced, but not defined
    #[error("Router {0} references the undefined route filter list {1}")]
    UndefinedRouteFilterList(String, String),
    /// A community list is referenced, but not defined
    #[error("Router {0} references the undefined community list {1}")]
    UndefinedCommunityList(String, String),
    /// An access list is referenced, but not defined
    #[error("Router {0} references the undefined access list {1}")]
    UndefinedAcl(String, String),
    /// A routing policy calls itself
    #[error("Routing policy {0} is recursive")]
    RecursivePolicy(String),
    /// The configuration is inconsistent
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
}

/// # Encoder Settings
///
/// ```
/// use cpverify::encoder::Settings;
/// use std::time::Duration;
///
/// let settings = Settings::new().max_failures(1).timeout(Duration::from_secs(60));
/// assert!(settings.enable_slicing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Minimal number of link failures of every query. The question may ask for more.
    pub max_failures: usize,
    /// Timeout passed to the solver
    pub timeout: Option<Duration>,
    /// Drop connected and static routes which cannot match the header space
    pub enable_slicing: bool,
    /// Share the records of edges without individual behavior
    pub enable_merging: bool,
    /// Log every asserted constraint
    pub print_constraints: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_failures: 0,
            timeout: None,
            enable_slicing: true,
            enable_merging: true,
            print_constraints: false,
        }
    }
}

impl Settings {
    /// Default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of link failures
    pub fn max_failures(mut self, k: usize) -> Self {
        self.max_failures = k;
        self
    }

    /// Set the solver timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable slicing
    pub fn slicing(mut self, enable: bool) -> Self {
        self.enable_slicing = enable;
        self
    }

    /// Enable or disable merging of records
    pub fn merging(mut self, enable: bool) -> Self {
        self.enable_merging = enable;
        self
    }

    /// Log every constraint
    pub fn print_constraints(mut self, enable: bool) -> Self {
        self.print_constraints = enable;
        self
    }

    /// Number of failures used for a question asking for `k` failures
    pub fn effective_failures(&self, k: usize) -> usize {
        k.max(self.max_failures)
    }
}

/// # Encoder
///
/// Owns the constraint context and all slices encoded into it.
#[derive(Debug)]
pub struct Encoder<'a> {
    ctx: Context,
    slices: Vec<EncoderSlice<'a>>,
    settings: Settings,
}

impl<'a> Encoder<'a> {
    /// Create an encoder without any slice
    pub fn new(settings: Settings) -> Self {
        let mut ctx = Context::new();
        ctx.set_print_constraints(settings.print_constraints);
        Self { ctx, slices: Vec::new(), settings }
    }

    /// Encode the network for the header space, and return the index of the new slice.
    pub fn add_slice(
        &mut self,
        graph: &'a Graph<'a>,
        header_space: HeaderSpace,
        failures: usize,
        name: &str,
    ) -> Result<usize, EncoderError> {
        let failures = self.settings.effective_failures(failures);
        let slice = EncoderSlice::new(&mut self.ctx, graph, header_space, failures, &self.settings, name)?;
        self.slices.push(slice);
        Ok(self.slices.len() - 1)
    }

    /// Access a slice
    pub fn slice(&self, idx: usize) -> &EncoderSlice<'a> {
        &self.slices[idx]
    }

    /// All slices
    pub fn slices(&self) -> &[EncoderSlice<'a>] {
        &self.slices
    }

    /// The constraint context
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Mutable access to the context, together with the slices, to add property constraints.
    pub fn parts_mut(&mut self) -> (&mut Context, &[EncoderSlice<'a>]) {
        (&mut self.ctx, &self.slices)
    }

    /// Settings of the encoder
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decide all constraints with the backend. Returns the output and the time spent in the
    /// solver.
    pub fn solve(&self, backend: &dyn SolverBackend) -> Result<(SolverOutput, Duration), SolverError> {
        info!(
            "Solving {} constraints over {} variables with {}",
            self.ctx.num_constraints(),
            self.ctx.num_variables(),
            backend.name()
        );
        let start = Instant::now();
        let output = backend.solve(&self.ctx, self.settings.timeout)?;
        let elapsed = start.elapsed();
        debug!("Solver finished after {:?}", elapsed);
        Ok((output, elapsed))
    }
}
