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

#![deny(missing_docs)]

//! # CpVerify: Symbolic Control-Plane Verification
//!
//! This is a library for verifying properties of the control plane of a network without
//! simulating it. All router configurations, routing policies and the route exchange between the
//! routers are compiled into one symbolic formula, and a constraint solver is asked whether any
//! environment (any external route announcement, any packet of a header space, any set of at most
//! `k` link failures) violates a property.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`NetConf`](netconf)**: Canonical, vendor independent configuration model. Configurations
//!   are built programmatically, for instance using the
//!   [`RoutingPolicyBuilder`](netconf::RoutingPolicyBuilder) and the
//!   [`RouteMapBuilder`](netconf::RouteMapBuilder).
//!
//! - **[`Smt`](smt)**: Small term language (booleans and integers) with constant folding, a
//!   partial evaluator, and the [`SolverBackend`](smt::SolverBackend) trait. The real backend
//!   [`Z3Backend`](smt::Z3Backend) is only available with the feature `z3`.
//!
//! - **[`Encoder`](encoder)**: Translation of the network into constraints. The
//!   [`Graph`](encoder::Graph) joins interfaces and links, the
//!   [`Optimizations`](encoder::Optimizations) decide which variables are needed, the
//!   [`LogicalGraph`](encoder::LogicalGraph) allocates symbolic route records, the transfer
//!   function interpreter encodes routing policies, and the
//!   [`EncoderSlice`](encoder::EncoderSlice) adds best-route selection and forwarding.
//!
//! - **[`Properties`](properties)**: Verification queries (reachability, black holes, path
//!   length, load, routing loops, multipath and local consistency), executed by the
//!   [`PropertyChecker`](properties::PropertyChecker).
//!
//! - **[`ExampleNetworks`](example_networks)**: Collection of prepared networks and questions,
//!   used by the tests and the command line interface.
//!
//! ## Features
//!
//! - *`z3`*: Enables the [`Z3Backend`](smt::Z3Backend). Without this feature, only the
//!   [`NoSolverBackend`](smt::NoSolverBackend) is available, which can build all encodings but
//!   reports every query as inconclusive.
//!
//! ## Usage
//!
//! ```
//! use cpverify::example_networks::*;
//! use cpverify::properties::PropertyChecker;
//! use cpverify::smt::NoSolverBackend;
//! use cpverify::Error;
//!
//! fn main() -> Result<(), Error> {
//!     let net = StaticChain::net();
//!     let question = StaticChain::question();
//!     let backend = NoSolverBackend::new();
//!     let checker = PropertyChecker::new(&net, &backend);
//!     // without a solver, the query is reported as unknown.
//!     let result = checker.compute_reachability(&question)?;
//!     assert!(!result.verified);
//!     Ok(())
//! }
//! ```

pub mod encoder;
mod error;
pub mod example_networks;
pub mod netconf;
pub mod properties;
pub mod smt;
#[cfg(test)]
mod test;

pub use error::Error;
