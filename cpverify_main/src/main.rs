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

use cpverify::encoder::Settings;
use cpverify::example_networks::{example_by_name, EXAMPLE_NAMES};
use cpverify::properties::{printer, PropertyChecker, VerificationResult};
use cpverify::smt::SolverBackend;

use clap::{Parser, Subcommand};
use log::*;
use std::error::Error;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    let (net, mut question) = example_by_name(&args.network).ok_or_else(|| {
        format!("Unknown network {}. Available: {}", args.network, EXAMPLE_NAMES.join(", "))
    })?;
    question.failures = question.failures.max(args.failures);

    let mut settings = Settings::new()
        .max_failures(args.failures)
        .slicing(!args.no_slicing)
        .merging(!args.no_merging)
        .print_constraints(args.print_constraints);
    if let Some(t) = args.timeout {
        settings = settings.timeout(Duration::from_secs(t));
    }

    let backend = backend();
    info!("Using the {} backend", backend.name());
    let checker = PropertyChecker::new(&net, backend.as_ref()).with_settings(settings);

    let results: Vec<VerificationResult> = match args.cmd {
        MainCommand::Forwarding => vec![checker.compute_forwarding(&question)?],
        MainCommand::Reachability { per_edge: false } => vec![checker.compute_reachability(&question)?],
        MainCommand::Reachability { per_edge: true } => checker
            .compute_reachability_per_edge(&question)?
            .into_iter()
            .map(|(_, r)| r)
            .collect(),
        MainCommand::BlackHole => vec![checker.compute_black_hole(&question)?],
        MainCommand::BoundedLength { k } => vec![checker.compute_bounded_length(&question, k)?],
        MainCommand::EqualLength => vec![checker.compute_equal_length(&question)?],
        MainCommand::LoadBalance { threshold } => {
            vec![checker.compute_load_balance(&question, threshold)?]
        }
        MainCommand::Multipath => vec![checker.compute_multipath_consistency(&question)?],
        MainCommand::Loop => vec![checker.compute_routing_loop(&question)?],
        MainCommand::LocalConsistency => checker
            .compute_local_consistency(&question)?
            .into_iter()
            .map(|(_, _, r)| r)
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in results.iter() {
            printer::print_result(result);
        }
    }
    Ok(())
}

#[cfg(feature = "z3")]
fn backend() -> Box<dyn SolverBackend> {
    Box::new(cpverify::smt::Z3Backend::new())
}

#[cfg(not(feature = "z3"))]
fn backend() -> Box<dyn SolverBackend> {
    warn!("Compiled without the feature z3. Every query will be inconclusive.");
    Box::new(cpverify::smt::NoSolverBackend::new())
}

/// Verify properties of the control plane of one of the example networks, without simulating it.
#[derive(Parser, Debug)]
#[command(name = "CpVerify", author = "The CpVerify Authors")]
struct CommandLineArguments {
    /// Name of the example network
    #[arg(short = 'n', long, default_value = "static-chain")]
    network: String,
    /// Maximal number of failed links
    #[arg(short = 'k', long, default_value_t = 0)]
    failures: usize,
    /// Solver timeout in seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,
    /// Print the result as json
    #[arg(long)]
    json: bool,
    /// Log every constraint (at debug level)
    #[arg(long)]
    print_constraints: bool,
    /// Keep connected and static routes of all prefixes
    #[arg(long)]
    no_slicing: bool,
    /// Allocate one record per logical edge
    #[arg(long)]
    no_merging: bool,
    /// Property to check
    #[command(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Compute one stable forwarding state
    #[command(name = "forwarding")]
    Forwarding,
    /// All sources reach the destinations
    #[command(name = "reachability")]
    Reachability {
        /// Check every destination on its own, in parallel
        #[arg(short = 'e', long)]
        per_edge: bool,
    },
    /// No router drops packets it receives
    #[command(name = "black-hole")]
    BlackHole,
    /// Paths towards the destinations are at most k hops long
    #[command(name = "bounded-length")]
    BoundedLength {
        /// Maximal path length
        #[arg(short = 'l', long, default_value_t = 5)]
        k: i64,
    },
    /// All sources have paths of equal length
    #[command(name = "equal-length")]
    EqualLength,
    /// The load on the sources differs by at most the threshold
    #[command(name = "load-balance")]
    LoadBalance {
        /// Maximal difference of the load
        #[arg(long, default_value_t = 1)]
        threshold: i64,
    },
    /// All forwarding paths of a source either reach the destinations, or none does
    #[command(name = "multipath")]
    Multipath,
    /// No packet is forwarded in a loop
    #[command(name = "loop")]
    Loop,
    /// Routers with the same interfaces forward the same way
    #[command(name = "local-consistency")]
    LocalConsistency,
}
