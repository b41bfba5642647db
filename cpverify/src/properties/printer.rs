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

//! # Helper (printer) functions for verification results
//! Module containing helper functions to get formatted strings of results and counterexamples.

use super::{Counterexample, Outcome, RouteValues, VerificationResult};

/// Returns a one-line summary of the result
pub fn summary(result: &VerificationResult) -> String {
    let outcome = match &result.outcome {
        Outcome::Verified => String::from("verified"),
        Outcome::Violated => String::from("VIOLATED"),
        Outcome::Unknown(reason) => format!("unknown ({})", reason),
        Outcome::CannotCompare(reason) => format!("cannot compare ({})", reason),
        Outcome::Error(e) => format!("ERROR ({})", e),
    };
    format!(
        "{}: {} [{} variables, {} constraints, {:.3}s]",
        result.property,
        outcome,
        result.stats.num_variables,
        result.stats.num_constraints,
        result.stats.solve_time.as_secs_f64()
    )
}

/// Returns the formatted string of a route
pub fn route(r: &RouteValues) -> String {
    let mut result = r
        .attributes
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    if let Some(internal) = r.bgp_internal {
        result.push_str(&format!(", internal: {}", internal));
    }
    if !r.communities.is_empty() {
        result.push_str(&format!(", communities: [{}]", r.communities.join(", ")));
    }
    result
}

/// Get a vector of strings, one line per value of the counterexample, grouped in sections.
pub fn counterexample(cex: &Counterexample) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(String::from("Packet:"));
    lines.extend(cex.packet.iter().map(|(k, v)| format!("    {}: {}", k, v)));
    if !cex.failed_links.is_empty() {
        lines.push(String::from("Failed links:"));
        lines.extend(cex.failed_links.iter().map(|l| format!("    {}", l)));
    }
    if !cex.environment.is_empty() {
        lines.push(String::from("Environment announcements:"));
        lines.extend(cex.environment.iter().map(|(n, r)| format!("    {}: {}", n, route(r))));
    }
    if !cex.best_routes.is_empty() {
        lines.push(String::from("Best routes:"));
        lines.extend(cex.best_routes.iter().map(|(n, r)| format!("    {}: {}", n, route(r))));
    }
    lines.push(String::from("Data forwarding:"));
    lines.extend(cex.data_forwarding.iter().map(|e| format!("    {}", e)));
    let dropped: Vec<&String> =
        cex.control_forwarding.iter().filter(|e| !cex.data_forwarding.contains(e)).collect();
    if !dropped.is_empty() {
        lines.push(String::from("Dropped (control plane forwards, data plane does not):"));
        lines.extend(dropped.iter().map(|e| format!("    {}", e)));
    }
    if !cex.property.is_empty() {
        lines.push(String::from("Property:"));
        lines.extend(cex.property.iter().map(|(k, v)| format!("    {}: {}", k, v)));
    }
    lines
}

/// Print the result, together with the counterexample.
pub fn print_result(result: &VerificationResult) {
    println!("{}", summary(result));
    if let Some(cex) = &result.counterexample {
        for line in counterexample(cex) {
            println!("{}", line);
        }
    }
}
