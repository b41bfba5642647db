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

//! Module containing all error types

use crate::encoder::EncoderError;
use crate::netconf::ConfigError;
use crate::smt::SolverError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from `netconf`
    #[error("Configuration Error: {0}")]
    ConfigError(#[from] ConfigError),
    /// Error propagated from the encoder
    #[error("Encoder Error: {0}")]
    EncoderError(#[from] EncoderError),
    /// Error propagated from the solver backend
    #[error("Solver Error: {0}")]
    SolverError(#[from] SolverError),
    /// The question cannot be answered on this network
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),
    /// A worker thread of a parallel query panicked
    #[error("A worker thread panicked")]
    WorkerPanicked,
}
