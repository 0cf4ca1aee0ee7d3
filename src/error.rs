// Copyright © 2021-2022 HQS Quantum Simulations GmbH. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the
// License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either
// express or implied. See the License for the specific language governing permissions and
// limitations under the License.

//! The error type returned by this crate's fallible public API.

use thiserror::Error;

/// Errors produced while building, querying or rewriting a [`crate::circuit::Circuit`].
///
/// Every variant here is a caller error: malformed input, a request that
/// violates the DAG's invariants, or a predicate that does not hold of the
/// op it was asked about. Violations of this crate's own internal
/// invariants (a vertex left with dangling edges, a signature mismatch
/// between a vertex and the edges attached to it) are bugs in this crate,
/// not caller errors, and are raised with `debug_assert!`/`unreachable!`
/// instead of through this enum.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitError {
    /// The requested mutation would leave the circuit in an invalid state
    /// (a linear port double-booked, a boundary unit left without an
    /// input or output vertex, ...).
    #[error("circuit invalidity: {msg}")]
    CircuitInvalidity { msg: String },

    /// An op of the wrong broad category was supplied where a specific
    /// one was required (e.g. a non-gate passed to a squasher).
    #[error("unexpected op type: {msg}")]
    BadOpType { msg: String },

    /// The request is meaningful but not implemented by this crate.
    #[error("unsupported: {msg}")]
    Unsupported { msg: String },

    /// No live vertex exists for the handle given.
    #[error("no such vertex")]
    MissingVertex,

    /// No live edge exists for the handle given.
    #[error("no such edge")]
    MissingEdge,

    /// A predicate function itself was malformed (wrong arity, wrong port
    /// count) rather than simply returning false.
    #[error("incorrect predicate: {msg}")]
    IncorrectPredicate { msg: String },

    /// A predicate the caller required did not hold.
    #[error("unsatisfied predicate: {msg}")]
    UnsatisfiedPredicate { msg: String },

    /// A unit name collided with one already present in the boundary.
    #[error("duplicate unit: {0}")]
    DuplicateUnit(String),

    /// A symbolic expression could not be evaluated or parsed.
    #[error(transparent)]
    CalculatorError(#[from] qoqo_calculator::CalculatorError),
}
