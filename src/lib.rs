// Copyright © 2021 HQS Quantum Simulations GmbH. All Rights Reserved.
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

#![deny(missing_debug_implementations)]

//! # qoqo_rewrite
//!
//! A quantum circuit DAG, slicing and local-rewriting engine.
//!
//! A [`circuit::Circuit`] owns a [`dag::Dag`] of opaque [`op::Op`]
//! vertices and a [`boundary::Boundary`] assigning each qubit/bit a linear
//! path through it. [`path`] walks and slices those linear paths;
//! [`rewrite`] and [`subcircuit`] provide the primitives that local
//! rewriters are built from; [`passes`] hosts the three rewriters this
//! crate ships (redundancy removal, single-qubit squashing, controlled
//! traversal). [`ops`] is a small reference op catalogue used by this
//! crate's own tests; callers with a full gate library implement [`op::Op`]
//! for their own gate types instead.

pub mod boundary;
pub mod circuit;
pub mod dag;
pub mod error;
pub mod expr;
pub mod op;
pub mod ops;
pub mod passes;
pub mod path;
pub mod prelude;
pub mod rewrite;
#[cfg(feature = "serialize")]
pub mod serialize;
pub mod subcircuit;
pub mod unit;

pub use circuit::Circuit;
pub use error::CircuitError;
pub use expr::Expr;
pub use op::Op;
pub use unit::UnitId;
