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

//! A minimal reference catalogue of [`crate::op::Op`] implementations.
//!
//! This is deliberately not a gate library: it carries exactly the op
//! shapes the DAG/rewriting core and its own tests need (boundary markers,
//! a rotation family, a handful of fixed Cliffords, `TK1`, and the
//! two-qubit gates the redundancy/commutation rules talk about).

mod basic;

pub use basic::{Clifford, RotationAxis, TwoQubitKind};
pub use basic::{resolve, BasicOp};
