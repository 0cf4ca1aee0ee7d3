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

//! Prelude to bring the most commonly used traits and types into scope.
//!
//! # Example
//!
//! ```
//! use qoqo_rewrite::prelude::*;
//! ```

pub use crate::circuit::Circuit;
pub use crate::dag::{Dag, EdgeId, VertexId};
pub use crate::error::CircuitError;
pub use crate::expr::Expr;
pub use crate::op::{Op, OpKind, Pauli, PortType};
pub use crate::subcircuit::Subcircuit;
pub use crate::unit::{UnitId, UnitKind};
