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

//! Unit identifiers: the qubits and bits a [`crate::Circuit`] is defined over.

use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;

/// Name of the default quantum register created by [`crate::Circuit::new`].
pub const DEFAULT_QUBIT_REGISTER: &str = "q";
/// Name of the default classical register created by [`crate::Circuit::new`].
pub const DEFAULT_BIT_REGISTER: &str = "c";
/// Reserved register name for ancillas introduced by a router.
pub const ROUTER_ANCILLA_REGISTER: &str = "qcore_ancilla";

/// The two kinds of unit a [`UnitId`] can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
pub enum UnitKind {
    /// A quantum wire.
    Qubit,
    /// A classical wire.
    Bit,
}

/// A stable identifier for a qubit or bit: `(kind, register, index)`.
///
/// Ordering is lexicographic on `(kind, register, index)`, matching the
/// order `Circuit::get_commands` and the boundary iterate in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
pub struct UnitId {
    kind: UnitKind,
    register: String,
    index: Vec<usize>,
}

impl UnitId {
    /// Creates a new unit identifier.
    pub fn new(kind: UnitKind, register: impl Into<String>, index: Vec<usize>) -> Self {
        Self {
            kind,
            register: register.into(),
            index,
        }
    }

    /// Creates a qubit identifier in the default quantum register.
    pub fn qubit(index: usize) -> Self {
        Self::new(UnitKind::Qubit, DEFAULT_QUBIT_REGISTER, vec![index])
    }

    /// Creates a bit identifier in the default classical register.
    pub fn bit(index: usize) -> Self {
        Self::new(UnitKind::Bit, DEFAULT_BIT_REGISTER, vec![index])
    }

    /// Returns the kind of unit (qubit or bit).
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Returns the register name.
    pub fn register(&self) -> &str {
        &self.register
    }

    /// Returns the index tuple within the register.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Returns true if this unit is a qubit.
    pub fn is_qubit(&self) -> bool {
        matches!(self.kind, UnitKind::Qubit)
    }

    /// Returns true if this unit is a bit.
    pub fn is_bit(&self) -> bool {
        matches!(self.kind, UnitKind::Bit)
    }

    /// Returns true if this unit lives in the reserved router-ancilla register.
    pub fn is_router_ancilla(&self) -> bool {
        self.register == ROUTER_ANCILLA_REGISTER
    }
}

impl PartialOrd for UnitId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnitId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.register.cmp(&other.register))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            UnitKind::Qubit => "q",
            UnitKind::Bit => "c",
        };
        write!(f, "{}[{}][", prefix, self.register)?;
        for (i, ix) in self.index.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", ix)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        let c0 = UnitId::bit(0);
        assert!(q0 < q1);
        assert!(q0 < c0); // Qubit < Bit
    }

    #[test]
    fn display_roundtrips_components() {
        let u = UnitId::new(UnitKind::Qubit, "q", vec![3]);
        assert_eq!(u.to_string(), "q[q][3]");
    }
}
