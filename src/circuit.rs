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

//! [`Circuit`]: a DAG plus the boundary, global phase and op-group table
//! that turn it into a well-formed quantum circuit.

use std::collections::HashMap;
use std::rc::Rc;

use crate::boundary::Boundary;
use crate::dag::{Dag, VertexId};
use crate::error::CircuitError;
use crate::expr::Expr;
use crate::op::{Op, PortType};
use crate::unit::{UnitId, UnitKind};

/// A quantum circuit: a DAG of ops, a boundary assigning each qubit/bit a
/// linear path through it, an accumulated global phase, and a table of
/// named op groups sharing a signature.
pub struct Circuit {
    dag: Dag,
    boundary: Boundary,
    phase: Expr,
    op_groups: HashMap<String, Vec<PortType>>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// An empty circuit: no units, zero phase, no op groups.
    pub fn new() -> Self {
        Circuit {
            dag: Dag::new(),
            boundary: Boundary::new(),
            phase: Expr::ZERO,
            op_groups: HashMap::new(),
        }
    }

    /// A circuit with `n_qubits` qubits in the default register, each
    /// created fresh and ready to be used.
    pub fn with_qubits(n_qubits: usize) -> Result<Self, CircuitError> {
        let mut circuit = Self::new();
        for i in 0..n_qubits {
            circuit.add_unit(UnitId::qubit(i))?;
        }
        Ok(circuit)
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn dag_mut(&mut self) -> &mut Dag {
        &mut self.dag
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn boundary_mut(&mut self) -> &mut Boundary {
        &mut self.boundary
    }

    pub fn phase(&self) -> &Expr {
        &self.phase
    }

    /// Accumulates `addend` into the circuit's global phase.
    pub fn add_phase(&mut self, addend: Expr) {
        self.phase = self.phase.clone() + addend;
    }

    /// Registers a fresh unit, wiring a direct input->output edge for it.
    pub fn add_unit(&mut self, unit: UnitId) -> Result<(VertexId, VertexId), CircuitError> {
        self.boundary.insert_unit(&mut self.dag, unit)
    }

    /// Number of qubits currently in the boundary.
    pub fn n_qubits(&self) -> usize {
        self.boundary
            .units()
            .iter()
            .filter(|u| u.kind() == UnitKind::Qubit)
            .count()
    }

    /// Number of bits currently in the boundary.
    pub fn n_bits(&self) -> usize {
        self.boundary
            .units()
            .iter()
            .filter(|u| u.kind() == UnitKind::Bit)
            .count()
    }

    /// Marks `unit` as created fresh (`|0>`) rather than supplied
    /// externally.
    pub fn qubit_create(&mut self, unit: &UnitId) -> Result<(), CircuitError> {
        self.boundary.qubit_create(&mut self.dag, unit)
    }

    /// Marks `unit` as discarded rather than measured out.
    pub fn qubit_discard(&mut self, unit: &UnitId) -> Result<(), CircuitError> {
        self.boundary.qubit_discard(&mut self.dag, unit)
    }

    /// The signature registered for a named op group, if any.
    pub fn op_group_signature(&self, name: &str) -> Option<&[PortType]> {
        self.op_groups.get(name).map(Vec::as_slice)
    }

    /// Registers `op` as belonging to named group `name`. The first op to
    /// claim a group name fixes that group's signature; every later op
    /// claiming the same name must match it exactly.
    pub fn register_op_group(&mut self, name: &str, op: &dyn Op) -> Result<(), CircuitError> {
        let sig = op.signature();
        match self.op_groups.get(name) {
            Some(existing) if *existing != sig => Err(CircuitError::CircuitInvalidity {
                msg: format!("op group {name} has a fixed signature incompatible with {op:?}"),
            }),
            Some(_) => Ok(()),
            None => {
                self.op_groups.insert(name.to_string(), sig);
                Ok(())
            }
        }
    }

    /// Every op in the circuit, in topological order, paired with its
    /// vertex id (boundary `Input`/`Output`/`Create`/`Discard` vertices
    /// included).
    pub fn ops_in_order(&self) -> Vec<(VertexId, Rc<dyn Op>)> {
        self.dag
            .topological_order()
            .into_iter()
            .filter_map(|v| self.dag.op(v).ok().map(|op| (v, op.clone())))
            .collect()
    }

    /// Every op in the circuit that is a gate proper (excludes boundary
    /// markers and barriers), in topological order.
    pub fn commands(&self) -> Vec<(VertexId, Rc<dyn Op>)> {
        self.ops_in_order()
            .into_iter()
            .filter(|(_, op)| op.is_gate() || op.kind() == crate::op::OpKind::Conditional)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BasicOp, Clifford};

    #[test]
    fn with_qubits_creates_default_register() {
        let circuit = Circuit::with_qubits(3).unwrap();
        assert_eq!(circuit.n_qubits(), 3);
        assert_eq!(circuit.n_bits(), 0);
    }

    #[test]
    fn op_group_rejects_signature_drift() {
        let mut circuit = Circuit::new();
        let x = BasicOp::Clifford(Clifford::PauliX);
        let cx = BasicOp::TwoQubit(crate::ops::TwoQubitKind::Cnot);
        circuit.register_op_group("g", &x).unwrap();
        assert!(circuit.register_op_group("g", &cx).is_err());
    }

    #[test]
    fn phase_accumulates() {
        let mut circuit = Circuit::new();
        circuit.add_phase(Expr::from_f64(0.5));
        circuit.add_phase(Expr::from_f64(0.5));
        assert!(circuit.phase().equiv_val(1.0, 4.0));
    }
}
