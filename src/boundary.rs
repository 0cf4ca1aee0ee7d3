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

//! The boundary: a bijection between [`UnitId`]s and the pair of vertices
//! that open and close that unit's linear path through the DAG.

use std::collections::HashMap;
use std::rc::Rc;

use crate::dag::{Dag, VertexId};
use crate::error::CircuitError;
use crate::op::PortType;
use crate::ops::BasicOp;
use crate::unit::{UnitId, UnitKind};

/// Which end of a unit's linear path a boundary vertex is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

fn unit_port_type(kind: UnitKind) -> PortType {
    match kind {
        UnitKind::Qubit => PortType::Quantum,
        UnitKind::Bit => PortType::Classical,
    }
}

/// Bidirectional `UnitId <-> (input_vertex, output_vertex)` map.
#[derive(Default)]
pub struct Boundary {
    forward: HashMap<UnitId, (VertexId, VertexId)>,
    backward: HashMap<VertexId, (UnitId, Side)>,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly created `(input, output)` vertex pair under `unit`.
    /// Fails if `unit` is already present in this boundary.
    pub fn register(
        &mut self,
        unit: UnitId,
        input: VertexId,
        output: VertexId,
    ) -> Result<(), CircuitError> {
        if self.forward.contains_key(&unit) {
            return Err(CircuitError::DuplicateUnit(unit.to_string()));
        }
        self.forward.insert(unit.clone(), (input, output));
        self.backward.insert(input, (unit.clone(), Side::Input));
        self.backward.insert(output, (unit, Side::Output));
        Ok(())
    }

    /// Creates a fresh `Input`/`Output` vertex pair for `unit`, connects
    /// them with a direct edge, and registers the pair. Returns the new
    /// `(input, output)` vertices.
    pub fn insert_unit(
        &mut self,
        dag: &mut Dag,
        unit: UnitId,
    ) -> Result<(VertexId, VertexId), CircuitError> {
        let ty = unit_port_type(unit.kind());
        let input = dag.add_vertex(Rc::new(BasicOp::Input(ty)));
        let output = dag.add_vertex(Rc::new(BasicOp::Output(ty)));
        dag.add_edge(input, 0, output, 0, ty)?;
        self.register(unit, input, output)?;
        Ok((input, output))
    }

    pub fn input_vertex(&self, unit: &UnitId) -> Option<VertexId> {
        self.forward.get(unit).map(|(i, _)| *i)
    }

    pub fn output_vertex(&self, unit: &UnitId) -> Option<VertexId> {
        self.forward.get(unit).map(|(_, o)| *o)
    }

    /// The unit and side a boundary vertex belongs to, if any.
    pub fn unit_of(&self, vertex: VertexId) -> Option<(&UnitId, Side)> {
        self.backward.get(&vertex).map(|(u, s)| (u, *s))
    }

    /// All units, in their natural `Ord` (lexicographic) order.
    pub fn units(&self) -> Vec<UnitId> {
        let mut us: Vec<UnitId> = self.forward.keys().cloned().collect();
        us.sort();
        us
    }

    pub fn contains(&self, unit: &UnitId) -> bool {
        self.forward.contains_key(unit)
    }

    /// Replaces the `Input` op at `unit`'s input vertex with `Create`.
    /// Idempotent: a no-op if already `Create`.
    pub fn qubit_create(&self, dag: &mut Dag, unit: &UnitId) -> Result<(), CircuitError> {
        let input = self
            .input_vertex(unit)
            .ok_or_else(|| CircuitError::CircuitInvalidity {
                msg: format!("unknown unit {unit}"),
            })?;
        if dag.op(input)?.kind() == crate::op::OpKind::Create {
            return Ok(());
        }
        dag.set_op(input, Rc::new(BasicOp::Create))
    }

    /// Replaces the `Output` op at `unit`'s output vertex with `Discard`.
    /// Idempotent: a no-op if already `Discard`.
    pub fn qubit_discard(&self, dag: &mut Dag, unit: &UnitId) -> Result<(), CircuitError> {
        let output = self
            .output_vertex(unit)
            .ok_or_else(|| CircuitError::CircuitInvalidity {
                msg: format!("unknown unit {unit}"),
            })?;
        if dag.op(output)?.kind() == crate::op::OpKind::Discard {
            return Ok(());
        }
        dag.set_op(output, Rc::new(BasicOp::Discard))
    }

    /// Renames units in bulk according to `mapping` (old -> new). Fails,
    /// leaving the boundary untouched, if any new name collides with an
    /// existing unit that is not itself being renamed away in the same
    /// call.
    pub fn rename_units(&mut self, mapping: &HashMap<UnitId, UnitId>) -> Result<(), CircuitError> {
        for new_name in mapping.values() {
            let collides_with_survivor = self.forward.contains_key(new_name)
                && !mapping.contains_key(new_name);
            if collides_with_survivor {
                return Err(CircuitError::DuplicateUnit(new_name.to_string()));
            }
        }
        let mut new_forward = HashMap::with_capacity(self.forward.len());
        let mut new_backward = HashMap::with_capacity(self.backward.len());
        for (unit, (input, output)) in self.forward.drain() {
            let renamed = mapping.get(&unit).cloned().unwrap_or(unit);
            new_backward.insert(input, (renamed.clone(), Side::Input));
            new_backward.insert(output, (renamed.clone(), Side::Output));
            new_forward.insert(renamed, (input, output));
        }
        self.forward = new_forward;
        self.backward = new_backward;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup_roundtrip() {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = UnitId::qubit(0);
        let (input, output) = boundary.insert_unit(&mut dag, q0.clone()).unwrap();
        assert_eq!(boundary.input_vertex(&q0), Some(input));
        assert_eq!(boundary.output_vertex(&q0), Some(output));
        assert_eq!(boundary.unit_of(input).unwrap().1, Side::Input);
        assert_eq!(boundary.unit_of(output).unwrap().1, Side::Output);
    }

    #[test]
    fn create_and_discard_are_idempotent() {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = UnitId::qubit(0);
        boundary.insert_unit(&mut dag, q0.clone()).unwrap();
        boundary.qubit_create(&mut dag, &q0).unwrap();
        boundary.qubit_create(&mut dag, &q0).unwrap();
        let input = boundary.input_vertex(&q0).unwrap();
        assert_eq!(dag.op(input).unwrap().kind(), crate::op::OpKind::Create);
    }

    #[test]
    fn rename_detects_collisions() {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        boundary.insert_unit(&mut dag, q0.clone()).unwrap();
        boundary.insert_unit(&mut dag, q1.clone()).unwrap();
        let mut mapping = HashMap::new();
        mapping.insert(q0, q1);
        assert!(boundary.rename_units(&mapping).is_err());
    }
}
