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

//! Linear path walking and slice/frontier traversal over a [`crate::circuit::Circuit`].
//!
//! A linear (`Quantum`/`Classical`) port index is used for both the
//! in-edge and the out-edge of the wire occupying it, so a unit's
//! position at a shared multi-qubit vertex is `(vertex, port)`, not just
//! `vertex`: advancing past that vertex must follow the out-edge at the
//! *same* port the unit arrived on, not some other wire's port.
//!
//! A "slice" is that `(vertex, port)` position for every unit; advancing
//! the slice moves every unit whose position is ready (every other linear
//! port of its vertex has already been passed by its own unit) forward by
//! one vertex.

use std::collections::HashMap;

use crate::boundary::Boundary;
use crate::dag::{Dag, VertexId};
use crate::error::CircuitError;
use crate::op::PortType;
use crate::unit::UnitId;

/// A unit's position in a [`Slice`]: the vertex it is parked at, and which
/// port of that vertex is its own wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub vertex: VertexId,
    pub port: usize,
}

/// A frontier: one position per unit, the next vertex/port on that unit's
/// linear path that has not yet been emitted.
#[derive(Debug, Clone)]
pub struct Slice {
    frontier: HashMap<UnitId, Position>,
}

impl Slice {
    /// The frontier sitting at every unit's input vertex.
    pub fn initial(boundary: &Boundary) -> Self {
        let frontier = boundary
            .units()
            .into_iter()
            .filter_map(|u| {
                boundary
                    .input_vertex(&u)
                    .map(|v| (u, Position { vertex: v, port: 0 }))
            })
            .collect();
        Slice { frontier }
    }

    /// The frontier sitting at every unit's output vertex (for walking
    /// backwards from the end of the circuit).
    pub fn final_slice(boundary: &Boundary) -> Self {
        let frontier = boundary
            .units()
            .into_iter()
            .filter_map(|u| {
                boundary
                    .output_vertex(&u)
                    .map(|v| (u, Position { vertex: v, port: 0 }))
            })
            .collect();
        Slice { frontier }
    }

    /// The vertex a given unit is currently at, if that unit is tracked.
    pub fn at(&self, unit: &UnitId) -> Option<VertexId> {
        self.frontier.get(unit).map(|p| p.vertex)
    }

    /// The full position (vertex and port) a given unit is currently at.
    pub fn position_of(&self, unit: &UnitId) -> Option<Position> {
        self.frontier.get(unit).copied()
    }

    /// All units currently tracked, with their frontier vertex.
    pub fn unit_frontier(&self) -> impl Iterator<Item = (&UnitId, VertexId)> {
        self.frontier.iter().map(|(u, p)| (u, p.vertex))
    }

    /// All units whose frontier vertex's op reads or writes a `Boolean`
    /// port (used by conditional-traversal callers to find live condition
    /// wires without walking the whole frontier).
    pub fn bool_frontier(&self, dag: &Dag) -> Vec<(UnitId, VertexId)> {
        self.frontier
            .iter()
            .filter(|(_, p)| {
                dag.op(p.vertex)
                    .map(|op| op.signature().iter().any(|p| *p == PortType::Boolean))
                    .unwrap_or(false)
            })
            .map(|(u, p)| (u.clone(), p.vertex))
            .collect()
    }

    /// A position is ready to advance past once the source of its own
    /// in-edge is no longer anyone's current frontier position, i.e. has
    /// already been stepped past by the unit(s) feeding it.
    fn position_ready(&self, dag: &Dag, position: Position) -> bool {
        let Ok(Some(edge)) = dag.in_edge(position.vertex, position.port) else {
            // No in-edge at all (an `Input`/`Create` vertex): always ready.
            return true;
        };
        let Ok(source) = dag.source(edge) else {
            return false;
        };
        let Ok(source_port) = dag.source_port(edge) else {
            return false;
        };
        !self.frontier.values().any(|p| {
            p.vertex == source && p.port == source_port
        })
    }

    /// Advances every unit whose position is ready to its next linear
    /// position, per the acceptance rule above. Returns the units that
    /// moved.
    pub fn next_slice(&mut self, dag: &Dag) -> Vec<UnitId> {
        let mut advanced = Vec::new();
        let candidates: Vec<(UnitId, Position)> =
            self.frontier.iter().map(|(u, p)| (u.clone(), *p)).collect();
        for (unit, position) in candidates {
            if !self.position_ready(dag, position) {
                continue;
            }
            if let Some(next) = linear_successor_position(dag, position) {
                self.frontier.insert(unit.clone(), next);
                advanced.push(unit);
            }
        }
        advanced
    }

    /// Steps the frontier backwards by one vertex along each unit's
    /// linear predecessor, mirroring `next_slice`.
    pub fn reverse_slice(&mut self, dag: &Dag) -> Vec<UnitId> {
        let mut moved = Vec::new();
        let candidates: Vec<(UnitId, Position)> =
            self.frontier.iter().map(|(u, p)| (u.clone(), *p)).collect();
        for (unit, position) in candidates {
            if let Some(prev) = linear_predecessor_position(dag, position) {
                self.frontier.insert(unit.clone(), prev);
                moved.push(unit);
            }
        }
        moved
    }
}

fn linear_successor_position(dag: &Dag, position: Position) -> Option<Position> {
    let edges = dag.out_edges(position.vertex, position.port).ok()?;
    let edge = edges
        .iter()
        .find(|e| dag.edge_type(**e).map(|t| t.is_linear()).unwrap_or(false))?;
    let target = dag.target(*edge).ok()?;
    let target_port = dag.target_port(*edge).ok()?;
    Some(Position {
        vertex: target,
        port: target_port,
    })
}

fn linear_predecessor_position(dag: &Dag, position: Position) -> Option<Position> {
    let edge = dag.in_edge(position.vertex, position.port).ok().flatten()?;
    if !dag.edge_type(edge).map(|t| t.is_linear()).unwrap_or(false) {
        return None;
    }
    let source = dag.source(edge).ok()?;
    let source_port = dag.source_port(edge).ok()?;
    Some(Position {
        vertex: source,
        port: source_port,
    })
}

/// Walks every unit's linear path from its input vertex to its output
/// vertex, calling `visit` for each vertex (each vertex may be visited
/// once per unit whose path passes through it, e.g. a two-qubit gate is
/// visited once for each of its two quantum ports).
pub fn walk_unit_path(
    dag: &Dag,
    boundary: &Boundary,
    unit: &UnitId,
    mut visit: impl FnMut(VertexId),
) -> Result<(), CircuitError> {
    let mut position = Position {
        vertex: boundary
            .input_vertex(unit)
            .ok_or_else(|| CircuitError::CircuitInvalidity {
                msg: format!("unknown unit {unit}"),
            })?,
        port: 0,
    };
    let end = boundary
        .output_vertex(unit)
        .ok_or_else(|| CircuitError::CircuitInvalidity {
            msg: format!("unknown unit {unit}"),
        })?;
    loop {
        visit(position.vertex);
        if position.vertex == end {
            break;
        }
        position = linear_successor_position(dag, position).ok_or(CircuitError::CircuitInvalidity {
            msg: format!("linear path for {unit} does not reach its output vertex"),
        })?;
    }
    Ok(())
}

/// Traverses slices front to back, calling `visit(slice)` for each
/// distinct slice until the frontier stops advancing (reaches the final
/// slice). `skip` is offered each advancing unit's vertex; if every unit
/// that advanced on a step is vetoed by `skip`, traversal stops without
/// calling `visit` for that step.
pub fn traverse_variant(
    dag: &Dag,
    boundary: &Boundary,
    mut skip: impl FnMut(VertexId) -> bool,
    mut visit: impl FnMut(&Slice),
) {
    let mut slice = Slice::initial(boundary);
    visit(&slice);
    loop {
        let advanced = slice.next_slice(dag);
        if advanced.is_empty() {
            break;
        }
        let all_skipped = advanced
            .iter()
            .all(|u| slice.at(u).map(&mut skip).unwrap_or(false));
        if all_skipped {
            break;
        }
        visit(&slice);
    }
}

/// The number of slices between the input and output frontiers, counting
/// only vertices whose op is a gate (matching `is_gate()`).
pub fn depth(dag: &Dag, boundary: &Boundary) -> usize {
    let mut count = 0usize;
    let mut slice = Slice::initial(boundary);
    loop {
        let advanced = slice.next_slice(dag);
        if advanced.is_empty() {
            break;
        }
        let any_gate = advanced.iter().any(|u| {
            slice
                .at(u)
                .and_then(|v| dag.op(v).ok().map(|op| op.is_gate()))
                .unwrap_or(false)
        });
        if any_gate {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;
    use crate::ops::{BasicOp, Clifford, TwoQubitKind};
    use std::rc::Rc;

    fn setup_line() -> (Dag, Boundary, UnitId) {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = UnitId::qubit(0);
        let (input, output) = boundary.insert_unit(&mut dag, q0.clone()).unwrap();
        let edges = dag.out_edges(input, 0).unwrap().to_vec();
        for e in edges {
            dag.remove_edge(e).unwrap();
        }
        let x = dag.add_vertex(Rc::new(BasicOp::Clifford(Clifford::PauliX)));
        dag.add_edge(input, 0, x, 0, PortType::Quantum).unwrap();
        dag.add_edge(x, 0, output, 0, PortType::Quantum).unwrap();
        (dag, boundary, q0)
    }

    #[test]
    fn walk_unit_path_visits_input_gate_output() {
        let (dag, boundary, q0) = setup_line();
        let mut seen = Vec::new();
        walk_unit_path(&dag, &boundary, &q0, |v| seen.push(v)).unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn next_slice_advances_past_gate() {
        let (dag, boundary, q0) = setup_line();
        let mut slice = Slice::initial(&boundary);
        assert_eq!(slice.at(&q0), boundary.input_vertex(&q0));
        slice.next_slice(&dag);
        assert_ne!(slice.at(&q0), boundary.input_vertex(&q0));
    }

    #[test]
    fn depth_counts_one_gate() {
        let (dag, boundary, _q0) = setup_line();
        assert_eq!(depth(&dag, &boundary), 1);
    }

    #[test]
    fn two_qubit_gate_advances_each_wire_on_its_own_port() {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        let (in0, out0) = boundary.insert_unit(&mut dag, q0.clone()).unwrap();
        let (in1, out1) = boundary.insert_unit(&mut dag, q1.clone()).unwrap();
        for e in dag.out_edges(in0, 0).unwrap().to_vec() {
            dag.remove_edge(e).unwrap();
        }
        for e in dag.out_edges(in1, 0).unwrap().to_vec() {
            dag.remove_edge(e).unwrap();
        }
        let cx = dag.add_vertex(Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)));
        dag.add_edge(in0, 0, cx, 0, PortType::Quantum).unwrap();
        dag.add_edge(in1, 0, cx, 1, PortType::Quantum).unwrap();
        dag.add_edge(cx, 0, out0, 0, PortType::Quantum).unwrap();
        dag.add_edge(cx, 1, out1, 0, PortType::Quantum).unwrap();

        let mut slice = Slice::initial(&boundary);
        slice.next_slice(&dag); // both units step onto cx, at their own port
        assert_eq!(slice.position_of(&q0).unwrap().port, 0);
        assert_eq!(slice.position_of(&q1).unwrap().port, 1);
        slice.next_slice(&dag); // both step off cx onto their own output
        assert_eq!(slice.at(&q0), Some(out0));
        assert_eq!(slice.at(&q1), Some(out1));
    }
}
