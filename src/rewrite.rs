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

//! Rewiring primitives: the small set of DAG mutations every pass in
//! [`crate::passes`] is built out of.

use std::collections::HashMap;
use std::rc::Rc;

use crate::circuit::Circuit;
use crate::dag::{Dag, EdgeId, VertexId};
use crate::error::CircuitError;
use crate::expr::Expr;
use crate::op::{Op, PortType};
use crate::subcircuit::Subcircuit;
use crate::unit::UnitId;

/// Reconnects `target`'s in-edge on port `target_port` to come from
/// `(new_source, new_source_port)` instead of wherever it currently comes
/// from. The old edge, if any, is removed first.
pub fn rewire(
    dag: &mut Dag,
    target: VertexId,
    target_port: usize,
    new_source: VertexId,
    new_source_port: usize,
) -> Result<EdgeId, CircuitError> {
    if let Some(old) = dag.in_edge(target, target_port)? {
        let edge_type = dag.edge_type(old)?;
        dag.remove_edge(old)?;
        return dag.add_edge(new_source, new_source_port, target, target_port, edge_type);
    }
    // No existing edge to infer a type from: ask the target op's signature.
    let sig = dag.op(target)?.signature();
    let ty = *sig
        .get(target_port)
        .ok_or(CircuitError::MissingVertex)?;
    dag.add_edge(new_source, new_source_port, target, target_port, ty)
}

/// Splices a vertex out of the DAG: for every `(in_port, out_port)` pair
/// in `rewiring`, reconnects `in_port`'s predecessor directly to every
/// target currently fed by `out_port`. Removes all of `vertex`'s
/// remaining edges and, if `delete` is set, the vertex itself.
///
/// `rewiring` need not be a bijection over every port: a port absent from
/// it is simply disconnected (its predecessor edge removed, its
/// successors left dangling for the caller to reconnect separately — used
/// by [`crate::subcircuit`] substitution, where the caller reconnects
/// everything itself).
pub fn remove_vertex(
    dag: &mut Dag,
    vertex: VertexId,
    rewiring: &HashMap<usize, usize>,
    delete: bool,
) -> Result<(), CircuitError> {
    for (&in_port, &out_port) in rewiring {
        let in_edge = dag.in_edge(vertex, in_port)?;
        let out_edges = dag.out_edges(vertex, out_port)?.to_vec();
        if let Some(in_edge) = in_edge {
            let source = dag.source(in_edge)?;
            let source_port = dag.source_port(in_edge)?;
            dag.remove_edge(in_edge)?;
            for out_edge in out_edges {
                let target = dag.target(out_edge)?;
                let target_port = dag.target_port(out_edge)?;
                let edge_type = dag.edge_type(out_edge)?;
                dag.remove_edge(out_edge)?;
                dag.add_edge(source, source_port, target, target_port, edge_type)?;
            }
        } else {
            for out_edge in out_edges {
                dag.remove_edge(out_edge)?;
            }
        }
    }
    if delete {
        let n = dag.port_count(vertex)?;
        for port in 0..n {
            if let Some(e) = dag.in_edge(vertex, port)? {
                dag.remove_edge(e)?;
            }
            for e in dag.out_edges(vertex, port)?.to_vec() {
                dag.remove_edge(e)?;
            }
        }
        dag.remove_vertex(vertex)?;
    }
    Ok(())
}

/// Replaces the op at `vertex` with `new_op`, which must share the old
/// op's signature (the DAG's edges are left untouched).
pub fn substitute_vertex(
    dag: &mut Dag,
    vertex: VertexId,
    new_op: Rc<dyn Op>,
) -> Result<(), CircuitError> {
    dag.set_op(vertex, new_op)
}

/// Appends `op` to the end of the named `wires` (unit, port-on-`op`)
/// pairs, splicing it in just before each unit's current output vertex.
pub fn append(
    circuit: &mut Circuit,
    op: Rc<dyn Op>,
    wires: &[(UnitId, usize)],
) -> Result<VertexId, CircuitError> {
    let signature = op.signature();
    let vertex = circuit.dag_mut().add_vertex(op);
    for (unit, port) in wires {
        let output = circuit
            .boundary()
            .output_vertex(unit)
            .ok_or_else(|| CircuitError::CircuitInvalidity {
                msg: format!("unknown unit {unit}"),
            })?;
        let ty = *signature.get(*port).ok_or(CircuitError::IncorrectPredicate {
            msg: format!("port {port} out of range for appended op"),
        })?;
        let prev_edge = circuit.dag().in_edge(output, 0)?;
        if let Some(prev_edge) = prev_edge {
            let source = circuit.dag().source(prev_edge)?;
            let source_port = circuit.dag().source_port(prev_edge)?;
            circuit.dag_mut().remove_edge(prev_edge)?;
            circuit
                .dag_mut()
                .add_edge(source, source_port, vertex, *port, ty)?;
        }
        circuit.dag_mut().add_edge(vertex, *port, output, 0, ty)?;
    }
    Ok(vertex)
}

/// Replaces every vertex in `target` with the ops of `replacement`,
/// matching `target`'s boundary (`in_edges`/`out_edges`, in declared
/// order) against `replacement`'s own unit boundary in the same order.
/// Adds `replacement`'s accumulated phase to `circuit`'s global phase.
pub fn substitute_subcircuit(
    circuit: &mut Circuit,
    target: &Subcircuit,
    replacement: Circuit,
) -> Result<(), CircuitError> {
    let (dag, _boundary) = (replacement.dag(), replacement.boundary());
    let units = replacement.boundary().units();
    if units.len() != target.in_edges.len() || units.len() != target.out_edges.len() {
        return Err(CircuitError::CircuitInvalidity {
            msg: "replacement circuit's unit count does not match the subcircuit boundary".into(),
        });
    }

    // Clone every non-boundary vertex of `replacement` into `circuit`'s DAG.
    let mut vertex_map: HashMap<VertexId, VertexId> = HashMap::new();
    for v in dag.vertices() {
        if replacement.boundary().unit_of(v).is_some() {
            continue; // boundary Input/Output vertices are not copied
        }
        let op = dag.op(v)?.clone();
        let new_v = circuit.dag_mut().add_vertex(op);
        vertex_map.insert(v, new_v);
    }
    // Re-create internal edges between cloned vertices.
    for v in dag.vertices() {
        if !vertex_map.contains_key(&v) {
            continue;
        }
        let n = dag.port_count(v)?;
        for port in 0..n {
            for e in dag.out_edges(v, port)? {
                let target_v = dag.target(*e)?;
                let target_port = dag.target_port(*e)?;
                let edge_type = dag.edge_type(*e)?;
                if let Some(&mapped_target) = vertex_map.get(&target_v) {
                    circuit.dag_mut().add_edge(
                        *vertex_map.get(&v).unwrap(),
                        port,
                        mapped_target,
                        target_port,
                        edge_type,
                    )?;
                }
            }
        }
    }

    // Wire the clone's boundary onto `target`'s in/out edges, in unit order.
    for (i, unit) in units.iter().enumerate() {
        let repl_input = replacement.boundary().input_vertex(unit).unwrap();
        let repl_output = replacement.boundary().output_vertex(unit).unwrap();
        let first_internal_edge = dag.out_edges(repl_input, 0)?.first().copied();
        let last_internal_edge = dag.in_edge(repl_output, 0)?;

        let external_in = target.in_edges[i];
        let external_out = &target.out_edges[i];

        if let Some(e) = first_internal_edge {
            let internal_target = dag.target(e)?;
            let internal_target_port = dag.target_port(e)?;
            let edge_type = dag.edge_type(e)?;
            if let Some(mapped) = vertex_map.get(&internal_target) {
                let source = circuit.dag().source(external_in)?;
                let source_port = circuit.dag().source_port(external_in)?;
                circuit
                    .dag_mut()
                    .add_edge(source, source_port, *mapped, internal_target_port, edge_type)?;
            } else {
                // replacement is the trivial identity on this wire: connect
                // straight through.
                let source = circuit.dag().source(external_in)?;
                let source_port = circuit.dag().source_port(external_in)?;
                for out_edge in external_out {
                    let t = circuit.dag().target(*out_edge)?;
                    let tp = circuit.dag().target_port(*out_edge)?;
                    let ty = circuit.dag().edge_type(*out_edge)?;
                    circuit.dag_mut().add_edge(source, source_port, t, tp, ty)?;
                }
            }
        }
        if let Some(e) = last_internal_edge {
            let internal_source = dag.source(e)?;
            let internal_source_port = dag.source_port(e)?;
            let edge_type = dag.edge_type(e)?;
            if let Some(mapped) = vertex_map.get(&internal_source) {
                for out_edge in external_out {
                    let t = circuit.dag().target(*out_edge)?;
                    let tp = circuit.dag().target_port(*out_edge)?;
                    circuit
                        .dag_mut()
                        .add_edge(*mapped, internal_source_port, t, tp, edge_type)?;
                }
            }
        }
    }

    // Remove the original subcircuit's internal vertices and edges.
    for e in target.in_edges.iter().chain(target.out_edges.iter().flatten()) {
        circuit.dag_mut().remove_edge(*e).ok();
    }
    for v in &target.verts {
        let n = circuit.dag().port_count(*v)?;
        for port in 0..n {
            if let Some(e) = circuit.dag().in_edge(*v, port)? {
                circuit.dag_mut().remove_edge(e).ok();
            }
            for e in circuit.dag().out_edges(*v, port)?.to_vec() {
                circuit.dag_mut().remove_edge(e).ok();
            }
        }
        circuit.dag_mut().remove_vertex(*v)?;
    }

    circuit.add_phase(replacement.phase().clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BasicOp, Clifford};

    #[test]
    fn remove_vertex_splices_a_one_one_passthrough() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        let x = append(
            &mut circuit,
            Rc::new(BasicOp::Clifford(Clifford::PauliX)),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        let mut rewiring = HashMap::new();
        rewiring.insert(0, 0);
        remove_vertex(circuit.dag_mut(), x, &rewiring, true).unwrap();
        let input = circuit.boundary().input_vertex(&q0).unwrap();
        let output = circuit.boundary().output_vertex(&q0).unwrap();
        let edge = circuit.dag().in_edge(output, 0).unwrap().unwrap();
        assert_eq!(circuit.dag().source(edge).unwrap(), input);
    }

    #[test]
    fn append_then_append_builds_a_chain() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        append(
            &mut circuit,
            Rc::new(BasicOp::Clifford(Clifford::PauliX)),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        append(
            &mut circuit,
            Rc::new(BasicOp::Clifford(Clifford::Hadamard)),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        assert_eq!(circuit.dag().vertex_count(), 4); // input, X, H, output
    }
}
