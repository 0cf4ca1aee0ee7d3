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

//! Passes that reorder single-qubit gates past multi-qubit gates, and that
//! group runs of two-qubit gates for external re-synthesis.

use ndarray::Array2;
use num_complex::Complex64;

use crate::circuit::Circuit;
use crate::dag::{Dag, VertexId};
use crate::error::CircuitError;
use crate::op::PortType;
use crate::subcircuit::{boundary_of, find_subcircuits};
use crate::unit::UnitId;

fn linear_port_count(dag: &Dag, v: VertexId) -> Result<usize, CircuitError> {
    Ok(dag.op(v)?.signature().iter().filter(|t| t.is_linear()).count())
}

/// Commutes single-qubit gates on `unit`'s wire toward the input end, past
/// any multi-qubit gate that commutes with the single-qubit gate's basis at
/// the port `unit`'s wire occupies there. Walks from the output end toward
/// the input so a gate is only ever pulled earlier, never later.
pub fn commute_to_front(circuit: &mut Circuit, unit: &UnitId) -> Result<bool, CircuitError> {
    let mut changed = false;
    let input = circuit
        .boundary()
        .input_vertex(unit)
        .ok_or_else(|| CircuitError::CircuitInvalidity { msg: format!("unknown unit {unit}") })?;
    let mut pending: Vec<VertexId> = Vec::new();
    let mut vertex = circuit
        .boundary()
        .output_vertex(unit)
        .ok_or_else(|| CircuitError::CircuitInvalidity { msg: format!("unknown unit {unit}") })?;

    loop {
        let in_edge = circuit.dag().in_edge(vertex, 0)?.ok_or(CircuitError::CircuitInvalidity {
            msg: format!("wire for {unit} has no predecessor"),
        })?;
        let v = circuit.dag().source(in_edge)?;
        let p_in = circuit.dag().source_port(in_edge)?;
        if v == input {
            break;
        }
        let op = circuit.dag().op(v)?.clone();
        let n_linear = linear_port_count(circuit.dag(), v)?;

        if op.is_gate() && n_linear >= 2 {
            while let Some(&u) = pending.last() {
                let u_op = circuit.dag().op(u)?.clone();
                let Some(basis) = u_op.commuting_basis(0) else { break };
                if !op.commutes_with_basis(basis, p_in) {
                    break;
                }
                splice_before(circuit, u, v, p_in)?;
                pending.pop();
                changed = true;
            }
            pending.clear();
        } else if op.is_gate() && n_linear == 1 {
            pending.push(v);
        } else {
            pending.clear();
        }
        vertex = v;
    }
    Ok(changed)
}

/// Detaches the single-qubit vertex `u` from wherever it currently sits and
/// reattaches it directly on the input side of `v` at port `p_in`.
fn splice_before(
    circuit: &mut Circuit,
    u: VertexId,
    v: VertexId,
    p_in: usize,
) -> Result<(), CircuitError> {
    let dag = circuit.dag_mut();
    let u_in = dag.in_edge(u, 0)?.ok_or(CircuitError::CircuitInvalidity {
        msg: "commute-to-front: single-qubit vertex missing its in-edge".into(),
    })?;
    let u_out = dag
        .out_edges(u, 0)?
        .iter()
        .copied()
        .find(|e| dag.edge_type(*e).map(|t| t.is_linear()).unwrap_or(false))
        .ok_or(CircuitError::CircuitInvalidity {
            msg: "commute-to-front: single-qubit vertex missing its linear out-edge".into(),
        })?;
    let (u_src, u_src_port) = (dag.source(u_in)?, dag.source_port(u_in)?);
    let (u_tgt, u_tgt_port, u_ty) = (dag.target(u_out)?, dag.target_port(u_out)?, dag.edge_type(u_out)?);
    dag.remove_edge(u_in)?;
    dag.remove_edge(u_out)?;
    dag.add_edge(u_src, u_src_port, u_tgt, u_tgt_port, u_ty)?;

    let v_in = dag.in_edge(v, p_in)?.ok_or(CircuitError::CircuitInvalidity {
        msg: "commute-to-front: target vertex missing its in-edge".into(),
    })?;
    let (v_src, v_src_port, v_ty) = (dag.source(v_in)?, dag.source_port(v_in)?, dag.edge_type(v_in)?);
    dag.remove_edge(v_in)?;
    dag.add_edge(v_src, v_src_port, u, 0, v_ty)?;
    dag.add_edge(u, 0, v, p_in, v_ty)?;
    Ok(())
}

/// An external collaborator that re-synthesizes a two-qubit unitary at a
/// target fidelity, returning a replacement circuit and its CX count.
/// Implementing the KAK decomposition itself is out of scope here; this
/// trait is the seam a concrete numeric backend plugs into.
pub trait TwoQubitSynthesizer {
    fn synthesize(&self, unitary: &Array2<Complex64>, fidelity: f64) -> (Circuit, usize);
}

/// Parameters for [`squash_two_qubit_interactions`].
#[derive(Debug, Clone, Copy)]
pub struct TwoQubitSquashOptions {
    pub cx_fidelity: f64,
}

/// Finds maximal connected, convex runs of purely-two-qubit gates (an
/// "interaction") and, wherever the caller can supply the interaction's
/// unitary, asks `synthesizer` for a cheaper replacement.
///
/// `unitary_of` computes the unitary of a run of ops acting on the same
/// qubit pair; it returns `None` when the op sequence includes something
/// this crate's gate catalogue cannot give a concrete matrix for (e.g. a
/// symbolic parameter), in which case the run is left untouched.
pub fn squash_two_qubit_interactions(
    circuit: &mut Circuit,
    synthesizer: &dyn TwoQubitSynthesizer,
    options: TwoQubitSquashOptions,
    unitary_of: impl Fn(&Circuit, &[VertexId]) -> Option<Array2<Complex64>>,
) -> Result<bool, CircuitError> {
    let mut changed = false;
    let candidates: Vec<VertexId> = circuit
        .dag()
        .vertices()
        .into_iter()
        .filter(|v| {
            circuit
                .dag()
                .op(*v)
                .map(|op| {
                    op.is_gate()
                        && op.signature().iter().filter(|t| *t == &PortType::Quantum).count() == 2
                        && op.signature().len() == 2
                })
                .unwrap_or(false)
        })
        .collect();
    let groups = find_subcircuits(circuit.dag(), candidates);

    for group in groups {
        if group.len() < 2 {
            continue;
        }
        let Some(unitary) = unitary_of(circuit, &group) else {
            continue;
        };
        let cx_count = group
            .iter()
            .filter(|v| circuit.dag().op(**v).map(|op| op.name() == "CNOT").unwrap_or(false))
            .count();
        let (replacement, new_cx_count) = synthesizer.synthesize(&unitary, options.cx_fidelity);
        if new_cx_count < cx_count {
            let sub = boundary_of(circuit.dag(), &group)?;
            crate::rewrite::substitute_subcircuit(circuit, &sub, replacement)?;
            changed = true;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BasicOp, Clifford, TwoQubitKind};
    use crate::rewrite::append;
    use std::rc::Rc;

    #[test]
    fn commutes_pauli_z_through_cnot_control() {
        let mut circuit = Circuit::with_qubits(2).unwrap();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        append(&mut circuit, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q0.clone(), 0), (q1.clone(), 1)])
            .unwrap();
        append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::PauliZ)), &[(q0.clone(), 0)]).unwrap();

        let changed = commute_to_front(&mut circuit, &q0).unwrap();
        assert!(changed);

        let input0 = circuit.boundary().input_vertex(&q0).unwrap();
        let first_edge = circuit.dag().out_edges(input0, 0).unwrap()[0];
        let first_vertex = circuit.dag().target(first_edge).unwrap();
        assert_eq!(circuit.dag().op(first_vertex).unwrap().name(), "PauliZ");
    }

    #[test]
    fn does_not_commute_pauli_x_through_cnot_control() {
        let mut circuit = Circuit::with_qubits(2).unwrap();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        append(&mut circuit, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q0.clone(), 0), (q1.clone(), 1)])
            .unwrap();
        append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::PauliX)), &[(q0.clone(), 0)]).unwrap();

        let changed = commute_to_front(&mut circuit, &q0).unwrap();
        assert!(!changed);
    }
}
