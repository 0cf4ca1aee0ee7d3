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

//! A local rewriter that repeatedly sweeps the circuit removing redundant
//! gates, until a fixed point is reached. Every rule here only ever touches
//! a vertex and its immediate neighbours, so the whole pass is a worklist
//! of small, independently-checkable rewrites rather than one big one.

use std::collections::HashMap;

use crate::circuit::Circuit;
use crate::dag::{Dag, VertexId};
use crate::error::CircuitError;
use crate::op::{ops_equal, OpKind, Pauli, PortType};
use crate::rewrite::{remove_vertex, substitute_vertex};

/// Runs every rule below to a fixed point. Returns whether anything changed.
pub fn run(circuit: &mut Circuit) -> Result<bool, CircuitError> {
    let mut changed_ever = false;
    loop {
        let mut changed = false;
        for v in circuit.dag().vertices() {
            if remove_identity(circuit, v)? {
                changed = true;
                continue;
            }
            if eliminate_pre_measurement(circuit, v)? {
                changed = true;
                continue;
            }
            if cancel_inverse_pair(circuit, v)? {
                changed = true;
                continue;
            }
            if fuse_rotation_pair(circuit, v)? {
                changed = true;
                continue;
            }
        }
        changed_ever |= changed;
        if !changed {
            break;
        }
    }
    Ok(changed_ever)
}

fn present(dag: &Dag, v: VertexId) -> bool {
    dag.op(v).is_ok()
}

/// For a vertex whose op is the identity up to global phase on every
/// linear port aligned by index (`port i` in == `port i` out), splices it
/// out and folds the phase into the circuit. Skips `Conditional`, whose
/// port layout is not a simple 1:1 linear alignment.
fn remove_identity(circuit: &mut Circuit, v: VertexId) -> Result<bool, CircuitError> {
    if !present(circuit.dag(), v) {
        return Ok(false);
    }
    let op = circuit.dag().op(v)?.clone();
    if !op.is_gate() || op.kind() == OpKind::Conditional {
        return Ok(false);
    }
    let Some(phase) = op.is_identity() else {
        return Ok(false);
    };
    let sig = op.signature();
    let mut rewiring = HashMap::new();
    for (port, ty) in sig.iter().enumerate() {
        if ty.is_linear() {
            rewiring.insert(port, port);
        }
    }
    circuit.add_phase(phase);
    remove_vertex(circuit.dag_mut(), v, &rewiring, true)
        .map(|_| true)
}

/// A single-qubit gate immediately before a `Measure` on its only wire, if
/// it commutes with the Pauli-Z measurement basis there, cannot change the
/// measurement's outcome distribution and is removed outright.
fn eliminate_pre_measurement(circuit: &mut Circuit, v: VertexId) -> Result<bool, CircuitError> {
    if !present(circuit.dag(), v) {
        return Ok(false);
    }
    let op = circuit.dag().op(v)?.clone();
    if op.kind() != OpKind::Measure {
        return Ok(false);
    }
    let Some(in_edge) = circuit.dag().in_edge(v, 0)? else {
        return Ok(false);
    };
    let pred = circuit.dag().source(in_edge)?;
    let pred_port = circuit.dag().source_port(in_edge)?;
    if !present(circuit.dag(), pred) {
        return Ok(false);
    }
    let pred_op = circuit.dag().op(pred)?.clone();
    if !pred_op.is_gate() || pred_op.signature().len() != 1 {
        return Ok(false);
    }
    if circuit.dag().out_edges(pred, pred_port)?.len() != 1 {
        return Ok(false);
    }
    if !pred_op.commutes_with_basis(Pauli::Z, pred_port) {
        return Ok(false);
    }
    let mut rewiring = HashMap::new();
    rewiring.insert(0, 0);
    remove_vertex(circuit.dag_mut(), pred, &rewiring, true).map(|_| true)
}

/// If every linear out-port of `a` feeds, port-aligned, into the
/// corresponding linear in-port of a single vertex `b` (and nothing else
/// feeds those ports of `b`), returns the `a`-port -> `b`-port map.
fn directly_follows(
    dag: &Dag,
    a: VertexId,
    b: VertexId,
) -> Result<Option<HashMap<usize, usize>>, CircuitError> {
    let sig_a = dag.op(a)?.signature();
    let sig_b = dag.op(b)?.signature();
    let mut map = HashMap::new();
    for (port, ty) in sig_a.iter().enumerate() {
        if !ty.is_linear() {
            continue;
        }
        let outs = dag.out_edges(a, port)?;
        if outs.len() != 1 || dag.target(outs[0])? != b {
            return Ok(None);
        }
        map.insert(port, dag.target_port(outs[0])?);
    }
    let linear_b_ports = sig_b.iter().filter(|t| t.is_linear()).count();
    if map.len() != linear_b_ports {
        return Ok(None);
    }
    Ok(Some(map))
}

/// Two directly-connected, port-aligned gates that are each other's
/// dagger cancel: their shared wires are spliced straight through.
fn cancel_inverse_pair(circuit: &mut Circuit, v: VertexId) -> Result<bool, CircuitError> {
    let dag = circuit.dag();
    if !present(dag, v) {
        return Ok(false);
    }
    let op = dag.op(v)?.clone();
    if !op.is_gate() {
        return Ok(false);
    }
    let sig = op.signature();

    let mut candidate: Option<VertexId> = None;
    for (port, ty) in sig.iter().enumerate() {
        if !ty.is_linear() {
            continue;
        }
        let outs = dag.out_edges(v, port)?;
        if outs.len() != 1 {
            return Ok(false);
        }
        let t = dag.target(outs[0])?;
        match candidate {
            None => candidate = Some(t),
            Some(c) if c == t => {}
            Some(_) => return Ok(false),
        }
    }
    let Some(b) = candidate else {
        return Ok(false);
    };
    let Some(map) = directly_follows(dag, v, b)? else {
        return Ok(false);
    };
    // A structural dagger match is only a real cancellation if each wire
    // re-enters `b` on the same port index it left `v` on: a dagger pair
    // wired port-crossed (e.g. CX[0,1] feeding CX[1,0]) is not the
    // identity and must be left alone.
    if map.iter().any(|(&in_port, &out_port)| in_port != out_port) {
        return Ok(false);
    }
    let op_b = dag.op(b)?.clone();
    if !op_b.is_gate() || !ops_equal(&op.dagger(), &op_b) {
        return Ok(false);
    }

    let mut splices = Vec::new();
    for (port, ty) in sig.iter().enumerate() {
        if !ty.is_linear() {
            continue;
        }
        let in_edge = dag.in_edge(v, port)?.ok_or(CircuitError::CircuitInvalidity {
            msg: "inverse-cancellation candidate missing an in-edge".into(),
        })?;
        let source = dag.source(in_edge)?;
        let source_port = dag.source_port(in_edge)?;
        let edge_type = dag.edge_type(in_edge)?;
        let b_port = map[&port];
        let outs = dag.out_edges(b, b_port)?;
        if outs.len() != 1 {
            return Ok(false);
        }
        let target = dag.target(outs[0])?;
        let target_port = dag.target_port(outs[0])?;
        splices.push((source, source_port, target, target_port, edge_type));
    }

    let dag = circuit.dag_mut();
    for (port, _) in sig.iter().enumerate() {
        if let Some(e) = dag.in_edge(v, port)? {
            dag.remove_edge(e)?;
        }
        for e in dag.out_edges(v, port)?.to_vec() {
            dag.remove_edge(e)?;
        }
    }
    let sig_b = op_b.signature();
    for port in 0..sig_b.len() {
        if let Some(e) = dag.in_edge(b, port)? {
            dag.remove_edge(e)?;
        }
        for e in dag.out_edges(b, port)?.to_vec() {
            dag.remove_edge(e)?;
        }
    }
    dag.remove_vertex(v)?;
    dag.remove_vertex(b)?;
    for (source, source_port, target, target_port, edge_type) in splices {
        dag.add_edge(source, source_port, target, target_port, edge_type)?;
    }
    Ok(true)
}

/// Two directly-connected rotations of the same family fuse into one at
/// the summed angle (a 1-parameter group composes by addition).
fn fuse_rotation_pair(circuit: &mut Circuit, v: VertexId) -> Result<bool, CircuitError> {
    let dag = circuit.dag();
    if !present(dag, v) {
        return Ok(false);
    }
    let op = dag.op(v)?.clone();
    if !op.is_rotation() {
        return Ok(false);
    }
    let outs = dag.out_edges(v, 0)?;
    if outs.len() != 1 {
        return Ok(false);
    }
    let b = dag.target(outs[0])?;
    let op_b = dag.op(b)?.clone();
    if !op_b.is_rotation() || op_b.rotation_family() != op.rotation_family() {
        return Ok(false);
    }
    if dag.in_edge(b, 0)? != Some(outs[0]) {
        return Ok(false);
    }

    let new_theta = op.params()[0].clone() + op_b.params()[0].clone();
    let fused = op.with_params(&[new_theta]);
    substitute_vertex(circuit.dag_mut(), v, fused)?;
    let mut rewiring = HashMap::new();
    rewiring.insert(0, 0);
    remove_vertex(circuit.dag_mut(), b, &rewiring, true)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::ops::{BasicOp, Clifford, RotationAxis};
    use crate::rewrite::append;
    use crate::unit::UnitId;
    use std::rc::Rc;

    #[test]
    fn cancels_adjacent_hadamards() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        append(
            &mut circuit,
            Rc::new(BasicOp::Clifford(Clifford::Hadamard)),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        append(
            &mut circuit,
            Rc::new(BasicOp::Clifford(Clifford::Hadamard)),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        assert_eq!(circuit.dag().vertex_count(), 4); // input, H, H, output
        let changed = run(&mut circuit).unwrap();
        assert!(changed);
        assert_eq!(circuit.dag().vertex_count(), 2); // input, output
    }

    #[test]
    fn fuses_adjacent_same_axis_rotations() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        append(
            &mut circuit,
            Rc::new(BasicOp::Rotation {
                axis: RotationAxis::Z,
                theta: Expr::from_f64(0.25),
            }),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        append(
            &mut circuit,
            Rc::new(BasicOp::Rotation {
                axis: RotationAxis::Z,
                theta: Expr::from_f64(0.75),
            }),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        run(&mut circuit).unwrap();
        assert_eq!(circuit.dag().vertex_count(), 3); // input, fused Rz, output
        let commands = circuit.commands();
        let (_, op) = &commands[0];
        assert!(op.params()[0].equiv_val(1.0, 4.0));
    }

    #[test]
    fn cancels_adjacent_port_aligned_cnots() {
        let mut circuit = Circuit::with_qubits(2).unwrap();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        append(
            &mut circuit,
            Rc::new(BasicOp::TwoQubit(crate::ops::TwoQubitKind::Cnot)),
            &[(q0.clone(), 0), (q1.clone(), 1)],
        )
        .unwrap();
        append(
            &mut circuit,
            Rc::new(BasicOp::TwoQubit(crate::ops::TwoQubitKind::Cnot)),
            &[(q0.clone(), 0), (q1.clone(), 1)],
        )
        .unwrap();
        let changed = run(&mut circuit).unwrap();
        assert!(changed);
        assert_eq!(circuit.dag().vertex_count(), 4); // in0, out0, in1, out1
    }

    #[test]
    fn leaves_port_crossed_cnots_alone() {
        let mut circuit = Circuit::with_qubits(2).unwrap();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        append(
            &mut circuit,
            Rc::new(BasicOp::TwoQubit(crate::ops::TwoQubitKind::Cnot)),
            &[(q0.clone(), 0), (q1.clone(), 1)],
        )
        .unwrap();
        // Second CNOT has q1 as control (port 0) and q0 as target (port 1):
        // the ports are crossed relative to the first, so this is not the
        // identity and must not be cancelled.
        append(
            &mut circuit,
            Rc::new(BasicOp::TwoQubit(crate::ops::TwoQubitKind::Cnot)),
            &[(q1.clone(), 0), (q0.clone(), 1)],
        )
        .unwrap();
        let changed = run(&mut circuit).unwrap();
        assert!(!changed);
        assert_eq!(circuit.dag().vertex_count(), 6); // in0, in1, cx, cx, out0, out1
    }

    #[test]
    fn fusing_to_zero_then_removes_identity() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        append(
            &mut circuit,
            Rc::new(BasicOp::Rotation {
                axis: RotationAxis::Z,
                theta: Expr::from_f64(0.5),
            }),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        append(
            &mut circuit,
            Rc::new(BasicOp::Rotation {
                axis: RotationAxis::Z,
                theta: Expr::from_f64(-0.5),
            }),
            &[(q0.clone(), 0)],
        )
        .unwrap();
        run(&mut circuit).unwrap();
        assert_eq!(circuit.dag().vertex_count(), 2); // input, output
    }
}
