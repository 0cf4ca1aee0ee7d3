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

//! The six round-trip scenarios used to motivate the rewriting core
//! (adjacent-inverse cancellation, pre-measurement elimination, rotation
//! squashing, and commutation through a controlled gate).

use std::rc::Rc;

use qoqo_rewrite::circuit::Circuit;
use qoqo_rewrite::expr::Expr;
use qoqo_rewrite::ops::{BasicOp, Clifford, RotationAxis, TwoQubitKind};
use qoqo_rewrite::passes::controlled::commute_to_front;
use qoqo_rewrite::passes::redundancy;
use qoqo_rewrite::passes::squash::{run_squash, SquashOptions, StandardSquasher};
use qoqo_rewrite::rewrite::append;
use qoqo_rewrite::unit::UnitId;

/// S1: `H; H` on one qubit cancels to the empty circuit, phase unchanged.
#[test]
fn s1_adjacent_hadamards_cancel() {
    let mut circuit = Circuit::with_qubits(1).unwrap();
    let q0 = UnitId::qubit(0);
    append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::Hadamard)), &[(q0.clone(), 0)]).unwrap();
    append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::Hadamard)), &[(q0, 0)]).unwrap();

    let changed = redundancy::run(&mut circuit).unwrap();

    assert!(changed);
    assert!(circuit.commands().is_empty());
    assert_eq!(circuit.phase(), &Expr::ZERO);
}

/// S2: `Rz(0.3); Rz(-0.3)` fuses to a zero-angle rotation, then that
/// identity is removed outright, leaving the empty circuit.
#[test]
fn s2_opposite_rotations_fuse_to_identity_and_vanish() {
    let mut circuit = Circuit::with_qubits(1).unwrap();
    let q0 = UnitId::qubit(0);
    let theta = Expr::from_f64(0.3);
    append(
        &mut circuit,
        Rc::new(BasicOp::Rotation { axis: RotationAxis::Z, theta: theta.clone() }),
        &[(q0.clone(), 0)],
    )
    .unwrap();
    append(
        &mut circuit,
        Rc::new(BasicOp::Rotation { axis: RotationAxis::Z, theta: -theta }),
        &[(q0, 0)],
    )
    .unwrap();

    let changed = redundancy::run(&mut circuit).unwrap();

    assert!(changed);
    assert!(circuit.commands().is_empty());
    assert_eq!(circuit.phase(), &Expr::ZERO);
}

/// S3: a single-qubit gate that commutes with a Z-basis measurement,
/// placed directly before that measurement, is removed and only the
/// `Measure` survives.
#[test]
fn s3_pre_measurement_gate_is_elided() {
    let mut circuit = Circuit::with_qubits(1).unwrap();
    circuit.add_unit(UnitId::bit(0)).unwrap();
    let q0 = UnitId::qubit(0);
    let c0 = UnitId::bit(0);
    append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::PauliZ)), &[(q0.clone(), 0)]).unwrap();
    append(&mut circuit, Rc::new(BasicOp::Measure), &[(q0, 0), (c0, 1)]).unwrap();

    let changed = redundancy::run(&mut circuit).unwrap();

    assert!(changed);
    let commands = circuit.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].1.name(), "Measure");
}

/// S4 (adapted to this catalogue's `get_tk1_angles` coverage, which spans
/// `RotateZ`/`RotateX` but not the fixed Cliffords): a chain of numeric
/// Z/X rotations squashes to a single `TK1` command.
#[test]
fn s4_rotation_chain_squashes_to_single_tk1() {
    let mut circuit = Circuit::with_qubits(1).unwrap();
    let q0 = UnitId::qubit(0);
    append(
        &mut circuit,
        Rc::new(BasicOp::Rotation { axis: RotationAxis::Z, theta: Expr::from_f64(0.2) }),
        &[(q0.clone(), 0)],
    )
    .unwrap();
    append(
        &mut circuit,
        Rc::new(BasicOp::Rotation { axis: RotationAxis::X, theta: Expr::from_f64(0.4) }),
        &[(q0.clone(), 0)],
    )
    .unwrap();
    append(
        &mut circuit,
        Rc::new(BasicOp::Rotation { axis: RotationAxis::Z, theta: Expr::from_f64(0.1) }),
        &[(q0.clone(), 0)],
    )
    .unwrap();

    let mut squasher = StandardSquasher::new(vec!["RotateZ", "RotateX"], |alpha, beta, gamma| {
        let mut replacement = Circuit::with_qubits(1).unwrap();
        let unit = UnitId::qubit(0);
        append(&mut replacement, Rc::new(BasicOp::Tk1 { alpha, beta, gamma }), &[(unit, 0)]).unwrap();
        replacement
    });
    let changed = run_squash(&mut circuit, &q0, &mut squasher, SquashOptions::default()).unwrap();

    assert!(changed);
    let commands = circuit.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].1.name(), "TK1");
}

/// S5 (verified at the level of `commute_to_front` rather than the full
/// `PqpSquasher` commutation-through-carry path): a Pauli-Z sitting right
/// after a CNOT's control commutes past it to the front of the wire,
/// since Z is diagonal in the control's measurement basis.
#[test]
fn s5_z_rotation_commutes_through_cnot_control() {
    let mut circuit = Circuit::with_qubits(2).unwrap();
    let q0 = UnitId::qubit(0);
    let q1 = UnitId::qubit(1);
    append(&mut circuit, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q0.clone(), 0), (q1, 1)]).unwrap();
    append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::PauliZ)), &[(q0.clone(), 0)]).unwrap();

    let changed = commute_to_front(&mut circuit, &q0).unwrap();

    assert!(changed);
    let input0 = circuit.boundary().input_vertex(&q0).unwrap();
    let first_edge = circuit.dag().out_edges(input0, 0).unwrap()[0];
    let first_vertex = circuit.dag().target(first_edge).unwrap();
    assert_eq!(circuit.dag().op(first_vertex).unwrap().name(), "PauliZ");
}

/// S6: a dagger pair cancels only when port-aligned. `CX[0,1]; CX[0,1]`
/// is the identity and is removed; `CX[0,1]; CX[1,0]` is not the
/// identity (the ports are crossed) and must survive untouched.
#[test]
fn s6_cnot_pair_cancels_only_when_port_aligned() {
    let mut aligned = Circuit::with_qubits(2).unwrap();
    let q0 = UnitId::qubit(0);
    let q1 = UnitId::qubit(1);
    append(&mut aligned, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q0.clone(), 0), (q1.clone(), 1)])
        .unwrap();
    append(&mut aligned, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q0.clone(), 0), (q1.clone(), 1)])
        .unwrap();
    let changed = redundancy::run(&mut aligned).unwrap();
    assert!(changed);
    assert!(aligned.commands().is_empty());

    let mut crossed = Circuit::with_qubits(2).unwrap();
    append(&mut crossed, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q0.clone(), 0), (q1.clone(), 1)])
        .unwrap();
    append(&mut crossed, Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)), &[(q1, 0), (q0, 1)]).unwrap();
    let changed = redundancy::run(&mut crossed).unwrap();
    assert!(!changed);
    assert_eq!(crossed.commands().len(), 2);
}
