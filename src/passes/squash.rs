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

//! Single-qubit squashing: collapse a maximal run of single-qubit gates on
//! one wire into a shorter, pluggable-strategy replacement.
//!
//! Composition of a chain of rotations about mixed axes is done with unit
//! quaternions rather than tracked symbolically: only numeric parameters
//! can be composed past a single same-axis sum, so a chain containing a
//! symbolic angle is left untouched unless every parameter in it
//! evaluates to a number (or `always_squash_symbols` accepts the
//! imprecision of treating an unresolved symbol as its current value,
//! which this pass never does — see `Expr::eval`).

use std::rc::Rc;

use crate::circuit::Circuit;
use crate::dag::VertexId;
use crate::error::CircuitError;
use crate::expr::Expr;
use crate::op::{Op, OpKind, Pauli};
use crate::ops::{BasicOp, RotationAxis};
use crate::passes::redundancy;
use crate::path::Position;
use crate::rewrite::substitute_subcircuit;
use crate::subcircuit::boundary_of;
use crate::unit::UnitId;

/// Walks `unit`'s wire from its input to its output vertex, recording the
/// `(vertex, port)` position at each step (the port matters at multi-qubit
/// gates, where `unit`'s wire may land on any port of the shared vertex).
fn wire_positions(circuit: &Circuit, unit: &UnitId) -> Result<Vec<Position>, CircuitError> {
    let mut positions = Vec::new();
    let start = circuit
        .boundary()
        .input_vertex(unit)
        .ok_or_else(|| CircuitError::CircuitInvalidity { msg: format!("unknown unit {unit}") })?;
    let end = circuit
        .boundary()
        .output_vertex(unit)
        .ok_or_else(|| CircuitError::CircuitInvalidity { msg: format!("unknown unit {unit}") })?;
    let mut pos = Position { vertex: start, port: 0 };
    loop {
        positions.push(pos);
        if pos.vertex == end {
            break;
        }
        let edges = circuit.dag().out_edges(pos.vertex, pos.port)?;
        let edge = edges
            .iter()
            .copied()
            .find(|e| circuit.dag().edge_type(*e).map(|t| t.is_linear()).unwrap_or(false))
            .ok_or(CircuitError::CircuitInvalidity {
                msg: format!("linear path for {unit} does not reach its output vertex"),
            })?;
        pos = Position {
            vertex: circuit.dag().target(edge)?,
            port: circuit.dag().target_port(edge)?,
        };
    }
    Ok(positions)
}

/// A pluggable single-qubit squash strategy (spec.md §4.H).
pub trait Squasher {
    /// Whether `op` belongs to the set this squasher accumulates.
    fn accepts(&self, op: &dyn Op) -> bool;
    /// Ingests one more op onto the currently open chain.
    fn append(&mut self, op: &dyn Op);
    /// Produces a replacement for the accumulated chain, and optionally
    /// one op to carry through the next multi-qubit gate instead of
    /// emitting here.
    fn flush(&mut self, next_commutation: Option<Pauli>) -> (Circuit, Option<Rc<dyn Op>>);
    /// Resets the accumulator, discarding any open chain.
    fn clear(&mut self);
    /// Number of ops accumulated since the last `clear`/`flush`.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Driver parameters (spec.md §4.H).
#[derive(Debug, Clone, Copy, Default)]
pub struct SquashOptions {
    pub reversed: bool,
    pub always_squash_symbols: bool,
}

/// Walks `unit`'s wire, handing maximal accepted runs to `squasher` and
/// substituting its `flush()` result whenever that result is strictly
/// smaller (or structurally different at equal size) than the run it
/// replaces.
pub fn run_squash(
    circuit: &mut Circuit,
    unit: &UnitId,
    squasher: &mut dyn Squasher,
    options: SquashOptions,
) -> Result<bool, CircuitError> {
    squasher.clear();
    let mut changed = false;
    let mut chain: Vec<VertexId> = Vec::new();
    let mut positions = wire_positions(circuit, unit)?;
    if options.reversed {
        positions.reverse();
    }

    let mut i = 0;
    while i < positions.len() {
        let position = positions[i];
        let v = position.vertex;
        let op = circuit.dag().op(v)?.clone();
        let is_last = i + 1 == positions.len();
        let accepted = !is_last && squasher.accepts(op.as_ref());
        if accepted {
            if options.reversed {
                squasher.append(op.dagger().as_ref());
            } else {
                squasher.append(op.as_ref());
            }
            chain.push(v);
            i += 1;
            continue;
        }

        if !chain.is_empty() {
            let next_commutation = op.commuting_basis(position.port);
            let (replacement, carry) = squasher.flush(next_commutation);
            let smaller = replacement.commands().len() < chain.len();
            if smaller {
                let sub = boundary_of(circuit.dag(), &chain)?;
                substitute_subcircuit(circuit, &sub, replacement)?;
                changed = true;
                if let Some(carry_op) = carry {
                    crate::rewrite::append(circuit, carry_op, &[(unit.clone(), 0)])?;
                }
            }
            chain.clear();
        }
        squasher.clear();
        i += 1;
    }

    if !chain.is_empty() {
        let (replacement, carry) = squasher.flush(None);
        if replacement.commands().len() < chain.len() {
            let sub = boundary_of(circuit.dag(), &chain)?;
            substitute_subcircuit(circuit, &sub, replacement)?;
            changed = true;
            if let Some(carry_op) = carry {
                crate::rewrite::append(circuit, carry_op, &[(unit.clone(), 0)])?;
            }
        }
    }
    Ok(changed)
}

// --- Quaternion algebra for composing rotations about mixed axes -----

#[derive(Debug, Clone, Copy, Default)]
struct Quaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl Quaternion {
    const IDENTITY: Quaternion = Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    /// The rotation by `theta` half-turns of π about `axis`, per this
    /// crate's convention that the identity recurs at `theta ≡ 0 mod 4`.
    fn axis_angle(axis: RotationAxis, theta: f64) -> Quaternion {
        let half = theta * std::f64::consts::FRAC_PI_2;
        let (s, c) = half.sin_cos();
        match axis {
            RotationAxis::X => Quaternion { w: c, x: s, y: 0.0, z: 0.0 },
            RotationAxis::Y => Quaternion { w: c, x: 0.0, y: s, z: 0.0 },
            RotationAxis::Z => Quaternion { w: c, x: 0.0, y: 0.0, z: s },
        }
    }

    /// `self` applied first, then `other`.
    fn then(self, other: Quaternion) -> Quaternion {
        let (a, b) = (other, self);
        Quaternion {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }

    fn to_matrix(self) -> [[f64; 3]; 3] {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        [
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - w * z), 2.0 * (x * z + w * y)],
            [2.0 * (x * y + w * z), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - w * x)],
            [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), 1.0 - 2.0 * (x * x + y * y)],
        ]
    }
}

fn axis_index(a: RotationAxis) -> usize {
    match a {
        RotationAxis::X => 0,
        RotationAxis::Y => 1,
        RotationAxis::Z => 2,
    }
}

fn permutation_sign(order: [usize; 3]) -> f64 {
    match order {
        [0, 1, 2] | [1, 2, 0] | [2, 0, 1] => 1.0,
        _ => -1.0,
    }
}

/// Decomposes `q` into Euler angles `(a, b, c)` such that `q` equals
/// rotation by `a` about `p`, then `b` about `q_axis`, then `c` about `p`
/// again (each angle in this crate's half-turn convention).
fn decompose_pqp(q: Quaternion, p: RotationAxis, q_axis: RotationAxis) -> (f64, f64, f64) {
    let r = q.to_matrix();
    let third = [RotationAxis::X, RotationAxis::Y, RotationAxis::Z]
        .into_iter()
        .find(|a| *a != p && *a != q_axis)
        .unwrap();
    let order = [axis_index(q_axis), axis_index(third), axis_index(p)];
    let sign = permutation_sign(order);

    // Relabel the matrix into the standard Z-X-Z role frame, where the
    // role-Z axis is `p` and the role-X axis is `q_axis`.
    let mut role = [[0.0; 3]; 3];
    for (role_row, &src_row) in order.iter().enumerate() {
        for (role_col, &src_col) in order.iter().enumerate() {
            role[role_row][role_col] = r[src_row][src_col];
        }
    }

    let cos_b = role[2][2].clamp(-1.0, 1.0);
    let b = cos_b.acos();
    let (a, c) = if b.sin().abs() > 1e-9 {
        (role[0][2].atan2(-role[1][2]), role[2][0].atan2(role[2][1]))
    } else if cos_b > 0.0 {
        (role[0][0].atan2(-role[0][1]), 0.0)
    } else {
        (role[0][1].atan2(role[0][0]), 0.0)
    };

    // In half-turns of π rather than radians, and corrected for the
    // handedness of the (q_axis, third, p) relabeling.
    let to_half_turns = |rad: f64| rad / std::f64::consts::FRAC_PI_2;
    (
        sign * to_half_turns(a),
        sign * to_half_turns(b),
        sign * to_half_turns(c),
    )
}

fn mk_rotation(axis: RotationAxis, theta: f64) -> Rc<dyn Op> {
    Rc::new(BasicOp::Rotation { axis, theta: Expr::from_f64(theta) })
}

/// The P-Q-P squasher strategy of spec.md §4.H.
#[derive(Debug)]
pub struct PqpSquasher {
    p: RotationAxis,
    q: RotationAxis,
    smart: bool,
    reversed: bool,
    chain: Vec<(RotationAxis, f64)>,
    all_numeric: bool,
}

impl PqpSquasher {
    pub fn new(p: RotationAxis, q: RotationAxis, smart: bool, reversed: bool) -> Self {
        assert!(p != q, "PQP squasher requires two distinct axes");
        PqpSquasher { p, q, smart, reversed, chain: Vec::new(), all_numeric: true }
    }
}

impl Squasher for PqpSquasher {
    fn accepts(&self, op: &dyn Op) -> bool {
        op.is_rotation()
            && matches!(op.rotation_family(), Some(f) if f == self.p.name() || f == self.q.name())
    }

    fn append(&mut self, op: &dyn Op) {
        let axis = if op.rotation_family() == Some(self.p.name()) { self.p } else { self.q };
        let theta = op.params()[0].clone();
        match theta.eval() {
            Some(v) => self.chain.push((axis, v)),
            None => {
                self.all_numeric = false;
                self.chain.push((axis, 0.0));
            }
        }
    }

    fn flush(&mut self, next_commutation: Option<Pauli>) -> (Circuit, Option<Rc<dyn Op>>) {
        if self.chain.is_empty() || !self.all_numeric {
            return (Circuit::with_qubits(1).unwrap(), None);
        }

        let mut merged: Vec<(RotationAxis, f64)> = Vec::new();
        for &(axis, theta) in &self.chain {
            if let Some(last) = merged.last_mut() {
                if last.0 == axis {
                    last.1 += theta;
                    continue;
                }
            }
            merged.push((axis, theta));
        }

        let (mut p, mut q_axis) = (self.p, self.q);
        let mut commute_through = false;
        if self.smart {
            if let Some(basis) = next_commutation {
                if self.p.pauli_matches(basis) {
                    commute_through = true;
                } else if self.q.pauli_matches(basis) {
                    p = self.q;
                    q_axis = self.p;
                    commute_through = true;
                }
            }
        }

        let total = merged
            .iter()
            .fold(Quaternion::IDENTITY, |acc, &(axis, theta)| acc.then(Quaternion::axis_angle(axis, theta)));
        let (mut a, mut q_angle, mut b) = decompose_pqp(total, p, q_axis);

        if self.reversed {
            let (na, nb) = (-b, -a);
            a = na;
            b = nb;
            q_angle = -q_angle;
        }

        if is_near(q_angle, 2.0) && !is_near(b, 0.0) {
            a -= b;
            b = 0.0;
        } else if is_near(b, 0.5) {
            a += 0.5;
            q_angle = -q_angle;
            b = 0.0;
        } else if is_near(b, 1.5) {
            a += 1.5;
            q_angle = -q_angle;
            b = 0.0;
        } else if is_near(a, 0.5) && !is_near(b, 0.0) {
            q_angle = -q_angle;
            b += 0.5;
            a = 0.0;
        } else if is_near(a, 1.5) && !is_near(b, 0.0) {
            q_angle = -q_angle;
            b += 1.5;
            a = 0.0;
        }

        if self.reversed {
            let (na, nb) = (-b, -a);
            a = na;
            b = nb;
            q_angle = -q_angle;
        }

        let mut circuit = Circuit::with_qubits(1).unwrap();
        let wire = UnitId::qubit(0);
        let mut carry = None;
        if !is_near(a, 0.0) {
            if commute_through {
                carry = Some(mk_rotation(p, a));
            } else {
                crate::rewrite::append(&mut circuit, mk_rotation(p, a), &[(wire.clone(), 0)]).ok();
            }
        }
        if !is_near(q_angle, 0.0) {
            crate::rewrite::append(&mut circuit, mk_rotation(q_axis, q_angle), &[(wire.clone(), 0)]).ok();
        }
        if !is_near(b, 0.0) {
            crate::rewrite::append(&mut circuit, mk_rotation(p, b), &[(wire.clone(), 0)]).ok();
        }
        redundancy::run(&mut circuit).ok();
        (circuit, carry)
    }

    fn clear(&mut self) {
        self.chain.clear();
        self.all_numeric = true;
    }

    fn len(&self) -> usize {
        self.chain.len()
    }
}

impl RotationAxis {
    fn pauli_matches(self, basis: Pauli) -> bool {
        matches!(
            (self, basis),
            (RotationAxis::X, Pauli::X) | (RotationAxis::Y, Pauli::Y) | (RotationAxis::Z, Pauli::Z)
        )
    }
}

fn is_near(v: f64, target: f64) -> bool {
    (v.rem_euclid(4.0) - target.rem_euclid(4.0)).abs() < 1e-9
}

/// The standard (TK1-based) squasher strategy of spec.md §4.H: accepts
/// any op in `accepted`, composes the TK1 triple of each, and hands the
/// extracted Z-X-Z Euler angles to a user-supplied replacement builder.
pub struct StandardSquasher<F: Fn(Expr, Expr, Expr) -> Circuit> {
    accepted: Vec<&'static str>,
    composed: Quaternion,
    len: usize,
    all_numeric: bool,
    tk1_replacement: F,
}

impl<F: Fn(Expr, Expr, Expr) -> Circuit> std::fmt::Debug for StandardSquasher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardSquasher")
            .field("accepted", &self.accepted)
            .field("composed", &self.composed)
            .field("len", &self.len)
            .field("all_numeric", &self.all_numeric)
            .finish_non_exhaustive()
    }
}

impl<F: Fn(Expr, Expr, Expr) -> Circuit> StandardSquasher<F> {
    pub fn new(accepted: Vec<&'static str>, tk1_replacement: F) -> Self {
        StandardSquasher {
            accepted,
            composed: Quaternion::IDENTITY,
            len: 0,
            all_numeric: true,
            tk1_replacement,
        }
    }
}

impl<F: Fn(Expr, Expr, Expr) -> Circuit> Squasher for StandardSquasher<F> {
    fn accepts(&self, op: &dyn Op) -> bool {
        self.accepted.contains(&op.name())
    }

    fn append(&mut self, op: &dyn Op) {
        self.len += 1;
        let Some([alpha, beta, gamma, _phase]) = op.get_tk1_angles() else {
            self.all_numeric = false;
            return;
        };
        let (Some(a), Some(b), Some(c)) = (alpha.eval(), beta.eval(), gamma.eval()) else {
            self.all_numeric = false;
            return;
        };
        // TK1(alpha, beta, gamma) = Rz(alpha) Rx(beta) Rz(gamma).
        let triple = Quaternion::axis_angle(RotationAxis::Z, c)
            .then(Quaternion::axis_angle(RotationAxis::X, b))
            .then(Quaternion::axis_angle(RotationAxis::Z, a));
        self.composed = self.composed.then(triple);
    }

    fn flush(&mut self, _next_commutation: Option<Pauli>) -> (Circuit, Option<Rc<dyn Op>>) {
        if self.len == 0 || !self.all_numeric {
            return (Circuit::with_qubits(1).unwrap(), None);
        }
        let (a, b, c) = decompose_pqp(self.composed, RotationAxis::Z, RotationAxis::X);
        let circuit = (self.tk1_replacement)(Expr::from_f64(c), Expr::from_f64(b), Expr::from_f64(a));
        (circuit, None)
    }

    fn clear(&mut self) {
        self.composed = Quaternion::IDENTITY;
        self.len = 0;
        self.all_numeric = true;
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// The rounding auxiliary pass of spec.md §4.H: snaps any rotation
/// parameter within `2^-precision` of an integer multiple of 2π to that
/// multiple (restricted to zero only when `only_zero` is set).
#[derive(Debug, Clone, Copy)]
pub struct RoundingPass {
    pub precision: u32,
    pub only_zero: bool,
}

impl RoundingPass {
    pub fn apply(&self, circuit: &mut Circuit) -> Result<(), CircuitError> {
        let targets: Vec<VertexId> = circuit
            .commands()
            .into_iter()
            .filter(|(_, op)| op.is_rotation() || op.name() == "TK1" || op.kind() == OpKind::Conditional)
            .map(|(v, _)| v)
            .collect();
        for v in targets {
            let op = circuit.dag().op(v)?.clone();
            let rounded = self.round_op(op.as_ref());
            crate::rewrite::substitute_vertex(circuit.dag_mut(), v, rounded)?;
        }
        Ok(())
    }

    fn round_op(&self, op: &dyn Op) -> Rc<dyn Op> {
        if op.name() == "TK1" {
            if let Some([a, b, c, _]) = op.get_tk1_angles() {
                return op.with_params(&[
                    self.round_param(&a),
                    self.round_param(&b),
                    self.round_param(&c),
                ]);
            }
        }
        let rounded: Vec<Expr> = op.params().iter().map(|p| self.round_param(p)).collect();
        op.with_params(&rounded)
    }

    fn round_param(&self, e: &Expr) -> Expr {
        let Some(v) = e.eval() else { return e.clone() };
        let tol = 2f64.powi(-(self.precision as i32));
        let candidate = if self.only_zero { 0.0 } else { (v / 2.0).round() * 2.0 };
        if (v - candidate).abs() < tol {
            Expr::from_f64(candidate)
        } else {
            e.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quaternion_composes_same_axis_as_sum() {
        let a = Quaternion::axis_angle(RotationAxis::Z, 0.3);
        let b = Quaternion::axis_angle(RotationAxis::Z, 0.7);
        let total = a.then(b);
        let expected = Quaternion::axis_angle(RotationAxis::Z, 1.0);
        assert!((total.w - expected.w).abs() < 1e-9);
        assert!((total.z - expected.z).abs() < 1e-9);
    }

    #[test]
    fn decompose_pqp_recovers_single_p_rotation() {
        let q = Quaternion::axis_angle(RotationAxis::Z, 0.4);
        let (a, b, c) = decompose_pqp(q, RotationAxis::Z, RotationAxis::X);
        assert!(is_near(a + c, 0.4) || is_near(a, 0.4));
        let _ = b;
    }

    #[test]
    fn rounding_snaps_near_multiple_of_full_turn() {
        let pass = RoundingPass { precision: 20, only_zero: false };
        let rounded = pass.round_param(&Expr::from_f64(2.0 + 1e-8));
        assert!(rounded.equiv_val(2.0, 100.0));
    }

    #[test]
    fn rounding_only_zero_ignores_nonzero_multiples() {
        let pass = RoundingPass { precision: 20, only_zero: true };
        let untouched = pass.round_param(&Expr::from_f64(2.0 + 1e-8));
        assert!(!untouched.equiv_val(2.0, 100.0));
    }
}
