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

//! The `Op` trait: the only coupling between the DAG/rewriting core
//! (components B-I of spec.md) and a concrete gate catalogue (component A
//! and the `ops` module provide one reference implementation).

use std::fmt::Debug;
use std::rc::Rc;

use crate::expr::Expr;

/// The three edge/port kinds a signature entry can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    /// A quantum wire: linear, exactly one in-edge and one out-edge per port.
    Quantum,
    /// A classical wire: linear, exactly one in-edge and one out-edge per port.
    Classical,
    /// A read-only boolean condition wire: may fan out, may be absent.
    Boolean,
}

impl PortType {
    /// True for port types that participate in the per-unit linear path
    /// invariant (spec.md §3, "Linearity of linear types").
    pub fn is_linear(self) -> bool {
        matches!(self, PortType::Quantum | PortType::Classical)
    }
}

/// The Pauli bases used by commutation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity: commutes with everything.
    I,
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
}

/// The closed set of op "shapes" the core needs to recognize, per spec.md
/// §3. Gate identity (rotation family, fixed Clifford, ...) is carried by
/// the concrete `Op` implementation, not by this tag; the core only ever
/// switches on the broad categories below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// The input end of a unit's linear path.
    Input,
    /// The output end of a unit's linear path.
    Output,
    /// Like `Input`, but the qubit is prepared in |0> rather than supplied
    /// externally.
    Create,
    /// Like `Output`, but the qubit is discarded rather than measured out.
    Discard,
    /// A scheduling barrier: no quantum effect, blocks reordering.
    Barrier,
    /// A projective measurement.
    Measure,
    /// Resets a qubit to |0>.
    Reset,
    /// Wraps an inner op with boolean condition ports.
    Conditional,
    /// A zero-qubit global phase shift.
    Phase,
    /// A unitary gate (including the universal `TK1`).
    Gate,
    /// A boxed sub-circuit.
    Box,
}

/// A required operation value: opaque to the DAG/rewriting core.
///
/// Implementations are referenced by shared ownership (`Rc<dyn Op>`); the
/// core never mutates an `Op` in place, only replaces the handle stored at
/// a vertex (spec.md §5, "Shared resources").
pub trait Op: Debug {
    /// The broad category this op belongs to.
    fn kind(&self) -> OpKind;

    /// A stable, human-readable name, used only for diagnostics.
    fn name(&self) -> &str;

    /// Ordered list of port types, Quantum/Classical/Boolean ports first to
    /// last. A `Conditional` prepends its condition ports here.
    fn signature(&self) -> Vec<PortType>;

    /// Ordered symbolic parameters.
    fn params(&self) -> &[Expr];

    /// `Some(phase)` if this op is the identity up to global phase `phase`
    /// (in half-turns of π); `None` for non-unitary ops and non-identity
    /// unitaries. Any 0-angle rotation of a 1-parameter rotation family
    /// must return `Some(Expr::ZERO)`.
    fn is_identity(&self) -> Option<Expr>;

    /// True for ops that act as gates on the quantum/classical wires
    /// (excludes `Input`/`Output`/`Create`/`Discard`/`Barrier`/`Phase`).
    fn is_gate(&self) -> bool {
        matches!(self.kind(), OpKind::Gate)
    }

    /// True for non-unitary, "one-way" ops: `Measure`, `Reset`, `Discard`,
    /// collapse-style ops.
    fn is_oneway(&self) -> bool {
        matches!(self.kind(), OpKind::Measure | OpKind::Reset | OpKind::Discard)
    }

    /// True iff this op is a single-parameter rotation whose type forms a
    /// 1-parameter group (so two instances compose by summing parameters).
    fn is_rotation(&self) -> bool {
        false
    }

    /// The rotation axis/type tag, if `is_rotation()`. Two rotations fuse
    /// only when this tag agrees.
    fn rotation_family(&self) -> Option<&str> {
        None
    }

    /// Returns an op of the same signature whose matrix is the conjugate
    /// transpose of this op's matrix.
    fn dagger(&self) -> Rc<dyn Op>;

    /// `Some(basis)` if this op commutes with Pauli `basis` acting on
    /// `port`; `Some(Pauli::I)` if it commutes with every Pauli there;
    /// `None` if no single Pauli commutation basis exists at that port.
    fn commuting_basis(&self, port: usize) -> Option<Pauli>;

    /// `true` iff this op commutes with Pauli `basis` acting on `port`.
    fn commutes_with_basis(&self, basis: Pauli, port: usize) -> bool {
        match self.commuting_basis(port) {
            Some(Pauli::I) => true,
            Some(b) => b == basis,
            None => false,
        }
    }

    /// For single-qubit gates: the four half-turn parameters
    /// `(alpha, beta, gamma, phase)` of the canonical `TK1(alpha, beta,
    /// gamma)` decomposition, up to global phase `phase`.
    fn get_tk1_angles(&self) -> Option<[Expr; 4]> {
        None
    }

    /// The names of free symbols appearing in this op's parameters.
    fn free_symbols(&self) -> std::collections::HashSet<String> {
        let mut out = std::collections::HashSet::new();
        for p in self.params() {
            out.extend(p.free_symbols());
        }
        out
    }

    /// Returns a clone of this op with its symbolic parameters substituted.
    fn symbol_substitution(&self, map: &std::collections::HashMap<String, Expr>) -> Rc<dyn Op>;

    /// Returns a clone of this op with `params()` replaced by `params`,
    /// which must have the same length. Used by rotation fusion, which
    /// needs to rebuild a same-family rotation at a new angle without
    /// knowing the concrete `Op` implementation.
    fn with_params(&self, params: &[Expr]) -> Rc<dyn Op>;

    /// Structural equality modulo parameter equivalence (spec.md §3).
    /// Default implementation compares kind, name, signature and
    /// parameter-wise `equiv_expr` modulo 2π (the convention used
    /// throughout this crate for angles in units of half-turns).
    fn op_eq(&self, other: &dyn Op) -> bool {
        if self.kind() != other.kind() || self.name() != other.name() {
            return false;
        }
        if self.signature() != other.signature() {
            return false;
        }
        let sp = self.params();
        let op = other.params();
        if sp.len() != op.len() {
            return false;
        }
        sp.iter().zip(op.iter()).all(|(a, b)| a.equiv_expr(b, 4.0))
    }
}

/// Convenience: equality between two `Rc<dyn Op>` handles, by value.
pub fn ops_equal(a: &Rc<dyn Op>, b: &Rc<dyn Op>) -> bool {
    a.op_eq(b.as_ref())
}
