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

//! The canonical JSON wire format of a [`Circuit`]: a `name`/`phase`/
//! `qubits`/`bits`/`commands`/`implicit_permutation`/`created_qubits`/
//! `discarded_qubits` document, built on top of [`Circuit::commands`] the
//! same way `roqoqo`'s `CircuitSerializable` intermediate struct sits
//! between `serde` and the real `Circuit`.
//!
//! `Op` is opaque to this crate's core, so the direction that writes a
//! `CircuitRecord` back into ops (`circuit_from_record`) cannot be a plain
//! `TryFrom` the way the `Circuit -> CircuitRecord` direction is: it needs
//! a catalogue-specific resolver to turn an op's `name`/`params` back into
//! an `Rc<dyn Op>`. [`crate::ops::resolve`] is that resolver for this
//! crate's own reference catalogue.
//!
//! Two known gaps, both due to the same opaqueness: the `opgroup` field is
//! always written as `None`, since [`Circuit`] records a group's
//! signature but not which vertex belongs to it; and `Conditional`'s
//! boolean condition wires are not part of any unit's linear path, so they
//! are omitted from a command's `args` and a round-tripped `Conditional`
//! loses them.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;

use crate::circuit::Circuit;
use crate::dag::VertexId;
use crate::error::CircuitError;
use crate::expr::Expr;
use crate::op::{Op, OpKind};
use crate::path::Slice;
use crate::unit::UnitId;

/// A serializable `(name, params)` description of an op. Opaque to this
/// crate: it never interprets `name`, only carries it for a resolver
/// supplied at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
pub struct OpRecord {
    pub name: String,
    pub params: Vec<Expr>,
}

impl OpRecord {
    fn of(op: &dyn Op) -> OpRecord {
        // `TK1`'s three angles aren't exposed through `params()` (see the
        // comment on `BasicOp::params`), so prefer `get_tk1_angles` for any
        // op that reports itself as one.
        let params = if op.name() == "TK1" {
            op.get_tk1_angles()
                .map(|angles| angles[..3].to_vec())
                .unwrap_or_else(|| op.params().to_vec())
        } else {
            op.params().to_vec()
        };
        OpRecord {
            name: op.name().to_string(),
            params,
        }
    }
}

/// One entry of `commands`: an op, the units it acts on in port order, and
/// the op-group name it was registered under, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
pub struct CommandRecord {
    pub op: OpRecord,
    pub args: Vec<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opgroup: Option<String>,
}

/// The canonical on-wire form of a [`Circuit`] (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
pub struct CircuitRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub phase: Expr,
    pub qubits: Vec<UnitId>,
    pub bits: Vec<UnitId>,
    pub commands: Vec<CommandRecord>,
    /// Empty iff the identity. This crate's boundary always ties a unit to
    /// the same identifier on both ends of its path, so there is currently
    /// no source of a non-identity permutation; this is always empty.
    pub implicit_permutation: Vec<(UnitId, UnitId)>,
    pub created_qubits: Vec<UnitId>,
    pub discarded_qubits: Vec<UnitId>,
}

impl CircuitRecord {
    /// Builds the wire-format record for `circuit`, named `name`.
    pub fn of(circuit: &Circuit, name: Option<String>) -> Result<CircuitRecord, CircuitError> {
        let boundary = circuit.boundary();
        let units = boundary.units();
        let qubits: Vec<UnitId> = units.iter().filter(|u| u.is_qubit()).cloned().collect();
        let bits: Vec<UnitId> = units.iter().filter(|u| u.is_bit()).cloned().collect();

        let mut created_qubits = Vec::new();
        let mut discarded_qubits = Vec::new();
        for u in units.iter().filter(|u| u.is_qubit()) {
            let input = boundary.input_vertex(u).ok_or_else(|| CircuitError::CircuitInvalidity {
                msg: format!("unknown unit {u}"),
            })?;
            if circuit.dag().op(input)?.kind() == OpKind::Create {
                created_qubits.push(u.clone());
            }
            let output = boundary.output_vertex(u).ok_or_else(|| CircuitError::CircuitInvalidity {
                msg: format!("unknown unit {u}"),
            })?;
            if circuit.dag().op(output)?.kind() == OpKind::Discard {
                discarded_qubits.push(u.clone());
            }
        }

        Ok(CircuitRecord {
            name,
            phase: circuit.phase().clone(),
            qubits,
            bits,
            commands: commands_with_args(circuit)?,
            implicit_permutation: Vec::new(),
            created_qubits,
            discarded_qubits,
        })
    }

    /// Rebuilds a [`Circuit`] from this record, resolving each command's
    /// op via `resolve(name, params, args.len())`. Fails with
    /// [`CircuitError::Unsupported`] if `resolve` cannot place a command.
    pub fn into_circuit(
        &self,
        resolve: impl Fn(&str, &[Expr], usize) -> Option<Rc<dyn Op>>,
    ) -> Result<Circuit, CircuitError> {
        let mut circuit = Circuit::new();
        for q in &self.qubits {
            circuit.add_unit(q.clone())?;
        }
        for b in &self.bits {
            circuit.add_unit(b.clone())?;
        }
        for q in &self.created_qubits {
            circuit.qubit_create(q)?;
        }
        for q in &self.discarded_qubits {
            circuit.qubit_discard(q)?;
        }
        circuit.add_phase(self.phase.clone());

        for command in &self.commands {
            let op = resolve(&command.op.name, &command.op.params, command.args.len()).ok_or_else(|| {
                CircuitError::Unsupported {
                    msg: format!("no resolver match for op {}", command.op.name),
                }
            })?;
            let wires: Vec<(UnitId, usize)> = command
                .args
                .iter()
                .enumerate()
                .map(|(port, unit)| (unit.clone(), port))
                .collect();
            crate::rewrite::append(&mut circuit, op, &wires)?;
        }
        Ok(circuit)
    }
}

impl TryFrom<&Circuit> for CircuitRecord {
    type Error = CircuitError;

    fn try_from(circuit: &Circuit) -> Result<CircuitRecord, CircuitError> {
        CircuitRecord::of(circuit, None)
    }
}

/// Walks the circuit's slices front to back (spec.md §5 ordering:
/// temporal, then lexicographic by the first unit touched), accumulating
/// each gate/`Conditional` vertex's linear-port arguments across however
/// many slices it takes every one of its linear wires to arrive, and
/// emitting the command as soon as the last one does.
fn commands_with_args(circuit: &Circuit) -> Result<Vec<CommandRecord>, CircuitError> {
    let boundary = circuit.boundary();
    let dag = circuit.dag();
    let mut slice = Slice::initial(boundary);
    let mut pending: HashMap<VertexId, Vec<(UnitId, usize)>> = HashMap::new();
    let mut completed: Vec<(usize, UnitId, VertexId, Vec<(UnitId, usize)>)> = Vec::new();
    let mut round = 0usize;

    loop {
        let advanced = slice.next_slice(dag);
        if advanced.is_empty() {
            break;
        }
        for u in &advanced {
            if let Some(pos) = slice.position_of(u) {
                pending.entry(pos.vertex).or_default().push((u.clone(), pos.port));
            }
        }
        let done: Vec<VertexId> = pending
            .iter()
            .filter(|(v, units)| {
                let needed = dag
                    .op(**v)
                    .map(|op| op.signature().iter().filter(|t| t.is_linear()).count())
                    .unwrap_or(usize::MAX);
                units.len() == needed
            })
            .map(|(v, _)| *v)
            .collect();
        for v in done {
            let units = pending.remove(&v).unwrap();
            let first = units.iter().map(|(u, _)| u).min().cloned().unwrap();
            completed.push((round, first, v, units));
        }
        round += 1;
    }

    completed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut out = Vec::with_capacity(completed.len());
    for (_, _, v, mut units) in completed {
        let op = dag.op(v)?.clone();
        if !(op.is_gate() || op.kind() == OpKind::Conditional) {
            continue;
        }
        units.sort_by_key(|(_, port)| *port);
        let args = units.into_iter().map(|(u, _)| u).collect();
        out.push(CommandRecord {
            op: OpRecord::of(op.as_ref()),
            args,
            opgroup: None,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::ops::{BasicOp, Clifford, TwoQubitKind};
    use crate::rewrite::append;

    #[test]
    fn round_trips_a_simple_circuit() {
        let mut circuit = Circuit::with_qubits(2).unwrap();
        let q0 = UnitId::qubit(0);
        let q1 = UnitId::qubit(1);
        append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::Hadamard)), &[(q0.clone(), 0)]).unwrap();
        append(
            &mut circuit,
            Rc::new(BasicOp::TwoQubit(TwoQubitKind::Cnot)),
            &[(q0.clone(), 0), (q1.clone(), 1)],
        )
        .unwrap();

        let record = CircuitRecord::of(&circuit, Some("bell".into())).unwrap();
        assert_eq!(record.commands.len(), 2);
        assert_eq!(record.commands[0].op.name, "Hadamard");
        assert_eq!(record.commands[0].args, vec![q0.clone()]);
        assert_eq!(record.commands[1].op.name, "CNOT");
        assert_eq!(record.commands[1].args, vec![q0, q1]);

        let rebuilt = record.into_circuit(ops::resolve).unwrap();
        let rebuilt_record = CircuitRecord::of(&rebuilt, None).unwrap();
        assert_eq!(rebuilt_record.commands, record.commands);
    }

    #[test]
    fn serializes_to_json_and_back() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        append(&mut circuit, Rc::new(BasicOp::Clifford(Clifford::PauliX)), &[(q0, 0)]).unwrap();
        let record = CircuitRecord::of(&circuit, None).unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let parsed: CircuitRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn tracks_created_and_discarded_qubits() {
        let mut circuit = Circuit::with_qubits(1).unwrap();
        let q0 = UnitId::qubit(0);
        circuit.qubit_create(&q0).unwrap();
        circuit.qubit_discard(&q0).unwrap();
        let record = CircuitRecord::of(&circuit, None).unwrap();
        assert_eq!(record.created_qubits, vec![q0.clone()]);
        assert_eq!(record.discarded_qubits, vec![q0]);
    }
}
