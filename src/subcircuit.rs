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

//! [`Subcircuit`]: a connected, convex vertex set described by the edges
//! crossing its boundary, and the greedy finder that grows such sets.

use std::collections::{HashMap, HashSet};

use crate::dag::{Dag, EdgeId, VertexId};
use crate::error::CircuitError;

/// A connected, convex subset of a DAG's vertices, described by the
/// linear wires crossing into and out of it.
///
/// `in_edges[i]` is the linear edge feeding wire `i` into the subcircuit;
/// `out_edges[i]` is every edge (the wire's own linear continuation, plus
/// any `Boolean` taps reading a value produced on that wire) leaving the
/// subcircuit along wire `i`. Both are ordered consistently, so a
/// replacement circuit built to match wire `i` -> wire `i` can be spliced
/// in by [`crate::rewrite::substitute_subcircuit`].
#[derive(Debug, Clone)]
pub struct Subcircuit {
    pub verts: Vec<VertexId>,
    pub in_edges: Vec<EdgeId>,
    pub out_edges: Vec<Vec<EdgeId>>,
}

/// Computes the boundary of an arbitrary vertex set: does not itself
/// check connectivity or convexity (see [`is_convex`]).
pub fn boundary_of(dag: &Dag, verts: &[VertexId]) -> Result<Subcircuit, CircuitError> {
    let vset: HashSet<VertexId> = verts.iter().copied().collect();

    let mut entries: Vec<EdgeId> = Vec::new();
    for v in verts {
        let n = dag.port_count(*v)?;
        for port in 0..n {
            if let Some(e) = dag.in_edge(*v, port)? {
                let ty = dag.edge_type(e)?;
                let src = dag.source(e)?;
                if ty.is_linear() && !vset.contains(&src) {
                    entries.push(e);
                }
            }
        }
    }
    entries.sort();

    // Trace each entry's wire forward through the subcircuit to find its
    // exit edge and every (vertex, port) position it visits, so taps
    // branching off that wire inside the subcircuit can be attributed.
    let mut out_edges: Vec<Vec<EdgeId>> = Vec::with_capacity(entries.len());
    for &entry in &entries {
        let mut position = (dag.target(entry)?, dag.target_port(entry)?);
        let mut visited = vec![position];
        let exit_edge = loop {
            let (vertex, port) = position;
            let linear_out = dag
                .out_edges(vertex, port)?
                .iter()
                .copied()
                .find(|e| dag.edge_type(*e).map(|t| t.is_linear()).unwrap_or(false))
                .ok_or(CircuitError::CircuitInvalidity {
                    msg: "subcircuit wire does not exit cleanly".into(),
                })?;
            let next_vertex = dag.target(linear_out)?;
            if vset.contains(&next_vertex) {
                position = (next_vertex, dag.target_port(linear_out)?);
                visited.push(position);
            } else {
                break linear_out;
            }
        };
        let mut wire_out = vec![exit_edge];
        for (vertex, port) in &visited {
            for e in dag.out_edges(*vertex, *port)? {
                if *e == exit_edge {
                    continue;
                }
                let ty = dag.edge_type(*e)?;
                let t = dag.target(*e)?;
                if !ty.is_linear() && !vset.contains(&t) {
                    wire_out.push(*e);
                }
            }
        }
        out_edges.push(wire_out);
    }

    Ok(Subcircuit {
        verts: verts.to_vec(),
        in_edges: entries,
        out_edges,
    })
}

/// True iff `verts` is weakly connected as an undirected graph.
pub fn is_connected(dag: &Dag, verts: &[VertexId]) -> bool {
    if verts.is_empty() {
        return true;
    }
    let vset: HashSet<VertexId> = verts.iter().copied().collect();
    let mut seen: HashSet<VertexId> = HashSet::new();
    let mut stack = vec![verts[0]];
    seen.insert(verts[0]);
    while let Some(v) = stack.pop() {
        let neighbors = dag
            .predecessors(v)
            .unwrap_or_default()
            .into_iter()
            .chain(dag.successors(v).unwrap_or_default());
        for n in neighbors {
            if vset.contains(&n) && seen.insert(n) {
                stack.push(n);
            }
        }
    }
    seen.len() == vset.len()
}

/// True iff no vertex outside `verts` lies on a directed path between two
/// vertices of `verts` (so pulling `verts` out as a unit never requires
/// reordering it relative to anything left behind).
pub fn is_convex(dag: &Dag, verts: &[VertexId]) -> bool {
    let vset: HashSet<VertexId> = verts.iter().copied().collect();
    // A vertex set is convex iff, starting a forward search from any
    // member restricted to *outside* vertices, we never reach another
    // member. Equivalently: no outside vertex is both reachable from some
    // member and can reach another member.
    for &start in verts {
        let mut seen: HashSet<VertexId> = HashSet::new();
        let mut stack: Vec<VertexId> = dag.successors(start).unwrap_or_default();
        while let Some(v) = stack.pop() {
            if vset.contains(&v) {
                continue; // re-entering the set is fine, don't expand past it
            }
            if !seen.insert(v) {
                continue;
            }
            for s in dag.successors(v).unwrap_or_default() {
                if vset.contains(&s) {
                    return false; // escaped the set through an outsider, came back
                }
                stack.push(s);
            }
        }
    }
    true
}

/// Greedily merges singleton candidate vertices into maximal connected,
/// convex subcircuits: repeatedly tries to grow each subcircuit by one
/// adjacent candidate vertex, until a fixed point where no merge keeps
/// the result connected and convex.
pub fn find_subcircuits(
    dag: &Dag,
    candidates: impl IntoIterator<Item = VertexId>,
) -> Vec<Vec<VertexId>> {
    let mut groups: Vec<Vec<VertexId>> = candidates.into_iter().map(|v| vec![v]).collect();
    let candidate_set: HashSet<VertexId> = groups.iter().flatten().copied().collect();

    loop {
        let mut merged_any = false;
        'outer: for i in 0..groups.len() {
            if groups[i].is_empty() {
                continue;
            }
            let neighbors: HashSet<VertexId> = groups[i]
                .iter()
                .flat_map(|v| {
                    dag.predecessors(*v)
                        .unwrap_or_default()
                        .into_iter()
                        .chain(dag.successors(*v).unwrap_or_default())
                })
                .filter(|v| candidate_set.contains(v) && !groups[i].contains(v))
                .collect();
            for j in 0..groups.len() {
                if i == j || groups[j].is_empty() {
                    continue;
                }
                if groups[j].iter().any(|v| neighbors.contains(v)) {
                    let mut union: Vec<VertexId> = groups[i].clone();
                    union.extend(groups[j].iter().copied());
                    if is_connected(dag, &union) && is_convex(dag, &union) {
                        groups[i] = union;
                        groups[j] = Vec::new();
                        merged_any = true;
                        continue 'outer;
                    }
                }
            }
        }
        groups.retain(|g| !g.is_empty());
        if !merged_any {
            break;
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;
    use crate::op::PortType;
    use crate::ops::{BasicOp, Clifford};
    use std::rc::Rc;

    #[test]
    fn single_qubit_run_is_connected_and_convex() {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = crate::unit::UnitId::qubit(0);
        let (input, output) = boundary.insert_unit(&mut dag, q0).unwrap();
        for e in dag.out_edges(input, 0).unwrap().to_vec() {
            dag.remove_edge(e).unwrap();
        }
        let x = dag.add_vertex(Rc::new(BasicOp::Clifford(Clifford::PauliX)));
        let h = dag.add_vertex(Rc::new(BasicOp::Clifford(Clifford::Hadamard)));
        dag.add_edge(input, 0, x, 0, PortType::Quantum).unwrap();
        dag.add_edge(x, 0, h, 0, PortType::Quantum).unwrap();
        dag.add_edge(h, 0, output, 0, PortType::Quantum).unwrap();

        let verts = vec![x, h];
        assert!(is_connected(&dag, &verts));
        assert!(is_convex(&dag, &verts));
        let sub = boundary_of(&dag, &verts).unwrap();
        assert_eq!(sub.in_edges.len(), 1);
        assert_eq!(sub.out_edges.len(), 1);
    }

    #[test]
    fn finder_merges_adjacent_single_qubit_gates() {
        let mut dag = Dag::new();
        let mut boundary = Boundary::new();
        let q0 = crate::unit::UnitId::qubit(0);
        let (input, output) = boundary.insert_unit(&mut dag, q0).unwrap();
        for e in dag.out_edges(input, 0).unwrap().to_vec() {
            dag.remove_edge(e).unwrap();
        }
        let x = dag.add_vertex(Rc::new(BasicOp::Clifford(Clifford::PauliX)));
        let h = dag.add_vertex(Rc::new(BasicOp::Clifford(Clifford::Hadamard)));
        dag.add_edge(input, 0, x, 0, PortType::Quantum).unwrap();
        dag.add_edge(x, 0, h, 0, PortType::Quantum).unwrap();
        dag.add_edge(h, 0, output, 0, PortType::Quantum).unwrap();

        let groups = find_subcircuits(&dag, vec![x, h]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
