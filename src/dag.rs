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

//! A bespoke, arena-based multigraph: the DAG store underlying [`crate::circuit::Circuit`].
//!
//! This intentionally does not depend on a general-purpose graph library.
//! Vertices carry an opaque [`crate::op::Op`] and an ordered list of ports;
//! edges are typed and port-keyed so that a vertex's in/out edges can be
//! addressed by port index without a linear scan. Slots are reused via a
//! generation counter, so a stale [`VertexId`]/[`EdgeId`] from before a
//! `remove_*` call is detected rather than silently aliasing a new vertex.

use std::rc::Rc;

use crate::error::CircuitError;
use crate::op::{Op, PortType};

/// A generation-checked handle to a vertex in a [`Dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId {
    index: u32,
    generation: u32,
}

/// A generation-checked handle to an edge in a [`Dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

struct VertexData {
    op: Rc<dyn Op>,
    /// One entry per port; `None` until connected.
    in_edges: Vec<Option<EdgeId>>,
    /// One entry per port; linear ports carry at most one edge here, but
    /// classical output ports may additionally be tapped by any number of
    /// `Boolean`-typed condition edges, so this is a list.
    out_edges: Vec<Vec<EdgeId>>,
}

struct EdgeData {
    source: VertexId,
    source_port: usize,
    target: VertexId,
    target_port: usize,
    edge_type: PortType,
}

/// The DAG store: an arena of op-carrying vertices connected by typed,
/// port-keyed edges.
#[derive(Default)]
pub struct Dag {
    vertices: Vec<Slot<VertexData>>,
    edges: Vec<Slot<EdgeData>>,
    vertex_count: usize,
    edge_count: usize,
}

impl Dag {
    /// Creates an empty DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn vertex(&self, id: VertexId) -> Result<&VertexData, CircuitError> {
        self.vertices
            .get(id.index as usize)
            .and_then(|slot| {
                if slot.generation == id.generation {
                    slot.value.as_ref()
                } else {
                    None
                }
            })
            .ok_or(CircuitError::MissingVertex)
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, CircuitError> {
        self.vertices
            .get_mut(id.index as usize)
            .and_then(|slot| {
                if slot.generation == id.generation {
                    slot.value.as_mut()
                } else {
                    None
                }
            })
            .ok_or(CircuitError::MissingVertex)
    }

    fn edge(&self, id: EdgeId) -> Result<&EdgeData, CircuitError> {
        self.edges
            .get(id.index as usize)
            .and_then(|slot| {
                if slot.generation == id.generation {
                    slot.value.as_ref()
                } else {
                    None
                }
            })
            .ok_or(CircuitError::MissingEdge)
    }

    /// Adds a vertex carrying `op`, with one port per entry of
    /// `op.signature()`, all initially unconnected.
    pub fn add_vertex(&mut self, op: Rc<dyn Op>) -> VertexId {
        let n_ports = op.signature().len();
        let data = VertexData {
            op,
            in_edges: vec![None; n_ports],
            out_edges: vec![Vec::new(); n_ports],
        };
        self.vertex_count += 1;
        for (index, slot) in self.vertices.iter_mut().enumerate() {
            if slot.value.is_none() {
                slot.value = Some(data);
                return VertexId {
                    index: index as u32,
                    generation: slot.generation,
                };
            }
        }
        let index = self.vertices.len() as u32;
        self.vertices.push(Slot {
            generation: 0,
            value: Some(data),
        });
        VertexId { index, generation: 0 }
    }

    /// Removes a vertex. The caller must have already removed every edge
    /// touching it; violating this is a bug in this crate, not caller
    /// error, so it is checked with `debug_assert!`.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<(), CircuitError> {
        let data = self.vertex(id)?;
        debug_assert!(
            data.in_edges.iter().all(Option::is_none)
                && data.out_edges.iter().all(Vec::is_empty),
            "remove_vertex called on a vertex with live edges"
        );
        let slot = &mut self.vertices[id.index as usize];
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.vertex_count -= 1;
        Ok(())
    }

    /// Returns the op carried by a vertex.
    pub fn op(&self, id: VertexId) -> Result<&Rc<dyn Op>, CircuitError> {
        Ok(&self.vertex(id)?.op)
    }

    /// Replaces the op carried by a vertex. The new op must have the same
    /// signature as the old one; the core never changes a vertex's arity
    /// in place.
    pub fn set_op(&mut self, id: VertexId, op: Rc<dyn Op>) -> Result<(), CircuitError> {
        let old_sig = self.vertex(id)?.op.signature();
        if old_sig != op.signature() {
            return Err(CircuitError::IncorrectPredicate {
                msg: "set_op: signature mismatch".into(),
            });
        }
        self.vertex_mut(id)?.op = op;
        Ok(())
    }

    /// Number of ports on a vertex.
    pub fn port_count(&self, id: VertexId) -> Result<usize, CircuitError> {
        Ok(self.vertex(id)?.in_edges.len())
    }

    /// Adds an edge `source:source_port -> target:target_port` of type
    /// `edge_type`. Fails if either port is out of range, if the edge type
    /// does not match the vertex's declared signature at that port, or if
    /// a linear (`Quantum`/`Classical`) port already has an edge on the
    /// side being connected.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        source_port: usize,
        target: VertexId,
        target_port: usize,
        edge_type: PortType,
    ) -> Result<EdgeId, CircuitError> {
        {
            let src = self.vertex(source)?;
            let src_sig = src.op.signature();
            let src_ty = *src_sig
                .get(source_port)
                .ok_or(CircuitError::MissingVertex)?;
            if src_ty.is_linear() && !src.out_edges[source_port].is_empty() {
                return Err(CircuitError::CircuitInvalidity {
                    msg: format!("port {source_port} already has an outgoing linear edge"),
                });
            }
        }
        {
            let dst = self.vertex(target)?;
            let dst_sig = dst.op.signature();
            let dst_ty = *dst_sig
                .get(target_port)
                .ok_or(CircuitError::MissingVertex)?;
            if dst_ty.is_linear() && dst.in_edges[target_port].is_some() {
                return Err(CircuitError::CircuitInvalidity {
                    msg: format!("port {target_port} already has an incoming linear edge"),
                });
            }
        }
        let data = EdgeData {
            source,
            source_port,
            target,
            target_port,
            edge_type,
        };
        let id = {
            let mut found = None;
            for (index, slot) in self.edges.iter_mut().enumerate() {
                if slot.value.is_none() {
                    slot.value = Some(data);
                    found = Some(EdgeId {
                        index: index as u32,
                        generation: slot.generation,
                    });
                    break;
                }
            }
            match found {
                Some(id) => id,
                None => {
                    let index = self.edges.len() as u32;
                    self.edges.push(Slot {
                        generation: 0,
                        value: None,
                    });
                    let reuse = self.edges.last_mut().unwrap();
                    reuse.value = Some(EdgeData {
                        source,
                        source_port,
                        target,
                        target_port,
                        edge_type,
                    });
                    EdgeId { index, generation: 0 }
                }
            }
        };
        self.vertex_mut(source)?.out_edges[source_port].push(id);
        self.vertex_mut(target)?.in_edges[target_port] = Some(id);
        self.edge_count += 1;
        Ok(id)
    }

    /// Removes an edge, clearing it from both endpoints' port tables.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), CircuitError> {
        let (source, source_port, target, target_port) = {
            let e = self.edge(id)?;
            (e.source, e.source_port, e.target, e.target_port)
        };
        if let Ok(v) = self.vertex_mut(source) {
            v.out_edges[source_port].retain(|e| *e != id);
        }
        if let Ok(v) = self.vertex_mut(target) {
            if v.in_edges[target_port] == Some(id) {
                v.in_edges[target_port] = None;
            }
        }
        let slot = &mut self.edges[id.index as usize];
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.edge_count -= 1;
        Ok(())
    }

    /// The edge on `vertex`'s in-port `port`, if any.
    pub fn in_edge(&self, vertex: VertexId, port: usize) -> Result<Option<EdgeId>, CircuitError> {
        Ok(self
            .vertex(vertex)?
            .in_edges
            .get(port)
            .copied()
            .flatten())
    }

    /// All edges on `vertex`'s out-port `port`.
    pub fn out_edges(&self, vertex: VertexId, port: usize) -> Result<&[EdgeId], CircuitError> {
        Ok(self
            .vertex(vertex)?
            .out_edges
            .get(port)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// All in-edges of `vertex`, across every port, in port order.
    pub fn in_edges(&self, vertex: VertexId) -> Result<Vec<EdgeId>, CircuitError> {
        Ok(self.vertex(vertex)?.in_edges.iter().filter_map(|e| *e).collect())
    }

    /// All out-edges of `vertex`, across every port, in port order.
    pub fn all_out_edges(&self, vertex: VertexId) -> Result<Vec<EdgeId>, CircuitError> {
        Ok(self
            .vertex(vertex)?
            .out_edges
            .iter()
            .flat_map(|es| es.iter().copied())
            .collect())
    }

    /// In-edges of `vertex` whose type matches `ty`.
    pub fn in_edges_of_type(
        &self,
        vertex: VertexId,
        ty: PortType,
    ) -> Result<Vec<EdgeId>, CircuitError> {
        let all = self.in_edges(vertex)?;
        Ok(all
            .into_iter()
            .filter(|e| self.edge_type(*e).map(|t| t == ty).unwrap_or(false))
            .collect())
    }

    /// Out-edges of `vertex` whose type matches `ty`.
    pub fn out_edges_of_type(
        &self,
        vertex: VertexId,
        ty: PortType,
    ) -> Result<Vec<EdgeId>, CircuitError> {
        let all = self.all_out_edges(vertex)?;
        Ok(all
            .into_iter()
            .filter(|e| self.edge_type(*e).map(|t| t == ty).unwrap_or(false))
            .collect())
    }

    /// The `n`th in-edge of `vertex`, in port order.
    pub fn nth_in_edge(&self, vertex: VertexId, n: usize) -> Result<Option<EdgeId>, CircuitError> {
        self.in_edge(vertex, n)
    }

    /// The unique distinct predecessor vertices feeding `vertex`.
    pub fn predecessors(&self, vertex: VertexId) -> Result<Vec<VertexId>, CircuitError> {
        let mut out: Vec<VertexId> = self
            .in_edges(vertex)?
            .iter()
            .filter_map(|e| self.edge(*e).ok().map(|d| d.source))
            .collect();
        out.dedup_by_key(|v| (v.index, v.generation));
        Ok(out)
    }

    /// The unique distinct successor vertices fed by `vertex`.
    pub fn successors(&self, vertex: VertexId) -> Result<Vec<VertexId>, CircuitError> {
        let mut out: Vec<VertexId> = self
            .all_out_edges(vertex)?
            .iter()
            .filter_map(|e| self.edge(*e).ok().map(|d| d.target))
            .collect();
        out.dedup_by_key(|v| (v.index, v.generation));
        Ok(out)
    }

    pub fn source(&self, edge: EdgeId) -> Result<VertexId, CircuitError> {
        Ok(self.edge(edge)?.source)
    }

    pub fn target(&self, edge: EdgeId) -> Result<VertexId, CircuitError> {
        Ok(self.edge(edge)?.target)
    }

    pub fn source_port(&self, edge: EdgeId) -> Result<usize, CircuitError> {
        Ok(self.edge(edge)?.source_port)
    }

    pub fn target_port(&self, edge: EdgeId) -> Result<usize, CircuitError> {
        Ok(self.edge(edge)?.target_port)
    }

    pub fn edge_type(&self, edge: EdgeId) -> Result<PortType, CircuitError> {
        Ok(self.edge(edge)?.edge_type)
    }

    /// All live vertex ids, in arena order (not a topological order).
    pub fn vertices(&self) -> Vec<VertexId> {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.value.as_ref().map(|_| VertexId {
                    index: index as u32,
                    generation: slot.generation,
                })
            })
            .collect()
    }

    /// A topological order over the live vertices, computed on demand via
    /// Kahn's algorithm. The DAG invariant (no cycles) is assumed, not
    /// reverified here; a cycle would make this return fewer vertices than
    /// `vertex_count()`, which callers can treat as an internal-bug signal.
    pub fn topological_order(&self) -> Vec<VertexId> {
        let ids = self.vertices();
        let mut remaining_in: std::collections::HashMap<(u32, u32), usize> = ids
            .iter()
            .map(|v| ((v.index, v.generation), self.in_edges(*v).map(|e| e.len()).unwrap_or(0)))
            .collect();
        let mut ready: std::collections::VecDeque<VertexId> = ids
            .iter()
            .copied()
            .filter(|v| remaining_in[&(v.index, v.generation)] == 0)
            .collect();
        let mut order = Vec::with_capacity(ids.len());
        while let Some(v) = ready.pop_front() {
            order.push(v);
            if let Ok(succs) = self.successors(v) {
                for s in succs {
                    let key = (s.index, s.generation);
                    if let Some(count) = remaining_in.get_mut(&key) {
                        // Count distinct in-edges from v into s, not distinct
                        // predecessors, so multi-edges drain correctly.
                        let multiplicity = self
                            .in_edges(s)
                            .map(|es| {
                                es.iter()
                                    .filter(|e| self.source(**e).map(|sv| sv == v).unwrap_or(false))
                                    .count()
                            })
                            .unwrap_or(0);
                        *count = count.saturating_sub(multiplicity.max(1));
                        if *count == 0 {
                            ready.push_back(s);
                        }
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BasicOp;

    fn q_gate() -> Rc<dyn Op> {
        Rc::new(BasicOp::Clifford(crate::ops::Clifford::PauliX))
    }

    #[test]
    fn add_vertex_and_edge_roundtrip() {
        let mut dag = Dag::new();
        let a = dag.add_vertex(q_gate());
        let b = dag.add_vertex(q_gate());
        let e = dag
            .add_edge(a, 0, b, 0, PortType::Quantum)
            .expect("add_edge");
        assert_eq!(dag.source(e).unwrap(), a);
        assert_eq!(dag.target(e).unwrap(), b);
        assert_eq!(dag.successors(a).unwrap(), vec![b]);
        assert_eq!(dag.predecessors(b).unwrap(), vec![a]);
    }

    #[test]
    fn double_linear_in_edge_rejected() {
        let mut dag = Dag::new();
        let a = dag.add_vertex(q_gate());
        let b = dag.add_vertex(q_gate());
        let c = dag.add_vertex(q_gate());
        dag.add_edge(a, 0, c, 0, PortType::Quantum).unwrap();
        let err = dag.add_edge(b, 0, c, 0, PortType::Quantum);
        assert!(err.is_err());
    }

    #[test]
    fn remove_edge_frees_ports_for_reconnection() {
        let mut dag = Dag::new();
        let a = dag.add_vertex(q_gate());
        let b = dag.add_vertex(q_gate());
        let c = dag.add_vertex(q_gate());
        let e = dag.add_edge(a, 0, b, 0, PortType::Quantum).unwrap();
        dag.remove_edge(e).unwrap();
        assert!(dag.add_edge(c, 0, b, 0, PortType::Quantum).is_ok());
    }

    #[test]
    fn topological_order_respects_edges() {
        let mut dag = Dag::new();
        let a = dag.add_vertex(q_gate());
        let b = dag.add_vertex(q_gate());
        let c = dag.add_vertex(q_gate());
        dag.add_edge(a, 0, b, 0, PortType::Quantum).unwrap();
        dag.add_edge(b, 0, c, 0, PortType::Quantum).unwrap();
        let order = dag.topological_order();
        let pos = |v: VertexId| order.iter().position(|x| *x == v).unwrap();
        assert!(pos(a) < pos(b));
        assert!(pos(b) < pos(c));
    }

    #[test]
    fn stale_handle_after_removal_is_missing_vertex() {
        let mut dag = Dag::new();
        let a = dag.add_vertex(q_gate());
        dag.remove_vertex(a).unwrap();
        assert!(dag.op(a).is_err());
    }
}
