use std::sync::Arc;

use log::debug;

use crate::error::NervError;
use crate::graph::Dag;
use crate::maths::add_assign;
use crate::nn::losses::Loss;
use crate::nn::model::Model;
use crate::nn::parameter::Gradient;
use crate::nn::vertex::Vertex;

/// Handle of a vertex inside its net.
pub type VertexId = usize;

/// The computation graph of one example.
///
/// Vertices live in an arena owned by the net; the graph stores their ids.
/// A net is cheap to build and is meant to be thrown away after use, while
/// the model it runs against persists.
#[derive(Debug, Clone, Default)]
pub struct Net {
    graph: Dag<VertexId>,
    vertices: Vec<Vertex>,
}

impl Net {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `vertex` and registers it in the graph.
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = self.vertices.len();
        self.vertices.push(vertex);
        self.graph.add_vertex(id);
        id
    }

    /// Adds `parent -> child`. The order in which a child's edges are added
    /// is the order its parents are concatenated in.
    pub fn add_edge(&mut self, parent: VertexId, child: VertexId) -> Result<bool, NervError> {
        self.check(parent)?;
        self.check(child)?;
        Ok(self.graph.add_edge(parent, child))
    }

    /// Adds an edge from each of `parents`, in order, to `child`.
    pub fn connect(&mut self, parents: &[VertexId], child: VertexId) -> Result<(), NervError> {
        for &parent in parents {
            self.add_edge(parent, child)?;
        }
        Ok(())
    }

    fn check(&self, id: VertexId) -> Result<(), NervError> {
        if id < self.vertices.len() {
            Ok(())
        } else {
            Err(NervError::UnknownVertex(id))
        }
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, NervError> {
        self.vertices.get(id).ok_or(NervError::UnknownVertex(id))
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex, NervError> {
        self.vertices.get_mut(id).ok_or(NervError::UnknownVertex(id))
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn graph(&self) -> &Dag<VertexId> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Evaluates every vertex in topological order, adding classifier losses
    /// into `loss` under their variant name.
    pub fn forward(&mut self, model: &Model, mut loss: Option<&mut Loss>) -> Result<(), NervError> {
        let order = self.graph.topological_sort(false)?;
        debug!("Net: forward over {} vertices", order.len());
        for id in order {
            let evaluation = {
                let parents: Vec<&[f64]> = self
                    .graph
                    .parents(id)
                    .iter()
                    .map(|&p| self.vertices[p].activations())
                    .collect();
                self.vertices[id].evaluate(&parents, model)?
            };
            if let Some(evaluation) = evaluation {
                if let (Some(loss), Some(value)) = (loss.as_deref_mut(), evaluation.loss()) {
                    loss.add(self.vertices[id].name(), value);
                }
                self.vertices[id].apply(evaluation);
            }
        }
        Ok(())
    }

    /// Backpropagates into a fresh gradient.
    pub fn backward(&mut self, model: &Model) -> Result<Gradient, NervError> {
        let mut gradient = model.gradient();
        self.backward_into(model, &mut gradient)?;
        Ok(gradient)
    }

    /// Backpropagates in reverse topological order, adding into `gradient`.
    ///
    /// Expects a preceding [`Net::forward`] against the same model.
    pub fn backward_into(&mut self, model: &Model, gradient: &mut Gradient) -> Result<(), NervError> {
        let layout = gradient.shared_layout();
        if !Arc::ptr_eq(layout, model.shared_layout()) && **layout != **model.shared_layout() {
            return Err(NervError::LayoutMismatch);
        }
        let order = self.graph.topological_sort(true)?;
        debug!("Net: backward over {} vertices", order.len());
        for id in order {
            let incoming = self.incoming_message(id)?;
            self.vertices[id].backward(incoming.as_deref(), model, gradient)?;
        }
        Ok(())
    }

    /// Sum of what the children of `id` sent it, `None` without children.
    ///
    /// A child that concatenates its parents sends each of them the slice at
    /// that parent's position; an averaging child sends its whole message to
    /// every parent.
    fn incoming_message(&self, id: VertexId) -> Result<Option<Vec<f64>>, NervError> {
        let children = self.graph.children(id);
        if children.is_empty() {
            return Ok(None);
        }
        let fan_out = self.vertices[id].fan_out();
        let mut incoming = vec![0.0; fan_out];
        for &child in children {
            let child_vertex = &self.vertices[child];
            let offset: usize = if child_vertex.variant().concatenates_parents() {
                self.graph
                    .parents(child)
                    .iter()
                    .take_while(|&&p| p != id)
                    .map(|&p| self.vertices[p].fan_out())
                    .sum()
            } else {
                0
            };
            let message = child_vertex.message();
            let part = message.get(offset..offset + fan_out).ok_or_else(|| {
                NervError::MessageSizeMismatch {
                    variant: child_vertex.name().to_string(),
                    needed: offset + fan_out,
                    actual: message.len(),
                }
            })?;
            add_assign(&mut incoming, part);
        }
        Ok(Some(incoming))
    }
}

#[cfg(test)]
#[path = "net_test.rs"]
mod tests;
