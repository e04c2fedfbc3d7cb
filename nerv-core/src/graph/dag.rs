use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::NervError;

/// Position of a vertex in the graph, derived from its adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// No parents.
    Source,
    /// Has parents but no children.
    Sink,
    /// Has both parents and children.
    Internal,
}

/// Visit state used by the depth-first search.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open,
    Done,
}

/// A directed multigraph with insertion-ordered adjacency and a cached
/// topological order.
///
/// Vertices are any cheap, hashable handle (the net uses arena indices).
/// Parent and child lists keep the order in which edges were added, which is
/// the order vertices concatenate their parents' activations in.
#[derive(Debug, Clone)]
pub struct Dag<V> {
    vertices: Vec<V>,
    known: HashSet<V>,
    parents: HashMap<V, Vec<V>>,
    children: HashMap<V, Vec<V>>,
    edges: HashSet<(V, V)>,
    topo_cache: OnceCell<Vec<V>>,
}

impl<V: Copy + Eq + Hash> Default for Dag<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + Eq + Hash> Dag<V> {
    pub fn new() -> Self {
        Dag {
            vertices: Vec::new(),
            known: HashSet::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            edges: HashSet::new(),
            topo_cache: OnceCell::new(),
        }
    }

    /// Adds the edge `parent -> child`, registering both endpoints.
    ///
    /// Returns `false` if the edge already existed, in which case the graph is
    /// left untouched. Any successful insertion drops the cached order.
    pub fn add_edge(&mut self, parent: V, child: V) -> bool {
        self.register(parent);
        self.register(child);
        if !self.edges.insert((parent, child)) {
            return false;
        }
        self.parents.entry(child).or_default().push(parent);
        self.children.entry(parent).or_default().push(child);

        // Invalidate the cached order.
        self.topo_cache.take();
        true
    }

    /// Registers `vertex` without any edge. Returns `false` if it was known.
    pub fn add_vertex(&mut self, vertex: V) -> bool {
        let added = self.register(vertex);
        if added {
            self.topo_cache.take();
        }
        added
    }

    fn register(&mut self, vertex: V) -> bool {
        let added = self.known.insert(vertex);
        if added {
            self.vertices.push(vertex);
        }
        added
    }

    /// Vertices in the order they were first seen.
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, vertex: V) -> bool {
        self.known.contains(&vertex)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Parents of `vertex` in edge-insertion order.
    pub fn parents(&self, vertex: V) -> &[V] {
        self.parents.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Children of `vertex` in edge-insertion order.
    pub fn children(&self, vertex: V) -> &[V] {
        self.children.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn kind(&self, vertex: V) -> VertexKind {
        if self.parents(vertex).is_empty() {
            VertexKind::Source
        } else if self.children(vertex).is_empty() {
            VertexKind::Sink
        } else {
            VertexKind::Internal
        }
    }

    /// Classifies every vertex from the current adjacency. Not cached.
    pub fn classify(&self) -> impl Iterator<Item = (VertexKind, V)> + '_ {
        self.vertices.iter().map(move |&v| (self.kind(v), v))
    }

    pub fn sources(&self) -> impl Iterator<Item = V> + '_ {
        self.of_kind(VertexKind::Source)
    }

    pub fn sinks(&self) -> impl Iterator<Item = V> + '_ {
        self.of_kind(VertexKind::Sink)
    }

    pub fn internals(&self) -> impl Iterator<Item = V> + '_ {
        self.of_kind(VertexKind::Internal)
    }

    fn of_kind(&self, kind: VertexKind) -> impl Iterator<Item = V> + '_ {
        self.classify()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, v)| v)
    }

    /// Returns an order in which every parent precedes all of its children,
    /// or the reverse of it.
    ///
    /// Ties between independent vertices follow insertion order: the search
    /// starts from vertices in the order they were first seen and descends into
    /// children in edge order; the result is the reversed postorder, so of two
    /// unrelated sources the one seen first is emitted last.
    pub fn topological_sort(&self, reverse: bool) -> Result<Vec<V>, NervError> {
        let order = self.cached_order()?;
        Ok(if reverse {
            order.iter().rev().copied().collect()
        } else {
            order.to_vec()
        })
    }

    /// The cached order, computed on first use after a mutation.
    pub fn cached_order(&self) -> Result<&[V], NervError> {
        if let Some(order) = self.topo_cache.get() {
            return Ok(order);
        }
        let order = self.compute_topological_sort()?;
        Ok(self.topo_cache.get_or_init(|| order))
    }

    // Iterative so that deep trees do not exhaust the call stack.
    fn compute_topological_sort(&self) -> Result<Vec<V>, NervError> {
        let mut marks: HashMap<V, Mark> = HashMap::with_capacity(self.vertices.len());
        let mut postorder = Vec::with_capacity(self.vertices.len());
        // (vertex, index of the next child to visit)
        let mut stack: Vec<(V, usize)> = Vec::new();

        for &start in &self.vertices {
            if marks.contains_key(&start) {
                continue;
            }
            marks.insert(start, Mark::Open);
            stack.push((start, 0));

            while let Some(frame) = stack.last_mut() {
                let (current, next) = *frame;
                let children = self.children(current);
                if next < children.len() {
                    frame.1 += 1;
                    let child = children[next];
                    match marks.get(&child) {
                        None => {
                            marks.insert(child, Mark::Open);
                            stack.push((child, 0));
                        }
                        Some(Mark::Open) => return Err(NervError::CycleDetected),
                        Some(Mark::Done) => {}
                    }
                } else {
                    marks.insert(current, Mark::Done);
                    postorder.push(current);
                    stack.pop();
                }
            }
        }

        postorder.reverse();
        Ok(postorder)
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
