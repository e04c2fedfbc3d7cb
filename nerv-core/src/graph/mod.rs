//! Directed multigraph used to schedule the passes of a net.

pub mod dag;

pub use dag::{Dag, VertexKind};
