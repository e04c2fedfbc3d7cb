//! Automatic differentiation for structurally variable networks.
//!
//! Every example gets its own [`Net`], a small DAG of vertices, while the
//! parameters of each vertex variant live once in a shared [`Model`].

pub mod autograd;
pub mod error;
pub mod graph;
pub mod maths;
pub mod nn;
pub mod optim;
pub mod utils;

pub use autograd::{check_gradients, GradCheckConfig, GradCheckReport};
pub use error::NervError;
pub use graph::Dag;
pub use nn::{
    CompositionInit, Gradient, Layout, Loss, Model, Net, ParamStore, Variant, VariantKind, Vertex,
    VertexId,
};
pub use optim::{Minimizer, Optimizer};
