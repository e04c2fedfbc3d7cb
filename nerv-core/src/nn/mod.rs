// src/nn/mod.rs
// Vertex variants, the model holding their parameters and the nets built from them.

pub mod init;
pub mod layers;
pub mod losses;
pub mod model;
pub mod net;
pub mod parameter;
pub mod variant;
pub mod vertex;

// Re-export common items
pub use init::CompositionInit;
pub use losses::Loss;
pub use model::Model;
pub use net::{Net, VertexId};
pub use parameter::{Gradient, Layout, ParamStore, Region};
pub use variant::{SliceTable, Variant, VariantKind};
pub use vertex::Vertex;
