pub mod flatten;
pub mod strip;

pub use flatten::{MeshFlattener, MeshParams};
pub use strip::{ring_template, FlatMesh};
