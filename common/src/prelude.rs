pub use crate::vertex::{FaceVertex, Vertex};
