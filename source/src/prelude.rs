pub use crate::bsp::{
    branch::{Branch, BranchRegistry},
    displacement::{BSPDispInfo, BSPDispVert},
    edges::{BSPEdge, BSPSurfEdge},
    entities::EntityPartition,
    face::BSPFace,
    gamelump::{GameLumps, StaticProps},
    lump::{LumpView, RawLump, RecordLump, TypedLump},
    model::BSPModel,
    plane::BSPPlane,
    schema::{Record, Value},
    slice::LumpRange,
    textures::{BSPTexData, BSPTexDataStringTable, BSPTexInfo},
    BspFile, Lump,
};
pub use crate::config::OpenOptions;
pub use crate::error::{BspError, GeometryError, Result};
pub use crate::meshes::displacement_triangles;
pub use common::vertex::FaceVertex;
