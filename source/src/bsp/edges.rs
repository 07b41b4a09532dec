use super::{
    consts::{MAX_MAP_EDGES, MAX_MAP_SURFEDGES},
    schema::{Field, RecordSchema, Scalar},
    Lump,
};
use crate::error::{BspError, Result};

pub static EDGE: RecordSchema = RecordSchema::new("Edge", &[Field::array("vertex", Scalar::U16, 2)]);
pub static SURFEDGE: RecordSchema =
    RecordSchema::new("SurfEdge", &[Field::scalar("edge", Scalar::I32)]);

///Edge
///
///Each edge is simply a pair of vertex indices (which index into the vertex lump array). The edge is defined as the
/// straight line between the two vertices. Usually, the edge array is referenced through the Surfedge array.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPEdge {
    pub v0: u16, // vertex indices
    pub v1: u16,
}

impl Lump for BSPEdge {
    fn max() -> usize {
        MAX_MAP_EDGES
    }
    fn lump_name() -> &'static str {
        "EDGES"
    }
    fn schema() -> &'static RecordSchema {
        &EDGE
    }
}

///Surfedge
///
///The absolute value of a surfedge is an index into the edge array:
/// if positive, it means the edge is defined from the first to the second vertex; if negative, from the second to the first vertex.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPSurfEdge {
    pub index: i32,
}

impl BSPSurfEdge {
    pub fn edge_index(&self) -> usize {
        self.index.unsigned_abs() as usize
    }

    pub fn is_reversed(&self) -> bool {
        let index = self.index;
        index < 0
    }

    /// Orient an edge the way this surfedge walks it.
    pub fn orient(&self, edge: BSPEdge) -> (u16, u16) {
        if self.is_reversed() {
            (edge.v1, edge.v0)
        } else {
            (edge.v0, edge.v1)
        }
    }

    pub fn get_edge(&self, edges: &[BSPEdge]) -> Result<(u16, u16)> {
        let index = self.edge_index();
        edges
            .get(index)
            .map(|&edge| self.orient(edge))
            .ok_or(BspError::IndexOutOfRange {
                index: index as isize,
                len: edges.len(),
            })
    }
}

impl Lump for BSPSurfEdge {
    fn max() -> usize {
        MAX_MAP_SURFEDGES
    }
    fn lump_name() -> &'static str {
        "SURFEDGES"
    }
    fn schema() -> &'static RecordSchema {
        &SURFEDGE
    }
}
