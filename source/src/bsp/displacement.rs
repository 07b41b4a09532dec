use flagset::{flags, FlagSet};
use glam::Vec3;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::{
    consts::{Contents, MAX_DISP_CORNER_NEIGHBORS, MAX_MAP_DISPINFO, MAX_MAP_DISP_TRIS, MAX_MAP_DISP_VERTS},
    schema::{Field, RecordSchema, Scalar, XYZ},
    Lump,
};

pub static DISP_INFO: RecordSchema = RecordSchema::new(
    "DispInfo",
    &[
        Field::group("start_position", Scalar::F32, XYZ),
        Field::scalar("disp_vert_start", Scalar::I32),
        Field::scalar("disp_tri_start", Scalar::I32),
        Field::scalar("power", Scalar::I32),
        Field::scalar("min_tess", Scalar::I32),
        Field::scalar("smoothing_angle", Scalar::F32),
        Field::scalar("contents", Scalar::I32),
        Field::scalar("map_face", Scalar::U16),
        Field::scalar("padding", Scalar::U16),
        Field::scalar("lightmap_alpha_start", Scalar::I32),
        Field::scalar("lightmap_sample_position_start", Scalar::I32),
        Field::array("edge_neighbours", Scalar::U8, 48),
        Field::array("corner_neighbours", Scalar::U8, 40),
        Field::array("allowed_verts", Scalar::U32, 10),
    ],
);

pub static DISP_VERT: RecordSchema = RecordSchema::new(
    "DispVert",
    &[
        Field::group("vec", Scalar::F32, XYZ),
        Field::scalar("dist", Scalar::F32),
        Field::scalar("alpha", Scalar::F32),
    ],
);

pub static DISP_TRI: RecordSchema =
    RecordSchema::new("DispTri", &[Field::scalar("tags", Scalar::U16)]);

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPDispInfo {
    pub start_position: Vec3,      // start position used for orientation
    pub disp_vert_start: i32,      // Index into LUMP_DISP_VERTS.
    pub disp_tri_start: i32,       // Index into LUMP_DISP_TRIS.
    pub power: u32,                // power - indicates size of surface (2^power 1)
    pub min_tess: i32,             // minimum tesselation allowed
    pub smoothing_angle: f32,      // lighting smoothing angle
    pub contents: i32,             // surface contents
    pub map_face: u16,             // Which map face this displacement comes from.
    pub padding: u16,
    pub lightmap_alpha_start: i32, // Index into ddisplightmapalpha.
    pub lightmap_sample_position_start: i32, // Index into LUMP_DISP_LIGHTMAP_SAMPLE_POSITIONS.
    pub edge_neighbours: [CDispNeighbour; 4], // Indexed by NeighbourEdge.
    pub corner_neighbours: [CDispCornerNeighbours; 4], // Indexed by Corner.
    pub allowed_verts: [u32; 10],  // active verticies
}

impl BSPDispInfo {
    /// Grid points along one side, `2^power + 1`.
    pub fn side(&self) -> usize {
        (1 << self.power) + 1
    }

    pub fn contents(&self) -> FlagSet<Contents> {
        FlagSet::new_truncated(self.contents)
    }

    pub fn edge_neighbour(&self, edge: NeighbourEdge) -> CDispNeighbour {
        self.edge_neighbours[edge as usize]
    }

    pub fn corner_neighbour(&self, corner: Corner) -> CDispCornerNeighbours {
        self.corner_neighbours[corner as usize]
    }
}

impl Lump for BSPDispInfo {
    fn max() -> usize {
        MAX_MAP_DISPINFO
    }
    fn lump_name() -> &'static str {
        "DISPLACEMENT_INFO"
    }
    fn schema() -> &'static RecordSchema {
        &DISP_INFO
    }
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPDispVert {
    pub vec: Vec3,  // Vec3 field defining displacement volume.
    pub dist: f32,  // Displacement distances.
    pub alpha: f32, // "per vertex" alpha values.
}

impl BSPDispVert {
    pub fn offset(&self) -> Vec3 {
        let vec = self.vec;
        vec * self.dist
    }
}

impl Lump for BSPDispVert {
    fn max() -> usize {
        MAX_MAP_DISP_VERTS
    }
    fn lump_name() -> &'static str {
        "DISPLACEMENT_VERTICES"
    }
    fn schema() -> &'static RecordSchema {
        &DISP_VERT
    }
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPDispTri {
    pub tags: u16, // Displacement triangle tags.
}

flags! {
    pub enum DispTri: u16 {
        TagSurface 		= 0x1,
        TagWalkable 	= 0x2,
        TagBuildable 	= 0x4,
        FlagSurfprop1 	= 0x8,
        FlagSurfprop2	= 0x10,
    }
}

impl BSPDispTri {
    pub fn tags(&self) -> FlagSet<DispTri> {
        FlagSet::new_truncated(self.tags)
    }
}

impl Lump for BSPDispTri {
    fn max() -> usize {
        MAX_MAP_DISP_TRIS * MAX_MAP_DISPINFO
    }
    fn lump_name() -> &'static str {
        "DISPLACEMENT_TRIANGLES"
    }
    fn schema() -> &'static RecordSchema {
        &DISP_TRI
    }
}

// Corner indices. Used to index CornerNeighbours.
#[derive(Copy, Clone, Debug)]
pub enum Corner {
    LowerLeft = 0,
    UpperLeft = 1,
    UpperRight = 2,
    LowerRight = 3,
}

// These edge indices must match the edge indices of the CCoreDispSurface.
#[derive(Copy, Clone, Debug)]
pub enum NeighbourEdge {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

// These define relative orientations of displacement neighbors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum NeighbourOrientation {
    OrientationCcw0 = 0,
    OrientationCcw90 = 1,
    OrientationCcw180 = 2,
    OrientationCcw270 = 3,
}

// These denote where one dispinfo fits on another.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum NeighbourSpan {
    CornerToCorner = 0,
    CornerToMidpoint = 1,
    MidpointToCorner = 2,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CDispNeighbour {
    // Note: if there is a neighbour that fills the whole side (CORNER_TO_CORNER),
    //       then it will always be in sub_neighbours[0]
    pub sub_neighbours: [CDispSubNeighbour; 2],
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CDispSubNeighbour {
    pub i_neighbour: u16, // This indexes into ddispinfos, 0xFFFF if there is no neighbour here.
    pub neighbour_orientation: u8, // (CCW) rotation of the neighbour wrt this displacement.
    pub span: u8,          // Where the neighbour fits onto this side of our displacement.
    pub neighbour_span: u8, // Where we fit onto our neighbour.
    pub padding: u8,
}

impl CDispSubNeighbour {
    pub fn neighbour(&self) -> Option<usize> {
        match { self.i_neighbour } {
            0xFFFF => None,
            i => Some(i as usize),
        }
    }

    pub fn orientation(&self) -> Option<NeighbourOrientation> {
        NeighbourOrientation::from_u8(self.neighbour_orientation)
    }

    pub fn span(&self) -> Option<NeighbourSpan> {
        NeighbourSpan::from_u8(self.span)
    }

    pub fn neighbour_span(&self) -> Option<NeighbourSpan> {
        NeighbourSpan::from_u8(self.neighbour_span)
    }
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CDispCornerNeighbours {
    pub neighbours: [u16; MAX_DISP_CORNER_NEIGHBORS], // indices of neighbours.
    pub n_neighbours: u8,
    pub padding: u8,
}

impl CDispCornerNeighbours {
    pub fn neighbours(&self) -> Vec<usize> {
        let neighbours = self.neighbours;
        let count = (self.n_neighbours as usize).min(MAX_DISP_CORNER_NEIGHBORS);
        neighbours[..count].iter().map(|&i| i as usize).collect()
    }
}
