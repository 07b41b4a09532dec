use glam::IVec2;

use super::{
    consts::MAX_MAP_FACES,
    schema::{Field, RecordSchema, Scalar},
    Lump,
};

const ST: &[&str] = &["s", "t"];

pub static FACE: RecordSchema = RecordSchema::new(
    "Face",
    &[
        Field::scalar("plane_num", Scalar::U16),
        Field::scalar("side", Scalar::I8),
        Field::scalar("on_node", Scalar::I8),
        Field::scalar("first_edge", Scalar::I32),
        Field::scalar("num_edges", Scalar::I16),
        Field::scalar("tex_info", Scalar::I16),
        Field::scalar("disp_info", Scalar::I16),
        Field::scalar("surface_fog_volume_id", Scalar::I16),
        Field::array("styles", Scalar::I8, 4),
        Field::scalar("light_ofs", Scalar::I32),
        Field::scalar("area", Scalar::F32),
        Field::group("lightmap_texture_mins_in_luxels", Scalar::I32, ST),
        Field::group("lightmap_texture_size_in_luxels", Scalar::I32, ST),
        Field::scalar("orig_face", Scalar::I32),
        Field::scalar("num_prims", Scalar::U16),
        Field::scalar("first_prim_id", Scalar::U16),
        Field::scalar("smoothing_groups", Scalar::U32),
    ],
);

///The face array is limited to 65536 (MAX_MAP_FACES) entries.
///
///The original face lump has the same structure as the face lump, but contains the array of faces before the BSP splitting
/// process is done. These faces are therefore closer to the original brush faces present in the precompile map.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPFace {
    /// the plane number
    pub plane_num: u16,
    /// faces opposite to the node's plane direction
    pub side: i8,
    /// 1 of on node, 0 if in leaf
    pub on_node: i8,
    /// Firstedge is an index into the Surfedge array; this and the following numedges entries in the surfedge array define the edges of the face.
    ///
    /// The vertices which make up the face are thus referenced in clockwise order; when looking towards the face,
    /// each edge is traced in a clockwise direction.
    pub first_edge: i32,
    /// number of surfedges
    pub num_edges: i16,
    pub tex_info: i16,
    /// Index into the Dispinfo array if the face is a displacement surface; otherwise, it is -1.
    pub disp_info: i16,
    pub surface_fog_volume_id: i16,
    /// switchable lighting info
    pub styles: [i8; 4],
    /// offset into lightmap lump
    pub light_ofs: i32,
    /// face area in units^2
    pub area: f32,
    pub lightmap_texture_mins_in_luxels: IVec2,
    pub lightmap_texture_size_in_luxels: IVec2,
    ///OrigFace is the index of the original face which was split to produce this face.
    pub orig_face: i32,
    pub num_prims: u16,
    pub first_prim_id: u16,
    /// lightmap smoothing group
    pub smoothing_groups: u32,
}

impl BSPFace {
    pub fn is_displacement(&self) -> bool {
        let disp_info = self.disp_info;
        disp_info != -1
    }

    /// Window of this face's surfedges, as indices into the surfedge lump.
    pub fn surfedges(&self) -> std::ops::Range<isize> {
        let first = self.first_edge as isize;
        let count = self.num_edges.max(0) as isize;
        first..first + count
    }
}

impl Lump for BSPFace {
    fn max() -> usize {
        MAX_MAP_FACES
    }
    fn lump_name() -> &'static str {
        "FACES"
    }
    fn schema() -> &'static RecordSchema {
        &FACE
    }
}
