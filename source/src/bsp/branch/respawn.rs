//! Respawn Entertainment's fork of Source, used by Titanfall and Titanfall 2.
//!
//! `rBSP` files keep the version at offset 4, the map revision at 8 and a lump count at 12,
//! followed by 128 lump headers. Most lumps can be overridden by a `<map>.bsp.<id>.bsp_lump`
//! file next to the map, and entities live in `<map>_<partition>.ent` files.

use super::{valve::INDEX_U16, Branch, LumpDef, StaticPropDef};
use crate::bsp::{
    consts::RESPAWN_HEADER_LUMPS,
    schema::{Field, RecordSchema, Scalar, MIN_MAX, RGBA, XYZ},
    textures::TEXDATA_STRING_TABLE,
    vert::VECTOR3,
};

const UV: &[&str] = &["u", "v"];

pub static PLANE: RecordSchema = RecordSchema::new(
    "RespawnPlane",
    &[
        Field::group("normal", Scalar::F32, XYZ),
        Field::scalar("dist", Scalar::F32),
    ],
);

pub static MODEL: RecordSchema = RecordSchema::new(
    "RespawnModel",
    &[
        Field::group("mins", Scalar::F32, XYZ),
        Field::group("maxs", Scalar::F32, XYZ),
        Field::scalar("first_mesh", Scalar::I32),
        Field::scalar("num_meshes", Scalar::I32),
    ],
);

pub static VERTEX_UNLIT: RecordSchema = RecordSchema::new(
    "VertexUnlit",
    &[
        Field::scalar("position_index", Scalar::U32),
        Field::scalar("normal_index", Scalar::U32),
        Field::group("uv", Scalar::F32, UV),
        Field::scalar("unknown", Scalar::I32),
    ],
);

pub static VERTEX_BLINN_PHONG: RecordSchema = RecordSchema::new(
    "VertexBlinnPhong",
    &[
        Field::scalar("position_index", Scalar::U32),
        Field::scalar("normal_index", Scalar::U32),
        Field::group("unknown", Scalar::U32, &["a", "b"]),
    ],
);

pub static STATIC_PROP_V13: RecordSchema = RecordSchema::new(
    "StaticPropV13",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("angles", Scalar::F32, &["y", "z", "x"]),
        Field::array("unknown_1", Scalar::I8, 4),
        Field::scalar("model_index", Scalar::U16),
        Field::scalar("solid", Scalar::U8),
        Field::scalar("flags", Scalar::U8),
        Field::array("unknown_2", Scalar::I8, 4),
        Field::scalar("forced_fade_scale", Scalar::F32),
        Field::group("lighting_origin", Scalar::F32, XYZ),
        Field::group("cpu_level", Scalar::I8, MIN_MAX),
        Field::group("gpu_level", Scalar::I8, MIN_MAX),
        Field::group("diffuse_modulation", Scalar::U8, RGBA),
        Field::group("collision_flags", Scalar::U16, &["add", "remove"]),
    ],
);

static STATIC_PROPS: StaticPropDef = StaticPropDef {
    leaves: false,
    preamble_ints: 3,
    schemas: &[(13, &STATIC_PROP_V13)],
};

const ENTITY_PARTITIONS: &[&str] = &["env", "fx", "script", "snd", "spawn"];

/// Every lump both games agree on, plus whatever each adds.
macro_rules! respawn_lumps {
    ($($extra:expr),* $(,)?) => {
        &[
            lump!(0x00, "ENTITIES"),
            lump!(0x01, "PLANES", 1 => PLANE),
            lump!(0x02, "TEXDATA"),
            lump!(0x03, "VERTICES", 0 => VECTOR3),
            lump!(0x0E, "MODELS", 0 => MODEL),
            lump!(0x18, "ENTITY_PARTITIONS"),
            lump!(0x1D, "PHYSICS_COLLIDE"),
            lump!(0x1E, "VERTEX_NORMALS", 0 => VECTOR3),
            lump!(0x23, "GAME_LUMP"),
            lump!(0x24, "LEAF_WATER_DATA"),
            lump!(0x28, "PAKFILE"),
            lump!(0x2A, "CUBEMAPS"),
            lump!(0x2B, "TEXDATA_STRING_DATA"),
            lump!(0x2C, "TEXDATA_STRING_TABLE", 0 => TEXDATA_STRING_TABLE),
            lump!(0x36, "WORLD_LIGHTS"),
            lump!(0x3E, "PHYSICS_LEVEL"),
            lump!(0x42, "TRICOLL_TRIS"),
            lump!(0x44, "TRICOLL_NODES"),
            lump!(0x45, "TRICOLL_HEADERS"),
            lump!(0x46, "PHYSICS_TRIS"),
            lump!(0x47, "VERTS_UNLIT", 0 => VERTEX_UNLIT),
            lump!(0x48, "VERTS_LIT_FLAT"),
            lump!(0x49, "VERTS_LIT_BUMP"),
            lump!(0x4A, "VERTS_UNLIT_TS"),
            lump!(0x4C, "VERTS_RESERVED_5"),
            lump!(0x4D, "VERTS_RESERVED_6"),
            lump!(0x4E, "VERTS_RESERVED_7"),
            lump!(0x4F, "MESH_INDICES", 0 => INDEX_U16),
            lump!(0x50, "MESHES"),
            lump!(0x51, "MESH_BOUNDS"),
            lump!(0x52, "MATERIAL_SORT"),
            lump!(0x53, "LIGHTMAP_HEADERS"),
            lump!(0x54, "LIGHTMAP_DATA_DXT5"),
            lump!(0x55, "CM_GRID"),
            lump!(0x56, "CM_GRID_CELLS"),
            lump!(0x57, "CM_GEO_SETS"),
            lump!(0x58, "CM_GEO_SET_BOUNDS"),
            lump!(0x59, "CM_PRIMS"),
            lump!(0x5A, "CM_PRIM_BOUNDS"),
            lump!(0x5B, "CM_UNIQUE_CONTENTS"),
            lump!(0x5C, "CM_BRUSHES"),
            lump!(0x5D, "CM_BRUSH_SIDE_PLANE_OFFSETS"),
            lump!(0x5E, "CM_BRUSH_SIDE_PROPS"),
            lump!(0x5F, "CM_BRUSH_TEX_VECS"),
            lump!(0x60, "TRICOLL_BEVEL_STARTS"),
            lump!(0x61, "TRICOLL_BEVEL_INDICES"),
            lump!(0x62, "LIGHTMAP_DATA_SKY"),
            lump!(0x63, "CSM_AABB_NODES"),
            lump!(0x64, "CSM_OBJ_REFS"),
            lump!(0x65, "LIGHTPROBES"),
            lump!(0x66, "STATIC_PROP_LIGHTPROBE_INDEX"),
            lump!(0x67, "LIGHTPROBE_TREE"),
            lump!(0x68, "LIGHTPROBE_REFS"),
            lump!(0x69, "LIGHTMAP_DATA_REAL_TIME_LIGHTS"),
            lump!(0x6A, "CELL_BSP_NODES"),
            lump!(0x6B, "CELLS"),
            lump!(0x6C, "PORTALS"),
            lump!(0x6D, "PORTAL_VERTS"),
            lump!(0x6E, "PORTAL_EDGES"),
            lump!(0x6F, "PORTAL_VERT_EDGES"),
            lump!(0x70, "PORTAL_VERT_REFS"),
            lump!(0x71, "PORTAL_EDGE_REFS"),
            lump!(0x72, "PORTAL_EDGE_ISECT_EDGE"),
            lump!(0x73, "PORTAL_EDGE_ISECT_AT_VERT"),
            lump!(0x74, "PORTAL_EDGE_ISECT_HEADER"),
            lump!(0x75, "OCCLUSION_MESH_VERTS"),
            lump!(0x76, "OCCLUSION_MESH_INDICES"),
            lump!(0x77, "CELL_AABB_NODES"),
            lump!(0x78, "OBJ_REFS"),
            lump!(0x79, "OBJ_REF_BOUNDS"),
            lump!(0x7A, "LIGHTMAP_DATA_REAL_TIME_LIGHT_PAGE"),
            lump!(0x7B, "LEVEL_INFO"),
            lump!(0x7C, "SHADOW_MESH_OPAQUE_VERTS"),
            lump!(0x7D, "SHADOW_MESH_ALPHA_VERTS"),
            lump!(0x7E, "SHADOW_MESH_INDICES"),
            lump!(0x7F, "SHADOW_MESH_MESHES"),
            $($extra),*
        ]
    };
}

pub static TITANFALL: Branch = Branch {
    name: "titanfall",
    magic: *b"rBSP",
    versions: &[29],
    version_offset: 4,
    revision_offset: 8,
    header_offset: 16,
    lump_count: RESPAWN_HEADER_LUMPS,
    lumps: respawn_lumps![lump!(0x4B, "VERTS_RESERVED_4")],
    static_props: Some(&STATIC_PROPS),
    external_lump_ext: Some("bsp_lump"),
    entity_partitions: ENTITY_PARTITIONS,
};

pub static TITANFALL_2: Branch = Branch {
    name: "titanfall2",
    magic: *b"rBSP",
    versions: &[37],
    version_offset: 4,
    revision_offset: 8,
    header_offset: 16,
    lump_count: RESPAWN_HEADER_LUMPS,
    lumps: respawn_lumps![
        lump!(0x04, "LIGHTPROBE_PARENT_INFOS"),
        lump!(0x05, "SHADOW_ENVIRONMENTS"),
        lump!(0x06, "LIGHTPROBE_BSP_NODES"),
        lump!(0x07, "LIGHTPROBE_BSP_REF_IDS"),
        lump!(0x37, "WORLD_LIGHTS_PARENT_INFO"),
        lump!(0x4B, "VERTS_BLINN_PHONG", 0 => VERTEX_BLINN_PHONG),
    ],
    static_props: Some(&STATIC_PROPS),
    external_lump_ext: Some("bsp_lump"),
    entity_partitions: ENTITY_PARTITIONS,
};

#[cfg(test)]
mod respawn_tests {
    use super::*;

    #[test]
    fn record_sizes() {
        assert_eq!(PLANE.size(), 16);
        assert_eq!(MODEL.size(), 32);
        assert_eq!(VERTEX_UNLIT.size(), 20);
        assert_eq!(VERTEX_BLINN_PHONG.size(), 16);
        assert_eq!(STATIC_PROP_V13.size(), 64);
    }

    #[test]
    fn shared_tables() {
        for branch in [&TITANFALL, &TITANFALL_2] {
            assert_eq!(branch.lump_name(0x2C), "TEXDATA_STRING_TABLE");
            assert_eq!(branch.schema(0x01, branch.versions[0], 1), Some(&PLANE));
            assert_eq!(branch.entity_partitions.len(), 5);
        }
        assert_eq!(TITANFALL.lump_name(0x4B), "VERTS_RESERVED_4");
        assert!(TITANFALL.schema(0x4B, 29, 0).is_none());
        assert_eq!(TITANFALL_2.schema(0x4B, 37, 0), Some(&VERTEX_BLINN_PHONG));
    }
}
