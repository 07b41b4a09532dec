//! Valve's Source engine, as shipped with the Orange Box and Source 2013.
//!
//! `VBSP`, a version at offset 4, 64 lump headers at offset 8 and the map revision after them.

use super::{Branch, LumpDef, StaticPropDef};
use crate::bsp::{
    consts::VALVE_HEADER_LUMPS,
    displacement::{DISP_INFO, DISP_TRI, DISP_VERT},
    edges::{EDGE, SURFEDGE},
    face::FACE,
    model::MODEL,
    plane::PLANE,
    schema::{Field, RecordSchema, Scalar, MIN_MAX, RGBA, XYZ},
    textures::{TEXDATA, TEXDATA_STRING_TABLE, TEXINFO},
    vert::VECTOR3,
};

pub static INDEX_U16: RecordSchema =
    RecordSchema::new("Index16", &[Field::scalar("index", Scalar::U16)]);

pub static NODE: RecordSchema = RecordSchema::new(
    "Node",
    &[
        Field::scalar("plane_num", Scalar::I32),
        Field::array("children", Scalar::I32, 2),
        Field::group("mins", Scalar::I16, XYZ),
        Field::group("maxs", Scalar::I16, XYZ),
        Field::scalar("first_face", Scalar::U16),
        Field::scalar("num_faces", Scalar::U16),
        Field::scalar("area", Scalar::I16),
        Field::scalar("padding", Scalar::I16),
    ],
);

pub static LEAF_V0: RecordSchema = RecordSchema::new(
    "LeafV0",
    &[
        Field::scalar("contents", Scalar::I32),
        Field::scalar("cluster", Scalar::I16),
        Field::scalar("area_flags", Scalar::I16),
        Field::group("mins", Scalar::I16, XYZ),
        Field::group("maxs", Scalar::I16, XYZ),
        Field::scalar("first_leaf_face", Scalar::U16),
        Field::scalar("num_leaf_faces", Scalar::U16),
        Field::scalar("first_leaf_brush", Scalar::U16),
        Field::scalar("num_leaf_brushes", Scalar::U16),
        Field::scalar("leaf_water_data_id", Scalar::I16),
        Field::array("ambient_lighting", Scalar::U8, 24),
        Field::scalar("padding", Scalar::I16),
    ],
);

pub static LEAF_V1: RecordSchema = RecordSchema::new(
    "LeafV1",
    &[
        Field::scalar("contents", Scalar::I32),
        Field::scalar("cluster", Scalar::I16),
        Field::scalar("area_flags", Scalar::I16),
        Field::group("mins", Scalar::I16, XYZ),
        Field::group("maxs", Scalar::I16, XYZ),
        Field::scalar("first_leaf_face", Scalar::U16),
        Field::scalar("num_leaf_faces", Scalar::U16),
        Field::scalar("first_leaf_brush", Scalar::U16),
        Field::scalar("num_leaf_brushes", Scalar::U16),
        Field::scalar("leaf_water_data_id", Scalar::I16),
        Field::scalar("padding", Scalar::I16),
    ],
);

pub static BRUSH: RecordSchema = RecordSchema::new(
    "Brush",
    &[
        Field::scalar("first_side", Scalar::I32),
        Field::scalar("num_sides", Scalar::I32),
        Field::scalar("contents", Scalar::I32),
    ],
);

pub static BRUSH_SIDE: RecordSchema = RecordSchema::new(
    "BrushSide",
    &[
        Field::scalar("plane_num", Scalar::U16),
        Field::scalar("tex_info", Scalar::I16),
        Field::scalar("disp_info", Scalar::I16),
        Field::scalar("bevel", Scalar::I8),
        Field::scalar("thin", Scalar::I8),
    ],
);

pub static AREA: RecordSchema = RecordSchema::new(
    "Area",
    &[
        Field::scalar("num_area_portals", Scalar::I32),
        Field::scalar("first_area_portal", Scalar::I32),
    ],
);

pub static AREA_PORTAL: RecordSchema = RecordSchema::new(
    "AreaPortal",
    &[
        Field::scalar("portal_key", Scalar::U16),
        Field::scalar("other_area", Scalar::U16),
        Field::scalar("first_clip_portal_vert", Scalar::U16),
        Field::scalar("num_clip_portal_verts", Scalar::U16),
        Field::scalar("plane_num", Scalar::I32),
    ],
);

pub static WORLD_LIGHT: RecordSchema = RecordSchema::new(
    "WorldLight",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("intensity", Scalar::F32, XYZ),
        Field::group("normal", Scalar::F32, XYZ),
        Field::scalar("cluster", Scalar::I32),
        Field::scalar("emit_type", Scalar::I32),
        Field::scalar("style", Scalar::I32),
        Field::scalar("stopdot", Scalar::F32),
        Field::scalar("stopdot2", Scalar::F32),
        Field::scalar("exponent", Scalar::F32),
        Field::scalar("radius", Scalar::F32),
        Field::scalar("constant_attn", Scalar::F32),
        Field::scalar("linear_attn", Scalar::F32),
        Field::scalar("quadratic_attn", Scalar::F32),
        Field::scalar("flags", Scalar::I32),
        Field::scalar("tex_info", Scalar::I32),
        Field::scalar("owner", Scalar::I32),
    ],
);

pub static CUBEMAP: RecordSchema = RecordSchema::new(
    "Cubemap",
    &[
        Field::group("origin", Scalar::I32, XYZ),
        Field::scalar("size", Scalar::I32),
    ],
);

pub static LEAF_WATER_DATA: RecordSchema = RecordSchema::new(
    "LeafWaterData",
    &[
        Field::scalar("surface_z", Scalar::F32),
        Field::scalar("min_z", Scalar::F32),
        Field::scalar("surface_tex_info", Scalar::I16),
        Field::scalar("padding", Scalar::I16),
    ],
);

pub static LEAF_AMBIENT_INDEX: RecordSchema = RecordSchema::new(
    "LeafAmbientIndex",
    &[
        Field::scalar("ambient_sample_count", Scalar::U16),
        Field::scalar("first_ambient_sample", Scalar::U16),
    ],
);

pub static LEAF_AMBIENT_LIGHTING: RecordSchema = RecordSchema::new(
    "LeafAmbientLighting",
    &[
        Field::array("cube", Scalar::U8, 24),
        Field::group("position", Scalar::U8, XYZ),
        Field::scalar("padding", Scalar::U8),
    ],
);

const ANGLES: &[&str] = &["pitch", "yaw", "roll"];

pub static STATIC_PROP_V4: RecordSchema = RecordSchema::new(
    "StaticPropV4",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("angles", Scalar::F32, ANGLES),
        Field::scalar("model_index", Scalar::U16),
        Field::scalar("first_leaf", Scalar::U16),
        Field::scalar("leaf_count", Scalar::U16),
        Field::scalar("solid", Scalar::U8),
        Field::scalar("flags", Scalar::U8),
        Field::scalar("skin", Scalar::I32),
        Field::group("fade_dist", Scalar::F32, MIN_MAX),
        Field::group("lighting_origin", Scalar::F32, XYZ),
    ],
);

pub static STATIC_PROP_V5: RecordSchema = RecordSchema::new(
    "StaticPropV5",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("angles", Scalar::F32, ANGLES),
        Field::scalar("model_index", Scalar::U16),
        Field::scalar("first_leaf", Scalar::U16),
        Field::scalar("leaf_count", Scalar::U16),
        Field::scalar("solid", Scalar::U8),
        Field::scalar("flags", Scalar::U8),
        Field::scalar("skin", Scalar::I32),
        Field::group("fade_dist", Scalar::F32, MIN_MAX),
        Field::group("lighting_origin", Scalar::F32, XYZ),
        Field::scalar("forced_fade_scale", Scalar::F32),
    ],
);

pub static STATIC_PROP_V6: RecordSchema = RecordSchema::new(
    "StaticPropV6",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("angles", Scalar::F32, ANGLES),
        Field::scalar("model_index", Scalar::U16),
        Field::scalar("first_leaf", Scalar::U16),
        Field::scalar("leaf_count", Scalar::U16),
        Field::scalar("solid", Scalar::U8),
        Field::scalar("flags", Scalar::U8),
        Field::scalar("skin", Scalar::I32),
        Field::group("fade_dist", Scalar::F32, MIN_MAX),
        Field::group("lighting_origin", Scalar::F32, XYZ),
        Field::scalar("forced_fade_scale", Scalar::F32),
        Field::group("dx_level", Scalar::U16, MIN_MAX),
    ],
);

pub static STATIC_PROP_V7: RecordSchema = RecordSchema::new(
    "StaticPropV7",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("angles", Scalar::F32, ANGLES),
        Field::scalar("model_index", Scalar::U16),
        Field::scalar("first_leaf", Scalar::U16),
        Field::scalar("leaf_count", Scalar::U16),
        Field::scalar("solid", Scalar::U8),
        Field::scalar("flags", Scalar::U8),
        Field::scalar("skin", Scalar::I32),
        Field::group("fade_dist", Scalar::F32, MIN_MAX),
        Field::group("lighting_origin", Scalar::F32, XYZ),
        Field::scalar("forced_fade_scale", Scalar::F32),
        Field::group("dx_level", Scalar::U16, MIN_MAX),
        Field::group("diffuse_modulation", Scalar::U8, RGBA),
    ],
);

pub static STATIC_PROP_V10: RecordSchema = RecordSchema::new(
    "StaticPropV10",
    &[
        Field::group("origin", Scalar::F32, XYZ),
        Field::group("angles", Scalar::F32, ANGLES),
        Field::scalar("model_index", Scalar::U16),
        Field::scalar("first_leaf", Scalar::U16),
        Field::scalar("leaf_count", Scalar::U16),
        Field::scalar("solid", Scalar::U8),
        Field::scalar("flags", Scalar::U8),
        Field::scalar("skin", Scalar::I32),
        Field::group("fade_dist", Scalar::F32, MIN_MAX),
        Field::group("lighting_origin", Scalar::F32, XYZ),
        Field::scalar("forced_fade_scale", Scalar::F32),
        Field::group("cpu_level", Scalar::U8, MIN_MAX),
        Field::group("gpu_level", Scalar::U8, MIN_MAX),
        Field::group("diffuse_modulation", Scalar::U8, RGBA),
        Field::scalar("disable_x360", Scalar::U32),
        Field::scalar("flags_ex", Scalar::U32),
    ],
);

static STATIC_PROPS: StaticPropDef = StaticPropDef {
    leaves: true,
    preamble_ints: 0,
    schemas: &[
        (4, &STATIC_PROP_V4),
        (5, &STATIC_PROP_V5),
        (6, &STATIC_PROP_V6),
        (7, &STATIC_PROP_V7),
        (10, &STATIC_PROP_V10),
    ],
};

pub static ORANGE_BOX: Branch = Branch {
    name: "orange_box",
    magic: *b"VBSP",
    versions: &[19, 20],
    version_offset: 4,
    revision_offset: 8 + 16 * VALVE_HEADER_LUMPS as u64,
    header_offset: 8,
    lump_count: VALVE_HEADER_LUMPS,
    lumps: &[
        lump!(0, "ENTITIES"),
        lump!(1, "PLANES", 0 => PLANE),
        lump!(2, "TEXDATA", 0 => TEXDATA),
        lump!(3, "VERTICES", 0 => VECTOR3),
        lump!(4, "VISIBILITY"),
        lump!(5, "NODES", 0 => NODE),
        lump!(6, "TEXINFO", 0 => TEXINFO),
        lump!(7, "FACES", 0 => FACE, 1 => FACE),
        lump!(8, "LIGHTING"),
        lump!(9, "OCCLUSION"),
        lump!(10, "LEAVES", 0 => LEAF_V0, 1 => LEAF_V1),
        lump!(11, "FACE_IDS", 0 => INDEX_U16),
        lump!(12, "EDGES", 0 => EDGE),
        lump!(13, "SURFEDGES", 0 => SURFEDGE),
        lump!(14, "MODELS", 0 => MODEL),
        lump!(15, "WORLD_LIGHTS", 0 => WORLD_LIGHT),
        lump!(16, "LEAF_FACES", 0 => INDEX_U16),
        lump!(17, "LEAF_BRUSHES", 0 => INDEX_U16),
        lump!(18, "BRUSHES", 0 => BRUSH),
        lump!(19, "BRUSH_SIDES", 0 => BRUSH_SIDE),
        lump!(20, "AREAS", 0 => AREA),
        lump!(21, "AREA_PORTALS", 0 => AREA_PORTAL),
        lump!(26, "DISPLACEMENT_INFO", 0 => DISP_INFO),
        lump!(27, "ORIGINAL_FACES", 0 => FACE),
        lump!(28, "PHYSICS_DISPLACEMENT"),
        lump!(29, "PHYSICS_COLLIDE"),
        lump!(30, "VERTEX_NORMALS", 0 => VECTOR3),
        lump!(31, "VERTEX_NORMAL_INDICES", 0 => INDEX_U16),
        lump!(32, "DISPLACEMENT_LIGHTMAP_ALPHAS"),
        lump!(33, "DISPLACEMENT_VERTICES", 0 => DISP_VERT),
        lump!(34, "DISPLACEMENT_LIGHTMAP_SAMPLE_POSITIONS"),
        lump!(35, "GAME_LUMP"),
        lump!(36, "LEAF_WATER_DATA", 0 => LEAF_WATER_DATA),
        lump!(37, "PRIMITIVES"),
        lump!(38, "PRIMITIVE_VERTICES", 0 => VECTOR3),
        lump!(39, "PRIMITIVE_INDICES", 0 => INDEX_U16),
        lump!(40, "PAKFILE"),
        lump!(41, "CLIP_PORTAL_VERTICES", 0 => VECTOR3),
        lump!(42, "CUBEMAPS", 0 => CUBEMAP),
        lump!(43, "TEXDATA_STRING_DATA"),
        lump!(44, "TEXDATA_STRING_TABLE", 0 => TEXDATA_STRING_TABLE),
        lump!(45, "OVERLAYS"),
        lump!(46, "LEAF_MIN_DIST_TO_WATER"),
        lump!(47, "FACE_MACRO_TEXTURE_INFO"),
        lump!(48, "DISPLACEMENT_TRIANGLES", 0 => DISP_TRI),
        lump!(49, "PHYSICS_COLLIDE_SURFACE"),
        lump!(50, "WATER_OVERLAYS"),
        lump!(51, "LEAF_AMBIENT_INDEX_HDR", 0 => LEAF_AMBIENT_INDEX),
        lump!(52, "LEAF_AMBIENT_INDEX", 0 => LEAF_AMBIENT_INDEX),
        lump!(53, "LIGHTING_HDR"),
        lump!(54, "WORLD_LIGHTS_HDR", 0 => WORLD_LIGHT),
        lump!(55, "LEAF_AMBIENT_LIGHTING_HDR", 1 => LEAF_AMBIENT_LIGHTING),
        lump!(56, "LEAF_AMBIENT_LIGHTING", 1 => LEAF_AMBIENT_LIGHTING),
        lump!(57, "XZIP_PAKFILE"),
        lump!(58, "FACES_HDR", 0 => FACE, 1 => FACE),
        lump!(59, "MAP_FLAGS"),
        lump!(60, "OVERLAY_FADES"),
    ],
    static_props: Some(&STATIC_PROPS),
    external_lump_ext: None,
    entity_partitions: &[],
};

#[cfg(test)]
mod valve_tests {
    use super::*;

    #[test]
    fn record_sizes() {
        assert_eq!(NODE.size(), 32);
        assert_eq!(LEAF_V0.size(), 56);
        assert_eq!(LEAF_V1.size(), 32);
        assert_eq!(BRUSH_SIDE.size(), 8);
        assert_eq!(AREA_PORTAL.size(), 12);
        assert_eq!(WORLD_LIGHT.size(), 88);
        assert_eq!(LEAF_AMBIENT_LIGHTING.size(), 28);
        assert_eq!(STATIC_PROP_V4.size(), 56);
        assert_eq!(STATIC_PROP_V5.size(), 60);
        assert_eq!(STATIC_PROP_V6.size(), 64);
        assert_eq!(STATIC_PROP_V7.size(), 68);
        assert_eq!(STATIC_PROP_V10.size(), 76);
    }

    #[test]
    fn lump_versions() {
        let faces = ORANGE_BOX.lump_by_name("FACES").unwrap();
        assert_eq!(ORANGE_BOX.schema(faces.id, 20, 1), Some(&FACE));
        let leaves = ORANGE_BOX.lump_by_name("LEAVES").unwrap();
        assert_eq!(ORANGE_BOX.schema(leaves.id, 20, 0), Some(&LEAF_V0));
        assert_eq!(ORANGE_BOX.schema(leaves.id, 20, 1), Some(&LEAF_V1));
        assert!(ORANGE_BOX.lump(22).is_none());
        assert_eq!(ORANGE_BOX.revision_offset, 1032);
    }
}
