use glam::Vec3;

use super::{
    consts::MAX_MAP_VERTS,
    schema::{Field, RecordSchema, Scalar, XYZ},
    Lump,
};

/// Three floats, shared by every branch's vertex and normal lumps.
pub static VECTOR3: RecordSchema =
    RecordSchema::new("Vector3", &[Field::group("position", Scalar::F32, XYZ)]);

impl Lump for Vec3 {
    fn max() -> usize {
        MAX_MAP_VERTS
    }
    fn lump_name() -> &'static str {
        "VERTICES"
    }
    fn schema() -> &'static RecordSchema {
        &VECTOR3
    }
}
