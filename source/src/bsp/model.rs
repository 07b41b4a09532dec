use glam::Vec3;

use super::{
    consts::MAX_MAP_MODELS,
    schema::{Field, RecordSchema, Scalar, XYZ},
    Lump,
};

pub static MODEL: RecordSchema = RecordSchema::new(
    "Model",
    &[
        Field::group("mins", Scalar::F32, XYZ),
        Field::group("maxs", Scalar::F32, XYZ),
        Field::group("origin", Scalar::F32, XYZ),
        Field::scalar("head_node", Scalar::I32),
        Field::scalar("first_face", Scalar::I32),
        Field::scalar("num_faces", Scalar::I32),
    ],
);

/// Brush model bounds, model 0 is the world.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPModel {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    pub head_node: i32,
    pub first_face: i32,
    pub num_faces: i32,
}

impl BSPModel {
    pub fn maxs(&self) -> Vec3 {
        self.maxs
    }

    pub fn mins(&self) -> Vec3 {
        self.mins
    }

    pub fn faces(&self) -> std::ops::Range<usize> {
        let first = self.first_face.max(0) as usize;
        first..first + self.num_faces.max(0) as usize
    }
}

impl Lump for BSPModel {
    fn max() -> usize {
        MAX_MAP_MODELS
    }
    fn lump_name() -> &'static str {
        "MODELS"
    }
    fn schema() -> &'static RecordSchema {
        &MODEL
    }
}
