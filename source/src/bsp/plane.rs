use glam::Vec3;

use super::{
    consts::MAX_MAP_PLANES,
    schema::{Field, RecordSchema, Scalar, XYZ},
    Lump,
};

pub static PLANE: RecordSchema = RecordSchema::new(
    "Plane",
    &[
        Field::group("normal", Scalar::F32, XYZ),
        Field::scalar("dist", Scalar::F32),
        Field::scalar("axis", Scalar::I32),
    ],
);

///Plane
///
///The basis of the BSP geometry is defined by planes, which are used as splitting surfaces across the BSP tree structure.
///
/// The plane is represented by the element normal, a unit vector perpendicular to the plane's surface, and by dist,
/// the distance from the map origin to the nearest point on the plane, so that `Ax + By + Cz = D`.
///
/// The type member contains the axis that the plane is facing, 0-2 for X, Y and Z, 3-5 for the nearest axis of a
/// non-axial plane. There are 20 bytes per plane.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPPlane {
    pub normal: Vec3, // normal vector
    pub dist: f32,    // distance from origin
    pub axis: i32,    // plane axis identifier
}

impl BSPPlane {
    /// Signed distance of `point` in front of the plane.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        let normal = self.normal;
        normal.dot(point) - self.dist
    }
}

impl Lump for BSPPlane {
    fn max() -> usize {
        MAX_MAP_PLANES
    }
    fn lump_name() -> &'static str {
        "PLANES"
    }
    fn schema() -> &'static RecordSchema {
        &PLANE
    }
}

#[cfg(test)]
mod plane_tests {
    use super::*;

    #[test]
    fn signed_distance() {
        assert_eq!(std::mem::size_of::<BSPPlane>(), PLANE.size());
        let floor = BSPPlane {
            normal: Vec3::Z,
            dist: 64.0,
            axis: 2,
        };
        assert_eq!(floor.distance_to(Vec3::new(5.0, 5.0, 80.0)), 16.0);
        assert!(floor.distance_to(Vec3::ZERO) < 0.0);
    }
}
