use glam::{Vec2, Vec3};

pub trait Vertex: bytemuck::Pod {
    fn position(&self) -> Vec3;
}

/// One reconstructed corner of a map face or displacement grid.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub lightmap_uv: Vec2,
    /// Texture reflectivity, broadcast over the whole face
    pub color: Vec3,
}

impl Vertex for FaceVertex {
    fn position(&self) -> Vec3 {
        self.position
    }
}

#[cfg(test)]
mod vertex_tests {
    use super::*;

    #[test]
    fn face_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<FaceVertex>(), 13 * 4);

        let v = FaceVertex {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&v));
        assert_eq!(&floats[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(v.position(), v.position);
    }
}
