use flagset::{flags, FlagSet};
use glam::{Vec3, Vec4};

use super::{
    consts::{MAX_MAP_TEXDATA, MAX_MAP_TEXDATA_STRING_TABLE, MAX_MAP_TEXINFO},
    schema::{Field, RecordSchema, Scalar, XYZ},
    Lump,
};

const XYZW: &[&str] = &["x", "y", "z", "w"];

pub static TEXINFO: RecordSchema = RecordSchema::new(
    "TexInfo",
    &[
        Field::group("tex_s", Scalar::F32, XYZW),
        Field::group("tex_t", Scalar::F32, XYZW),
        Field::group("lightmap_s", Scalar::F32, XYZW),
        Field::group("lightmap_t", Scalar::F32, XYZW),
        Field::scalar("flags", Scalar::I32),
        Field::scalar("tex_data", Scalar::I32),
    ],
);

pub static TEXDATA: RecordSchema = RecordSchema::new(
    "TexData",
    &[
        Field::group("reflectivity", Scalar::F32, XYZ),
        Field::scalar("name_string_table_id", Scalar::I32),
        Field::scalar("width", Scalar::I32),
        Field::scalar("height", Scalar::I32),
        Field::scalar("view_width", Scalar::I32),
        Field::scalar("view_height", Scalar::I32),
    ],
);

pub static TEXDATA_STRING_TABLE: RecordSchema = RecordSchema::new(
    "TexDataStringTable",
    &[Field::scalar("offset", Scalar::I32)],
);

flags! {
    pub enum SurfFlags: i32 {
        Light = 0x1,        // value will hold the light strength
        Sky2D = 0x2,        // don't draw, indicates we should skylight + draw 2d sky but not draw the 3D skybox
        Sky = 0x4,          // don't draw, but add to skybox
        Warp = 0x8,         // turbulent water warp
        Trans = 0x10,       // texture is translucent
        NoPortal = 0x20,    // the surface can not have a portal placed on it
        Trigger = 0x40,
        NoDraw = 0x80,      // don't bother referencing the texture
        Hint = 0x100,       // make a primary bsp splitter
        Skip = 0x200,       // completely ignore, allowing non-closed brushes
        NoLight = 0x400,    // Don't calculate light
        BumpLight = 0x800,  // calculate three lightmaps for the surface for bumpmapping
        NoShadows = 0x1000,
        NoDecals = 0x2000,
        NoChop = 0x4000,    // Don't subdivide patches on this surface
        Hitbox = 0x8000,    // surface is part of a hitbox
    }
}

/// Texinfo
///
/// The 2D coordinates (u, v) of a texel are mapped to the world coordinates (x, y, z) of a point on a face by
/// `u = tex_s.xyz . (x, y, z) + tex_s.w`, and likewise for v. Divide by the texture size to get texture coordinates.
///
/// The lightmap vectors perform the same mapping for lightmap samples, after which the face's
/// `lightmap_texture_mins_in_luxels` is subtracted.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPTexInfo {
    /// [s/t][xyz offset]
    pub tex_s: Vec4,
    pub tex_t: Vec4,
    /// [s/t][xyz offset] - length is in units of texels/area
    pub lightmap_s: Vec4,
    pub lightmap_t: Vec4,
    pub flags: i32,    // miptex flags overrides
    pub tex_data: i32, // Pointer to texture name, size, etc.
}

impl BSPTexInfo {
    pub fn surface_flags(&self) -> FlagSet<SurfFlags> {
        FlagSet::new_truncated(self.flags)
    }
}

impl Lump for BSPTexInfo {
    fn max() -> usize {
        MAX_MAP_TEXINFO
    }
    fn lump_name() -> &'static str {
        "TEXINFO"
    }
    fn schema() -> &'static RecordSchema {
        &TEXINFO
    }
}

///Texdata
///
/// The reflectivity vector corresponds to the RGB components of the reflectivity of the texture, as derived from the
/// material's .vtf file. The nameStringTableID is an index into the TexdataStringTable array.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPTexData {
    pub reflectivity: Vec3,        // RGB reflectivity
    pub name_string_table_id: i32, // index into TexdataStringTable
    pub width: i32,
    pub height: i32, // source image
    pub view_width: i32,
    pub view_height: i32,
}

impl Lump for BSPTexData {
    fn max() -> usize {
        MAX_MAP_TEXDATA
    }
    fn lump_name() -> &'static str {
        "TEXDATA"
    }
    fn schema() -> &'static RecordSchema {
        &TEXDATA
    }
}

/// Offsets into the NUL separated TEXDATA_STRING_DATA lump.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPTexDataStringTable {
    pub index: i32,
}

impl Lump for BSPTexDataStringTable {
    fn max() -> usize {
        MAX_MAP_TEXDATA_STRING_TABLE
    }
    fn lump_name() -> &'static str {
        "TEXDATA_STRING_TABLE"
    }
    fn schema() -> &'static RecordSchema {
        &TEXDATA_STRING_TABLE
    }
}

#[cfg(test)]
mod textures_tests {
    use super::*;

    #[test]
    fn flags() {
        let info = BSPTexInfo {
            flags: 0x80 | 0x4 | 0x10000,
            ..bytemuck::Zeroable::zeroed()
        };
        let flags = info.surface_flags();
        assert!(flags.contains(SurfFlags::NoDraw));
        assert!(flags.contains(SurfFlags::Sky));
        assert!(!flags.contains(SurfFlags::Light));
    }
}
