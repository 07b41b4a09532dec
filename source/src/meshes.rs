//! Rebuilding renderable vertices from the face, edge and displacement lumps.

use common::vertex::FaceVertex;
use glam::{Vec2, Vec3, Vec4};
use log::warn;

use crate::{
    bsp::{
        consts::MAX_MAP_DISP_POWER,
        displacement::{BSPDispInfo, BSPDispVert},
        edges::{BSPEdge, BSPSurfEdge},
        face::BSPFace,
        file::BspFile,
        plane::BSPPlane,
        textures::{BSPTexData, BSPTexInfo},
    },
    error::{BspError, GeometryError, Result},
};

fn index_of(index: i32, len: usize) -> Result<isize> {
    if index < 0 {
        return Err(BspError::IndexOutOfRange {
            index: index as isize,
            len,
        });
    }
    Ok(index as isize)
}

/// `axis.xyz . pos + axis.w`
fn project(axis: Vec4, pos: Vec3) -> f32 {
    axis.truncate().dot(pos) + axis.w
}

/// Positions compare at one decimal place when lining a quad up with its displacement.
fn rounded(v: Vec3) -> Vec3 {
    (v * 10.0).round() / 10.0
}

impl BspFile {
    /// Corners of a face in winding order, with texture and lightmap coordinates.
    pub fn face_vertices(&self, face: usize) -> Result<Vec<FaceVertex>> {
        let face = self.typed::<BSPFace>()?.at(face)?;

        let range = face.surfedges();
        let surfedges = self.typed::<BSPSurfEdge>()?;
        let loop_edges = surfedges.slice(range.clone())?;
        if loop_edges.len() != range.len() {
            return Err(BspError::IndexOutOfRange {
                index: range.end - 1,
                len: surfedges.len(),
            });
        }

        // Every edge names both of its ends, and each end is also the start of the next edge.
        let edges = self.typed::<BSPEdge>()?;
        let mut refs = Vec::with_capacity(loop_edges.len() * 2);
        for surfedge in &loop_edges {
            let edge = edges.at(surfedge.edge_index())?;
            let (a, b) = surfedge.orient(edge);
            refs.extend([a, b]);
        }

        let tex_infos = self.typed::<BSPTexInfo>()?;
        let tex_info = tex_infos.get(index_of(face.tex_info as i32, tex_infos.len())?)?;
        let tex_datas = self.typed::<BSPTexData>()?;
        let tex_data = tex_datas.get(index_of(tex_info.tex_data, tex_datas.len())?)?;
        let plane = self.typed::<BSPPlane>()?.at(face.plane_num as usize)?;

        let (tex_s, tex_t) = (tex_info.tex_s, tex_info.tex_t);
        let (lightmap_s, lightmap_t) = (tex_info.lightmap_s, tex_info.lightmap_t);
        let tex_size = Vec2::new(tex_data.width as f32, tex_data.height as f32);
        let (lightmap_mins, lightmap_size) = (
            face.lightmap_texture_mins_in_luxels,
            face.lightmap_texture_size_in_luxels,
        );
        let lightmap_mins = lightmap_mins.as_vec2();
        let unlit = lightmap_size.x == 0 || lightmap_size.y == 0;
        let lightmap_size = lightmap_size.as_vec2();
        let normal = plane.normal;
        let color = tex_data.reflectivity;

        let verts = self.typed::<Vec3>()?;
        refs.iter()
            .step_by(2)
            .map(|&i| {
                let position = verts.at(i as usize)?;
                let uv = Vec2::new(project(tex_s, position), project(tex_t, position)) / tex_size;
                let lightmap_uv = if unlit {
                    Vec2::ZERO
                } else {
                    (Vec2::new(project(lightmap_s, position), project(lightmap_t, position))
                        - lightmap_mins)
                        / lightmap_size
                };
                Ok(FaceVertex {
                    position,
                    normal,
                    uv,
                    lightmap_uv,
                    color,
                })
            })
            .collect()
    }

    /// The `(2^power + 1)^2` grid of a displacement face, row by row.
    pub fn displacement_vertices(&self, face: usize) -> Result<Vec<FaceVertex>> {
        let record = self.typed::<BSPFace>()?.at(face)?;
        if !record.is_displacement() {
            return Err(GeometryError::NotADisplacement(face).into());
        }
        let mut corners = self.face_vertices(face)?;
        if corners.len() != 4 {
            return Err(GeometryError::CornerCount {
                face,
                corners: corners.len(),
            }
            .into());
        }

        let infos = self.typed::<BSPDispInfo>()?;
        let disp_info = record.disp_info;
        let disp = usize::try_from(disp_info)
            .ok()
            .filter(|&disp| disp < infos.len())
            .ok_or(GeometryError::MissingDispInfo {
                face,
                disp: disp_info,
            })?;
        let info = infos.at(disp)?;
        let power = info.power;
        if power > MAX_MAP_DISP_POWER {
            return Err(GeometryError::InvalidPower(power).into());
        }

        let start_position = rounded(info.start_position);
        match corners
            .iter()
            .position(|c| rounded(c.position) == start_position)
        {
            Some(first) => corners.rotate_left(first),
            None => warn!("face {face}: no corner matches displacement {disp}'s start position"),
        }

        let p2 = 1usize << power;
        let side = p2 + 1;
        let count = side * side;

        let pool = self.typed::<BSPDispVert>()?;
        let first = info.disp_vert_start;
        let window = usize::try_from(first)
            .ok()
            .filter(|&first| first + count <= pool.len())
            .ok_or(GeometryError::DisplacementVertsOutOfRange {
                disp,
                start: first.max(0) as usize,
                end: first.max(0) as usize + count,
                len: pool.len(),
            })?;
        let disp_verts = pool.slice(window as isize..(window + count) as isize)?;

        let [a, b, c, d] = [corners[0], corners[1], corners[2], corners[3]];
        let (ad, bc) = (d.position - a.position, c.position - b.position);
        let (ad_uv, bc_uv) = (d.uv - a.uv, c.uv - b.uv);
        let (ad_lm, bc_lm) = (d.lightmap_uv - a.lightmap_uv, c.lightmap_uv - b.lightmap_uv);

        Ok(disp_verts
            .iter()
            .enumerate()
            .map(|(i, vert)| {
                let t1 = (i % side) as f32 / p2 as f32;
                let t2 = (i / side) as f32 / p2 as f32;

                let base = (a.position + ad * t1).lerp(b.position + bc * t1, t2);
                FaceVertex {
                    position: base + vert.offset(),
                    normal: a.normal,
                    uv: (a.uv + ad_uv * t1).lerp(b.uv + bc_uv * t1, t2),
                    lightmap_uv: (a.lightmap_uv + ad_lm * t1)
                        .lerp(b.lightmap_uv + bc_lm * t1, t2),
                    color: a.color,
                }
            })
            .collect())
    }
}

/// Index buffer for a displacement grid of the given power.
///
/// Each 2x2 block of cells becomes 8 triangles. Odd rows use the mirrored block so the
/// diagonals alternate across the surface.
pub fn displacement_triangles(power: u32) -> Result<Vec<u32>> {
    if power > MAX_MAP_DISP_POWER {
        return Err(GeometryError::InvalidPower(power).into());
    }
    if power == 0 {
        return Ok(Vec::new());
    }
    let p2 = 1u32 << power;
    let (a, b, c) = (p2 + 1, p2 + 2, p2 + 3);

    let mut tris = Vec::with_capacity((p2 * p2 * 6) as usize);
    for line in 0..p2 {
        for block in 0..(1u32 << (power - 1)) {
            let o = line * a + 2 * block;
            if line % 2 == 0 {
                tris.extend([o, o + a, o + 1]);
                tris.extend([o + a, o + b, o + 1]);
                tris.extend([o + b, o + c, o + 1]);
                tris.extend([o + c, o + 2, o + 1]);
            } else {
                tris.extend([o, o + a, o + b]);
                tris.extend([o + 1, o, o + b]);
                tris.extend([o + 2, o + 1, o + b]);
                tris.extend([o + c, o + 2, o + b]);
            }
        }
    }
    Ok(tris)
}
