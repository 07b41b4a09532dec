pub mod branch;
pub mod consts;
pub mod displacement;
pub mod edges;
pub mod entities;
pub mod face;
pub mod file;
pub mod gamelump;
pub mod header;
pub mod lump;
pub mod lzma;
pub mod model;
pub mod plane;
pub mod schema;
pub mod slice;
pub mod textures;
pub mod vert;

pub use file::BspFile;
pub use lump::Lump;

// https://developer.valvesoftware.com/wiki/BSP_(Source)
//
// https://github.com/ValveSoftware/source-sdk-2013/blob/master/mp/src/public/bspfile.h
//
// The BSP file contains the vast majority of the information needed by the Source engine to render and play a map.
// This includes the geometry of all the polygons in the level; references to the names and orientation of the textures
// to be drawn on those polygons; the data used to simulate the physical behaviour of the player and other items during
// the game; the location and properties of all brush-based, model (prop) based, and non-visible (logical) entities in
// the map; and the BSP tree and visibility table used to locate the player location in the map geometry and to render
// the visible map as efficiently as possible. Optionally, the map file can also contain any custom textures and models
// used on the level, embedded inside the map's Pakfile lump.
//
// Respawn's Titanfall branch keeps the container but doubles the directory to 128 lumps, moves most geometry into new
// lumps, and lets any lump be replaced by a `<map>.bsp.<id>.bsp_lump` file next to the map. Entities can also be split
// out into `<map>_<partition>.ent` files.
//
// All data is little-endian.

#[cfg(test)]
mod bsp_tests {
    use std::path::Path;

    use glam::Vec3;

    use super::{
        gamelump::BSPGameLump,
        plane::BSPPlane,
        schema::Value,
        slice::LumpRange,
        BspFile,
    };
    use crate::{
        config::OpenOptions,
        error::BspError,
        test_util::{pod_bytes, MapBuilder},
    };

    const VERTS: [Vec3; 3] = [
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(4.0, 5.0, 6.0),
        Vec3::new(7.0, 8.0, 9.0),
    ];

    fn lenient() -> OpenOptions {
        OpenOptions::default().strict(false)
    }

    #[test]
    fn valve_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::valve()
            .lump(0, 0, b"{\n\"classname\" \"worldspawn\"\n}\n\0\0".to_vec())
            .lump(3, 0, pod_bytes(&VERTS))
            .write(dir.path(), "test.bsp");
        let bsp = BspFile::open(&path).unwrap();

        assert_eq!(bsp.branch().name, "orange_box");
        assert_eq!((bsp.version(), bsp.revision()), (20, 1));
        let names: Vec<_> = bsp.lumps().iter().map(|l| l.name().to_string()).collect();
        assert_eq!(names, ["ENTITIES", "VERTICES"]);
        assert!(!bsp.has_lump("PLANES"));
        assert!(matches!(bsp.lump("PLANES"), Err(BspError::MissingLump(_))));

        let verts = bsp.typed::<Vec3>().unwrap();
        assert_eq!(verts.len(), 3);
        assert_eq!(verts.get(-1).unwrap(), VERTS[2]);
        assert_eq!(verts.slice(1isize..).unwrap(), VERTS[1..].to_vec());
        assert_eq!(
            verts.slice(LumpRange::reversed()).unwrap(),
            vec![VERTS[2], VERTS[1], VERTS[0]]
        );
        assert!(verts.get(3).is_err());

        let records = bsp.records("VERTICES").unwrap();
        let found = records
            .find(&[("position.y", Value::Float(5.0))])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("position.z"), Some(Value::Float(6.0)));

        assert_eq!(
            bsp.entities_text().unwrap(),
            "{\n\"classname\" \"worldspawn\"\n}\n"
        );
        assert_eq!({ bsp.descriptor("VERTICES").unwrap().file_len }, 36);
        assert!(bsp.loading_errors().is_empty());
    }

    #[test]
    fn compressed_lump() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::valve()
            .compressed_lump(3, 0, pod_bytes(&VERTS))
            .write(dir.path(), "packed.bsp");
        let bsp = BspFile::open(&path).unwrap();

        let view = bsp.lump("VERTICES").unwrap();
        assert!(view.is_compressed());
        assert_eq!(view.len(), 36);
        assert_eq!(view.count(), 3);
        assert_eq!(bsp.typed::<Vec3>().unwrap().to_vec().unwrap(), VERTS.to_vec());
    }

    #[test]
    fn external_lumps_replace_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::respawn(37)
            .lump(0x03, 0, pod_bytes(&VERTS[..1]))
            .write(dir.path(), "mp_test.bsp");
        std::fs::write(
            dir.path().join("mp_test.bsp.0003.bsp_lump"),
            pod_bytes(&VERTS[1..]),
        )
        .unwrap();

        let bsp = BspFile::open(&path).unwrap();
        assert_eq!(bsp.branch().name, "titanfall2");
        let view = bsp.lump("VERTICES").unwrap();
        assert!(view.external_path().is_some());
        assert_eq!(bsp.typed::<Vec3>().unwrap().to_vec().unwrap(), VERTS[1..].to_vec());
        assert_eq!(bsp.lump_by_id(3).unwrap().len(), 24);

        let options = OpenOptions {
            external_lumps: false,
            ..OpenOptions::default()
        };
        let bsp = BspFile::open_with(&path, &options).unwrap();
        assert!(bsp.lump("VERTICES").unwrap().external_path().is_none());
        assert_eq!(bsp.typed::<Vec3>().unwrap().len(), 1);
    }

    #[test]
    fn strict_and_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::valve()
            .lump(1, 0, vec![0; 21])
            .lump(3, 0, pod_bytes(&VERTS))
            .dangling_lump(12, 0, 4096)
            .write(dir.path(), "broken.bsp");

        assert!(matches!(
            BspFile::open(&path),
            Err(BspError::SchemaMismatch { length: 21, size: 20, .. })
        ));

        let bsp = BspFile::open_with(&path, &lenient()).unwrap();
        let failed: Vec<_> = bsp.loading_errors().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(failed, ["PLANES", "EDGES"]);
        assert!(matches!(
            bsp.loading_errors()[1].1,
            BspError::LumpOutOfBounds { .. }
        ));
        assert!(!bsp.has_lump("PLANES"));
        assert_eq!(bsp.typed::<Vec3>().unwrap().len(), 3);
    }

    #[test]
    fn unknown_versions_read_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::valve()
            .version(21)
            .lump(3, 0, pod_bytes(&VERTS))
            .write(dir.path(), "future.bsp");
        let bsp = BspFile::open(&path).unwrap();
        assert_eq!(bsp.branch().name, "orange_box");
        let view = bsp.lump("VERTICES").unwrap();
        assert!(view.schema().is_none());
        assert_eq!(view.count(), 36);
        assert!(matches!(bsp.typed::<Vec3>(), Err(BspError::Untyped(_))));
        assert_eq!(view.raw().slice(..4isize).unwrap(), 1.0f32.to_le_bytes().to_vec());

        // a known format with an unknown lump version
        let path = MapBuilder::valve()
            .lump(3, 7, pod_bytes(&VERTS))
            .write(dir.path(), "odd_lump.bsp");
        let bsp = BspFile::open(&path).unwrap();
        assert!(bsp.lump("VERTICES").unwrap().schema().is_none());
    }

    #[test]
    fn unnamed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::valve()
            .lump(22, 0, vec![1, 2, 3, 4])
            .write(dir.path(), "unnamed.bsp");
        let bsp = BspFile::open(&path).unwrap();
        assert!(bsp.has_lump("UNKNOWN_0016"));

        let view = bsp.lump_by_id(22).unwrap();
        assert_eq!(view.name(), "UNKNOWN_0016");
        assert_eq!(view.raw().to_vec().unwrap(), vec![1, 2, 3, 4]);
        assert!(bsp.lump_by_id(64).is_err());
    }

    #[test]
    fn branch_hints() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::valve().write(dir.path(), "empty.bsp");

        let err = BspFile::open_with(&path, &OpenOptions::default().branch("titanfall2"))
            .unwrap_err();
        assert!(matches!(err, BspError::BadMagic { .. }));
        assert!(err.is_fatal());
        assert!(matches!(
            BspFile::open_with(&path, &lenient().branch("quake3")),
            Err(BspError::UnknownBranch(_))
        ));

        std::fs::write(dir.path().join("short.bsp"), b"VBSP\x14\0\0\0").unwrap();
        assert!(matches!(
            BspFile::open(dir.path().join("short.bsp")),
            Err(BspError::TruncatedDirectory(_))
        ));
        std::fs::write(dir.path().join("idtech.bsp"), b"IBSP\x26\0\0\0").unwrap();
        assert!(matches!(
            BspFile::open(dir.path().join("idtech.bsp")),
            Err(BspError::UnknownBranch(_))
        ));
    }

    #[test]
    fn respawn_plane_records() {
        let dir = tempfile::tempdir().unwrap();
        let planes = [0.0f32, 0.0, 1.0, 64.0, 1.0, 0.0, 0.0, -8.0];
        let path = MapBuilder::respawn(29)
            .lump(0x01, 1, pod_bytes(&planes))
            .write(dir.path(), "mp_old.bsp");
        let bsp = BspFile::open(&path).unwrap();
        assert_eq!(bsp.branch().name, "titanfall");

        let records = bsp.records("PLANES").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.get(1).unwrap().get("dist"), Some(Value::Float(-8.0)));
        assert!(matches!(
            bsp.typed::<BSPPlane>(),
            Err(BspError::RecordTypeMismatch { .. })
        ));
    }

    fn static_prop_lump(lump_ofs: i32) -> Vec<u8> {
        let mut sprp = 1i32.to_le_bytes().to_vec();
        let mut name = b"models/props/Crate.mdl".to_vec();
        name.resize(128, 0);
        sprp.extend(name);
        sprp.extend(0i32.to_le_bytes());
        sprp.extend(1i32.to_le_bytes());
        sprp.extend(vec![0u8; super::branch::valve::STATIC_PROP_V5.size()]);

        let header = BSPGameLump {
            id: *b"prps",
            flags: 0,
            version: 5,
            file_ofs: lump_ofs + 4 + std::mem::size_of::<BSPGameLump>() as i32,
            file_len: sprp.len() as i32,
        };
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(bytemuck::bytes_of(&header));
        bytes.extend(sprp);
        bytes
    }

    #[test]
    fn game_lumps_through_file() {
        let dir = tempfile::tempdir().unwrap();
        // first lump written, so it starts right after the directory and revision
        let path = MapBuilder::valve()
            .lump(35, 0, static_prop_lump(8 + 64 * 16 + 4))
            .write(dir.path(), "props.bsp");
        let bsp = BspFile::open(&path).unwrap();

        let game_lumps = bsp.game_lumps().unwrap();
        assert_eq!(game_lumps.directory().segments().len(), 1);
        let props = game_lumps.static_props().unwrap().unwrap();
        assert_eq!(props.version, 5);
        assert_eq!(props.names, ["models/props/crate.mdl"]);
        assert_eq!(props.len(), 1);
        let prop = &props.props.as_ref().unwrap()[0];
        assert_eq!(props.model_name(prop), Some("models/props/crate.mdl"));
    }

    fn write_partition(dir: &Path, name: &str, count: u32) {
        std::fs::write(
            dir.join(format!("mp_test_{name}.ent")),
            format!("ENTITIES02 model_count={count}\n{{\n\"classname\" \"info_{name}\"\n}}\n"),
        )
        .unwrap();
    }

    #[test]
    fn entity_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = MapBuilder::respawn(37)
            .lump(0x00, 0, b"{\n\"classname\" \"worldspawn\"\n}\n\0".to_vec())
            .write(dir.path(), "mp_test.bsp");
        write_partition(dir.path(), "env", 3);
        write_partition(dir.path(), "spawn", 3);

        let bsp = BspFile::open(&path).unwrap();
        let names: Vec<_> = bsp.entity_partitions().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["env", "spawn"]);
        assert_eq!(bsp.partition_model_count(), Some(3));
        let text = bsp.entities_text().unwrap();
        assert!(text.starts_with("{\n\"classname\" \"worldspawn\""));
        assert!(text.contains("info_env"));
        assert!(text.ends_with("\"info_spawn\"\n}\n"));
        assert!(!text.contains("ENTITIES02"));

        write_partition(dir.path(), "fx", 4);
        let bsp = BspFile::open(&path).unwrap();
        assert_eq!(bsp.entity_partitions().len(), 3);
        assert_eq!(bsp.partition_model_count(), None);

        let options = OpenOptions {
            entity_partitions: false,
            ..OpenOptions::default()
        };
        assert!(BspFile::open_with(&path, &options)
            .unwrap()
            .entity_partitions()
            .is_empty());
    }
}
