//! The game lump: a directory of tagged segments nested inside one lump.
//!
//! Compressed segments do not store their compressed length. It is the distance to the next
//! entry's offset, which is why compressed directories end with an empty sentinel entry.

use std::{
    io::{Cursor, Read},
    mem::size_of,
};

use log::{trace, warn};

use super::{
    branch::{Branch, StaticPropDef},
    consts::STATIC_PROP_NAME_LENGTH,
    lump::LumpView,
    lzma,
    schema::Record,
};
use crate::{
    binaries::BinaryData,
    error::{BspError, Result},
};

pub const GAMELUMP_COMPRESSED: u16 = 0x0001;

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPGameLump {
    pub id: [u8; 4],   // gamelump ID
    pub flags: u16,    // flags
    pub version: u16,  // gamelump version
    pub file_ofs: i32, // offset to this gamelump
    pub file_len: i32, // length, decompressed length when compressed
}

impl BinaryData for BSPGameLump {}

impl BSPGameLump {
    /// The id as it reads in the engine, `b"prps"` is `sprp`.
    pub fn tag(&self) -> String {
        let mut id = self.id;
        id.reverse();
        String::from_utf8_lossy(&id).into_owned()
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & GAMELUMP_COMPRESSED != 0
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == [0; 4] && { self.file_len } == 0
    }
}

fn malformed(reason: impl Into<String>) -> BspError {
    BspError::MalformedGameLump(reason.into())
}

/// Fails when `count` records of `size` bytes cannot fit in the rest of the buffer.
fn ensure_room(buffer: &Cursor<&[u8]>, what: &str, count: usize, size: usize) -> Result<()> {
    let remaining = buffer
        .get_ref()
        .len()
        .saturating_sub(buffer.position() as usize);
    match count.checked_mul(size) {
        Some(needed) if needed <= remaining => Ok(()),
        _ => Err(malformed(format!(
            "{count} {what} of {size} bytes, {remaining} remain"
        ))),
    }
}

#[derive(Clone, Debug)]
pub struct GameLumpDirectory {
    segments: Vec<BSPGameLump>,
    sentinel: Option<BSPGameLump>,
}

impl GameLumpDirectory {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut buffer = Cursor::new(bytes);
        let count = i32::read(&mut buffer).map_err(|e| malformed(format!("count: {e}")))?;
        if count < 0 {
            return Err(malformed(format!("negative segment count {count}")));
        }
        ensure_room(&buffer, "entries", count as usize, size_of::<BSPGameLump>())?;
        let mut segments = BSPGameLump::read_array(&mut buffer, count as usize)
            .map_err(|e| malformed(format!("{count} entries: {e}")))?;

        let sentinel = match segments.last() {
            Some(last) if last.is_sentinel() => segments.pop(),
            _ => None,
        };

        let directory = Self { segments, sentinel };
        if directory.sentinel.is_none() && directory.segments.iter().any(|s| s.is_compressed()) {
            return Err(malformed("compressed segments without a trailing sentinel"));
        }
        for (k, segment) in directory.segments.iter().enumerate() {
            if segment.is_compressed() && directory.segment_len(k)? == 0 {
                return Err(malformed(format!("segment {} has no data", segment.tag())));
            }
        }
        Ok(directory)
    }

    /// Real segments, without the sentinel.
    pub fn segments(&self) -> &[BSPGameLump] {
        &self.segments
    }

    pub fn sentinel(&self) -> Option<&BSPGameLump> {
        self.sentinel.as_ref()
    }

    pub fn find(&self, tag: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.tag() == tag)
    }

    /// Bytes segment `k` occupies in the file.
    ///
    /// Compressed segments span up to the next entry's offset.
    pub fn segment_len(&self, k: usize) -> Result<u32> {
        let segment = self
            .segments
            .get(k)
            .ok_or(BspError::IndexOutOfRange {
                index: k as isize,
                len: self.segments.len(),
            })?;
        if !segment.is_compressed() {
            return Ok(segment.file_len.max(0) as u32);
        }
        let next = self
            .segments
            .get(k + 1)
            .or(self.sentinel.as_ref())
            .ok_or_else(|| malformed("no sentinel"))?;
        let (start, end) = (segment.file_ofs, next.file_ofs);
        if end < start {
            return Err(malformed(format!(
                "segment {} starts at {start} but the next entry is at {end}",
                segment.tag()
            )));
        }
        Ok((end as i64 - start as i64) as u32)
    }
}

/// A parsed game lump with its bytes.
pub struct GameLumps {
    directory: GameLumpDirectory,
    data: Vec<u8>,
    /// Segment offsets are absolute, this is where the lump started
    base: i64,
    static_prop_def: Option<&'static StaticPropDef>,
}

impl GameLumps {
    pub fn new(view: &LumpView, branch: &'static Branch) -> Result<Self> {
        let data = view.read_all()?;
        let directory = GameLumpDirectory::parse(&data)?;
        trace!(
            "{}: {} segments, sentinel {}",
            view.name(),
            directory.segments.len(),
            directory.sentinel.is_some()
        );
        Ok(Self {
            directory,
            data,
            base: view.header().file_ofs as i64,
            static_prop_def: branch.static_props,
        })
    }

    pub fn directory(&self) -> &GameLumpDirectory {
        &self.directory
    }

    /// The payload of segment `k`, decompressed if needed.
    pub fn segment_data(&self, k: usize) -> Result<Vec<u8>> {
        let len = self.directory.segment_len(k)? as usize;
        let segment = self.directory.segments[k];
        let tag = segment.tag();

        let start = segment.file_ofs as i64 - self.base;
        let bytes = usize::try_from(start)
            .ok()
            .and_then(|start| self.data.get(start..start + len))
            .ok_or_else(|| {
                malformed(format!(
                    "segment {tag} at {start}+{len} lies outside the {} byte lump",
                    self.data.len()
                ))
            })?;
        trace!("segment {tag}: {len} bytes at {start}");

        if segment.is_compressed() {
            lzma::decompress(&format!("GAME_LUMP.{tag}"), bytes, segment.file_len as u32)
        } else {
            Ok(bytes.to_vec())
        }
    }

    /// The `sprp` segment, if the map has one.
    pub fn static_props(&self) -> Result<Option<StaticProps>> {
        let Some(k) = self.directory.find("sprp") else {
            return Ok(None);
        };
        let Some(def) = self.static_prop_def else {
            warn!("branch has no static prop layout, skipping sprp");
            return Ok(None);
        };
        let version = self.directory.segments[k].version;
        StaticProps::parse(version, &self.segment_data(k)?, def).map(Some)
    }
}

#[derive(Clone, Debug)]
pub struct StaticProps {
    pub version: u16,
    pub names: Vec<String>,
    pub leaves: Vec<u16>,
    /// Integers between the leaves and the props, the first is always the prop count
    pub preamble: Vec<i32>,
    /// `None` when there is no schema for this version
    pub props: Option<Vec<Record>>,
    /// Prop bytes, kept for versions without a schema
    pub prop_data: Vec<u8>,
}

impl StaticProps {
    pub fn parse(version: u16, bytes: &[u8], def: &StaticPropDef) -> Result<Self> {
        let fail = |e: std::io::Error| malformed(format!("sprp v{version}: {e}"));
        let mut buffer = Cursor::new(bytes);

        let name_count = i32::read(&mut buffer).map_err(fail)?.max(0) as usize;
        ensure_room(&buffer, "names", name_count, STATIC_PROP_NAME_LENGTH)?;
        let mut names = Vec::with_capacity(name_count);
        let mut name = [0u8; STATIC_PROP_NAME_LENGTH];
        for _ in 0..name_count {
            buffer.read_exact(&mut name).map_err(fail)?;
            let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
            names.push(String::from_utf8_lossy(&name[..end]).to_ascii_lowercase());
        }

        let leaves = if def.leaves {
            let leaf_count = i32::read(&mut buffer).map_err(fail)?.max(0) as usize;
            ensure_room(&buffer, "leaves", leaf_count, size_of::<u16>())?;
            u16::read_array(&mut buffer, leaf_count).map_err(fail)?
        } else {
            Vec::new()
        };

        let preamble = i32::read_array(&mut buffer, def.preamble_ints.max(1)).map_err(fail)?;
        let prop_count = preamble[0].max(0) as usize;

        let mut prop_data = Vec::new();
        buffer.read_to_end(&mut prop_data).map_err(fail)?;

        let props = match def.schema(version) {
            Some(schema) => {
                let needed = prop_count
                    .checked_mul(schema.size())
                    .filter(|&needed| needed <= prop_data.len())
                    .ok_or_else(|| {
                        malformed(format!(
                            "sprp v{version}: {prop_count} props of {} bytes, {} remain",
                            schema.size(),
                            prop_data.len()
                        ))
                    })?;
                let data = &prop_data[..needed];
                if prop_data.len() > needed {
                    warn!("sprp v{version}: {} trailing bytes", prop_data.len() - needed);
                }
                Some(
                    data.chunks_exact(schema.size())
                        .map(|chunk| schema.decode(chunk))
                        .collect(),
                )
            }
            None => {
                warn!("no static prop schema for version {version}, keeping raw bytes");
                None
            }
        };

        Ok(Self {
            version,
            names,
            leaves,
            preamble,
            props,
            prop_data,
        })
    }

    pub fn len(&self) -> usize {
        self.preamble.first().map_or(0, |&c| c.max(0) as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Model path of a decoded prop.
    pub fn model_name(&self, prop: &Record) -> Option<&str> {
        let index = prop.get("model_index")?.as_i64()?;
        self.names.get(usize::try_from(index).ok()?).map(String::as_str)
    }
}

#[cfg(test)]
mod gamelump_tests {
    use super::*;
    use crate::{
        bsp::{
            branch::{respawn, valve},
            BspFile,
        },
        test_util::MapBuilder,
    };

    fn entry(id: &[u8; 4], flags: u16, version: u16, ofs: i32, len: i32) -> BSPGameLump {
        BSPGameLump {
            id: *id,
            flags,
            version,
            file_ofs: ofs,
            file_len: len,
        }
    }

    fn directory_bytes(entries: &[BSPGameLump]) -> Vec<u8> {
        let mut bytes = (entries.len() as i32).to_le_bytes().to_vec();
        for e in entries {
            bytes.extend_from_slice(bytemuck::bytes_of(e));
        }
        bytes
    }

    #[test]
    fn tags_and_sentinel() {
        let e = entry(b"prps", 0, 10, 0, 4);
        assert_eq!(e.tag(), "sprp");
        assert!(!e.is_sentinel());
        assert!(entry(&[0; 4], 0, 0, 500, 0).is_sentinel());
    }

    #[test]
    fn lengths_from_offsets() {
        let offsets = [1000, 1100, 1350];
        let dir = GameLumpDirectory::parse(&directory_bytes(&[
            entry(b"prps", 1, 10, offsets[0], 4000),
            entry(b"prpd", 1, 4, offsets[1], 900),
            entry(b"tlpd", 1, 5, offsets[2], 64),
            entry(&[0; 4], 0, 0, 1400, 0),
        ]))
        .unwrap();

        assert_eq!(dir.segments().len(), 3);
        assert_eq!({ dir.sentinel().unwrap().file_ofs }, 1400);
        assert_eq!(dir.segment_len(0).unwrap(), 100);
        assert_eq!(dir.segment_len(1).unwrap(), 250);
        assert_eq!(dir.segment_len(2).unwrap(), 50);
        assert_eq!(dir.find("dprp"), Some(1));
        assert!(dir.segment_len(3).is_err());
    }

    #[test]
    fn missing_sentinel() {
        let bytes = directory_bytes(&[
            entry(b"prps", 1, 10, 1000, 4000),
            entry(b"prpd", 1, 4, 1100, 900),
        ]);
        assert!(matches!(
            GameLumpDirectory::parse(&bytes),
            Err(BspError::MalformedGameLump(_))
        ));

        // uncompressed directories never needed one
        let plain = GameLumpDirectory::parse(&directory_bytes(&[entry(b"prps", 0, 10, 20, 36)])).unwrap();
        assert_eq!(plain.segment_len(0).unwrap(), 36);
        assert!(plain.sentinel().is_none());
    }

    #[test]
    fn truncated_and_backwards() {
        let mut bytes = directory_bytes(&[entry(b"prps", 0, 10, 20, 36)]);
        bytes.truncate(10);
        assert!(GameLumpDirectory::parse(&bytes).is_err());

        let backwards = directory_bytes(&[
            entry(b"prps", 1, 10, 1000, 4000),
            entry(&[0; 4], 0, 0, 900, 0),
        ]);
        assert!(GameLumpDirectory::parse(&backwards).is_err());
    }

    fn name(n: &str) -> Vec<u8> {
        let mut b = n.as_bytes().to_vec();
        b.resize(STATIC_PROP_NAME_LENGTH, 0);
        b
    }

    #[test]
    fn valve_static_props() {
        let schema = &valve::STATIC_PROP_V5;
        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend(name("models/props/crate.mdl"));
        bytes.extend(name("MODELS/PROPS/BARREL.MDL"));
        bytes.extend(3i32.to_le_bytes());
        for leaf in [4u16, 5, 6] {
            bytes.extend(leaf.to_le_bytes());
        }
        bytes.extend(1i32.to_le_bytes());
        let mut prop = vec![0u8; schema.size()];
        prop[24..26].copy_from_slice(&1u16.to_le_bytes());
        bytes.extend(prop);

        let def = valve::ORANGE_BOX.static_props.unwrap();
        let props = StaticProps::parse(5, &bytes, def).unwrap();
        assert_eq!(props.names.len(), 2);
        assert_eq!(props.leaves, vec![4, 5, 6]);
        assert_eq!(props.len(), 1);
        let decoded = props.props.as_ref().unwrap();
        assert_eq!(props.model_name(&decoded[0]), Some("models/props/barrel.mdl"));

        // no schema for v9, bytes are kept
        let raw = StaticProps::parse(9, &bytes, def).unwrap();
        assert!(raw.props.is_none());
        assert_eq!(raw.prop_data.len(), schema.size());
    }

    #[test]
    fn respawn_static_props() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend(name("models/foo.mdl"));
        for i in [2i32, 7, 9] {
            bytes.extend(i.to_le_bytes());
        }
        bytes.extend(vec![0u8; 2 * respawn::STATIC_PROP_V13.size()]);

        let def = respawn::TITANFALL_2.static_props.unwrap();
        let props = StaticProps::parse(13, &bytes, def).unwrap();
        assert!(props.leaves.is_empty());
        assert_eq!(props.preamble, vec![2, 7, 9]);
        assert_eq!(props.props.unwrap().len(), 2);

        bytes.truncate(bytes.len() - 1);
        assert!(StaticProps::parse(13, &bytes, def).is_err());
    }

    #[test]
    fn counts_larger_than_the_data() {
        let bytes = i32::MAX.to_le_bytes();
        assert!(matches!(
            GameLumpDirectory::parse(&bytes),
            Err(BspError::MalformedGameLump(_))
        ));
        let mut short = 3i32.to_le_bytes().to_vec();
        short.extend(directory_bytes(&[entry(b"prps", 0, 10, 20, 36)]).split_off(4));
        assert!(GameLumpDirectory::parse(&short).is_err());

        let def = valve::ORANGE_BOX.static_props.unwrap();
        assert!(matches!(
            StaticProps::parse(10, &bytes, def),
            Err(BspError::MalformedGameLump(_))
        ));

        let mut leaves = 0i32.to_le_bytes().to_vec();
        leaves.extend(i32::MAX.to_le_bytes());
        assert!(matches!(
            StaticProps::parse(5, &leaves, def),
            Err(BspError::MalformedGameLump(_))
        ));

        let mut props = 0i32.to_le_bytes().to_vec();
        props.extend(0i32.to_le_bytes());
        props.extend(i32::MAX.to_le_bytes());
        props.extend(vec![0u8; valve::STATIC_PROP_V5.size()]);
        assert!(matches!(
            StaticProps::parse(5, &props, def),
            Err(BspError::MalformedGameLump(_))
        ));
    }

    fn sprp_payload() -> Vec<u8> {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend(name("models/props/crate.mdl"));
        bytes.extend(0i32.to_le_bytes());
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(vec![0u8; valve::STATIC_PROP_V5.size()]);
        bytes
    }

    /// A valve map whose only lump is a game lump with one compressed `sprp` segment.
    fn compressed_map(dir: &std::path::Path, stored: Vec<u8>, file_len: i32) -> BspFile {
        // first lump written, so it starts right after the directory and revision
        let base = 8 + 64 * 16 + 4;
        let segment_ofs = base + 4 + 2 * size_of::<BSPGameLump>() as i32;
        let mut lump = directory_bytes(&[
            entry(b"prps", GAMELUMP_COMPRESSED, 5, segment_ofs, file_len),
            entry(&[0; 4], 0, 0, segment_ofs + stored.len() as i32, 0),
        ]);
        lump.extend(stored);
        let path = MapBuilder::valve().lump(35, 0, lump).write(dir, "packed.bsp");
        BspFile::open(path).unwrap()
    }

    #[test]
    fn compressed_segment_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let payload = sprp_payload();
        let stored = lzma::compress(&payload).unwrap();
        let stored_len = stored.len() as u32;
        let bsp = compressed_map(dir.path(), stored, payload.len() as i32);

        let game_lumps = bsp.game_lumps().unwrap();
        let directory = game_lumps.directory();
        assert_eq!(directory.segments().len(), 1);
        assert!(directory.sentinel().is_some());
        assert_eq!(directory.segment_len(0).unwrap(), stored_len);
        assert_eq!(game_lumps.segment_data(0).unwrap(), payload);

        let props = game_lumps.static_props().unwrap().unwrap();
        assert_eq!(props.names, ["models/props/crate.mdl"]);
        assert_eq!(props.props.unwrap().len(), 1);
    }

    #[test]
    fn corrupt_segment_names_its_tag() {
        let payload = sprp_payload();
        let stored = lzma::compress(&payload).unwrap();

        let truncated = stored[..lzma::LZMA_HEADER_LEN + 2].to_vec();
        // a stream cut short, then a directory size the LZMA header disagrees with
        for (stored, file_len) in [
            (truncated, payload.len() as i32),
            (stored, payload.len() as i32 + 1),
        ] {
            let dir = tempfile::tempdir().unwrap();
            let bsp = compressed_map(dir.path(), stored, file_len);
            match bsp.game_lumps().unwrap().segment_data(0) {
                Err(BspError::Decompression { lump, .. }) => assert_eq!(lump, "GAME_LUMP.sprp"),
                other => panic!("expected a decompression error, got {other:?}"),
            }
        }
    }
}
