//! Small synthetic maps for tests.

use std::path::{Path, PathBuf};

use crate::bsp::{
    consts::{RESPAWN_HEADER_LUMPS, VALVE_HEADER_LUMPS},
    lump::BSPLump,
    lzma,
};

pub fn pod_bytes<T: bytemuck::Pod>(items: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(items).to_vec()
}

struct Entry {
    id: u32,
    version: u32,
    stored: Vec<u8>,
    uncompressed_len: u32,
    /// Directory length when it should not match what is stored
    claimed_len: Option<u32>,
}

/// Writes a map with the directory layout of either engine family.
pub struct MapBuilder {
    magic: [u8; 4],
    version: u32,
    revision: u32,
    lump_count: usize,
    respawn: bool,
    entries: Vec<Entry>,
}

impl MapBuilder {
    pub fn valve() -> Self {
        Self {
            magic: *b"VBSP",
            version: 20,
            revision: 1,
            lump_count: VALVE_HEADER_LUMPS,
            respawn: false,
            entries: Vec::new(),
        }
    }

    pub fn respawn(version: u32) -> Self {
        Self {
            magic: *b"rBSP",
            version,
            revision: 1,
            lump_count: RESPAWN_HEADER_LUMPS,
            respawn: true,
            entries: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn lump(mut self, id: u32, version: u32, bytes: Vec<u8>) -> Self {
        self.entries.push(Entry {
            id,
            version,
            stored: bytes,
            uncompressed_len: 0,
            claimed_len: None,
        });
        self
    }

    pub fn compressed_lump(mut self, id: u32, version: u32, bytes: Vec<u8>) -> Self {
        self.entries.push(Entry {
            id,
            version,
            stored: lzma::compress(&bytes).unwrap(),
            uncompressed_len: bytes.len() as u32,
            claimed_len: None,
        });
        self
    }

    /// A directory entry claiming `len` bytes with nothing stored behind it.
    pub fn dangling_lump(mut self, id: u32, version: u32, len: u32) -> Self {
        self.entries.push(Entry {
            id,
            version,
            stored: Vec::new(),
            uncompressed_len: 0,
            claimed_len: Some(len),
        });
        self
    }

    fn directory_start(&self) -> usize {
        if self.respawn {
            16
        } else {
            8
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let directory_end = self.directory_start() + self.lump_count * 16;
        let data_start = if self.respawn {
            directory_end
        } else {
            directory_end + 4
        };

        let mut directory = vec![BSPLump::default(); self.lump_count];
        let mut data = Vec::new();
        for entry in &self.entries {
            directory[entry.id as usize] = BSPLump {
                file_ofs: (data_start + data.len()) as u32,
                file_len: entry.claimed_len.unwrap_or(entry.stored.len() as u32),
                version: entry.version,
                uncompressed_len: entry.uncompressed_len,
            };
            data.extend_from_slice(&entry.stored);
            while data.len() % 4 != 0 {
                data.push(0);
            }
        }

        let mut bytes = self.magic.to_vec();
        bytes.extend(self.version.to_le_bytes());
        if self.respawn {
            bytes.extend(self.revision.to_le_bytes());
            bytes.extend((self.lump_count as u32 - 1).to_le_bytes());
        }
        bytes.extend(pod_bytes(&directory));
        if !self.respawn {
            bytes.extend(self.revision.to_le_bytes());
        }
        bytes.extend(data);
        bytes
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.bytes()).unwrap();
        path
    }
}
