use std::{
    fmt,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use super::{branch::Branch, lump::BSPLump};
use crate::{
    binaries::BinaryData,
    error::{BspError, Result},
};

/// The file signature: magic and format version, enough to pick a [`Branch`].
pub fn read_signature<R: Read + Seek>(buffer: &mut R) -> Result<([u8; 4], u32)> {
    let mut ident = [0; 4];
    buffer.seek(SeekFrom::Start(0))?;
    buffer
        .read_exact(&mut ident)
        .map_err(BspError::TruncatedDirectory)?;
    let version = u32::read(buffer).map_err(BspError::TruncatedDirectory)?;
    Ok((ident, version))
}

/// `dheader_t`, decoded with a branch's layout.
#[derive(Clone)]
pub struct BspHeader {
    pub ident: [u8; 4],
    pub version: u32,
    /// the map's revision (iteration, version) number
    pub revision: u32,
    /// One entry per id in `0..branch.lump_count`, empty lumps included
    pub lumps: Vec<BSPLump>,
}

impl fmt::Debug for BspHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("dheader_t")
            .field("ident", &String::from_utf8_lossy(&self.ident))
            .field("version", &self.version)
            .field("mapRevision", &self.revision)
            .field("lumps", &self.lumps.len())
            .finish()
    }
}

impl BspHeader {
    pub fn read<R: Read + Seek>(buffer: &mut R, branch: &Branch, path: &Path) -> Result<Self> {
        let mut ident = [0; 4];
        buffer.seek(SeekFrom::Start(0))?;
        buffer
            .read_exact(&mut ident)
            .map_err(BspError::TruncatedDirectory)?;
        if ident != branch.magic {
            return Err(BspError::BadMagic {
                path: path.to_path_buf(),
                expected: branch.magic,
                found: ident,
            });
        }

        let mut read_u32_at = |offset: u64| -> Result<u32> {
            buffer.seek(SeekFrom::Start(offset))?;
            u32::read(buffer).map_err(BspError::TruncatedDirectory)
        };
        let version = read_u32_at(branch.version_offset)?;
        let revision = read_u32_at(branch.revision_offset)?;

        buffer.seek(SeekFrom::Start(branch.header_offset))?;
        let lumps = BSPLump::read_array(buffer, branch.lump_count)
            .map_err(BspError::TruncatedDirectory)?;

        Ok(Self {
            ident,
            version,
            revision,
            lumps,
        })
    }

    pub fn lump(&self, id: u32) -> Option<&BSPLump> {
        self.lumps.get(id as usize)
    }
}
