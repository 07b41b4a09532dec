use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors produced while opening a map or reading its lumps.
#[derive(Error, Debug)]
pub enum BspError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{path}: expected magic {expected:?}, found {found:?}")]
    BadMagic {
        path: PathBuf,
        expected: [u8; 4],
        found: [u8; 4],
    },

    #[error("lump directory is truncated: {0}")]
    TruncatedDirectory(io::Error),

    #[error("unrecognised bsp branch: {0}")]
    UnknownBranch(String),

    #[error("{lump}: {length} bytes does not divide into {size} byte {schema} records")]
    SchemaMismatch {
        lump: String,
        schema: &'static str,
        length: u64,
        size: usize,
    },

    #[error("{lump}: decompression failed: {reason}")]
    Decompression { lump: String, reason: String },

    #[error("{lump}: lump ends at byte {end} but the file is only {file_len} bytes")]
    LumpOutOfBounds {
        lump: String,
        end: u64,
        file_len: u64,
    },

    #[error("index {index} out of range for lump of length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("slice step cannot be zero")]
    ZeroStep,

    #[error("lump {0} is not present")]
    MissingLump(String),

    #[error("lump {0} has no record schema")]
    Untyped(String),

    #[error("lump {lump} holds {found} records, not {expected}")]
    RecordTypeMismatch {
        lump: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("malformed game lump directory: {0}")]
    MalformedGameLump(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("invalid config: {0}")]
    Config(String),
}

impl BspError {
    /// Errors that make the whole file unusable, as opposed to one lump or one face.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BspError::BadMagic { .. } | BspError::TruncatedDirectory(_) | BspError::UnknownBranch(_)
        )
    }
}

/// Per-face failures while rebuilding geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("face {face} has {corners} corners, displacements need exactly 4 (t-junction?)")]
    CornerCount { face: usize, corners: usize },

    #[error("face {0} is not a displacement")]
    NotADisplacement(usize),

    #[error("face {face} names displacement {disp}, which is not in the DISPINFO lump")]
    MissingDispInfo { face: usize, disp: i16 },

    #[error("displacement power {0} is outside the supported range")]
    InvalidPower(u32),

    #[error("displacement {disp} needs vertices {start}..{end} but the pool holds {len}")]
    DisplacementVertsOutOfRange {
        disp: usize,
        start: usize,
        end: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, BspError>;
