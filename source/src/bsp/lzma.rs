//! Valve's LZMA container: a 17-byte header followed by a raw LZMA1 stream.
//!
//! The header stores the 5 property bytes of an `.lzma` file but neither the 8 byte size nor any
//! end marker, so the decoder is driven by the declared decompressed size instead.

use std::io::{self, BufReader, Read};

use log::debug;
use lzma_rs::{compress, decompress};

use crate::{
    binaries::BinaryData,
    error::{BspError, Result},
};

pub const LZMA_ID: [u8; 4] = *b"LZMA";
pub const LZMA_HEADER_LEN: usize = std::mem::size_of::<LzmaHeader>();

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LzmaHeader {
    pub id: [u8; 4],
    pub actual_size: u32,
    pub lzma_size: u32,
    pub properties: [u8; 5],
}

impl BinaryData for LzmaHeader {}

/// Decompress one segment, checking it against the size the owning directory declared.
///
/// `lump` only names the segment in errors.
pub fn decompress(lump: &str, data: &[u8], expected_size: u32) -> Result<Vec<u8>> {
    let fail = |reason: String| BspError::Decompression {
        lump: lump.to_string(),
        reason,
    };

    let header = LzmaHeader::from_bytes(data).map_err(|e| fail(format!("header: {e}")))?;
    if header.id != LZMA_ID {
        return Err(fail(format!("bad magic {:?}", header.id)));
    }
    let actual_size = header.actual_size;
    if actual_size != expected_size {
        return Err(fail(format!(
            "header declares {actual_size} bytes, directory declares {expected_size}"
        )));
    }
    let stream = &data[LZMA_HEADER_LEN..];
    let lzma_size = header.lzma_size;
    if lzma_size as usize != stream.len() {
        debug!(
            "{lump}: header claims {lzma_size} compressed bytes, segment holds {}",
            stream.len()
        );
    }

    let properties = header.properties;
    let mut input = BufReader::new(io::Cursor::new(properties).chain(stream));
    let mut output = Vec::with_capacity(actual_size as usize);
    let options = decompress::Options {
        unpacked_size: decompress::UnpackedSize::UseProvided(Some(actual_size as u64)),
        memlimit: None,
        allow_incomplete: false,
    };
    lzma_rs::lzma_decompress_with_options(&mut input, &mut output, &options)
        .map_err(|e| fail(e.to_string()))?;

    if output.len() == actual_size as usize + 1 {
        output.truncate(actual_size as usize);
    }
    if output.len() != actual_size as usize {
        return Err(fail(format!(
            "produced {} bytes, expected {actual_size}",
            output.len()
        )));
    }
    debug!("{lump}: decompressed {} -> {actual_size} bytes", data.len());
    Ok(output)
}

/// Pack `data` into the same container [`decompress`] reads.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut stream = Vec::new();
    let options = compress::Options {
        unpacked_size: compress::UnpackedSize::SkipWritingToHeader,
    };
    lzma_rs::lzma_compress_with_options(&mut io::Cursor::new(data), &mut stream, &options)?;

    let (props, body) = stream.split_at(5);
    let header = LzmaHeader {
        id: LZMA_ID,
        actual_size: data.len() as u32,
        lzma_size: body.len() as u32,
        properties: [props[0], props[1], props[2], props[3], props[4]],
    };
    let mut out = Vec::with_capacity(LZMA_HEADER_LEN + body.len());
    out.extend_from_slice(bytemuck::bytes_of(&header));
    out.extend_from_slice(body);
    Ok(out)
}
