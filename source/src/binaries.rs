use std::io::{self, Read};

/// Plain little-endian structures that can be pulled straight off a reader.
pub trait BinaryData: bytemuck::Pod {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self> {
        let mut header = Self::zeroed();
        buffer.read_exact(bytemuck::bytes_of_mut(&mut header))?;
        Ok(header)
    }

    fn read_array<R: Read>(buffer: &mut R, count: usize) -> io::Result<Vec<Self>> {
        let mut table = vec![Self::zeroed(); count];
        buffer.read_exact(bytemuck::cast_slice_mut(&mut table))?;
        Ok(table)
    }

    /// Decode from the front of `bytes`, which may be unaligned.
    fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        let size = std::mem::size_of::<Self>();
        match bytes.get(..size) {
            Some(b) => Ok(bytemuck::pod_read_unaligned(b)),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("need {size} bytes, have {}", bytes.len()),
            )),
        }
    }
}

impl BinaryData for i32 {}
impl BinaryData for u32 {}
impl BinaryData for u16 {}
