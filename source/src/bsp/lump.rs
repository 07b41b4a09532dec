//! Lazy views over one lump.
//!
//! A [`LumpView`] never holds decoded records. Embedded lumps seek into the shared map handle on
//! every access, external lumps own their own handle, and compressed lumps are inflated once when
//! the view is built and then read from memory.

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    marker::PhantomData,
    mem::size_of,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::debug;

use super::{
    lzma,
    schema::{Record, RecordSchema, Value},
    slice::{normalize_index, LumpRange},
};
use crate::{
    binaries::BinaryData,
    error::{BspError, Result},
};

/// A lump whose records map directly onto a Rust type.
pub trait Lump: bytemuck::Pod {
    /// Engine limit on the record count
    fn max() -> usize;
    fn lump_name() -> &'static str;
    /// The schema a branch must resolve for this type to be read
    fn schema() -> &'static RecordSchema;
}

pub(crate) type SharedReader = Arc<Mutex<BufReader<File>>>;

// https://developer.valvesoftware.com/wiki/BSP_(Source)
#[repr(C, packed)]
#[derive(Debug, Default, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPLump {
    pub file_ofs: u32, // offset into file (bytes)
    pub file_len: u32, // length of lump (bytes)
    pub version: u32,  // lump format version
    /// Zero for plain lumps, otherwise the decompressed length of an LZMA lump
    pub uncompressed_len: u32,
}

impl BinaryData for BSPLump {}

impl BSPLump {
    pub fn is_compressed(&self) -> bool {
        let uncompressed_len = self.uncompressed_len;
        uncompressed_len != 0
    }

    pub fn end(&self) -> u64 {
        self.file_ofs as u64 + self.file_len as u64
    }
}

#[derive(Debug)]
enum LumpSource {
    Embedded { file: SharedReader, offset: u64 },
    Compressed { data: Box<[u8]> },
    External { file: Mutex<BufReader<File>>, path: PathBuf },
}

fn seek_read(file: &mut BufReader<File>, pos: u64, buf: &mut [u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(pos))?;
    file.read_exact(buf)
}

impl LumpSource {
    fn read_at(&self, pos: u64, buf: &mut [u8]) -> io::Result<()> {
        match self {
            LumpSource::Embedded { file, offset } => {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                seek_read(&mut file, offset + pos, buf)
            }
            LumpSource::Compressed { data } => {
                let start = pos as usize;
                let src = data.get(start..start + buf.len()).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::UnexpectedEof, "read past decompressed lump")
                })?;
                buf.copy_from_slice(src);
                Ok(())
            }
            LumpSource::External { file, .. } => {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                seek_read(&mut file, pos, buf)
            }
        }
    }
}

/// One lump of an open map.
#[derive(Debug)]
pub struct LumpView {
    id: u32,
    name: String,
    header: BSPLump,
    source: LumpSource,
    len: u64,
    schema: Option<&'static RecordSchema>,
}

impl LumpView {
    /// A lump stored inside the map, inflating it now if the directory marks it compressed.
    pub(crate) fn embedded(
        id: u32,
        name: String,
        header: BSPLump,
        file: SharedReader,
        schema: Option<&'static RecordSchema>,
    ) -> Result<Self> {
        let offset = header.file_ofs as u64;
        let (source, len) = if header.is_compressed() {
            let mut stored = vec![0; header.file_len as usize];
            {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                seek_read(&mut file, offset, &mut stored)?;
            }
            let data = lzma::decompress(&name, &stored, header.uncompressed_len)?;
            let len = data.len() as u64;
            (
                LumpSource::Compressed {
                    data: data.into_boxed_slice(),
                },
                len,
            )
        } else {
            (LumpSource::Embedded { file, offset }, header.file_len as u64)
        };
        Self::checked(id, name, header, source, len, schema)
    }

    /// A `.bsp_lump` companion file, read from offset 0.
    pub(crate) fn external(
        id: u32,
        name: String,
        header: BSPLump,
        path: &Path,
        schema: Option<&'static RecordSchema>,
    ) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let source = LumpSource::External {
            file: Mutex::new(BufReader::new(file)),
            path: path.to_path_buf(),
        };
        Self::checked(id, name, header, source, len, schema)
    }

    fn checked(
        id: u32,
        name: String,
        header: BSPLump,
        source: LumpSource,
        len: u64,
        schema: Option<&'static RecordSchema>,
    ) -> Result<Self> {
        if let Some(schema) = schema {
            if len % schema.size() as u64 != 0 {
                return Err(BspError::SchemaMismatch {
                    lump: name,
                    schema: schema.name,
                    length: len,
                    size: schema.size(),
                });
            }
        }
        debug!(
            "{name}: {len} bytes, {}, {}",
            match &source {
                LumpSource::Embedded { .. } => "embedded",
                LumpSource::Compressed { .. } => "compressed",
                LumpSource::External { .. } => "external",
            },
            schema.map_or("raw", |s| s.name)
        );
        Ok(Self {
            id,
            name,
            header,
            source,
            len,
            schema,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory entry this view was built from.
    pub fn header(&self) -> BSPLump {
        self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Length in bytes, after decompression.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn schema(&self) -> Option<&'static RecordSchema> {
        self.schema
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.source, LumpSource::Compressed { .. })
    }

    pub fn external_path(&self) -> Option<&Path> {
        match &self.source {
            LumpSource::External { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Records for typed lumps, bytes otherwise.
    pub fn count(&self) -> usize {
        match self.schema {
            Some(schema) => (self.len / schema.size() as u64) as usize,
            None => self.len as usize,
        }
    }

    pub(crate) fn read_at(&self, pos: u64, buf: &mut [u8]) -> Result<()> {
        Ok(self.source.read_at(pos, buf)?)
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut data = vec![0; self.len as usize];
        self.read_at(0, &mut data)?;
        Ok(data)
    }

    pub fn raw(&self) -> RawLump<'_> {
        LumpEntries::new(self, Bytes)
    }

    pub fn records(&self) -> Result<RecordLump<'_>> {
        match self.schema {
            Some(schema) => Ok(LumpEntries::new(self, schema)),
            None => Err(BspError::Untyped(self.name.clone())),
        }
    }

    /// Records as `T`, provided the branch resolved `T`'s schema for this lump.
    pub fn typed<T: Lump>(&self) -> Result<TypedLump<'_, T>> {
        match self.schema {
            Some(schema) if std::ptr::eq(schema, T::schema()) => {
                Ok(LumpEntries::new(self, PodDecoder(PhantomData)))
            }
            Some(schema) => Err(BspError::RecordTypeMismatch {
                lump: self.name.clone(),
                expected: T::schema().name,
                found: schema.name,
            }),
            None => Err(BspError::Untyped(self.name.clone())),
        }
    }
}

/// Turns `size()` bytes into one element.
pub trait Decode: Copy {
    type Item;
    fn size(&self) -> usize;
    fn decode(&self, bytes: &[u8]) -> Self::Item;
}

#[derive(Copy, Clone, Debug)]
pub struct Bytes;

impl Decode for Bytes {
    type Item = u8;
    fn size(&self) -> usize {
        1
    }
    fn decode(&self, bytes: &[u8]) -> u8 {
        bytes[0]
    }
}

impl Decode for &'static RecordSchema {
    type Item = Record;
    fn size(&self) -> usize {
        RecordSchema::size(*self)
    }
    fn decode(&self, bytes: &[u8]) -> Record {
        RecordSchema::decode(*self, bytes)
    }
}

#[derive(Debug)]
pub struct PodDecoder<T>(PhantomData<T>);

impl<T> Clone for PodDecoder<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PodDecoder<T> {}

impl<T: bytemuck::Pod> Decode for PodDecoder<T> {
    type Item = T;
    fn size(&self) -> usize {
        size_of::<T>()
    }
    fn decode(&self, bytes: &[u8]) -> T {
        bytemuck::pod_read_unaligned(&bytes[..size_of::<T>()])
    }
}

/// List-like access to a lump through a [`Decode`]r.
///
/// Nothing is cached, every call goes back to the view's source.
pub struct LumpEntries<'a, D> {
    view: &'a LumpView,
    decoder: D,
    count: usize,
}

pub type RawLump<'a> = LumpEntries<'a, Bytes>;
pub type RecordLump<'a> = LumpEntries<'a, &'static RecordSchema>;
pub type TypedLump<'a, T> = LumpEntries<'a, PodDecoder<T>>;

impl<'a, D: Decode> LumpEntries<'a, D> {
    fn new(view: &'a LumpView, decoder: D) -> Self {
        let count = (view.len / decoder.size() as u64) as usize;
        Self {
            view,
            decoder,
            count,
        }
    }

    pub fn view(&self) -> &'a LumpView {
        self.view
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn read_index(&self, index: usize) -> Result<D::Item> {
        let size = self.decoder.size();
        let mut buf = vec![0; size];
        self.view.read_at((index * size) as u64, &mut buf)?;
        Ok(self.decoder.decode(&buf))
    }

    /// One element, negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<D::Item> {
        self.read_index(normalize_index(index, self.count)?)
    }

    /// One element by its position from the start.
    pub fn at(&self, index: usize) -> Result<D::Item> {
        if index >= self.count {
            return Err(BspError::IndexOutOfRange {
                index: isize::try_from(index).unwrap_or(isize::MAX),
                len: self.count,
            });
        }
        self.read_index(index)
    }

    /// Elements selected by a `start:stop:step` range.
    pub fn slice(&self, range: impl Into<LumpRange>) -> Result<Vec<D::Item>> {
        let window = range.into().window(self.count)?;
        if !window.is_contiguous() {
            return window
                .indices()
                .into_iter()
                .map(|i| self.read_index(i))
                .collect();
        }

        let size = self.decoder.size();
        let mut bytes = vec![0; (window.stop - window.start) * size];
        if !bytes.is_empty() {
            self.view.read_at((window.start * size) as u64, &mut bytes)?;
        }
        let mut items: Vec<_> = bytes
            .chunks_exact(size)
            .map(|chunk| self.decoder.decode(chunk))
            .collect();
        if window.step < 0 {
            items.reverse();
        }
        Ok(items)
    }

    pub fn to_vec(&self) -> Result<Vec<D::Item>> {
        self.slice(..)
    }

    /// Reads one element per step.
    pub fn iter(&self) -> impl Iterator<Item = Result<D::Item>> + '_ {
        (0..self.count).map(move |i| self.read_index(i))
    }
}

impl RecordLump<'_> {
    /// Linear scan for records whose fields equal the given values.
    pub fn find(&self, predicates: &[(&str, Value)]) -> Result<Vec<Record>> {
        Ok(self
            .to_vec()?
            .into_iter()
            .filter(|r| r.matches(predicates))
            .collect())
    }
}
