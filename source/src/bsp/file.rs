use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use ahash::AHashMap;
use log::{debug, warn};

use super::{
    branch::{Branch, BranchRegistry},
    consts::TEXTURE_NAME_LENGTH,
    entities::{self, EntityPartition},
    gamelump::GameLumps,
    header::{self, BspHeader},
    lump::{BSPLump, Lump, LumpView, RecordLump, SharedReader, TypedLump},
    textures::{BSPTexData, BSPTexDataStringTable},
};
use crate::{
    config::OpenOptions,
    error::{BspError, Result},
};

/// An open map and a view of every lump it has.
#[derive(Debug)]
pub struct BspFile {
    path: PathBuf,
    branch: &'static Branch,
    header: BspHeader,
    file: SharedReader,
    file_len: u64,
    lumps: AHashMap<String, LumpView>,
    partitions: Vec<EntityPartition>,
    model_count: Option<u32>,
    loading_errors: Vec<(String, BspError)>,
}

impl BspFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        Self::open_in(path, options, &BranchRegistry::default())
    }

    pub fn open_in(
        path: impl AsRef<Path>,
        options: &OpenOptions,
        registry: &BranchRegistry,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut buffer = BufReader::new(file);

        let (magic, version) = header::read_signature(&mut buffer)?;
        let branch = registry.resolve(options.branch.as_deref(), magic, version)?;
        let header = BspHeader::read(&mut buffer, branch, path)?;
        debug!("{}: {header:?} as {}", path.display(), branch.name);

        let mut bsp = Self {
            path: path.to_path_buf(),
            branch,
            header,
            file: Arc::new(Mutex::new(buffer)),
            file_len,
            lumps: AHashMap::new(),
            partitions: Vec::new(),
            model_count: None,
            loading_errors: Vec::new(),
        };

        for id in 0..branch.lump_count as u32 {
            let name = branch.lump_name(id);
            let external = options
                .external_lumps
                .then(|| bsp.external_lump_path(id))
                .flatten();
            if external.is_none() && { bsp.header.lumps[id as usize].file_len } == 0 {
                continue;
            }
            let result = bsp.build_view(id, name.clone(), external.as_deref(), true);
            bsp.keep(name, result, options.strict)?;
        }

        if options.entity_partitions {
            for partition in branch.entity_partitions {
                let path = bsp.partition_path(partition);
                if !path.exists() {
                    continue;
                }
                let result = EntityPartition::open(partition, &path);
                match result {
                    Ok(p) => bsp.partitions.push(p),
                    Err(e) if options.strict => return Err(e),
                    Err(e) => bsp.record_error(format!("{partition}.ent"), e),
                }
            }
            bsp.model_count = entities::check_model_counts(&bsp.partitions);
        }

        Ok(bsp)
    }

    fn keep(&mut self, name: String, result: Result<LumpView>, strict: bool) -> Result<()> {
        match result {
            Ok(view) => {
                self.lumps.insert(name, view);
                Ok(())
            }
            Err(e) if strict => Err(e),
            Err(e) => {
                self.record_error(name, e);
                Ok(())
            }
        }
    }

    fn record_error(&mut self, name: String, error: BspError) {
        warn!("{}: skipping {name}: {error}", self.path.display());
        self.loading_errors.push((name, error));
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `<map>.bsp.<id>.bsp_lump`, if the branch uses them and the file exists.
    fn external_lump_path(&self, id: u32) -> Option<PathBuf> {
        let ext = self.branch.external_lump_ext?;
        let path = self
            .path
            .with_file_name(format!("{}.{id:04x}.{ext}", self.file_name()));
        path.exists().then_some(path)
    }

    fn partition_path(&self, partition: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!("{stem}_{partition}.ent"))
    }

    fn build_view(
        &self,
        id: u32,
        name: String,
        external: Option<&Path>,
        typed: bool,
    ) -> Result<LumpView> {
        let descriptor = self.header.lumps[id as usize];
        let lump_version = descriptor.version;
        let schema = if typed {
            self.branch.schema(id, self.header.version, lump_version)
        } else {
            None
        };
        if typed && schema.is_none() {
            if let Some(def) = self.branch.lump(id).filter(|d| !d.schemas.is_empty()) {
                warn!(
                    "{}: no schema for lump version {lump_version} in {} v{}, reading raw",
                    def.name, self.branch.name, self.header.version
                );
            }
        }

        if let Some(path) = external {
            return LumpView::external(id, name, descriptor, path, schema);
        }
        if descriptor.end() > self.file_len {
            return Err(BspError::LumpOutOfBounds {
                lump: name,
                end: descriptor.end(),
                file_len: self.file_len,
            });
        }
        LumpView::embedded(id, name, descriptor, self.file.clone(), schema)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch(&self) -> &'static Branch {
        self.branch
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn revision(&self) -> u32 {
        self.header.revision
    }

    pub fn header(&self) -> &BspHeader {
        &self.header
    }

    pub fn lump(&self, name: &str) -> Result<&LumpView> {
        self.lumps
            .get(name)
            .ok_or_else(|| BspError::MissingLump(name.to_string()))
    }

    pub fn has_lump(&self, name: &str) -> bool {
        self.lumps.contains_key(name)
    }

    /// Every present lump, ordered by id.
    pub fn lumps(&self) -> Vec<&LumpView> {
        let mut lumps: Vec<_> = self.lumps.values().collect();
        lumps.sort_by_key(|l| l.id());
        lumps
    }

    /// A fresh raw view of any directory slot, named or not.
    pub fn lump_by_id(&self, id: u32) -> Result<LumpView> {
        if id as usize >= self.header.lumps.len() {
            return Err(BspError::IndexOutOfRange {
                index: id as isize,
                len: self.header.lumps.len(),
            });
        }
        let external = self.external_lump_path(id);
        self.build_view(id, self.branch.lump_name(id), external.as_deref(), false)
    }

    /// Decoded records of a typed lump.
    pub fn records(&self, name: &str) -> Result<RecordLump<'_>> {
        self.lump(name)?.records()
    }

    pub fn typed<T: Lump>(&self) -> Result<TypedLump<'_, T>> {
        let lump = self.lump(T::lump_name())?.typed::<T>()?;
        if lump.len() > T::max() {
            warn!(
                "{} holds {} records, the engine allows {}",
                T::lump_name(),
                lump.len(),
                T::max()
            );
        }
        Ok(lump)
    }

    pub fn game_lumps(&self) -> Result<GameLumps> {
        GameLumps::new(self.lump("GAME_LUMP")?, self.branch)
    }

    pub fn entity_partitions(&self) -> &[EntityPartition] {
        &self.partitions
    }

    /// Model count shared by every entity partition.
    pub fn partition_model_count(&self) -> Option<u32> {
        self.model_count
    }

    /// The ENTITIES lump followed by the body of each partition file.
    pub fn entities_text(&self) -> Result<String> {
        let mut text = match self.lumps.get("ENTITIES") {
            Some(view) => {
                let bytes = view.read_all()?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
            None => String::new(),
        };
        for partition in &self.partitions {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&partition.text()?);
        }
        Ok(text)
    }

    /// Material name of a texdata entry.
    pub fn texture_name(&self, tex_data: usize) -> Result<String> {
        let tex_data = self.typed::<BSPTexData>()?.at(tex_data)?;
        let table = self.typed::<BSPTexDataStringTable>()?;
        let name_id = tex_data.name_string_table_id;
        if name_id < 0 {
            return Err(BspError::IndexOutOfRange {
                index: name_id as isize,
                len: table.len(),
            });
        }
        let offset = table.get(name_id as isize)?.index;

        let strings = self.lump("TEXDATA_STRING_DATA")?.raw();
        let start = offset as isize;
        let stop = (start + TEXTURE_NAME_LENGTH as isize).min(strings.len() as isize);
        if offset < 0 || start >= stop {
            return Err(BspError::IndexOutOfRange {
                index: start,
                len: strings.len(),
            });
        }
        let bytes = strings.slice(start..stop)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Lumps that failed to load when opened with `strict` off.
    pub fn loading_errors(&self) -> &[(String, BspError)] {
        &self.loading_errors
    }

    /// Directory entry of a named lump, present or not.
    pub fn descriptor(&self, name: &str) -> Option<BSPLump> {
        let def = self.branch.lump_by_name(name)?;
        self.header.lump(def.id).copied()
    }
}
