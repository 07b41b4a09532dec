//! Per-engine descriptions of the map format.
//!
//! A [`Branch`] names an engine family, says where its lump directory lives and maps lump ids to
//! names and per-version record schemas. Lumps (or versions) without a schema are read as raw
//! bytes. Branches are plain statics, so supporting another game is a matter of writing a table
//! and registering it.

macro_rules! lump {
    ($id:expr, $name:expr) => {
        LumpDef {
            id: $id,
            name: $name,
            schemas: &[],
        }
    };
    ($id:expr, $name:expr, $($version:expr => $schema:expr),+) => {
        LumpDef {
            id: $id,
            name: $name,
            schemas: &[$(($version, &$schema)),+],
        }
    };
}

pub mod respawn;
pub mod valve;

use log::warn;

use super::schema::RecordSchema;
use crate::error::{BspError, Result};

/// One named slot of a branch's lump directory.
#[derive(Debug)]
pub struct LumpDef {
    pub id: u32,
    pub name: &'static str,
    /// Record schema per lump version
    pub schemas: &'static [(u32, &'static RecordSchema)],
}

impl LumpDef {
    pub fn schema(&self, version: u32) -> Option<&'static RecordSchema> {
        self.schemas
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, s)| *s)
    }
}

/// Layout of the static prop game lump in a branch.
#[derive(Debug)]
pub struct StaticPropDef {
    /// Valve stores a leaf list between the names and the props
    pub leaves: bool,
    /// Respawn stores `count, unknown, unknown` before the props
    pub preamble_ints: usize,
    pub schemas: &'static [(u16, &'static RecordSchema)],
}

impl StaticPropDef {
    pub fn schema(&self, version: u16) -> Option<&'static RecordSchema> {
        self.schemas
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, s)| *s)
    }
}

#[derive(Debug)]
pub struct Branch {
    pub name: &'static str,
    pub magic: [u8; 4],
    /// Format versions the schema tables were written against
    pub versions: &'static [u32],
    pub version_offset: u64,
    pub revision_offset: u64,
    /// Where the 16 byte lump headers start
    pub header_offset: u64,
    pub lump_count: usize,
    /// Sparse, unused slots have no entry
    pub lumps: &'static [LumpDef],
    pub static_props: Option<&'static StaticPropDef>,
    /// Extension of `<file>.<id>.<ext>` companion lumps
    pub external_lump_ext: Option<&'static str>,
    /// Suffixes of `<stem>_<partition>.ent` entity files
    pub entity_partitions: &'static [&'static str],
}

impl Branch {
    pub fn supports(&self, version: u32) -> bool {
        self.versions.contains(&version)
    }

    pub fn lump(&self, id: u32) -> Option<&'static LumpDef> {
        self.lumps.iter().find(|l| l.id == id)
    }

    pub fn lump_by_name(&self, name: &str) -> Option<&'static LumpDef> {
        self.lumps.iter().find(|l| l.name == name)
    }

    /// Name used for an id, including ids the branch leaves unnamed.
    pub fn lump_name(&self, id: u32) -> String {
        match self.lump(id) {
            Some(def) => def.name.to_string(),
            None => format!("UNKNOWN_{id:04X}"),
        }
    }

    /// Schema for a lump, or `None` where the lump should stay raw.
    pub fn schema(
        &self,
        id: u32,
        format_version: u32,
        lump_version: u32,
    ) -> Option<&'static RecordSchema> {
        if !self.supports(format_version) {
            return None;
        }
        self.lump(id)?.schema(lump_version)
    }
}

/// Every branch a container can be opened with.
pub struct BranchRegistry {
    branches: Vec<&'static Branch>,
}

impl Default for BranchRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(&valve::ORANGE_BOX);
        registry.register(&respawn::TITANFALL);
        registry.register(&respawn::TITANFALL_2);
        registry
    }
}

impl BranchRegistry {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
        }
    }

    pub fn register(&mut self, branch: &'static Branch) {
        self.branches.push(branch);
    }

    pub fn branches(&self) -> &[&'static Branch] {
        &self.branches
    }

    pub fn get(&self, name: &str) -> Option<&'static Branch> {
        self.branches.iter().copied().find(|b| b.name == name)
    }

    /// Pick a branch for a file. An explicit `hint` wins, then an exact magic and version
    /// match, then any branch sharing the magic (its lumps will all read raw).
    pub fn resolve(&self, hint: Option<&str>, magic: [u8; 4], version: u32) -> Result<&'static Branch> {
        if let Some(name) = hint {
            return self
                .get(name)
                .ok_or_else(|| BspError::UnknownBranch(name.to_string()));
        }
        let mut same_magic = self.branches.iter().copied().filter(|b| b.magic == magic);
        if let Some(branch) = same_magic.clone().find(|b| b.supports(version)) {
            return Ok(branch);
        }
        match same_magic.next() {
            Some(branch) => {
                warn!(
                    "no {} table for version {version}, every lump will be raw",
                    branch.name
                );
                Ok(branch)
            }
            None => Err(BspError::UnknownBranch(format!(
                "{} v{version}",
                String::from_utf8_lossy(&magic)
            ))),
        }
    }
}
