use std::path::Path;

use ini::Ini;

use crate::error::{BspError, Result};

/// How a map is opened.
///
/// ```ini
/// [bsp]
/// branch = titanfall2
/// external_lumps = true
/// entity_partitions = true
/// strict = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenOptions {
    /// Branch name, detected from the file signature when unset
    pub branch: Option<String>,
    /// Let `<map>.bsp.<id>.bsp_lump` files replace embedded lumps
    pub external_lumps: bool,
    /// Look for `<map>_<partition>.ent` files
    pub entity_partitions: bool,
    /// Fail the open on the first bad lump instead of recording it
    pub strict: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            branch: None,
            external_lumps: true,
            entity_partitions: true,
            strict: true,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(BspError::Config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

impl OpenOptions {
    /// Options from the `[bsp]` section, defaults for anything missing.
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut options = Self::default();
        let Some(section) = ini.section(Some("bsp")) else {
            return Ok(options);
        };
        if let Some(branch) = section.get("branch") {
            let branch = branch.trim();
            options.branch = (!branch.is_empty()).then(|| branch.to_string());
        }
        for (key, field) in [
            ("external_lumps", &mut options.external_lumps),
            ("entity_partitions", &mut options.entity_partitions),
            ("strict", &mut options.strict),
        ] {
            if let Some(value) = section.get(key) {
                *field = parse_bool(key, value)?;
            }
        }
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| BspError::Config(format!("{}: {e}", path.display())))?;
        Self::from_ini(&ini)
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
