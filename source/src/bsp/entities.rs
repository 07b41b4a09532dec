//! Entity text split across `<map>_<partition>.ent` files.
//!
//! Each file starts with a header line such as `ENTITIES02 model_count=28`, followed by the
//! same `{ "key" "value" }` blocks the ENTITIES lump holds.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::warn;

use crate::error::Result;

#[derive(Clone, Debug)]
pub struct EntityPartition {
    pub name: String,
    pub path: PathBuf,
    /// First line of the file, without the line break
    pub header: String,
    pub model_count: Option<u32>,
}

/// `model_count` from a partition header line.
pub fn parse_model_count(header: &str) -> Option<u32> {
    header
        .split_whitespace()
        .find_map(|token| token.strip_prefix("model_count="))
        .and_then(|count| count.parse().ok())
}

impl EntityPartition {
    /// Reads only the header line.
    pub fn open(name: &str, path: &Path) -> Result<Self> {
        let mut header = String::new();
        BufReader::new(File::open(path)?).read_line(&mut header)?;
        let header = header.trim_end().to_string();
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            model_count: parse_model_count(&header),
            header,
        })
    }

    /// Everything after the header line.
    pub fn text(&self) -> Result<String> {
        let data = std::fs::read(&self.path)?;
        let body = match data.iter().position(|&b| b == b'\n') {
            Some(end) => &data[end + 1..],
            None => &[],
        };
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

/// The model count every partition agrees on.
///
/// Disagreement is logged and leaves the count unknown.
pub fn check_model_counts(partitions: &[EntityPartition]) -> Option<u32> {
    let mut counts = partitions.iter().filter_map(|p| p.model_count);
    let first = counts.next()?;
    if let Some(p) = partitions
        .iter()
        .find(|p| p.model_count.is_some_and(|c| c != first))
    {
        warn!(
            "entity partition {} declares model_count={:?}, others declare {first}",
            p.name, p.model_count
        );
        return None;
    }
    Some(first)
}

#[cfg(test)]
mod entities_tests {
    use super::*;

    fn write_partition(dir: &Path, name: &str, header: &str) -> EntityPartition {
        let path = dir.join(format!("mp_test_{name}.ent"));
        std::fs::write(&path, format!("{header}\n{{\n\"classname\" \"info_{name}\"\n}}\n")).unwrap();
        EntityPartition::open(name, &path).unwrap()
    }

    #[test]
    fn header_parsing() {
        assert_eq!(parse_model_count("ENTITIES02 model_count=28"), Some(28));
        assert_eq!(parse_model_count("ENTITIES01"), None);
        assert_eq!(parse_model_count("ENTITIES02 model_count=x"), None);
    }

    #[test]
    fn partitions() {
        let dir = tempfile::tempdir().unwrap();
        let env = write_partition(dir.path(), "env", "ENTITIES02 model_count=3");
        let fx = write_partition(dir.path(), "fx", "ENTITIES02 model_count=3");
        assert_eq!(env.header, "ENTITIES02 model_count=3");
        assert!(env.text().unwrap().starts_with('{'));
        assert!(env.text().unwrap().contains("info_env"));
        assert_eq!(check_model_counts(&[env.clone(), fx]), Some(3));

        let snd = write_partition(dir.path(), "snd", "ENTITIES02 model_count=4");
        assert_eq!(check_model_counts(&[env, snd]), None);
        assert_eq!(check_model_counts(&[]), None);
    }
}
