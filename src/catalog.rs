use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One manga in `data/manga.json`. Fields this tool does not know about are
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    #[serde(alias = "mdUuid")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_folders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntry {
    /// Matches by slug or uuid.
    pub fn matches(&self, target: &str) -> bool {
        self.uuid == target || self.slug.as_deref() == Some(target)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// A missing file is an empty catalog.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let entries = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse catalog: {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("read catalog: {}", path.display()));
            }
        };
        Ok(Self {
            path: path.to_owned(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Six-digit id one above the highest numeric id present.
    pub fn next_id(&self) -> String {
        let next = self
            .entries
            .iter()
            .filter_map(|e| e.id.trim().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        format!("{next:06}")
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.uuid == uuid)
    }

    /// The entry for `uuid`, appended with a fresh id when absent.
    pub fn upsert(&mut self, uuid: &str) -> &mut CatalogEntry {
        let idx = match self.entries.iter().position(|e| e.uuid == uuid) {
            Some(idx) => idx,
            None => {
                let entry = CatalogEntry {
                    id: self.next_id(),
                    uuid: uuid.to_owned(),
                    ..CatalogEntry::default()
                };
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    /// Pretty JSON written through a temp file in the same directory, then renamed.
    pub fn save(&self) -> anyhow::Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create catalog dir: {}", parent.display()))?;

        let mut data = serde_json::to_vec_pretty(&self.entries).context("serialize catalog")?;
        data.push(b'\n');

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("create temp file in: {}", parent.display()))?;
        tmp.write_all(&data).context("write catalog temp file")?;
        tmp.persist(&self.path)
            .map_err(|err| err.error)
            .with_context(|| format!("replace catalog: {}", self.path.display()))?;
        Ok(())
    }
}

pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
