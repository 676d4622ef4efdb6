use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{ChapterEntry, ChapterRecord};

/// Name given to a group whose individual lookup failed.
pub const UNKNOWN_GROUP: &str = "Unknown";
/// Display name for a group id that never got a name.
pub const UNKNOWN_SCANLATOR: &str = "Unknown Scanlator";
/// Display name for an upload with no group at all.
pub const NO_SCANLATOR: &str = "No Scanlator";

#[async_trait]
pub trait GroupLookup: Send + Sync {
    async fn group_name(&self, group_id: &str) -> Result<String, ApiError>;
}

#[async_trait]
impl GroupLookup for ApiClient {
    async fn group_name(&self, group_id: &str) -> Result<String, ApiError> {
        Ok(self.group(group_id).await?.data.attributes.name)
    }
}

/// Group names cached for the lifetime of one run.
pub struct GroupResolver<'a> {
    lookup: &'a dyn GroupLookup,
    names: HashMap<String, String>,
}

impl<'a> GroupResolver<'a> {
    pub fn new(lookup: &'a dyn GroupLookup) -> Self {
        Self {
            lookup,
            names: HashMap::new(),
        }
    }

    /// Names the server already sent alongside the chapter listing.
    pub fn seed(&mut self, known: impl IntoIterator<Item = (String, String)>) {
        self.names.extend(known);
    }

    /// Cached name, else one lookup. A failed lookup is remembered as
    /// [`UNKNOWN_GROUP`] so it is not retried.
    pub async fn name_of(&mut self, group_id: &str) -> &str {
        if !self.names.contains_key(group_id) {
            let name = match self.lookup.group_name(group_id).await {
                Ok(name) => name,
                Err(err) => {
                    tracing::warn!(group_id, error = %err, "scanlation group lookup failed");
                    UNKNOWN_GROUP.to_owned()
                }
            };
            self.names.insert(group_id.to_owned(), name);
        }
        self.names
            .get(group_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_GROUP)
    }

    /// Name every group referenced by `records`, looking up the ones not
    /// already known in first-seen order. Names land in the cache that
    /// [`Self::annotate`] reads.
    pub async fn resolve(&mut self, records: &[ChapterRecord]) {
        let mut seen = HashSet::new();
        for group_id in records.iter().filter_map(|r| r.group_id.as_deref()) {
            if seen.insert(group_id) {
                self.name_of(group_id).await;
            }
        }
    }

    pub fn display_name(&self, group_id: Option<&str>) -> String {
        match group_id {
            None => NO_SCANLATOR.to_owned(),
            Some(id) => self
                .names
                .get(id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_SCANLATOR.to_owned()),
        }
    }

    pub fn annotate(&self, records: Vec<ChapterRecord>) -> Vec<ChapterEntry> {
        records
            .into_iter()
            .map(|r| ChapterEntry {
                group_name: self.display_name(r.group_id.as_deref()),
                id: r.id,
                number: r.number,
                group_id: r.group_id,
            })
            .collect()
    }
}
