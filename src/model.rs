/// One chapter upload as listed by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    pub id: String,
    /// Chapter label, e.g. `"10.5"`. Not unique: competing uploads share it.
    pub number: String,
    pub group_id: Option<String>,
}

/// A [`ChapterRecord`] with its scanlation group name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub id: String,
    pub number: String,
    pub group_id: Option<String>,
    pub group_name: String,
}

/// All entries sharing one chapter label. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterBucket {
    pub number: String,
    pub value: Option<f64>,
    pub entries: Vec<ChapterEntry>,
}

impl ChapterBucket {
    pub fn is_contested(&self) -> bool {
        self.entries.len() > 1
    }
}
