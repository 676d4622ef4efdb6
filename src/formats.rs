//! Wire types for the MangaDex API responses the tools consume.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub const SCANLATION_GROUP: &str = "scanlation_group";
pub const MANGA: &str = "manga";
pub const AUTHOR: &str = "author";
pub const ARTIST: &str = "artist";
pub const COVER_ART: &str = "cover_art";

/// A `{ "en": "...", "ja": "..." }` map. Key order follows the response body.
///
/// The API sends `[]` instead of `{}` for some empty maps, so anything that
/// is not an object deserializes as empty.
#[derive(Debug, Clone, Default)]
pub struct LocalizedString(Map<String, Value>);

impl LocalizedString {
    pub fn get(&self, language: &str) -> Option<&str> {
        self.0
            .get(language)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn first(&self) -> Option<&str> {
        self.0
            .values()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }

    /// `language` when present, else the first non-empty value.
    pub fn preferred(&self, language: &str) -> Option<&str> {
        self.get(language).or_else(|| self.first())
    }
}

impl<'de> Deserialize<'de> for LocalizedString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<Value>,
}

impl Relationship {
    /// `attributes.name`, present when the relationship was expanded with `includes[]`.
    pub fn name(&self) -> Option<&str> {
        self.attributes
            .as_ref()?
            .get("name")?
            .as_str()
            .filter(|s| !s.is_empty())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.attributes.as_ref()?.get("fileName")?.as_str()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    pub attributes: A,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl<A> Resource<A> {
    pub fn related(&self, kind: &str) -> impl Iterator<Item = &Relationship> + '_ {
        let kind = kind.to_owned();
        self.relationships.iter().filter(move |r| r.kind == kind)
    }

    pub fn first_related(&self, kind: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.kind == kind)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityResponse<A> {
    pub data: Resource<A>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterAttributes {
    #[serde(default)]
    pub chapter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterListResponse {
    #[serde(default)]
    pub data: Vec<Resource<ChapterAttributes>>,
    #[serde(default)]
    pub included: Vec<Relationship>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupAttributes {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagAttributes {
    #[serde(default)]
    pub name: LocalizedString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub attributes: TagAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MangaAttributes {
    #[serde(default)]
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MangaResponse {
    pub data: Resource<MangaAttributes>,
    #[serde(default)]
    pub included: Vec<Relationship>,
}

impl MangaResponse {
    /// Expanded relationships of `kind`, from `included` when the server sends
    /// one, else from the inline relationships.
    pub fn expanded(&self, kind: &str) -> Vec<&Relationship> {
        let from_included = self
            .included
            .iter()
            .filter(|r| r.kind == kind)
            .collect::<Vec<_>>();
        if !from_included.is_empty() {
            return from_included;
        }
        self.data.related(kind).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtHomeChapter {
    pub hash: String,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtHomeResponse {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub chapter: AtHomeChapter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverAttributes {
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverListResponse {
    #[serde(default)]
    pub data: Vec<Resource<CoverAttributes>>,
}
