use anyhow::Context as _;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Settings;
use crate::error::ApiError;
use crate::formats::{
    AtHomeResponse, ChapterAttributes, ChapterListResponse, CoverListResponse, EntityResponse,
    GroupAttributes, MangaResponse, SCANLATION_GROUP,
};

pub const USER_AGENT_VALUE: &str = "MangaView CLI";

/// Thin MangaDex client. Every call is a single GET with no retry.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_owned(),
            language: settings.language.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))?)
    }

    /// GET `url` and decode a JSON body; anything that is not a 2xx
    /// `application/json` response becomes [`ApiError::Transport`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, label: &str) -> Result<T, ApiError> {
        tracing::debug!(%url, label, "GET");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                label: label.to_owned(),
                source,
            })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let body = response.text().await.map_err(|source| ApiError::Request {
            label: label.to_owned(),
            source,
        })?;

        if !status.is_success() || !is_json {
            return Err(ApiError::transport(label, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            label: label.to_owned(),
            source,
        })
    }

    /// GET raw bytes (page images, covers).
    pub async fn get_bytes(&self, url: Url, label: &str) -> Result<Vec<u8>, ApiError> {
        let request_error = |source| ApiError::Request {
            label: label.to_owned(),
            source,
        };
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::transport(label, status.as_u16(), &body));
        }
        let bytes = response.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }

    pub async fn chapter_page(
        &self,
        manga_id: &str,
        limit: u32,
        offset: u64,
    ) -> Result<ChapterListResponse, ApiError> {
        let mut url = self.endpoint("chapter")?;
        url.query_pairs_mut()
            .append_pair("manga", manga_id)
            .append_pair("translatedLanguage[]", &self.language)
            .append_pair("order[chapter]", "asc")
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("includes[]", SCANLATION_GROUP);
        self.get_json(url, "getAllChapterData").await
    }

    /// Highest-numbered chapter in any language.
    pub async fn latest_chapter(&self, manga_id: &str) -> Result<ChapterListResponse, ApiError> {
        let mut url = self.endpoint("chapter")?;
        url.query_pairs_mut()
            .append_pair("manga", manga_id)
            .append_pair("limit", "1")
            .append_pair("order[chapter]", "desc");
        self.get_json(url, "getLatestChapter").await
    }

    pub async fn group(&self, group_id: &str) -> Result<EntityResponse<GroupAttributes>, ApiError> {
        let url = self.endpoint(&format!("group/{group_id}"))?;
        self.get_json(url, "getScanlationGroup").await
    }

    pub async fn chapter(
        &self,
        chapter_id: &str,
    ) -> Result<EntityResponse<ChapterAttributes>, ApiError> {
        let url = self.endpoint(&format!("chapter/{chapter_id}"))?;
        self.get_json(url, "getChapterInfo").await
    }

    pub async fn at_home(&self, chapter_id: &str) -> Result<AtHomeResponse, ApiError> {
        let url = self.endpoint(&format!("at-home/server/{chapter_id}"))?;
        self.get_json(url, "getAtHomeServer").await
    }

    pub async fn manga(&self, manga_id: &str, includes: &[&str]) -> Result<MangaResponse, ApiError> {
        let mut url = self.endpoint(&format!("manga/{manga_id}"))?;
        if !includes.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for include in includes {
                pairs.append_pair("includes[]", include);
            }
        }
        self.get_json(url, "getManga").await
    }

    pub async fn covers(&self, manga_id: &str) -> Result<CoverListResponse, ApiError> {
        let mut url = self.endpoint("cover")?;
        url.query_pairs_mut().append_pair("manga[]", manga_id);
        self.get_json(url, "getCovers").await
    }

    /// Display title: the configured language, else the first title listed.
    pub async fn manga_title(&self, manga_id: &str) -> anyhow::Result<String> {
        let manga = self.manga(manga_id, &[]).await?;
        manga
            .data
            .attributes
            .title
            .preferred(&self.language)
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("manga {manga_id} has no title"))
    }
}
