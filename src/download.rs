use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use url::Url;

use crate::api::ApiClient;
use crate::formats::MANGA;
use crate::library::{Library, page_file_name};

/// Label used when the chapter itself carries no number.
pub const DEFAULT_CHAPTER_LABEL: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDownload {
    pub dir: PathBuf,
    pub pages: usize,
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, chapter_id: &str) -> anyhow::Result<ChapterDownload>;
}

/// Spaces consecutive downloads by a fixed delay. The first one starts
/// immediately.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    started: usize,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, started: 0 }
    }

    pub async fn wait(&mut self) {
        if self.started > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.started += 1;
    }
}

/// Fetches page images through the MangaDex at-home network into the library.
#[derive(Debug, Clone)]
pub struct MangadexDownloader {
    api: ApiClient,
    library: Library,
}

impl MangadexDownloader {
    pub fn new(api: ApiClient, library: Library) -> Self {
        Self { api, library }
    }
}

#[async_trait]
impl Downloader for MangadexDownloader {
    async fn download(&self, chapter_id: &str) -> anyhow::Result<ChapterDownload> {
        let chapter = self.api.chapter(chapter_id).await?;
        let manga_id = chapter
            .data
            .first_related(MANGA)
            .map(|r| r.id.clone())
            .ok_or_else(|| anyhow::anyhow!("chapter {chapter_id} has no manga relationship"))?;
        let label = chapter
            .data
            .attributes
            .chapter
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAPTER_LABEL.to_owned());

        let at_home = self.api.at_home(chapter_id).await?;
        let title = self
            .api
            .manga_title(&manga_id)
            .await
            .context("resolve manga title")?;

        let dir = self.library.chapter_dir(&title, &label)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create chapter dir: {}", dir.display()))?;

        let base_url = at_home.base_url.trim_end_matches('/');
        let hash = &at_home.chapter.hash;
        let total = at_home.chapter.data.len();
        for (idx, file) in at_home.chapter.data.iter().enumerate() {
            let url = Url::parse(&format!("{base_url}/data/{hash}/{file}"))
                .with_context(|| format!("build page url for {file}"))?;
            tracing::debug!(page = idx + 1, total, %url, "downloading page");

            let bytes = self
                .api
                .get_bytes(url, "getPage")
                .await
                .with_context(|| format!("download page {} of chapter {label}", idx + 1))?;
            let dest = dir.join(page_file_name(idx, file));
            tokio::fs::write(&dest, &bytes)
                .await
                .with_context(|| format!("write page: {}", dest.display()))?;
        }

        tracing::info!(
            chapter = %label,
            pages = total,
            dir = %dir.display(),
            "chapter downloaded"
        );
        Ok(ChapterDownload { dir, pages: total })
    }
}
