use std::path::Path;

use anyhow::Context as _;
use url::Url;

use crate::aggregate::parse_chapter_number;
use crate::api::ApiClient;
use crate::cli::ThumbnailSize;
use crate::formats::{CoverAttributes, Resource};

pub const DEFAULT_COVER_EXT: &str = "jpg";

/// The cover of the highest volume; covers without a volume count as volume 0.
pub fn pick_cover(covers: &[Resource<CoverAttributes>]) -> Option<&CoverAttributes> {
    let volume = |c: &CoverAttributes| {
        c.volume
            .as_deref()
            .and_then(parse_chapter_number)
            .unwrap_or(0.0)
    };
    covers
        .iter()
        .map(|c| &c.attributes)
        .reduce(|best, c| if volume(c) > volume(best) { c } else { best })
}

pub fn cover_url(
    uploads_base_url: &str,
    manga_id: &str,
    file_name: &str,
    thumbnail: Option<ThumbnailSize>,
) -> anyhow::Result<Url> {
    let base = uploads_base_url.trim_end_matches('/');
    let raw = match thumbnail {
        Some(size) => format!("{base}/covers/{manga_id}/{file_name}.{}.jpg", size.pixels()),
        None => format!("{base}/covers/{manga_id}/{file_name}"),
    };
    Url::parse(&raw).with_context(|| format!("build cover url: {raw}"))
}

/// Download the newest cover to `<covers_dir>/<local_name>.<ext>`.
/// Returns the extension used, or `None` when the manga has no cover.
/// An existing file is left as is.
pub async fn download_cover(
    api: &ApiClient,
    uploads_base_url: &str,
    manga_id: &str,
    local_name: &str,
    thumbnail: Option<ThumbnailSize>,
    covers_dir: &Path,
) -> anyhow::Result<Option<String>> {
    let covers = api.covers(manga_id).await.context("list covers")?;
    let Some(cover) = pick_cover(&covers.data) else {
        tracing::warn!(manga_id, "no cover found; skipping cover download");
        return Ok(None);
    };

    let ext = match thumbnail {
        Some(_) => DEFAULT_COVER_EXT.to_owned(),
        None => Path::new(&cover.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(DEFAULT_COVER_EXT)
            .to_owned(),
    };
    let dest = covers_dir.join(format!("{local_name}.{ext}"));
    if dest.exists() {
        tracing::info!(path = %dest.display(), "cover already exists; skipping download");
        return Ok(Some(ext));
    }

    let url = cover_url(uploads_base_url, manga_id, &cover.file_name, thumbnail)?;
    tracing::info!(%url, "fetching cover");
    let bytes = api.get_bytes(url, "getCover").await?;

    tokio::fs::create_dir_all(covers_dir)
        .await
        .with_context(|| format!("create covers dir: {}", covers_dir.display()))?;
    tokio::fs::write(&dest, &bytes)
        .await
        .with_context(|| format!("write cover: {}", dest.display()))?;
    Ok(Some(ext))
}
