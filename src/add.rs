use anyhow::Context as _;

use crate::aggregate::parse_chapter_number;
use crate::api::ApiClient;
use crate::catalog::{Catalog, CatalogEntry, today};
use crate::cli::AddArgs;
use crate::config::Settings;
use crate::cover::{DEFAULT_COVER_EXT, download_cover};
use crate::formats::{ARTIST, AUTHOR, COVER_ART, MangaResponse};

pub const UNKNOWN_AUTHOR: &str = "Unknown";
/// Genres and the `metadata` description are always taken in English.
pub const ENGLISH: &str = "en";

/// Catalog fields taken from one manga lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangaDetails {
    pub title: Option<String>,
    /// In `language`, else the first one listed.
    pub description: Option<String>,
    /// English only.
    pub english_description: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<String>,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub cover_file: Option<String>,
}

impl MangaDetails {
    pub fn from_response(response: &MangaResponse, language: &str) -> Self {
        let attrs = &response.data.attributes;
        let names = |kind: &str| {
            response
                .expanded(kind)
                .into_iter()
                .filter_map(|r| r.name().map(str::to_owned))
                .collect::<Vec<_>>()
        };
        Self {
            title: attrs.title.preferred(language).map(str::to_owned),
            description: attrs.description.preferred(language).map(str::to_owned),
            english_description: attrs.description.get(ENGLISH).map(str::to_owned),
            status: attrs.status.clone(),
            genres: attrs
                .tags
                .iter()
                .filter_map(|t| t.attributes.name.get(ENGLISH).map(str::to_owned))
                .collect(),
            authors: names(AUTHOR),
            artists: names(ARTIST),
            cover_file: response
                .expanded(COVER_ART)
                .into_iter()
                .find_map(|r| r.file_name().map(str::to_owned)),
        }
    }
}

/// `floor` of the highest chapter label, 0 when there is none.
pub fn chapter_count(latest_label: Option<&str>) -> u64 {
    latest_label
        .and_then(parse_chapter_number)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map_or(0, |n| n.floor() as u64)
}

pub async fn run(args: AddArgs, settings: &Settings) -> anyhow::Result<()> {
    let library = settings.library();
    let mut catalog = Catalog::load(&library.catalog_path())?;

    if let Some(existing) = catalog.find_by_uuid(&args.manga_id) {
        println!(
            "UUID already exists as ID {} ({}), skipping.",
            existing.id, existing.title
        );
        return Ok(());
    }

    let api = ApiClient::new(settings)?;
    let id = catalog.next_id();

    let response = api
        .manga(&args.manga_id, &[AUTHOR, ARTIST, COVER_ART])
        .await
        .context("fetch manga")?;
    let details = MangaDetails::from_response(&response, &settings.language);
    let title = details
        .title
        .clone()
        .ok_or_else(|| anyhow::anyhow!("manga {} has no title", args.manga_id))?;

    let latest = api
        .latest_chapter(&args.manga_id)
        .await
        .context("fetch latest chapter")?;
    let chapters = chapter_count(
        latest
            .data
            .first()
            .and_then(|c| c.attributes.chapter.as_deref()),
    );

    let cover_ext = download_cover(
        &api,
        &settings.uploads_base_url,
        &args.manga_id,
        &id,
        args.thumbnail,
        &library.covers_dir(),
    )
    .await
    .context("download cover")?
    .unwrap_or_else(|| DEFAULT_COVER_EXT.to_owned());

    let date = today();
    let authors = if details.authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_owned()]
    } else {
        details.authors
    };
    catalog.entries.push(CatalogEntry {
        id: id.clone(),
        uuid: args.manga_id.clone(),
        slug: Some(args.manga_id.clone()),
        title: title.clone(),
        authors,
        artists: details.artists,
        status: details.status,
        chapters: Some(chapters),
        description: Some(details.description.unwrap_or_default()),
        genres: details.genres,
        cover_ext: Some(cover_ext),
        cover_file: details.cover_file,
        added: Some(date.clone()),
        last_updated: Some(date),
        ..CatalogEntry::default()
    });
    catalog.save()?;

    tracing::info!(id = %id, manga_id = %args.manga_id, "catalog entry added");
    println!("Added {title} as ID {id}");
    Ok(())
}
