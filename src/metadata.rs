use anyhow::Context as _;

use crate::add::MangaDetails;
use crate::api::ApiClient;
use crate::catalog::{Catalog, CatalogEntry, today};
use crate::cli::MetadataArgs;
use crate::config::Settings;
use crate::formats::{ARTIST, AUTHOR, COVER_ART};

pub const UNTITLED: &str = "Untitled";
pub const NO_DESCRIPTION: &str = "No description.";

/// Overwrite the descriptive fields of `entry`; ids, dates of addition and
/// chapter folders stay as they are.
pub fn apply_details(entry: &mut CatalogEntry, details: MangaDetails) {
    entry.title = details.title.unwrap_or_else(|| UNTITLED.to_owned());
    entry.description = Some(
        details
            .english_description
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
    );
    entry.status = details.status;
    entry.genres = details.genres;
    entry.authors = details.authors;
    entry.artists = details.artists;
    entry.cover_file = Some(details.cover_file.unwrap_or_default());
    entry.last_updated = Some(today());
}

pub async fn run(args: MetadataArgs, settings: &Settings) -> anyhow::Result<()> {
    let api = ApiClient::new(settings)?;
    let response = api
        .manga(&args.manga_id, &[AUTHOR, ARTIST, COVER_ART])
        .await
        .context("fetch manga")?;
    let details = MangaDetails::from_response(&response, &settings.language);

    let mut catalog = Catalog::load(&settings.library().catalog_path())?;
    let entry = catalog.upsert(&args.manga_id);
    apply_details(entry, details);
    let (id, title) = (entry.id.clone(), entry.title.clone());
    catalog.save()?;

    println!("-> [{id}] {title} metadata saved.");
    Ok(())
}
