use std::path::Path;

use anyhow::Context as _;

use crate::aggregate::{compare_chapter_numbers, parse_chapter_number};
use crate::catalog::Catalog;
use crate::cli::FoldersArgs;
use crate::config::Settings;
use crate::library::CHAPTER_DIR_PREFIX;

/// Labels of the `ch-*` directories under `manga_dir`, in chapter order.
/// A missing directory has no chapters.
pub fn chapter_folders(manga_dir: &Path) -> anyhow::Result<Vec<String>> {
    let entries = match std::fs::read_dir(manga_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("read manga dir: {}", manga_dir.display()));
        }
    };

    let mut labels = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(label) = name.strip_prefix(CHAPTER_DIR_PREFIX) {
            labels.push(label.to_owned());
        }
    }

    labels.sort();
    labels.sort_by(|a, b| compare_chapter_numbers(parse_chapter_number(a), parse_chapter_number(b)));
    Ok(labels)
}

pub fn run(args: FoldersArgs, settings: &Settings) -> anyhow::Result<()> {
    let library = settings.library();
    let mut catalog = Catalog::load(&library.catalog_path())?;

    let mut updated = false;
    for entry in catalog.entries.iter_mut() {
        if let Some(target) = args.target.as_deref()
            && !entry.matches(target)
        {
            continue;
        }

        let folders = chapter_folders(&library.manga_dir(&entry.title))?;
        println!(
            "Updated: {} -> {} chapter folder(s)",
            entry.title,
            folders.len()
        );
        entry.chapters = Some(folders.len() as u64);
        entry.chapter_folders = Some(folders);
        updated = true;
    }

    if updated {
        catalog.save()?;
        println!("{} saved.", catalog.path().display());
    } else {
        tracing::warn!("no matching manga found; use a slug or uuid as the target");
    }
    Ok(())
}
