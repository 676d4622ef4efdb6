use std::time::Duration;

use anyhow::Context as _;

use crate::aggregate::group_by_number;
use crate::api::ApiClient;
use crate::cli::BatchArgs;
use crate::config::Settings;
use crate::download::{Downloader, MangadexDownloader, Pacer};
use crate::error::NotFound;
use crate::groups::{GroupLookup, GroupResolver};
use crate::model::{ChapterBucket, ChapterEntry};
use crate::pager::{ChapterSource, fetch_all_pages};
use crate::prompt::{ConsolePrompter, Prompter};
use crate::selection::{Selection, SelectionState, select};

/// Every chapter upload of `manga_id`, with group names resolved.
pub async fn resolve_chapters(
    source: &dyn ChapterSource,
    lookup: &dyn GroupLookup,
    manga_id: &str,
) -> anyhow::Result<Vec<ChapterEntry>> {
    let fetched = fetch_all_pages(source, manga_id)
        .await
        .context("fetch chapter listing")?;

    let mut resolver = GroupResolver::new(lookup);
    resolver.seed(fetched.included_groups);
    resolver.resolve(&fetched.records).await;
    Ok(resolver.annotate(fetched.records))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub chapters: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One pass over the buckets of a manga. Owns the sticky selection state.
pub struct BatchRun<'a> {
    downloader: &'a dyn Downloader,
    prompter: &'a mut dyn Prompter,
    pacer: Pacer,
    state: SelectionState,
}

impl<'a> BatchRun<'a> {
    pub fn new(
        downloader: &'a dyn Downloader,
        prompter: &'a mut dyn Prompter,
        delay: Duration,
    ) -> Self {
        Self {
            downloader,
            prompter,
            pacer: Pacer::new(delay),
            state: SelectionState::Unset,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Select and download bucket by bucket. A failed download or an invalid
    /// answer only affects its own chapter; a prompt that cannot be read ends
    /// the run.
    pub async fn run(&mut self, buckets: &[ChapterBucket]) -> anyhow::Result<BatchSummary> {
        let mut summary = BatchSummary {
            chapters: buckets.len(),
            ..BatchSummary::default()
        };

        for bucket in buckets {
            let selected = match select(&mut self.state, bucket, &mut *self.prompter)? {
                Selection::Download(entries) => entries,
                Selection::Skip(invalid) => {
                    tracing::warn!(chapter = %bucket.number, "{invalid}; skipping chapter");
                    summary.skipped += 1;
                    continue;
                }
            };

            for entry in selected {
                self.pacer.wait().await;
                tracing::info!(
                    chapter = %entry.number,
                    group = %entry.group_name,
                    chapter_id = %entry.id,
                    "downloading chapter"
                );
                match self.downloader.download(&entry.id).await {
                    Ok(_) => summary.downloaded += 1,
                    Err(err) => {
                        tracing::warn!(
                            chapter = %entry.number,
                            chapter_id = %entry.id,
                            error = %format!("{err:#}"),
                            "chapter download failed"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }
}

pub async fn run(args: BatchArgs, settings: &Settings) -> anyhow::Result<()> {
    let api = ApiClient::new(settings)?;
    let downloader = MangadexDownloader::new(api.clone(), settings.library());
    let mut prompter = ConsolePrompter;
    let manga_id = args.manga_id.as_str();
    let title_api = &api;

    let summary = download_manga(
        &api,
        &api,
        &downloader,
        &mut prompter,
        settings.delay,
        manga_id,
        move |count| async move {
            let title = title_api
                .manga_title(manga_id)
                .await
                .context("fetch manga title")?;
            println!("Found {count} entries for Manga: {title}");
            Ok(())
        },
    )
    .await?;

    tracing::info!(
        chapters = summary.chapters,
        downloaded = summary.downloaded,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch finished"
    );
    println!("Batch download complete.");
    Ok(())
}

/// Full pipeline for one manga: page, resolve, bucket, select, download.
/// `on_found` runs once the listing is known to be non-empty.
#[allow(clippy::too_many_arguments)]
pub async fn download_manga<F, Fut>(
    source: &dyn ChapterSource,
    lookup: &dyn GroupLookup,
    downloader: &dyn Downloader,
    prompter: &mut dyn Prompter,
    delay: Duration,
    manga_id: &str,
    on_found: F,
) -> anyhow::Result<BatchSummary>
where
    F: FnOnce(usize) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let entries = resolve_chapters(source, lookup, manga_id).await?;
    if entries.is_empty() {
        return Err(NotFound(format!("no chapters found for manga {manga_id}")).into());
    }
    on_found(entries.len()).await?;

    let buckets = group_by_number(entries);
    BatchRun::new(downloader, prompter, delay).run(&buckets).await
}
