use std::time::Duration;

use crate::aggregate::parse_chapter_number;
use crate::api::ApiClient;
use crate::batch::resolve_chapters;
use crate::cli::ChapterArgs;
use crate::config::Settings;
use crate::download::{Downloader, MangadexDownloader, Pacer};
use crate::error::NotFound;
use crate::groups::GroupLookup;
use crate::model::ChapterEntry;
use crate::pager::ChapterSource;
use crate::prompt::{ConsolePrompter, Prompter};
use crate::selection::{Answer, candidate_menu, parse_answer};

/// What a `chapter` invocation refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterTarget {
    Id(String),
    Number { manga_id: String, number: String },
}

impl ChapterTarget {
    pub fn from_args(args: &ChapterArgs) -> anyhow::Result<Self> {
        match &args.number {
            Some(number) => Ok(Self::Number {
                manga_id: args.target.clone(),
                number: number.clone(),
            }),
            None if is_uuid(&args.target) => Ok(Self::Id(args.target.clone())),
            None => anyhow::bail!(
                "expected a chapter id, or a manga id followed by a chapter number: {}",
                args.target
            ),
        }
    }
}

pub fn is_uuid(value: &str) -> bool {
    uuid::Uuid::try_parse(value).is_ok()
}

pub async fn run(args: ChapterArgs, settings: &Settings) -> anyhow::Result<()> {
    let target = ChapterTarget::from_args(&args)?;
    let api = ApiClient::new(settings)?;
    let downloader = MangadexDownloader::new(api.clone(), settings.library());
    let mut prompter = ConsolePrompter;

    let chapter_ids = match target {
        ChapterTarget::Id(id) => vec![id],
        ChapterTarget::Number { manga_id, number } => {
            choose_chapters(&api, &api, &mut prompter, &manga_id, &number).await?
        }
    };

    download_chapters(&downloader, &chapter_ids, settings.delay).await
}

/// Download `chapter_ids` in order, spaced by `delay`. A failure is logged and
/// the rest still run; the command fails afterwards if any chapter did.
pub async fn download_chapters(
    downloader: &dyn Downloader,
    chapter_ids: &[String],
    delay: Duration,
) -> anyhow::Result<()> {
    let mut pacer = Pacer::new(delay);
    let mut failed = Vec::new();
    for chapter_id in chapter_ids {
        pacer.wait().await;
        match downloader.download(chapter_id).await {
            Ok(done) => println!("Downloaded {} pages to {}", done.pages, done.dir.display()),
            Err(err) => {
                tracing::warn!(
                    chapter_id = %chapter_id,
                    error = %format!("{err:#}"),
                    "chapter download failed"
                );
                failed.push(chapter_id.as_str());
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!(
            "{} of {} chapter downloads failed: {}",
            failed.len(),
            chapter_ids.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

/// Ids of the uploads of chapter `number` to download, asking when more than
/// one group uploaded it.
pub async fn choose_chapters(
    source: &dyn ChapterSource,
    lookup: &dyn GroupLookup,
    prompter: &mut dyn Prompter,
    manga_id: &str,
    number: &str,
) -> anyhow::Result<Vec<String>> {
    let entries = resolve_chapters(source, lookup, manga_id).await?;
    let matches = matching_entries(entries, number);

    match matches.len() {
        0 => Err(NotFound(format!("chapter {number} not found for manga {manga_id}")).into()),
        1 => Ok(vec![matches[0].id.clone()]),
        count => {
            let menu = candidate_menu(
                number,
                &matches,
                format!("Select scanlator (1-{count} or a): "),
            );
            let answer = prompter.ask(&menu)?;
            match parse_answer(&answer, count)? {
                Answer::All => Ok(matches.into_iter().map(|e| e.id).collect()),
                Answer::Index(idx) => Ok(vec![matches[idx].id.clone()]),
            }
        }
    }
}

/// Entries whose label has the same numeric value as `number`. Labels
/// without a number never match.
pub fn matching_entries(entries: Vec<ChapterEntry>, number: &str) -> Vec<ChapterEntry> {
    let Some(wanted) = parse_chapter_number(number) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter(|e| parse_chapter_number(&e.number) == Some(wanted))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::tests::RecordingDownloader;
    use crate::error::InvalidSelection;
    use crate::groups::tests::CountingLookup;
    use crate::pager::tests::{FakeSource, record};
    use crate::prompt::ScriptedPrompter;

    const CHAPTER_ID: &str = "a3f1c2d4-5b6e-4f70-8a9b-0c1d2e3f4a5b";

    fn args(target: &str, number: Option<&str>) -> ChapterArgs {
        ChapterArgs {
            target: target.to_owned(),
            number: number.map(str::to_owned),
        }
    }

    #[test]
    fn target_is_id_only_for_a_lone_uuid() -> anyhow::Result<()> {
        assert_eq!(
            ChapterTarget::from_args(&args(CHAPTER_ID, None))?,
            ChapterTarget::Id(CHAPTER_ID.to_owned())
        );
        assert_eq!(
            ChapterTarget::from_args(&args("manga", Some("3")))?,
            ChapterTarget::Number {
                manga_id: "manga".to_owned(),
                number: "3".to_owned(),
            }
        );
        assert!(ChapterTarget::from_args(&args("chapter-3", None)).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn numeric_match_ignores_label_formatting() -> anyhow::Result<()> {
        let source = FakeSource::new(vec![
            record("c3", "3", Some("A")),
            record("c3b", "3.0", Some("B")),
            record("c4", "4", Some("A")),
        ]);
        let lookup = CountingLookup::with(&[("A", "Team A"), ("B", "Team B")]);
        let mut prompter = ScriptedPrompter::new(["2"]);

        let ids = choose_chapters(&source, &lookup, &mut prompter, "m1", "3").await?;
        assert_eq!(ids, vec!["c3b"]);
        assert_eq!(prompter.asked()[0].question, "Select scanlator (1-2 or a): ");
        Ok(())
    }

    #[tokio::test]
    async fn all_downloads_every_match() -> anyhow::Result<()> {
        let source = FakeSource::new(vec![
            record("c3a", "3", Some("A")),
            record("c3b", "3", Some("B")),
        ]);
        let lookup = CountingLookup::with(&[("A", "Team A"), ("B", "Team B")]);
        let mut prompter = ScriptedPrompter::new(["a"]);

        let ids = choose_chapters(&source, &lookup, &mut prompter, "m1", "3").await?;
        assert_eq!(ids, vec!["c3a", "c3b"]);
        Ok(())
    }

    #[tokio::test]
    async fn single_match_needs_no_prompt() -> anyhow::Result<()> {
        let source = FakeSource::new(vec![record("c1", "1", None), record("c2", "2", None)]);
        let lookup = CountingLookup::default();
        let mut prompter = ScriptedPrompter::default();

        let ids = choose_chapters(&source, &lookup, &mut prompter, "m1", "2").await?;
        assert_eq!(ids, vec!["c2"]);
        assert!(prompter.asked().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_chapter_is_not_found() {
        let source = FakeSource::new(vec![record("c1", "1", None)]);
        let lookup = CountingLookup::default();
        let mut prompter = ScriptedPrompter::default();

        let err = choose_chapters(&source, &lookup, &mut prompter, "m1", "9")
            .await
            .expect_err("chapter 9 does not exist");
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn invalid_answer_fails_the_command() {
        let source = FakeSource::new(vec![
            record("c3a", "3", Some("A")),
            record("c3b", "3", Some("B")),
        ]);
        let lookup = CountingLookup::default();
        let mut prompter = ScriptedPrompter::new(["5"]);

        let err = choose_chapters(&source, &lookup, &mut prompter, "m1", "3")
            .await
            .expect_err("5 is out of range");
        assert!(err.downcast_ref::<InvalidSelection>().is_some());
    }

    #[test]
    fn non_numeric_request_matches_nothing() {
        let entries = vec![ChapterEntry {
            id: "c".to_owned(),
            number: "Extra".to_owned(),
            group_id: None,
            group_name: "No Scanlator".to_owned(),
        }];
        assert!(matching_entries(entries, "Extra").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn every_match_is_downloaded_with_the_delay_between() -> anyhow::Result<()> {
        let downloader = RecordingDownloader::default();
        let ids = vec!["c3a".to_owned(), "c3b".to_owned()];

        let started = tokio::time::Instant::now();
        download_chapters(&downloader, &ids, Duration::from_millis(750)).await?;
        let elapsed = started.elapsed();

        assert_eq!(downloader.downloaded(), vec!["c3a", "c3b"]);
        assert!(elapsed >= Duration::from_millis(750), "elapsed={elapsed:?}");
        assert!(elapsed < Duration::from_millis(1500), "elapsed={elapsed:?}");
        Ok(())
    }

    #[tokio::test]
    async fn failed_download_does_not_stop_the_rest() {
        let downloader = RecordingDownloader {
            fail: vec!["c3a".to_owned()],
            ..RecordingDownloader::default()
        };
        let ids = vec!["c3a".to_owned(), "c3b".to_owned()];

        let err = download_chapters(&downloader, &ids, Duration::ZERO)
            .await
            .expect_err("c3a fails");
        assert_eq!(downloader.downloaded(), vec!["c3a", "c3b"]);
        assert!(err.to_string().contains("1 of 2 chapter downloads failed: c3a"));
    }
}
