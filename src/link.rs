use anyhow::Context as _;
use url::Url;

use crate::chapter::is_uuid;
use crate::cli::{AddArgs, BatchArgs, ChapterArgs, FoldersArgs, LinkArgs};
use crate::config::Settings;
use crate::prompt::{ConsolePrompter, Menu, MenuOption, Prompter};

const SITE_HOST: &str = "mangadex.org";

/// What a MangaDex link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Chapter(String),
    Title(String),
}

/// Follow-up for a title link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleAction {
    AddWithFolders,
    Download,
    Folders,
    Everything,
}

impl TitleAction {
    pub fn menu() -> Menu {
        Menu {
            heading: "What would you like to do?".to_owned(),
            options: vec![
                MenuOption::new("1", "Add to manga.json (and generate chapter folders)"),
                MenuOption::new("2", "Download all chapters"),
                MenuOption::new("3", "Generate chapter folders only"),
                MenuOption::new("4", "Do all: add, download, and generate folders"),
            ],
            question: "> ".to_owned(),
        }
    }

    pub fn from_answer(answer: &str) -> anyhow::Result<Self> {
        match answer {
            "1" => Ok(Self::AddWithFolders),
            "2" => Ok(Self::Download),
            "3" => Ok(Self::Folders),
            "4" => Ok(Self::Everything),
            other => anyhow::bail!("invalid choice {other:?}; select 1, 2, 3, or 4"),
        }
    }

    fn adds(self) -> bool {
        matches!(self, Self::AddWithFolders | Self::Everything)
    }

    fn downloads(self) -> bool {
        matches!(self, Self::Download | Self::Everything)
    }

    fn refreshes_folders(self) -> bool {
        !matches!(self, Self::Download)
    }
}

/// Accepts `https://mangadex.org/chapter/<id>` and `https://mangadex.org/title/<id>[/slug]`,
/// with or without the scheme and on any `mangadex.org` subdomain.
pub fn parse_link(raw: &str) -> anyhow::Result<LinkTarget> {
    let raw = raw.trim();
    let url = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("https://{raw}"))
    }
    .with_context(|| format!("parse link: {raw}"))?;

    let host = url.host_str().unwrap_or_default();
    if host != SITE_HOST && !host.ends_with(&format!(".{SITE_HOST}")) {
        anyhow::bail!("not a MangaDex link: {raw}");
    }

    let mut segments = url.path_segments().into_iter().flatten();
    match (segments.next(), segments.next()) {
        (Some("chapter"), Some(id)) if is_uuid(id) => Ok(LinkTarget::Chapter(id.to_owned())),
        (Some("title"), Some(id)) if is_uuid(id) => Ok(LinkTarget::Title(id.to_owned())),
        _ => anyhow::bail!("invalid MangaDex link; use a chapter or title URL: {raw}"),
    }
}

pub async fn run(args: LinkArgs, settings: &Settings) -> anyhow::Result<()> {
    let mut prompter = ConsolePrompter;
    dispatch(parse_link(&args.url)?, settings, &mut prompter).await
}

pub async fn dispatch(
    target: LinkTarget,
    settings: &Settings,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<()> {
    let manga_id = match target {
        LinkTarget::Chapter(chapter_id) => {
            println!("Chapter detected: {chapter_id}");
            return crate::chapter::run(
                ChapterArgs {
                    target: chapter_id,
                    number: None,
                },
                settings,
            )
            .await
            .context("chapter");
        }
        LinkTarget::Title(manga_id) => manga_id,
    };

    println!("Manga detected: {manga_id}");
    let action = TitleAction::from_answer(&prompter.ask(&TitleAction::menu())?)?;
    tracing::debug!(?action, manga_id = %manga_id, "link action chosen");

    if action.adds() {
        crate::add::run(
            AddArgs {
                manga_id: manga_id.clone(),
                thumbnail: None,
            },
            settings,
        )
        .await
        .context("add")?;
    }
    if action.downloads() {
        crate::batch::run(
            BatchArgs {
                manga_id: manga_id.clone(),
            },
            settings,
        )
        .await
        .context("batch")?;
    }
    if action.refreshes_folders() {
        crate::folders::run(
            FoldersArgs {
                target: Some(manga_id),
            },
            settings,
        )
        .context("folders")?;
    }
    Ok(())
}
