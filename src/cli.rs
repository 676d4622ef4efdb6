use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the `MANGAVIEW_*` environment settings.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// MangaDex API base URL.
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// MangaDex uploads base URL (covers).
    #[arg(long, global = true)]
    pub uploads_base_url: Option<String>,

    /// Library root holding `assets/` and `data/`.
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// Translated language to list chapters in.
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Pause between chapter downloads.
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    #[arg(long, global = true)]
    pub http_timeout_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download every chapter of a manga, asking which group to take on conflicts.
    Batch(BatchArgs),
    /// Download one chapter by id, or by manga id and chapter number.
    Chapter(ChapterArgs),
    /// Add a manga to the catalog and fetch its cover.
    Add(AddArgs),
    /// Refresh catalog metadata for a manga.
    Metadata(MetadataArgs),
    /// Record downloaded chapter folders in the catalog.
    Folders(FoldersArgs),
    /// Act on a MangaDex chapter or title URL.
    Link(LinkArgs),
    /// Serve the library over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    pub manga_id: String,
}

#[derive(Debug, Args)]
pub struct ChapterArgs {
    /// Chapter id, or a manga id when NUMBER is given.
    pub target: String,

    /// Chapter number within the manga.
    pub number: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub manga_id: String,

    /// Download a thumbnail instead of the full cover.
    #[arg(long, value_enum)]
    pub thumbnail: Option<ThumbnailSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThumbnailSize {
    #[value(name = "256")]
    Small,
    #[value(name = "512")]
    Medium,
}

impl ThumbnailSize {
    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 256,
            Self::Medium => 512,
        }
    }
}

#[derive(Debug, Args)]
pub struct MetadataArgs {
    pub manga_id: String,
}

#[derive(Debug, Args)]
pub struct FoldersArgs {
    /// Slug or uuid; every catalog entry when omitted.
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct LinkArgs {
    pub url: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (default: 0.0.0.0 on $PORT, or 3000).
    #[arg(long)]
    pub addr: Option<SocketAddr>,

    /// Web app directory; its `index.html` answers unknown paths.
    #[arg(long, default_value = "web")]
    pub web_dir: PathBuf,
}
