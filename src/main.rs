use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use mangaview::cli::{Cli, Command};
use mangaview::config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    mangaview::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let settings = Settings::from_env()
        .context("load settings")?
        .with_overrides(&cli.global);

    match cli.command {
        Command::Batch(args) => {
            mangaview::batch::run(args, &settings).await.context("batch")?;
        }
        Command::Chapter(args) => {
            mangaview::chapter::run(args, &settings)
                .await
                .context("chapter")?;
        }
        Command::Add(args) => {
            mangaview::add::run(args, &settings).await.context("add")?;
        }
        Command::Metadata(args) => {
            mangaview::metadata::run(args, &settings)
                .await
                .context("metadata")?;
        }
        Command::Folders(args) => {
            mangaview::folders::run(args, &settings).context("folders")?;
        }
        Command::Link(args) => {
            mangaview::link::run(args, &settings).await.context("link")?;
        }
        Command::Serve(args) => {
            mangaview::serve::run(args, &settings).await.context("serve")?;
        }
    }

    Ok(())
}
