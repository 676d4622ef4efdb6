use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::Context as _;
use axum::Router;
use axum::routing::get;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cli::ServeArgs;
use crate::config::Settings;

pub const DEFAULT_PORT: u16 = 3000;
pub const ALIVE_MESSAGE: &str = "MangaView CLI is alive!";

/// `/assets` and `/data` come from the library root; anything else falls back
/// to the web app's `index.html` when one exists.
pub fn router(root: &Path, web_dir: &Path) -> Router {
    let router = Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .nest_service("/assets", ServeDir::new(root.join("assets")))
        .nest_service("/data", ServeDir::new(root.join("data")));

    let index = web_dir.join("index.html");
    let router = if index.is_file() {
        router.fallback_service(ServeDir::new(web_dir).not_found_service(ServeFile::new(index)))
    } else {
        router.fallback(|| async { ALIVE_MESSAGE })
    };

    router.layer(TraceLayer::new_for_http())
}

fn default_addr() -> anyhow::Result<SocketAddr> {
    let port = match std::env::var("PORT") {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u16>()
            .with_context(|| format!("parse PORT: {value}"))?,
        _ => DEFAULT_PORT,
    };
    Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
}

pub async fn run(args: ServeArgs, settings: &Settings) -> anyhow::Result<()> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => default_addr()?,
    };
    let library = settings.library();
    let app = router(library.root(), &args.web_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind: {addr}"))?;
    tracing::info!(%addr, root = %library.root().display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn(app: Router) -> anyhow::Result<String> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }

    #[tokio::test]
    async fn serves_library_files_and_falls_back_to_alive_message() -> anyhow::Result<()> {
        let root = tempfile::TempDir::new()?;
        std::fs::create_dir_all(root.path().join("data"))?;
        std::fs::write(root.path().join("data/manga.json"), "[]\n")?;
        std::fs::create_dir_all(root.path().join("assets/covers"))?;
        std::fs::write(root.path().join("assets/covers/000001.jpg"), b"jpg")?;

        let base = spawn(router(root.path(), &root.path().join("no-web"))).await?;

        let health = reqwest::get(format!("{base}/healthz")).await?;
        assert_eq!(health.text().await?, "ok\n");
        let catalog = reqwest::get(format!("{base}/data/manga.json")).await?;
        assert_eq!(catalog.text().await?, "[]\n");
        let cover = reqwest::get(format!("{base}/assets/covers/000001.jpg")).await?;
        assert_eq!(cover.bytes().await?.as_ref(), b"jpg");
        let other = reqwest::get(format!("{base}/library")).await?;
        assert_eq!(other.text().await?, ALIVE_MESSAGE);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_paths_get_the_web_index() -> anyhow::Result<()> {
        let root = tempfile::TempDir::new()?;
        let web = root.path().join("web");
        std::fs::create_dir_all(&web)?;
        std::fs::write(web.join("index.html"), "<h1>MangaView</h1>")?;

        let base = spawn(router(root.path(), &web)).await?;
        let page = reqwest::get(format!("{base}/read/000001/1")).await?;
        assert_eq!(page.text().await?, "<h1>MangaView</h1>");
        Ok(())
    }
}
