use anyhow::Context as _;

/// Used when `RUST_LOG` is unset: our own events at info, dependencies at warn.
const DEFAULT_FILTER: &str = "warn,mangaview=info,tower_http=info";

/// Installs the stderr subscriber. Stdout stays free for prompts and results.
pub fn init() -> anyhow::Result<()> {
    let filter = match std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            tracing_subscriber::EnvFilter::try_new(&directives)
                .with_context(|| format!("parse RUST_LOG: {directives}"))?
        }
        _ => tracing_subscriber::EnvFilter::try_new(DEFAULT_FILTER).context("build log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
