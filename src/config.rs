use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;

use crate::cli::GlobalArgs;
use crate::library::Library;

pub const DEFAULT_API_BASE_URL: &str = "https://api.mangadex.org";
pub const DEFAULT_UPLOADS_BASE_URL: &str = "https://uploads.mangadex.org";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_DELAY_MS: u64 = 750;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub uploads_base_url: String,
    pub root: PathBuf,
    pub language: String,
    /// Pause between consecutive chapter downloads.
    pub delay: Duration,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            uploads_base_url: DEFAULT_UPLOADS_BASE_URL.to_owned(),
            root: PathBuf::from("."),
            language: DEFAULT_LANGUAGE.to_owned(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut settings = Self::default();

        if let Some(value) = env_var("MANGAVIEW_API_BASE_URL") {
            settings.api_base_url = value;
        }
        if let Some(value) = env_var("MANGAVIEW_UPLOADS_BASE_URL") {
            settings.uploads_base_url = value;
        }
        if let Some(value) = env_var("MANGAVIEW_ROOT") {
            settings.root = PathBuf::from(value);
        }
        if let Some(value) = env_var("MANGAVIEW_LANGUAGE") {
            settings.language = value;
        }
        if let Some(value) = env_var("MANGAVIEW_DELAY_MS") {
            let ms = value
                .parse::<u64>()
                .with_context(|| format!("parse MANGAVIEW_DELAY_MS: {value}"))?;
            settings.delay = Duration::from_millis(ms);
        }
        if let Some(value) = env_var("MANGAVIEW_HTTP_TIMEOUT_SECS") {
            let secs = value
                .parse::<u64>()
                .with_context(|| format!("parse MANGAVIEW_HTTP_TIMEOUT_SECS: {value}"))?;
            settings.http_timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, args: &GlobalArgs) -> Self {
        if let Some(value) = &args.api_base_url {
            self.api_base_url = value.clone();
        }
        if let Some(value) = &args.uploads_base_url {
            self.uploads_base_url = value.clone();
        }
        if let Some(value) = &args.root {
            self.root = PathBuf::from(value);
        }
        if let Some(value) = &args.language {
            self.language = value.clone();
        }
        if let Some(ms) = args.delay_ms {
            self.delay = Duration::from_millis(ms);
        }
        if let Some(secs) = args.http_timeout_secs {
            self.http_timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn library(&self) -> Library {
        Library::new(&self.root)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
