use std::path::{Path, PathBuf};

/// On-disk layout of a manga library rooted at one directory.
///
/// ```text
/// <root>/assets/manga/<Sanitized_Title>/ch-<label>/page-001.png
/// <root>/assets/covers/<catalog id>.<ext>
/// <root>/data/manga.json
/// ```
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manga_root(&self) -> PathBuf {
        self.root.join("assets").join("manga")
    }

    pub fn covers_dir(&self) -> PathBuf {
        self.root.join("assets").join("covers")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("data").join("manga.json")
    }

    pub fn manga_dir(&self, title: &str) -> PathBuf {
        self.manga_root().join(sanitize_title(title))
    }

    pub fn chapter_dir(&self, title: &str, label: &str) -> anyhow::Result<PathBuf> {
        if label.is_empty() || label == "." || label == ".." || label.contains(['/', '\\']) {
            anyhow::bail!("chapter label is not usable as a directory name: {label:?}");
        }
        Ok(self.manga_dir(title).join(format!("{CHAPTER_DIR_PREFIX}{label}")))
    }
}

pub const CHAPTER_DIR_PREFIX: &str = "ch-";

/// Keep ASCII word characters, whitespace and `-`, collapse whitespace runs,
/// then join words with `_`.
pub fn sanitize_title(title: &str) -> String {
    let kept = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `page-001.png` for the first page of a source file named `x1-abc.png`.
pub fn page_file_name(index: usize, source_file: &str) -> String {
    let ext = Path::new(source_file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("page-{:03}{ext}", index + 1)
}
