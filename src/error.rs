/// Number of body characters kept in a [`ApiError::Transport`] diagnostic.
pub const SNIPPET_CHARS: usize = 200;

/// Failure talking to the remote catalog. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("[{label}] response error ({status}): {snippet}")]
    Transport {
        label: String,
        status: u16,
        snippet: String,
    },

    #[error("[{label}] request failed")]
    Request {
        label: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[{label}] unexpected response body")]
    Decode {
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn transport(label: &str, status: u16, body: &str) -> Self {
        Self::Transport {
            label: label.to_owned(),
            status,
            snippet: body.chars().take(SNIPPET_CHARS).collect(),
        }
    }
}

/// A query matched nothing; ends the current run.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NotFound(pub String);

/// A prompt answer that is neither `a` nor an index in `1..=options`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid choice {answer:?} (expected 1-{options} or a)")]
pub struct InvalidSelection {
    pub answer: String,
    pub options: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_truncates_body_by_characters() {
        let body = "é".repeat(SNIPPET_CHARS + 50);
        let err = ApiError::transport("getAllChapterData", 503, &body);
        let ApiError::Transport { snippet, status, .. } = &err else {
            panic!("expected transport error, got {err:?}");
        };
        assert_eq!(*status, 503);
        assert_eq!(snippet.chars().count(), SNIPPET_CHARS);
        assert!(err.to_string().starts_with("[getAllChapterData] response error (503): "));
    }

    #[test]
    fn invalid_selection_names_the_valid_range() {
        let err = InvalidSelection {
            answer: "9".to_owned(),
            options: 3,
        };
        assert_eq!(err.to_string(), r#"invalid choice "9" (expected 1-3 or a)"#);
    }
}
