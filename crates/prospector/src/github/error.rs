//! Upstream API error types.

use thiserror::Error;

/// Errors that can occur when talking to the source-hosting API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected status {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("client error: {0}")]
    Internal(String),
}

impl GitHubError {
    /// Whether the error came from the network rather than the API itself.
    ///
    /// Transport failures are worth retrying with backoff; everything else
    /// reflects a definitive answer from the server.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, GitHubError::Transport { .. })
    }
}

/// Render a response body for logging, clipped so a large error page does
/// not flood the log.
#[must_use]
pub fn body_excerpt(body: &[u8]) -> String {
    const MAX: usize = 256;
    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX {
        text.into_owned()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}
