//! Archive text download: fetch the OCR plaintext of one book by identifier.
//!
//! The archive serves the full-text derivative of every scanned item at
//! `/download/{id}/{id}_djvu.txt`. Bodies can run to tens of megabytes, so
//! the response is streamed and cut at `max_download_bytes`; a truncated
//! book still has plenty of narrative for sampling.
//!
//! ## Retry Strategy
//!
//! Timeouts, connection resets, HTTP 429 and 5xx are transient and retried
//! with exponential backoff (`retry_backoff_ms * 2^(attempt - 1)`). Any other
//! non-success status (404 for a missing derivative, 403 for a restricted
//! item) fails immediately: asking again will not change the answer.

use crate::config::SamplerConfig;
use crate::error::{BookError, SamplerError};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Text downloaded for one book.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub text: String,
    /// Retries spent before the successful attempt.
    pub retries: u32,
    /// The body exceeded `max_download_bytes` and was cut.
    pub truncated: bool,
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptError {
    Timeout,
    Transport(String),
    Status(u16),
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        match self {
            AttemptError::Timeout | AttemptError::Transport(_) => true,
            AttemptError::Status(s) => *s == 429 || (500..600).contains(s),
        }
    }

    fn into_book_error(self, identifier: &str, config: &SamplerConfig, retries: u32) -> BookError {
        let identifier = identifier.to_string();
        match self {
            AttemptError::Timeout => BookError::FetchTimeout {
                identifier,
                secs: config.download_timeout_secs,
                retries,
            },
            AttemptError::Transport(detail) => BookError::FetchFailed {
                identifier,
                retries,
                detail,
            },
            AttemptError::Status(status) => BookError::HttpStatus {
                identifier,
                status,
                retries,
            },
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AttemptError::Timeout
        } else {
            AttemptError::Transport(e.to_string())
        }
    }
}

/// Build the HTTP client shared by search and download.
pub fn build_client(config: &SamplerConfig) -> Result<reqwest::Client, SamplerError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(|e| SamplerError::Internal(format!("HTTP client: {e}")))
}

/// Archive identifiers are path segments: letters, digits, `.`, `_`, `-`.
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier != "."
        && identifier != ".."
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Download URL of the plaintext derivative for `identifier`.
pub fn text_url(base_url: &str, identifier: &str) -> String {
    format!(
        "{}/download/{identifier}/{identifier}_djvu.txt",
        base_url.trim_end_matches('/')
    )
}

/// Download the plaintext of `identifier`, retrying transient failures.
///
/// An empty body is reported as [`BookError::EmptyText`] so the extraction
/// core is only ever handed a successful fetch.
pub async fn fetch_text(
    client: &reqwest::Client,
    config: &SamplerConfig,
    identifier: &str,
) -> Result<FetchedText, BookError> {
    if !is_valid_identifier(identifier) {
        return Err(BookError::InvalidIdentifier {
            identifier: identifier.to_string(),
        });
    }

    let url = text_url(&config.archive_base_url, identifier);
    let mut last_err: Option<AttemptError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config
                .retry_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!(
                "{}: retry {}/{} after {}ms",
                identifier, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match fetch_once(client, &url, config.max_download_bytes).await {
            Ok((text, truncated)) => {
                if text.trim().is_empty() {
                    return Err(BookError::EmptyText {
                        identifier: identifier.to_string(),
                    });
                }
                if truncated {
                    warn!(
                        "{}: text truncated at {} bytes",
                        identifier, config.max_download_bytes
                    );
                }
                debug!("{}: downloaded {} bytes", identifier, text.len());
                return Ok(FetchedText {
                    text,
                    retries: attempt,
                    truncated,
                });
            }
            Err(e) if e.is_transient() => {
                warn!("{}: attempt {} failed: {:?}", identifier, attempt + 1, e);
                last_err = Some(e);
            }
            Err(e) => return Err(e.into_book_error(identifier, config, attempt)),
        }
    }

    Err(last_err
        .unwrap_or_else(|| AttemptError::Transport("no attempt made".into()))
        .into_book_error(identifier, config, config.max_retries))
}

async fn fetch_once(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<(String, bool), AttemptError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AttemptError::Status(status.as_u16()));
    }

    let mut body: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        let room = max_bytes.saturating_sub(body.len());
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        body.extend_from_slice(&chunk);
    }

    let text = String::from_utf8_lossy(&body);
    Ok((text.trim_start_matches('\u{FEFF}').to_string(), truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("mobydickorwhale00melv"));
        assert!(is_valid_identifier("pride_and_prejudice-1813.v2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier(".."));
        assert!(!is_valid_identifier("../etc/passwd"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("a?b=c"));
    }

    #[test]
    fn test_text_url() {
        assert_eq!(
            text_url("https://archive.org/", "abc"),
            "https://archive.org/download/abc/abc_djvu.txt"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(AttemptError::Timeout.is_transient());
        assert!(AttemptError::Status(503).is_transient());
        assert!(AttemptError::Status(429).is_transient());
        assert!(!AttemptError::Status(404).is_transient());
        assert!(!AttemptError::Status(403).is_transient());
    }

    #[test]
    fn test_status_maps_to_http_error() {
        let config = SamplerConfig::default();
        let e = AttemptError::Status(404).into_book_error("abc", &config, 0);
        assert_eq!(
            e,
            BookError::HttpStatus {
                identifier: "abc".into(),
                status: 404,
                retries: 0,
            }
        );
    }

    #[test]
    fn test_exhausted_retries_are_carried() {
        let config = SamplerConfig::default();
        let e = AttemptError::Status(503).into_book_error("abc", &config, 3);
        assert_eq!(e.retries(), 3);
        let e = AttemptError::Timeout.into_book_error("abc", &config, 2);
        assert_eq!(e.retries(), 2);
    }
}
