//! Error types for the prose-sampler library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SamplerError`] — **Fatal**: the sampling run cannot proceed at all
//!   (empty query, catalog unreachable, every book failed). Returned as
//!   `Err(SamplerError)` from the top-level `sample*` functions.
//!
//! * [`BookError`] — **Non-fatal**: a single book could not be fetched
//!   (404, transient network error) but the other books are fine. Stored
//!   inside [`crate::output::BookResult`] so callers can inspect partial
//!   success rather than losing the whole run to one bad identifier.
//!
//! The extraction core itself has no error type. A document rejected by the
//! language gate, or one that yields no sentences, is an ordinary outcome
//! reported through [`crate::output::BookStatus`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the prose-sampler library.
///
/// Book-level failures use [`BookError`] and are stored in
/// [`crate::output::BookResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SamplerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller supplied an unusable query or identifier.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// Local text file was not found at the given path.
    #[error("Text file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// The catalog search request failed or returned an unreadable body.
    #[error("Catalog search failed for '{query}': {reason}\nCheck your internet connection.")]
    SearchFailed { query: String, reason: String },

    /// The catalog search exceeded the configured timeout.
    #[error("Catalog search timed out after {secs}s for '{query}'\nIncrease --download-timeout.")]
    SearchTimeout { query: String, secs: u64 },

    /// The catalog returned no usable records for the query.
    #[error("No books found for '{query}'")]
    NoBooksFound { query: String },

    /// Every selected book failed to download; the sample would be empty.
    #[error("All {total} books failed to download.\nFirst error: {first_error}")]
    AllBooksFailed { total: usize, first_error: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single book.
///
/// Stored alongside [`crate::output::BookResult`] when a fetch fails.
/// The overall run continues unless ALL books fail.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum BookError {
    /// The identifier contains characters that cannot appear in an archive path.
    #[error("'{identifier}' is not a valid archive identifier")]
    InvalidIdentifier { identifier: String },

    /// Transport-level failure after all retries.
    #[error("'{identifier}': download failed after {retries} retries: {detail}")]
    FetchFailed {
        identifier: String,
        retries: u32,
        detail: String,
    },

    /// Download exceeded the configured timeout on every attempt.
    #[error("'{identifier}': download timed out after {secs}s ({retries} retries)")]
    FetchTimeout {
        identifier: String,
        secs: u64,
        retries: u32,
    },

    /// The archive answered with a non-success status.
    ///
    /// `retries` is non-zero only for transient statuses (429, 5xx).
    #[error("'{identifier}': archive returned HTTP {status}")]
    HttpStatus {
        identifier: String,
        status: u16,
        retries: u32,
    },

    /// The archive answered successfully but the body was empty.
    #[error("'{identifier}': archive returned an empty text")]
    EmptyText { identifier: String },
}

impl BookError {
    /// The archive identifier the error refers to.
    pub fn identifier(&self) -> &str {
        match self {
            BookError::InvalidIdentifier { identifier }
            | BookError::FetchFailed { identifier, .. }
            | BookError::FetchTimeout { identifier, .. }
            | BookError::HttpStatus { identifier, .. }
            | BookError::EmptyText { identifier } => identifier,
        }
    }

    /// Retries spent before giving up.
    pub fn retries(&self) -> u32 {
        match self {
            BookError::FetchFailed { retries, .. }
            | BookError::FetchTimeout { retries, .. }
            | BookError::HttpStatus { retries, .. } => *retries,
            BookError::InvalidIdentifier { .. } | BookError::EmptyText { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_books_failed_display() {
        let e = SamplerError::AllBooksFailed {
            total: 4,
            first_error: "'abc': archive returned HTTP 404".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 4 books"), "got: {msg}");
        assert!(msg.contains("HTTP 404"), "got: {msg}");
    }

    #[test]
    fn search_timeout_display() {
        let e = SamplerError::SearchTimeout {
            query: "whaling".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("whaling"));
    }

    #[test]
    fn http_status_display() {
        let e = BookError::HttpStatus {
            identifier: "mobydick00melv".into(),
            status: 503,
            retries: 3,
        };
        assert!(e.to_string().contains("HTTP 503"));
        assert_eq!(e.identifier(), "mobydick00melv");
        assert_eq!(e.retries(), 3);
    }

    #[test]
    fn book_error_round_trips_through_json() {
        let e = BookError::FetchTimeout {
            identifier: "x".into(),
            secs: 5,
            retries: 2,
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: BookError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
