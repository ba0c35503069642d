//! Catalog search: turn a free-text query into candidate book records.
//!
//! Uses the archive's `advancedsearch.php` endpoint, restricted to the
//! `texts` media type so every hit has a plaintext derivative to fetch.

use crate::config::SamplerConfig;
use crate::error::SamplerError;
use crate::output::BookRecord;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "numFound", default)]
    num_found: usize,
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    title: Option<OneOrMany>,
    #[serde(default)]
    creator: Option<OneOrMany>,
}

/// Catalog fields are a string for one value and an array for several.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn joined(self) -> Option<String> {
        let s = match self {
            OneOrMany::One(s) => s,
            OneOrMany::Many(v) => v.join("; "),
        };
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    }
}

/// The `q` parameter for a user query.
pub fn build_query(query: &str, english_only: bool) -> String {
    let mut q = format!("({}) AND mediatype:texts", query.trim());
    if english_only {
        q.push_str(" AND language:(eng OR English)");
    }
    q
}

/// Decode an `advancedsearch.php` JSON body into records.
///
/// Records without an identifier cannot be fetched and are dropped.
pub fn parse_search_response(body: &str, query: &str) -> Result<Vec<BookRecord>, SamplerError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|e| SamplerError::SearchFailed {
            query: query.to_string(),
            reason: format!("unreadable catalog response: {e}"),
        })?;

    debug!(
        "catalog reports {} matches, {} returned",
        envelope.response.num_found,
        envelope.response.docs.len()
    );

    Ok(envelope
        .response
        .docs
        .into_iter()
        .filter_map(|doc| {
            let identifier = doc.identifier?.trim().to_string();
            if identifier.is_empty() {
                return None;
            }
            Some(BookRecord {
                identifier,
                title: doc.title.and_then(OneOrMany::joined),
                creator: doc.creator.and_then(OneOrMany::joined),
            })
        })
        .collect())
}

/// Search the archive catalog for texts matching `query`.
pub async fn search_books(
    client: &reqwest::Client,
    config: &SamplerConfig,
    query: &str,
) -> Result<Vec<BookRecord>, SamplerError> {
    if query.trim().is_empty() {
        return Err(SamplerError::InvalidInput {
            input: query.to_string(),
            reason: "search query is empty".to_string(),
        });
    }

    let url = format!("{}/advancedsearch.php", config.archive_base_url);
    let q = build_query(query, config.english_only);
    let rows = config.search_rows.to_string();
    info!("Searching catalog: {}", q);

    let response = client
        .get(&url)
        .query(&[
            ("q", q.as_str()),
            ("fl[]", "identifier"),
            ("fl[]", "title"),
            ("fl[]", "creator"),
            ("rows", rows.as_str()),
            ("page", "1"),
            ("output", "json"),
        ])
        .send()
        .await
        .map_err(|e| request_error(e, query, config))?;

    if !response.status().is_success() {
        return Err(SamplerError::SearchFailed {
            query: query.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| request_error(e, query, config))?;

    let records = parse_search_response(&body, query)?;
    info!("Catalog returned {} books", records.len());
    Ok(records)
}

fn request_error(e: reqwest::Error, query: &str, config: &SamplerConfig) -> SamplerError {
    if e.is_timeout() {
        SamplerError::SearchTimeout {
            query: query.to_string(),
            secs: config.download_timeout_secs,
        }
    } else {
        SamplerError::SearchFailed {
            query: query.to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query(" whale ", false),
            "(whale) AND mediatype:texts"
        );
        assert_eq!(
            build_query("whale", true),
            "(whale) AND mediatype:texts AND language:(eng OR English)"
        );
    }

    #[test]
    fn test_parse_mixed_fields() {
        let body = r#"{
            "responseHeader": {"status": 0},
            "response": {
                "numFound": 3,
                "start": 0,
                "docs": [
                    {"identifier": "mobydick00melv", "title": "Moby Dick", "creator": "Melville, Herman"},
                    {"identifier": "omnibus01", "title": ["Tales", "Vol. 1"], "creator": ["Poe", "Hawthorne"]},
                    {"title": "No identifier here"}
                ]
            }
        }"#;
        let records = parse_search_response(body, "q").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "mobydick00melv");
        assert_eq!(records[0].creator.as_deref(), Some("Melville, Herman"));
        assert_eq!(records[1].title.as_deref(), Some("Tales; Vol. 1"));
        assert_eq!(records[1].creator.as_deref(), Some("Poe; Hawthorne"));
    }

    #[test]
    fn test_parse_missing_optional_fields() {
        let body = r#"{"response": {"docs": [{"identifier": "bare01"}]}}"#;
        let records = parse_search_response(body, "q").unwrap();
        assert_eq!(records, vec![BookRecord::bare("bare01")]);
    }

    #[test]
    fn test_parse_garbage_is_search_failure() {
        let err = parse_search_response("<html>busy</html>", "q").unwrap_err();
        assert!(matches!(err, SamplerError::SearchFailed { .. }));
    }
}
