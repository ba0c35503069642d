//! Eager (whole-run) sampling entry points.
//!
//! [`sample`] waits for every selected book, pools their sentences and
//! returns the drawn sample together with per-book results. Use
//! [`crate::stream::sample_stream`] instead to receive books as they finish.

use crate::config::{ExtractionConfig, SamplerConfig};
use crate::error::{BookError, SamplerError};
use crate::output::{
    BookRecord, BookResult, BookStatus, DocumentExtraction, SampleOutput, SampleStats,
    SampledSentence,
};
use crate::pipeline::{self, fetch, search};
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Search the archive for `query`, then sample sentences from a random
/// selection of the hits.
///
/// # Returns
/// `Ok(SampleOutput)` whenever at least one book was downloaded, even if
/// no sentence survived (check `output.sentences.is_empty()`).
///
/// # Errors
/// - [`SamplerError::InvalidInput`] for an empty query
/// - [`SamplerError::SearchFailed`] / [`SamplerError::SearchTimeout`]
/// - [`SamplerError::NoBooksFound`] when the catalog has no hits
/// - [`SamplerError::AllBooksFailed`] when no selected book could be fetched
pub async fn sample(
    query: impl AsRef<str>,
    config: &SamplerConfig,
) -> Result<SampleOutput, SamplerError> {
    let total_start = Instant::now();
    let query = query.as_ref();
    info!("Starting sampling run: {}", query);

    let client = fetch::build_client(config)?;
    let mut rng = make_rng(config.seed);
    let (selected, found) = select(&client, query, config, &mut rng).await?;

    collect(query, &client, selected, found, config, &mut rng, total_start).await
}

/// Sample sentences from one named book, skipping the catalog search.
pub async fn sample_book(
    identifier: impl AsRef<str>,
    config: &SamplerConfig,
) -> Result<SampleOutput, SamplerError> {
    let total_start = Instant::now();
    let identifier = identifier.as_ref().trim();
    if !fetch::is_valid_identifier(identifier) {
        return Err(SamplerError::InvalidInput {
            input: identifier.to_string(),
            reason: "archive identifiers contain only letters, digits, '.', '_' and '-'"
                .to_string(),
        });
    }
    info!("Sampling single book: {}", identifier);

    let client = fetch::build_client(config)?;
    let mut rng = make_rng(config.seed);
    let selected = vec![BookRecord::bare(identifier)];

    collect(identifier, &client, selected, 1, config, &mut rng, total_start).await
}

/// Sample and write the drawn sentences to a file, one per line.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn sample_to_file(
    query: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &SamplerConfig,
) -> Result<SampleStats, SamplerError> {
    let output = sample(query, config).await?;
    write_atomic(output_path.as_ref(), &output.to_text()).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`sample`].
///
/// Creates a temporary tokio runtime internally.
pub fn sample_sync(
    query: impl AsRef<str>,
    config: &SamplerConfig,
) -> Result<SampleOutput, SamplerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SamplerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(sample(query, config))
}

/// Run the extraction core over a local text file.
///
/// Invalid UTF-8 is replaced rather than rejected; scanned texts are
/// rarely clean.
pub async fn extract_file(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, SamplerError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SamplerError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => SamplerError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SamplerError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8_lossy(&bytes);
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(pipeline::run(&text, config))
}

// ── Shared with the streaming API ───────────────────────────────────────

pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Search, then pick up to `max_books` hits at random.
///
/// Returns the selection and the number of catalog hits.
pub(crate) async fn select(
    client: &reqwest::Client,
    query: &str,
    config: &SamplerConfig,
    rng: &mut StdRng,
) -> Result<(Vec<BookRecord>, usize), SamplerError> {
    let records = search::search_books(client, config, query).await?;
    if records.is_empty() {
        return Err(SamplerError::NoBooksFound {
            query: query.to_string(),
        });
    }
    let found = records.len();
    let selected = select_books(records, config.max_books, rng);
    info!("Selected {} of {} books", selected.len(), found);
    Ok((selected, found))
}

fn select_books(mut records: Vec<BookRecord>, max_books: usize, rng: &mut StdRng) -> Vec<BookRecord> {
    records.shuffle(rng);
    records.truncate(max_books);
    records
}

/// Fetch one book and run the extraction core over it.
///
/// `index` is 1-based, as reported to the progress callback.
pub(crate) async fn process_book(
    client: &reqwest::Client,
    record: &BookRecord,
    index: usize,
    total: usize,
    config: &SamplerConfig,
) -> BookResult {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_book_start(index, total, &record.identifier);
    }

    let fetched = match fetch::fetch_text(client, config, &record.identifier).await {
        Ok(f) => f,
        Err(e) => {
            warn!("{}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_book_error(index, total, &e.to_string());
            }
            return failed_result(record, e, start);
        }
    };

    let extraction = pipeline::run(&fetched.text, &config.extraction);
    let status = if !extraction.verdict.accepted {
        BookStatus::NotEnglish
    } else if extraction.sentences.is_empty() {
        BookStatus::NoSentences
    } else {
        BookStatus::Accepted
    };

    if let Some(ref cb) = config.progress_callback {
        match status {
            BookStatus::NotEnglish => cb.on_book_skipped(index, total, "not English"),
            _ => cb.on_book_complete(index, total, extraction.sentences.len()),
        }
    }

    debug!(
        identifier = %record.identifier,
        ?status,
        sentences = extraction.sentences.len(),
        "book processed"
    );

    BookResult {
        record: record.clone(),
        status,
        raw_chars: fetched.text.chars().count(),
        sentence_count: extraction.sentences.len(),
        sentences: extraction.sentences,
        duration_ms: start.elapsed().as_millis() as u64,
        retries: fetched.retries,
        error: None,
    }
}

fn failed_result(
    record: &BookRecord,
    error: BookError,
    start: Instant,
) -> BookResult {
    BookResult {
        record: record.clone(),
        status: BookStatus::Failed,
        raw_chars: 0,
        sentence_count: 0,
        sentences: Vec::new(),
        duration_ms: start.elapsed().as_millis() as u64,
        retries: error.retries(),
        error: Some(error),
    }
}

// ── Internals ───────────────────────────────────────────────────────────

async fn collect(
    query: &str,
    client: &reqwest::Client,
    selected: Vec<BookRecord>,
    found: usize,
    config: &SamplerConfig,
    rng: &mut StdRng,
    total_start: Instant,
) -> Result<SampleOutput, SamplerError> {
    let total = selected.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_sampling_start(total);
    }

    // ── Fetch + extract concurrently ─────────────────────────────────────
    let fetch_start = Instant::now();
    let mut indexed: Vec<(usize, BookResult)> = stream::iter(selected.iter().enumerate())
        .map(|(i, record)| async move {
            (i, process_book(client, record, i + 1, total, config).await)
        })
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    // Selection order, not completion order
    indexed.sort_by_key(|(i, _)| *i);
    let books: Vec<BookResult> = indexed.into_iter().map(|(_, b)| b).collect();

    let failed = books
        .iter()
        .filter(|b| b.status == BookStatus::Failed)
        .count();
    if failed == books.len() {
        let first_error = books
            .iter()
            .find_map(|b| b.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(SamplerError::AllBooksFailed {
            total: books.len(),
            first_error,
        });
    }

    // ── Draw the sample ──────────────────────────────────────────────────
    let sentences = draw_sentences(&books, config.sample_size, rng);

    let count = |status: BookStatus| books.iter().filter(|b| b.status == status).count();
    let stats = SampleStats {
        books_found: found,
        books_selected: total,
        books_accepted: count(BookStatus::Accepted),
        books_not_english: count(BookStatus::NotEnglish),
        books_without_sentences: count(BookStatus::NoSentences),
        books_failed: failed,
        sentences_extracted: books.iter().map(|b| b.sentence_count).sum(),
        sentences_sampled: sentences.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        fetch_duration_ms,
    };

    info!(
        "Sampling complete: {} sentences from {}/{} books, {}ms total",
        stats.sentences_sampled, stats.books_accepted, total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_sampling_complete(total, stats.books_accepted + stats.books_without_sentences);
    }

    Ok(SampleOutput {
        query: query.to_string(),
        sentences,
        books,
        stats,
    })
}

/// Draw up to `n` sentences uniformly from every accepted book's sentences.
fn draw_sentences(books: &[BookResult], n: usize, rng: &mut StdRng) -> Vec<SampledSentence> {
    let pool: Vec<(&BookRecord, &String)> = books
        .iter()
        .filter(|b| b.status == BookStatus::Accepted)
        .flat_map(|b| b.sentences.iter().map(move |s| (&b.record, s)))
        .collect();

    pool.choose_multiple(rng, n)
        .map(|(record, text)| SampledSentence {
            text: (*text).clone(),
            identifier: record.identifier.clone(),
            title: record.title.clone(),
            creator: record.creator.clone(),
        })
        .collect()
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), SamplerError> {
    let write_err = |e| SamplerError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
