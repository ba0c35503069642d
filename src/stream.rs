//! Streaming sampling API: emit books as they complete.
//!
//! Unlike the eager [`crate::sample::sample`], which returns only after every
//! selected book has been fetched, [`sample_stream`] yields each
//! [`BookResult`] as soon as it is ready. Books arrive in completion order;
//! callers that want a sample draw from the sentences themselves.

use crate::config::SamplerConfig;
use crate::error::{BookError, SamplerError};
use crate::output::BookResult;
use crate::pipeline::fetch;
use crate::sample::{make_rng, process_book, select};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-book results.
pub type BookStream = Pin<Box<dyn Stream<Item = Result<BookResult, BookError>> + Send>>;

/// Search the archive and stream results for a random selection of hits.
///
/// Books rejected by the language gate, or yielding no sentences, arrive as
/// `Ok` with the matching [`crate::output::BookStatus`]; only download
/// failures arrive as `Err`.
///
/// # Returns
/// - `Ok(BookStream)` — a stream of `Result<BookResult, BookError>`
/// - `Err(SamplerError)` — fatal error (empty query, search failed, no hits)
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use prose_sampler::{sample_stream, SamplerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SamplerConfig::default();
/// let mut books = sample_stream("sea stories", &config).await?;
/// while let Some(book) = books.next().await {
///     match book {
///         Ok(b) => println!("{}: {} sentences", b.record.identifier, b.sentence_count),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn sample_stream(
    query: impl AsRef<str>,
    config: &SamplerConfig,
) -> Result<BookStream, SamplerError> {
    let query = query.as_ref();
    info!("Starting streaming sampling run: {}", query);

    let client = fetch::build_client(config)?;
    let mut rng = make_rng(config.seed);
    let (selected, _found) = select(&client, query, config, &mut rng).await?;

    let total = selected.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_sampling_start(total);
    }

    let concurrency = config.concurrency;
    let config = config.clone();

    let s = stream::iter(selected.into_iter().enumerate().map(move |(i, record)| {
        let client = client.clone();
        let cfg = config.clone();
        async move {
            let mut result = process_book(&client, &record, i + 1, total, &cfg).await;
            match result.error.take() {
                Some(e) => Err(e),
                None => Ok(result),
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
