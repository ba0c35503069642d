//! # prose-sampler
//!
//! Pull clean, presentable sentences out of noisy public-domain book scans.
//!
//! ## Why this crate?
//!
//! The plaintext derivatives of archive scans are full of things that are not
//! prose: licence boilerplate, tables of contents, OCR debris and, for texts
//! harvested from web pages, whole style sheets and script blocks. This crate
//! filters a document down to its narrative lines, splits it into sentences,
//! rejects anything that does not read like an English sentence, and draws a
//! small random sample across several books.
//!
//! ## Pipeline Overview
//!
//! ```text
//! query
//!  │
//!  ├─ 1. Search    catalog hits for the query (texts only)
//!  ├─ 2. Select    shuffle, keep `max_books`
//!  ├─ 3. Fetch     download each plaintext, retry transient failures
//!  ├─ 4. Gate      reject documents that are not English
//!  ├─ 5. Filter    drop markup noise and the front-matter prefix
//!  ├─ 6. Extract   normalise, segment, judge each sentence
//!  └─ 7. Sample    draw `sample_size` sentences from the pool
//! ```
//!
//! Steps 4-6 are pure functions of the document text, exposed directly as
//! [`is_likely_english`], [`filter`], [`extract`] and [`run`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prose_sampler::{sample, SamplerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SamplerConfig::builder()
//!         .max_books(3)
//!         .sample_size(5)
//!         .build()?;
//!     let output = sample("sea stories", &config).await?;
//!     for s in &output.sentences {
//!         println!("{}  ({})", s.text, s.identifier);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Offline Extraction
//!
//! ```rust
//! use prose_sampler::{run, ExtractionConfig};
//!
//! let text = "It was a cold night. The wind howled over the moor.";
//! let out = run(text, &ExtractionConfig::default());
//! assert_eq!(out.sentences, vec!["It was a cold night.", "The wind howled over the moor."]);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `prose-sample` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! prose-sampler = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sample;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, FilterMode, GateMode, SamplerConfig, SamplerConfigBuilder,
    DEFAULT_COMMON_WORDS,
};
pub use error::{BookError, SamplerError};
pub use output::{
    BookRecord, BookResult, BookStatus, DocumentExtraction, LanguageVerdict, SampleOutput,
    SampleStats, SampledSentence,
};
pub use pipeline::extract::extract;
pub use pipeline::filter::filter;
pub use pipeline::language::is_likely_english;
pub use pipeline::run;
pub use progress::{NoopProgressCallback, ProgressCallback, SamplingProgressCallback};
pub use sample::{extract_file, sample, sample_book, sample_sync, sample_to_file};
pub use stream::{sample_stream, BookStream};
