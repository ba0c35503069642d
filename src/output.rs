//! Result types returned by the sampler and the extraction core.

use crate::config::GateMode;
use crate::error::BookError;
use serde::{Deserialize, Serialize};

/// One catalog record returned by the archive search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Archive identifier, used to build the download path.
    pub identifier: String,
    pub title: Option<String>,
    pub creator: Option<String>,
}

impl BookRecord {
    /// A record carrying only an identifier (used when the caller names a book directly).
    pub fn bare(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            creator: None,
        }
    }
}

/// The language gate's decision for one document, with the statistics behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageVerdict {
    pub accepted: bool,
    pub mode: GateMode,
    /// ASCII letters / analysable characters of the inspected text.
    pub alpha_ratio: f64,
    /// Distinct common words found (strict mode only; 0 in lenient mode).
    pub common_words: usize,
    /// Characters left after stripping digits and punctuation.
    pub analyzable_chars: usize,
}

/// What the extraction core produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub verdict: LanguageVerdict,
    /// Lines in the raw text.
    pub lines_total: usize,
    /// Lines surviving the content filter (0 when the gate rejected the text).
    pub lines_kept: usize,
    /// Accepted sentences in document order.
    pub sentences: Vec<String>,
}

/// Outcome of processing a single book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// Passed the language gate and yielded at least one sentence.
    Accepted,
    /// Rejected by the language gate.
    NotEnglish,
    /// Passed the language gate but no sentence survived the filters.
    NoSentences,
    /// The text could not be downloaded.
    Failed,
}

/// Per-book result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResult {
    pub record: BookRecord,
    pub status: BookStatus,
    /// Characters in the downloaded text.
    pub raw_chars: usize,
    pub sentence_count: usize,
    /// Every accepted sentence, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sentences: Vec<String>,
    pub duration_ms: u64,
    /// Download retries spent on this book.
    pub retries: u32,
    pub error: Option<BookError>,
}

/// A sentence drawn into the final sample, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledSentence {
    pub text: String,
    pub identifier: String,
    pub title: Option<String>,
    pub creator: Option<String>,
}

/// Aggregate counters for a sampling run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleStats {
    /// Records returned by the catalog search.
    pub books_found: usize,
    /// Records selected for download.
    pub books_selected: usize,
    pub books_accepted: usize,
    pub books_not_english: usize,
    pub books_without_sentences: usize,
    pub books_failed: usize,
    /// Sentences extracted across all accepted books.
    pub sentences_extracted: usize,
    /// Sentences in the final sample.
    pub sentences_sampled: usize,
    pub total_duration_ms: u64,
    pub fetch_duration_ms: u64,
}

/// Everything a sampling run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleOutput {
    /// The catalog query, or the identifier for single-book runs.
    pub query: String,
    pub sentences: Vec<SampledSentence>,
    /// Per-book results in selection order.
    pub books: Vec<BookResult>,
    pub stats: SampleStats,
}

impl SampleOutput {
    /// The sampled sentences as plain text, one per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for s in &self.sentences {
            out.push_str(&s.text);
            out.push('\n');
        }
        out
    }
}
