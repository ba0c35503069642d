//! Configuration types for sentence sampling.
//!
//! Two structs split the knobs by concern:
//!
//! * [`ExtractionConfig`] — every heuristic constant used by the pure
//!   extraction core (front-matter skip, sentence length bounds, ratio
//!   thresholds, word lists) plus the [`FilterMode`] / [`GateMode`] strategy
//!   choice. It is serialisable so a tuned rule set can be kept in a JSON
//!   file and loaded by the CLI.
//! * [`SamplerConfig`] — the I/O side: archive endpoint, how many books and
//!   sentences to draw, concurrency, retries, RNG seed. It embeds an
//!   `ExtractionConfig` and is built via [`SamplerConfigBuilder`].

use crate::error::SamplerError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fifteen short function words the strict language gate looks for.
pub const DEFAULT_COMMON_WORDS: [&str; 15] = [
    "the", "and", "is", "in", "to", "of", "a", "that", "it", "was", "for", "on", "with", "as",
    "be",
];

/// Which content-filter rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Front-matter skip and the legal/structural deny-list only.
    Lenient,
    /// Lenient + line-level markup/script noise rules, the style-related
    /// deny-list terms, and sentence-level structural pattern checks. (default)
    #[default]
    MarkupAware,
}

/// How strictly the language gate judges a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateMode {
    /// Whole-text letter ratio; short documents are accepted. (default)
    #[default]
    Lenient,
    /// Sampled window, higher letter ratio, and a common-word quota.
    Strict,
}

/// Heuristic knobs for the extraction core.
///
/// Every field has a default matching the tuned baseline; a partial JSON
/// document deserialises with the remaining fields defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Content-filter rule set. Default: [`FilterMode::MarkupAware`].
    pub filter_mode: FilterMode,

    /// Language gate strictness. Default: [`GateMode::Lenient`].
    pub gate_mode: GateMode,

    /// Fraction of lines treated as front matter and dropped. Default: 0.15.
    ///
    /// Archive text dumps open with scan notes, licence text and tables of
    /// contents. The skip is applied unconditionally and rounds down, so
    /// documents under 7 lines lose nothing.
    pub front_matter_fraction: f64,

    /// Minimum accepted sentence length in characters (inclusive). Default: 15.
    pub min_sentence_chars: usize,

    /// Maximum accepted sentence length in characters (inclusive). Default: 600.
    pub max_sentence_chars: usize,

    /// Letter density a sentence must exceed. Default: 0.3.
    pub min_letter_ratio: f64,

    /// Consecutive alphabetic characters a sentence must contain. Default: 3.
    pub min_alpha_run: usize,

    /// More `.` characters than this marks chained identifiers. Default: 4.
    ///
    /// Only checked in [`FilterMode::MarkupAware`].
    pub max_periods: usize,

    /// Additional case-insensitive deny-list terms, appended to the built-in list.
    pub extra_deny_terms: Vec<String>,

    /// Lenient gate: documents with at most this many analysable characters
    /// are accepted without judgement. Default: 100.
    pub lenient_min_chars: usize,

    /// Lenient gate: letter ratio the whole text must exceed. Default: 0.3.
    pub lenient_min_alpha_ratio: f64,

    /// Strict gate: start of the sample window as a fraction of the text. Default: 0.2.
    pub strict_window_start: f64,

    /// Strict gate: end of the sample window as a fraction of the text. Default: 0.3.
    pub strict_window_end: f64,

    /// Strict gate: letter ratio the sample must exceed. Default: 0.6.
    pub strict_min_alpha_ratio: f64,

    /// Strict gate: distinct common words the sample must contain. Default: 5.
    pub strict_min_common_words: usize,

    /// Strict gate: the common-word list. Default: [`DEFAULT_COMMON_WORDS`].
    pub common_words: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::default(),
            gate_mode: GateMode::default(),
            front_matter_fraction: 0.15,
            min_sentence_chars: 15,
            max_sentence_chars: 600,
            min_letter_ratio: 0.3,
            min_alpha_run: 3,
            max_periods: 4,
            extra_deny_terms: Vec::new(),
            lenient_min_chars: 100,
            lenient_min_alpha_ratio: 0.3,
            strict_window_start: 0.2,
            strict_window_end: 0.3,
            strict_min_alpha_ratio: 0.6,
            strict_min_common_words: 5,
            common_words: DEFAULT_COMMON_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl ExtractionConfig {
    /// Check that the knobs describe a usable rule set.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if !(0.0..1.0).contains(&self.front_matter_fraction) {
            return Err(SamplerError::InvalidConfig(format!(
                "front_matter_fraction must be in [0, 1), got {}",
                self.front_matter_fraction
            )));
        }
        if self.min_sentence_chars == 0 {
            return Err(SamplerError::InvalidConfig(
                "min_sentence_chars must be at least 1".into(),
            ));
        }
        if self.min_sentence_chars > self.max_sentence_chars {
            return Err(SamplerError::InvalidConfig(format!(
                "sentence length bounds are inverted: {} > {}",
                self.min_sentence_chars, self.max_sentence_chars
            )));
        }
        for (name, ratio) in [
            ("min_letter_ratio", self.min_letter_ratio),
            ("lenient_min_alpha_ratio", self.lenient_min_alpha_ratio),
            ("strict_min_alpha_ratio", self.strict_min_alpha_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(SamplerError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {ratio}"
                )));
            }
        }
        let window = (self.strict_window_start, self.strict_window_end);
        if !(0.0 <= window.0 && window.0 < window.1 && window.1 <= 1.0) {
            return Err(SamplerError::InvalidConfig(format!(
                "strict sample window must satisfy 0 ≤ start < end ≤ 1, got {}–{}",
                window.0, window.1
            )));
        }
        Ok(())
    }
}

/// Configuration for a sampling run.
///
/// Built via [`SamplerConfig::builder()`] or using
/// [`SamplerConfig::default()`].
///
/// # Example
/// ```rust
/// use prose_sampler::{GateMode, SamplerConfig};
///
/// let config = SamplerConfig::builder()
///     .max_books(3)
///     .sample_size(5)
///     .gate_mode(GateMode::Strict)
///     .seed(42)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SamplerConfig {
    /// Base URL of the archive. Default: `https://archive.org`.
    ///
    /// Both the catalog search (`/advancedsearch.php`) and the text
    /// download (`/download/{id}/{id}_djvu.txt`) hang off this root, so a
    /// mirror or a local mock server can stand in for the real archive.
    pub archive_base_url: String,

    /// Catalog records requested per search. Default: 100.
    ///
    /// Books are drawn at random from this pool, so a larger pool gives
    /// more variety between runs at the cost of a bigger search response.
    pub search_rows: usize,

    /// Restrict the catalog search to English-language records. Default: false.
    pub english_only: bool,

    /// Books fetched and processed per run. Default: 5.
    pub max_books: usize,

    /// Sentences drawn from the pooled results. Default: 10.
    pub sample_size: usize,

    /// Concurrent book downloads. Default: 4.
    pub concurrency: usize,

    /// Maximum retry attempts on a transient download failure. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Timeout per HTTP request in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Cap on downloaded text size in bytes; longer bodies are truncated. Default: 16 MiB.
    pub max_download_bytes: usize,

    /// RNG seed for book and sentence selection. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Heuristics for the extraction core.
    pub extraction: ExtractionConfig,

    /// Optional per-book progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            archive_base_url: "https://archive.org".to_string(),
            search_rows: 100,
            english_only: false,
            max_books: 5,
            sample_size: 10,
            concurrency: 4,
            max_retries: 2,
            retry_backoff_ms: 500,
            download_timeout_secs: 60,
            max_download_bytes: 16 * 1024 * 1024,
            seed: None,
            extraction: ExtractionConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SamplerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerConfig")
            .field("archive_base_url", &self.archive_base_url)
            .field("search_rows", &self.search_rows)
            .field("english_only", &self.english_only)
            .field("max_books", &self.max_books)
            .field("sample_size", &self.sample_size)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("seed", &self.seed)
            .field("extraction", &self.extraction)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SamplingProgressCallback>"),
            )
            .finish()
    }
}

impl SamplerConfig {
    /// Create a new builder for `SamplerConfig`.
    pub fn builder() -> SamplerConfigBuilder {
        SamplerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SamplerConfig`].
#[derive(Debug)]
pub struct SamplerConfigBuilder {
    config: SamplerConfig,
}

impl SamplerConfigBuilder {
    pub fn archive_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.archive_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn search_rows(mut self, rows: usize) -> Self {
        self.config.search_rows = rows.clamp(1, 10_000);
        self
    }

    pub fn english_only(mut self, v: bool) -> Self {
        self.config.english_only = v;
        self
    }

    pub fn max_books(mut self, n: usize) -> Self {
        self.config.max_books = n.max(1);
        self
    }

    pub fn sample_size(mut self, n: usize) -> Self {
        self.config.sample_size = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn max_download_bytes(mut self, bytes: usize) -> Self {
        self.config.max_download_bytes = bytes.max(1024);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Replace the whole extraction rule set.
    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    pub fn filter_mode(mut self, mode: FilterMode) -> Self {
        self.config.extraction.filter_mode = mode;
        self
    }

    pub fn gate_mode(mut self, mode: GateMode) -> Self {
        self.config.extraction.gate_mode = mode;
        self
    }

    pub fn front_matter_fraction(mut self, fraction: f64) -> Self {
        self.config.extraction.front_matter_fraction = fraction;
        self
    }

    /// Inclusive sentence length bounds, in characters.
    pub fn sentence_length(mut self, min: usize, max: usize) -> Self {
        self.config.extraction.min_sentence_chars = min;
        self.config.extraction.max_sentence_chars = max;
        self
    }

    pub fn deny_term(mut self, term: impl Into<String>) -> Self {
        self.config.extraction.extra_deny_terms.push(term.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SamplerConfig, SamplerError> {
        let c = &self.config;
        if c.sample_size == 0 {
            return Err(SamplerError::InvalidConfig(
                "Sample size must be ≥ 1".into(),
            ));
        }
        if !c.archive_base_url.starts_with("http://") && !c.archive_base_url.starts_with("https://")
        {
            return Err(SamplerError::InvalidConfig(format!(
                "Archive URL must be HTTP/HTTPS, got '{}'",
                c.archive_base_url
            )));
        }
        c.extraction.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_baseline() {
        let c = ExtractionConfig::default();
        assert_eq!(c.filter_mode, FilterMode::MarkupAware);
        assert_eq!(c.gate_mode, GateMode::Lenient);
        assert_eq!(c.front_matter_fraction, 0.15);
        assert_eq!((c.min_sentence_chars, c.max_sentence_chars), (15, 600));
        assert_eq!(c.common_words.len(), 15);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builder_clamps_and_trims() {
        let c = SamplerConfig::builder()
            .archive_base_url("http://localhost:9000/")
            .concurrency(0)
            .max_books(0)
            .build()
            .unwrap();
        assert_eq!(c.archive_base_url, "http://localhost:9000");
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.max_books, 1);
    }

    #[test]
    fn inverted_length_bounds_rejected() {
        let err = SamplerConfig::builder()
            .sentence_length(50, 20)
            .build()
            .unwrap_err();
        assert!(matches!(err, SamplerError::InvalidConfig(_)));
    }

    #[test]
    fn zero_min_sentence_length_rejected() {
        let err = SamplerConfig::builder()
            .sentence_length(0, 20)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_sentence_chars"), "{err}");
    }

    #[test]
    fn zero_sample_size_rejected() {
        assert!(SamplerConfig::builder().sample_size(0).build().is_err());
    }

    #[test]
    fn front_matter_fraction_out_of_range_rejected() {
        assert!(SamplerConfig::builder()
            .front_matter_fraction(1.0)
            .build()
            .is_err());
    }

    #[test]
    fn inverted_strict_window_rejected() {
        let extraction = ExtractionConfig {
            strict_window_start: 0.5,
            strict_window_end: 0.4,
            ..ExtractionConfig::default()
        };
        assert!(extraction.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: ExtractionConfig =
            serde_json::from_str(r#"{"gate_mode": "strict", "extra_deny_terms": ["foreword"]}"#)
                .unwrap();
        assert_eq!(c.gate_mode, GateMode::Strict);
        assert_eq!(c.extra_deny_terms, vec!["foreword".to_string()]);
        assert_eq!(c.max_sentence_chars, 600);
        assert_eq!(c.filter_mode, FilterMode::MarkupAware);
    }
}
