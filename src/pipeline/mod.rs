//! Pipeline stages for turning archive texts into sentence samples.
//!
//! Each submodule implements exactly one step. The three core stages are
//! pure functions of their input string; only `search` and `fetch` touch
//! the network.
//!
//! ## Data Flow
//!
//! ```text
//! search ──▶ fetch ──▶ language ──▶ filter ──▶ extract
//! (catalog)  (djvu.txt)  (gate)     (lines)    (sentences)
//! ```
//!
//! 1. [`search`]   — query the catalog for candidate texts
//! 2. [`fetch`]    — download one plaintext with retry/backoff
//! 3. [`language`] — accept or reject the whole document
//! 4. [`filter`]   — drop markup noise and front matter, line by line
//! 5. [`extract`]  — normalise, segment and judge sentences
//!
//! [`run`] composes stages 3-5 for a single document.

pub mod extract;
pub mod fetch;
pub mod filter;
pub mod language;
pub mod search;

use crate::config::ExtractionConfig;
use crate::output::DocumentExtraction;
use tracing::debug;

/// Run the extraction core over one raw document.
///
/// A document rejected by the language gate yields no sentences and
/// `lines_kept == 0`; that is an ordinary outcome, not an error.
pub fn run(raw: &str, config: &ExtractionConfig) -> DocumentExtraction {
    let verdict = language::assess(raw, config);
    let lines_total = raw.lines().count();

    if !verdict.accepted {
        debug!(
            mode = ?verdict.mode,
            alpha_ratio = verdict.alpha_ratio,
            common_words = verdict.common_words,
            "language gate rejected document"
        );
        return DocumentExtraction {
            verdict,
            lines_total,
            lines_kept: 0,
            sentences: Vec::new(),
        };
    }

    let lines = filter::filter_lines(raw, config);
    let lines_kept = lines.len();
    let sentences = extract::extract(&lines.join("\n"), config);

    debug!(
        lines_total,
        lines_kept,
        sentences = sentences.len(),
        "document processed"
    );

    DocumentExtraction {
        verdict,
        lines_total,
        lines_kept,
        sentences,
    }
}
