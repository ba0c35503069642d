//! Sentence extraction: normalise filtered text, split it into sentences,
//! and keep only the ones fit to show a reader.
//!
//! ## Stages
//!
//! 1. [`normalize`] — collapse whitespace, drop every character that is not
//!    alphanumeric, whitespace or `.`/`!`/`?`, collapse again, trim. In
//!    markup-aware mode inline style rules are cut out first.
//! 2. [`split_sentences`] — cut after a terminal that is followed by
//!    whitespace and an uppercase letter. The `regex` crate has no
//!    look-around, so this is a single forward scan.
//! 3. [`judge`] — the acceptance cascade. Every check is an independent
//!    predicate; the order only decides which [`Rejection`] gets reported.

use crate::config::{ExtractionConfig, FilterMode};
use crate::pipeline::filter::INLINE_STYLE_RULE;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// Sentence-terminal characters.
pub const TERMINALS: [char; 3] = ['.', '!', '?'];

/// Legal, licensing and structural terms rejected in every mode.
pub const BASE_DENY_TERMS: &[&str] = &[
    "gnu",
    "gpl",
    "license",
    "copyright",
    "gutenberg",
    "warranty",
    "redistribution",
    "permission",
    "terms and conditions",
    "free software foundation",
    "all rights reserved",
    "page",
    "chapter",
    "table of contents",
    "index",
];

/// Style and component vocabulary rejected in [`FilterMode::MarkupAware`].
pub const MARKUP_DENY_TERMS: &[&str] = &[
    "css",
    "html",
    "style",
    "display",
    "margin",
    "padding",
    "border",
    "webkit",
    "mozilla",
    "shadow dom",
    "shady dom",
    "web component",
];

/// Structural rules. They are matched against the normalised candidate and
/// against the source text it was cut from, since normalisation strips the
/// braces, `#` and parentheses some of them look for.
static SENTENCE_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "selector-chain",
            r"(?i)\b[\w-]+\.[\w-]+\s+(?:button|label|input|icon|link|item|menu|nav|div|span|img|svg)\b",
        ),
        ("css-size", r"(?i)\b\d+(?:\.\d+)?(?:px|em|rem)\b"),
        (
            "hex-colour",
            r"#[0-9]*[a-fA-F][0-9a-fA-F]*\b|:\s*#[0-9a-fA-F]{3,8}\b",
        ),
        ("colour-function", r"(?i)\b(?:rgba?|hsla?)\s*\("),
        ("brace-block", r"\{[^}]*\}"),
        (
            "display-layout",
            r"(?i)\bdisplay\s*:?\s*(?:flex|block|none|grid|inline|table|contents)\b",
        ),
    ]
    .into_iter()
    .map(|(name, p)| (name, Regex::new(p).unwrap()))
    .collect()
});

/// Why a candidate sentence was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Character count outside the configured bounds.
    Length(usize),
    /// Contains a deny-list term.
    DenyTerm(String),
    /// Matches a structural-noise pattern (markup-aware mode).
    Structural(&'static str),
    /// No run of `min_alpha_run` consecutive letters.
    NoWord,
    /// Letters make up too little of the sentence.
    LetterDensity,
}

impl Rejection {
    fn kind(&self) -> &'static str {
        match self {
            Rejection::Length(_) => "length",
            Rejection::DenyTerm(_) => "deny-term",
            Rejection::Structural(_) => "structural",
            Rejection::NoWord => "no-word",
            Rejection::LetterDensity => "letter-density",
        }
    }
}

/// Normalised text with, for every byte, the source byte it came from.
struct Normalized {
    text: String,
    origin: Vec<usize>,
}

impl Normalized {
    /// The stretch of `source` that `range` of the normalised text covers.
    fn source_span<'a>(&self, source: &'a str, range: Range<usize>) -> &'a str {
        if range.is_empty() {
            return "";
        }
        let start = self.origin[range.start];
        let last = self.origin[range.end - 1];
        let end = last + source[last..].chars().next().map_or(0, char::len_utf8);
        &source[start..end]
    }
}

fn normalize_mapped(text: &str) -> Normalized {
    let mut out = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    let mut space_at: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if !out.is_empty() && space_at.is_none() {
                space_at = Some(i);
            }
        } else if c.is_alphanumeric() || TERMINALS.contains(&c) {
            if let Some(at) = space_at.take() {
                out.push(' ');
                origin.push(at);
            }
            out.push(c);
            origin.extend(std::iter::repeat(i).take(c.len_utf8()));
        }
    }
    Normalized { text: out, origin }
}

/// Collapse whitespace and strip everything but letters, digits,
/// whitespace and sentence terminals.
pub fn normalize(text: &str) -> String {
    normalize_mapped(text).text
}

/// Split `text` after every terminal followed by whitespace and an
/// uppercase letter.
///
/// Terminals stay with the sentence they end; the separating whitespace is
/// consumed. A trailing fragment without a boundary is kept.
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_ranges(text).into_iter().map(|r| &text[r]).collect()
}

fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if i < start || !TERMINALS.contains(&c) {
            continue;
        }
        let end = i + c.len_utf8();
        let rest = &text[end..];
        let next = rest.trim_start();
        let gap = rest.len() - next.len();
        if gap > 0 && next.chars().next().is_some_and(char::is_uppercase) {
            ranges.push(start..end);
            start = end + gap;
        }
    }

    let tail = &text[start..];
    let lead = tail.len() - tail.trim_start().len();
    let trimmed = tail.trim();
    if !trimmed.is_empty() {
        ranges.push(start + lead..start + lead + trimmed.len());
    }
    ranges
}

/// The deny-list in effect for `config`, lower-cased.
pub fn deny_terms(config: &ExtractionConfig) -> Vec<String> {
    let markup: &[&str] = match config.filter_mode {
        FilterMode::Lenient => &[],
        FilterMode::MarkupAware => MARKUP_DENY_TERMS,
    };
    BASE_DENY_TERMS
        .iter()
        .chain(markup)
        .map(|t| t.to_string())
        .chain(
            config
                .extra_deny_terms
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.to_lowercase()),
        )
        .collect()
}

/// Run the acceptance cascade on one candidate.
pub fn judge(sentence: &str, config: &ExtractionConfig) -> Result<(), Rejection> {
    let sentence = sentence.trim();
    judge_with(sentence, sentence, config, &deny_terms(config))
}

fn judge_with(
    sentence: &str,
    source: &str,
    config: &ExtractionConfig,
    deny: &[String],
) -> Result<(), Rejection> {
    let total = sentence.chars().count();
    if total < config.min_sentence_chars || total > config.max_sentence_chars {
        return Err(Rejection::Length(total));
    }

    let lower = sentence.to_lowercase();
    if let Some(term) = deny.iter().find(|t| lower.contains(t.as_str())) {
        return Err(Rejection::DenyTerm(term.clone()));
    }

    if config.filter_mode == FilterMode::MarkupAware {
        if let Some(name) = SENTENCE_RULES
            .iter()
            .find(|(_, re)| re.is_match(sentence) || re.is_match(source))
            .map(|(name, _)| *name)
        {
            return Err(Rejection::Structural(name));
        }
        if sentence.matches('.').count() > config.max_periods {
            return Err(Rejection::Structural("period-chain"));
        }
    }

    if longest_alpha_run(sentence) < config.min_alpha_run {
        return Err(Rejection::NoWord);
    }

    let letters = sentence.chars().filter(|c| c.is_alphabetic()).count();
    if letters as f64 / total as f64 <= config.min_letter_ratio {
        return Err(Rejection::LetterDensity);
    }

    Ok(())
}

fn longest_alpha_run(s: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    for c in s.chars() {
        if c.is_alphabetic() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Extract the accepted sentences from filtered text, in document order.
///
/// In [`FilterMode::MarkupAware`] a style rule embedded in a line of prose
/// (`.nav-menu { display: flex; }`) is cut out before normalisation, so the
/// sentences around it still split apart.
pub fn extract(filtered: &str, config: &ExtractionConfig) -> Vec<String> {
    let source = match config.filter_mode {
        FilterMode::Lenient => Cow::Borrowed(filtered),
        FilterMode::MarkupAware => INLINE_STYLE_RULE.replace_all(filtered, " "),
    };
    let normalized = normalize_mapped(&source);
    let deny = deny_terms(config);

    let mut accepted = Vec::new();
    let mut rejected: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut candidates = 0usize;

    for range in sentence_ranges(&normalized.text) {
        candidates += 1;
        let candidate = &normalized.text[range.clone()];
        let raw = normalized.source_span(&source, range);
        match judge_with(candidate, raw, config, &deny) {
            Ok(()) => accepted.push(candidate.to_string()),
            Err(r) => *rejected.entry(r.kind()).or_default() += 1,
        }
    }

    debug!(
        candidates,
        accepted = accepted.len(),
        ?rejected,
        "sentence cascade finished"
    );
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    fn lenient() -> ExtractionConfig {
        ExtractionConfig {
            filter_mode: FilterMode::Lenient,
            ..ExtractionConfig::default()
        }
    }

    #[test]
    fn test_normalize_strips_symbols() {
        assert_eq!(
            normalize("  Hello,\n\n   world {x} [y] (z) <a> @#$%^&*_ done!  "),
            "Hello world x y z a done!"
        );
    }

    #[test]
    fn test_normalize_keeps_terminals_and_accents() {
        assert_eq!(normalize("Café?  Oui!\tNon."), "Café? Oui! Non.");
    }

    #[test]
    fn test_split_on_capital_boundary() {
        assert_eq!(
            split_sentences("One two. Three four! Five six? seven. Eight"),
            vec!["One two.", "Three four!", "Five six? seven.", "Eight"]
        );
    }

    #[test]
    fn test_split_requires_whitespace() {
        assert_eq!(split_sentences("U.S.A. Today"), vec!["U.S.A.", "Today"]);
        assert_eq!(split_sentences("a.B c"), vec!["a.B c"]);
    }

    #[test]
    fn test_split_repeated_terminals() {
        assert_eq!(
            split_sentences("What!? No... Yes."),
            vec!["What!?", "No...", "Yes."]
        );
    }

    #[test]
    fn test_split_degenerate_inputs() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
        assert_eq!(split_sentences("..."), vec!["..."]);
    }

    #[test]
    fn test_two_narrative_sentences() {
        let text = "This is a sufficiently long narrative sentence about adventure. \
                    Another equally long narrative sentence follows here today.";
        let out = extract(text, &markup());
        assert_eq!(
            out,
            vec![
                "This is a sufficiently long narrative sentence about adventure.",
                "Another equally long narrative sentence follows here today.",
            ]
        );
    }

    #[test]
    fn test_length_bounds_inclusive() {
        let c = markup();
        // 15 chars exactly
        assert_eq!(judge("Abcd efgh ijkl.", &c), Ok(()));
        assert_eq!(judge("Abcd efgh ijk.", &c), Err(Rejection::Length(14)));
        let long = format!("{}.", "word ".repeat(120));
        assert!(matches!(judge(&long, &c), Err(Rejection::Length(601))));
    }

    #[test]
    fn test_deny_terms_case_insensitive() {
        let c = lenient();
        assert_eq!(
            judge("Copyright 1999 by the author of this work.", &c),
            Err(Rejection::DenyTerm("copyright".into()))
        );
        assert_eq!(
            judge("See the TABLE OF CONTENTS for details.", &c),
            Err(Rejection::DenyTerm("table of contents".into()))
        );
    }

    #[test]
    fn test_markup_terms_only_in_markup_mode() {
        let s = "The border guards waited by the river all night.";
        assert_eq!(judge(s, &lenient()), Ok(()));
        assert_eq!(
            judge(s, &markup()),
            Err(Rejection::DenyTerm("border".into()))
        );
    }

    #[test]
    fn test_extra_deny_terms() {
        let c = ExtractionConfig {
            extra_deny_terms: vec!["Foreword".into(), "  ".into()],
            ..markup()
        };
        assert_eq!(
            judge("The foreword was written by a friend of his.", &c),
            Err(Rejection::DenyTerm("foreword".into()))
        );
    }

    #[test]
    fn test_structural_patterns() {
        let c = markup();
        assert_eq!(
            judge("Set the width to 240px for the outer frame.", &c),
            Err(Rejection::Structural("css-size"))
        );
        assert_eq!(
            judge("toolbar.primary button looks odd on small screens", &c),
            Err(Rejection::Structural("selector-chain"))
        );
        assert_eq!(
            judge("A b. C d. E f. G h. I j. The end of it all.", &c),
            Err(Rejection::Structural("period-chain"))
        );
        assert_eq!(
            judge("A b. C d. E f. G h. I j. The end of it all.", &lenient()),
            Ok(())
        );
    }

    #[test]
    fn test_inline_style_rule_cut_between_sentences() {
        let text = "The ship left the harbour at dawn with a full crew aboard. \
                    .nav-menu { display: flex; margin: 10px; } \
                    Nobody on deck spoke of the storm that was coming.";
        assert_eq!(
            extract(text, &markup()),
            vec![
                "The ship left the harbour at dawn with a full crew aboard.",
                "Nobody on deck spoke of the storm that was coming.",
            ]
        );
        // Lenient mode keeps the rule, so the three pieces stay one candidate.
        assert_eq!(extract(text, &lenient()).len(), 1);
    }

    #[test]
    fn test_source_form_rules_see_stripped_symbols() {
        let c = markup();
        assert_eq!(
            extract("The walls were painted #ffcc00 in every room.", &c),
            Vec::<String>::new()
        );
        assert_eq!(
            extract("Mix the paint with rgb(200, 10, 10) before noon.", &c),
            Vec::<String>::new()
        );
        assert_eq!(
            extract("He wrote {see below} across the top of the letter.", &c),
            Vec::<String>::new()
        );
        assert_eq!(
            extract("Room #100 was empty when the porter arrived.", &c),
            vec!["Room 100 was empty when the porter arrived."]
        );
    }

    #[test]
    fn test_normalized_maps_back_to_source() {
        let source = "  Hello, {big} world! Done.";
        let n = normalize_mapped(source);
        assert_eq!(n.text, "Hello big world! Done.");
        let ranges = sentence_ranges(&n.text);
        assert_eq!(ranges.len(), 2);
        assert_eq!(n.source_span(source, ranges[0].clone()), "Hello, {big} world!");
        assert_eq!(n.source_span(source, ranges[1].clone()), "Done.");
    }

    #[test]
    fn test_requires_a_word() {
        assert_eq!(
            judge("12 34 56 78 9a b1 c2 d3 e4 f5.", &lenient()),
            Err(Rejection::NoWord)
        );
    }

    #[test]
    fn test_letter_density() {
        assert_eq!(
            judge("Year 1776 1777 1778 1779 1780 1781.", &lenient()),
            Err(Rejection::LetterDensity)
        );
    }

    #[test]
    fn test_extract_empty_and_noise() {
        assert!(extract("", &markup()).is_empty());
        assert!(extract("   \n\t  ", &markup()).is_empty());
        assert!(extract("!!! ??? ... ### $$$", &markup()).is_empty());
    }

    #[test]
    fn test_extract_is_repeatable() {
        let text = "Call me Ishmael. Some years ago never mind how long precisely. \
                    Having little or no money in my purse I thought I would sail about.";
        assert_eq!(extract(text, &markup()), extract(text, &markup()));
        assert_eq!(extract(text, &markup()).len(), 3);
    }
}
