//! Language gate: a cheap guess at whether a document is English prose.
//!
//! Both modes first strip digits and punctuation, then look at what is left.
//! Letters are counted as ASCII letters only, so Cyrillic, Greek or CJK
//! scans score near zero while accented Latin text still scores well.
//!
//! | Mode | Inspected text | Accept when |
//! |------|----------------|-------------|
//! | [`GateMode::Lenient`] | whole document | ≤ `lenient_min_chars` analysable chars, or letter ratio > `lenient_min_alpha_ratio` |
//! | [`GateMode::Strict`]  | the `[strict_window_start, strict_window_end)` slice | letter ratio > `strict_min_alpha_ratio` **and** ≥ `strict_min_common_words` common words |
//!
//! The strict window skips front matter and stays clear of the archive's
//! trailing boilerplate.

use crate::config::{ExtractionConfig, GateMode};
use crate::output::LanguageVerdict;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Judge `raw` with the configured gate mode.
pub fn assess(raw: &str, config: &ExtractionConfig) -> LanguageVerdict {
    match config.gate_mode {
        GateMode::Lenient => assess_lenient(raw, config),
        GateMode::Strict => assess_strict(raw, config),
    }
}

/// `true` when `raw` should be processed at all.
pub fn is_likely_english(raw: &str, config: &ExtractionConfig) -> bool {
    assess(raw, config).accepted
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(c, '\u{00A1}' | '\u{00AB}' | '\u{00BB}' | '\u{00BF}' | '\u{2010}'..='\u{2027}')
}

/// Drop digits and punctuation.
fn analysable(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_numeric() && !is_punctuation(c))
        .collect()
}

/// (ASCII letters, analysable chars, ratio).
fn letter_stats(stripped: &str) -> (usize, usize, f64) {
    let total = stripped.chars().count();
    let letters = stripped.chars().filter(char::is_ascii_alphabetic).count();
    let ratio = if total == 0 {
        0.0
    } else {
        letters as f64 / total as f64
    };
    (letters, total, ratio)
}

fn assess_lenient(raw: &str, config: &ExtractionConfig) -> LanguageVerdict {
    let stripped = analysable(raw);
    let (_, total, ratio) = letter_stats(&stripped);
    LanguageVerdict {
        accepted: total <= config.lenient_min_chars || ratio > config.lenient_min_alpha_ratio,
        mode: GateMode::Lenient,
        alpha_ratio: ratio,
        common_words: 0,
        analyzable_chars: total,
    }
}

fn assess_strict(raw: &str, config: &ExtractionConfig) -> LanguageVerdict {
    let sample = sample_window(raw, config.strict_window_start, config.strict_window_end);
    strict_verdict(sample, config)
}

/// The slice of `text` between two fractions of its character length.
pub fn sample_window(text: &str, start: f64, end: f64) -> &str {
    let total = text.chars().count();
    let from = ((total as f64 * start).floor().max(0.0) as usize).min(total);
    let to = ((total as f64 * end).floor().max(0.0) as usize).clamp(from, total);

    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    &text[byte_at(from)..byte_at(to)]
}

fn strict_verdict(sample: &str, config: &ExtractionConfig) -> LanguageVerdict {
    let stripped = analysable(sample);
    let (_, total, ratio) = letter_stats(&stripped);

    let lowered = stripped.to_lowercase();
    let padded = format!(" {} ", RE_WHITESPACE.replace_all(lowered.trim(), " "));
    let common_words = config
        .common_words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|w| padded.contains(&format!(" {w} ")))
        .count();

    LanguageVerdict {
        accepted: total > 0
            && ratio > config.strict_min_alpha_ratio
            && common_words >= config.strict_min_common_words,
        mode: GateMode::Strict,
        alpha_ratio: ratio,
        common_words,
        analyzable_chars: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COMMON_WORDS;

    const ENGLISH: &str = "It was the best of times and it was the worst of times, \
        and the city was full of light as the river ran on with the tide. ";

    const RUSSIAN: &str = "Это было лучшее из времён, это было худшее из времён, \
        век мудрости, век безумия, эпоха веры, эпоха безверия. ";

    fn strict() -> ExtractionConfig {
        ExtractionConfig {
            gate_mode: GateMode::Strict,
            ..ExtractionConfig::default()
        }
    }

    /// The fifteen common words padded with spaces to a letter ratio of exactly 0.5.
    fn half_letters_sample() -> String {
        let words = DEFAULT_COMMON_WORDS.join(" ");
        let letters = words.chars().filter(char::is_ascii_alphabetic).count();
        let pad = 2 * letters - words.chars().count();
        format!("{words}{}", " ".repeat(pad))
    }

    #[test]
    fn test_lenient_short_symbol_text_accepted() {
        let text: String = "1234567890!?.,;:-()[]".chars().cycle().take(50).collect();
        let v = assess(&text, &ExtractionConfig::default());
        assert!(v.accepted);
        assert_eq!(v.analyzable_chars, 0);
    }

    #[test]
    fn test_lenient_english_accepted() {
        let text = ENGLISH.repeat(3);
        let v = assess(&text, &ExtractionConfig::default());
        assert!(v.accepted);
        assert!(v.alpha_ratio > 0.7, "ratio {}", v.alpha_ratio);
    }

    #[test]
    fn test_lenient_cyrillic_rejected() {
        let text = RUSSIAN.repeat(3);
        assert!(!is_likely_english(&text, &ExtractionConfig::default()));
    }

    #[test]
    fn test_lenient_empty_accepted() {
        assert!(is_likely_english("", &ExtractionConfig::default()));
    }

    #[test]
    fn test_strict_english_accepted() {
        let text = ENGLISH.repeat(10);
        let v = assess(&text, &strict());
        assert!(v.accepted, "{v:?}");
        assert!(v.common_words >= 5);
    }

    #[test]
    fn test_strict_half_letters_rejected_despite_words() {
        let sample = half_letters_sample();
        let v = strict_verdict(&sample, &strict());
        assert_eq!(v.alpha_ratio, 0.5);
        assert_eq!(v.common_words, 15);
        assert!(!v.accepted);
    }

    #[test]
    fn test_strict_half_letters_document_rejected() {
        let doc = half_letters_sample().repeat(20);
        assert!(!is_likely_english(&doc, &strict()));
    }

    #[test]
    fn test_strict_needs_common_words() {
        let text = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor. "
            .repeat(20);
        let v = assess(&text, &strict());
        assert!(v.alpha_ratio > 0.6);
        assert!(!v.accepted);
    }

    #[test]
    fn test_strict_empty_rejected() {
        assert!(!is_likely_english("", &strict()));
    }

    #[test]
    fn test_strict_cyrillic_rejected() {
        assert!(!is_likely_english(&RUSSIAN.repeat(10), &strict()));
    }

    #[test]
    fn test_sample_window_char_boundaries() {
        let text = "ééééééééééabcdefghij";
        assert_eq!(sample_window(text, 0.5, 0.75), "abcde");
        assert_eq!(sample_window(text, 0.0, 0.1), "éé");
        assert_eq!(sample_window("", 0.2, 0.3), "");
    }
}
