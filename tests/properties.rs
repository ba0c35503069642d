//! Property-based tests of the extraction core.

use proptest::prelude::*;
use prose_sampler::pipeline::extract::deny_terms;
use prose_sampler::pipeline::filter::filter_lines;
use prose_sampler::{extract, is_likely_english, run, ExtractionConfig, FilterMode, GateMode};

fn configs() -> impl Strategy<Value = ExtractionConfig> {
    (any::<bool>(), any::<bool>()).prop_map(|(markup, strict)| ExtractionConfig {
        filter_mode: if markup {
            FilterMode::MarkupAware
        } else {
            FilterMode::Lenient
        },
        gate_mode: if strict {
            GateMode::Strict
        } else {
            GateMode::Lenient
        },
        ..ExtractionConfig::default()
    })
}

/// Prose-shaped text: capitalised sentences with assorted terminals.
fn prose() -> impl Strategy<Value = String> {
    proptest::collection::vec("[A-Z][a-z]{1,8}( [a-z]{1,9}){1,12}[.!?]", 0..24)
        .prop_map(|sentences| sentences.join(" "))
}

/// Text with markup debris, digits and line breaks mixed in.
fn noisy() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[A-Z][a-z]{1,8}( [a-z]{1,9}){1,12}[.!?]",
            "[.#][a-z-]{1,10} \\{ [a-z-]{1,8}: [0-9]{1,3}px; \\}",
            "<[a-z]{1,6}>",
            "[0-9 ,;:()]{1,30}",
            "\n",
        ],
        0..40,
    )
    .prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn prop_extract_terminates_on_any_text(text in any::<String>(), cfg in configs()) {
        let out = extract(&text, &cfg);
        prop_assert!(out.len() <= text.chars().count());
    }

    #[test]
    fn prop_accepted_sentences_within_bounds(text in noisy(), cfg in configs()) {
        for s in extract(&text, &cfg) {
            let len = s.chars().count();
            prop_assert!((cfg.min_sentence_chars..=cfg.max_sentence_chars).contains(&len));
            let letters = s.chars().filter(|c| c.is_alphabetic()).count();
            prop_assert!(letters as f64 / len as f64 > cfg.min_letter_ratio);
            prop_assert_eq!(s.trim(), s.as_str());
        }
    }

    #[test]
    fn prop_no_deny_term_survives(text in prose(), cfg in configs()) {
        let deny = deny_terms(&cfg);
        for s in extract(&text, &cfg) {
            let lower = s.to_lowercase();
            for term in &deny {
                prop_assert!(!lower.contains(term.as_str()), "{:?} contains {:?}", s, term);
            }
        }
    }

    #[test]
    fn prop_extract_is_repeatable(text in noisy(), cfg in configs()) {
        prop_assert_eq!(extract(&text, &cfg), extract(&text, &cfg));
        prop_assert_eq!(run(&text, &cfg), run(&text, &cfg));
    }

    #[test]
    fn prop_accepted_sentence_extracts_to_itself(text in prose(), cfg in configs()) {
        for s in extract(&text, &cfg) {
            prop_assert_eq!(extract(&s, &cfg), vec![s.clone()]);
        }
    }

    #[test]
    fn prop_filter_keeps_an_ordered_subsequence(text in noisy(), cfg in configs()) {
        let kept = filter_lines(&text, &cfg);
        let total = text.lines().count();
        prop_assert!(kept.len() <= total);
        let mut source = text.lines();
        for line in kept {
            prop_assert!(source.any(|l| l == line));
        }
    }

    #[test]
    fn prop_gate_is_total(text in any::<String>(), cfg in configs()) {
        let _ = is_likely_english(&text, &cfg);
    }

    #[test]
    fn prop_rejected_documents_yield_nothing(text in noisy(), cfg in configs()) {
        let out = run(&text, &cfg);
        if !out.verdict.accepted {
            prop_assert!(out.sentences.is_empty());
            prop_assert_eq!(out.lines_kept, 0);
        }
    }
}
