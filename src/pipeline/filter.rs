//! Content filter: reduce a raw archive text to its presumed narrative lines.
//!
//! Two passes, both line-based. Lines are only ever dropped, never rewritten,
//! so the output is an order-preserving subsequence of the input.
//!
//! 1. **Markup noise** ([`FilterMode::MarkupAware`] only) — scanned texts
//!    harvested from web pages drag along style sheets, tag soup and script
//!    fragments. Each [`LINE_RULES`] entry is an independent regex; a line is
//!    dropped when any of them matches its trimmed form, once complete
//!    inline style rules are set aside.
//! 2. **Front matter** — the first `front_matter_fraction` of the remaining
//!    lines (rounded down) is dropped unconditionally. Scan notes, licence
//!    text and tables of contents live there.

use crate::config::{ExtractionConfig, FilterMode};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// A named line-level noise pattern.
struct NoiseRule {
    name: &'static str,
    pattern: Regex,
}

/// Layout and box-model property names, with an optional `-suffix`.
const CSS_PROPERTY: &str = r"(?:display|margin|padding|border|width|height|min-width|max-width|min-height|max-height|position|float|clear|overflow|z-index|top|left|right|bottom|font|line-height|color|background|text-align|text-decoration|flex|grid|align-items|justify-content|box-sizing|box-shadow|opacity|visibility|transform|transition|cursor|outline|content)(?:-[a-z-]+)?";

/// One CSS value token: number with unit, hex colour, function call or keyword.
const CSS_VALUE: &str = r"(?:-?\d+(?:\.\d+)?(?:px|em|rem|vh|vw|pt|%)?|#[0-9a-fA-F]{3,8}|[a-z-]+\([^)]*\)|none|auto|block|inline-block|inline|flex|grid|table|hidden|visible|absolute|relative|fixed|sticky|static|inherit|initial|bold|normal|italic|center|solid|dashed|transparent|pointer|border-box|nowrap|wrap)";

/// `margin-top: 4px`, `display: flex`, `color: #333 !important`, `content: "";`.
/// The value has to read as CSS, so a wrapped prose line that happens to
/// start with `color:` survives.
static STYLE_DECLARATION: Lazy<String> = Lazy::new(|| {
    format!(r"^{CSS_PROPERTY}\s*:\s*(?:[^;]*;\s*$|{CSS_VALUE}(?:\s+{CSS_VALUE})*\s*(?:!important)?\s*$)")
});

/// A selector followed by its declaration block, wherever it sits in a line.
pub(crate) static INLINE_STYLE_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.#][A-Za-z_][\w-]*[\s,>+~.:#\w-]*\{[^{}]*\}").unwrap()
});

static LINE_RULES: Lazy<Vec<NoiseRule>> = Lazy::new(|| {
    [
        // `.nav-menu {`, `#main, .aside`, `.btn.primary`, `.menu a:hover {`
        (
            "style-selector",
            r"^[.#][A-Za-z_][\w-]*(?:\s*[{,>+~]|[.:#\[]|\s*$|\s.*\{)",
        ),
        ("style-declaration", STYLE_DECLARATION.as_str()),
        // `{ ... }`, `[Illustration]`, lone `}` or `});`
        ("bracket-block", r"^(?:\{.*\}|\[.*\]|[{}\[\]();,\s]+)$"),
        ("markup-tag", r"(?i)^<(?:/?[a-z][a-z0-9:-]*(?:\s[^>]*)?/?>|!--|!doctype)"),
        (
            "framework-internals",
            r"(?i)(?:-webkit-|-moz-|-ms-|shadow[\s-]?dom|shadow-?root|shady[\s-]?(?:dom|css)|web[\s-]?components?|::slotted|:host\b|\bpolymer\b)",
        ),
        (
            "script-statement",
            r#"^(?:(?:var|let|const)\s+[\w$]+\s*=|function\s*[\w$]*\s*\(|class\s+[\w$]+\s*(?:extends\s+[\w$.]+\s*)?\{|import\s+(?:[\w$]+|\{[^}]*\}|\*\s+as\s+[\w$]+)\s+from\s+['"]|export\s+(?:default|const|let|function|class)\b|(?:document|window|console)\.[\w$.]+\s*(?:\(|=|;)|[\w$.\[\]]+\s*=\s*[^=].*;\s*$)|=>\s*\{"#,
        ),
        (
            "style-value",
            r"#[0-9]*[a-fA-F][0-9a-fA-F]*\b|:\s*#[0-9a-fA-F]{3,8}\b|\b\d+(?:\.\d+)?(?:px|em|rem|vh|vw)\b|\b(?:rgba?|hsla?)\s*\(",
        ),
    ]
    .into_iter()
    .map(|(name, p)| NoiseRule {
        name,
        pattern: Regex::new(p).unwrap(),
    })
    .collect()
});

/// Name of the first markup-noise rule matching `line`, if any.
///
/// Blank lines are never noise. Complete inline style rules are set aside
/// before the rules run: a line made of nothing else is `style-rule` noise,
/// while prose around one keeps the line (the extractor cuts the rule out).
pub fn noise_rule(line: &str) -> Option<&'static str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let residue = INLINE_STYLE_RULE.replace_all(trimmed, " ");
    let residue = residue.trim();
    if residue.is_empty() {
        return Some("style-rule");
    }
    LINE_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(residue))
        .map(|rule| rule.name)
}

/// Number of leading lines treated as front matter.
///
/// `floor(fraction × line_count)`, clamped so it never exceeds the document.
/// The epsilon keeps products such as `0.15 × 20` from landing a hair under
/// the integer they denote.
pub fn front_matter_skip(line_count: usize, fraction: f64) -> usize {
    let skip = (line_count as f64 * fraction + 1e-9).floor();
    if skip <= 0.0 {
        0
    } else {
        (skip as usize).min(line_count)
    }
}

/// Filter `raw` down to its narrative lines, borrowing from the input.
pub fn filter_lines<'a>(raw: &'a str, config: &ExtractionConfig) -> Vec<&'a str> {
    let lines: Vec<&str> = match config.filter_mode {
        FilterMode::Lenient => raw.lines().collect(),
        FilterMode::MarkupAware => raw
            .lines()
            .filter(|line| match noise_rule(line) {
                Some(rule) => {
                    trace!(rule, line = %line.trim(), "dropping markup noise line");
                    false
                }
                None => true,
            })
            .collect(),
    };

    let skip = front_matter_skip(lines.len(), config.front_matter_fraction);
    lines.into_iter().skip(skip).collect()
}

/// Filter `raw` and rejoin the surviving lines with `\n`.
pub fn filter(raw: &str, config: &ExtractionConfig) -> String {
    filter_lines(raw, config).join("\n")
}
