//! CLI binary for prose-sampler.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SamplerConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use prose_sampler::{
    extract_file, sample, sample_book, sample_to_file, ExtractionConfig, FilterMode, GateMode,
    ProgressCallback, SampleOutput, SamplerConfig, SamplingProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the run plus a log line per book.
/// Books finish out of order when downloads run concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Identifier and start time of each in-flight book, keyed by index.
    in_flight: Mutex<HashMap<usize, (String, Instant)>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_sampling_start` reports how many books were selected.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Searching");
        bar.set_message("Querying catalog…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            in_flight: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} books  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Sampling");
    }

    /// Remove `index` from the in-flight table: (identifier, seconds elapsed).
    fn finish(&self, index: usize) -> (String, f64) {
        self.in_flight
            .lock()
            .unwrap()
            .remove(&index)
            .map(|(id, t)| (id, t.elapsed().as_secs_f64()))
            .unwrap_or_else(|| (format!("#{index}"), 0.0))
    }

    fn log(&self, mark: String, index: usize, total: usize, detail: String) {
        let (identifier, secs) = self.finish(index);
        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {:<36}  {}  {}",
            mark,
            index,
            total,
            truncate(&identifier, 36),
            detail,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }
}

impl SamplingProgressCallback for CliProgressCallback {
    fn on_sampling_start(&self, total_books: usize) {
        self.activate_bar(total_books);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Sampling {total_books} books…"))
        ));
    }

    fn on_book_start(&self, index: usize, _total: usize, identifier: &str) {
        self.in_flight
            .lock()
            .unwrap()
            .insert(index, (identifier.to_string(), Instant::now()));
        self.bar.set_message(identifier.to_string());
    }

    fn on_book_complete(&self, index: usize, total: usize, sentences: usize) {
        let mark = if sentences > 0 { green("✓") } else { yellow("○") };
        self.log(mark, index, total, dim(&format!("{sentences:>4} sentences")));
    }

    fn on_book_skipped(&self, index: usize, total: usize, reason: &str) {
        self.log(yellow("○"), index, total, yellow(reason));
    }

    fn on_book_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.log(red("✗"), index, total, red(&truncate(error, 80)));
    }

    fn on_sampling_complete(&self, total_books: usize, accepted_books: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);

        if failed == 0 {
            eprintln!(
                "{} {}/{} books read",
                green("✔"),
                bold(&accepted_books.to_string()),
                total_books
            );
        } else {
            eprintln!(
                "{} {}/{} books read  ({} failed)",
                if failed == total_books {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&accepted_books.to_string()),
                total_books,
                red(&failed.to_string()),
            );
        }
    }
}

/// Shorten `s` to at most `max` chars, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ten sentences from five random books about whaling
  prose-sample whaling

  # Reproducible run, stricter language gate, English catalog records only
  prose-sample --seed 42 --gate strict --english-only "sea stories"

  # Sample one known archive item
  prose-sample --id mobydickorwhale00melv --count 5

  # Run the extraction core over a local text file (prints every sentence)
  prose-sample --file book.txt

  # Save the sample, or print everything as JSON
  prose-sample whaling -o sample.txt
  prose-sample whaling --json > sample.json

  # Tune the heuristics from a JSON file (any subset of fields)
  prose-sample --extraction-config rules.json whaling

EXTRACTION CONFIG (JSON):
  {
    "filter_mode": "markup-aware",      lenient | markup-aware
    "gate_mode": "strict",              lenient | strict
    "front_matter_fraction": 0.15,
    "min_sentence_chars": 15,
    "max_sentence_chars": 600,
    "extra_deny_terms": ["transcriber"]
  }

ENVIRONMENT VARIABLES:
  Every option reads a PROSE_* variable (see --help for names).
  RUST_LOG overrides the log filter, e.g. RUST_LOG=prose_sampler=debug
"#;

/// Sample clean English sentences from public-domain book scans.
#[derive(Parser, Debug)]
#[command(
    name = "prose-sample",
    version,
    about = "Sample clean English sentences from public-domain book scans",
    long_about = "Search an online text archive, download the plaintext of a random selection \
of books, strip front matter and embedded markup, and print a random sample of the sentences \
that read like English prose.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Catalog search query.
    #[arg(
        env = "PROSE_QUERY",
        required_unless_present_any = ["file", "id"],
        conflicts_with_all = ["file", "id"]
    )]
    query: Option<String>,

    /// Extract from a local text file instead of searching the archive.
    #[arg(long, env = "PROSE_FILE", conflicts_with = "id")]
    file: Option<PathBuf>,

    /// Sample a single archive item by identifier.
    #[arg(long, env = "PROSE_ID")]
    id: Option<String>,

    /// Sentences to draw.
    #[arg(short = 'n', long, env = "PROSE_COUNT", default_value_t = 10)]
    count: usize,

    /// Books to download per run.
    #[arg(short, long, env = "PROSE_BOOKS", default_value_t = 5)]
    books: usize,

    /// Catalog records to draw books from.
    #[arg(long, env = "PROSE_ROWS", default_value_t = 100)]
    rows: usize,

    /// Concurrent downloads.
    #[arg(short, long, env = "PROSE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Line filter: lenient, or markup (also drops style/script noise).
    #[arg(long, env = "PROSE_MODE", value_enum)]
    mode: Option<ModeArg>,

    /// Language gate: lenient (letter ratio) or strict (sampled window + common words).
    #[arg(long, env = "PROSE_GATE", value_enum)]
    gate: Option<GateArg>,

    /// RNG seed for a reproducible selection.
    #[arg(long, env = "PROSE_SEED")]
    seed: Option<u64>,

    /// Only search catalog records tagged as English.
    #[arg(long, env = "PROSE_ENGLISH_ONLY")]
    english_only: bool,

    /// JSON file with extraction heuristics (partial files allowed).
    #[arg(long, env = "PROSE_EXTRACTION_CONFIG")]
    extraction_config: Option<PathBuf>,

    /// Archive base URL.
    #[arg(long, env = "PROSE_BASE_URL", default_value = "https://archive.org")]
    base_url: String,

    /// HTTP timeout in seconds.
    #[arg(long, env = "PROSE_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Retries per book on transient download failures.
    #[arg(long, env = "PROSE_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Write sentences to this file instead of stdout.
    #[arg(short, long, env = "PROSE_OUTPUT")]
    output: Option<PathBuf>,

    /// Output structured JSON instead of plain sentences.
    #[arg(long, env = "PROSE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PROSE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PROSE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PROSE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Lenient,
    Markup,
}

impl From<ModeArg> for FilterMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Lenient => FilterMode::Lenient,
            ModeArg::Markup => FilterMode::MarkupAware,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GateArg {
    Lenient,
    Strict,
}

impl From<GateArg> for GateMode {
    fn from(v: GateArg) -> Self {
        match v {
            GateArg::Lenient => GateMode::Lenient,
            GateArg::Strict => GateMode::Strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.file.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let extraction = load_extraction(&cli).await?;

    // ── Local file mode ──────────────────────────────────────────────────
    if let Some(ref path) = cli.file {
        let doc = extract_file(path, &extraction)
            .await
            .context("Extraction failed")?;

        let rendered = if cli.json {
            serde_json::to_string_pretty(&doc).context("Failed to serialise output")? + "\n"
        } else {
            doc.sentences.iter().map(|s| format!("{s}\n")).collect()
        };
        emit(&cli, &rendered).await?;

        if !cli.quiet && !cli.json {
            eprintln!(
                "{} {} sentences from {}/{} lines  {}",
                if doc.verdict.accepted {
                    green("✔")
                } else {
                    yellow("○")
                },
                bold(&doc.sentences.len().to_string()),
                doc.lines_kept,
                doc.lines_total,
                dim(&format!(
                    "letter ratio {:.2}{}",
                    doc.verdict.alpha_ratio,
                    if doc.verdict.accepted { "" } else { ", not English" }
                )),
            );
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn SamplingProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, extraction, progress_cb)?;

    // ── Run sampling ─────────────────────────────────────────────────────
    if let (Some(query), Some(path), false) = (&cli.query, &cli.output, cli.json) {
        let stats = sample_to_file(query, path, &config)
            .await
            .context("Sampling failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} sentences  {}/{} books  {}ms  →  {}",
                if stats.books_failed == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                stats.sentences_sampled,
                stats.books_accepted,
                stats.books_selected,
                stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
        return Ok(());
    }

    let output = match (&cli.id, &cli.query) {
        (Some(id), _) => sample_book(id, &config).await,
        (None, Some(query)) => sample(query, &config).await,
        (None, None) => anyhow::bail!("Nothing to sample: pass a QUERY, --id or --file"),
    }
    .context("Sampling failed")?;

    let rendered = if cli.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")? + "\n"
    } else {
        output.to_text()
    };
    emit(&cli, &rendered).await?;

    if !cli.quiet && !cli.json {
        print_summary(&output, show_progress);
    }

    Ok(())
}

/// Write `rendered` to `--output` or stdout.
async fn emit(cli: &Cli, rendered: &str) -> Result<()> {
    match cli.output {
        Some(ref path) => tokio::fs::write(path, rendered)
            .await
            .with_context(|| format!("Failed to write {:?}", path)),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")
        }
    }
}

fn print_summary(output: &SampleOutput, show_progress: bool) {
    let stats = &output.stats;
    if !show_progress {
        eprintln!(
            "Sampled {} sentences from {}/{} books in {}ms",
            stats.sentences_sampled,
            stats.books_accepted,
            stats.books_selected,
            stats.total_duration_ms
        );
    }
    if stats.books_not_english > 0 {
        eprintln!("  {} books not English", stats.books_not_english);
    }
    if stats.books_failed > 0 {
        eprintln!("  {} books failed", stats.books_failed);
    }
    if output.sentences.is_empty() {
        eprintln!(
            "{} no sentences survived the filters; try another query or --gate lenient",
            yellow("○")
        );
    } else {
        eprintln!(
            "   {} candidate sentences  —  {}ms downloading",
            dim(&stats.sentences_extracted.to_string()),
            stats.fetch_duration_ms,
        );
    }
}

/// Extraction rules: the JSON file if given, then `--mode` / `--gate`.
async fn load_extraction(cli: &Cli) -> Result<ExtractionConfig> {
    let mut extraction = match cli.extraction_config {
        Some(ref path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read extraction config from {:?}", path))?;
            serde_json::from_str::<ExtractionConfig>(&raw)
                .with_context(|| format!("Invalid extraction config in {:?}", path))?
        }
        None => ExtractionConfig::default(),
    };

    if let Some(mode) = cli.mode {
        extraction.filter_mode = mode.into();
    }
    if let Some(gate) = cli.gate {
        extraction.gate_mode = gate.into();
    }
    extraction
        .validate()
        .context("Invalid extraction config")?;
    Ok(extraction)
}

/// Map CLI args to `SamplerConfig`.
fn build_config(
    cli: &Cli,
    extraction: ExtractionConfig,
    progress: Option<ProgressCallback>,
) -> Result<SamplerConfig> {
    let mut builder = SamplerConfig::builder()
        .archive_base_url(cli.base_url.clone())
        .search_rows(cli.rows)
        .english_only(cli.english_only)
        .max_books(cli.books)
        .sample_size(cli.count)
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .extraction(extraction);

    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
