//! Logging and terminal output.
//!
//! - Structured `tracing` logs: JSON to a daily rolling file, human readable to stderr
//! - miette hook for error reports
//! - indicatif progress bars, hidden on non-interactive terminals
//! - console styled panels and status lines for command output

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use console::{style, Term};
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use supports_color::Stream;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Base name of the rolling log file.
const LOG_FILE_NAME: &str = "brownfield.log";

static TERMINAL_CAPS: OnceLock<TerminalCapabilities> = OnceLock::new();

fn get_terminal_caps() -> &'static TerminalCapabilities {
    TERMINAL_CAPS.get_or_init(TerminalCapabilities::detect)
}

// ============================================================================
// Terminal Capability Detection
// ============================================================================

/// Terminal color support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLevel {
    TrueColor,
    Ansi256,
    Ansi16,
    NoColor,
}

/// Detected terminal capabilities
#[derive(Debug, Clone)]
pub struct TerminalCapabilities {
    pub color_level: ColorLevel,
    pub supports_unicode: bool,
    pub is_interactive: bool,
    pub width: u16,
}

impl TerminalCapabilities {
    /// Detect terminal capabilities from environment
    pub fn detect() -> Self {
        use is_terminal::IsTerminal;

        let color_level = match supports_color::on(Stream::Stdout) {
            Some(support) if support.has_16m => ColorLevel::TrueColor,
            Some(support) if support.has_256 => ColorLevel::Ansi256,
            Some(support) if support.has_basic => ColorLevel::Ansi16,
            _ => ColorLevel::NoColor,
        };

        let is_interactive = io::stdout().is_terminal();
        let width = Term::stdout().size().1;

        let supports_unicode = std::env::var("TERM")
            .map(|t| !t.contains("dumb"))
            .unwrap_or(true)
            && std::env::var("LANG")
                .map(|l| l.contains("UTF-8") || l.contains("utf8"))
                .unwrap_or(true);

        Self {
            color_level,
            supports_unicode,
            is_interactive,
            width,
        }
    }

    pub fn should_colorize(&self) -> bool {
        self.is_interactive && self.color_level != ColorLevel::NoColor
    }
}

// ============================================================================
// Logging Initialization
// ============================================================================

/// Initialize the logging system.
///
/// Sets up a stderr layer and, when enabled, a JSON file layer rolled daily
/// under the configured log directory. `RUST_LOG` overrides the configured
/// level. `log` records are bridged into tracing by the subscriber.
///
/// Returns a `WorkerGuard` that must be held until shutdown so buffered file
/// logs are flushed.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter.clone());

    let (file_layer, guard, log_dir) = if config.json_file {
        let log_dir = config.log_dir();
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory {}: {}", log_dir.display(), e);
        }

        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_filter(env_filter);
        (Some(layer), Some(guard), Some(log_dir))
    } else {
        (None, None, None)
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {}", e);
    }

    init_miette();

    if let Some(log_dir) = log_dir {
        tracing::debug!(path = %log_dir.join(LOG_FILE_NAME).display(), "File logging enabled (daily rolling)");
        std::thread::spawn(move || compress_old_logs(&log_dir));
    }

    guard
}

/// Gzip rolled log files from previous days.
///
/// The daily appender dates its files in UTC, so "today" is the UTC date.
fn compress_old_logs(log_dir: &Path) {
    let today_suffix = active_log_suffix();
    let prefix = format!("{}.", LOG_FILE_NAME);

    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if name.starts_with(&prefix) && !name.ends_with(&today_suffix) && !name.ends_with(".gz") {
            match compress_file(&path) {
                Ok(()) => log::info!("Compressed old log: {:?}", path),
                Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
            }
        }
    }
}

/// Date suffix of the file the daily appender is currently writing.
fn active_log_suffix() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn compress_file(path: &Path) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?;
    let mut gz_name = file_name.to_os_string();
    gz_name.push(".gz");
    let gz_path: PathBuf = path.with_file_name(gz_name);

    if gz_path.exists() {
        return Ok(());
    }

    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)
}

fn init_miette() {
    let caps = get_terminal_caps();

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(caps.color_level == ColorLevel::TrueColor)
                .unicode(caps.supports_unicode)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(caps.should_colorize())
                .build(),
        )
    }))
    .ok(); // Ignore if already set
}

// ============================================================================
// Progress Bars
// ============================================================================

pub struct ProgressStyles;

impl ProgressStyles {
    /// Record counter with percentage, throughput and ETA
    pub fn records_bar() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(
                "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {per_sec} | ETA: {eta}",
            )
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

/// Progress bar over `total` records.
///
/// Drawn only when `enabled` and stdout is a terminal.
pub fn record_progress(total: u64, message: &str, enabled: bool) -> ProgressBar {
    if !enabled || !get_terminal_caps().is_interactive {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    pb.set_style(ProgressStyles::records_bar());
    pb.set_message(message.to_string());
    pb
}

// ============================================================================
// Console Output Utilities
// ============================================================================

/// Print a styled panel with title and content
pub fn print_panel(title: &str, content: &str) {
    let caps = get_terminal_caps();
    let width = (caps.width as usize).clamp(20, 80);

    let (border, tl, tr, bl, br, side) = if caps.supports_unicode {
        ("─", "╭", "╮", "╰", "╯", "│")
    } else {
        ("-", "+", "+", "+", "+", "|")
    };

    let title_display = format!(" {} ", title);
    let border_len = width
        .saturating_sub(title_display.chars().count())
        .saturating_sub(2)
        .max(1);
    println!(
        "{}{}{}{}",
        style(tl).cyan(),
        style(&title_display).cyan().bold(),
        style(border.repeat(border_len)).cyan(),
        style(tr).cyan()
    );

    let content_width = width.saturating_sub(4).max(1);
    for line in content.lines() {
        let padded = format!("{:width$}", line, width = content_width);
        println!("{} {} {}", style(side).cyan(), padded, style(side).cyan());
    }

    println!(
        "{}{}{}",
        style(bl).cyan(),
        style(border.repeat(width.saturating_sub(2).max(1))).cyan(),
        style(br).cyan()
    );
}

fn status_prefix(unicode: &'static str, ascii: &'static str) -> &'static str {
    if get_terminal_caps().supports_unicode {
        unicode
    } else {
        ascii
    }
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        style(status_prefix("✔", "[v]")).green(),
        style(message).green()
    );
}

pub fn print_warning(message: &str) {
    println!(
        "{} {}",
        style(status_prefix("⚠", "[!]")).yellow(),
        style(message).yellow().bold()
    );
}

pub fn print_info(message: &str) {
    println!("{} {}", style(status_prefix("ℹ", "(i)")).blue(), message);
}
