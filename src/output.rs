//! Console output for the bot: run headers, per-recipe steps and download progress

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Header,
    Step,
    Done,
    Note,
    Warning,
    Error,
}

impl Line {
    fn to_stderr(self) -> bool {
        matches!(self, Line::Warning | Line::Error)
    }
}

fn render(line: Line, message: &str) -> String {
    match line {
        Line::Header => format!("{} {}", "==>".blue().bold(), message.bold()),
        Line::Step => format!("  {} {}", "->".cyan(), message),
        Line::Done => format!("{} {}", "==>".green().bold(), message.green()),
        Line::Note => format!("{} {}", "::".cyan(), message),
        Line::Warning => format!("{} {}", "warning:".yellow().bold(), message),
        Line::Error => format!("{} {}", "error:".red().bold(), message.red()),
    }
}

fn emit(line: Line, message: &str) {
    let text = render(line, message);
    if line.to_stderr() {
        eprintln!("{text}");
    } else {
        println!("{text}");
    }
}

/// "==> Checking 3 open PR(s) by emscripten-forge-bot"
pub fn action(message: &str) {
    emit(Line::Header, message);
}

/// "(2/40) zlib", printed before each recipe of a run.
pub fn recipe_header(current: usize, total: usize, name: &str) {
    println!("{} {}", format!("({current}/{total})").cyan(), name.bold());
}

/// Indented step under the current header.
pub fn step(message: &str) {
    emit(Line::Step, message);
}

pub fn success(message: &str) {
    emit(Line::Done, message);
}

pub fn info(message: &str) {
    emit(Line::Note, message);
}

pub fn warning(message: &str) {
    emit(Line::Warning, message);
}

pub fn error(message: &str) {
    emit(Line::Error, message);
}

/// Progress bar for a source download. Unknown sizes get a byte counter spinner.
pub fn download_progress(total_size: Option<u64>) -> ProgressBar {
    let (pb, template) = match total_size {
        Some(total) => (
            ProgressBar::new(total),
            "     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})",
        ),
        None => (ProgressBar::new_spinner(), "     {spinner:.cyan} {bytes}"),
    };
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("━╸━"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
