//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use carry_core::{Action, Outcome};
use colored::Colorize;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

/// Colored action label.
#[must_use]
pub fn action_label(action: &Action) -> String {
    let text = action.to_string();
    match action {
        Action::Carry | Action::UpstreamPick(_) => text.cyan().to_string(),
        Action::Drop => text.dimmed().to_string(),
        Action::Unknown(_) => text.yellow().to_string(),
    }
}

/// Status indicator for an outcome.
#[must_use]
pub fn outcome_indicator(outcome: &Outcome) -> String {
    match outcome {
        Outcome::AppliedDirect => "●".green().to_string(),
        Outcome::AppliedViaResolution { .. } => "◐".green().to_string(),
        Outcome::Dropped | Outcome::Skipped { .. } => "○".dimmed().to_string(),
        Outcome::Failed(_) => "●".red().to_string(),
    }
}
