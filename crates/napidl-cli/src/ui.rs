//! napidl CLI UI primitives.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal color palette
pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(51);
    pub const MAGENTA: Color = Color::Color256(201);
    pub const AMBER: Color = Color::Color256(214);
    pub const NEON_GREEN: Color = Color::Color256(82);
    pub const DIM: Color = Color::Color256(240);
}

pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TARGET_FILLED: &str = "\u{25C9}"; // ◉
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
}

/// Print a success message
pub fn success(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::TARGET_FILLED).fg(colors::NEON_GREEN),
        msg
    );
}

/// Print an error message
pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

/// Print a warning
pub fn warning(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::TRIANGLE).fg(colors::AMBER),
        style(msg).fg(colors::AMBER)
    );
}

/// Print an info message
pub fn info(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        msg
    );
}

/// Print a dim/secondary message
pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

/// Create a spinner for a running phase
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("\u{25CE}\u{25C9}\u{25CE}\u{25C9}") // ◎◉◎◉
        .template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(150));
    pb
}

/// Formats the definition counts of a run, skipping empty kinds.
pub fn counts(interfaces: usize, dictionaries: usize, enums: usize, typedefs: usize) -> String {
    let parts: Vec<String> = [
        (interfaces, "interface"),
        (dictionaries, "dictionary"),
        (enums, "enum"),
        (typedefs, "typedef"),
    ]
    .iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, noun)| format!("{} {}", count, plural(noun, *count)))
    .collect();

    if parts.is_empty() {
        "no definitions".to_string()
    } else {
        parts.join(", ")
    }
}

fn plural(noun: &str, count: usize) -> String {
    match (noun, count) {
        (_, 1) => noun.to_string(),
        ("dictionary", _) => "dictionaries".to_string(),
        _ => format!("{}s", noun),
    }
}

/// Print timing information
pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        label,
        duration_ms
    );
}
