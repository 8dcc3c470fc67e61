//! Terminal capability detection and colouring

use std::fmt;

use owo_colors::OwoColorize;

/// Columns below which the compact layout is used.
const NARROW_WIDTH: u16 = 60;

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Check if terminal is narrow
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(|w| w < NARROW_WIDTH)
}

/// Extension trait colouring text by what it describes.
///
/// Every method falls back to plain text when colour is not supported.
pub trait Colorize {
    /// An empty spot (green).
    fn free(&self) -> String;
    /// A reserved spot or an error (red).
    fn reserved(&self) -> String;
    /// An occupied spot (blue).
    fn occupied(&self) -> String;
    /// A heading (bold).
    fn heading(&self) -> String;
    /// Secondary detail (dimmed).
    fn dim(&self) -> String;
}

impl<T: fmt::Display> Colorize for T {
    fn free(&self) -> String {
        paint(self, |s| s.green().to_string())
    }

    fn reserved(&self) -> String {
        paint(self, |s| s.red().to_string())
    }

    fn occupied(&self) -> String {
        paint(self, |s| s.blue().to_string())
    }

    fn heading(&self) -> String {
        paint(self, |s| s.bold().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

fn paint<T: fmt::Display>(value: &T, style: impl FnOnce(&T) -> String) -> String {
    if supports_color() {
        style(value)
    } else {
        value.to_string()
    }
}
