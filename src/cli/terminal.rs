//! Terminal capability detection and colored output

use std::fmt::Display;

use owo_colors::{OwoColorize, colors::css};

/// Whether stdout accepts ANSI colors
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Whether the terminal is too narrow for column layouts (< 60 columns)
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}

fn paint<T: Display + ?Sized>(value: &T, style: impl FnOnce(&str) -> String) -> String {
    let text = value.to_string();
    if supports_color() { style(&text) } else { text }
}

/// Colors for report output, applied only when the terminal supports them.
pub trait Colorize: Display {
    /// Green
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    /// Orange
    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    /// Red
    fn failure(&self) -> String {
        paint(self, |s| s.fg::<css::Red>().to_string())
    }

    /// Light blue
    fn info(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

impl<T: Display + ?Sized> Colorize for T {}

/// Print a table heading with a rule beneath it.
pub fn heading(title: &str) {
    println!("{title}");
    println!("{}", "─".repeat(title.chars().count()).dim());
}
