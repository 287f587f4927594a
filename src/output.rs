//! Console presentation: status markers, boxed banners and size formatting.
//!
//! Everything here renders to `String` so callers decide where lines go.

use colored::{Color, Colorize};

pub mod symbols {
    pub const STEP: &str = "▸";
    pub const PROMPT: &str = "$";
    pub const SUCCESS: &str = "✓";
    pub const WARNING: &str = "⚠";
    pub const ERROR: &str = "✗";
    pub const PACKAGE: &str = "📦";
}

const BANNER_WIDTH: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub info: Color,
    pub success: Color,
    pub warn: Color,
    pub error: Color,
    pub enabled: bool,
}

impl Palette {
    pub fn ansi() -> Self {
        Palette {
            info: Color::BrightCyan,
            success: Color::BrightGreen,
            warn: Color::BrightYellow,
            error: Color::BrightRed,
            enabled: true,
        }
    }

    pub fn plain() -> Self {
        Palette {
            enabled: false,
            ..Palette::ansi()
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).bold().to_string()
        } else {
            text.to_owned()
        }
    }

    fn marked(&self, marker: &str, color: Color, msg: &str) -> String {
        format!("{} {}", self.paint(marker, color), msg)
    }

    pub fn step(&self, msg: &str) -> String {
        self.marked(symbols::STEP, self.info, msg)
    }

    pub fn command(&self, command: &str) -> String {
        format!("  {} {}", self.paint(symbols::PROMPT, self.info), command)
    }

    pub fn success(&self, msg: &str) -> String {
        self.marked(symbols::SUCCESS, self.success, msg)
    }

    pub fn warn(&self, msg: &str) -> String {
        self.marked(symbols::WARNING, self.warn, msg)
    }

    pub fn error(&self, msg: &str) -> String {
        self.marked(symbols::ERROR, self.error, msg)
    }

    pub fn info_banner(&self, title: &str) -> String {
        self.banner(title, self.info)
    }

    pub fn success_banner(&self, title: &str) -> String {
        self.banner(title, self.success)
    }

    pub fn error_banner(&self, title: &str) -> String {
        self.banner(title, self.error)
    }

    /// Three-line box around `title`; longer titles widen the box.
    fn banner(&self, title: &str, color: Color) -> String {
        let inner = format!("   {}", title);
        let width = BANNER_WIDTH.max(inner.chars().count() + 3);
        let pad = width - inner.chars().count();
        let rule = "═".repeat(width);

        [
            format!("╔{}╗", rule),
            format!("║{}{}║", inner, " ".repeat(pad)),
            format!("╚{}╝", rule),
        ]
        .iter()
        .map(|line| self.paint(line, color))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_seconds(seconds: f64) -> String {
    format!("{:.1}s", seconds)
}
