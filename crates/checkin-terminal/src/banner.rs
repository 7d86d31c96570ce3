//! Two-line instruction banner shown on the kiosk screen.
//!
//! The banner is a text model only: a headline and a detail line, each
//! limited to a fixed number of columns. Rendering and styling belong to
//! whatever front end mounts the terminal view.
//!
//! # Examples
//!
//! ```
//! use checkin_terminal::{InstructionBanner, KioskState};
//!
//! let mut banner = InstructionBanner::new(48);
//! banner.update_from_state(KioskState::Scanning);
//! assert_eq!(banner.headline(), "Scan your badge");
//!
//! banner.set_instruction("Badge not recognized");
//! assert_eq!(banner.headline(), "Badge not recognized");
//! assert_eq!(banner.detail(), "");
//! ```

use checkin_core::constants::DEFAULT_BANNER_COLUMNS;
use serde::{Deserialize, Serialize};

use crate::KioskState;

/// Horizontal placement of a line inside the banner width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Headline plus detail line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionBanner {
    columns: usize,
    headline: String,
    detail: String,
}

impl InstructionBanner {
    /// Empty banner `columns` characters wide.
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            headline: String::new(),
            detail: String::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Replace the headline and clear the detail line.
    pub fn set_instruction(&mut self, text: &str) {
        self.headline = self.fit(text);
        self.detail.clear();
    }

    pub fn set_detail(&mut self, text: &str) {
        self.detail = self.fit(text);
    }

    pub fn set_lines(&mut self, headline: &str, detail: &str) {
        self.headline = self.fit(headline);
        self.detail = self.fit(detail);
    }

    pub fn clear(&mut self) {
        self.headline.clear();
        self.detail.clear();
    }

    /// Show the default instruction for `state`.
    pub fn update_from_state(&mut self, state: KioskState) {
        let (headline, detail) = match state {
            KioskState::Idle => ("Check-in paused", "Tap start to begin scanning"),
            KioskState::Scanning => ("Scan your badge", "Hold the QR code up to the camera"),
            KioskState::Verifying => ("Checking badge...", "One moment please"),
            KioskState::Success => ("Checked in", "Have a blessed day"),
            KioskState::Error => ("Terminal needs attention", "Tap retry to continue"),
        };
        self.set_lines(headline, detail);
    }

    /// Both lines padded to the full width, as a fixed-size screen shows them.
    pub fn render(&self, alignment: Alignment) -> [String; 2] {
        [
            align_text(&self.headline, self.columns, alignment),
            align_text(&self.detail, self.columns, alignment),
        ]
    }

    fn fit(&self, text: &str) -> String {
        truncate_text(&sanitize_text(text), self.columns)
    }
}

impl Default for InstructionBanner {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_COLUMNS)
    }
}

/// Pad `text` to `width` characters; longer text is truncated.
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();
    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left = padding / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
        }
    }
}

/// Keep at most `width` characters (not bytes) of `text`.
fn truncate_text(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Drop control characters and surrounding whitespace.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
