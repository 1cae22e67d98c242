//! Text layers.
//!
//! Layout is measured by the host. Until it reports back, width and height
//! are estimates and the layer is marked layout-pending.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    /// Handwritten style font (default).
    #[default]
    HandDrawn,
    /// Clean sans-serif font.
    Normal,
    /// Monospace font.
    Code,
}

impl FontFamily {
    /// Map the legacy numeric font ids.
    pub fn from_legacy_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(FontFamily::HandDrawn),
            2 => Some(FontFamily::Normal),
            3 => Some(FontFamily::Code),
            _ => None,
        }
    }

    /// Average glyph advance as a fraction of the font size.
    fn char_width_factor(&self) -> f64 {
        match self {
            FontFamily::HandDrawn => 0.55,
            FontFamily::Normal => 0.52,
            FontFamily::Code => 0.60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub font_size: f64,
    pub font_family: FontFamily,
    pub text_align: TextAlign,
    /// Layer this text is bound inside, if any.
    pub container_id: Option<String>,
    /// Width and height are estimates awaiting a host layout.
    #[serde(skip)]
    pub layout_pending: bool,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 20.0,
            font_family: FontFamily::default(),
            text_align: TextAlign::default(),
            container_id: None,
            layout_pending: false,
        }
    }
}

impl Text {
    /// Rough size from character count and font size.
    pub fn estimate_size(&self) -> Size {
        // For multi-line text, find the widest line
        let max_line_len = self
            .text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let width = max_line_len as f64 * self.font_size * self.font_family.char_width_factor();

        // lines() drops a trailing empty line
        let mut line_count = self.text.lines().count().max(1);
        if self.text.ends_with('\n') {
            line_count += 1;
        }
        let height = line_count as f64 * self.font_size * LINE_HEIGHT;
        Size::new(width, height)
    }
}
