//! Static font-metric tables for the document fonts, plus page configuration.
//!
//! The printed invoice uses the PDF base-14 Helvetica family, so widths come
//! from the Adobe AFM advance widths (per mille of the em, stored here as em
//! fractions). Tables cover ASCII 0x20..=0x7E; index = (char as usize) - 32.
//! Anything else measures as `average_char_width`.
//!
//! The same module decides which characters the font can draw at all: a
//! character is supported iff it has a WinAnsiEncoding code.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Font weight
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
}

impl FontWeight {
    /// PostScript name of the base-14 font for this weight.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontWeight::Regular => "Helvetica",
            FontWeight::Bold => "Helvetica-Bold",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    A4,
    Letter,
}

impl FromStr for PageSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            other => anyhow::bail!("unknown page size '{other}' (expected a4 or letter)"),
        }
    }
}

/// What to do with a free-text character the document font cannot draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphPolicy {
    /// Fail the render with `RenderError::UnsupportedGlyph`.
    Reject,
    /// Replace the character with `?`.
    Substitute,
}

impl FromStr for GlyphPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(GlyphPolicy::Reject),
            "substitute" => Ok(GlyphPolicy::Substitute),
            other => anyhow::bail!("unknown glyph policy '{other}' (expected reject or substitute)"),
        }
    }
}

/// Physical page parameters, all lengths in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub size: PageSize,
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub glyph_policy: GlyphPolicy,
}

impl PageConfig {
    /// ISO A4 (210 × 297 mm), 20 mm margins.
    pub fn a4() -> Self {
        Self::with_dimensions(PageSize::A4, 210.0, 297.0)
    }

    /// US Letter (8.5" × 11"), 20 mm margins.
    pub fn letter() -> Self {
        Self::with_dimensions(PageSize::Letter, 215.9, 279.4)
    }

    pub fn for_size(size: PageSize) -> Self {
        match size {
            PageSize::A4 => Self::a4(),
            PageSize::Letter => Self::letter(),
        }
    }

    fn with_dimensions(size: PageSize, width_mm: f32, height_mm: f32) -> Self {
        PageConfig {
            size,
            width_mm,
            height_mm,
            margin_top_mm: 20.0,
            margin_bottom_mm: 20.0,
            margin_left_mm: 20.0,
            margin_right_mm: 20.0,
            glyph_policy: GlyphPolicy::Reject,
        }
    }

    pub fn with_glyph_policy(mut self, policy: GlyphPolicy) -> Self {
        self.glyph_policy = policy;
        self
    }

    pub fn content_width(&self) -> f32 {
        self.width_mm - self.margin_left_mm - self.margin_right_mm
    }

    pub fn content_height(&self) -> f32 {
        self.height_mm - self.margin_top_mm - self.margin_bottom_mm
    }

    /// Lowest y a block may reach before the page must break.
    pub fn bottom_threshold(&self) -> f32 {
        self.height_mm - self.margin_bottom_mm
    }

    pub fn content_right(&self) -> f32 {
        self.width_mm - self.margin_right_mm
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for one font weight.
///
/// `widths[i]` = advance width of ASCII character `(i + 32)` in em.
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for characters outside the table.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Measures the advance width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Width of `s` in millimetres when set at `size_pt`.
    pub fn width_mm(&self, s: &str, size_pt: f32) -> f32 {
        em_to_mm(self.measure_str(s), size_pt)
    }
}

pub fn em_to_mm(em: f32, size_pt: f32) -> f32 {
    em * size_pt * MM_PER_PT
}

pub fn mm_to_em(mm: f32, size_pt: f32) -> f32 {
    mm / (size_pt * MM_PER_PT)
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};

/// Returns the static metric table for a font weight.
pub fn get_metrics(weight: FontWeight) -> &'static FontMetricTable {
    match weight {
        FontWeight::Regular => &HELVETICA_TABLE,
        FontWeight::Bold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// WinAnsi coverage
// ────────────────────────────────────────────────────────────────────────────

/// Maps a character to its WinAnsiEncoding (cp1252) byte, if it has one.
///
/// Control characters have no glyph and map to `None`.
pub fn to_winansi(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{0020}'..='\u{007E}' => ch as u8,
        '\u{00A0}'..='\u{00FF}' => ch as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

pub fn supports_char(ch: char) -> bool {
    to_winansi(ch).is_some()
}

/// Encodes a whole string, or returns the first character that has no code.
pub fn encode_winansi(s: &str) -> Result<Vec<u8>, char> {
    s.chars().map(|c| to_winansi(c).ok_or(c)).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
