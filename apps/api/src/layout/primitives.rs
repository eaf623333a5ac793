use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontWeight;

/// Horizontal anchor of a text run relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Left,
    Center,
    Right,
}

/// One positioned draw instruction. Coordinates are millimetres from the
/// top-left page corner; a text `y` is its baseline. `gray` is 0 (black) to
/// 255 (white).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Text {
        x: f32,
        y: f32,
        text: String,
        weight: FontWeight,
        size_pt: f32,
        anchor: TextAnchor,
    },
    FilledRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: u8,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        gray: u8,
    },
}

impl Primitive {
    pub fn text(
        x: f32,
        y: f32,
        text: impl Into<String>,
        weight: FontWeight,
        size_pt: f32,
        anchor: TextAnchor,
    ) -> Self {
        Primitive::Text {
            x,
            y,
            text: text.into(),
            weight,
            size_pt,
            anchor,
        }
    }

    /// Same primitive moved down by `dy`.
    pub fn shifted(&self, dy: f32) -> Self {
        let mut moved = self.clone();
        match &mut moved {
            Primitive::Text { y, .. } | Primitive::FilledRect { y, .. } => *y += dy,
            Primitive::Rule { y1, y2, .. } => {
                *y1 += dy;
                *y2 += dy;
            }
        }
        moved
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Primitive::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// One printable page of draw instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub content_width: f32,
    pub content_height: f32,
    pub primitives: Vec<Primitive>,
}

#[cfg(test)]
impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(Primitive::as_text)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}
