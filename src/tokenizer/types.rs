use std::fmt;
use serde::{Deserialize, Serialize};

/// Which end of an over-length sequence is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationDirection {
    Left,
    Right,
}

impl fmt::Display for TruncationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TruncationDirection::Left => write!(f, "left"),
            TruncationDirection::Right => write!(f, "right"),
        }
    }
}

/// The result of one encode call.
///
/// `ids` is always populated. Every other field is `None` unless it was
/// requested, and when populated it has the same length as `ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_ids: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_tokens_mask: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention_mask: Option<Vec<u32>>,
    /// Half-open character spans; `(0, 0)` for tokens without a source span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offsets: Option<Vec<(usize, usize)>>,
}

impl Encoding {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
