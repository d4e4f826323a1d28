#![forbid(unsafe_code)]

//! Grid mutation records.

use serde::{Deserialize, Serialize};

/// One instruction in a grid batch.
///
/// Serialized with the wire field names the host program uses: `kind`
/// selects the variant, `y` is the row, `x` the column, and `html` the
/// markup fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GridMutation {
    /// Append `markup` to row `row`, creating the row node on first use.
    Insert {
        #[serde(rename = "y")]
        row: u32,
        #[serde(rename = "html")]
        markup: String,
    },
    /// Replace the cell at (`row`, `column`) with `markup`.
    Update {
        #[serde(rename = "y")]
        row: u32,
        #[serde(rename = "x")]
        column: u32,
        #[serde(rename = "html")]
        markup: String,
    },
    /// Detach the cell at (`row`, `column`).
    Remove {
        #[serde(rename = "y")]
        row: u32,
        #[serde(rename = "x")]
        column: u32,
    },
}

impl GridMutation {
    #[must_use]
    pub fn insert(row: u32, markup: impl Into<String>) -> Self {
        Self::Insert {
            row,
            markup: markup.into(),
        }
    }

    #[must_use]
    pub fn update(row: u32, column: u32, markup: impl Into<String>) -> Self {
        Self::Update {
            row,
            column,
            markup: markup.into(),
        }
    }

    #[must_use]
    pub const fn remove(row: u32, column: u32) -> Self {
        Self::Remove { row, column }
    }

    /// Wire name of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "Insert",
            Self::Update { .. } => "Update",
            Self::Remove { .. } => "Remove",
        }
    }

    #[must_use]
    pub const fn row(&self) -> u32 {
        match self {
            Self::Insert { row, .. } | Self::Update { row, .. } | Self::Remove { row, .. } => *row,
        }
    }

    /// Column index, absent for inserts.
    #[must_use]
    pub const fn column(&self) -> Option<u32> {
        match self {
            Self::Insert { .. } => None,
            Self::Update { column, .. } | Self::Remove { column, .. } => Some(*column),
        }
    }
}
