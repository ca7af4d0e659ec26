use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LaneCategory
// ---------------------------------------------------------------------------

/// Workflow stage a lane belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneCategory {
    NotStarted,
    InProgress,
    Done,
}

impl LaneCategory {
    pub fn all() -> &'static [LaneCategory] {
        &[
            LaneCategory::NotStarted,
            LaneCategory::InProgress,
            LaneCategory::Done,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LaneCategory::NotStarted => "not_started",
            LaneCategory::InProgress => "in_progress",
            LaneCategory::Done => "done",
        }
    }
}

impl fmt::Display for LaneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LaneCategory {
    type Err = crate::error::BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(LaneCategory::NotStarted),
            "in_progress" => Ok(LaneCategory::InProgress),
            "done" => Ok(LaneCategory::Done),
            _ => Err(crate::error::BoardError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BoardAction
// ---------------------------------------------------------------------------

/// What a caller is trying to do on a board; passed to the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardAction {
    ViewBoard,
    MoveItem,
}

impl BoardAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BoardAction::ViewBoard => "view_board",
            BoardAction::MoveItem => "move_item",
        }
    }
}

impl fmt::Display for BoardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
