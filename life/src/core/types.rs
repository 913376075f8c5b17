//! Shared data model for boards and their generation logs.
//!
//! Grid states are carried in their textual form (see [`crate::core::grid`]),
//! which is also the persisted representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of one simulation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(pub u64);

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BoardId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BoardId)
    }
}

/// Caller-supplied board parameters, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBoard {
    pub initial_state: String,
    pub rows: usize,
    pub cols: usize,
}

/// A persisted board. Immutable once generation 0 exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub initial_state: String,
    pub rows: usize,
    pub cols: usize,
}

/// One snapshot in a board's append-only generation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub board: BoardId,
    /// Dense, zero-based step index.
    pub step: u64,
    pub state: String,
}
