//! Typed failures surfaced by the engine.
//!
//! Orchestration code returns `anyhow::Result`; callers that need to react to a
//! specific failure class use `err.downcast_ref::<T>()` on these types.
//! Failing to converge is not an error and lives in [`crate::converge`].

use thiserror::Error;

use crate::core::types::BoardId;

/// Grid text that does not follow the row-encoded `0`/`1` format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid cell {symbol:?} at row {row}, column {col} (expected '0' or '1')")]
    InvalidSymbol { row: usize, col: usize, symbol: char },
}

/// A board or a generation that was never materialized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("board {0} not found")]
    Board(BoardId),
    #[error("step {step} not found for board {board}")]
    Step { board: BoardId, step: u64 },
}

/// `advance` was called on a board whose generation log is empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("board {board} has no generations")]
pub struct NoGenerationsError {
    pub board: BoardId,
}

/// The store refused an append that would break step contiguity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("board {board}: cannot append step {offered}, next step is {expected}")]
pub struct StepConflictError {
    pub board: BoardId,
    pub expected: u64,
    pub offered: u64,
}

/// Caller input rejected before any state was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", .messages.join("; "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }
}
