//! Storage abstraction for boards and their generation logs.
//!
//! The [`Store`] trait decouples the engine from the concrete backend. The
//! engine never retries a failed store call; backends own any retry policy.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::{Board, BoardId, Generation, NewBoard};
use crate::io::file_store::FileStore;
use crate::io::memory_store::MemoryStore;

/// Persistence operations the engine relies on.
///
/// Implementations guard appends: `persist_generation` must reject any step
/// other than the current generation count with
/// [`StepConflictError`](crate::error::StepConflictError), so a log can never
/// gain duplicate or skipped steps even without external locking.
pub trait Store: Send + Sync {
    /// Create a board and its generation 0 atomically, assigning a fresh id.
    fn insert_board(&self, board: &NewBoard, generation_zero: &str) -> Result<Board>;

    fn load_board(&self, id: BoardId) -> Result<Option<Board>>;

    /// Delete a board and every generation it owns. Returns `false` if absent.
    fn delete_board(&self, id: BoardId) -> Result<bool>;

    /// Append `generation` to its board's log.
    fn persist_generation(&self, generation: &Generation) -> Result<()>;

    fn load_generation(&self, id: BoardId, step: u64) -> Result<Option<Generation>>;

    /// Number of persisted generations; 0 for an unknown board.
    fn count_generations(&self, id: BoardId) -> Result<u64>;

    /// Ids of all stored boards, ascending.
    fn board_ids(&self) -> Result<Vec<BoardId>>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn insert_board(&self, board: &NewBoard, generation_zero: &str) -> Result<Board> {
        (**self).insert_board(board, generation_zero)
    }

    fn load_board(&self, id: BoardId) -> Result<Option<Board>> {
        (**self).load_board(id)
    }

    fn delete_board(&self, id: BoardId) -> Result<bool> {
        (**self).delete_board(id)
    }

    fn persist_generation(&self, generation: &Generation) -> Result<()> {
        (**self).persist_generation(generation)
    }

    fn load_generation(&self, id: BoardId, step: u64) -> Result<Option<Generation>> {
        (**self).load_generation(id, step)
    }

    fn count_generations(&self, id: BoardId) -> Result<u64> {
        (**self).count_generations(id)
    }

    fn board_ids(&self) -> Result<Vec<BoardId>> {
        (**self).board_ids()
    }
}

/// Backend selector for [`open_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    File,
}

/// Storage section of [`LifeConfig`](crate::io::config::LifeConfig).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Data directory for the file backend.
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            dir: ".life/data".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == Backend::File && self.dir.trim().is_empty() {
            return Err(anyhow!("storage.dir must be set for the file backend"));
        }
        Ok(())
    }
}

/// Open the backend described by `config`.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn Store>> {
    config.validate()?;
    Ok(match config.backend {
        Backend::Memory => Box::new(MemoryStore::new()),
        Backend::File => Box::new(FileStore::open(&config.dir)?),
    })
}
