//! In-process store backed by a mutex-guarded map.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::core::types::{Board, BoardId, Generation, NewBoard};
use crate::error::{NotFoundError, StepConflictError};
use crate::io::store::Store;

#[derive(Debug)]
struct BoardRecord {
    board: Board,
    states: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: u64,
    boards: BTreeMap<BoardId, BoardRecord>,
}

/// Non-persistent [`Store`]. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl Store for MemoryStore {
    fn insert_board(&self, board: &NewBoard, generation_zero: &str) -> Result<Board> {
        let mut inner = self.lock()?;
        inner.last_id += 1;
        let id = BoardId(inner.last_id);
        let stored = Board {
            id,
            initial_state: board.initial_state.clone(),
            rows: board.rows,
            cols: board.cols,
        };
        inner.boards.insert(
            id,
            BoardRecord {
                board: stored.clone(),
                states: vec![generation_zero.to_string()],
            },
        );
        debug!(board = %id, "board inserted");
        Ok(stored)
    }

    fn load_board(&self, id: BoardId) -> Result<Option<Board>> {
        let inner = self.lock()?;
        Ok(inner.boards.get(&id).map(|record| record.board.clone()))
    }

    fn delete_board(&self, id: BoardId) -> Result<bool> {
        let mut inner = self.lock()?;
        let removed = inner.boards.remove(&id).is_some();
        debug!(board = %id, removed, "board deleted");
        Ok(removed)
    }

    fn persist_generation(&self, generation: &Generation) -> Result<()> {
        let mut inner = self.lock()?;
        let record = inner
            .boards
            .get_mut(&generation.board)
            .ok_or(NotFoundError::Board(generation.board))?;
        let expected = record.states.len() as u64;
        if generation.step != expected {
            return Err(StepConflictError {
                board: generation.board,
                expected,
                offered: generation.step,
            }
            .into());
        }
        record.states.push(generation.state.clone());
        Ok(())
    }

    fn load_generation(&self, id: BoardId, step: u64) -> Result<Option<Generation>> {
        let inner = self.lock()?;
        let state = inner
            .boards
            .get(&id)
            .and_then(|record| record.states.get(usize::try_from(step).ok()?));
        Ok(state.map(|state| Generation {
            board: id,
            step,
            state: state.clone(),
        }))
    }

    fn count_generations(&self, id: BoardId) -> Result<u64> {
        let inner = self.lock()?;
        Ok(inner
            .boards
            .get(&id)
            .map_or(0, |record| record.states.len() as u64))
    }

    fn board_ids(&self) -> Result<Vec<BoardId>> {
        let inner = self.lock()?;
        Ok(inner.boards.keys().copied().collect())
    }
}
