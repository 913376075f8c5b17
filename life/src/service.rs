//! Request-facing board operations.
//!
//! [`BoardService`] is what the CLI and the HTTP server call. Operations that
//! append to a board's log hold that board's mutex for their whole duration,
//! so concurrent callers can never interleave appends on one board. Different
//! boards never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{info, instrument};

use crate::converge::{Convergence, run_to_convergence_with};
use crate::core::grid::encode;
use crate::core::invariants::{validate_generation_log, validate_new_board};
use crate::core::types::{Board, BoardId, Generation, NewBoard};
use crate::error::{NotFoundError, ValidationError};
use crate::io::config::ConvergenceConfig;
use crate::io::store::Store;
use crate::sequencer::{advance, generation_at, history, initialize};

/// Outcome of [`BoardService::final_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalState {
    /// The board reached a fixed point at `step`.
    Stable { state: String, step: u64 },
    /// The budget ran out first. Not a fault.
    Unstable { max_steps: u64, advances: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub rows: usize,
    pub cols: usize,
    pub generations: u64,
}

pub struct BoardService<S: Store> {
    store: S,
    convergence: ConvergenceConfig,
    locks: Mutex<HashMap<BoardId, Arc<Mutex<()>>>>,
}

impl<S: Store> BoardService<S> {
    pub fn new(store: S, convergence: ConvergenceConfig) -> Self {
        Self {
            store,
            convergence,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate input and create a board with its generation 0.
    #[instrument(skip(self, initial_state))]
    pub fn create(&self, initial_state: &str, rows: usize, cols: usize) -> Result<BoardId> {
        let new_board = NewBoard {
            initial_state: initial_state.to_string(),
            rows,
            cols,
        };
        let errors = validate_new_board(&new_board);
        if !errors.is_empty() {
            return Err(ValidationError::new(errors).into());
        }
        let board = initialize(&self.store, &new_board)?;
        info!(board = %board.id, "board created");
        Ok(board.id)
    }

    /// Grid text of generation 0.
    pub fn initial_state(&self, id: BoardId) -> Result<String> {
        self.state_at_step(id, 0)
    }

    /// Append the next generation and return its grid text.
    #[instrument(skip(self))]
    pub fn advance_and_get(&self, id: BoardId) -> Result<String> {
        self.board(id)?;
        let lock = self.board_lock(id)?;
        let _guard = acquire(&lock)?;
        let board = self.board(id)?;
        let generation = advance(&self.store, &board)?;
        Ok(generation.state)
    }

    /// Grid text at exactly `step`. Unmaterialized steps are not found.
    pub fn state_at_step(&self, id: BoardId, step: u64) -> Result<String> {
        let board = self.board(id)?;
        generation_at(&self.store, &board, step)?
            .map(|generation| generation.state)
            .ok_or_else(|| NotFoundError::Step { board: id, step }.into())
    }

    /// Run to convergence with `max_steps` (or the configured default).
    pub fn final_state(&self, id: BoardId, max_steps: Option<u64>) -> Result<FinalState> {
        self.final_state_with(id, max_steps, |_| {})
    }

    /// [`Self::final_state`], reporting each appended generation.
    #[instrument(skip(self, on_advance))]
    pub fn final_state_with<F: FnMut(&Generation)>(
        &self,
        id: BoardId,
        max_steps: Option<u64>,
        on_advance: F,
    ) -> Result<FinalState> {
        let max_steps = self.resolve_max_steps(max_steps)?;
        self.board(id)?;
        let lock = self.board_lock(id)?;
        let _guard = acquire(&lock)?;
        let board = self.board(id)?;
        let outcome = run_to_convergence_with(&self.store, &board, max_steps, on_advance)?;
        Ok(match outcome {
            Convergence::Stable { grid, step, .. } => FinalState::Stable {
                state: encode(&grid),
                step,
            },
            Convergence::Exhausted { advances, .. } => FinalState::Unstable {
                max_steps,
                advances,
            },
        })
    }

    /// Delete a board and all its generations.
    #[instrument(skip(self))]
    pub fn delete(&self, id: BoardId) -> Result<bool> {
        if self.store.load_board(id)?.is_none() {
            return Ok(false);
        }
        let lock = self.board_lock(id)?;
        let removed = {
            let _guard = acquire(&lock)?;
            self.store.delete_board(id)?
        };
        self.locks()?.remove(&id);
        if removed {
            info!(board = %id, "board deleted");
        }
        Ok(removed)
    }

    pub fn summary(&self, id: BoardId) -> Result<BoardSummary> {
        let board = self.board(id)?;
        Ok(BoardSummary {
            id: board.id,
            rows: board.rows,
            cols: board.cols,
            generations: self.store.count_generations(id)?,
        })
    }

    pub fn board_ids(&self) -> Result<Vec<BoardId>> {
        self.store.board_ids()
    }

    /// Re-check the persisted log of a board. Empty means consistent.
    pub fn verify(&self, id: BoardId) -> Result<Vec<String>> {
        let board = self.board(id)?;
        let log = history(&self.store, &board)
            .with_context(|| format!("load history of board {}", id))?;
        Ok(validate_generation_log(&board, &log))
    }

    fn board(&self, id: BoardId) -> Result<Board> {
        self.store
            .load_board(id)?
            .ok_or_else(|| NotFoundError::Board(id).into())
    }

    fn resolve_max_steps(&self, requested: Option<u64>) -> Result<u64> {
        let max_steps = requested.unwrap_or(self.convergence.default_max_steps);
        if max_steps > self.convergence.max_steps_limit {
            return Err(ValidationError::single(format!(
                "max_steps {} exceeds the limit of {}",
                max_steps, self.convergence.max_steps_limit
            ))
            .into());
        }
        Ok(max_steps)
    }

    fn locks(&self) -> Result<MutexGuard<'_, HashMap<BoardId, Arc<Mutex<()>>>>> {
        self.locks
            .lock()
            .map_err(|_| anyhow!("board lock table poisoned"))
    }

    /// Lock entry for `id`. Callers check the board exists first, so the
    /// table only holds ids of boards that were stored.
    fn board_lock(&self, id: BoardId) -> Result<Arc<Mutex<()>>> {
        Ok(self.locks()?.entry(id).or_default().clone())
    }
}

fn acquire(lock: &Mutex<()>) -> Result<MutexGuard<'_, ()>> {
    lock.lock().map_err(|_| anyhow!("board lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory_store::MemoryStore;
    use crate::test_support::{ALL_DEAD, BLINKER, PLUS, memory_service};

    #[test]
    fn create_validates_dimensions_and_format() {
        let service = memory_service();
        let err = service.create(PLUS, 3, 4).expect_err("mismatch");
        let validation = err.downcast_ref::<ValidationError>().expect("validation");
        assert_eq!(validation.messages.len(), 1);
        assert!(validation.messages[0].contains("cols is 4"));

        let err = service.create("0a0", 1, 3).expect_err("malformed");
        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert!(service.board_ids().expect("ids").is_empty());
    }

    #[test]
    fn initial_state_is_generation_zero() {
        let service = memory_service();
        let id = service.create(PLUS, 3, 3).expect("create");
        assert_eq!(service.initial_state(id).expect("initial"), PLUS);
        service.advance_and_get(id).expect("advance");
        assert_eq!(service.initial_state(id).expect("initial"), PLUS);
    }

    #[test]
    fn advance_and_lookup() {
        let service = memory_service();
        let id = service.create(PLUS, 3, 3).expect("create");
        assert_eq!(service.advance_and_get(id).expect("advance"), "111\n101\n111");
        assert_eq!(service.state_at_step(id, 1).expect("step 1"), "111\n101\n111");

        let err = service.state_at_step(id, 2).expect_err("not materialized");
        assert_eq!(
            err.downcast_ref::<NotFoundError>(),
            Some(&NotFoundError::Step { board: id, step: 2 })
        );
    }

    #[test]
    fn unknown_board_is_not_found_everywhere() {
        let service = memory_service();
        let id = BoardId(404);
        let expected = Some(&NotFoundError::Board(id));
        assert_eq!(
            service.initial_state(id).expect_err("initial").downcast_ref::<NotFoundError>(),
            expected
        );
        assert_eq!(
            service.advance_and_get(id).expect_err("advance").downcast_ref::<NotFoundError>(),
            expected
        );
        assert_eq!(
            service.state_at_step(id, 0).expect_err("step").downcast_ref::<NotFoundError>(),
            expected
        );
        assert_eq!(
            service.final_state(id, Some(1)).expect_err("final").downcast_ref::<NotFoundError>(),
            expected
        );
        assert_eq!(service.summary(id).expect_err("summary").downcast_ref::<NotFoundError>(), expected);
        assert!(!service.delete(id).expect("delete"));
    }

    #[test]
    fn final_state_distinguishes_stable_and_unstable() {
        let service = memory_service();
        let dead = service.create(ALL_DEAD, 3, 3).expect("create");
        assert_eq!(
            service.final_state(dead, Some(10)).expect("final"),
            FinalState::Stable {
                state: ALL_DEAD.to_string(),
                step: 1
            }
        );

        let blinker = service.create(BLINKER, 3, 3).expect("create");
        assert_eq!(
            service.final_state(blinker, Some(9)).expect("final"),
            FinalState::Unstable {
                max_steps: 9,
                advances: 9
            }
        );
    }

    #[test]
    fn final_state_uses_configured_default_and_limit() {
        let service = BoardService::new(
            MemoryStore::new(),
            ConvergenceConfig {
                default_max_steps: 3,
                max_steps_limit: 5,
            },
        );
        let id = service.create(BLINKER, 3, 3).expect("create");
        assert_eq!(
            service.final_state(id, None).expect("final"),
            FinalState::Unstable {
                max_steps: 3,
                advances: 3
            }
        );
        let err = service.final_state(id, Some(6)).expect_err("over limit");
        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert_eq!(service.summary(id).expect("summary").generations, 4);
    }

    #[test]
    fn delete_removes_board_and_lock() {
        let service = memory_service();
        let id = service.create(PLUS, 3, 3).expect("create");
        service.advance_and_get(id).expect("advance");
        assert!(service.delete(id).expect("delete"));
        assert!(service.locks().expect("locks").is_empty());
        assert!(service.initial_state(id).is_err());
        assert_eq!(service.store().count_generations(id).expect("count"), 0);
    }

    #[test]
    fn unknown_ids_leave_no_lock_entries() {
        let service = memory_service();
        for raw in 1..=200 {
            let id = BoardId(raw);
            assert!(service.advance_and_get(id).is_err());
            assert!(service.final_state(id, Some(1)).is_err());
            assert!(!service.delete(id).expect("delete"));
        }
        assert!(service.locks().expect("locks").is_empty());

        let id = service.create(PLUS, 3, 3).expect("create");
        service.advance_and_get(id).expect("advance");
        assert_eq!(service.locks().expect("locks").len(), 1);
    }

    #[test]
    fn verify_reports_consistent_log() {
        let service = memory_service();
        let id = service.create(BLINKER, 3, 3).expect("create");
        service.final_state(id, Some(4)).expect("final");
        assert!(service.verify(id).expect("verify").is_empty());
    }

    #[test]
    fn concurrent_advances_keep_steps_contiguous() {
        let service = Arc::new(memory_service());
        let id = service.create(BLINKER, 3, 3).expect("create");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        service.advance_and_get(id).expect("advance");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }

        assert_eq!(service.summary(id).expect("summary").generations, 81);
        assert!(service.verify(id).expect("verify").is_empty());
    }
}
