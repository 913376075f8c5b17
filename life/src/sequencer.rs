//! Generation sequencing: the append-only log of a board's generations.
//!
//! The log is addressed only by exact step. New generations are always the
//! transition of the last persisted one and are appended at `count`.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::grid::{Grid, decode, encode};
use crate::core::rules::step;
use crate::core::types::{Board, Generation, NewBoard};
use crate::error::NoGenerationsError;
use crate::io::store::Store;

/// A freshly appended generation together with the grids on either side of it.
#[derive(Debug, Clone)]
pub struct Advance {
    pub generation: Generation,
    /// Grid of the step that was advanced from.
    pub previous: Grid,
    /// Grid of `generation`.
    pub next: Grid,
}

/// Persist a new board with generation 0 equal to its decoded initial state.
///
/// The initial state is stored in canonical text form, so generation 0 and
/// the board record always hold the same text.
#[instrument(skip_all, fields(rows = board.rows, cols = board.cols))]
pub fn initialize<S: Store + ?Sized>(store: &S, board: &NewBoard) -> Result<Board> {
    let grid = decode(&board.initial_state)?;
    let canonical = encode(&grid);
    let stored = store.insert_board(
        &NewBoard {
            initial_state: canonical.clone(),
            rows: board.rows,
            cols: board.cols,
        },
        &canonical,
    )?;
    debug!(board = %stored.id, "generation 0 created");
    Ok(stored)
}

/// Append the successor of the last generation and return it.
pub fn advance<S: Store + ?Sized>(store: &S, board: &Board) -> Result<Generation> {
    step_forward(store, board).map(|advance| advance.generation)
}

/// Like [`advance`], also returning the decoded grids for comparison.
#[instrument(skip_all, fields(board = %board.id))]
pub fn step_forward<S: Store + ?Sized>(store: &S, board: &Board) -> Result<Advance> {
    let count = store.count_generations(board.id)?;
    let last_step = count
        .checked_sub(1)
        .ok_or(NoGenerationsError { board: board.id })?;
    let previous = load_grid(store, board, last_step)?;
    let next = step(&previous);
    let generation = Generation {
        board: board.id,
        step: count,
        state: encode(&next),
    };
    store.persist_generation(&generation)?;
    debug!(step = generation.step, live = next.live_count(), "generation appended");
    Ok(Advance {
        generation,
        previous,
        next,
    })
}

/// Generation at exactly `step`, if it has been materialized. Never computes.
pub fn generation_at<S: Store + ?Sized>(
    store: &S,
    board: &Board,
    step: u64,
) -> Result<Option<Generation>> {
    store.load_generation(board.id, step)
}

/// Every persisted generation of `board`, in step order.
pub fn history<S: Store + ?Sized>(store: &S, board: &Board) -> Result<Vec<Generation>> {
    let count = store.count_generations(board.id)?;
    let mut log = Vec::new();
    for index in 0..count {
        let generation = store.load_generation(board.id, index)?.ok_or_else(|| {
            anyhow!(
                "board {} step {} missing below count {}",
                board.id,
                index,
                count
            )
        })?;
        log.push(generation);
    }
    Ok(log)
}

/// Load and decode the grid persisted at `step`, which must exist.
pub(crate) fn load_grid<S: Store + ?Sized>(store: &S, board: &Board, step: u64) -> Result<Grid> {
    let generation = store
        .load_generation(board.id, step)?
        .ok_or_else(|| anyhow!("board {} step {} missing from store", board.id, step))?;
    decode(&generation.state)
        .with_context(|| format!("decode board {} step {}", board.id, step))
}
