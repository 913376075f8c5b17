//! Convergence loop: advance a board until it stops changing or the step
//! budget runs out.

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::grid::Grid;
use crate::core::stability::is_stable;
use crate::core::types::{Board, Generation};
use crate::io::store::Store;
use crate::sequencer::{load_grid, step_forward};

/// Terminal state of one convergence call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Convergence {
    /// The generation at `step` equals its predecessor.
    Stable {
        grid: Grid,
        step: u64,
        /// Generations appended by this call.
        advances: u64,
    },
    /// The budget was consumed without two consecutive equal generations.
    Exhausted { advances: u64, last_step: u64 },
}

impl Convergence {
    pub fn is_stable(&self) -> bool {
        matches!(self, Convergence::Stable { .. })
    }
}

/// Advance `board` at most `max_steps` times, stopping at the first fixed point.
///
/// A board that is already stable on entry returns without advancing. With
/// `max_steps == 0` only the existing generations are inspected.
pub fn run_to_convergence<S: Store + ?Sized>(
    store: &S,
    board: &Board,
    max_steps: u64,
) -> Result<Convergence> {
    run_to_convergence_with(store, board, max_steps, |_| {})
}

/// [`run_to_convergence`], calling `on_advance` after each appended generation.
#[instrument(skip(store, board, on_advance), fields(board = %board.id))]
pub fn run_to_convergence_with<S: Store + ?Sized, F: FnMut(&Generation)>(
    store: &S,
    board: &Board,
    max_steps: u64,
    mut on_advance: F,
) -> Result<Convergence> {
    let count = store.count_generations(board.id)?;
    if count >= 2 {
        let latest = load_grid(store, board, count - 1)?;
        let previous = load_grid(store, board, count - 2)?;
        if is_stable(&previous, &latest) {
            debug!(step = count - 1, "already stable");
            return Ok(Convergence::Stable {
                grid: latest,
                step: count - 1,
                advances: 0,
            });
        }
    }

    let mut advances = 0;
    let mut last_step = count.saturating_sub(1);
    while advances < max_steps {
        let advance = step_forward(store, board)?;
        advances += 1;
        last_step = advance.generation.step;
        on_advance(&advance.generation);
        if is_stable(&advance.previous, &advance.next) {
            info!(step = last_step, advances, "board stabilized");
            return Ok(Convergence::Stable {
                grid: advance.next,
                step: last_step,
                advances,
            });
        }
    }

    info!(advances, last_step, "step budget exhausted");
    Ok(Convergence::Exhausted {
        advances,
        last_step,
    })
}
