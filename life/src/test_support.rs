//! Test-only fixtures for grids, boards and services.

use crate::core::grid::decode;
use crate::core::types::NewBoard;
use crate::io::config::ConvergenceConfig;
use crate::io::file_store::FileStore;
use crate::io::memory_store::MemoryStore;
use crate::service::BoardService;

/// Plus shape; becomes a ring, then four corners, then dies out.
pub const PLUS: &str = "010\n111\n010";
/// Period-2 oscillator on a 3x3 board.
pub const BLINKER: &str = "000\n111\n000";
pub const ALL_DEAD: &str = "000\n000\n000";
pub const ALL_ALIVE: &str = "111\n111\n111";

/// Board input whose `rows`/`cols` match `state`.
pub fn new_board(state: &str) -> NewBoard {
    let grid = decode(state).expect("fixture state must decode");
    NewBoard {
        initial_state: state.to_string(),
        rows: grid.rows(),
        cols: grid.cols(),
    }
}

/// Service over a fresh in-memory store with default budgets.
pub fn memory_service() -> BoardService<MemoryStore> {
    BoardService::new(MemoryStore::new(), ConvergenceConfig::default())
}

/// Service over a file store in a fresh temp directory.
///
/// Keep the returned `TempDir` alive for as long as the service is used.
pub fn file_service() -> (tempfile::TempDir, BoardService<FileStore>) {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = FileStore::open(temp.path().join("data")).expect("open file store");
    (temp, BoardService::new(store, ConvergenceConfig::default()))
}
