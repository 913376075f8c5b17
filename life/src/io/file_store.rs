//! Directory-backed store.
//!
//! Layout under the data directory:
//!
//! ```text
//! last_id                          highest id ever assigned
//! boards/<id>/board.json           board record
//! boards/<id>/generations/<n>.grid grid text of step n
//! ```
//!
//! A new board is assembled in a hidden staging directory and renamed into
//! place, so a board is never visible without its generation 0. Generation
//! files are hard-linked to their final name, which fails if the step already
//! exists; an existing step is never overwritten.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::types::{Board, BoardId, Generation, NewBoard};
use crate::error::{NotFoundError, StepConflictError};
use crate::io::store::Store;

const BOARD_FILE: &str = "board.json";
const GENERATIONS_DIR: &str = "generations";
const GRID_EXT: &str = "grid";

/// Persistent [`Store`] rooted at a data directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Serializes id allocation and board staging within this process.
    alloc: Mutex<()>,
}

impl FileStore {
    /// Open (or create) a store at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let boards = root.join("boards");
        fs::create_dir_all(&boards)
            .with_context(|| format!("create directory {}", boards.display()))?;
        debug!(root = %root.display(), "file store opened");
        Ok(Self {
            root,
            alloc: Mutex::new(()),
        })
    }

    fn boards_dir(&self) -> PathBuf {
        self.root.join("boards")
    }

    fn board_dir(&self, id: BoardId) -> PathBuf {
        self.boards_dir().join(id.to_string())
    }

    fn generations_dir(&self, id: BoardId) -> PathBuf {
        self.board_dir(id).join(GENERATIONS_DIR)
    }

    fn generation_path(&self, id: BoardId, step: u64) -> PathBuf {
        self.generations_dir(id)
            .join(format!("{}.{}", step, GRID_EXT))
    }

    fn last_id_path(&self) -> PathBuf {
        self.root.join("last_id")
    }

    fn lock_alloc(&self) -> Result<MutexGuard<'_, ()>> {
        self.alloc
            .lock()
            .map_err(|_| anyhow!("file store lock poisoned"))
    }

    fn next_id(&self) -> Result<BoardId> {
        let path = self.last_id_path();
        let recorded = match fs::read_to_string(&path) {
            Ok(contents) => contents
                .trim()
                .parse::<u64>()
                .with_context(|| format!("parse {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };
        let existing = self.board_ids()?.last().map_or(0, |id| id.0);
        let id = BoardId(recorded.max(existing) + 1);
        write_atomic(&path, &format!("{}\n", id.0))?;
        Ok(id)
    }
}

impl Store for FileStore {
    #[instrument(skip_all, fields(rows = board.rows, cols = board.cols))]
    fn insert_board(&self, board: &NewBoard, generation_zero: &str) -> Result<Board> {
        let _guard = self.lock_alloc()?;
        let id = self.next_id()?;
        let stored = Board {
            id,
            initial_state: board.initial_state.clone(),
            rows: board.rows,
            cols: board.cols,
        };

        let staging = self.boards_dir().join(format!(".staging-{}", id));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("clear staging {}", staging.display()))?;
        }
        let target = self.board_dir(id);
        let published = stage_board(&staging, &stored, generation_zero).and_then(|()| {
            fs::rename(&staging, &target)
                .with_context(|| format!("publish board {}", target.display()))
        });
        if let Err(err) = published {
            match fs::remove_dir_all(&staging) {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    warn!(staging = %staging.display(), error = %cleanup, "staging directory left behind");
                }
                _ => {}
            }
            return Err(err);
        }
        debug!(board = %id, "board inserted");
        Ok(stored)
    }

    fn load_board(&self, id: BoardId) -> Result<Option<Board>> {
        let path = self.board_dir(id).join(BOARD_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };
        let board: Board = serde_json::from_str(&contents)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(board))
    }

    #[instrument(skip(self))]
    fn delete_board(&self, id: BoardId) -> Result<bool> {
        let dir = self.board_dir(id);
        let doomed = self.boards_dir().join(format!(".deleting-{}", id));
        match fs::rename(&dir, &doomed) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err).with_context(|| format!("unpublish {}", dir.display())),
        }
        fs::remove_dir_all(&doomed)
            .with_context(|| format!("remove {}", doomed.display()))?;
        debug!(board = %id, "board deleted");
        Ok(true)
    }

    #[instrument(skip_all, fields(board = %generation.board, step = generation.step))]
    fn persist_generation(&self, generation: &Generation) -> Result<()> {
        let id = generation.board;
        if !self.board_dir(id).join(BOARD_FILE).exists() {
            return Err(NotFoundError::Board(id).into());
        }
        let expected = self.count_generations(id)?;
        if generation.step != expected {
            return Err(StepConflictError {
                board: id,
                expected,
                offered: generation.step,
            }
            .into());
        }

        let target = self.generation_path(id, generation.step);
        let tmp = self
            .generations_dir(id)
            .join(format!(".{}.{}.tmp", generation.step, GRID_EXT));
        fs::write(&tmp, &generation.state)
            .with_context(|| format!("write temp generation {}", tmp.display()))?;
        let linked = fs::hard_link(&tmp, &target);
        fs::remove_file(&tmp).with_context(|| format!("remove {}", tmp.display()))?;
        match linked {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(StepConflictError {
                board: id,
                expected: generation.step + 1,
                offered: generation.step,
            }
            .into()),
            Err(err) => Err(err).with_context(|| format!("publish {}", target.display())),
        }
    }

    fn load_generation(&self, id: BoardId, step: u64) -> Result<Option<Generation>> {
        let path = self.generation_path(id, step);
        match fs::read_to_string(&path) {
            Ok(state) => Ok(Some(Generation {
                board: id,
                step,
                state,
            })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
        }
    }

    fn count_generations(&self, id: BoardId) -> Result<u64> {
        let dir = self.generations_dir(id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err).with_context(|| format!("read {}", dir.display())),
        };
        let mut count = 0;
        for entry in entries {
            let entry = entry.with_context(|| format!("read {}", dir.display()))?;
            if parse_step(&entry.path()).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn board_ids(&self) -> Result<Vec<BoardId>> {
        let dir = self.boards_dir();
        let entries = fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("read {}", dir.display()))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|name| name.parse().ok()) {
                ids.push(BoardId(id));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Write the board record and generation 0 into a fresh staging directory.
fn stage_board(staging: &Path, board: &Board, generation_zero: &str) -> Result<()> {
    let generations = staging.join(GENERATIONS_DIR);
    fs::create_dir_all(&generations)
        .with_context(|| format!("create directory {}", generations.display()))?;

    let mut record = serde_json::to_string_pretty(board).context("serialize board")?;
    record.push('\n');
    fs::write(staging.join(BOARD_FILE), record)
        .with_context(|| format!("write board {}", board.id))?;
    fs::write(generations.join(format!("0.{}", GRID_EXT)), generation_zero)
        .with_context(|| format!("write generation 0 of board {}", board.id))?;
    Ok(())
}

/// Step index of a published generation file (`<n>.grid`).
fn parse_step(path: &Path) -> Option<u64> {
    if path.extension()? != GRID_EXT {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::new_board;

    fn open_temp() -> (tempfile::TempDir, FileStore) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(temp.path().join("data")).expect("open");
        (temp, store)
    }

    fn generation(board: BoardId, step: u64, state: &str) -> Generation {
        Generation {
            board,
            step,
            state: state.to_string(),
        }
    }

    #[test]
    fn insert_publishes_board_with_generation_zero() {
        let (_temp, store) = open_temp();
        let board = store
            .insert_board(&new_board("010\n111\n010"), "010\n111\n010")
            .expect("insert");

        assert_eq!(board.id, BoardId(1));
        assert_eq!(store.load_board(board.id).expect("load"), Some(board.clone()));
        assert_eq!(store.count_generations(board.id).expect("count"), 1);
        let zero = store.load_generation(board.id, 0).expect("load");
        assert_eq!(zero.map(|g| g.state), Some("010\n111\n010".to_string()));
        assert!(!store.boards_dir().join(".staging-1").exists());
    }

    #[test]
    fn failed_publish_removes_staging_directory() {
        let (_temp, store) = open_temp();
        fs::write(store.last_id_path(), "4\n").expect("write last_id");
        // A plain file where board 5 would be published makes the rename fail.
        fs::write(store.board_dir(BoardId(5)), "occupied").expect("write blocker");

        let err = store
            .insert_board(&new_board("0"), "0")
            .expect_err("publish blocked");
        assert!(format!("{:#}", err).contains("publish board"));
        assert!(!store.boards_dir().join(".staging-5").exists());
        assert!(store.board_ids().expect("ids").is_empty());
    }

    #[test]
    fn appends_are_contiguous() {
        let (_temp, store) = open_temp();
        let board = store.insert_board(&new_board("0"), "0").expect("insert");

        store
            .persist_generation(&generation(board.id, 1, "0"))
            .expect("append 1");
        let err = store
            .persist_generation(&generation(board.id, 1, "1"))
            .expect_err("duplicate");
        assert!(err.downcast_ref::<StepConflictError>().is_some());
        let err = store
            .persist_generation(&generation(board.id, 3, "1"))
            .expect_err("gap");
        assert!(err.downcast_ref::<StepConflictError>().is_some());

        assert_eq!(store.count_generations(board.id).expect("count"), 2);
        let one = store.load_generation(board.id, 1).expect("load");
        assert_eq!(one.map(|g| g.state), Some("0".to_string()));
    }

    #[test]
    fn existing_step_file_is_never_overwritten() {
        let (_temp, store) = open_temp();
        let board = store.insert_board(&new_board("0"), "0").expect("insert");
        // A step published behind this store's back still blocks the append.
        fs::write(store.generation_path(board.id, 1), "1").expect("write");
        fs::remove_file(store.generation_path(board.id, 0)).expect("remove");

        let err = store
            .persist_generation(&generation(board.id, 1, "0"))
            .expect_err("conflict");
        assert!(err.downcast_ref::<StepConflictError>().is_some());
        let one = store.load_generation(board.id, 1).expect("load");
        assert_eq!(one.map(|g| g.state), Some("1".to_string()));
    }

    #[test]
    fn delete_removes_board_directory() {
        let (_temp, store) = open_temp();
        let board = store.insert_board(&new_board("0"), "0").expect("insert");
        store
            .persist_generation(&generation(board.id, 1, "0"))
            .expect("append");

        assert!(store.delete_board(board.id).expect("delete"));
        assert!(!store.board_dir(board.id).exists());
        assert_eq!(store.count_generations(board.id).expect("count"), 0);
        assert!(!store.delete_board(board.id).expect("delete again"));
        assert!(store.board_ids().expect("ids").is_empty());
    }

    #[test]
    fn ids_survive_reopen_and_are_not_reused() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("data");
        let first = {
            let store = FileStore::open(&root).expect("open");
            let board = store.insert_board(&new_board("1"), "1").expect("insert");
            store.delete_board(board.id).expect("delete");
            board.id
        };

        let store = FileStore::open(&root).expect("reopen");
        let second = store.insert_board(&new_board("1"), "1").expect("insert");
        assert!(second.id > first);
        assert_eq!(store.board_ids().expect("ids"), vec![second.id]);
    }

    #[test]
    fn unknown_board_is_not_found_on_append() {
        let (_temp, store) = open_temp();
        let err = store
            .persist_generation(&generation(BoardId(4), 0, "0"))
            .expect_err("unknown");
        assert_eq!(
            err.downcast_ref::<NotFoundError>(),
            Some(&NotFoundError::Board(BoardId(4)))
        );
        assert!(store.load_board(BoardId(4)).expect("load").is_none());
    }

    #[test]
    fn parse_step_ignores_temp_files() {
        assert_eq!(parse_step(Path::new("gen/12.grid")), Some(12));
        assert_eq!(parse_step(Path::new("gen/.3.grid.tmp")), None);
        assert_eq!(parse_step(Path::new("gen/notes.txt")), None);
    }
}
