//! Semantic checks on board input and on persisted generation logs.

use crate::core::grid::{Grid, decode};
use crate::core::rules::step;
use crate::core::types::{Board, Generation, NewBoard};

/// Check caller input for a new board:
/// - `initial_state` is well-formed grid text
/// - the grid is not empty
/// - `rows`/`cols` match the decoded dimensions
pub fn validate_new_board(board: &NewBoard) -> Vec<String> {
    let mut errors = Vec::new();
    let grid = match decode(&board.initial_state) {
        Ok(grid) => grid,
        Err(err) => {
            errors.push(format!("initial_state is malformed: {}", err));
            return errors;
        }
    };

    if grid.is_empty() {
        errors.push("initial_state must contain at least one cell".to_string());
        return errors;
    }
    if board.rows != grid.rows() {
        errors.push(format!(
            "rows is {} but initial_state has {} rows",
            board.rows,
            grid.rows()
        ));
    }
    if board.cols != grid.cols() {
        errors.push(format!(
            "cols is {} but initial_state has {} columns",
            board.cols,
            grid.cols()
        ));
    }
    errors
}

/// Check a board's full generation log:
/// - every generation belongs to the board
/// - steps are exactly `0..N` in order
/// - step 0 equals the initial state
/// - each step is the transition of its predecessor
pub fn validate_generation_log(board: &Board, log: &[Generation]) -> Vec<String> {
    let mut errors = Vec::new();
    if log.is_empty() {
        errors.push(format!("board {}: generation 0 is missing", board.id));
        return errors;
    }

    let mut previous: Option<Grid> = None;
    for (index, generation) in log.iter().enumerate() {
        let label = format!("board {} step {}", board.id, generation.step);
        if generation.board != board.id {
            errors.push(format!("{}: owned by board {}", label, generation.board));
        }
        if generation.step != index as u64 {
            errors.push(format!("{}: expected step {}", label, index));
        }

        let grid = match decode(&generation.state) {
            Ok(grid) => grid,
            Err(err) => {
                errors.push(format!("{}: malformed state: {}", label, err));
                previous = None;
                continue;
            }
        };

        if index == 0 {
            match decode(&board.initial_state) {
                Ok(initial) if initial == grid => {}
                Ok(_) => errors.push(format!("{}: differs from initial_state", label)),
                Err(err) => errors.push(format!("{}: malformed initial_state: {}", label, err)),
            }
        }
        if previous.as_ref().is_some_and(|prev| step(prev) != grid) {
            errors.push(format!("{}: not the successor of step {}", label, index - 1));
        }
        previous = Some(grid);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BoardId;

    fn new_board(state: &str, rows: usize, cols: usize) -> NewBoard {
        NewBoard {
            initial_state: state.to_string(),
            rows,
            cols,
        }
    }

    fn board(state: &str) -> Board {
        let grid = decode(state).expect("decode");
        Board {
            id: BoardId(1),
            initial_state: state.to_string(),
            rows: grid.rows(),
            cols: grid.cols(),
        }
    }

    fn generation(step: u64, state: &str) -> Generation {
        Generation {
            board: BoardId(1),
            step,
            state: state.to_string(),
        }
    }

    #[test]
    fn accepts_matching_dimensions() {
        assert!(validate_new_board(&new_board("010\n111", 2, 3)).is_empty());
    }

    #[test]
    fn reports_dimension_mismatches() {
        let errors = validate_new_board(&new_board("010\n111", 3, 2));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|err| err.contains("rows is 3")));
        assert!(errors.iter().any(|err| err.contains("cols is 2")));
    }

    #[test]
    fn reports_malformed_and_empty_states() {
        let errors = validate_new_board(&new_board("01\n1", 2, 2));
        assert!(errors[0].contains("malformed"));
        let errors = validate_new_board(&new_board("", 0, 0));
        assert!(errors[0].contains("at least one cell"));
    }

    #[test]
    fn valid_log_has_no_errors() {
        let log = vec![
            generation(0, "010\n111\n010"),
            generation(1, "111\n101\n111"),
            generation(2, "101\n000\n101"),
        ];
        assert!(validate_generation_log(&board("010\n111\n010"), &log).is_empty());
    }

    #[test]
    fn detects_gaps_and_wrong_successors() {
        let log = vec![
            generation(0, "010\n111\n010"),
            generation(2, "111\n101\n111"),
            generation(3, "111\n111\n111"),
        ];
        let errors = validate_generation_log(&board("010\n111\n010"), &log);
        assert!(errors.iter().any(|err| err.contains("expected step 1")));
        assert!(errors.iter().any(|err| err.contains("not the successor")));
    }

    #[test]
    fn detects_initial_state_drift_and_missing_log() {
        let errors = validate_generation_log(&board("000"), &[generation(0, "010")]);
        assert!(errors.iter().any(|err| err.contains("differs from initial_state")));
        let errors = validate_generation_log(&board("000"), &[]);
        assert!(errors[0].contains("generation 0 is missing"));
    }
}
