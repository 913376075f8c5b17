//! Stability predicate for the convergence loop.
//!
//! A board is stable when its latest generation equals the one before it.
//! Only period-1 fixed points qualify; oscillators never do.

use crate::core::grid::Grid;

/// True when `latest` is identical, cell for cell, to its predecessor.
pub fn is_stable(previous: &Grid, latest: &Grid) -> bool {
    previous == latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::decode;
    use crate::core::rules::step;

    fn grid(text: &str) -> Grid {
        decode(text).expect("decode")
    }

    #[test]
    fn identical_grids_are_stable() {
        assert!(is_stable(&grid("000\n000"), &grid("000\n000")));
        assert!(!is_stable(&grid("000\n010"), &grid("000\n000")));
    }

    #[test]
    fn dimensions_are_part_of_equality() {
        assert!(!is_stable(&grid("00"), &grid("0\n0")));
    }

    #[test]
    fn blinker_is_never_stable() {
        let mut current = grid("000\n111\n000");
        for _ in 0..10 {
            let next = step(&current);
            assert!(!is_stable(&current, &next));
            current = next;
        }
    }
}
