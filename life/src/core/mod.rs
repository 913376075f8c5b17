//! Deterministic, pure logic for the simulation engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! grids and return deterministic outputs suitable for tests.

pub mod grid;
pub mod invariants;
pub mod patterns;
pub mod rules;
pub mod stability;
pub mod types;
