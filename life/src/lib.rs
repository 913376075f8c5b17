//! Conway's Game of Life with a persisted, append-only generation log.
//!
//! Every board owns an ordered log of generations. Generation 0 is the
//! initial state; each later generation is the B3/S23 transition of the one
//! before it. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (grid codec, transition rule,
//!   stability, validation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (storage backends, configuration).
//!   Behind the [`io::store::Store`] trait so tests can swap backends.
//!
//! Orchestration modules ([`sequencer`], [`converge`], [`service`]) coordinate
//! core logic with storage to implement the board operations.

pub mod converge;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod sequencer;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
