//! Stable exit codes for `life` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input, configuration or storage failure.
pub const INVALID: i32 = 1;
/// Unknown board, or a step that was never materialized.
pub const NOT_FOUND: i32 = 2;
/// `life final` exhausted its step budget without reaching a stable state.
pub const UNSTABLE: i32 = 3;
