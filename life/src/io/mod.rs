//! I/O helpers: configuration and storage backends.

pub mod config;
pub mod file_store;
pub mod memory_store;
pub mod store;
