//! Localreads application library
//!
//! HTTP modules (books, collections, scan, isbn) and their SQLite
//! repositories. The server binary and the CLI both build on this crate.

pub mod modules;

pub use modules::{build_registry, migrate, register_all};
