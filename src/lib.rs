//! Taskboard - stage/column task boards with drag-and-drop reordering
//!
//! This library provides the core functionality for Taskboard, including:
//! - Database operations and migrations
//! - Data models for projects, stages, tasks and attachments
//! - Repository layer for data access
//! - An async store contract with a SQLite implementation
//! - The board reordering engine (insertion points, drag state, diff-based persistence)
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use taskboard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod board;
pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod repo;
pub mod seed;
pub mod store;
pub mod utils;
