//! # Taskdesk - personal task board for the terminal
//!
//! Users pick an identity, then create, edit, list, and delete their own
//! tasks. All tasks of all users are kept as one collection in a local
//! key-value store; every change is a versioned read-modify-write, so a
//! concurrent change from another process is replayed instead of lost.
//!
//! ## Features
//!
//! - **Task Management**: create, edit, change status, delete
//! - **Per-User Views**: every user only sees and touches their own tasks
//! - **Lost-Update Detection**: optimistic concurrency on the stored collection
//! - **Interactive Mode**: menu-driven session when no subcommand is given
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskdesk::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
