//! Daily Focus: a day planner that keeps one task list per local calendar day,
//! counts a streak of days whose required tasks were all completed, and stores
//! everything in a flat key-value space.
pub mod config;
pub mod dates;
pub mod events;
pub mod logging;
pub mod models;
pub mod planner;
pub mod state;
pub mod storage;
pub mod streak;
pub mod tasks;

#[cfg(feature = "cli")]
mod cli;

pub use crate::dates::{Clock, FixedClock, SystemClock};
pub use crate::planner::{CommandResult, Planner, PlannerCtx, PlannerError};
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

#[cfg(feature = "cli")]
pub fn run() -> std::process::ExitCode {
    cli::run()
}
