//! The runner seeds a user's wallet from CSV fixture files and writes the
//! resulting statement to a writer.
//!
//! Payment methods are read up front because transactions refer to them.
//! Transactions are streamed from the file into the seeder.
//!
mod async_runner;

pub use async_runner::{run as run_async, RunSummary};
