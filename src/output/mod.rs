//! Output module for reporting harvest results
//!
//! This module handles:
//! - The run summary returned by a harvest
//! - Printing that summary at the end of a run

pub mod stats;

pub use stats::{print_summary, RunSummary};
