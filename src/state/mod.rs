//! State module for tracking per-seed fetch progress
//!
//! `FetchStage` is the state machine each seed walks through: one render
//! attempt, at most one fallback attempt, then either normalization or skip.

mod fetch_stage;

pub use fetch_stage::FetchStage;
