//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `RunState`: Tracks one run through fetch, extraction, entry building and its terminal outcome

mod run_state;

pub use run_state::RunState;
