//! Run state definitions for one scrape of the gallery
//!
//! A run moves `Start → FetchingPage → ExtractingEntries → BuildingEntry* → Done`,
//! or stops in one of the aborted states. There is no retry state.

use std::fmt;

/// Represents the current state of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    // ===== Active States =====
    /// Run created, nothing fetched yet
    Start,

    /// Fetching the gallery page
    FetchingPage,

    /// Locating the gallery container and its entries
    ExtractingEntries,

    /// Building and persisting one entry
    BuildingEntry,

    // ===== Terminal Success State =====
    /// Every entry was built and persisted
    Done,

    // ===== Terminal Error States =====
    /// The gallery page could not be fetched
    AbortedFetchFailure,

    /// The gallery container was not found
    AbortedExtractionFailure,

    /// Writing the CSV table or the snapshot failed
    AbortedPersistenceFailure,
}

impl RunState {
    /// Returns true if the run has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done
                | Self::AbortedFetchFailure
                | Self::AbortedExtractionFailure
                | Self::AbortedPersistenceFailure
        )
    }

    /// Returns true if the run stopped on a fatal error
    pub fn is_aborted(&self) -> bool {
        self.is_terminal() && *self != Self::Done
    }

    /// Returns true if moving from `self` to `next` is a legal step
    ///
    /// `BuildingEntry` loops onto itself once per entry.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Start, FetchingPage)
                | (Start, AbortedPersistenceFailure)
                | (FetchingPage, ExtractingEntries)
                | (FetchingPage, AbortedFetchFailure)
                | (ExtractingEntries, BuildingEntry)
                | (ExtractingEntries, Done)
                | (ExtractingEntries, AbortedExtractionFailure)
                | (ExtractingEntries, AbortedPersistenceFailure)
                | (BuildingEntry, BuildingEntry)
                | (BuildingEntry, Done)
                | (BuildingEntry, AbortedPersistenceFailure)
        )
    }

    /// Converts the run state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchingPage => "fetching_page",
            Self::ExtractingEntries => "extracting_entries",
            Self::BuildingEntry => "building_entry",
            Self::Done => "done",
            Self::AbortedFetchFailure => "aborted_fetch_failure",
            Self::AbortedExtractionFailure => "aborted_extraction_failure",
            Self::AbortedPersistenceFailure => "aborted_persistence_failure",
        }
    }

    /// Parses a run state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Self::Start),
            "fetching_page" => Some(Self::FetchingPage),
            "extracting_entries" => Some(Self::ExtractingEntries),
            "building_entry" => Some(Self::BuildingEntry),
            "done" => Some(Self::Done),
            "aborted_fetch_failure" => Some(Self::AbortedFetchFailure),
            "aborted_extraction_failure" => Some(Self::AbortedExtractionFailure),
            "aborted_persistence_failure" => Some(Self::AbortedPersistenceFailure),
            _ => None,
        }
    }

    /// Returns all possible run states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Start,
            Self::FetchingPage,
            Self::ExtractingEntries,
            Self::BuildingEntry,
            Self::Done,
            Self::AbortedFetchFailure,
            Self::AbortedExtractionFailure,
            Self::AbortedPersistenceFailure,
        ]
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
