/// Stage definitions for tracking a single ingestion run
///
/// A successful attempt moves `Idle → Listing → Filtering → FetchingDetails → Committing →
/// Idle`; an attempt that finds nothing new goes straight from `Filtering` back to `Idle`.
/// Any active stage may fall into `Failed`, from which only a retry (`Listing`) leaves.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStage {
    /// No attempt in progress
    Idle,

    /// Walking listing pages
    Listing,

    /// Deriving identifiers and filtering against the seen set
    Filtering,

    /// Fetching detail pages for novel postings
    FetchingDetails,

    /// Writing postings and seen identifiers
    Committing,

    /// The current attempt hit an unhandled error
    Failed,
}

impl RunStage {
    /// Returns true while an attempt is doing work
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Listing | Self::Filtering | Self::FetchingDetails | Self::Committing
        )
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: RunStage) -> bool {
        use RunStage::*;

        match (self, next) {
            (Idle, Listing) | (Failed, Listing) => true,
            (Listing, Filtering) => true,
            (Filtering, FetchingDetails) | (Filtering, Idle) => true,
            (FetchingDetails, Committing) => true,
            (Committing, Idle) => true,
            (from, Failed) => from.is_active(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Filtering => "filtering",
            Self::FetchingDetails => "fetching_details",
            Self::Committing => "committing",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
