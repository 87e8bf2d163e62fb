/// Update run state definitions
use std::fmt;

/// Represents which stage an update run is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateState {
    /// No run in progress
    #[default]
    Idle,

    /// Waiting for the bookmark manifest
    FetchingManifest,

    /// Downloading bookmarked languages one by one
    FetchingLanguages,

    /// Merging downloaded languages into the store
    Reconciling,
}

impl UpdateState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true while a network request may be outstanding
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::FetchingManifest | Self::FetchingLanguages)
    }

    /// Whether moving from `self` to `next` is a legal step
    ///
    /// Any non-idle state may return to `Idle` (completion or abort).
    pub fn can_transition_to(&self, next: UpdateState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::FetchingManifest)
                | (Self::FetchingManifest, Self::FetchingLanguages)
                | (Self::FetchingLanguages, Self::Reconciling)
                | (Self::FetchingManifest, Self::Idle)
                | (Self::FetchingLanguages, Self::Idle)
                | (Self::Reconciling, Self::Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingManifest => "fetching_manifest",
            Self::FetchingLanguages => "fetching_languages",
            Self::Reconciling => "reconciling",
        }
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
