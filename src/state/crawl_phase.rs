/// Lifecycle phase definitions for a crawl
///
/// A crawl moves `Seeding -> Expanding -> Done`. Any non-terminal phase may
/// also move to `Failed`.
use crate::MutualsError;
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Resolving the seed and computing its neighbors
    Seeding,

    /// Expanding the frontier pass by pass
    Expanding,

    /// Target threshold reached
    Done,

    /// A fatal error aborted the crawl
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Expanding)
                | (Self::Expanding, Self::Done)
                | (Self::Seeding, Self::Failed)
                | (Self::Expanding, Self::Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), MutualsError> {
        if !self.can_transition_to(next) {
            return Err(MutualsError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Expanding => "expanding",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
