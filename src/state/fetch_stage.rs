//! Fetch stage definitions for one seed

use std::fmt;

/// Represents where a seed is in the two-stage fetch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStage {
    // ===== Active States =====
    /// The render stage is being asked for the seed
    AttemptRender,

    /// The render stage failed or returned nothing; plain HTTP is being tried
    AttemptFallback,

    // ===== Terminal States =====
    /// At least one page record is available for normalization
    Normalize,

    /// Both stages failed; the seed contributes nothing
    SkipSeed,
}

impl FetchStage {
    /// Returns true if no further fetch attempt follows this stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Normalize | Self::SkipSeed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// Legal transitions:
    /// - `AttemptRender -> Normalize | AttemptFallback`
    /// - `AttemptFallback -> Normalize | SkipSeed`
    ///
    /// There is no way back into `AttemptRender`, so each seed gets exactly
    /// one render attempt and at most one fallback attempt.
    pub fn can_transition_to(&self, next: FetchStage) -> bool {
        matches!(
            (self, next),
            (Self::AttemptRender, Self::Normalize)
                | (Self::AttemptRender, Self::AttemptFallback)
                | (Self::AttemptFallback, Self::Normalize)
                | (Self::AttemptFallback, Self::SkipSeed)
        )
    }

    /// Stage following a render attempt that produced `page_count` pages
    pub fn after_render(page_count: usize) -> Self {
        if page_count > 0 {
            Self::Normalize
        } else {
            Self::AttemptFallback
        }
    }

    /// Stage following a fallback attempt
    pub fn after_fallback(succeeded: bool) -> Self {
        if succeeded {
            Self::Normalize
        } else {
            Self::SkipSeed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptRender => "attempt_render",
            Self::AttemptFallback => "attempt_fallback",
            Self::Normalize => "normalize",
            Self::SkipSeed => "skip_seed",
        }
    }

    /// Returns all stages
    pub fn all_stages() -> Vec<Self> {
        vec![
            Self::AttemptRender,
            Self::AttemptFallback,
            Self::Normalize,
            Self::SkipSeed,
        ]
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
