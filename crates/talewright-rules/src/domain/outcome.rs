//! Five-tier check outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Margin over the DC that turns a success into a critical success.
pub const CRITICAL_MARGIN: i32 = 10;

/// Margin under the DC still counted as a partial success.
pub const PARTIAL_MARGIN: i32 = 5;

/// Outcome tier of a resolved check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Natural 20 or total exceeds DC by 10+.
    CriticalSuccess,
    /// Total meets or exceeds DC.
    Success,
    /// Total within 5 of DC.
    PartialSuccess,
    /// Total below DC - 5.
    Failure,
    /// Natural 1.
    CriticalFailure,
}

impl CheckOutcome {
    /// Returns `true` for success tiers, including partial success.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::CriticalSuccess | Self::Success | Self::PartialSuccess
        )
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CriticalSuccess => "critical success",
            Self::Success => "success",
            Self::PartialSuccess => "partial success",
            Self::Failure => "failure",
            Self::CriticalFailure => "critical failure",
        };
        f.write_str(name)
    }
}

/// Determines the five-tier outcome of a d20 check.
#[must_use]
pub fn determine_outcome(natural_roll: u32, total: i32, difficulty_class: i32) -> CheckOutcome {
    if natural_roll == 20 || total >= difficulty_class + CRITICAL_MARGIN {
        CheckOutcome::CriticalSuccess
    } else if natural_roll == 1 {
        CheckOutcome::CriticalFailure
    } else if total >= difficulty_class {
        CheckOutcome::Success
    } else if total >= difficulty_class - PARTIAL_MARGIN {
        CheckOutcome::PartialSuccess
    } else {
        CheckOutcome::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_twenty_is_critical_success() {
        assert_eq!(determine_outcome(20, 5, 30), CheckOutcome::CriticalSuccess);
    }

    #[test]
    fn test_large_margin_is_critical_success() {
        assert_eq!(determine_outcome(15, 25, 15), CheckOutcome::CriticalSuccess);
    }

    #[test]
    fn test_natural_one_is_critical_failure_even_when_total_beats_dc() {
        assert_eq!(determine_outcome(1, 16, 15), CheckOutcome::CriticalFailure);
    }

    #[test]
    fn test_meeting_dc_is_success() {
        assert_eq!(determine_outcome(12, 15, 15), CheckOutcome::Success);
    }

    #[test]
    fn test_near_miss_is_partial_success() {
        assert_eq!(determine_outcome(10, 10, 15), CheckOutcome::PartialSuccess);
        assert!(CheckOutcome::PartialSuccess.is_success());
    }

    #[test]
    fn test_wide_miss_is_failure() {
        assert_eq!(determine_outcome(4, 9, 15), CheckOutcome::Failure);
        assert!(!CheckOutcome::Failure.is_success());
    }
}
