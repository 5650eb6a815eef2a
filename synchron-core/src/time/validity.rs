//! Trustworthiness of the current time

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Validity of a time sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeValidity {
    /// Time is set and synchronized to a trusted source
    Fresh,
    /// Time was set, but the most recent resynchronization failed
    Stale,
    /// No valid time has ever been established
    Unset,
}

impl TimeValidity {
    /// Whether the calendar fields may be announced
    pub fn is_confident(&self) -> bool {
        matches!(self, TimeValidity::Fresh | TimeValidity::Stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence() {
        assert!(TimeValidity::Fresh.is_confident());
        assert!(TimeValidity::Stale.is_confident());
        assert!(!TimeValidity::Unset.is_confident());
    }
}
