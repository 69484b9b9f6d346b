//! Document lifecycle states and the allowed transitions.

use std::fmt;

use crate::error::{DocketError, Result};
use crate::models::Location;

/// Lifecycle state of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Incoming,
    /// Transient, the document sits in the staging directory.
    Processing,
    Processed,
    Unprocessed,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Unprocessed => "unprocessed",
        }
    }

    pub fn can_transition_to(self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Incoming, Processing)
                | (Processed, Processing)
                | (Processing, Processed)
                | (Processing, Unprocessed)
                | (Unprocessed, Incoming)
        )
    }

    /// Fail with [`DocketError::InvalidTransition`] unless `self -> next` is allowed.
    pub fn check_transition(self, filename: &str, next: DocumentState) -> Result<()> {
        if self.can_transition_to(next) {
            return Ok(());
        }
        Err(DocketError::InvalidTransition {
            filename: filename.to_string(),
            from: self.to_string(),
            to: next.to_string(),
        })
    }
}

impl From<Location> for DocumentState {
    fn from(location: Location) -> Self {
        match location {
            Location::Incoming => Self::Incoming,
            Location::Processed => Self::Processed,
            Location::Unprocessed => Self::Unprocessed,
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use DocumentState::*;
        assert!(Incoming.can_transition_to(Processing));
        assert!(Processed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Unprocessed));
        assert!(Unprocessed.can_transition_to(Incoming));

        assert!(!Unprocessed.can_transition_to(Processing));
        assert!(!Incoming.can_transition_to(Processed));
        assert!(!Processed.can_transition_to(Incoming));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = DocumentState::Unprocessed
            .check_transition("a.pdf", DocumentState::Processing)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
        assert_eq!(err.to_string(), "cannot move a.pdf from unprocessed to processing");
    }
}
