//! Create/edit modal state machine
//!
//! ```text
//! Closed -> Open(Create | Edit) -> Submitting -> Closed
//!                 ^                    |
//!                 +---- error shown ---+
//! ```

use nightdesk_core::{Error, Result};

/// What an open modal is editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalMode<R> {
    /// A new record
    Create,
    /// A copy of an existing record
    Edit(R),
}

/// State of a page's create/edit modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<R> {
    /// Nothing shown
    Closed,
    /// Form shown, possibly with the error of the last submission
    Open {
        /// Create or edit
        mode: ModalMode<R>,
        /// Message from the last failed submission
        error: Option<String>,
    },
    /// Waiting for the server
    Submitting {
        /// Create or edit
        mode: ModalMode<R>,
    },
}

impl<R> Default for ModalState<R> {
    fn default() -> Self {
        Self::Closed
    }
}

impl<R: Clone> ModalState<R> {
    /// Short name of the state, used in transition errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open { .. } => "open",
            Self::Submitting { .. } => "submitting",
        }
    }

    /// Whether the form is shown
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Whether a submission is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }

    /// Mode of an open or submitting modal
    #[must_use]
    pub const fn mode(&self) -> Option<&ModalMode<R>> {
        match self {
            Self::Closed => None,
            Self::Open { mode, .. } | Self::Submitting { mode } => Some(mode),
        }
    }

    /// Error shown in the form, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Open { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    fn reject(&self, action: &str) -> Error {
        Error::InvalidTransition {
            from: self.name().to_string(),
            action: action.to_string(),
        }
    }

    /// Show an empty form
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the modal is closed.
    pub fn open_create(&mut self) -> Result<()> {
        self.open(ModalMode::Create, "open the create form")
    }

    /// Show a form pre-filled with `item`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the modal is closed.
    pub fn open_edit(&mut self, item: R) -> Result<()> {
        self.open(ModalMode::Edit(item), "open the edit form")
    }

    fn open(&mut self, mode: ModalMode<R>, action: &str) -> Result<()> {
        if !matches!(self, Self::Closed) {
            return Err(self.reject(action));
        }
        *self = Self::Open { mode, error: None };
        Ok(())
    }

    /// Dismiss the form without submitting
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the form is open.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(self.reject("cancel"));
        }
        *self = Self::Closed;
        Ok(())
    }

    /// Lock the form while the server handles it
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the form is open.
    pub fn begin_submit(&mut self) -> Result<ModalMode<R>> {
        match std::mem::take(self) {
            Self::Open { mode, .. } => {
                *self = Self::Submitting { mode: mode.clone() };
                Ok(mode)
            }
            other => {
                *self = other;
                Err(self.reject("submit"))
            }
        }
    }

    /// Settle a submission: close on success, reopen with the error otherwise
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless a submission is in flight.
    pub fn finish(&mut self, outcome: std::result::Result<(), String>) -> Result<()> {
        match std::mem::take(self) {
            Self::Submitting { mode } => {
                *self = match outcome {
                    Ok(()) => Self::Closed,
                    Err(message) => Self::Open {
                        mode,
                        error: Some(message),
                    },
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(self.reject("finish a submission"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_round_trip() {
        let mut modal: ModalState<u32> = ModalState::default();
        modal.open_create().unwrap();
        assert_eq!(modal.begin_submit().unwrap(), ModalMode::Create);
        assert!(modal.is_submitting());
        modal.finish(Ok(())).unwrap();
        assert_eq!(modal, ModalState::Closed);
    }

    #[test]
    fn test_failed_submission_reopens_with_error() {
        let mut modal = ModalState::Closed;
        modal.open_edit(7u32).unwrap();
        modal.begin_submit().unwrap();
        modal.finish(Err("Venue is double booked".to_string())).unwrap();

        assert!(modal.is_open());
        assert_eq!(modal.error(), Some("Venue is double booked"));
        assert_eq!(modal.mode(), Some(&ModalMode::Edit(7)));

        // The error clears once the user tries again
        modal.begin_submit().unwrap();
        assert_eq!(modal.error(), None);
    }

    #[test]
    fn test_cancel_only_from_open() {
        let mut modal: ModalState<u32> = ModalState::Closed;
        let err = modal.cancel().unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel while closed");

        modal.open_create().unwrap();
        modal.begin_submit().unwrap();
        assert!(modal.cancel().is_err());
        assert!(modal.is_submitting());
    }

    #[test]
    fn test_cannot_open_twice() {
        let mut modal: ModalState<u32> = ModalState::Closed;
        modal.open_create().unwrap();
        let err = modal.open_edit(1).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { ref from, .. } if from == "open"));
        assert_eq!(modal.mode(), Some(&ModalMode::Create));
    }

    #[test]
    fn test_finish_without_submission_is_rejected() {
        let mut modal: ModalState<u32> = ModalState::Closed;
        assert!(modal.finish(Ok(())).is_err());
        assert!(modal.begin_submit().is_err());
        assert_eq!(modal, ModalState::Closed);
    }
}
