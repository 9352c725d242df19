//! Interaction seam for confirmation dialogs.

/// Asks the user yes/no questions and shows warnings.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Returns `true` if the user agreed.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Show a warning that does not block the action.
    fn warn(&mut self, message: &str);
}
