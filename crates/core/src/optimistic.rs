use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptimisticError {
    #[error("an optimistic change is already pending")]
    AlreadyPending,
}

/// A value with at most one unconfirmed local change on top.
///
/// `apply` shows the change immediately through `current`, then exactly one of
/// `confirm` (backend accepted) or `rollback` (backend refused) settles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimistic<T> {
    committed: T,
    pending: Option<T>,
}

impl<T: Clone> Optimistic<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            committed: value,
            pending: None,
        }
    }

    /// The value the user should see: pending if any, otherwise committed.
    #[must_use]
    pub fn current(&self) -> &T {
        self.pending.as_ref().unwrap_or(&self.committed)
    }

    #[must_use]
    pub fn committed(&self) -> &T {
        &self.committed
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Stage a local change.
    ///
    /// # Errors
    ///
    /// Returns `OptimisticError::AlreadyPending` if the previous change was not settled.
    pub fn apply(&mut self, change: impl FnOnce(&mut T)) -> Result<&T, OptimisticError> {
        if self.pending.is_some() {
            return Err(OptimisticError::AlreadyPending);
        }
        let mut next = self.committed.clone();
        change(&mut next);
        Ok(self.pending.insert(next))
    }

    /// Make the pending change permanent. Returns false if nothing was pending.
    pub fn confirm(&mut self) -> bool {
        match self.pending.take() {
            Some(next) => {
                self.committed = next;
                true
            }
            None => false,
        }
    }

    /// Drop the pending change. Returns false if nothing was pending.
    pub fn rollback(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Replace the committed value outright, discarding anything pending.
    pub fn reset(&mut self, value: T) {
        self.committed = value;
        self.pending = None;
    }
}
