//! Navigation intent carried alongside a page's own state.
//!
//! Handlers never navigate by side effect. They return a
//! [`Navigation`] whose `pending` slot says where to go next, and the
//! driver reads and clears that slot after every dispatch.

/// A requested transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pending {
    /// Stay on the current page.
    #[default]
    None,
    /// Switch to the named page.
    Goto(String),
    /// Return to the previous page.
    Back,
    /// Leave the application.
    Quit,
}

impl Pending {
    /// Whether a transition has been requested.
    pub const fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A page's state paired with an optional pending transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Navigation<S> {
    inner: S,
    pending: Pending,
}

impl<S> Navigation<S> {
    /// Wrap fresh page state with nothing pending.
    pub const fn make(inner: S) -> Self {
        Self {
            inner,
            pending: Pending::None,
        }
    }

    /// Request a switch to the named page.
    #[must_use]
    pub fn goto(mut self, name: impl Into<String>) -> Self {
        self.pending = Pending::Goto(name.into());
        self
    }

    /// Request a return to the previous page.
    #[must_use]
    pub fn back(mut self) -> Self {
        self.pending = Pending::Back;
        self
    }

    /// Request application exit.
    #[must_use]
    pub fn quit(mut self) -> Self {
        self.pending = Pending::Quit;
        self
    }

    /// Transform the page state. The pending transition is untouched.
    #[must_use]
    pub fn update<F>(self, f: F) -> Self
    where
        F: FnOnce(S) -> S,
    {
        Self {
            inner: f(self.inner),
            pending: self.pending,
        }
    }

    /// The current pending transition.
    pub const fn pending(&self) -> &Pending {
        &self.pending
    }

    /// The page state.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the page state.
    pub const fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap the page state, dropping any pending transition.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Read and clear the pending transition.
    pub fn take_pending(&mut self) -> Pending {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_has_nothing_pending() {
        let nav = Navigation::make(3);
        assert_eq!(nav.pending(), &Pending::None);
        assert_eq!(*nav.inner(), 3);
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            Navigation::make(()).goto("logs").pending(),
            &Pending::Goto("logs".to_string())
        );
        assert_eq!(Navigation::make(()).back().pending(), &Pending::Back);
        assert_eq!(Navigation::make(()).quit().pending(), &Pending::Quit);
    }

    #[test]
    fn test_update_keeps_pending() {
        let nav = Navigation::make(1).back().update(|n| n + 1);
        assert_eq!(*nav.inner(), 2);
        assert_eq!(nav.pending(), &Pending::Back);
    }

    #[test]
    fn test_take_pending_clears() {
        let mut nav = Navigation::make(()).quit();
        assert_eq!(nav.take_pending(), Pending::Quit);
        assert!(!nav.pending().is_some());
    }
}
