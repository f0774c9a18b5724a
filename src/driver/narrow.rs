//! The "terminal too narrow" warning modal.
//!
//! Shown once per session the first time the terminal is narrower than
//! the configured threshold. Any key dismisses it, and a background timer
//! dismisses it on its own after a few seconds.

use crate::input::KeyToken;
use crate::modal::{ModalCx, ModalFrame, ModalOutcome, ModalStack, ModalUi, ModalView, WidthSpec};
use crate::terminal::Size;
use std::sync::atomic::{AtomicBool, Ordering};

/// Title of the narrow-terminal modal.
pub const NARROW_TITLE: &str = "Terminal too narrow";

/// Closes on any key, swallowing it.
#[derive(Debug, Clone, Copy)]
pub struct NarrowWarning;

/// Width the warning was raised at, and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrowState {
    /// Columns when the warning was raised.
    pub cols: u16,
    /// Recommended minimum.
    pub threshold: u16,
}

impl<C> ModalView<C> for NarrowWarning {
    type State = NarrowState;

    fn view(&self, state: &NarrowState, _size: Size) -> String {
        format!(
            "This terminal is {} columns wide.\nLayouts assume at least {}.\n\nPress any key to continue.",
            state.cols, state.threshold
        )
    }

    fn handle_key(&self, state: NarrowState, _key: &KeyToken, cx: &mut ModalCx<C>) -> NarrowState {
        cx.close(ModalOutcome::Cancel);
        state
    }
}

/// The warning frame for a terminal `cols` wide.
pub fn narrow_frame<C: 'static>(cols: u16, threshold: u16) -> ModalFrame<C> {
    let ui = ModalUi::new(NARROW_TITLE).width(WidthSpec::Ratio(0.9));
    ModalFrame::builder(ui, NarrowWarning, NarrowState { cols, threshold }).build()
}

/// Close the warning if its timer has fired and it is still on top.
///
/// Clears `expired` either way. Returns whether a frame was closed.
pub fn dismiss_expired<C: 'static>(modals: &mut ModalStack<C>, expired: &AtomicBool, host: &mut C) -> bool {
    if !expired.swap(false, Ordering::SeqCst) {
        return false;
    }
    if modals.top_title() == Some(NARROW_TITLE) {
        tracing::debug!("narrow-terminal warning timed out");
        modals.close_top(ModalOutcome::Cancel, host)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_key_closes_and_consumes() {
        let mut modals: ModalStack<()> = ModalStack::new();
        modals.push(narrow_frame::<()>(60, 80));
        modals.handle_key(&KeyToken::char("j"), Size::new(24, 60), &mut ());
        assert!(modals.is_empty());
        assert!(modals.take_consume_flag());
    }

    #[test]
    fn test_dismiss_expired_only_when_on_top() {
        let expired = AtomicBool::new(true);
        let mut modals: ModalStack<()> = ModalStack::new();
        modals.push(narrow_frame::<()>(60, 80));
        modals.push(
            ModalFrame::<()>::builder(ModalUi::new("Other"), crate::modal::TextModal, String::new())
                .build(),
        );

        assert!(!dismiss_expired(&mut modals, &expired, &mut ()));
        assert_eq!(modals.len(), 2);
        assert!(!expired.load(Ordering::SeqCst));

        modals.close_top(ModalOutcome::Cancel, &mut ());
        expired.store(true, Ordering::SeqCst);
        assert!(dismiss_expired(&mut modals, &expired, &mut ()));
        assert!(modals.is_empty());
    }

    #[test]
    fn test_not_expired_is_noop() {
        let expired = AtomicBool::new(false);
        let mut modals: ModalStack<()> = ModalStack::new();
        modals.push(narrow_frame::<()>(60, 80));
        assert!(!dismiss_expired(&mut modals, &expired, &mut ()));
        assert_eq!(modals.top_title(), Some(NARROW_TITLE));
    }
}
