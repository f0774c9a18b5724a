//! The modal stack: ordered overlays, only the top one receives input.

use super::compose::ModalLayer;
use super::frame::{CloseCx, ModalCx, ModalFrame, ModalFrameBuilder, ModalOutcome, ModalUi, ModalView};
use crate::input::KeyToken;
use crate::terminal::Size;
use std::fmt;

/// Active overlays, bottom first.
///
/// Titles are unique: pushing a frame whose title is already present
/// replaces the old frame instead of stacking a duplicate.
pub struct ModalStack<C> {
    frames: Vec<ModalFrame<C>>,
    consume_next_key: bool,
    closed: u64,
}

impl<C> Default for ModalStack<C> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            consume_next_key: false,
            closed: 0,
        }
    }
}

impl<C: 'static> ModalStack<C> {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame on top, dropping any frame with the same title first.
    ///
    /// The other frames keep their relative order. A replaced frame is
    /// discarded without its close callback.
    pub fn push(&mut self, frame: impl Into<ModalFrame<C>>) {
        let frame = frame.into();
        let before = self.frames.len();
        self.frames.retain(|f| f.ui.title != frame.ui.title);
        if self.frames.len() != before {
            tracing::debug!(title = %frame.ui.title, "modal replaced");
        } else {
            tracing::debug!(title = %frame.ui.title, depth = before + 1, "modal pushed");
        }
        self.frames.push(frame);
    }

    /// Push with `Enter` to commit and `Esc` to cancel.
    pub fn push_default<V>(&mut self, builder: ModalFrameBuilder<C, V>)
    where
        V: ModalView<C> + 'static,
    {
        self.push(
            builder
                .commit_keys(["Enter"])
                .cancel_keys([KeyToken::ESC])
                .build(),
        );
    }

    /// Route a key to the top frame. No-op on an empty stack.
    ///
    /// The frame's handler runs first and its new state is stored. Then,
    /// in order: a close requested by the handler, a cancel key, a commit
    /// key. A key that opened a nested modal is not evaluated against
    /// the commit and cancel sets.
    pub fn handle_key(&mut self, key: &KeyToken, size: Size, host: &mut C) {
        let Some(top) = self.frames.last_mut() else {
            return;
        };

        let mut cx = ModalCx::new(size);
        top.slot.handle_key(key, &mut cx);
        let cancel = top.is_cancel(key);
        let commit = top.is_commit(key);
        let (close, consume, pushed) = cx.into_parts();

        if consume {
            self.consume_next_key = true;
        }
        if let Some(outcome) = close {
            self.close_top(outcome, host);
        } else if pushed.is_empty() {
            if cancel {
                self.close_top(ModalOutcome::Cancel, host);
            } else if commit {
                self.close_top(ModalOutcome::Commit, host);
            }
        }
        for frame in pushed {
            self.push(frame);
        }
    }

    /// Pop the top frame and run its close callback.
    ///
    /// Returns `false` on an empty stack. Callers closing from inside the
    /// frame's own key handling should set the consume flag first.
    pub fn close_top(&mut self, outcome: ModalOutcome, host: &mut C) -> bool {
        let Some(frame) = self.frames.pop() else {
            return false;
        };
        tracing::debug!(title = %frame.ui.title, ?outcome, "modal closed");
        self.closed += 1;
        let mut cx = CloseCx { host, stack: self };
        frame.slot.close(outcome, &mut cx);
        true
    }
}

impl<C> ModalStack<C> {
    /// Metadata of the top frame.
    pub fn top_ui(&self) -> Option<&ModalUi> {
        self.frames.last().map(ModalFrame::ui)
    }

    /// Title of the top frame.
    pub fn top_title(&self) -> Option<&str> {
        self.frames.last().map(ModalFrame::title)
    }

    /// Titles bottom first.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(ModalFrame::title)
    }

    /// Whether a frame with this title is open.
    pub fn contains(&self, title: &str) -> bool {
        self.frames.iter().any(|f| f.ui.title == title)
    }

    /// Number of open frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Frames closed so far. Close callbacks may edit the host, so a change
    /// here means anything drawn from the host is out of date.
    pub const fn closed(&self) -> u64 {
        self.closed
    }

    /// Whether no frame is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Arm the one-shot flag that swallows the current key.
    pub fn set_consume_next_key(&mut self) {
        self.consume_next_key = true;
    }

    /// Read and clear the one-shot consume flag.
    pub fn take_consume_flag(&mut self) -> bool {
        std::mem::take(&mut self.consume_next_key)
    }

    /// Render snapshots of every frame, bottom first.
    pub fn layers(&self) -> Vec<ModalLayer<'_>> {
        self.frames
            .iter()
            .map(|frame| {
                let slot = frame.slot.as_ref();
                ModalLayer::new(&frame.ui, move |size| slot.render(size))
            })
            .collect()
    }
}

impl<C> fmt::Debug for ModalStack<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalStack")
            .field("frames", &self.frames)
            .field("consume_next_key", &self.consume_next_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::TextModal;
    use proptest::prelude::*;

    #[derive(Debug, Default)]
    struct Host {
        closed: Vec<(u32, ModalOutcome)>,
    }

    /// `+` increments, `x` closes itself, `n` opens a nested modal.
    struct Counter;

    impl ModalView<Host> for Counter {
        type State = u32;

        fn view(&self, state: &u32, _size: Size) -> String {
            format!("count {state}")
        }

        fn handle_key(&self, state: u32, key: &KeyToken, cx: &mut ModalCx<Host>) -> u32 {
            match &*key.name() {
                "+" => state + 1,
                "x" => {
                    cx.close(ModalOutcome::Commit);
                    state
                }
                "n" => {
                    cx.push(
                        ModalFrame::builder(ModalUi::new("Inner"), TextModal, String::new())
                            .cancel_keys([KeyToken::ESC])
                            .build(),
                    );
                    state
                }
                _ => state,
            }
        }
    }

    fn counter(title: &str) -> ModalFrameBuilder<Host, Counter> {
        ModalFrame::<Host>::builder(ModalUi::new(title), Counter, 0)
            .on_close(|state, outcome, cx| cx.host.closed.push((state, outcome)))
    }

    fn text(title: &str) -> ModalFrame<Host> {
        ModalFrame::<Host>::builder(ModalUi::new(title), TextModal, title.to_string()).build()
    }

    #[test]
    fn test_confirm_scenario() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push_default(
            ModalFrame::<Host>::builder(ModalUi::new("Confirm"), TextModal, "Sure?".to_string())
                .on_close(|_, outcome, cx| cx.host.closed.push((0, outcome))),
        );

        stack.handle_key(&KeyToken::char("x"), Size::DEFAULT, &mut host);
        assert_eq!(stack.len(), 1);
        assert!(host.closed.is_empty());

        stack.handle_key(&KeyToken::esc(), Size::DEFAULT, &mut host);
        assert!(stack.is_empty());
        assert_eq!(host.closed, vec![(0, ModalOutcome::Cancel)]);
    }

    #[test]
    fn test_state_updates_before_commit() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push(counter("Count").commit_keys(["+"]));

        stack.handle_key(&KeyToken::char("+"), Size::DEFAULT, &mut host);
        assert!(stack.is_empty());
        assert_eq!(host.closed, vec![(1, ModalOutcome::Commit)]);
    }

    #[test]
    fn test_close_top_fires_once_with_current_state() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push_default(counter("Count"));
        stack.handle_key(&KeyToken::char("+"), Size::DEFAULT, &mut host);
        stack.handle_key(&KeyToken::char("+"), Size::DEFAULT, &mut host);

        assert!(stack.close_top(ModalOutcome::Commit, &mut host));
        assert!(!stack.close_top(ModalOutcome::Cancel, &mut host));
        assert_eq!(host.closed, vec![(2, ModalOutcome::Commit)]);
    }

    #[test]
    fn test_handler_close_sets_consume_flag() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push(counter("Count"));

        stack.handle_key(&KeyToken::char("x"), Size::DEFAULT, &mut host);
        assert!(stack.is_empty());
        assert!(stack.take_consume_flag());
        assert!(!stack.take_consume_flag());
    }

    #[test]
    fn test_only_top_receives_keys() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push_default(counter("Bottom"));
        stack.push(text("Top"));

        stack.handle_key(&KeyToken::char("+"), Size::DEFAULT, &mut host);
        stack.close_top(ModalOutcome::Cancel, &mut host);
        stack.close_top(ModalOutcome::Cancel, &mut host);
        assert_eq!(host.closed, vec![(0, ModalOutcome::Cancel)]);
    }

    #[test]
    fn test_nested_push_skips_commit() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push(counter("Outer").commit_keys(["n"]));

        stack.handle_key(&KeyToken::char("n"), Size::DEFAULT, &mut host);
        assert_eq!(stack.titles().collect::<Vec<_>>(), ["Outer", "Inner"]);
        assert!(host.closed.is_empty());

        stack.handle_key(&KeyToken::esc(), Size::DEFAULT, &mut host);
        assert_eq!(stack.top_title(), Some("Outer"));
        assert!(host.closed.is_empty());
    }

    #[test]
    fn test_on_close_can_push_follow_up() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push_default(
            ModalFrame::<Host>::builder(ModalUi::new("First"), TextModal, String::new())
                .on_close(|_, _, cx| cx.stack.push(text("Second"))),
        );

        stack.handle_key(&KeyToken::Enter, Size::DEFAULT, &mut host);
        assert_eq!(stack.top_title(), Some("Second"));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_push_same_title_replaces_in_order() {
        let mut stack: ModalStack<Host> = ModalStack::new();
        for title in ["A", "B", "C"] {
            stack.push(text(title));
        }
        stack.push(text("B"));
        assert_eq!(stack.titles().collect::<Vec<_>>(), ["A", "C", "B"]);
        assert!(stack.contains("C"));
    }

    #[test]
    fn test_empty_stack_is_inert() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.handle_key(&KeyToken::Enter, Size::DEFAULT, &mut host);
        assert!(stack.top_ui().is_none());
        assert!(!stack.take_consume_flag());
    }

    #[test]
    fn test_layers_render_bottom_first() {
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push(text("one"));
        stack.push(text("two"));
        let bodies: Vec<_> = stack
            .layers()
            .iter()
            .map(|layer| layer.render(Size::new(3, 10)))
            .collect();
        assert_eq!(bodies, ["one", "two"]);
    }

    #[test]
    fn test_closed_counts_pops_not_replacements() {
        let mut host = Host::default();
        let mut stack: ModalStack<Host> = ModalStack::new();
        stack.push(text("a"));
        stack.push(text("a"));
        assert_eq!(stack.closed(), 0);

        stack.push_default(counter("Count"));
        stack.handle_key(&KeyToken::char("+"), Size::DEFAULT, &mut host);
        assert_eq!(stack.closed(), 0);
        stack.handle_key(&KeyToken::Enter, Size::DEFAULT, &mut host);
        assert_eq!(stack.closed(), 1);

        assert!(stack.close_top(ModalOutcome::Cancel, &mut host));
        assert!(!stack.close_top(ModalOutcome::Cancel, &mut host));
        assert_eq!(stack.closed(), 2);
    }

    proptest! {
        #[test]
        fn prop_titles_stay_unique(titles in proptest::collection::vec("[a-d]", 0..20)) {
            let mut stack: ModalStack<Host> = ModalStack::new();
            for title in &titles {
                let before = stack.len();
                let present = stack.contains(title);
                stack.push(text(title));
                prop_assert_eq!(stack.len(), if present { before } else { before + 1 });
                prop_assert_eq!(stack.top_title(), Some(title.as_str()));
            }

            // Order is the order of each title's last push.
            let mut expected: Vec<&str> = Vec::new();
            for title in &titles {
                expected.retain(|t| *t != title.as_str());
                expected.push(title.as_str());
            }
            prop_assert_eq!(stack.titles().collect::<Vec<_>>(), expected);
        }
    }
}
