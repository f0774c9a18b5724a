//! Modal frames: one active overlay with its own state.
//!
//! A frame pairs a [`ModalView`] with the state it renders, the keys that
//! close it and a one-shot close callback. The stack stores frames of
//! different state types side by side, so each frame is erased behind
//! [`Slot`] the moment it is built.

use super::stack::ModalStack;
use super::width::WidthSpec;
use crate::input::KeyToken;
use crate::terminal::Size;
use std::fmt;

/// How a frame left the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    /// Closed by a commit key or programmatic commit.
    Commit,
    /// Closed by a cancel key or programmatic dismissal.
    Cancel,
}

/// Presentation metadata of a frame. Immutable once pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalUi {
    /// Box title. Also the frame's identity on the stack.
    pub title: String,
    /// Column offset of the box. Centered when `None`.
    pub left: Option<u16>,
    /// Box width. [`WidthSpec::DEFAULT`] when `None`.
    pub width: Option<WidthSpec>,
    /// Dim everything beneath the box.
    pub dim_background: bool,
}

impl ModalUi {
    /// Centered, default width, no dimming.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            left: None,
            width: None,
            dim_background: false,
        }
    }

    /// Set the width.
    #[must_use]
    pub const fn width(mut self, width: WidthSpec) -> Self {
        self.width = Some(width);
        self
    }

    /// Pin the box to a column instead of centering it.
    #[must_use]
    pub const fn left(mut self, left: u16) -> Self {
        self.left = Some(left);
        self
    }

    /// Dim the page beneath the box.
    #[must_use]
    pub const fn dimmed(mut self) -> Self {
        self.dim_background = true;
        self
    }

    /// Width in columns for a terminal `cols` wide.
    pub fn resolve_width(&self, cols: u16) -> u16 {
        self.width.unwrap_or_default().resolve(cols)
    }
}

/// The page-like contract a modal implements.
///
/// `C` is the host the modal was opened over (usually the page's
/// `Navigation`). Handlers only see it again in the close callback.
pub trait ModalView<C> {
    /// The modal's own state.
    type State: 'static;

    /// Render the box body for the given interior size.
    fn view(&self, state: &Self::State, size: Size) -> String;

    /// Apply a key and return the new state.
    fn handle_key(&self, state: Self::State, key: &KeyToken, cx: &mut ModalCx<C>) -> Self::State;
}

/// Requests a modal key handler can make of its stack.
pub struct ModalCx<C> {
    size: Size,
    close: Option<ModalOutcome>,
    consume: bool,
    pushed: Vec<ModalFrame<C>>,
}

impl<C> ModalCx<C> {
    pub(crate) const fn new(size: Size) -> Self {
        Self {
            size,
            close: None,
            consume: false,
            pushed: Vec::new(),
        }
    }

    /// Current terminal size.
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Close this frame once the handler returns.
    ///
    /// The triggering key is consumed so it does not also reach whatever
    /// becomes topmost.
    pub fn close(&mut self, outcome: ModalOutcome) {
        self.consume = true;
        self.close = Some(outcome);
    }

    /// Swallow the current key without closing.
    pub fn consume_key(&mut self) {
        self.consume = true;
    }

    /// Open a nested modal above this one.
    pub fn push(&mut self, frame: ModalFrame<C>) {
        self.pushed.push(frame);
    }

    pub(crate) fn into_parts(self) -> (Option<ModalOutcome>, bool, Vec<ModalFrame<C>>) {
        (self.close, self.consume, self.pushed)
    }
}

impl<C> fmt::Debug for ModalCx<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalCx")
            .field("size", &self.size)
            .field("close", &self.close)
            .field("consume", &self.consume)
            .field("pushed", &self.pushed.len())
            .finish()
    }
}

/// What a close callback may touch: the host and the stack itself.
pub struct CloseCx<'a, C> {
    /// The host the modal was opened over.
    pub host: &'a mut C,
    /// The stack the frame was just popped from.
    pub stack: &'a mut ModalStack<C>,
}

type OnClose<C, T> = Box<dyn FnOnce(T, ModalOutcome, &mut CloseCx<'_, C>)>;

/// Object-safe face of a typed frame.
pub(crate) trait Slot<C> {
    fn render(&self, size: Size) -> String;
    fn handle_key(&mut self, key: &KeyToken, cx: &mut ModalCx<C>);
    fn close(self: Box<Self>, outcome: ModalOutcome, cx: &mut CloseCx<'_, C>);
}

struct TypedSlot<C, V: ModalView<C>> {
    view: V,
    state: Option<V::State>,
    on_close: Option<OnClose<C, V::State>>,
}

impl<C, V: ModalView<C>> Slot<C> for TypedSlot<C, V> {
    fn render(&self, size: Size) -> String {
        self.state
            .as_ref()
            .map(|state| self.view.view(state, size))
            .unwrap_or_default()
    }

    fn handle_key(&mut self, key: &KeyToken, cx: &mut ModalCx<C>) {
        if let Some(state) = self.state.take() {
            self.state = Some(self.view.handle_key(state, key, cx));
        }
    }

    fn close(mut self: Box<Self>, outcome: ModalOutcome, cx: &mut CloseCx<'_, C>) {
        if let (Some(state), Some(on_close)) = (self.state.take(), self.on_close.take()) {
            on_close(state, outcome, cx);
        }
    }
}

/// One overlay ready to be pushed.
pub struct ModalFrame<C> {
    pub(crate) ui: ModalUi,
    pub(crate) commit_keys: Vec<String>,
    pub(crate) cancel_keys: Vec<String>,
    pub(crate) slot: Box<dyn Slot<C>>,
}

impl<C: 'static> ModalFrame<C> {
    /// Start building a frame from a view and its initial state.
    ///
    /// The frame closes only programmatically until commit or cancel keys
    /// are added.
    pub fn builder<V>(ui: ModalUi, view: V, state: V::State) -> ModalFrameBuilder<C, V>
    where
        V: ModalView<C> + 'static,
    {
        ModalFrameBuilder {
            ui,
            view,
            state,
            commit_keys: Vec::new(),
            cancel_keys: Vec::new(),
            on_close: None,
        }
    }
}

impl<C> ModalFrame<C> {
    /// Presentation metadata.
    pub const fn ui(&self) -> &ModalUi {
        &self.ui
    }

    /// Box title.
    pub fn title(&self) -> &str {
        &self.ui.title
    }

    pub(crate) fn is_commit(&self, key: &KeyToken) -> bool {
        self.commit_keys.iter().any(|k| key.is(k))
    }

    pub(crate) fn is_cancel(&self, key: &KeyToken) -> bool {
        self.cancel_keys
            .iter()
            .any(|k| key.is(k) || (key.is_escape() && (k == KeyToken::ESC || k == "Escape")))
    }
}

impl<C> fmt::Debug for ModalFrame<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalFrame")
            .field("ui", &self.ui)
            .field("commit_keys", &self.commit_keys)
            .field("cancel_keys", &self.cancel_keys)
            .finish_non_exhaustive()
    }
}

/// Typed builder for [`ModalFrame`].
pub struct ModalFrameBuilder<C, V: ModalView<C>> {
    ui: ModalUi,
    view: V,
    state: V::State,
    commit_keys: Vec<String>,
    cancel_keys: Vec<String>,
    on_close: Option<OnClose<C, V::State>>,
}

impl<C: 'static, V: ModalView<C> + 'static> ModalFrameBuilder<C, V> {
    /// Keys that pop the frame with [`ModalOutcome::Commit`].
    #[must_use]
    pub fn commit_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.commit_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keys that pop the frame with [`ModalOutcome::Cancel`].
    #[must_use]
    pub fn cancel_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.cancel_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Called exactly once, with the state at the moment of popping.
    #[must_use]
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnOnce(V::State, ModalOutcome, &mut CloseCx<'_, C>) + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Erase the state type.
    pub fn build(self) -> ModalFrame<C> {
        ModalFrame {
            ui: self.ui,
            commit_keys: self.commit_keys,
            cancel_keys: self.cancel_keys,
            slot: Box::new(TypedSlot {
                view: self.view,
                state: Some(self.state),
                on_close: self.on_close,
            }),
        }
    }
}

impl<C: 'static, V: ModalView<C> + 'static> From<ModalFrameBuilder<C, V>> for ModalFrame<C> {
    fn from(builder: ModalFrameBuilder<C, V>) -> Self {
        builder.build()
    }
}

/// A read-only text box. Ignores every key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextModal;

impl<C> ModalView<C> for TextModal {
    type State = String;

    fn view(&self, state: &String, _size: Size) -> String {
        state.clone()
    }

    fn handle_key(&self, state: String, _key: &KeyToken, _cx: &mut ModalCx<C>) -> String {
        state
    }
}
