//! The page contract: what the driver hosts.
//!
//! A page is a top-level screen. The driver owns its state, wrapped in a
//! [`Navigation`], and calls back into the page for every render, key and
//! tick. Pages never navigate by side effect: a handler that wants to leave
//! returns its navigation with a pending transition set.

use crate::actor::{Notifier, TaskScope};
use crate::input::KeyToken;
use crate::modal::{ModalFrame, ModalStack};
use crate::nav::Navigation;
use crate::terminal::Size;
use std::fmt;
use std::rc::Rc;

/// Whether the page is the input target when it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The page receives keys.
    Page,
    /// A modal is open above the page.
    Modal,
}

/// A bound key's handler.
pub type Action<S> = Rc<dyn Fn(Navigation<S>, &mut PageCx<'_, S>) -> Navigation<S>>;

/// One entry of a page's keymap.
pub struct KeyBinding<S> {
    /// Canonical key name (see [`KeyToken::name`]).
    pub key: String,
    /// Handler run by the key registry. `None` leaves the key to
    /// [`Page::handle_key`].
    pub action: Option<Action<S>>,
    /// Footer and help text.
    pub help: String,
    /// Listed in the footer and help only, never dispatched.
    pub display_only: bool,
}

impl<S> KeyBinding<S> {
    /// A binding dispatched by the registry.
    pub fn new<F>(key: impl Into<String>, help: impl Into<String>, action: F) -> Self
    where
        F: Fn(Navigation<S>, &mut PageCx<'_, S>) -> Navigation<S> + 'static,
    {
        Self {
            key: key.into(),
            action: Some(Rc::new(action)),
            help: help.into(),
            display_only: false,
        }
    }

    /// A documentation-only binding; the page handles the key itself.
    pub fn display(key: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: None,
            help: help.into(),
            display_only: true,
        }
    }

    /// Whether the registry should run this binding for `key`.
    pub fn dispatches(&self, key: &KeyToken) -> bool {
        !self.display_only && self.action.is_some() && key.is(&self.key)
    }
}

impl<S> Clone for KeyBinding<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            action: self.action.clone(),
            help: self.help.clone(),
            display_only: self.display_only,
        }
    }
}

impl<S> fmt::Debug for KeyBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("key", &self.key)
            .field("help", &self.help)
            .field("display_only", &self.display_only)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// What a page handler may touch besides its own state.
pub struct PageCx<'a, S> {
    size: Size,
    modals: &'a mut ModalStack<Navigation<S>>,
    tasks: &'a TaskScope,
}

impl<'a, S: 'static> PageCx<'a, S> {
    /// Bundle the driver-owned pieces for one handler call.
    pub fn new(size: Size, modals: &'a mut ModalStack<Navigation<S>>, tasks: &'a TaskScope) -> Self {
        Self { size, modals, tasks }
    }

    /// Current terminal size.
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Open a modal over the page.
    pub fn push_modal(&mut self, frame: impl Into<ModalFrame<Navigation<S>>>) {
        self.modals.push(frame);
    }

    /// The shared modal stack.
    pub fn modals(&mut self) -> &mut ModalStack<Navigation<S>> {
        &mut *self.modals
    }

    /// The page's task scope. Tasks spawned here are cancelled when the
    /// page's run ends.
    pub const fn tasks(&self) -> &TaskScope {
        self.tasks
    }

    /// Redraw handle for background work.
    pub const fn notifier(&self) -> &Notifier {
        self.tasks.notifier()
    }
}

impl<S> fmt::Debug for PageCx<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCx")
            .field("size", &self.size)
            .field("modals", &self.modals.len())
            .finish_non_exhaustive()
    }
}

/// A navigable screen.
///
/// Only [`Page::init`], [`Page::view`] and [`Page::handle_key`] are
/// required; every other hook has a neutral default.
pub trait Page {
    /// The page's own state.
    type State: 'static;

    /// Build fresh state. Background tasks spawned into `tasks` live as
    /// long as this page's run.
    fn init(&self, tasks: &TaskScope) -> Self::State;

    /// Title line text.
    fn title(&self, _state: &Self::State) -> String {
        String::new()
    }

    /// Render the page body.
    fn view(&self, state: &Self::State, focus: Focus, size: Size) -> String;

    /// Handle a key the registry did not consume.
    fn handle_key(
        &self,
        nav: Navigation<Self::State>,
        key: &KeyToken,
        cx: &mut PageCx<'_, Self::State>,
    ) -> Navigation<Self::State>;

    /// Handle a key while [`Page::has_modal`] reports a page-private modal.
    fn handle_modal_key(
        &self,
        nav: Navigation<Self::State>,
        _key: &KeyToken,
        _cx: &mut PageCx<'_, Self::State>,
    ) -> Navigation<Self::State> {
        nav
    }

    /// Called after a resize, a background notify, or a modal closing.
    fn refresh(&self, nav: Navigation<Self::State>) -> Navigation<Self::State> {
        nav
    }

    /// Called on idle ticks with a running tick counter.
    fn service_cycle(&self, nav: Navigation<Self::State>, _tick: u64) -> Navigation<Self::State> {
        nav
    }

    /// Current key bindings, for dispatch and the footer.
    fn keymap(&self, _state: &Self::State) -> Vec<KeyBinding<Self::State>> {
        Vec::new()
    }

    /// Every key the page may react to, for static conflict checks.
    fn handled_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the page is showing a modal of its own.
    fn has_modal(&self, _state: &Self::State) -> bool {
        false
    }

    /// Enter outside any modal.
    fn enter(
        &self,
        nav: Navigation<Self::State>,
        cx: &mut PageCx<'_, Self::State>,
    ) -> Navigation<Self::State> {
        self.handle_key(nav, &KeyToken::Enter, cx)
    }

    /// Escape outside any modal. Leaving nothing pending means "back".
    fn handle_escape(
        &self,
        nav: Navigation<Self::State>,
        _cx: &mut PageCx<'_, Self::State>,
    ) -> Navigation<Self::State> {
        nav
    }

    /// Extra text for the help modal.
    fn help_hint(&self, _state: &Self::State) -> Option<String> {
        None
    }
}

/// A page with one extra key intercepted before the inner page sees it.
///
/// Every other call is forwarded unchanged.
pub struct Decorated<P: Page, F> {
    inner: P,
    key: String,
    help: String,
    handler: F,
}

impl<P, F> Decorated<P, F>
where
    P: Page,
    F: Fn(Navigation<P::State>, &mut PageCx<'_, P::State>) -> Navigation<P::State>,
{
    /// Wrap `inner`, routing `key` to `handler`.
    pub fn new(inner: P, key: impl Into<String>, help: impl Into<String>, handler: F) -> Self {
        Self {
            inner,
            key: key.into(),
            help: help.into(),
            handler,
        }
    }

    /// The wrapped page.
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P, F> Page for Decorated<P, F>
where
    P: Page,
    F: Fn(Navigation<P::State>, &mut PageCx<'_, P::State>) -> Navigation<P::State>,
{
    type State = P::State;

    fn init(&self, tasks: &TaskScope) -> P::State {
        self.inner.init(tasks)
    }

    fn title(&self, state: &P::State) -> String {
        self.inner.title(state)
    }

    fn view(&self, state: &P::State, focus: Focus, size: Size) -> String {
        self.inner.view(state, focus, size)
    }

    fn handle_key(
        &self,
        nav: Navigation<P::State>,
        key: &KeyToken,
        cx: &mut PageCx<'_, P::State>,
    ) -> Navigation<P::State> {
        if key.is(&self.key) {
            (self.handler)(nav, cx)
        } else {
            self.inner.handle_key(nav, key, cx)
        }
    }

    fn handle_modal_key(
        &self,
        nav: Navigation<P::State>,
        key: &KeyToken,
        cx: &mut PageCx<'_, P::State>,
    ) -> Navigation<P::State> {
        self.inner.handle_modal_key(nav, key, cx)
    }

    fn refresh(&self, nav: Navigation<P::State>) -> Navigation<P::State> {
        self.inner.refresh(nav)
    }

    fn service_cycle(&self, nav: Navigation<P::State>, tick: u64) -> Navigation<P::State> {
        self.inner.service_cycle(nav, tick)
    }

    /// The inner keymap minus any binding for the intercepted key, which
    /// is listed first as display-only so it reaches `handle_key`.
    fn keymap(&self, state: &P::State) -> Vec<KeyBinding<P::State>> {
        let mut bindings = vec![KeyBinding::display(self.key.clone(), self.help.clone())];
        bindings.extend(
            self.inner
                .keymap(state)
                .into_iter()
                .filter(|b| b.key != self.key),
        );
        bindings
    }

    fn handled_keys(&self) -> Vec<String> {
        let mut keys = self.inner.handled_keys();
        if !keys.contains(&self.key) {
            keys.push(self.key.clone());
        }
        keys
    }

    fn has_modal(&self, state: &P::State) -> bool {
        self.inner.has_modal(state)
    }

    fn enter(&self, nav: Navigation<P::State>, cx: &mut PageCx<'_, P::State>) -> Navigation<P::State> {
        if KeyToken::Enter.is(&self.key) {
            (self.handler)(nav, cx)
        } else {
            self.inner.enter(nav, cx)
        }
    }

    fn handle_escape(
        &self,
        nav: Navigation<P::State>,
        cx: &mut PageCx<'_, P::State>,
    ) -> Navigation<P::State> {
        if KeyToken::esc().is(&self.key) {
            (self.handler)(nav, cx)
        } else {
            self.inner.handle_escape(nav, cx)
        }
    }

    fn help_hint(&self, state: &P::State) -> Option<String> {
        self.inner.help_hint(state)
    }
}

impl<P: Page + fmt::Debug, F> fmt::Debug for Decorated<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorated")
            .field("inner", &self.inner)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::Pending;

    /// Counts keys it sees.
    struct Counter;

    impl Page for Counter {
        type State = u32;

        fn init(&self, _tasks: &TaskScope) -> u32 {
            0
        }

        fn view(&self, state: &u32, _focus: Focus, _size: Size) -> String {
            state.to_string()
        }

        fn handle_key(
            &self,
            nav: Navigation<u32>,
            _key: &KeyToken,
            _cx: &mut PageCx<'_, u32>,
        ) -> Navigation<u32> {
            nav.update(|n| n + 1)
        }

        fn keymap(&self, _state: &u32) -> Vec<KeyBinding<u32>> {
            vec![
                KeyBinding::new("g", "go", |nav, _| nav.goto("other")),
                KeyBinding::display("j", "down"),
            ]
        }

        fn handled_keys(&self) -> Vec<String> {
            vec!["j".to_string(), "g".to_string()]
        }
    }

    fn with_cx<T>(f: impl FnOnce(&mut PageCx<'_, u32>) -> T) -> T {
        let mut modals = ModalStack::new();
        let tasks = TaskScope::new(Notifier::new());
        let mut cx = PageCx::new(Size::DEFAULT, &mut modals, &tasks);
        f(&mut cx)
    }

    fn quit_page() -> Decorated<Counter, impl Fn(Navigation<u32>, &mut PageCx<'_, u32>) -> Navigation<u32>> {
        Decorated::new(Counter, "g", "quit", |nav: Navigation<u32>, _: &mut PageCx<'_, u32>| nav.quit())
    }

    #[test]
    fn test_decorator_intercepts_key() {
        let page = quit_page();
        let nav = with_cx(|cx| page.handle_key(Navigation::make(0), &KeyToken::char("g"), cx));
        assert_eq!(nav.pending(), &Pending::Quit);
        assert_eq!(*nav.inner(), 0);
    }

    #[test]
    fn test_decorator_forwards_other_keys() {
        let page = quit_page();
        let nav = with_cx(|cx| page.handle_key(Navigation::make(0), &KeyToken::char("j"), cx));
        assert_eq!(nav.pending(), &Pending::None);
        assert_eq!(*nav.inner(), 1);
        assert_eq!(page.view(nav.inner(), Focus::Page, Size::DEFAULT), "1");
    }

    #[test]
    fn test_decorator_keymap_shadows_inner_binding() {
        let page = quit_page();
        let keymap = page.keymap(&0);
        let g: Vec<_> = keymap.iter().filter(|b| b.key == "g").collect();
        assert_eq!(g.len(), 1);
        assert!(g[0].display_only);
        assert_eq!(g[0].help, "quit");
        assert_eq!(page.handled_keys(), ["j", "g"]);
    }

    #[test]
    fn test_default_enter_goes_through_handle_key() {
        let nav = with_cx(|cx| Counter.enter(Navigation::make(5), cx));
        assert_eq!(*nav.inner(), 6);
    }

    #[test]
    fn test_binding_dispatches() {
        let bindings = Counter.keymap(&0);
        assert!(bindings[0].dispatches(&KeyToken::char("g")));
        assert!(!bindings[0].dispatches(&KeyToken::char("j")));
        assert!(!bindings[1].dispatches(&KeyToken::char("j")));
    }
}
