//! Driver: the per-page event loop.
//!
//! The driver owns everything a page touches: its state (inside a
//! [`Navigation`]), the shared modal stack, the key registry layer built
//! from the page's keymap, and the page's background task scope. It runs
//! until a handler sets a pending transition or input ends, then hands an
//! [`Outcome`] back to the caller, which decides which page to run next.
//!
//! ```text
//!        ┌────────────── loop ──────────────┐
//!        ▼                                  │
//!   resolve size ─▶ narrow check ─▶ render  │
//!        │                                  │
//!        ▼                                  │
//!   resize flag? ──yes──▶ page.refresh ─────┤
//!   notifier due? ─yes──▶ page.refresh ─────┤
//!   decoder.next_token                      │
//!     Refresh ─────────▶ service_cycle ─────┤
//!     Quit ────────────▶ Outcome::Quit      │
//!     key ─────────────▶ route ─▶ pending? ─┘
//!                                   │ yes
//!                                   ▼
//!                                Outcome
//! ```
//!
//! Key routing, highest priority first:
//!
//! 1. the modal stack, when it is non-empty
//! 2. [`Page::handle_modal_key`] while the page reports a private modal
//! 3. `C-c` quits, `?` opens the help modal
//! 4. Enter goes to [`Page::enter`]; Esc to [`Page::handle_escape`], then back
//! 5. the key registry
//! 6. [`Page::handle_key`]

mod help;
mod narrow;

pub use help::{help_frame, help_text, HELP_TITLE};
pub use narrow::{dismiss_expired, narrow_frame, NarrowState, NarrowWarning, NARROW_TITLE};

use crate::actor::{Notifier, TaskScope};
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::input::{ByteSource, Decoder, KeyToken, StdinSource};
use crate::keymap::{BindingStack, KeyRegistry};
use crate::modal::{BoxCompositor, ModalRenderer, ModalStack};
use crate::nav::{Navigation, Pending};
use crate::page::{Focus, Page, PageCx};
use crate::render::{footer_lines, narrow_banner, trim_to_rows, Chrome, FrameWriter};
use crate::terminal::{Size, SizeProber};
use std::fmt;
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why a page's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Leave the application.
    Quit,
    /// Run the named page next. [`Outcome::BACK`] means "previous page".
    SwitchTo(String),
}

impl Outcome {
    /// Page name carried by `SwitchTo` for a back transition.
    pub const BACK: &'static str = "__BACK__";

    /// Map a pending transition to an outcome. `None` keeps the page running.
    pub fn from_pending(pending: Pending) -> Option<Self> {
        match pending {
            Pending::None => None,
            Pending::Goto(name) => Some(Self::SwitchTo(name)),
            Pending::Back => Some(Self::SwitchTo(Self::BACK.to_string())),
            Pending::Quit => Some(Self::Quit),
        }
    }

    /// Whether this is a back transition.
    pub fn is_back(&self) -> bool {
        matches!(self, Self::SwitchTo(name) if name == Self::BACK)
    }
}

/// State that lives exactly as long as one page's run.
struct PageRun<S> {
    modals: ModalStack<Navigation<S>>,
    tasks: TaskScope,
    /// Page frame drawn under open modals, keyed on the size and the
    /// modal close count it was drawn at.
    snapshot: Option<(Size, u64, String)>,
    narrow_expired: Arc<AtomicBool>,
}

/// Runs pages against an input source and an output writer.
pub struct Driver<Src, W: Write> {
    config: RuntimeConfig,
    decoder: Decoder<Src>,
    writer: FrameWriter<W>,
    prober: SizeProber,
    notifier: Notifier,
    resize: Arc<AtomicBool>,
    renderer: Box<dyn ModalRenderer>,
    /// Session-scoped: set on the first narrow crossing, never cleared
    /// except by [`Driver::reset_narrow_warning`].
    warned_narrow: bool,
    tick: u64,
}

impl Driver<StdinSource, Stdout> {
    /// A driver reading stdin and writing stdout, probing the real
    /// terminal for its size.
    ///
    /// Enter a [`TerminalSession`](crate::terminal::TerminalSession) first
    /// and hand its resize flag to [`Driver::set_resize_flag`].
    pub fn stdio(config: RuntimeConfig) -> Result<Self> {
        let source = StdinSource::spawn()?;
        let prober = SizeProber::standard(config.forced_size);
        Ok(Self::new(config, source, io::stdout(), prober))
    }
}

impl<Src: ByteSource, W: Write> Driver<Src, W> {
    /// Create a driver from its parts.
    pub fn new(config: RuntimeConfig, source: Src, writer: W, prober: SizeProber) -> Self {
        let renderer = Box::new(BoxCompositor::new(config.ascii_borders));
        Self {
            decoder: Decoder::with_config(source, &config),
            writer: FrameWriter::new(writer),
            prober,
            notifier: Notifier::new(),
            resize: Arc::new(AtomicBool::new(false)),
            renderer,
            warned_narrow: false,
            tick: 0,
            config,
        }
    }

    /// Replace the modal compositor.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl ModalRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Use `flag` as the resize signal. The driver swaps it back to
    /// `false` when it acts on it.
    pub fn set_resize_flag(&mut self, flag: Arc<AtomicBool>) {
        self.resize = flag;
    }

    /// Redraw handle shared with every page's background tasks.
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Re-arm the narrow-terminal warning for the rest of the session.
    pub fn reset_narrow_warning(&mut self) {
        self.warned_narrow = false;
    }

    /// The active configuration.
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The frame writer, for stats.
    pub const fn writer(&self) -> &FrameWriter<W> {
        &self.writer
    }

    /// The output everything has been written to.
    pub const fn output(&self) -> &W {
        self.writer.writer()
    }

    /// The input source.
    pub const fn source_mut(&mut self) -> &mut Src {
        self.decoder.source_mut()
    }

    /// The size probe chain.
    pub fn prober_mut(&mut self) -> &mut SizeProber {
        &mut self.prober
    }

    /// Run `page` with a fresh [`BindingStack`] registry.
    pub fn run<P: Page>(&mut self, page: &P) -> Result<Outcome> {
        let mut registry = BindingStack::new();
        self.run_with(page, &mut registry)
    }

    /// Run `page` until it requests a transition or input ends.
    ///
    /// The page's keymap is pushed as a layer onto `registry` and removed
    /// again before returning, so layers pushed by the caller underneath
    /// stay in effect. Background tasks spawned by the page are cancelled
    /// and joined before this returns.
    pub fn run_with<P, R>(&mut self, page: &P, registry: &mut R) -> Result<Outcome>
    where
        P: Page,
        R: KeyRegistry<P::State>,
    {
        let tasks = TaskScope::new(self.notifier.clone());
        let mut nav = Navigation::make(page.init(&tasks));
        let mut run = PageRun {
            modals: ModalStack::new(),
            tasks,
            snapshot: None,
            narrow_expired: Arc::new(AtomicBool::new(false)),
        };
        let mut layer = None;

        let result = loop {
            if let Some(handle) = layer.take() {
                registry.pop(handle);
            }
            layer = Some(registry.push(page.keymap(nav.inner())));

            let size = self.prober.resolve();
            self.check_narrow(size, &mut run);
            dismiss_expired(&mut run.modals, &run.narrow_expired, &mut nav);

            if let Err(err) = self.render(page, &*registry, &nav, &mut run, size) {
                break Err(err);
            }

            if self.resize.swap(false, Ordering::SeqCst) {
                tracing::debug!(rows = size.rows, cols = size.cols, "resize signalled");
                self.writer.invalidate();
                nav = page.refresh(nav);
                run.snapshot = None;
            } else if self.notifier.should_refresh(self.config.debounce) {
                tracing::trace!("background refresh");
                nav = page.refresh(nav);
                run.snapshot = None;
            } else {
                match self.decoder.next_token(self.config.poll_timeout) {
                    KeyToken::Quit => {
                        tracing::info!("input closed");
                        break Ok(Outcome::Quit);
                    }
                    KeyToken::Refresh => {
                        self.tick += 1;
                        nav = page.service_cycle(nav, self.tick);
                        run.snapshot = None;
                    }
                    key => {
                        tracing::trace!(%key, "key");
                        nav = route(page, &*registry, &mut run, nav, &key, size);
                    }
                }
            }

            if let Some(outcome) = Outcome::from_pending(nav.take_pending()) {
                break Ok(outcome);
            }
        };

        if let Some(handle) = layer {
            registry.pop(handle);
        }
        drop(run);
        if let Ok(outcome) = &result {
            tracing::info!(?outcome, "page finished");
        }
        result
    }

    /// Push the narrow-terminal modal on the first narrow frame of the
    /// session and schedule its dismissal.
    fn check_narrow<S: 'static>(&mut self, size: Size, run: &mut PageRun<S>) {
        let threshold = self.config.narrow_threshold;
        if self.warned_narrow || size.cols >= threshold {
            return;
        }
        self.warned_narrow = true;
        tracing::info!(cols = size.cols, threshold, "terminal narrower than recommended");
        run.modals.push(narrow_frame::<Navigation<S>>(size.cols, threshold));

        let expired = run.narrow_expired.clone();
        let scheduled = run.tasks.spawn_after(
            "narrow-dismiss",
            self.config.narrow_dismiss_after,
            move |ctx| {
                expired.store(true, Ordering::SeqCst);
                ctx.notify();
            },
        );
        if let Err(err) = scheduled {
            tracing::warn!(error = %err, "could not schedule narrow warning dismissal");
        }
    }

    fn render<P, R>(
        &mut self,
        page: &P,
        registry: &R,
        nav: &Navigation<P::State>,
        run: &mut PageRun<P::State>,
        size: Size,
    ) -> Result<()>
    where
        P: Page,
        R: KeyRegistry<P::State> + ?Sized,
    {
        let bindings = registry.top_bindings();
        let text = if run.modals.is_empty() {
            run.snapshot = None;
            self.compose_page(page, nav.inner(), &bindings, Focus::Page, size)
        } else {
            let closed = run.modals.closed();
            let base = match run.snapshot.take() {
                Some((drawn_at, seen, text)) if drawn_at == size && seen == closed => text,
                _ => self.compose_page(page, nav.inner(), &bindings, Focus::Modal, size),
            };
            let text = self.renderer.composite(&base, &run.modals.layers(), size);
            run.snapshot = Some((size, closed, base));
            trim_to_rows(&text, size.rows)
        };

        let result = self.writer.present(&text, size)?;
        if !result.is_skipped() {
            tracing::trace!(
                lines = result.lines_changed,
                bytes = result.bytes,
                full = result.full_redraw,
                "frame presented"
            );
        }
        Ok(())
    }

    /// Chrome around the page body, with the narrow banner on top when
    /// needed, cut to the terminal height.
    fn compose_page<P: Page>(
        &self,
        page: &P,
        state: &P::State,
        bindings: &[(String, String)],
        focus: Focus,
        size: Size,
    ) -> String {
        let threshold = self.config.narrow_threshold;
        let narrow = size.cols < threshold;
        let footer = footer_lines(bindings, usize::from(size.cols), self.config.footer_max_lines);
        let reserved = u16::try_from(2 + footer.len() + usize::from(narrow)).unwrap_or(u16::MAX);

        let body = page.view(state, focus, Size::new(size.rows.saturating_sub(reserved), size.cols));
        let title = page.title(state);
        let overlay = self
            .config
            .debug_overlay
            .then(|| format!("{:.1} fps", self.writer.stats().fps));

        let chrome = Chrome {
            title: &title,
            overlay: overlay.as_deref(),
            body: &body,
            bindings,
            footer_max_lines: self.config.footer_max_lines,
            ascii: self.config.ascii_borders,
        };

        let text = if narrow {
            let below = Size::new(size.rows.saturating_sub(1), size.cols);
            format!("{}\n{}", narrow_banner(size.cols, threshold), chrome.compose(below))
        } else {
            chrome.compose(size)
        };
        trim_to_rows(&text, size.rows)
    }
}

/// Route one key. Returns the page's navigation after the handler ran.
fn route<P, R>(
    page: &P,
    registry: &R,
    run: &mut PageRun<P::State>,
    mut nav: Navigation<P::State>,
    key: &KeyToken,
    size: Size,
) -> Navigation<P::State>
where
    P: Page,
    R: KeyRegistry<P::State> + ?Sized,
{
    if !run.modals.is_empty() {
        run.modals.handle_key(key, size, &mut nav);
        if run.modals.take_consume_flag() {
            return nav;
        }
        if run.modals.is_empty() && !nav.pending().is_some() {
            return page.refresh(nav);
        }
        return nav;
    }

    let mut cx = PageCx::new(size, &mut run.modals, &run.tasks);

    if page.has_modal(nav.inner()) {
        return page.handle_modal_key(nav, key, &mut cx);
    }

    if *key == KeyToken::Control('c') {
        tracing::info!("interrupted from keyboard");
        return nav.quit();
    }

    if key.is("?") && registry.dispatch(key).is_none() {
        let hint = page.help_hint(nav.inner());
        cx.push_modal(help_frame::<Navigation<P::State>>(
            &registry.all_bindings(),
            hint.as_deref(),
        ));
        return nav;
    }

    if *key == KeyToken::Enter {
        return page.enter(nav, &mut cx);
    }

    if key.is_escape() {
        let nav = page.handle_escape(nav, &mut cx);
        if nav.pending().is_some() || !cx.modals().is_empty() {
            return nav;
        }
        return nav.back();
    }

    match registry.dispatch(key) {
        Some(action) => action(nav, &mut cx),
        None => page.handle_key(nav, key, &mut cx),
    }
}

impl<Src, W: Write> fmt::Debug for Driver<Src, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("prober", &self.prober)
            .field("warned_narrow", &self.warned_narrow)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
