//! Terminal session: raw mode and mouse tracking with guaranteed cleanup.
//!
//! Entering a session puts the terminal into raw mode, optionally switches
//! to the alternate screen and enables mouse tracking. Every exit path
//! restores it:
//!
//! - normal return: `Drop`
//! - panic: a process-wide panic hook installed once
//! - SIGINT/SIGTERM: a signal thread that cleans up and exits with
//!   `128 + signal`
//!
//! SIGWINCH only raises the resize flag; the driver consumes it on its
//! next tick.

use super::output::{MOUSE_OFF, MOUSE_ON};
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crossterm::tty::IsTty;
use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// RAII guard over the terminal modes the runtime enables.
#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
    resize: Arc<AtomicBool>,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalSession {
    /// Check for an interactive terminal, then enter raw mode.
    ///
    /// Fails with [`Error::NotATerminal`] before touching any terminal
    /// setting when stdin or stdout is redirected.
    pub fn enter(config: &RuntimeConfig) -> Result<Self> {
        if !io::stdin().is_tty() || !io::stdout().is_tty() {
            return Err(Error::NotATerminal);
        }

        install_panic_hook();

        let resize = Arc::new(AtomicBool::new(false));
        #[cfg(unix)]
        let signal_guard = Some(SignalGuard::new(&resize)?);

        crossterm::terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            alternate_screen_enabled: false,
            mouse_enabled: false,
            resize,
            #[cfg(unix)]
            signal_guard,
        };

        let mut stdout = io::stdout();
        if config.alternate_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            session.alternate_screen_enabled = true;
        }
        if config.mouse {
            stdout.write_all(MOUSE_ON)?;
            session.mouse_enabled = true;
            tracing::info!("mouse tracking enabled");
        }
        crossterm::execute!(stdout, crossterm::cursor::Hide)?;

        Ok(session)
    }

    /// Flag raised by SIGWINCH. The driver swaps it back to `false`.
    pub fn resize_flag(&self) -> Arc<AtomicBool> {
        self.resize.clone()
    }

    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        let mut stdout = io::stdout();

        if self.mouse_enabled {
            let _ = stdout.write_all(MOUSE_OFF);
            self.mouse_enabled = false;
            tracing::info!("mouse tracking disabled");
        }

        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);

        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
        }

        let _ = crossterm::terminal::disable_raw_mode();
        tracing::info!("terminal raw mode disabled");

        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

/// Restore the terminal without knowing which modes were enabled.
fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(MOUSE_OFF);
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    winch: signal_hook::SigId,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new(resize: &Arc<AtomicBool>) -> Result<Self> {
        let winch = signal_hook::flag::register(SIGWINCH, resize.clone()).map_err(Error::Signal)?;
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(Error::Signal)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("pagewheel-signals".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    tracing::warn!(signal, "termination signal received, cleaning up");
                    best_effort_cleanup();
                    std::process::exit(128 + signal);
                }
            })
            .map_err(Error::Signal)?;
        Ok(Self {
            handle,
            winch,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.winch);
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
