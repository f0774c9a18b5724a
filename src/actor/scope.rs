//! Page-scoped background tasks.
//!
//! Each page gets a [`TaskScope`] when it is mounted. Tasks spawned into
//! it run on their own threads and share one cancellation flag; when the
//! page's lifetime ends (switch, back, quit) the driver drops the scope,
//! which raises the flag and joins every task.
//!
//! Tasks talk back only through the [`Notifier`]. They may read shared
//! snapshots the page hands them but never write page or modal state.

use super::notifier::Notifier;
use std::cell::RefCell;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep inside a task, so cancellation is prompt.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// A tick delivered to periodic tasks.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Tick number (monotonically increasing).
    pub frame: u64,
    /// Time elapsed since the task started.
    pub elapsed: Duration,
}

/// Handle given to every task.
#[derive(Debug, Clone)]
pub struct TaskCtx {
    cancelled: Arc<AtomicBool>,
    notifier: Notifier,
}

impl TaskCtx {
    /// Whether the owning page has gone away.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Ask the render loop for a (debounced) redraw.
    pub fn notify(&self) {
        self.notifier.notify();
    }

    /// The notifier tasks report through.
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Sleep for `duration` in short slices.
    ///
    /// Returns `false` if the scope was cancelled before the time was up.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Structured cancellation scope for one page lifetime.
#[derive(Debug)]
pub struct TaskScope {
    ctx: TaskCtx,
    handles: RefCell<Vec<JoinHandle<()>>>,
}

impl TaskScope {
    /// Create an empty scope reporting through `notifier`.
    pub fn new(notifier: Notifier) -> Self {
        Self {
            ctx: TaskCtx {
                cancelled: Arc::new(AtomicBool::new(false)),
                notifier,
            },
            handles: RefCell::new(Vec::new()),
        }
    }

    /// Run `task` on its own thread until it returns or notices cancellation.
    pub fn spawn<F>(&self, name: &str, task: F) -> io::Result<()>
    where
        F: FnOnce(TaskCtx) + Send + 'static,
    {
        let ctx = self.ctx.clone();
        let handle = thread::Builder::new()
            .name(format!("pagewheel-{name}"))
            .spawn(move || task(ctx))?;
        tracing::debug!(task = name, "background task spawned");
        self.handles.borrow_mut().push(handle);
        Ok(())
    }

    /// Run `task` once after `delay`, unless the scope is cancelled first.
    pub fn spawn_after<F>(&self, name: &str, delay: Duration, task: F) -> io::Result<()>
    where
        F: FnOnce(&TaskCtx) + Send + 'static,
    {
        self.spawn(name, move |ctx| {
            if ctx.sleep(delay) {
                task(&ctx);
            }
        })
    }

    /// Call `task` every `interval` until it returns `false` or the scope
    /// is cancelled.
    ///
    /// If the task falls behind, missed ticks are dropped rather than
    /// queued.
    pub fn spawn_every<F>(&self, name: &str, interval: Duration, mut task: F) -> io::Result<()>
    where
        F: FnMut(&TaskCtx, Tick) -> bool + Send + 'static,
    {
        self.spawn(name, move |ctx| {
            let start = Instant::now();
            let mut frame = 0u64;
            let mut next_tick = start + interval;

            loop {
                let now = Instant::now();
                if now < next_tick && !ctx.sleep(next_tick - now) {
                    break;
                }

                let now = Instant::now();
                let tick = Tick {
                    frame,
                    elapsed: now - start,
                };
                if ctx.is_cancelled() || !task(&ctx, tick) {
                    break;
                }

                frame += 1;
                next_tick += interval;
                // Catch up without queuing
                if next_tick < now {
                    next_tick = now + interval;
                }
            }
        })
    }

    /// A context sharing this scope's cancellation flag.
    pub fn ctx(&self) -> TaskCtx {
        self.ctx.clone()
    }

    /// The notifier tasks in this scope report through.
    pub const fn notifier(&self) -> &Notifier {
        &self.ctx.notifier
    }

    /// Signal every task in the scope to stop.
    pub fn cancel(&self) {
        self.ctx.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether the scope has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.ctx.is_cancelled()
    }

    /// Number of tasks spawned into the scope.
    pub fn len(&self) -> usize {
        self.handles.borrow().len()
    }

    /// Whether no task has been spawned.
    pub fn is_empty(&self) -> bool {
        self.handles.borrow().is_empty()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel();
        let handles = std::mem::take(self.handles.get_mut());
        let count = handles.len();
        for handle in handles {
            let _ = handle.join();
        }
        if count > 0 {
            tracing::debug!(tasks = count, "task scope closed");
        }
    }
}
