//! Byte sources feeding the decoder.
//!
//! The decoder never touches a file descriptor directly. It asks a
//! [`ByteSource`] for more bytes with a timeout, which lets it block for
//! the idle tick, re-poll briefly for the tail of an escape sequence, and
//! peek without waiting when draining auto-repeat.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::VecDeque;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Result of asking a source for more bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// Some bytes arrived.
    Bytes(Vec<u8>),
    /// Nothing arrived before the timeout.
    Timeout,
    /// The stream ended; no more bytes will ever arrive.
    Closed,
}

/// Anything that can hand raw input bytes to the decoder.
pub trait ByteSource {
    /// Wait up to `timeout` for more bytes.
    fn poll(&mut self, timeout: Duration) -> Poll;

    /// Return bytes that are already available without waiting.
    fn try_read(&mut self) -> Poll {
        self.poll(Duration::ZERO)
    }
}

/// Chunk size for each blocking read of stdin.
const READ_CHUNK: usize = 256;

/// Reads stdin on a dedicated thread and forwards chunks over a channel.
///
/// The thread blocks in `read(2)`, so it cannot be interrupted; dropping
/// the source raises the shutdown flag and detaches it. It exits on the
/// next byte or at end of input.
pub struct StdinSource {
    rx: Receiver<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StdinSource {
    /// Spawn the reader thread on stdin.
    pub fn spawn() -> std::io::Result<Self> {
        Self::from_reader(std::io::stdin())
    }

    /// Spawn the reader thread on any blocking reader.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let (tx, rx) = bounded::<Vec<u8>>(64);

        let handle = thread::Builder::new()
            .name("pagewheel-input".to_string())
            .spawn(move || Self::run_loop(reader, &tx, &shutdown_clone))?;

        Ok(Self {
            rx,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Ask the reader thread to stop after its current read.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Whether the reader thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the reader thread and wait for it.
    ///
    /// Blocks until the current read returns, so on a terminal this waits
    /// for the next keypress.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("input thread panicked");
            }
        }
    }

    fn run_loop<R: Read>(mut reader: R, tx: &Sender<Vec<u8>>, shutdown: &Arc<AtomicBool>) {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            match reader.read(&mut chunk) {
                Ok(0) => {
                    tracing::debug!("input reached end of stream");
                    break;
                }
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        // Receiver dropped, exit
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(error = %e, "input read failed");
                    break;
                }
            }
        }
        // Dropping `tx` disconnects the channel, which the source reports as Closed.
    }
}

impl ByteSource for StdinSource {
    fn poll(&mut self, timeout: Duration) -> Poll {
        match self.rx.recv_timeout(timeout) {
            Ok(bytes) => Poll::Bytes(bytes),
            Err(RecvTimeoutError::Timeout) => Poll::Timeout,
            Err(RecvTimeoutError::Disconnected) => Poll::Closed,
        }
    }

    fn try_read(&mut self) -> Poll {
        match self.rx.try_recv() {
            Ok(bytes) => Poll::Bytes(bytes),
            Err(TryRecvError::Empty) => Poll::Timeout,
            Err(TryRecvError::Disconnected) => Poll::Closed,
        }
    }
}

impl Drop for StdinSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A source that replays a fixed script of chunks.
///
/// Each poll hands out the next chunk. `Timeout` entries simulate a quiet
/// period. Once the script runs out the source reports `Timeout`, or
/// `Closed` if built with [`ScriptedSource::closing`].
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    script: VecDeque<Poll>,
    close_when_empty: bool,
    polls: usize,
}

impl ScriptedSource {
    /// An empty script that times out forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty script that reports end of input once exhausted.
    pub fn closing() -> Self {
        Self {
            close_when_empty: true,
            ..Self::default()
        }
    }

    /// Queue one chunk of bytes.
    #[must_use]
    pub fn bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.push_bytes(bytes);
        self
    }

    /// Queue a quiet period (one poll that times out).
    #[must_use]
    pub fn pause(mut self) -> Self {
        self.script.push_back(Poll::Timeout);
        self
    }

    /// Queue one chunk of bytes in place.
    pub fn push_bytes(&mut self, bytes: impl AsRef<[u8]>) {
        self.script.push_back(Poll::Bytes(bytes.as_ref().to_vec()));
    }

    /// Number of polls served so far.
    pub const fn polls(&self) -> usize {
        self.polls
    }

    /// Whether the scripted input has all been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl ByteSource for ScriptedSource {
    fn poll(&mut self, _timeout: Duration) -> Poll {
        self.polls += 1;
        match self.script.pop_front() {
            Some(poll) => poll,
            None if self.close_when_empty => Poll::Closed,
            None => Poll::Timeout,
        }
    }

    fn try_read(&mut self) -> Poll {
        // Quiet periods represent time passing, so a zero-wait read stops there.
        let next_is_bytes = matches!(self.script.front(), Some(Poll::Bytes(_)));
        if next_is_bytes {
            self.poll(Duration::ZERO)
        } else if self.script.is_empty() && self.close_when_empty {
            Poll::Closed
        } else {
            Poll::Timeout
        }
    }
}
