//! Byte-stream decoder: raw terminal input to [`KeyToken`]s.
//!
//! Decoding is split in two layers:
//!
//! 1. [`decode`] is a pure function over a byte slice. It either yields
//!    one token and how many bytes it used, asks to skip bytes that carry
//!    nothing (mouse motion), or reports that the slice ends inside a
//!    sequence.
//! 2. [`Decoder`] owns the pending bytes and a [`ByteSource`]. It blocks
//!    for the idle tick, re-polls a bounded number of times to finish a
//!    partial escape sequence, and drains auto-repeat after arrow/Tab keys
//!    so a held key collapses into a single action.
//!
//! Decoding never fails. Malformed or truncated sequences degrade to a
//! best-effort token, usually `Char("Esc")`.

use super::key::KeyToken;
use super::source::{ByteSource, Poll};
use crate::config::RuntimeConfig;
use std::time::Duration;

const ESC: u8 = 0x1b;

/// Longest parameter run accepted inside a CSI sequence before giving up.
const MAX_CSI_PARAMS: usize = 32;

/// Outcome of decoding the front of a byte slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decode {
    /// The slice is empty.
    Empty,
    /// A complete token.
    Token {
        /// The decoded token.
        token: KeyToken,
        /// Bytes used from the front of the slice.
        consumed: usize,
    },
    /// A complete sequence that maps to no token (e.g. mouse motion).
    Skip(usize),
    /// The slice ends in the middle of a sequence.
    Incomplete,
}

impl Decode {
    const fn token(token: KeyToken, consumed: usize) -> Self {
        Self::Token { token, consumed }
    }
}

/// Decode one token from the front of `buf`.
pub fn decode(buf: &[u8]) -> Decode {
    match buf.first() {
        None => Decode::Empty,
        Some(&ESC) => decode_escape(buf),
        Some(&first) => decode_plain(first, buf),
    }
}

/// Best-effort token for a slice that stayed incomplete after re-polling.
///
/// The whole slice is consumed.
pub fn decode_truncated(buf: &[u8]) -> Decode {
    match buf.first() {
        None => Decode::Empty,
        Some(&ESC) => Decode::token(KeyToken::esc(), buf.len()),
        Some(_) => Decode::token(KeyToken::char("\u{FFFD}"), buf.len()),
    }
}

fn decode_plain(first: u8, buf: &[u8]) -> Decode {
    let token = match first {
        b'\n' | b'\r' => KeyToken::Enter,
        b'\t' => KeyToken::Tab,
        127 => KeyToken::Backspace,
        1..=26 => KeyToken::Control(char::from(first + 96)),
        0x80..=0xff => return decode_utf8(first, buf),
        _ => KeyToken::Char(char::from(first).to_string()),
    };
    Decode::token(token, 1)
}

fn decode_utf8(first: u8, buf: &[u8]) -> Decode {
    let len = match first {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        // Continuation or invalid lead byte
        _ => return Decode::token(KeyToken::char("\u{FFFD}"), 1),
    };
    if buf.len() < len {
        return Decode::Incomplete;
    }
    match std::str::from_utf8(&buf[..len]) {
        Ok(s) => Decode::token(KeyToken::char(s), len),
        Err(_) => Decode::token(KeyToken::char("\u{FFFD}"), 1),
    }
}

fn decode_escape(buf: &[u8]) -> Decode {
    match buf.get(1) {
        None => Decode::Incomplete,
        Some(b'[') => decode_csi(buf),
        Some(b'O') => decode_ss3(buf),
        // ESC followed by anything else is a bare Escape; the next byte
        // decodes on its own.
        Some(_) => Decode::token(KeyToken::esc(), 1),
    }
}

fn arrow(byte: u8) -> Option<KeyToken> {
    match byte {
        b'A' => Some(KeyToken::Up),
        b'B' => Some(KeyToken::Down),
        b'C' => Some(KeyToken::Right),
        b'D' => Some(KeyToken::Left),
        _ => None,
    }
}

/// `ESC O <c>`: application keypad mode.
fn decode_ss3(buf: &[u8]) -> Decode {
    let Some(&c) = buf.get(2) else {
        return Decode::Incomplete;
    };
    let token = arrow(c).unwrap_or_else(|| KeyToken::Char(char::from(c).to_string()));
    Decode::token(token, 3)
}

/// `ESC [ ...`
fn decode_csi(buf: &[u8]) -> Decode {
    let Some(&c) = buf.get(2) else {
        return Decode::Incomplete;
    };
    if let Some(token) = arrow(c) {
        return Decode::token(token, 3);
    }
    match c {
        b'Z' => Decode::token(KeyToken::ShiftTab, 3),
        b'H' => Decode::token(KeyToken::char("Home"), 3),
        b'F' => Decode::token(KeyToken::char("End"), 3),
        b'<' => decode_sgr_mouse(buf),
        b'M' => decode_legacy_mouse(buf),
        b'0'..=b'9' => decode_csi_params(buf),
        _ => Decode::token(KeyToken::Char(char::from(c).to_string()), 3),
    }
}

/// `ESC [ < b ; x ; y (M|m)`
fn decode_sgr_mouse(buf: &[u8]) -> Decode {
    let body = &buf[3..];
    let Some(end) = body.iter().position(|b| !(b.is_ascii_digit() || *b == b';')) else {
        return if body.len() > MAX_CSI_PARAMS {
            Decode::token(KeyToken::esc(), buf.len())
        } else {
            Decode::Incomplete
        };
    };
    let terminator = body[end];
    let consumed = 3 + end + 1;
    if terminator != b'M' && terminator != b'm' {
        // Not a mouse report after all
        return Decode::token(KeyToken::esc(), 1);
    }

    let mut fields = body[..end]
        .split(|b| *b == b';')
        .map(|f| std::str::from_utf8(f).ok().and_then(|s| s.parse::<u16>().ok()));
    let (Some(Some(button)), Some(Some(col)), Some(Some(row))) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Decode::Skip(consumed);
    };

    // Wheel reports and motion carry no click.
    if button & 64 != 0 {
        return Decode::Skip(consumed);
    }
    let pressed = terminator == b'm';
    if !pressed && button & 32 != 0 {
        return Decode::Skip(consumed);
    }

    Decode::token(
        KeyToken::Mouse {
            row: row.max(1),
            col: col.max(1),
            pressed,
        },
        consumed,
    )
}

/// `ESC [ M <btn> <x> <y>` with coordinates offset by 32.
fn decode_legacy_mouse(buf: &[u8]) -> Decode {
    if buf.len() < 6 {
        return Decode::Incomplete;
    }
    let col = u16::from(buf[4].saturating_sub(32)).max(1);
    let row = u16::from(buf[5].saturating_sub(32)).max(1);
    Decode::token(
        KeyToken::Mouse {
            row,
            col,
            pressed: true,
        },
        6,
    )
}

/// `ESC [ <digits/;> <final>`, e.g. `ESC [ 3 ~`.
fn decode_csi_params(buf: &[u8]) -> Decode {
    let body = &buf[2..];
    let Some(end) = body.iter().position(|b| (0x40..=0x7e).contains(b)) else {
        return if body.len() > MAX_CSI_PARAMS {
            Decode::token(KeyToken::esc(), buf.len())
        } else {
            Decode::Incomplete
        };
    };
    let consumed = 2 + end + 1;
    let name = match (&body[..end], body[end]) {
        (b"3", b'~') => KeyToken::DELETE,
        (b"1" | b"7", b'~') => "Home",
        (b"4" | b"8", b'~') => "End",
        (b"5", b'~') => "PageUp",
        (b"6", b'~') => "PageDown",
        (b"2", b'~') => "Insert",
        _ => {
            // Unknown sequence: fall back to the first byte after '['.
            return Decode::token(KeyToken::Char(char::from(buf[2]).to_string()), consumed);
        }
    };
    Decode::token(KeyToken::char(name), consumed)
}

/// Stateful decoder reading from a [`ByteSource`].
pub struct Decoder<S> {
    source: S,
    pending: Vec<u8>,
    retries: u32,
    retry_timeout: Duration,
    closed: bool,
}

impl<S: ByteSource> Decoder<S> {
    /// Create a decoder with explicit escape re-poll bounds.
    pub const fn new(source: S, retries: u32, retry_timeout: Duration) -> Self {
        Self {
            source,
            pending: Vec::new(),
            retries,
            retry_timeout,
            closed: false,
        }
    }

    /// Create a decoder using the re-poll bounds from `config`.
    pub const fn with_config(source: S, config: &RuntimeConfig) -> Self {
        Self::new(source, config.escape_retries, config.escape_retry_timeout)
    }

    /// Bytes received but not yet decoded.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Get a reference to the underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Produce the next token, blocking up to `timeout` when nothing is
    /// buffered.
    ///
    /// Returns `Refresh` when the wait elapses with no input and `Quit`
    /// once the source has closed and every buffered byte is used.
    pub fn next_token(&mut self, timeout: Duration) -> KeyToken {
        loop {
            if self.pending.is_empty() {
                if self.closed {
                    return KeyToken::Quit;
                }
                match self.source.poll(timeout) {
                    Poll::Bytes(bytes) => self.pending.extend_from_slice(&bytes),
                    Poll::Timeout => return KeyToken::Refresh,
                    Poll::Closed => {
                        self.closed = true;
                        return KeyToken::Quit;
                    }
                }
            }

            match self.decode_front() {
                Decode::Token { token, consumed } => {
                    self.pending.drain(..consumed);
                    if token.is_navigation() {
                        self.drain_repeats(&token);
                    }
                    return token;
                }
                Decode::Skip(consumed) => {
                    self.pending.drain(..consumed);
                }
                Decode::Empty | Decode::Incomplete => {}
            }
        }
    }

    /// Decode the front of the pending buffer, re-polling a bounded number
    /// of times if it ends inside a sequence.
    fn decode_front(&mut self) -> Decode {
        let mut attempts = 0;
        loop {
            match decode(&self.pending) {
                Decode::Incomplete => {}
                done => return done,
            }
            if self.closed || attempts >= self.retries {
                tracing::trace!(pending = ?self.pending, "truncated input sequence");
                return decode_truncated(&self.pending);
            }
            attempts += 1;
            match self.source.poll(self.retry_timeout) {
                Poll::Bytes(bytes) => self.pending.extend_from_slice(&bytes),
                Poll::Timeout => {}
                Poll::Closed => self.closed = true,
            }
        }
    }

    /// Pull whatever is already available without waiting.
    fn fill_available(&mut self) {
        while !self.closed {
            match self.source.try_read() {
                Poll::Bytes(bytes) => self.pending.extend_from_slice(&bytes),
                Poll::Timeout => break,
                Poll::Closed => self.closed = true,
            }
        }
    }

    /// Discard buffered repeats of `token` so held keys act once.
    fn drain_repeats(&mut self, token: &KeyToken) {
        self.fill_available();
        let mut drained = 0usize;
        while let Decode::Token {
            token: next,
            consumed,
        } = decode(&self.pending)
        {
            if next != *token {
                break;
            }
            self.pending.drain(..consumed);
            drained += 1;
        }
        if drained > 0 {
            tracing::trace!(key = %token, drained, "coalesced repeated key");
        }
    }
}
