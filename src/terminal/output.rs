//! `OutputBuffer`: Single-syscall output buffer for ANSI sequences.

use std::io::Write;

/// Clear the whole screen and home the cursor.
pub const CLEAR_AND_HOME: &[u8] = b"\x1b[2J\x1b[H";
/// Clear from the cursor to the end of the line.
pub const CLEAR_TO_EOL: &[u8] = b"\x1b[K";
/// Enable click tracking with SGR extended coordinates.
pub const MOUSE_ON: &[u8] = b"\x1b[?1000h\x1b[?1006h";
/// Disable click tracking and SGR coordinates.
pub const MOUSE_OFF: &[u8] = b"\x1b[?1000l\x1b[?1006l";

/// Pre-allocated buffer for building ANSI escape sequences.
///
/// All output is accumulated here, then flushed in a single `write()` syscall
/// to prevent terminal flickering.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical terminal (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Move the cursor to column 1 of `row` (1-indexed).
    #[inline]
    pub fn cursor_to_row(&mut self, row: usize) {
        // CSI row ; 1 H
        let _ = write!(self.data, "\x1b[{row};1H");
    }

    /// Clear from the cursor to the end of the line.
    #[inline]
    pub fn clear_to_eol(&mut self) {
        self.data.extend_from_slice(CLEAR_TO_EOL);
    }

    /// Clear the entire screen and home the cursor.
    #[inline]
    pub fn clear_screen(&mut self) {
        self.data.extend_from_slice(CLEAR_AND_HOME);
    }

    /// Replace row `row` (1-indexed) with `line`.
    #[inline]
    pub fn put_line(&mut self, row: usize, line: &str) {
        self.cursor_to_row(row);
        self.write_str(line);
        self.clear_to_eol();
    }

    /// Flush to a writer in a single syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
