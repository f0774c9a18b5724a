//! Frame writer: line-diff presentation of composed frames.
//!
//! This is the flicker-avoidance core:
//! 1. A frame identical to the previous one (same text, same size) writes
//!    nothing at all
//! 2. Otherwise only rows whose text changed are rewritten, each as
//!    cursor-to-row + text + clear-to-end-of-line
//! 3. The screen is cleared only for the first frame and after a size
//!    change, which invalidates the diff so every row is rewritten once
//!
//! All output for one frame is accumulated in an [`OutputBuffer`] and
//! flushed with one write.

use crate::terminal::{OutputBuffer, Size};
use std::io::{self, Write};
use std::time::Instant;

/// What one [`FrameWriter::present`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentResult {
    /// Rows rewritten.
    pub lines_changed: usize,
    /// Whether the screen was cleared first.
    pub full_redraw: bool,
    /// Bytes handed to the writer (0 when skipped).
    pub bytes: usize,
}

impl PresentResult {
    /// Whether nothing was written.
    pub const fn is_skipped(&self) -> bool {
        self.bytes == 0
    }
}

/// Presentation statistics, for the debug overlay and logging.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Frames presented, including skipped ones.
    pub frames: u64,
    /// Frames that wrote nothing.
    pub skipped: u64,
    /// Total rows rewritten.
    pub lines_written: u64,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Smoothed frames per second.
    pub fps: f64,
}

/// Rows of `new` that differ from `old`, 0-indexed.
///
/// Rows present only in `old` count as changed (they must be cleared).
pub fn diff_lines(old: &[&str], new: &[&str]) -> Vec<usize> {
    (0..old.len().max(new.len()))
        .filter(|&i| old.get(i) != new.get(i))
        .collect()
}

/// Writes frames to a terminal, diffing against the previous one.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    writer: W,
    output: OutputBuffer,
    previous: Option<(String, Size)>,
    stats: FrameStats,
    last_frame_at: Option<Instant>,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writer. The first present clears the screen.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            output: OutputBuffer::new(),
            previous: None,
            stats: FrameStats::default(),
            last_frame_at: None,
        }
    }

    /// Present one frame composed for `size`.
    pub fn present(&mut self, text: &str, size: Size) -> io::Result<PresentResult> {
        self.record_frame();

        let full_redraw = match &self.previous {
            Some((prev_text, prev_size)) if *prev_size == size => {
                if prev_text == text {
                    self.stats.skipped += 1;
                    return Ok(PresentResult::default());
                }
                false
            }
            _ => true,
        };

        self.output.clear();
        let new_lines: Vec<&str> = text.lines().collect();
        let lines_changed = if full_redraw {
            tracing::trace!(?size, "full redraw");
            self.output.clear_screen();
            for (row, line) in new_lines.iter().enumerate() {
                self.output.put_line(row + 1, line);
            }
            new_lines.len()
        } else {
            let old_lines: Vec<&str> = self
                .previous
                .as_ref()
                .map(|(prev, _)| prev.lines().collect())
                .unwrap_or_default();
            let changed = diff_lines(&old_lines, &new_lines);
            for &row in &changed {
                self.output
                    .put_line(row + 1, new_lines.get(row).copied().unwrap_or(""));
            }
            changed.len()
        };

        self.output.flush_to(&mut self.writer)?;
        let bytes = self.output.len();
        self.previous = Some((text.to_string(), size));

        self.stats.lines_written += lines_changed as u64;
        self.stats.bytes_written += bytes as u64;

        Ok(PresentResult {
            lines_changed,
            full_redraw,
            bytes,
        })
    }

    /// Forget the previous frame so the next present redraws everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Presentation statistics.
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// The underlying writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Mutable access to the underlying writer.
    pub const fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn record_frame(&mut self) {
        let now = Instant::now();
        self.stats.frames += 1;
        if let Some(last) = self.last_frame_at.replace(now) {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let instant = 1.0 / dt;
                // Smoothed average
                self.stats.fps = if self.stats.fps == 0.0 {
                    instant
                } else {
                    self.stats.fps.mul_add(15.0, instant) / 16.0
                };
            }
        }
    }
}
