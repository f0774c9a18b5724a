//! Page chrome: title, separator, body and key-help footer.
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Title                          12.0 fps│  title line (+ debug overlay)
//! │────────────────────────────────────────│  separator
//! │ page body ...                          │
//! │                                        │  padding keeps the footer low
//! │ j down  k up  / search  more…          │  footer, capped
//! └────────────────────────────────────────┘
//! ```

use super::canvas::{display_width, fit_width, truncate_width};
use crate::terminal::Size;

/// Marker appended to a footer that had to drop bindings.
pub const MORE: &str = "more…";

const FOOTER_GAP: &str = "  ";

/// Everything needed to draw one page frame.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    /// Title line text.
    pub title: &'a str,
    /// Right-aligned on the title line when set.
    pub overlay: Option<&'a str>,
    /// Rendered page body.
    pub body: &'a str,
    /// `(key, help)` pairs for the footer.
    pub bindings: &'a [(String, String)],
    /// Footer line cap.
    pub footer_max_lines: usize,
    /// Use `-` instead of `─` for the separator.
    pub ascii: bool,
}

impl Chrome<'_> {
    /// Compose the frame for `size`, footer on the last rows when the body
    /// leaves room.
    pub fn compose(&self, size: Size) -> String {
        let cols = usize::from(size.cols);
        let footer = footer_lines(self.bindings, cols, self.footer_max_lines);

        let mut lines = Vec::with_capacity(usize::from(size.rows));
        lines.push(title_line(self.title, self.overlay, cols));
        lines.push((if self.ascii { "-" } else { "─" }).repeat(cols));
        lines.extend(self.body.lines().map(|l| truncate_width(l, cols).to_string()));

        let used = lines.len() + footer.len();
        let rows = usize::from(size.rows);
        if used < rows {
            lines.resize(rows - footer.len(), String::new());
        }
        lines.extend(footer);
        lines.join("\n")
    }
}

fn title_line(title: &str, overlay: Option<&str>, cols: usize) -> String {
    match overlay {
        Some(overlay) if display_width(overlay) < cols => {
            let overlay_width = display_width(overlay);
            let mut line = fit_width(title, cols - overlay_width);
            line.push_str(overlay);
            line
        }
        _ => truncate_width(title, cols).to_string(),
    }
}

/// Word-wrap `(key, help)` pairs into at most `max_lines` lines of `width`
/// columns.
///
/// Pairs are never split across lines. When some do not fit, the last
/// line ends with [`MORE`].
pub fn footer_lines(bindings: &[(String, String)], width: usize, max_lines: usize) -> Vec<String> {
    if max_lines == 0 || width == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut truncated = false;

    for (key, help) in bindings {
        let item = if help.is_empty() {
            key.clone()
        } else {
            format!("{key} {help}")
        };
        let item = truncate_width(&item, width).to_string();

        if current.is_empty() {
            current = item;
        } else if display_width(&current) + FOOTER_GAP.len() + display_width(&item) <= width {
            current.push_str(FOOTER_GAP);
            current.push_str(&item);
        } else {
            lines.push(std::mem::replace(&mut current, item));
            if lines.len() == max_lines {
                truncated = true;
                break;
            }
        }
    }

    if !truncated && !current.is_empty() {
        lines.push(current);
    }
    if truncated {
        if let Some(last) = lines.last_mut() {
            append_more(last, width);
        }
    }
    lines
}

/// Drop trailing items from `line` until the "more…" marker fits.
fn append_more(line: &mut String, width: usize) {
    let marker_width = display_width(MORE);
    while !line.is_empty() && display_width(line) + FOOTER_GAP.len() + marker_width > width {
        match line.rfind(FOOTER_GAP) {
            Some(cut) => line.truncate(cut),
            None => line.clear(),
        }
    }
    if !line.is_empty() {
        line.push_str(FOOTER_GAP);
    }
    line.push_str(truncate_width(MORE, width));
}

/// One-line warning shown above everything while the terminal is narrower
/// than `threshold`.
pub fn narrow_banner(cols: u16, threshold: u16) -> String {
    let text = format!("! Terminal too narrow: {cols} columns, {threshold} recommended");
    truncate_width(&text, usize::from(cols)).to_string()
}

/// Cut `text` to `rows` lines, keeping the first `rows - 1` and the last.
pub fn trim_to_rows(text: &str, rows: u16) -> String {
    let rows = usize::from(rows);
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= rows {
        return text.to_string();
    }
    if rows == 0 {
        return String::new();
    }
    let mut kept: Vec<&str> = lines[..rows - 1].to_vec();
    if let Some(last) = lines.last() {
        kept.push(last);
    }
    kept.join("\n")
}
