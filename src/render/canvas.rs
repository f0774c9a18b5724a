//! Canvas: a grapheme grid for compositing modal boxes over text.
//!
//! Page and chrome output is plain text. To draw a box over it without
//! splitting wide characters, the text is laid out onto a grid of cells,
//! boxes are written on top, and the grid is read back as lines.
//!
//! ```text
//! "日本 ok"  →  [日][··][本][··][ ][o][k]
//!                    └─ WIDE_CONTINUATION
//! ```
//!
//! Overwriting either half of a wide character blanks the other half, so
//! the grid never holds a dangling continuation.

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Start of a dimmed run (SGR 2).
pub const DIM_ON: &str = "\x1b[2m";
/// End of a dimmed run (SGR 22, normal intensity).
pub const DIM_OFF: &str = "\x1b[22m";

bitflags! {
    /// Per-cell rendering flags.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Rendered at reduced intensity.
        const DIM = 0b0000_0001;
        /// Right half of a double-width grapheme. Holds no text of its own.
        const WIDE_CONTINUATION = 0b0000_0010;
    }
}

impl std::fmt::Debug for CellFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// A single grid cell.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Cell {
    symbol: String,
    width: u8,
    flags: CellFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(CellFlags::empty())
    }
}

impl Cell {
    /// A space with the given flags.
    pub fn blank(flags: CellFlags) -> Self {
        Self {
            symbol: " ".to_string(),
            width: 1,
            flags,
        }
    }

    const fn continuation(flags: CellFlags) -> Self {
        Self {
            symbol: String::new(),
            width: 0,
            flags: flags.union(CellFlags::WIDE_CONTINUATION),
        }
    }

    /// The grapheme, empty for continuation cells.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display width (0 for continuations).
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Cell flags.
    pub const fn flags(&self) -> CellFlags {
        self.flags
    }

    /// Whether this is the right half of a wide grapheme.
    pub const fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    fn is_blank(&self) -> bool {
        self.symbol == " "
    }
}

/// A fixed-size grid of cells, row-major.
#[derive(Clone, Debug)]
pub struct Canvas {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
}

impl Canvas {
    /// A blank canvas.
    pub fn new(width: u16, height: u16) -> Self {
        let len = usize::from(width) * usize::from(height);
        Self {
            cells: vec![Cell::default(); len],
            width,
            height,
        }
    }

    /// Lay out text onto a canvas, one line per row, clipping what does
    /// not fit.
    pub fn from_text(text: &str, width: u16, height: u16) -> Self {
        let mut canvas = Self::new(width, height);
        for (y, line) in text.lines().take(usize::from(height)).enumerate() {
            // `take(height)` keeps `y` below `height`.
            #[allow(clippy::cast_possible_truncation)]
            let y = y as u16;
            canvas.put_str(0, y, line, CellFlags::empty());
        }
        canvas
    }

    /// Width in columns.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Linear index of `(x, y)`, or `None` if out of bounds.
    #[inline]
    pub fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }

    /// The cell at `(x, y)`.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Write one grapheme at `(x, y)`. Returns its display width, or 0 if
    /// out of bounds.
    ///
    /// A wide grapheme in the last column is replaced by a space.
    pub fn set_grapheme(&mut self, x: u16, y: u16, grapheme: &str, flags: CellFlags) -> u8 {
        let Some(idx) = self.index_of(x, y) else {
            return 0;
        };
        let width = u8::try_from(grapheme.width().min(2)).unwrap_or(1).max(1);

        self.release(x, y);
        if width == 2 {
            match self.index_of(x + 1, y) {
                Some(next) => {
                    self.release(x + 1, y);
                    self.cells[next] = Cell::continuation(flags);
                }
                None => {
                    self.cells[idx] = Cell::blank(flags);
                    return 1;
                }
            }
        }
        self.cells[idx] = Cell {
            symbol: grapheme.to_string(),
            width,
            flags,
        };
        width
    }

    /// Write a string starting at `(x, y)`, clipped to the row.
    ///
    /// Returns the number of columns written.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, flags: CellFlags) -> u16 {
        let mut col = x;
        for grapheme in s.graphemes(true) {
            if col >= self.width {
                break;
            }
            let written = self.set_grapheme(col, y, grapheme, flags);
            col = col.saturating_add(u16::from(written));
        }
        col - x
    }

    /// Add `flag` to every cell.
    pub fn add_flags(&mut self, flag: CellFlags) {
        for cell in &mut self.cells {
            cell.flags.insert(flag);
        }
    }

    /// Read the grid back as lines.
    ///
    /// Trailing blanks are trimmed. Dimmed runs are wrapped in
    /// [`DIM_ON`]/[`DIM_OFF`].
    pub fn to_lines(&self) -> Vec<String> {
        let width = usize::from(self.width);
        if width == 0 {
            return vec![String::new(); usize::from(self.height)];
        }
        self.cells
            .chunks(width)
            .map(|row| {
                let end = row
                    .iter()
                    .rposition(|c| !c.is_blank() && !c.is_wide_continuation())
                    .map_or(0, |i| i + 1);
                let mut line = String::with_capacity(end);
                let mut dim = false;
                for cell in &row[..end] {
                    if cell.is_wide_continuation() {
                        continue;
                    }
                    let cell_dim = cell.flags.contains(CellFlags::DIM);
                    if cell_dim != dim {
                        line.push_str(if cell_dim { DIM_ON } else { DIM_OFF });
                        dim = cell_dim;
                    }
                    line.push_str(&cell.symbol);
                }
                if dim {
                    line.push_str(DIM_OFF);
                }
                line
            })
            .collect()
    }

    /// Read the grid back as newline-joined text.
    pub fn to_text(&self) -> String {
        self.to_lines().join("\n")
    }

    /// Blank whatever wide-character half pairs with the cell at `(x, y)`.
    fn release(&mut self, x: u16, y: u16) {
        let Some(idx) = self.index_of(x, y) else {
            return;
        };
        let cell = &self.cells[idx];
        let flags = cell.flags - CellFlags::WIDE_CONTINUATION;
        if cell.is_wide_continuation() {
            if let Some(head) = x.checked_sub(1).and_then(|hx| self.index_of(hx, y)) {
                self.cells[head] = Cell::blank(self.cells[head].flags);
            }
            self.cells[idx] = Cell::blank(flags);
        } else if cell.width == 2 {
            if let Some(tail) = self.index_of(x + 1, y) {
                self.cells[tail] = Cell::blank(flags);
            }
        }
    }
}

/// Display width of `s` in terminal columns.
pub fn display_width(s: &str) -> usize {
    s.width()
}

/// Truncate `s` to at most `width` columns without splitting a grapheme.
pub fn truncate_width(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, grapheme) in s.grapheme_indices(true) {
        let w = grapheme.width();
        if used + w > width {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Truncate or pad `s` with spaces to exactly `width` columns.
pub fn fit_width(s: &str, width: usize) -> String {
    let cut = truncate_width(s, width);
    let mut out = String::with_capacity(width + cut.len());
    out.push_str(cut);
    for _ in display_width(cut)..width {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_round_trips_plain_lines() {
        let canvas = Canvas::from_text("hello\nworld", 10, 3);
        assert_eq!(canvas.to_lines(), ["hello", "world", ""]);
    }

    #[test]
    fn test_from_text_clips() {
        let canvas = Canvas::from_text("abcdef\n1\n2\n3", 4, 2);
        assert_eq!(canvas.to_lines(), ["abcd", "1"]);
    }

    #[test]
    fn test_wide_grapheme_uses_two_cells() {
        let canvas = Canvas::from_text("日本", 10, 1);
        assert_eq!(canvas.get(0, 0).map(Cell::symbol), Some("日"));
        assert!(canvas.get(1, 0).is_some_and(Cell::is_wide_continuation));
        assert_eq!(canvas.get(2, 0).map(Cell::symbol), Some("本"));
        assert_eq!(canvas.to_text(), "日本");
    }

    #[test]
    fn test_wide_grapheme_in_last_column_becomes_space() {
        let canvas = Canvas::from_text("ab日", 3, 1);
        assert_eq!(canvas.to_text(), "ab");
    }

    #[test]
    fn test_overwriting_continuation_blanks_head() {
        let mut canvas = Canvas::from_text("日x", 10, 1);
        canvas.put_str(1, 0, "|", CellFlags::empty());
        assert_eq!(canvas.to_text(), " |x");
    }

    #[test]
    fn test_overwriting_head_blanks_continuation() {
        let mut canvas = Canvas::from_text("日x", 10, 1);
        canvas.put_str(0, 0, "|", CellFlags::empty());
        assert_eq!(canvas.to_text(), "| x");
    }

    #[test]
    fn test_dim_runs() {
        let mut canvas = Canvas::from_text("abcdef", 6, 1);
        canvas.add_flags(CellFlags::DIM);
        canvas.put_str(2, 0, "XY", CellFlags::empty());
        assert_eq!(canvas.to_text(), "\x1b[2mab\x1b[22mXY\x1b[2mef\x1b[22m");
    }

    #[test]
    fn test_put_str_returns_columns() {
        let mut canvas = Canvas::new(5, 1);
        assert_eq!(canvas.put_str(1, 0, "日本語", CellFlags::empty()), 4);
        assert_eq!(canvas.put_str(9, 0, "x", CellFlags::empty()), 0);
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("abc", 5), "abc  ");
        assert_eq!(fit_width("abcdef", 3), "abc");
        assert_eq!(fit_width("日本", 3), "日 ");
        assert_eq!(truncate_width("héllo", 2), "hé");
        assert_eq!(display_width("日本"), 4);
    }
}
