//! Compositing modal boxes over the page.

use super::frame::ModalUi;
use crate::render::canvas::{display_width, fit_width, truncate_width, Canvas, CellFlags};
use crate::terminal::Size;
use std::fmt;

/// Render snapshot of one open frame.
pub struct ModalLayer<'a> {
    ui: &'a ModalUi,
    body: Box<dyn Fn(Size) -> String + 'a>,
}

impl<'a> ModalLayer<'a> {
    /// Pair frame metadata with a body renderer.
    pub fn new<F>(ui: &'a ModalUi, body: F) -> Self
    where
        F: Fn(Size) -> String + 'a,
    {
        Self {
            ui,
            body: Box::new(body),
        }
    }

    /// Frame metadata.
    pub const fn ui(&self) -> &ModalUi {
        self.ui
    }

    /// Render the body for the given interior size.
    pub fn render(&self, size: Size) -> String {
        (self.body)(size)
    }
}

impl fmt::Debug for ModalLayer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalLayer")
            .field("ui", self.ui)
            .finish_non_exhaustive()
    }
}

/// Draws modal layers over base text.
pub trait ModalRenderer {
    /// Composite `layers` (bottom first) over `base` for a terminal of
    /// `size`.
    fn composite(&self, base: &str, layers: &[ModalLayer<'_>], size: Size) -> String;
}

struct Borders {
    top_left: &'static str,
    top_right: &'static str,
    bottom_left: &'static str,
    bottom_right: &'static str,
    horizontal: &'static str,
    vertical: &'static str,
}

const UNICODE_BORDERS: Borders = Borders {
    top_left: "┌",
    top_right: "┐",
    bottom_left: "└",
    bottom_right: "┘",
    horizontal: "─",
    vertical: "│",
};

const ASCII_BORDERS: Borders = Borders {
    top_left: "+",
    top_right: "+",
    bottom_left: "+",
    bottom_right: "+",
    horizontal: "-",
    vertical: "|",
};

/// Smallest box that still has a one-column interior.
const MIN_BOX_WIDTH: u16 = 5;

/// Default renderer: a bordered box per layer, centered vertically and
/// centered or pinned horizontally.
///
/// ```text
/// ┌─ Title ──────────┐
/// │ body line        │
/// └──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxCompositor {
    ascii: bool,
}

impl BoxCompositor {
    /// Box-drawing borders, or ASCII ones when `ascii` is set.
    pub const fn new(ascii: bool) -> Self {
        Self { ascii }
    }

    const fn borders(&self) -> &'static Borders {
        if self.ascii {
            &ASCII_BORDERS
        } else {
            &UNICODE_BORDERS
        }
    }

    fn draw(&self, canvas: &mut Canvas, layer: &ModalLayer<'_>) {
        let (cols, rows) = (canvas.width(), canvas.height());
        if cols < MIN_BOX_WIDTH || rows < 3 {
            return;
        }
        let b = self.borders();
        let ui = layer.ui();

        if ui.dim_background {
            canvas.add_flags(CellFlags::DIM);
        }

        let width = ui.resolve_width(cols).clamp(MIN_BOX_WIDTH, cols);
        let inner = usize::from(width - 4);
        let body = layer.render(Size::new(rows - 2, width - 4));
        let mut lines: Vec<&str> = body.lines().take(usize::from(rows - 2)).collect();
        if lines.is_empty() {
            lines.push("");
        }

        // `lines` is capped at `rows - 2`, so this fits in u16.
        #[allow(clippy::cast_possible_truncation)]
        let height = lines.len() as u16 + 2;
        let top = (rows - height) / 2;
        let left = ui.left.unwrap_or((cols - width) / 2).min(cols - width);

        let title = truncate_width(&ui.title, inner.saturating_sub(2));
        let mut header = format!("{}{}", b.top_left, b.horizontal);
        if !title.is_empty() {
            header.push(' ');
            header.push_str(title);
            header.push(' ');
        }
        let fill = usize::from(width).saturating_sub(display_width(&header) + 1);
        header.push_str(&b.horizontal.repeat(fill));
        header.push_str(b.top_right);
        canvas.put_str(left, top, &header, CellFlags::empty());

        for (i, line) in lines.iter().enumerate() {
            let row = format!("{} {} {}", b.vertical, fit_width(line, inner), b.vertical);
            #[allow(clippy::cast_possible_truncation)]
            let y = top + 1 + i as u16;
            canvas.put_str(left, y, &row, CellFlags::empty());
        }

        let footer = format!(
            "{}{}{}",
            b.bottom_left,
            b.horizontal.repeat(usize::from(width - 2)),
            b.bottom_right
        );
        canvas.put_str(left, top + height - 1, &footer, CellFlags::empty());
    }
}

impl ModalRenderer for BoxCompositor {
    fn composite(&self, base: &str, layers: &[ModalLayer<'_>], size: Size) -> String {
        let mut canvas = Canvas::from_text(base, size.cols, size.rows);
        for layer in layers {
            self.draw(&mut canvas, layer);
        }
        canvas.to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::WidthSpec;

    fn base(size: Size) -> String {
        vec![".".repeat(usize::from(size.cols)); usize::from(size.rows)].join("\n")
    }

    #[test]
    fn test_centered_box() {
        let size = Size::new(7, 40);
        let ui = ModalUi::new("Hi").width(WidthSpec::Fixed(20));
        let layer = ModalLayer::new(&ui, |_| "hello".to_string());

        let out = BoxCompositor::new(false).composite(&base(size), &[layer], size);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2], format!("{}┌─ Hi ─────────────┐{}", ".".repeat(10), ".".repeat(10)));
        assert_eq!(lines[3], format!("{}│ hello            │{}", ".".repeat(10), ".".repeat(10)));
        assert_eq!(lines[4], format!("{}└──────────────────┘{}", ".".repeat(10), ".".repeat(10)));
        assert_eq!(lines[0], ".".repeat(40));
    }

    #[test]
    fn test_pinned_left_and_ascii() {
        let size = Size::new(5, 30);
        let ui = ModalUi::new("A").left(2).width(WidthSpec::Fixed(10));
        let layer = ModalLayer::new(&ui, |_| "x".to_string());

        let out = BoxCompositor::new(true).composite(&base(size), &[layer], size);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[1].starts_with("..+- A ----+"));
        assert!(lines[2].starts_with("..| x      |"));
    }

    #[test]
    fn test_body_sees_interior_size() {
        let size = Size::new(10, 50);
        let ui = ModalUi::new("t").width(WidthSpec::Fixed(24));
        let layer = ModalLayer::new(&ui, |inner: Size| format!("{}x{}", inner.cols, inner.rows));

        let out = BoxCompositor::default().composite("", &[layer], size);
        assert!(out.contains("20x8"));
    }

    #[test]
    fn test_dim_background() {
        let size = Size::new(5, 30);
        let ui = ModalUi::new("t").dimmed();
        let layer = ModalLayer::new(&ui, |_| String::new());

        let out = BoxCompositor::default().composite(&base(size), &[layer], size);
        assert!(out.starts_with("\x1b[2m"));
    }

    #[test]
    fn test_tiny_terminal_is_left_alone() {
        let size = Size::new(2, 4);
        let ui = ModalUi::new("t");
        let layer = ModalLayer::new(&ui, |_| "body".to_string());

        let out = BoxCompositor::default().composite("ab\ncd", &[layer], size);
        assert_eq!(out, "ab\ncd");
    }
}
