//! The synthesized help modal opened by `?`.

use crate::input::KeyToken;
use crate::modal::{ModalFrame, ModalUi, TextModal, WidthSpec};
use crate::render::canvas::{display_width, fit_width};

/// Title of the help modal.
pub const HELP_TITLE: &str = "Help";

/// Keys that close the help modal without cancelling.
const HELP_CLOSE_KEYS: [&str; 3] = ["Enter", "?", "q"];

/// Two-column key list followed by the optional hint.
pub fn help_text(bindings: &[(String, String)], hint: Option<&str>) -> String {
    let key_width = bindings
        .iter()
        .map(|(key, _)| display_width(key))
        .max()
        .unwrap_or(0);

    let mut lines: Vec<String> = bindings
        .iter()
        .map(|(key, help)| format!("{}  {help}", fit_width(key, key_width)).trim_end().to_string())
        .collect();
    if lines.is_empty() {
        lines.push("No keys bound.".to_string());
    }
    lines.push(String::new());
    lines.push("?  this help    Esc  back    C-c  quit".to_string());
    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        lines.push(String::new());
        lines.extend(hint.lines().map(str::to_string));
    }
    lines.join("\n")
}

/// A read-only modal listing `bindings`.
pub fn help_frame<C: 'static>(bindings: &[(String, String)], hint: Option<&str>) -> ModalFrame<C> {
    let ui = ModalUi::new(HELP_TITLE).width(WidthSpec::Clamped {
        ratio: 0.5,
        min: 30,
        max: 72,
    });
    ModalFrame::builder(ui, TextModal, help_text(bindings, hint))
        .commit_keys(HELP_CLOSE_KEYS)
        .cancel_keys([KeyToken::ESC])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_text_aligns_keys() {
        let bindings = vec![
            ("q".to_string(), "quit".to_string()),
            ("C-r".to_string(), "reload".to_string()),
        ];
        let text = help_text(&bindings, Some("Tail follows the newest file."));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "q    quit");
        assert_eq!(lines[1], "C-r  reload");
        assert_eq!(lines.last(), Some(&"Tail follows the newest file."));
    }

    #[test]
    fn test_help_text_without_bindings() {
        assert!(help_text(&[], None).starts_with("No keys bound."));
    }

    #[test]
    fn test_help_frame_closes_on_its_keys() {
        let frame: ModalFrame<()> = help_frame(&[], None);
        assert_eq!(frame.title(), HELP_TITLE);
        assert!(frame.is_commit(&KeyToken::char("?")));
        assert!(frame.is_commit(&KeyToken::char("q")));
        assert!(frame.is_commit(&KeyToken::Enter));
        assert!(frame.is_cancel(&KeyToken::esc()));
    }
}
