//! Key tokens: the logical events produced by the decoder.

use std::borrow::Cow;
use std::fmt;

/// One decoded input event.
///
/// Produced once per decode call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Tab (also used as "next page").
    Tab,
    /// Shift+Tab (`ESC [ Z`).
    ShiftTab,
    /// Enter / Return (`\r` or `\n`).
    Enter,
    /// Backspace (DEL, 127).
    Backspace,
    /// A printable character, or a named key without its own variant
    /// (`"Esc"`, `"Delete"`).
    Char(String),
    /// Ctrl+letter, holding the lowercase letter.
    Control(char),
    /// A mouse click.
    Mouse {
        /// 1-based row.
        row: u16,
        /// 1-based column.
        col: u16,
        /// `true` when the button was released, i.e. a click completed.
        /// Press-only reports carry `false`.
        pressed: bool,
    },
    /// Idle tick or forced redraw. Carries no input.
    Refresh,
    /// The input stream ended.
    Quit,
}

impl KeyToken {
    /// Name of the bare Escape key as carried by [`KeyToken::Char`].
    pub const ESC: &'static str = "Esc";
    /// Name of the Delete key as carried by [`KeyToken::Char`].
    pub const DELETE: &'static str = "Delete";

    /// Convenience constructor for [`KeyToken::Char`].
    pub fn char(s: impl Into<String>) -> Self {
        Self::Char(s.into())
    }

    /// Bare Escape.
    pub fn esc() -> Self {
        Self::Char(Self::ESC.to_string())
    }

    /// Canonical name used by binding tables and modal commit/cancel sets.
    ///
    /// Characters name themselves; control keys are `C-<letter>`.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Up => Cow::Borrowed("Up"),
            Self::Down => Cow::Borrowed("Down"),
            Self::Left => Cow::Borrowed("Left"),
            Self::Right => Cow::Borrowed("Right"),
            Self::Tab => Cow::Borrowed("Tab"),
            Self::ShiftTab => Cow::Borrowed("S-Tab"),
            Self::Enter => Cow::Borrowed("Enter"),
            Self::Backspace => Cow::Borrowed("Backspace"),
            Self::Char(s) => Cow::Borrowed(s.as_str()),
            Self::Control(c) => Cow::Owned(format!("C-{c}")),
            Self::Mouse { .. } => Cow::Borrowed("Mouse"),
            Self::Refresh => Cow::Borrowed("Refresh"),
            Self::Quit => Cow::Borrowed("Quit"),
        }
    }

    /// Whether this token names the given key.
    pub fn is(&self, name: &str) -> bool {
        self.name() == name
    }

    /// Bare Escape (`Char("Esc")`). `"Escape"` is accepted as an alias.
    pub fn is_escape(&self) -> bool {
        matches!(self, Self::Char(s) if s == Self::ESC || s == "Escape")
    }

    /// Arrow keys and Tab: the keys whose auto-repeat gets coalesced.
    pub const fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::Up | Self::Down | Self::Left | Self::Right | Self::Tab | Self::ShiftTab
        )
    }

    /// Whether this token carries no input (idle tick).
    pub const fn is_refresh(&self) -> bool {
        matches!(self, Self::Refresh)
    }

    /// Canonical byte encoding, used to replay keys in tests and demos.
    ///
    /// Returns `None` for tokens with no byte form (`Refresh`, `Quit`).
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let bytes = match self {
            Self::Up => b"\x1b[A".to_vec(),
            Self::Down => b"\x1b[B".to_vec(),
            Self::Right => b"\x1b[C".to_vec(),
            Self::Left => b"\x1b[D".to_vec(),
            Self::Tab => vec![b'\t'],
            Self::ShiftTab => b"\x1b[Z".to_vec(),
            Self::Enter => vec![b'\r'],
            Self::Backspace => vec![127],
            Self::Char(s) if s == Self::ESC => vec![0x1b],
            Self::Char(s) if s == Self::DELETE => b"\x1b[3~".to_vec(),
            Self::Char(s) => s.as_bytes().to_vec(),
            Self::Control(c) if c.is_ascii_lowercase() => vec![*c as u8 - 96],
            Self::Mouse { row, col, pressed } => {
                let term = if *pressed { 'm' } else { 'M' };
                format!("\x1b[<0;{col};{row}{term}").into_bytes()
            }
            Self::Control(_) | Self::Refresh | Self::Quit => return None,
        };
        Some(bytes)
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
