//! Input: raw bytes in, [`KeyToken`]s out.
//!
//! ```text
//! ┌──────────────┐  Vec<u8>  ┌──────────────┐  KeyToken  ┌──────────┐
//! │ Input Thread │ ────────▶ │   Decoder    │ ─────────▶ │  Driver  │
//! └──────────────┘           └──────────────┘            └──────────┘
//! ```

mod decoder;
mod key;
mod source;

pub use decoder::{decode, decode_truncated, Decode, Decoder};
pub use key::KeyToken;
pub use source::{ByteSource, Poll, ScriptedSource, StdinSource};
