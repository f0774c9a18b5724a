//! Modal overlays: frames, the stack that owns them, and compositing.
//!
//! While the stack is non-empty it captures all input, and only its top
//! frame sees keys. Frames leave through commit/cancel keys, a close
//! requested from their own handler, or [`ModalStack::close_top`]; in every
//! case their close callback fires exactly once.

mod compose;
mod frame;
mod stack;
mod width;

pub use compose::{BoxCompositor, ModalLayer, ModalRenderer};
pub use frame::{
    CloseCx, ModalCx, ModalFrame, ModalFrameBuilder, ModalOutcome, ModalUi, ModalView, TextModal,
};
pub use stack::ModalStack;
pub use width::WidthSpec;
