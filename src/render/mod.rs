//! Frame composition and presentation.
//!
//! Per tick the driver builds one text frame and hands it to the
//! [`FrameWriter`]:
//!
//! ```text
//! page view ──▶ Chrome::compose ──▶ narrow banner ──▶ trim_to_rows
//!                                                        │
//!                         modal layers ──▶ ModalRenderer ◀┘
//!                                                        │
//!                                            FrameWriter::present ──▶ terminal
//! ```

pub mod canvas;
mod chrome;
mod frame;

pub use canvas::{Canvas, Cell, CellFlags};
pub use chrome::{footer_lines, narrow_banner, trim_to_rows, Chrome, MORE};
pub use frame::{diff_lines, FrameStats, FrameWriter, PresentResult};
