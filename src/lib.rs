//! # Pagewheel
//!
//! A page-and-modal runtime for terminal dashboards.
//!
//! Pagewheel turns raw terminal input into key tokens, redraws only the
//! lines that changed, and drives one page at a time with a stack of modal
//! overlays on top. When a page asks to navigate, control returns to the
//! caller, which decides what to mount next.
//!
//! ## Core Concepts
//!
//! - **Byte-level decoding**: escape, CSI and mouse sequences with bounded
//!   re-polling and held-key coalescing
//! - **Line-diff rendering**: identical frames write nothing, changed rows
//!   are rewritten in place
//! - **Modal stack**: the top frame captures every key until it commits or
//!   cancels
//! - **Value navigation**: handlers return their state with a pending
//!   `Goto`/`Back`/`Quit` instead of jumping
//! - **Scoped background work**: page tasks are cancelled when the page
//!   ends and only ever ask for a redraw through the notifier
//!
//! ## Example
//!
//! ```rust,ignore
//! use pagewheel::{Driver, Outcome, RuntimeConfig, TerminalSession};
//!
//! let config = RuntimeConfig::from_env()?;
//! pagewheel::logging::init_logging(&config);
//! let session = TerminalSession::enter(&config)?;
//! let mut driver = Driver::stdio(config)?;
//! driver.set_resize_flag(session.resize_flag());
//!
//! let mut current = "home".to_string();
//! loop {
//!     let outcome = match current.as_str() {
//!         "home" => driver.run(&HomePage)?,
//!         _ => driver.run(&LogsPage::default())?,
//!     };
//!     match outcome {
//!         Outcome::Quit => break,
//!         Outcome::SwitchTo(name) if name == Outcome::BACK => current = "home".into(),
//!         Outcome::SwitchTo(name) => current = name,
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod keymap;
pub mod logging;
pub mod modal;
pub mod nav;
pub mod page;
pub mod render;
pub mod terminal;

// Re-exports for convenience
pub use actor::{Notifier, TaskCtx, TaskScope};
pub use config::RuntimeConfig;
pub use driver::{Driver, Outcome};
pub use error::{Error, Result};
pub use input::{ByteSource, Decoder, KeyToken, ScriptedSource, StdinSource};
pub use keymap::{BindingStack, KeyRegistry};
pub use modal::{ModalCx, ModalFrame, ModalOutcome, ModalStack, ModalUi, ModalView, TextModal, WidthSpec};
pub use nav::{Navigation, Pending};
pub use page::{Decorated, Focus, KeyBinding, Page, PageCx};
pub use terminal::{Size, SizeProber, TerminalSession};
