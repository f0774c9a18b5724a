//! Background work and how it reaches the render loop.
//!
//! The driver thread is the only writer of page state, modal state and the
//! previous frame. Everything else runs as a page-scoped task and may only
//! ask for a redraw:
//!
//! ```text
//! ┌──────────────┐   notify()    ┌──────────────┐  should_refresh()  ┌──────────────┐
//! │ Task threads │ ────────────▶ │   Notifier   │ ◀───────────────── │ Driver loop  │
//! │ (TaskScope)  │               │ (debounced)  │                    │ (one writer) │
//! └──────────────┘               └──────────────┘                    └──────────────┘
//!        ▲                                                                  │
//!        └───────────────── cancel + join when the page ends ───────────────┘
//! ```

mod notifier;
mod scope;

pub use notifier::Notifier;
pub use scope::{TaskCtx, TaskScope, Tick};
