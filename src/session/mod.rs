//! Editing session module.
//!
//! This module provides:
//! - `history`: Bounded undo/redo over whole-document snapshots
//! - `sync`: Cancel-and-reschedule bookkeeping for debounced refreshes
//! - `session`: EditingSession, the command surface a browser host drives
//! - `wasm`: WASM bindings for browser usage (JsScriptSession)

pub mod history;
pub mod session;
pub mod sync;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use history::{EditorHistory, HISTORY_CAPACITY};
pub use session::{EditingSession, SceneSummary};
pub use sync::{SyncKind, SyncScheduler, DEBOUNCE_MS};

#[cfg(feature = "wasm")]
pub use wasm::JsScriptSession;
