//! Kyakuhon - Structured screenplay document engine.
//!
//! This crate holds the content model of a browser-based screenplay
//! editor: scenes with headings (location, time, hidden notes) and ordered
//! bodies of typed content blocks (togaki action lines, serifu dialogue,
//! time-progress and page-break markers), with:
//!
//! - **Explicit command handlers**: every editing action is a method on
//!   [`EditingSession`] that mutates the document and deterministically
//!   triggers numbering, history and sync - nothing is inferred from
//!   observed tree mutations
//! - **Derived numbering**: scene display numbers always equal their
//!   position in document order, re-derived inside every structural
//!   mutation
//! - **Whole-document undo/redo**: a bounded snapshot history with
//!   redundant-commit suppression
//!
//! # Example
//!
//! ```rust
//! use kyakuhon::{Anchor, ContentBlock, EditingSession};
//!
//! // A fresh session seeds one scene; the document is never empty.
//! let mut session = EditingSession::new();
//! let scene = session.active_scene().unwrap().to_string();
//!
//! session.edit_location(&scene, "Office").unwrap();
//! session
//!     .insert_block(&Anchor::None, ContentBlock::togaki("He enters."))
//!     .unwrap();
//! session
//!     .insert_block(&Anchor::None, ContentBlock::serifu("Mika", "Hello"))
//!     .unwrap();
//!
//! // Structured record for persistence, plain text for export.
//! let record = session.serialize().unwrap();
//! assert_eq!(record.scenes[0].scene_id, "001");
//! assert!(session.render_text().unwrap().contains("Mika「Hello」"));
//!
//! // Undo steps the whole document back one snapshot.
//! session.undo().unwrap();
//! ```

pub mod error;

// Script document module
pub mod script;

// Editing session module
pub mod session;

// Re-exports for convenience
pub use error::{ScriptError, ScriptResult};
pub use script::{
    deserialize, format_speaker_name, line_map, render_text, resolve_insertion, serialize, Anchor,
    BlockRecord, ContentBlock, InsertionPoint, LineEntry, Scene, SceneRecord, ScriptManager,
    ScriptRecord, ScriptRoot, SpeakerName,
};
pub use session::{
    EditingSession, EditorHistory, SceneSummary, SyncKind, SyncScheduler, DEBOUNCE_MS,
    HISTORY_CAPACITY,
};

#[cfg(feature = "wasm")]
pub use script::JsScriptManager;

#[cfg(feature = "wasm")]
pub use session::JsScriptSession;
