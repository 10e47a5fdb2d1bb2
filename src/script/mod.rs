//! Script document module.
//!
//! This module provides:
//! - `model`: Data structures for the screenplay (Scene, ContentBlock, SpeakerName)
//! - `manager`: ScriptManager with scene/block operations over the backing document
//! - `resolver`: Cursor-anchor to insertion-slot resolution
//! - `serialize`: Structured record, text export and line map
//! - `wasm`: WASM bindings for browser usage (JsScriptManager)

pub mod manager;
pub mod model;
pub mod resolver;
pub mod serialize;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use manager::{new_scene_key, ScriptManager};
pub use model::*;
pub use resolver::{resolve_insertion, Anchor, InsertionPoint};
pub use serialize::{
    deserialize, line_map, render_text, serialize, BlockRecord, LineEntry, SceneRecord,
    ScriptRecord,
};

#[cfg(feature = "wasm")]
pub use wasm::JsScriptManager;
