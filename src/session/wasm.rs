//! WASM bindings for the editing session module.
//!
//! `JsScriptSession` is the surface a browser editor drives: explicit
//! commands in, derived views (sidebar, line map, records) out.

use js_sys::{Array, Uint8Array};
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

use crate::script::resolver::Anchor;
use crate::script::serialize::BlockRecord;
use crate::script::wasm::{js_result, to_js_value};
use crate::session::session::EditingSession;
use crate::session::sync::{SyncKind, DEBOUNCE_MS};

/// Suggested debounce window in milliseconds for host timers.
#[wasm_bindgen(js_name = debounceMs)]
pub fn debounce_ms() -> u32 {
    DEBOUNCE_MS
}

fn parse_sync_kind(kind: &str) -> Result<SyncKind, JsValue> {
    match kind {
        "content" => Ok(SyncKind::Content),
        "line_numbers" => Ok(SyncKind::LineNumbers),
        other => Err(JsValue::from_str(&format!(
            "unknown sync kind '{}' (expected 'content' or 'line_numbers')",
            other
        ))),
    }
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around EditingSession.
#[wasm_bindgen]
pub struct JsScriptSession {
    inner: EditingSession,
}

#[wasm_bindgen]
impl JsScriptSession {
    /// Creates a session over a fresh document with one empty scene.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const session = new JsScriptSession();
    /// const scene = session.activeScene();
    /// session.editLocation(scene, 'Office');
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsScriptSession {
        JsScriptSession {
            inner: EditingSession::new(),
        }
    }

    /// Opens a session over a previously saved binary document.
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: &[u8]) -> Result<JsScriptSession, JsValue> {
        let inner = js_result!(EditingSession::from_bytes(bytes))?;
        Ok(JsScriptSession { inner })
    }

    /// Opens a session over a structured record object.
    #[wasm_bindgen(js_name = fromRecord)]
    pub fn from_record(record: JsValue) -> Result<JsScriptSession, JsValue> {
        let record = from_value(record)?;
        let inner = js_result!(EditingSession::from_record(&record))?;
        Ok(JsScriptSession { inner })
    }

    /// Saves to binary bytes (returns Uint8Array).
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&mut self) -> Uint8Array {
        let bytes = self.inner.save();
        Uint8Array::from(&bytes[..])
    }

    /// Produces the structured record of the document.
    #[wasm_bindgen(js_name = serializeRecord)]
    pub fn serialize_record(&mut self) -> Result<JsValue, JsValue> {
        let record = js_result!(self.inner.serialize())?;
        Ok(to_js_value(&record)?)
    }

    /// Renders the plain-text export of the document.
    #[wasm_bindgen(js_name = renderText)]
    pub fn render_text(&mut self) -> Result<String, JsValue> {
        Ok(js_result!(self.inner.render_text())?)
    }

    /// Rendered-line table for the line-number gutter.
    #[wasm_bindgen(js_name = lineMap)]
    pub fn line_map(&mut self) -> Result<JsValue, JsValue> {
        let lines = js_result!(self.inner.line_map())?;
        Ok(to_js_value(&lines)?)
    }
}

// =============================================================================
// SELECTION & SIDEBAR
// =============================================================================

#[wasm_bindgen]
impl JsScriptSession {
    /// The currently selected scene key, or null.
    #[wasm_bindgen(js_name = activeScene)]
    pub fn active_scene(&self) -> Option<String> {
        self.inner.active_scene().map(str::to_string)
    }

    /// Selects a scene ("select Scene N" sidebar intent). Returns false
    /// when the key names no scene.
    #[wasm_bindgen(js_name = selectScene)]
    pub fn select_scene(&mut self, key: &str) -> Result<bool, JsValue> {
        Ok(js_result!(self.inner.select_scene(key))?)
    }

    /// Builds the sidebar index: `{key, number, location, active,
    /// has_bookmark}` per scene in document order.
    pub fn sidebar(&mut self) -> Result<JsValue, JsValue> {
        let summaries = js_result!(self.inner.sidebar())?;
        Ok(to_js_value(&summaries)?)
    }
}

// =============================================================================
// SCENE COMMANDS
// =============================================================================

#[wasm_bindgen]
impl JsScriptSession {
    /// Appends a new empty scene, selects it, and returns its key.
    #[wasm_bindgen(js_name = addScene)]
    pub fn add_scene(&mut self) -> Result<String, JsValue> {
        Ok(js_result!(self.inner.add_scene())?)
    }

    /// Inserts a new empty scene directly after the given one.
    #[wasm_bindgen(js_name = insertSceneAfter)]
    pub fn insert_scene_after(&mut self, after: &str) -> Result<String, JsValue> {
        Ok(js_result!(self.inner.insert_scene_after(after))?)
    }

    /// Deletes a scene. Fails when it is the last remaining scene.
    #[wasm_bindgen(js_name = deleteScene)]
    pub fn delete_scene(&mut self, key: &str) -> Result<(), JsValue> {
        js_result!(self.inner.delete_scene(key))?;
        Ok(())
    }

    /// Moves a scene to a new position in document order.
    #[wasm_bindgen(js_name = moveScene)]
    pub fn move_scene(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        js_result!(self.inner.move_scene(from, to))?;
        Ok(())
    }

    /// Edits a scene's heading location. Returns the deferred-sync token
    /// to complete after the debounce window.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const token = session.editLocation(scene, input.value);
    /// setTimeout(() => {
    ///   if (session.completeSync('content', token)) refreshSidebar();
    /// }, debounceMs());
    /// ```
    #[wasm_bindgen(js_name = editLocation)]
    pub fn edit_location(&mut self, key: &str, location: &str) -> Result<f64, JsValue> {
        let token = js_result!(self.inner.edit_location(key, location))?;
        Ok(token as f64)
    }

    /// Edits a scene's heading time setting.
    #[wasm_bindgen(js_name = editTimeSetting)]
    pub fn edit_time_setting(&mut self, key: &str, time_setting: &str) -> Result<(), JsValue> {
        js_result!(self.inner.edit_time_setting(key, time_setting))?;
        Ok(())
    }

    /// Edits a scene's hidden note.
    #[wasm_bindgen(js_name = editHiddenDescription)]
    pub fn edit_hidden_description(&mut self, key: &str, text: &str) -> Result<(), JsValue> {
        js_result!(self.inner.edit_hidden_description(key, text))?;
        Ok(())
    }

    /// Replaces a scene's opaque left-margin content.
    #[wasm_bindgen(js_name = setLeftContent)]
    pub fn set_left_content(&mut self, key: &str, content: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_left_content(key, content))?;
        Ok(())
    }
}

// =============================================================================
// BLOCK COMMANDS
// =============================================================================

#[wasm_bindgen]
impl JsScriptSession {
    /// Inserts a content block at the slot resolved from an anchor.
    ///
    /// The anchor mirrors [`Anchor`]: `'None'`, `{Block: {scene, index}}`,
    /// `{Heading: {scene}}` or `{SceneContent: {scene}}`. The block uses
    /// the structured-record shape. Returns the resolved `{scene, index}`.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const point = session.insertBlock(
    ///   { Block: { scene, index: 0 } },
    ///   { type: 'serifu', character: 'Mika', text: 'Hello' },
    /// );
    /// ```
    #[wasm_bindgen(js_name = insertBlock)]
    pub fn insert_block(&mut self, anchor: JsValue, block: JsValue) -> Result<JsValue, JsValue> {
        let anchor: Anchor = from_value(anchor)?;
        let record: BlockRecord = from_value(block)?;
        let point = js_result!(self.inner.insert_block(&anchor, record.to_block()))?;
        Ok(to_js_value(&point)?)
    }

    /// Removes the block at `index` in the given scene.
    #[wasm_bindgen(js_name = removeBlock)]
    pub fn remove_block(&mut self, key: &str, index: usize) -> Result<(), JsValue> {
        js_result!(self.inner.remove_block(key, index))?;
        Ok(())
    }

    /// Moves a block within a scene.
    #[wasm_bindgen(js_name = moveBlock)]
    pub fn move_block(&mut self, key: &str, from: usize, to: usize) -> Result<(), JsValue> {
        js_result!(self.inner.move_block(key, from, to))?;
        Ok(())
    }

    /// Replaces the text of a togaki or serifu block.
    #[wasm_bindgen(js_name = editBlockText)]
    pub fn edit_block_text(&mut self, key: &str, index: usize, text: &str) -> Result<(), JsValue> {
        js_result!(self.inner.edit_block_text(key, index, text))?;
        Ok(())
    }

    /// Replaces a serifu's speaker name.
    #[wasm_bindgen(js_name = editSpeaker)]
    pub fn edit_speaker(&mut self, key: &str, index: usize, name: &str) -> Result<(), JsValue> {
        js_result!(self.inner.edit_speaker(key, index, name))?;
        Ok(())
    }

    /// Sets the hidden flag of a togaki or serifu block.
    #[wasm_bindgen(js_name = setBlockHidden)]
    pub fn set_block_hidden(
        &mut self,
        key: &str,
        index: usize,
        hidden: bool,
    ) -> Result<(), JsValue> {
        js_result!(self.inner.set_block_hidden(key, index, hidden))?;
        Ok(())
    }
}

// =============================================================================
// HISTORY, BOOKMARKS & SYNC
// =============================================================================

#[wasm_bindgen]
impl JsScriptSession {
    /// Steps the document back one snapshot. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<bool, JsValue> {
        Ok(js_result!(self.inner.undo())?)
    }

    /// Steps the document forward one undone snapshot.
    pub fn redo(&mut self) -> Result<bool, JsValue> {
        Ok(js_result!(self.inner.redo())?)
    }

    /// True when an undo step is available.
    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    /// True when a redo step is available.
    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    /// Toggles the bookmark on a scene-local rendered line (gutter click).
    /// Returns whether the line is bookmarked afterwards.
    #[wasm_bindgen(js_name = toggleBookmark)]
    pub fn toggle_bookmark(&mut self, key: &str, line: usize) -> Result<bool, JsValue> {
        Ok(js_result!(self.inner.toggle_bookmark(key, line))?)
    }

    /// True when any line of the scene carries a bookmark.
    #[wasm_bindgen(js_name = hasBookmark)]
    pub fn has_bookmark(&self, key: &str) -> bool {
        self.inner.has_bookmark(key)
    }

    /// Bookmarked scene-local lines for a scene, in order.
    #[wasm_bindgen(js_name = bookmarkedLines)]
    pub fn bookmarked_lines(&self, key: &str) -> Array {
        let array = Array::new();
        for line in self.inner.bookmarked_lines(key) {
            array.push(&JsValue::from_f64(line as f64));
        }
        array
    }

    /// The pending deferred-sync token for `'content'` or
    /// `'line_numbers'`, or null.
    #[wasm_bindgen(js_name = pendingSync)]
    pub fn pending_sync(&self, kind: &str) -> Result<Option<f64>, JsValue> {
        let kind = parse_sync_kind(kind)?;
        Ok(self.inner.pending_sync(kind).map(|token| token as f64))
    }

    /// Reports a fired debounce timer. Returns true when the sync should
    /// run; false when it was superseded by a later edit.
    #[wasm_bindgen(js_name = completeSync)]
    pub fn complete_sync(&mut self, kind: &str, token: f64) -> Result<bool, JsValue> {
        let kind = parse_sync_kind(kind)?;
        Ok(self.inner.complete_sync(kind, token as u64))
    }
}
