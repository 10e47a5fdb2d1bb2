//! WASM bindings for the script document module.
//!
//! This module provides JavaScript-friendly wrappers around the core
//! ScriptManager and related types for use in browser environments.

use js_sys::Uint8Array;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

use super::manager::ScriptManager;
use super::serialize::{self, BlockRecord};
use crate::error::ScriptError;

/// Serialize a value to JsValue with HashMaps as plain JS objects (not Map).
pub(crate) fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<ScriptError> for JsValue {
    fn from(err: ScriptError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: ScriptError| JsValue::from(e))
    };
}

pub(crate) use js_result;

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around ScriptManager.
///
/// Exposes the raw document operations. Most hosts should prefer
/// `JsScriptSession`, which adds selection, undo history, bookmarks and
/// debounced-sync bookkeeping on top.
#[wasm_bindgen]
pub struct JsScriptManager {
    inner: ScriptManager,
}

#[wasm_bindgen]
impl JsScriptManager {
    /// Creates a new script document seeded with a single empty scene.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const manager = new JsScriptManager();
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsScriptManager {
        JsScriptManager {
            inner: ScriptManager::new(),
        }
    }

    /// Loads from binary bytes (Uint8Array).
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: &[u8]) -> Result<JsScriptManager, JsValue> {
        let inner = js_result!(ScriptManager::from_bytes(bytes))?;
        Ok(JsScriptManager { inner })
    }

    /// Saves to binary bytes (returns Uint8Array).
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&mut self) -> Uint8Array {
        let bytes = self.inner.save();
        Uint8Array::from(&bytes[..])
    }

    /// Gets the full document state as a JavaScript object.
    ///
    /// Returns an object with `scene_order` (array of keys) and `scenes`
    /// (map of key -> Scene).
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&mut self) -> Result<JsValue, JsValue> {
        let state = js_result!(self.inner.get_state())?;
        Ok(to_js_value(&state)?)
    }

    /// Gets the actor ID for this document instance.
    #[wasm_bindgen(js_name = actorId)]
    pub fn actor_id(&self) -> String {
        self.inner.actor_id()
    }

    /// Produces the structured record of the document.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const record = manager.serializeRecord();
    /// console.log(record.scenes[0].scene_id); // "001"
    /// ```
    #[wasm_bindgen(js_name = serializeRecord)]
    pub fn serialize_record(&mut self) -> Result<JsValue, JsValue> {
        let state = js_result!(self.inner.get_state())?;
        Ok(to_js_value(&serialize::serialize(&state))?)
    }

    /// Renders the plain-text export of the document.
    #[wasm_bindgen(js_name = renderText)]
    pub fn render_text(&mut self) -> Result<String, JsValue> {
        let state = js_result!(self.inner.get_state())?;
        Ok(serialize::render_text(&state))
    }
}

// =============================================================================
// SCENE METHODS
// =============================================================================

#[wasm_bindgen]
impl JsScriptManager {
    /// Appends a new empty scene and returns its key.
    #[wasm_bindgen(js_name = addScene)]
    pub fn add_scene(&mut self) -> Result<String, JsValue> {
        Ok(js_result!(self.inner.add_scene(Default::default()))?)
    }

    /// Inserts a new empty scene at a position and returns its key.
    #[wasm_bindgen(js_name = insertSceneAt)]
    pub fn insert_scene_at(&mut self, index: usize) -> Result<String, JsValue> {
        Ok(js_result!(self.inner.insert_scene_at(index, Default::default()))?)
    }

    /// Deletes a scene by key. Fails when it is the last remaining scene.
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

    /// Gets a scene by key, returns null if not found.
    #[wasm_bindgen(js_name = getScene)]
    pub fn get_scene(&mut self, key: &str) -> Result<JsValue, JsValue> {
        let scene = js_result!(self.inner.get_scene(key))?;
        match scene {
            Some(s) => Ok(to_js_value(&s)?),
            None => Ok(JsValue::NULL),
        }
    }

    /// Returns the number of scenes.
    #[wasm_bindgen(js_name = sceneCount)]
    pub fn scene_count(&mut self) -> Result<usize, JsValue> {
        Ok(js_result!(self.inner.scene_count())?)
    }

    /// Sets the heading location text.
    #[wasm_bindgen(js_name = setLocation)]
    pub fn set_location(&mut self, key: &str, location: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_location(key, location))?;
        Ok(())
    }

    /// Sets the heading time-setting text.
    #[wasm_bindgen(js_name = setTimeSetting)]
    pub fn set_time_setting(&mut self, key: &str, time_setting: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_time_setting(key, time_setting))?;
        Ok(())
    }

    /// Sets the scene-level hidden note.
    #[wasm_bindgen(js_name = setHiddenDescription)]
    pub fn set_hidden_description(&mut self, key: &str, text: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_hidden_description(key, text))?;
        Ok(())
    }

    /// Sets the opaque left-margin content blob.
    #[wasm_bindgen(js_name = setLeftContent)]
    pub fn set_left_content(&mut self, key: &str, content: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_left_content(key, content))?;
        Ok(())
    }

    /// Sets or clears the explicit scene label (pass null to clear).
    #[wasm_bindgen(js_name = setSceneLabel)]
    pub fn set_scene_label(&mut self, key: &str, label: Option<String>) -> Result<(), JsValue> {
        js_result!(self.inner.set_scene_label(key, label.as_deref()))?;
        Ok(())
    }
}

// =============================================================================
// BLOCK METHODS
// =============================================================================

#[wasm_bindgen]
impl JsScriptManager {
    /// Inserts a content block at `index` within a scene's body.
    ///
    /// `block` uses the structured-record shape:
    /// ```js
    /// manager.insertBlock(key, 0, { type: 'togaki', text: 'He enters.' });
    /// manager.insertBlock(key, 1, { type: 'serifu', character: 'Mika', text: 'Hello' });
    /// manager.insertBlock(key, 2, { type: 'page_break' });
    /// ```
    #[wasm_bindgen(js_name = insertBlock)]
    pub fn insert_block(&mut self, key: &str, index: usize, block: JsValue) -> Result<(), JsValue> {
        let record: BlockRecord = from_value(block)?;
        js_result!(self.inner.insert_block(key, index, record.to_block()))?;
        Ok(())
    }

    /// Removes the content block at `index` within a scene's body.
    #[wasm_bindgen(js_name = removeBlock)]
    pub fn remove_block(&mut self, key: &str, index: usize) -> Result<(), JsValue> {
        js_result!(self.inner.remove_block(key, index))?;
        Ok(())
    }

    /// Moves a block within a scene's body.
    #[wasm_bindgen(js_name = moveBlock)]
    pub fn move_block(&mut self, key: &str, from: usize, to: usize) -> Result<(), JsValue> {
        js_result!(self.inner.move_block(key, from, to))?;
        Ok(())
    }

    /// Replaces the text of a togaki or serifu block.
    #[wasm_bindgen(js_name = setBlockText)]
    pub fn set_block_text(&mut self, key: &str, index: usize, text: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_block_text(key, index, text))?;
        Ok(())
    }

    /// Replaces a serifu's speaker name; the padded display form is
    /// re-derived from the new original.
    #[wasm_bindgen(js_name = setSpeakerName)]
    pub fn set_speaker_name(&mut self, key: &str, index: usize, name: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_speaker_name(key, index, name))?;
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
