//! ScriptManager implementation with hybrid operations pattern.
//!
//! This module provides the main `ScriptManager` struct that wraps an
//! Automerge document and provides:
//! - High-level operations via autosurgeon (hydrate/reconcile) for
//!   structural mutations of scenes and content blocks
//! - Targeted O(1) updates via direct put operations for heading text
//!   fields edited on every keystroke

use automerge::{transaction::Transactable, AutoCommit, ObjId, ReadDoc, ScalarValue, Value, ROOT};
use autosurgeon::{hydrate, reconcile};
use uuid::Uuid;

use crate::error::{ScriptError, ScriptResult};
use crate::script::model::{ContentBlock, Scene, ScriptRoot};

/// The document manager for a screenplay.
///
/// Uses a hybrid approach:
/// - `update_state()` for structural operations (uses hydrate/reconcile)
/// - `set_location()` and friends for targeted O(1) heading updates
///
/// A valid document always holds at least one scene; `new()` seeds one and
/// `delete_scene()` refuses to remove the last. Scene display numbers are
/// re-derived inside every structural mutation, so there is no API that
/// writes them directly.
pub struct ScriptManager {
    doc: AutoCommit,
    /// Cached hydrated state - invalidated after direct document mutations.
    cached_state: Option<ScriptRoot>,
}

impl ScriptManager {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates a new ScriptManager seeded with a single empty scene.
    pub fn new() -> Self {
        let mut doc = AutoCommit::new();
        let mut root = ScriptRoot::default();
        let key = new_scene_key();
        root.scene_order.push(key.clone());
        root.scenes.insert(key, Scene::new());
        root.renumber();
        reconcile(&mut doc, &root).expect("Failed to initialize document");
        Self {
            doc,
            cached_state: Some(root),
        }
    }

    /// Creates a ScriptManager from saved binary data.
    pub fn from_bytes(bytes: &[u8]) -> ScriptResult<Self> {
        let doc = AutoCommit::load(bytes)?;
        Ok(Self {
            doc,
            cached_state: None,
        })
    }

    /// Creates a ScriptManager holding the given document state.
    pub fn from_state(root: ScriptRoot) -> ScriptResult<Self> {
        let mut doc = AutoCommit::new();
        reconcile(&mut doc, &root)?;
        Ok(Self {
            doc,
            cached_state: Some(root),
        })
    }

    /// Saves the document to binary format.
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Gets the actor ID for this document instance.
    pub fn actor_id(&self) -> String {
        self.doc.get_actor().to_hex_string()
    }

    // =========================================================================
    // HIGH-LEVEL OPERATIONS (via Hydrate/Reconcile)
    // =========================================================================

    /// Hydrates the entire document state to Rust structs.
    pub fn get_state(&mut self) -> ScriptResult<ScriptRoot> {
        if let Some(ref cached) = self.cached_state {
            return Ok(cached.clone());
        }
        let state: ScriptRoot = hydrate(&self.doc)?;
        self.cached_state = Some(state.clone());
        Ok(state)
    }

    /// Applies a function to mutate the state, then reconciles back to the
    /// document.
    pub fn update_state<F>(&mut self, f: F) -> ScriptResult<()>
    where
        F: FnOnce(&mut ScriptRoot),
    {
        let mut state = self.get_state()?;
        f(&mut state);
        reconcile(&mut self.doc, &state)?;
        self.cached_state = Some(state);
        Ok(())
    }

    // =========================================================================
    // SCENE OPERATIONS
    // =========================================================================

    /// Appends a new scene and returns its key.
    pub fn add_scene(&mut self, scene: Scene) -> ScriptResult<String> {
        let key = new_scene_key();
        let key_out = key.clone();
        self.update_state(|state| {
            state.scenes.insert(key.clone(), scene);
            state.scene_order.push(key);
            state.renumber();
        })?;
        Ok(key_out)
    }

    /// Inserts a new scene at a position in document order and returns its
    /// key.
    pub fn insert_scene_at(&mut self, index: usize, scene: Scene) -> ScriptResult<String> {
        let len = self.get_state()?.scene_order.len();
        if index > len {
            return Err(ScriptError::index_out_of_bounds(index, len));
        }
        let key = new_scene_key();
        let key_out = key.clone();
        self.update_state(|state| {
            state.scenes.insert(key.clone(), scene);
            state.scene_order.insert(index, key);
            state.renumber();
        })?;
        Ok(key_out)
    }

    /// Gets a scene by key.
    pub fn get_scene(&mut self, key: &str) -> ScriptResult<Option<Scene>> {
        let state = self.get_state()?;
        Ok(state.scenes.get(key).cloned())
    }

    /// Returns the number of scenes.
    pub fn scene_count(&mut self) -> ScriptResult<usize> {
        Ok(self.get_state()?.scene_order.len())
    }

    /// Deletes a scene by key.
    ///
    /// Rejected with [`ScriptError::LastScene`] when it is the only
    /// remaining scene; the document is left untouched.
    pub fn delete_scene(&mut self, key: &str) -> ScriptResult<()> {
        let state = self.get_state()?;
        if !state.contains_scene(key) {
            return Err(ScriptError::scene_not_found(key));
        }
        if state.scene_order.len() <= 1 {
            return Err(ScriptError::LastScene);
        }
        self.update_state(|state| {
            state.scenes.remove(key);
            state.scene_order.retain(|k| k != key);
            state.renumber();
        })
    }

    /// Moves a scene from one position to another in document order.
    pub fn move_scene(&mut self, from: usize, to: usize) -> ScriptResult<()> {
        let len = self.get_state()?.scene_order.len();
        if from >= len {
            return Err(ScriptError::index_out_of_bounds(from, len));
        }
        if to > len {
            return Err(ScriptError::index_out_of_bounds(to, len));
        }
        self.update_state(|state| {
            if from != to {
                let key = state.scene_order.remove(from);
                let adjusted_to = if from < to { to - 1 } else { to };
                state.scene_order.insert(adjusted_to, key);
            }
            state.renumber();
        })
    }

    // =========================================================================
    // HEADING FIELD SETTERS (O(1) targeted updates)
    // =========================================================================

    /// Sets the heading location text (O(1)).
    pub fn set_location(&mut self, key: &str, location: &str) -> ScriptResult<()> {
        self.cached_state = None;
        let obj = self.get_obj_at_path(&["scenes", key])?;
        self.doc
            .put(&obj, "location", ScalarValue::Str(location.into()))?;
        Ok(())
    }

    /// Sets the heading time-setting text (O(1)).
    pub fn set_time_setting(&mut self, key: &str, time_setting: &str) -> ScriptResult<()> {
        self.cached_state = None;
        let obj = self.get_obj_at_path(&["scenes", key])?;
        self.doc
            .put(&obj, "time_setting", ScalarValue::Str(time_setting.into()))?;
        Ok(())
    }

    /// Sets the scene-level hidden note (O(1)).
    pub fn set_hidden_description(&mut self, key: &str, text: &str) -> ScriptResult<()> {
        self.cached_state = None;
        let obj = self.get_obj_at_path(&["scenes", key])?;
        self.doc
            .put(&obj, "hidden_description", ScalarValue::Str(text.into()))?;
        Ok(())
    }

    /// Sets the opaque left-margin content blob (O(1)).
    pub fn set_left_content(&mut self, key: &str, content: &str) -> ScriptResult<()> {
        self.cached_state = None;
        let obj = self.get_obj_at_path(&["scenes", key])?;
        self.doc
            .put(&obj, "left_content", ScalarValue::Str(content.into()))?;
        Ok(())
    }

    /// Sets or clears the explicit scene label (O(1)).
    pub fn set_scene_label(&mut self, key: &str, label: Option<&str>) -> ScriptResult<()> {
        self.cached_state = None;
        let obj = self.get_obj_at_path(&["scenes", key])?;
        match label {
            Some(v) => self.doc.put(&obj, "label", ScalarValue::Str(v.into()))?,
            None => {
                self.doc.delete(&obj, "label")?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // CONTENT BLOCK OPERATIONS
    // =========================================================================

    /// Inserts a content block at `index` within a scene's body.
    pub fn insert_block(
        &mut self,
        key: &str,
        index: usize,
        block: ContentBlock,
    ) -> ScriptResult<()> {
        let len = self.block_len(key)?;
        if index > len {
            return Err(ScriptError::index_out_of_bounds(index, len));
        }
        self.update_state(|state| {
            if let Some(scene) = state.scenes.get_mut(key) {
                scene.content.insert(index, block);
            }
        })
    }

    /// Removes the content block at `index` within a scene's body.
    pub fn remove_block(&mut self, key: &str, index: usize) -> ScriptResult<()> {
        let len = self.block_len(key)?;
        if index >= len {
            return Err(ScriptError::index_out_of_bounds(index, len));
        }
        self.update_state(|state| {
            if let Some(scene) = state.scenes.get_mut(key) {
                scene.content.remove(index);
            }
        })
    }

    /// Moves a block within a scene's body.
    pub fn move_block(&mut self, key: &str, from: usize, to: usize) -> ScriptResult<()> {
        let len = self.block_len(key)?;
        if from >= len {
            return Err(ScriptError::index_out_of_bounds(from, len));
        }
        if to > len {
            return Err(ScriptError::index_out_of_bounds(to, len));
        }
        self.update_state(|state| {
            if let Some(scene) = state.scenes.get_mut(key) {
                if from != to {
                    let block = scene.content.remove(from);
                    let adjusted_to = if from < to { to - 1 } else { to };
                    scene.content.insert(adjusted_to, block);
                }
            }
        })
    }

    /// Replaces the text of a togaki or serifu block.
    pub fn set_block_text(&mut self, key: &str, index: usize, text: &str) -> ScriptResult<()> {
        self.mutate_block(key, index, |block| match block {
            ContentBlock::Togaki { text: t, .. } | ContentBlock::Serifu { text: t, .. } => {
                *t = text.to_string();
                Ok(())
            }
            ContentBlock::TimeProgress {} | ContentBlock::PageBreak {} => Err(
                ScriptError::schema_violation("marker blocks carry no editable text"),
            ),
        })
    }

    /// Replaces a serifu's speaker name, re-deriving the display form from
    /// the new original.
    pub fn set_speaker_name(&mut self, key: &str, index: usize, name: &str) -> ScriptResult<()> {
        self.mutate_block(key, index, |block| match block {
            ContentBlock::Serifu { speaker, .. } => {
                speaker.set_original(name);
                Ok(())
            }
            _ => Err(ScriptError::schema_violation(
                "speaker names exist only on serifu blocks",
            )),
        })
    }

    /// Sets the hidden flag of a togaki or serifu block.
    pub fn set_block_hidden(&mut self, key: &str, index: usize, hidden: bool) -> ScriptResult<()> {
        self.mutate_block(key, index, |block| match block {
            ContentBlock::Togaki { hidden: h, .. } | ContentBlock::Serifu { hidden: h, .. } => {
                *h = hidden;
                Ok(())
            }
            ContentBlock::TimeProgress {} | ContentBlock::PageBreak {} => Err(
                ScriptError::schema_violation("marker blocks cannot be hidden"),
            ),
        })
    }

    // =========================================================================
    // INTERNAL HELPERS
    // =========================================================================

    /// Content length of a scene, or SceneNotFound.
    fn block_len(&mut self, key: &str) -> ScriptResult<usize> {
        let state = self.get_state()?;
        state
            .scenes
            .get(key)
            .map(|scene| scene.content.len())
            .ok_or_else(|| ScriptError::scene_not_found(key))
    }

    /// Validates the target block, applies `f` to a copy, and reconciles
    /// only if `f` succeeds.
    fn mutate_block<F>(&mut self, key: &str, index: usize, f: F) -> ScriptResult<()>
    where
        F: FnOnce(&mut ContentBlock) -> ScriptResult<()>,
    {
        let mut state = self.get_state()?;
        let scene = state
            .scenes
            .get_mut(key)
            .ok_or_else(|| ScriptError::scene_not_found(key))?;
        let len = scene.content.len();
        let block = scene
            .content
            .get_mut(index)
            .ok_or_else(|| ScriptError::index_out_of_bounds(index, len))?;
        f(block)?;
        reconcile(&mut self.doc, &state)?;
        self.cached_state = Some(state);
        Ok(())
    }

    /// Gets ObjId at a path.
    fn get_obj_at_path(&self, path: &[&str]) -> ScriptResult<ObjId> {
        let mut current = ROOT;
        for key in path {
            current = self.get_obj_at_key(&current, key)?;
        }
        Ok(current)
    }

    /// Gets an object ID at a map key.
    fn get_obj_at_key(&self, parent: &ObjId, key: &str) -> ScriptResult<ObjId> {
        match self.doc.get(parent, key) {
            Ok(Some((Value::Object(_), obj_id))) => Ok(obj_id),
            Ok(Some(_)) => Err(ScriptError::schema_violation(format!(
                "'{}' is not an object",
                key
            ))),
            Ok(None) => {
                if key.len() == 36 {
                    // Likely a uuid - scene not found
                    Err(ScriptError::scene_not_found(key))
                } else {
                    Err(ScriptError::field_not_found(key))
                }
            }
            Err(e) => Err(ScriptError::Automerge(e)),
        }
    }
}

impl Default for ScriptManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Mints a fresh scene key. Identity is the key; display numbers are
/// derived from order.
pub fn new_scene_key() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
