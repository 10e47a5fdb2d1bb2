//! Error types for the screenplay document engine.

use thiserror::Error;

/// Result type alias for script document operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Errors that can occur while operating on a script document.
///
/// All of these are local and recoverable: a rejected operation leaves the
/// document unchanged. An empty undo/redo stack is a no-op, not an error.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Automerge error during document operations.
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// Autosurgeon hydration error.
    #[error("Hydration error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    /// Autosurgeon reconcile error.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] autosurgeon::ReconcileError),

    /// Scene not found in the document.
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// Field not found in a document node.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// No scene exists to anchor an insertion into.
    /// The caller must create an initial scene and retry.
    #[error("no scene available to anchor the insertion")]
    NoTargetScene,

    /// Attempt to delete the only remaining scene.
    #[error("cannot delete the last remaining scene")]
    LastScene,

    /// Index out of bounds for content-list operations.
    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Schema violation - document structure is invalid.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ScriptError {
    /// Creates a SceneNotFound error.
    pub fn scene_not_found(key: impl Into<String>) -> Self {
        Self::SceneNotFound(key.into())
    }

    /// Creates a FieldNotFound error.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound(field.into())
    }

    /// Creates an IndexOutOfBounds error.
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Creates a SchemaViolation error.
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Creates a Serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
