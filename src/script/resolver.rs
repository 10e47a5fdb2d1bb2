//! Insertion-point resolution.
//!
//! Maps an arbitrary cursor/selection anchor to the scene and content-list
//! index a new block should be inserted at. Resolution is a pure function
//! of document state plus anchor; it never mutates.

use serde::{Deserialize, Serialize};

use crate::error::{ScriptError, ScriptResult};
use crate::script::model::ScriptRoot;

/// Where the cursor/selection currently sits, as reported by the rendering
/// layer. The typed ancestry replaces class-list walking over an untyped
/// tree: the renderer resolves its node chain once and hands the core a
/// typed position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Inside an existing content block (including dialogue sub-parts such
    /// as the name or text of a serifu).
    Block { scene: String, index: usize },
    /// Inside a scene's heading.
    Heading { scene: String },
    /// Inside a scene's content container but not inside a specific block.
    SceneContent { scene: String },
    /// Selection collapsed outside the document, or lost.
    None,
}

/// A resolved insertion slot: the owning scene key and the content-list
/// index to insert at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionPoint {
    pub scene: String,
    pub index: usize,
}

/// Resolves the insertion point for a new content block.
///
/// Priority order, first match wins:
/// 1. anchor inside a block: immediately after that block;
/// 2. anchor inside a scene (heading or content container): end of that
///    scene's content;
/// 3. no owning scene (or a stale key): the highlighted sidebar scene,
///    else the first scene, at end of content;
/// 4. empty document: [`ScriptError::NoTargetScene`].
pub fn resolve_insertion(
    root: &ScriptRoot,
    anchor: &Anchor,
    highlighted: Option<&str>,
) -> ScriptResult<InsertionPoint> {
    match anchor {
        Anchor::Block { scene, index } => {
            if let Some(owner) = root.scenes.get(scene) {
                // After the anchored block, clamped into the content list.
                let slot = (index + 1).min(owner.content.len());
                return Ok(InsertionPoint {
                    scene: scene.clone(),
                    index: slot,
                });
            }
            resolve_fallback(root, highlighted)
        }
        Anchor::Heading { scene } | Anchor::SceneContent { scene } => {
            if let Some(owner) = root.scenes.get(scene) {
                return Ok(InsertionPoint {
                    scene: scene.clone(),
                    index: owner.content.len(),
                });
            }
            resolve_fallback(root, highlighted)
        }
        Anchor::None => resolve_fallback(root, highlighted),
    }
}

/// Rule 3/4: highlighted sidebar scene, else first scene, else no target.
fn resolve_fallback(root: &ScriptRoot, highlighted: Option<&str>) -> ScriptResult<InsertionPoint> {
    let key = highlighted
        .filter(|key| root.contains_scene(key))
        .or_else(|| root.first_scene_key())
        .ok_or(ScriptError::NoTargetScene)?;

    let scene = root
        .scenes
        .get(key)
        .ok_or_else(|| ScriptError::scene_not_found(key))?;

    Ok(InsertionPoint {
        scene: key.to_string(),
        index: scene.content.len(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::model::{ContentBlock, Scene};

    fn root_with(scenes: &[(&str, usize)]) -> ScriptRoot {
        let mut root = ScriptRoot::new();
        for (key, blocks) in scenes {
            root.scene_order.push(key.to_string());
            let mut scene = Scene::new();
            for i in 0..*blocks {
                scene.content.push(ContentBlock::togaki(format!("line {}", i)));
            }
            root.scenes.insert(key.to_string(), scene);
        }
        root.renumber();
        root
    }

    #[test]
    fn test_anchor_in_block_inserts_after_it() {
        // Serifu at index 1 with trailing blocks: insertion lands at 2,
        // not at the end of the scene.
        let mut root = root_with(&[("s-1", 0)]);
        let scene = root.scenes.get_mut("s-1").unwrap();
        scene.content.push(ContentBlock::togaki("before"));
        scene.content.push(ContentBlock::serifu("Mika", "Hello"));
        scene.content.push(ContentBlock::togaki("after"));
        scene.content.push(ContentBlock::page_break());

        let anchor = Anchor::Block {
            scene: "s-1".to_string(),
            index: 1,
        };
        let point = resolve_insertion(&root, &anchor, None).unwrap();
        assert_eq!(point.scene, "s-1");
        assert_eq!(point.index, 2);
    }

    #[test]
    fn test_anchor_block_index_clamps_to_end() {
        let root = root_with(&[("s-1", 2)]);
        let anchor = Anchor::Block {
            scene: "s-1".to_string(),
            index: 9,
        };
        let point = resolve_insertion(&root, &anchor, None).unwrap();
        assert_eq!(point.index, 2);
    }

    #[test]
    fn test_anchor_in_scene_container_appends() {
        let root = root_with(&[("s-1", 3)]);
        let anchor = Anchor::SceneContent {
            scene: "s-1".to_string(),
        };
        let point = resolve_insertion(&root, &anchor, None).unwrap();
        assert_eq!(point.index, 3);
    }

    #[test]
    fn test_anchor_in_heading_appends() {
        let root = root_with(&[("s-1", 2)]);
        let anchor = Anchor::Heading {
            scene: "s-1".to_string(),
        };
        let point = resolve_insertion(&root, &anchor, None).unwrap();
        assert_eq!(point, InsertionPoint { scene: "s-1".to_string(), index: 2 });
    }

    #[test]
    fn test_lost_anchor_uses_highlighted_scene() {
        let root = root_with(&[("s-1", 1), ("s-2", 2)]);
        let point = resolve_insertion(&root, &Anchor::None, Some("s-2")).unwrap();
        assert_eq!(point.scene, "s-2");
        assert_eq!(point.index, 2);
    }

    #[test]
    fn test_lost_anchor_falls_back_to_first_scene() {
        let root = root_with(&[("s-1", 1), ("s-2", 2)]);
        let point = resolve_insertion(&root, &Anchor::None, None).unwrap();
        assert_eq!(point.scene, "s-1");
        assert_eq!(point.index, 1);
    }

    #[test]
    fn test_stale_anchor_scene_falls_through() {
        let root = root_with(&[("s-1", 1)]);
        let anchor = Anchor::Block {
            scene: "gone".to_string(),
            index: 0,
        };
        let point = resolve_insertion(&root, &anchor, None).unwrap();
        assert_eq!(point.scene, "s-1");
    }

    #[test]
    fn test_stale_highlight_falls_back_to_first() {
        let root = root_with(&[("s-1", 0)]);
        let point = resolve_insertion(&root, &Anchor::None, Some("gone")).unwrap();
        assert_eq!(point.scene, "s-1");
    }

    #[test]
    fn test_empty_document_has_no_target() {
        let root = ScriptRoot::new();
        let err = resolve_insertion(&root, &Anchor::None, None).unwrap_err();
        assert!(matches!(err, ScriptError::NoTargetScene));
    }

    #[test]
    fn test_resolution_does_not_mutate() {
        let root = root_with(&[("s-1", 2)]);
        let before = root.clone();
        let _ = resolve_insertion(
            &root,
            &Anchor::Block {
                scene: "s-1".to_string(),
                index: 0,
            },
            None,
        );
        assert_eq!(root, before);
    }
}
