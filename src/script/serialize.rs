//! Serialization of the script document.
//!
//! Three pure views over [`ScriptRoot`]:
//! - [`serialize`]: the structured record handed to persistence,
//! - [`deserialize`]: its inverse, rebuilding a document from a record,
//! - [`render_text`]: the deterministic plain-text export.
//!
//! Plus [`line_map`], the rendered-line table the line-number gutter
//! consumes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ScriptError, ScriptResult};
use crate::script::model::{scene_number, ContentBlock, Scene, ScriptRoot};

/// Marker prefixed to hidden headings and hidden blocks in text export.
pub const HIDDEN_MARK: &str = "※";
/// Indent prefixed to togaki (action) lines in text export.
pub const TOGAKI_INDENT: &str = "\u{3000}\u{3000}";
/// Fixed glyph run rendered for a time-progress marker.
pub const TIME_PROGRESS_MARK: &str = "×\u{3000}\u{3000}×\u{3000}\u{3000}×";
/// Fixed separator literal rendered for a page break.
pub const PAGE_BREAK_MARK: &str = "＝＝＝＝＝＝＝＝＝＝";

// =============================================================================
// RECORD TYPES
// =============================================================================

/// Structured record of a whole document, the persistence/export payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScriptRecord {
    pub scenes: Vec<SceneRecord>,
}

impl ScriptRecord {
    /// Serializes the record to a JSON string.
    pub fn to_json(&self) -> ScriptResult<String> {
        serde_json::to_string(self).map_err(|e| ScriptError::serialization(e.to_string()))
    }

    /// Parses a record from a JSON string.
    pub fn from_json(json: &str) -> ScriptResult<Self> {
        serde_json::from_str(json).map_err(|e| ScriptError::serialization(e.to_string()))
    }
}

/// One scene in the structured record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneRecord {
    pub scene_id: String,
    pub location: String,
    pub time_setting: String,
    pub hidden_description: String,
    pub content: Vec<BlockRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_content: Option<String>,
}

/// One content block in the structured record. The `type` tag carries the
/// block kind and the hidden flag folded together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockRecord {
    Togaki { text: String },
    HiddenTogaki { text: String },
    Serifu { character: String, text: String },
    HiddenSerifu { character: String, text: String },
    TimeProgress,
    PageBreak,
}

impl From<&ContentBlock> for BlockRecord {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Togaki { text, hidden: false } => Self::Togaki { text: text.clone() },
            ContentBlock::Togaki { text, hidden: true } => {
                Self::HiddenTogaki { text: text.clone() }
            }
            // Serialized dialogue always carries the authoritative original
            // name, never the padded display form.
            ContentBlock::Serifu {
                speaker,
                text,
                hidden: false,
            } => Self::Serifu {
                character: speaker.original.clone(),
                text: text.clone(),
            },
            ContentBlock::Serifu {
                speaker,
                text,
                hidden: true,
            } => Self::HiddenSerifu {
                character: speaker.original.clone(),
                text: text.clone(),
            },
            ContentBlock::TimeProgress {} => Self::TimeProgress,
            ContentBlock::PageBreak {} => Self::PageBreak,
        }
    }
}

impl BlockRecord {
    /// Rebuilds the model block, re-deriving the speaker display form from
    /// the serialized original.
    pub fn to_block(&self) -> ContentBlock {
        match self {
            Self::Togaki { text } => ContentBlock::togaki(text.clone()),
            Self::HiddenTogaki { text } => ContentBlock::togaki(text.clone()).with_hidden(true),
            Self::Serifu { character, text } => ContentBlock::serifu(character.clone(), text.clone()),
            Self::HiddenSerifu { character, text } => {
                ContentBlock::serifu(character.clone(), text.clone()).with_hidden(true)
            }
            Self::TimeProgress => ContentBlock::time_progress(),
            Self::PageBreak => ContentBlock::page_break(),
        }
    }
}

// =============================================================================
// STRUCTURED RECORD
// =============================================================================

/// Produces the structured record for the whole document.
///
/// Total on any structurally valid document: order entries without scene
/// data are skipped and missing fields fall back to defined defaults
/// (empty strings, the derived number) rather than failing.
pub fn serialize(root: &ScriptRoot) -> ScriptRecord {
    let scenes = root
        .scenes_in_order()
        .enumerate()
        .map(|(index, (_, scene))| serialize_scene(index, scene))
        .collect();
    ScriptRecord { scenes }
}

fn serialize_scene(index: usize, scene: &Scene) -> SceneRecord {
    let scene_id = scene
        .label
        .clone()
        .unwrap_or_else(|| derived_id(index, scene));

    SceneRecord {
        scene_id,
        location: scene.location.clone(),
        time_setting: scene.time_setting.clone(),
        hidden_description: scene.hidden_description.clone(),
        content: scene.content.iter().map(BlockRecord::from).collect(),
        left_content: if scene.left_content.is_empty() {
            None
        } else {
            Some(scene.left_content.clone())
        },
    }
}

fn derived_id(index: usize, scene: &Scene) -> String {
    if scene.number.is_empty() {
        scene_number(index)
    } else {
        scene.number.clone()
    }
}

/// Rebuilds a document from a structured record (the inverse of
/// [`serialize`]). Scene keys are freshly minted; display numbers and
/// speaker display forms are re-derived.
pub fn deserialize(record: &ScriptRecord) -> ScriptRoot {
    let mut root = ScriptRoot::new();
    for (index, scene_record) in record.scenes.iter().enumerate() {
        let key = Uuid::new_v4().to_string();
        let derived = scene_number(index);
        let scene = Scene {
            number: derived.clone(),
            label: (!scene_record.scene_id.is_empty() && scene_record.scene_id != derived)
                .then(|| scene_record.scene_id.clone()),
            location: scene_record.location.clone(),
            time_setting: scene_record.time_setting.clone(),
            hidden_description: scene_record.hidden_description.clone(),
            left_content: scene_record.left_content.clone().unwrap_or_default(),
            content: scene_record.content.iter().map(BlockRecord::to_block).collect(),
        };
        root.scene_order.push(key.clone());
        root.scenes.insert(key, scene);
    }
    root
}

// =============================================================================
// TEXT EXPORT
// =============================================================================

/// Renders the document as plain text.
///
/// Per scene: heading line, optional hidden-heading line, a blank line,
/// then the blocks separated by blank lines. Scenes are separated by a
/// double blank line. Identical document state yields byte-identical
/// output.
pub fn render_text(root: &ScriptRoot) -> String {
    let scenes: Vec<String> = root
        .scenes_in_order()
        .enumerate()
        .map(|(index, (_, scene))| render_scene(index, scene))
        .collect();

    let mut out = scenes.join("\n\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_scene(index: usize, scene: &Scene) -> String {
    let mut head = format!(
        "{} {}",
        scene.label.as_deref().unwrap_or(&derived_id(index, scene)),
        scene.location
    );
    if !scene.time_setting.is_empty() {
        head.push_str(&format!(" [{}]", scene.time_setting));
    }
    if !scene.hidden_description.is_empty() {
        head.push_str(&format!("\n{}{}", HIDDEN_MARK, scene.hidden_description));
    }

    let blocks: Vec<String> = scene.content.iter().map(render_block).collect();
    if blocks.is_empty() {
        head
    } else {
        format!("{}\n\n{}", head, blocks.join("\n\n"))
    }
}

fn render_block(block: &ContentBlock) -> String {
    let line = match block {
        ContentBlock::Togaki { text, .. } => format!("{}{}", TOGAKI_INDENT, text),
        ContentBlock::Serifu { speaker, text, .. } => {
            format!("{}「{}」", speaker.original, text)
        }
        ContentBlock::TimeProgress {} => TIME_PROGRESS_MARK.to_string(),
        ContentBlock::PageBreak {} => PAGE_BREAK_MARK.to_string(),
    };
    if block.is_hidden() {
        format!("{}{}", HIDDEN_MARK, line)
    } else {
        line
    }
}

// =============================================================================
// LINE MAP
// =============================================================================

/// One rendered line, as addressed by the line-number gutter. The global
/// line number is the entry's index in the [`line_map`] result; `line` is
/// the scene-local index bookmarks attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEntry {
    /// Owning scene key.
    pub scene: String,
    /// Scene-local line index (0 is the heading line).
    pub line: usize,
    /// Content-block index for block lines; `None` for heading lines.
    pub block: Option<usize>,
}

/// Enumerates the rendered lines of the document in order: per scene the
/// heading line, the hidden-heading line when rendered, then one line per
/// content block.
pub fn line_map(root: &ScriptRoot) -> Vec<LineEntry> {
    let mut entries = Vec::new();
    for (key, scene) in root.scenes_in_order() {
        let mut line = 0;
        entries.push(LineEntry {
            scene: key.to_string(),
            line,
            block: None,
        });
        if !scene.hidden_description.is_empty() {
            line += 1;
            entries.push(LineEntry {
                scene: key.to_string(),
                line,
                block: None,
            });
        }
        for block_index in 0..scene.content.len() {
            line += 1;
            entries.push(LineEntry {
                scene: key.to_string(),
                line,
                block: Some(block_index),
            });
        }
    }
    entries
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn single_scene_root() -> ScriptRoot {
        let mut root = ScriptRoot::new();
        let scene = Scene::new()
            .with_location("Office")
            .with_block(ContentBlock::togaki("He enters."))
            .with_block(ContentBlock::serifu("Mika", "Hello"));
        root.scene_order.push("s-1".to_string());
        root.scenes.insert("s-1".to_string(), scene);
        root.renumber();
        root
    }

    #[test]
    fn test_structured_record_shape() {
        let record = serialize(&single_scene_root());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "scenes": [{
                    "scene_id": "001",
                    "location": "Office",
                    "time_setting": "",
                    "hidden_description": "",
                    "content": [
                        {"type": "togaki", "text": "He enters."},
                        {"type": "serifu", "character": "Mika", "text": "Hello"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_text_export_golden() {
        let text = render_text(&single_scene_root());
        assert_eq!(
            text,
            "001 Office\n\n\u{3000}\u{3000}He enters.\n\nMika「Hello」\n"
        );
    }

    #[test]
    fn test_text_export_heading_with_time() {
        let mut root = single_scene_root();
        root.scenes.get_mut("s-1").unwrap().time_setting = "Night".to_string();
        let text = render_text(&root);
        assert!(text.starts_with("001 Office [Night]\n"));
    }

    #[test]
    fn test_hidden_variants_and_markers() {
        let mut root = ScriptRoot::new();
        let scene = Scene::new()
            .with_location("Hall")
            .with_hidden_description("draft note")
            .with_block(ContentBlock::togaki("She waits.").with_hidden(true))
            .with_block(ContentBlock::serifu("A", "Who?").with_hidden(true))
            .with_block(ContentBlock::time_progress())
            .with_block(ContentBlock::page_break());
        root.scene_order.push("s-1".to_string());
        root.scenes.insert("s-1".to_string(), scene);
        root.renumber();

        let record = serialize(&root);
        let kinds: Vec<&BlockRecord> = record.scenes[0].content.iter().collect();
        assert!(matches!(kinds[0], BlockRecord::HiddenTogaki { .. }));
        assert!(matches!(kinds[1], BlockRecord::HiddenSerifu { .. }));
        assert!(matches!(kinds[2], BlockRecord::TimeProgress));
        assert!(matches!(kinds[3], BlockRecord::PageBreak));

        let text = render_text(&root);
        assert!(text.contains("※draft note"));
        assert!(text.contains("※\u{3000}\u{3000}She waits."));
        // The padded display form never leaks into exports.
        assert!(text.contains("A「Who?」"));
        assert!(!text.contains('\u{2003}'));
        assert!(text.contains(TIME_PROGRESS_MARK));
        assert!(text.contains(PAGE_BREAK_MARK));
    }

    #[test]
    fn test_marker_blocks_serialize_as_bare_type() {
        let value = serde_json::to_value(BlockRecord::TimeProgress).unwrap();
        assert_eq!(value, json!({"type": "time_progress"}));
        let value = serde_json::to_value(BlockRecord::PageBreak).unwrap();
        assert_eq!(value, json!({"type": "page_break"}));
    }

    #[test]
    fn test_serifu_serializes_original_name_not_display() {
        let mut root = ScriptRoot::new();
        let scene = Scene::new().with_block(ContentBlock::serifu("A", "Hi"));
        root.scene_order.push("s-1".to_string());
        root.scenes.insert("s-1".to_string(), scene);
        root.renumber();

        let record = serialize(&root);
        match &record.scenes[0].content[0] {
            BlockRecord::Serifu { character, .. } => assert_eq!(character, "A"),
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_preserves_order_content_and_names() {
        let mut root = ScriptRoot::new();
        let first = Scene::new()
            .with_location("Office")
            .with_time_setting("Day")
            .with_block(ContentBlock::serifu("A", "one"))
            .with_block(ContentBlock::togaki("beat").with_hidden(true))
            .with_block(ContentBlock::time_progress());
        let second = Scene::new()
            .with_location("Street")
            .with_hidden_description("cut?")
            .with_block(ContentBlock::serifu("三船敏郎", "two"))
            .with_block(ContentBlock::page_break());
        root.scene_order.push("k-1".to_string());
        root.scenes.insert("k-1".to_string(), first);
        root.scene_order.push("k-2".to_string());
        root.scenes.insert("k-2".to_string(), second);
        root.renumber();

        let rebuilt = deserialize(&serialize(&root));
        assert_eq!(rebuilt.len(), root.len());
        for ((_, original), (_, copy)) in root.scenes_in_order().zip(rebuilt.scenes_in_order()) {
            assert_eq!(copy.number, original.number);
            assert_eq!(copy.location, original.location);
            assert_eq!(copy.time_setting, original.time_setting);
            assert_eq!(copy.hidden_description, original.hidden_description);
            assert_eq!(copy.content, original.content);
        }
    }

    #[test]
    fn test_explicit_label_round_trips() {
        let mut root = single_scene_root();
        root.scenes.get_mut("s-1").unwrap().label = Some("A-1".to_string());

        let record = serialize(&root);
        assert_eq!(record.scenes[0].scene_id, "A-1");

        let rebuilt = deserialize(&record);
        let (_, scene) = rebuilt.scenes_in_order().next().unwrap();
        assert_eq!(scene.label.as_deref(), Some("A-1"));
    }

    #[test]
    fn test_missing_scene_data_is_skipped() {
        let mut root = single_scene_root();
        root.scene_order.push("dangling".to_string());

        let record = serialize(&root);
        assert_eq!(record.scenes.len(), 1);
        assert!(!render_text(&root).is_empty());
    }

    #[test]
    fn test_output_is_stable() {
        let root = single_scene_root();
        assert_eq!(render_text(&root), render_text(&root));
        assert_eq!(
            serialize(&root).to_json().unwrap(),
            serialize(&root).to_json().unwrap()
        );
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = serialize(&single_scene_root());
        let parsed = ScriptRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_line_map_orders_heading_then_blocks() {
        let mut root = single_scene_root();
        root.scenes.get_mut("s-1").unwrap().hidden_description = "note".to_string();

        let lines = line_map(&root);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].block, None);
        assert_eq!(lines[1].block, None);
        assert_eq!(lines[2].block, Some(0));
        assert_eq!(lines[3], LineEntry {
            scene: "s-1".to_string(),
            line: 3,
            block: Some(1),
        });
    }
}
