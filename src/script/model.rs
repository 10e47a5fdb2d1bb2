//! Data models for the screenplay document.
//!
//! A script is an ordered sequence of scenes, each carrying a heading
//! (location, time setting, hidden notes) and an ordered body of typed
//! content blocks. Autosurgeon derives give automatic persistence into the
//! backing Automerge document.

use autosurgeon::{Hydrate, Reconcile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// EM SPACE used to pad short speaker names into a three-column display form.
pub const WIDE_SPACE: char = '\u{2003}';

// =============================================================================
// DOCUMENT ROOT
// =============================================================================

/// Root document structure for a screenplay.
///
/// Scene identity lives in the `scenes` map keys (uuid strings); narrative
/// order lives in `scene_order`. Display numbers are derived from order via
/// [`ScriptRoot::renumber`], never the other way around.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct ScriptRoot {
    /// Scene ordering (scene keys).
    pub scene_order: Vec<String>,
    /// Scene data keyed by scene key.
    pub scenes: HashMap<String, Scene>,
}

impl ScriptRoot {
    /// Creates a new empty document root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of scenes.
    pub fn len(&self) -> usize {
        self.scene_order.len()
    }

    /// Returns true if there are no scenes.
    pub fn is_empty(&self) -> bool {
        self.scene_order.is_empty()
    }

    /// Returns the key of the first scene in document order, if any.
    pub fn first_scene_key(&self) -> Option<&str> {
        self.scene_order.first().map(String::as_str)
    }

    /// Returns true if the given key names a scene present in the document.
    pub fn contains_scene(&self, key: &str) -> bool {
        self.scenes.contains_key(key)
    }

    /// Iterates scenes in document order, skipping order entries whose
    /// scene data is missing.
    pub fn scenes_in_order(&self) -> impl Iterator<Item = (&str, &Scene)> {
        self.scene_order
            .iter()
            .filter_map(|key| self.scenes.get(key).map(|scene| (key.as_str(), scene)))
    }

    /// Derives every scene's display number from its position in
    /// `scene_order`. Idempotent; runs inside every structural mutation so
    /// numbering holds by construction.
    pub fn renumber(&mut self) {
        for (index, key) in self.scene_order.iter().enumerate() {
            if let Some(scene) = self.scenes.get_mut(key) {
                scene.number = scene_number(index);
            }
        }
    }
}

/// Zero-padded 3-digit display number for the scene at `index`.
pub fn scene_number(index: usize) -> String {
    format!("{:03}", index + 1)
}

// =============================================================================
// SCENE
// =============================================================================

/// A screenplay scene: heading fields plus an ordered body of content blocks.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Scene {
    /// Derived zero-padded display number ("001"). Not independently
    /// editable; overwritten by [`ScriptRoot::renumber`].
    pub number: String,
    /// Explicit label overriding the derived number in serialized output.
    pub label: Option<String>,
    /// Heading location text.
    pub location: String,
    /// Heading time-setting text.
    pub time_setting: String,
    /// Scene-level hidden note, rendered as a draft annotation.
    pub hidden_description: String,
    /// Opaque rich content for the left margin (annotations, drawings).
    pub left_content: String,
    /// Ordered body of the scene. Block order is narrative order,
    /// line-number order and serialization order.
    pub content: Vec<ContentBlock>,
}

impl Scene {
    /// Creates a new empty Scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Set location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder: Set time setting.
    pub fn with_time_setting(mut self, time_setting: impl Into<String>) -> Self {
        self.time_setting = time_setting.into();
        self
    }

    /// Builder: Set hidden description.
    pub fn with_hidden_description(mut self, hidden_description: impl Into<String>) -> Self {
        self.hidden_description = hidden_description.into();
        self
    }

    /// Builder: Append a content block.
    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    /// Returns the number of content blocks.
    pub fn block_count(&self) -> usize {
        self.content.len()
    }
}

// =============================================================================
// CONTENT BLOCKS
// =============================================================================

/// A typed content block within a scene body.
#[derive(Debug, Clone, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub enum ContentBlock {
    /// Action/stage-direction line.
    Togaki { text: String, hidden: bool },
    /// Dialogue line: speaker plus spoken text.
    Serifu {
        speaker: SpeakerName,
        text: String,
        hidden: bool,
    },
    /// In-scene elapsed-time marker.
    TimeProgress,
    /// Explicit pagination marker.
    PageBreak,
}

impl ContentBlock {
    /// Creates a visible togaki block.
    pub fn togaki(text: impl Into<String>) -> Self {
        Self::Togaki {
            text: text.into(),
            hidden: false,
        }
    }

    /// Creates a visible serifu block; the display name is derived from
    /// the given original name.
    pub fn serifu(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Serifu {
            speaker: SpeakerName::new(speaker),
            text: text.into(),
            hidden: false,
        }
    }

    /// Creates a time-progress marker.
    pub fn time_progress() -> Self {
        Self::TimeProgress {}
    }

    /// Creates a page-break marker.
    pub fn page_break() -> Self {
        Self::PageBreak {}
    }

    /// Builder: mark the block hidden. No-op on marker blocks.
    pub fn with_hidden(mut self, is_hidden: bool) -> Self {
        match &mut self {
            Self::Togaki { hidden, .. } | Self::Serifu { hidden, .. } => *hidden = is_hidden,
            Self::TimeProgress {} | Self::PageBreak {} => {}
        }
        self
    }

    /// Returns the block's hidden flag (marker blocks are never hidden).
    pub fn is_hidden(&self) -> bool {
        match self {
            Self::Togaki { hidden, .. } | Self::Serifu { hidden, .. } => *hidden,
            Self::TimeProgress {} | Self::PageBreak {} => false,
        }
    }
}

// =============================================================================
// SPEAKER NAME
// =============================================================================

/// A dialogue speaker name.
///
/// `original` is authoritative; `display` and `long_name` are recomputed
/// from it whenever it changes. Serialization always uses `original`.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct SpeakerName {
    /// The authoritative, unformatted name as the author typed it.
    pub original: String,
    /// Padded display form (see [`format_speaker_name`]).
    pub display: String,
    /// True for names of four or more characters, which get dedicated
    /// long-name styling instead of padding.
    pub long_name: bool,
}

impl SpeakerName {
    /// Creates a speaker name, deriving the display form.
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let (display, long_name) = format_speaker_name(&original);
        Self {
            original,
            display,
            long_name,
        }
    }

    /// Replaces the original name and re-derives the display form.
    pub fn set_original(&mut self, original: impl Into<String>) {
        self.original = original.into();
        let (display, long_name) = format_speaker_name(&self.original);
        self.display = display;
        self.long_name = long_name;
    }
}

/// Derives the display form of a speaker name.
///
/// One-character names are padded with an EM SPACE on both sides,
/// two-character names get an EM SPACE between the characters, and longer
/// names pass through unchanged (with the long-name flag set from four
/// characters up). A padded 1- or 2-character name is three characters
/// long, so re-applying the derivation is the identity.
pub fn format_speaker_name(name: &str) -> (String, bool) {
    let chars: Vec<char> = name.chars().collect();
    match chars.len() {
        1 => (format!("{}{}{}", WIDE_SPACE, chars[0], WIDE_SPACE), false),
        2 => (format!("{}{}{}", chars[0], WIDE_SPACE, chars[1]), false),
        n => (name.to_string(), n >= 4),
    }
}

// =============================================================================
// TESTS
// =============================================================================
