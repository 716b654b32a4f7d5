//! Content blocks.
//!
//! Prompt inputs and resource payloads are lists of content blocks,
//! discriminated on the wire by `type`.

use serde::{Deserialize, Serialize};

/// Who a piece of content is intended for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// The human user
    User,
    /// The model
    Assistant,
}

/// Optional annotations carried by any content block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Intended audience subset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<Audience>>,
    /// Relative priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

impl Annotations {
    /// True when no annotation field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.audience.is_none() && self.priority.is_none()
    }
}

fn annotations_absent(annotations: &Option<Annotations>) -> bool {
    annotations.as_ref().is_none_or(Annotations::is_empty)
}

/// Binary media payload, either inline or by reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    /// Base64-encoded inline data
    #[serde(rename_all = "camelCase")]
    Base64 {
        /// MIME type of the encoded data
        media_type: String,
        /// Base64 payload
        data: String,
    },
    /// Data referenced by URL
    #[serde(rename_all = "camelCase")]
    Url {
        /// MIME type of the referenced data
        media_type: String,
        /// Location of the data
        url: String,
    },
}

/// A block of prompt or output content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text {
        /// The text
        text: String,
        /// Optional annotations
        #[serde(skip_serializing_if = "annotations_absent")]
        annotations: Option<Annotations>,
    },
    /// An image
    Image {
        /// Image data source
        source: MediaSource,
        /// Optional annotations
        #[serde(skip_serializing_if = "annotations_absent")]
        annotations: Option<Annotations>,
    },
    /// An audio clip
    Audio {
        /// Audio data source
        source: MediaSource,
        /// Optional annotations
        #[serde(skip_serializing_if = "annotations_absent")]
        annotations: Option<Annotations>,
    },
    /// A link to a resource the client can resolve
    #[serde(rename_all = "camelCase")]
    ResourceLink {
        /// Resource URI
        uri: String,
        /// MIME type, when known
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Display title
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Optional annotations
        #[serde(skip_serializing_if = "annotations_absent")]
        annotations: Option<Annotations>,
    },
    /// An embedded resource with inline content
    #[serde(rename_all = "camelCase")]
    Resource {
        /// Resource URI
        uri: String,
        /// MIME type, when known
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Display title
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Inline resource content
        content: String,
        /// Optional annotations
        #[serde(skip_serializing_if = "annotations_absent")]
        annotations: Option<Annotations>,
    },
}

impl ContentBlock {
    /// Text block constructor
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            annotations: None,
        }
    }

    /// Get the text when this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Concatenate the text of all text blocks in a prompt, in order.
///
/// Non-text blocks are skipped; callers that care about media inspect the
/// blocks directly.
#[must_use]
pub fn collect_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(ContentBlock::as_text)
        .collect::<Vec<_>>()
        .join("")
}
