//! Content classification of resolved types

use std::fmt;

use serde::Serialize;

use super::model::{ContentModel, TypeDefinition};

/// What an element of a given type may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// Nothing: no text, no child elements
    #[serde(rename = "none")]
    Empty,
    /// Text only
    Simple,
    /// Child elements only; whitespace between them is insignificant
    ElementOnly,
    /// Text interleaved with child elements
    Mixed,
}

impl ContentKind {
    /// The name used in inventory output
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Empty => "none",
            ContentKind::Simple => "simple",
            ContentKind::ElementOnly => "elementOnly",
            ContentKind::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural and content classification of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Whether the type is a simple type
    pub is_simple_type: bool,
    /// Content model category
    pub content_kind: ContentKind,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let structure = if self.is_simple_type { "simple" } else { "complex" };
        write!(f, "{} {}", structure, self.content_kind)
    }
}

/// Classify a resolved type definition
pub fn classify(definition: &TypeDefinition) -> Classification {
    let (is_simple_type, content_kind) = match definition {
        TypeDefinition::Simple(_) => (true, ContentKind::Simple),
        TypeDefinition::Complex(complex_type) => {
            let kind = match &complex_type.content {
                ContentModel::Empty => ContentKind::Empty,
                ContentModel::Simple => ContentKind::Simple,
                ContentModel::ElementOnly(_) => ContentKind::ElementOnly,
                ContentModel::Mixed(_) => ContentKind::Mixed,
            };
            (false, kind)
        }
    };

    Classification {
        is_simple_type,
        content_kind,
    }
}
