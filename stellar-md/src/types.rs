use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported directive kinds.
///
/// Block kinds have an opening tag, a body and a matching `end` tag; leaf kinds
/// are a single tag with no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Note,
    Folding,
    Timeline,
    Link,
    Button,
    Friends,
    About,
    Grid,
    Tabs,
}

impl DirectiveKind {
    /// All kinds, in the order the theme's substitution passes run.
    pub const ALL: [DirectiveKind; 9] = [
        DirectiveKind::Note,
        DirectiveKind::Folding,
        DirectiveKind::Timeline,
        DirectiveKind::Link,
        DirectiveKind::Button,
        DirectiveKind::Friends,
        DirectiveKind::About,
        DirectiveKind::Grid,
        DirectiveKind::Tabs,
    ];

    /// Tag name as written by authors (`note`, `tabs`, ...).
    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Note => "note",
            DirectiveKind::Folding => "folding",
            DirectiveKind::Timeline => "timeline",
            DirectiveKind::Link => "link",
            DirectiveKind::Button => "button",
            DirectiveKind::Friends => "friends",
            DirectiveKind::About => "about",
            DirectiveKind::Grid => "grid",
            DirectiveKind::Tabs => "tabs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Whether this kind takes a body and a closing `{% endname %}` tag.
    pub fn is_block(self) -> bool {
        !matches!(
            self,
            DirectiveKind::Link | DirectiveKind::Button | DirectiveKind::Friends
        )
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// 1-based starting line number.
    pub start_line: usize,
    /// 1-based ending line number (inclusive).
    pub end_line: usize,
    /// 0-based byte offset of the start.
    pub start_offset: usize,
    /// 0-based byte offset of the end (exclusive).
    pub end_offset: usize,
}

/// One located directive occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveMatch {
    pub kind: DirectiveKind,
    /// Raw, trimmed argument string.
    pub args: String,
    /// Literal text between the opening and matching closing tag. Empty for
    /// leaf directives.
    pub body: String,
    /// Absolute byte offset where `body` starts in the source document.
    pub body_offset: usize,
    /// 1-based line on which `body` starts.
    pub body_line: usize,
    /// Span of the whole occurrence, tags included.
    pub span: Span,
}

/// A piece of tokenized document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    /// Text outside any directive, passed to the Markdown compiler as-is.
    Text { text: String },
    Directive(DirectiveMatch),
}

/// A heading found by the Markdown compiler, with its anchor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DirectiveKind::from_name("endnote"), None);
        assert_eq!(DirectiveKind::from_name("Note"), None);
    }

    #[test]
    fn leaf_kinds() {
        let leaves: Vec<_> = DirectiveKind::ALL
            .into_iter()
            .filter(|k| !k.is_block())
            .collect();
        assert_eq!(
            leaves,
            vec![DirectiveKind::Link, DirectiveKind::Button, DirectiveKind::Friends]
        );
    }
}
