//! Typed directive resolution.
//!
//! `resolve` turns a located `DirectiveMatch` into a typed `Directive`: the
//! argument string goes through the per-kind views in [`crate::args`] and the
//! body is split on the kind's inline markers (`<!-- cell -->`,
//! `<!-- tab Title -->`, `<!-- node Header -->`) or, for timelines without
//! node markers, on the items of a Markdown list.

use std::ops::Range;

use crate::args::{
    AboutArgs, ButtonArgs, FoldingArgs, GridArgs, LinkArgs, NoteArgs, parse_args,
};
use crate::tokenize::Tokenizer;
use crate::types::{DirectiveKind, DirectiveMatch};

/// A slice of a directive body that is rendered as Markdown on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub text: String,
    /// Absolute byte offset of the part in the document.
    pub offset: usize,
    /// 1-based line of the part in the document.
    pub line: usize,
}

impl Part {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub title: String,
    pub body: Part,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineNode {
    pub header: String,
    pub body: Part,
}

/// A directive with its arguments interpreted and its body split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Note { args: NoteArgs, body: Part },
    Folding { args: FoldingArgs, body: Part },
    Timeline { nodes: Vec<TimelineNode> },
    Grid { args: GridArgs, cells: Vec<Part> },
    Tabs { tabs: Vec<Tab> },
    Link(LinkArgs),
    Button(ButtonArgs),
    About { args: AboutArgs, body: Part },
    Friends { raw: String },
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Note { .. } => DirectiveKind::Note,
            Directive::Folding { .. } => DirectiveKind::Folding,
            Directive::Timeline { .. } => DirectiveKind::Timeline,
            Directive::Grid { .. } => DirectiveKind::Grid,
            Directive::Tabs { .. } => DirectiveKind::Tabs,
            Directive::Link(_) => DirectiveKind::Link,
            Directive::Button(_) => DirectiveKind::Button,
            Directive::About { .. } => DirectiveKind::About,
            Directive::Friends { .. } => DirectiveKind::Friends,
        }
    }

    /// Body parts that are expanded as Markdown, in document order.
    pub fn parts(&self) -> Vec<&Part> {
        match self {
            Directive::Note { body, .. }
            | Directive::Folding { body, .. }
            | Directive::About { body, .. } => vec![body],
            Directive::Timeline { nodes } => nodes.iter().map(|n| &n.body).collect(),
            Directive::Grid { cells, .. } => cells.iter().collect(),
            Directive::Tabs { tabs } => tabs.iter().map(|t| &t.body).collect(),
            Directive::Link(_) | Directive::Button(_) | Directive::Friends { .. } => Vec::new(),
        }
    }
}

/// Resolve a located directive into its typed form.
pub fn resolve(m: &DirectiveMatch) -> Directive {
    let args = parse_args(&m.args);
    let whole_body = || Part {
        text: m.body.clone(),
        offset: m.body_offset,
        line: m.body_line,
    };

    match m.kind {
        DirectiveKind::Note => Directive::Note {
            args: NoteArgs::from_args(&args),
            body: whole_body(),
        },
        DirectiveKind::Folding => Directive::Folding {
            args: FoldingArgs::from_args(&args),
            body: whole_body(),
        },
        DirectiveKind::About => Directive::About {
            args: AboutArgs::from_args(&args),
            body: whole_body(),
        },
        DirectiveKind::Timeline => Directive::Timeline {
            nodes: split_timeline(m),
        },
        DirectiveKind::Grid => Directive::Grid {
            args: GridArgs::from_args(&args),
            cells: split_cells(m),
        },
        DirectiveKind::Tabs => Directive::Tabs {
            tabs: split_tabs(m),
        },
        DirectiveKind::Link => Directive::Link(LinkArgs::from_args(&args)),
        DirectiveKind::Button => Directive::Button(ButtonArgs::from_args(&args)),
        DirectiveKind::Friends => Directive::Friends {
            raw: m.args.clone(),
        },
    }
}

// ------------------------------------------------------------------
// Marker splitting
// ------------------------------------------------------------------

/// An HTML-comment marker such as `<!-- tab Title -->`, in body-local offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Marker {
    start: usize,
    end: usize,
    label: String,
}

/// Find `<!-- name [label] -->` markers that belong to this body, skipping
/// those inside code or nested directives.
///
/// A marker sits on one line; a `<!--` that does not close on its own line
/// is plain text and never hides the markers after it.
fn find_markers(text: &str, name: &str) -> Vec<Marker> {
    let protected = Tokenizer::new(text).protected_ranges();
    let mut markers = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find("<!--") {
        let start = pos + rel;
        let inner_start = start + 4;
        pos = inner_start;

        let line_end = text[inner_start..]
            .find('\n')
            .map_or(text.len(), |i| inner_start + i);
        let Some(close) = text[inner_start..line_end].find("-->") else {
            continue;
        };
        if is_protected(&protected, start) {
            continue;
        }
        let inner = text[inner_start..inner_start + close].trim();
        let Some(rest) = inner.strip_prefix(name) else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
            continue;
        }

        let end = inner_start + close + 3;
        markers.push(Marker {
            start,
            end,
            label: rest.split_whitespace().collect::<Vec<_>>().join(" "),
        });
        pos = end;
    }

    markers
}

fn is_protected(ranges: &[Range<usize>], pos: usize) -> bool {
    ranges.iter().any(|r| r.contains(&pos))
}

fn part_at(m: &DirectiveMatch, range: Range<usize>) -> Part {
    Part {
        text: m.body[range.clone()].to_string(),
        offset: m.body_offset + range.start,
        line: m.body_line + m.body[..range.start].matches('\n').count(),
    }
}

/// Split the body into the text before the first marker and one part per
/// marker, paired with the marker's label.
fn split_at_markers(m: &DirectiveMatch, name: &str) -> (Part, Vec<(String, Part)>) {
    let markers = find_markers(&m.body, name);
    let leading_end = markers.first().map_or(m.body.len(), |mk| mk.start);
    let leading = part_at(m, 0..leading_end);

    let sections = markers
        .iter()
        .enumerate()
        .map(|(i, mk)| {
            let end = markers.get(i + 1).map_or(m.body.len(), |next| next.start);
            (mk.label.clone(), part_at(m, mk.end..end))
        })
        .collect();

    (leading, sections)
}

/// Grid cells: every non-blank segment between cell markers. The leading
/// marker is optional, so non-blank text before the first marker is a cell.
fn split_cells(m: &DirectiveMatch) -> Vec<Part> {
    let (leading, sections) = split_at_markers(m, "cell");
    std::iter::once(leading)
        .chain(sections.into_iter().map(|(_, part)| part))
        .filter(|part| !part.is_blank())
        .collect()
}

/// Tabs: one per tab marker. Text before the first marker is dropped.
fn split_tabs(m: &DirectiveMatch) -> Vec<Tab> {
    let (_, sections) = split_at_markers(m, "tab");
    sections
        .into_iter()
        .enumerate()
        .map(|(i, (title, body))| Tab {
            title: if title.is_empty() {
                format!("Tab {}", i + 1)
            } else {
                title
            },
            body,
        })
        .collect()
}

// ------------------------------------------------------------------
// Timeline
// ------------------------------------------------------------------

fn split_timeline(m: &DirectiveMatch) -> Vec<TimelineNode> {
    let (_, sections) = split_at_markers(m, "node");
    if !sections.is_empty() {
        return sections
            .into_iter()
            .map(|(header, body)| TimelineNode { header, body })
            .collect();
    }

    list_items(m)
        .into_iter()
        .map(|item| {
            let (header, content) = split_item_header(&item.text);
            TimelineNode {
                header,
                body: Part {
                    text: content,
                    offset: item.offset,
                    line: item.line,
                },
            }
        })
        .collect()
}

/// Top-level items of a Markdown list, with continuation lines dedented to
/// the item's content column.
fn list_items(m: &DirectiveMatch) -> Vec<Part> {
    let protected = Tokenizer::new(&m.body).protected_ranges();
    let mut items: Vec<(Part, usize)> = Vec::new();
    let mut base_indent: Option<usize> = None;
    let mut offset = 0;

    for (idx, raw) in m.body.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        let marker = if is_protected(&protected, offset) {
            None
        } else {
            list_marker(line).filter(|(indent, _)| base_indent.is_none_or(|b| *indent <= b))
        };

        match marker {
            Some((indent, width)) => {
                base_indent.get_or_insert(indent);
                items.push((
                    Part {
                        text: line[width..].to_string(),
                        offset: m.body_offset + offset,
                        line: m.body_line + idx,
                    },
                    width,
                ));
            }
            None => {
                if let Some((item, width)) = items.last_mut() {
                    item.text.push('\n');
                    item.text.push_str(dedent(line, *width));
                }
            }
        }
        offset += raw.len();
    }

    items.into_iter().map(|(part, _)| part).collect()
}

/// Detect a list item marker. Returns `(indent, content_column)`.
fn list_marker(line: &str) -> Option<(usize, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];

    if let Some(after) = rest.strip_prefix(['-', '*', '+']) {
        return after.starts_with(' ').then_some((indent, indent + 2));
    }

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if (1..=9).contains(&digits) {
        let after = &rest[digits..];
        if after.starts_with(". ") || after.starts_with(") ") {
            return Some((indent, indent + digits + 2));
        }
    }
    None
}

fn dedent(line: &str, width: usize) -> &str {
    let spaces = line.len() - line.trim_start_matches(' ').len();
    &line[spaces.min(width)..]
}

/// Split an item into its header and content.
///
/// A leading `**bold**` span is the header and the rest is content; without
/// one, the first line is the header.
fn split_item_header(text: &str) -> (String, String) {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("**") {
        if let Some(close) = rest.find("**").filter(|&c| c > 0) {
            let header = rest[..close].trim().to_string();
            let content = rest[close + 2..].trim().to_string();
            return (header, content);
        }
    }

    match trimmed.split_once('\n') {
        Some((first, rest)) => (first.trim().to_string(), rest.trim().to_string()),
        None => (trimmed.trim().to_string(), String::new()),
    }
}
