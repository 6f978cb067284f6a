//! Directive tokenizer.
//!
//! Scans document text for `{% name args %}` tags and pairs block tags with
//! their `{% endname %}` closers using an explicit stack, so same-kind
//! directives nest correctly. Only top-level occurrences are returned; a
//! matched body keeps its nested directives as raw text and is tokenized again
//! when the body itself is rendered.

use std::ops::Range;

use crate::error::{Diagnostic, TagError};
use crate::fence::{code_ranges, containing};
use crate::types::{DirectiveKind, DirectiveMatch, Segment, Span};

/// Result of tokenizing a stretch of document text.
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    pub segments: Vec<Segment>,
    /// Malformed tags found at this nesting level.
    pub diagnostics: Vec<Diagnostic>,
}

/// Tokenize a whole document.
///
/// Never fails: unmatched or unknown tags are left in the surrounding text
/// segments verbatim and reported as diagnostics.
pub fn tokenize(input: &str) -> Tokenized {
    Tokenizer::new(input).tokenize()
}

/// Tokenizer over one piece of text.
///
/// The text is either a whole document or a directive body; `with_base`
/// places it in the enclosing document so spans stay absolute.
pub struct Tokenizer<'a> {
    source: &'a str,
    base_offset: usize,
    base_line: usize,
    line_starts: Vec<usize>,
    /// Fenced blocks and code spans, sorted.
    code: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TagKind {
    Open(DirectiveKind),
    Close(DirectiveKind),
    Leaf(DirectiveKind),
    Unknown(String),
}

#[derive(Debug, Clone)]
struct Tag {
    kind: TagKind,
    args: String,
    start: usize,
    end: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_base(source, 0, 1)
    }

    /// Tokenizer for text that starts at byte `base_offset` and 1-based line
    /// `base_line` of the enclosing document.
    pub fn with_base(source: &'a str, base_offset: usize, base_line: usize) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            base_offset,
            base_line,
            line_starts,
            code: code_ranges(source),
        }
    }

    pub fn tokenize(&self) -> Tokenized {
        let tags = self.scan_tags();
        let pairs = match_pairs(&tags);

        let mut out = Tokenized::default();
        let mut cursor = 0;

        for (idx, tag) in tags.iter().enumerate() {
            if tag.start < cursor {
                // Inside a body that was already consumed.
                continue;
            }
            match &tag.kind {
                TagKind::Open(kind) => match pairs[idx] {
                    Some(close_idx) => {
                        let close = &tags[close_idx];
                        self.push_text(&mut out.segments, cursor, tag.start);
                        out.segments.push(Segment::Directive(DirectiveMatch {
                            kind: *kind,
                            args: tag.args.clone(),
                            body: self.source[tag.end..close.start].to_string(),
                            body_offset: self.base_offset + tag.end,
                            body_line: self.line_of(tag.end),
                            span: self.span(tag.start, close.end),
                        }));
                        cursor = close.end;
                    }
                    None => out.diagnostics.push(
                        TagError::Unclosed {
                            kind: *kind,
                            line: self.line_of(tag.start),
                        }
                        .into_diagnostic(Some(self.span(tag.start, tag.end))),
                    ),
                },
                TagKind::Leaf(kind) => {
                    self.push_text(&mut out.segments, cursor, tag.start);
                    out.segments.push(Segment::Directive(DirectiveMatch {
                        kind: *kind,
                        args: tag.args.clone(),
                        body: String::new(),
                        body_offset: self.base_offset + tag.end,
                        body_line: self.line_of(tag.end),
                        span: self.span(tag.start, tag.end),
                    }));
                    cursor = tag.end;
                }
                TagKind::Close(kind) => out.diagnostics.push(
                    TagError::StrayClose {
                        kind: *kind,
                        line: self.line_of(tag.start),
                    }
                    .into_diagnostic(Some(self.span(tag.start, tag.end))),
                ),
                TagKind::Unknown(name) => out.diagnostics.push(
                    TagError::UnknownDirective {
                        name: name.clone(),
                        line: self.line_of(tag.start),
                    }
                    .into_diagnostic(Some(self.span(tag.start, tag.end))),
                ),
            }
        }

        self.push_text(&mut out.segments, cursor, self.source.len());
        out
    }

    /// Local byte ranges that marker scanning must not look into: code
    /// blocks, code spans and complete top-level directives.
    pub(crate) fn protected_ranges(&self) -> Vec<Range<usize>> {
        let tags = self.scan_tags();
        let pairs = match_pairs(&tags);

        let mut ranges: Vec<Range<usize>> = self.code.iter().map(|&(s, e)| s..e).collect();
        let mut cursor = 0;
        for (idx, tag) in tags.iter().enumerate() {
            if tag.start < cursor {
                continue;
            }
            if let (TagKind::Open(_), Some(close_idx)) = (&tag.kind, pairs[idx]) {
                ranges.push(tag.start..tags[close_idx].end);
                cursor = tags[close_idx].end;
            }
        }
        ranges
    }

    fn push_text(&self, segments: &mut Vec<Segment>, from: usize, to: usize) {
        if from < to {
            segments.push(Segment::Text {
                text: self.source[from..to].to_string(),
            });
        }
    }

    /// Find every well-formed tag, skipping code.
    fn scan_tags(&self) -> Vec<Tag> {
        let mut tags = Vec::new();
        let mut pos = 0;

        while pos < self.source.len() {
            let Some(rel) = self.source[pos..].find("{%") else {
                break;
            };
            let start = pos + rel;

            if let Some((_, code_end)) = containing(&self.code, start) {
                pos = code_end;
                continue;
            }

            match parse_tag(&self.source[start..]) {
                Some((kind, args, len)) => {
                    tags.push(Tag {
                        kind,
                        args,
                        start,
                        end: start + len,
                    });
                    pos = start + len;
                }
                None => pos = start + 2,
            }
        }

        tags
    }

    /// Absolute 1-based line number of a local byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        let local = match self.line_starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        };
        self.base_line + local - 1
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span {
            start_line: self.line_of(start),
            end_line: self.line_of(end.saturating_sub(1).max(start)),
            start_offset: self.base_offset + start,
            end_offset: self.base_offset + end,
        }
    }
}

/// Pair each opening tag with its closer.
///
/// A closer matches the innermost open tag of the same kind; anything opened
/// after that tag and still unclosed is abandoned (it stays literal text inside
/// the matched body).
fn match_pairs(tags: &[Tag]) -> Vec<Option<usize>> {
    let mut pairs = vec![None; tags.len()];
    let mut stack: Vec<(usize, DirectiveKind)> = Vec::new();

    for (idx, tag) in tags.iter().enumerate() {
        match tag.kind {
            TagKind::Open(kind) => stack.push((idx, kind)),
            TagKind::Close(kind) => {
                if let Some(pos) = stack.iter().rposition(|(_, k)| *k == kind) {
                    let (open_idx, _) = stack[pos];
                    stack.truncate(pos);
                    pairs[open_idx] = Some(idx);
                }
            }
            TagKind::Leaf(_) | TagKind::Unknown(_) => {}
        }
    }

    pairs
}

/// Offset of the first `%}` in `s`, or `None` if another `{%` opens first.
///
/// Stopping at the next opener keeps scanning linear on text full of
/// unterminated tags.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        match (bytes[i], bytes[i + 1]) {
            (b'%', b'}') => return Some(i),
            (b'{', b'%') => return None,
            _ => {}
        }
    }
    None
}

/// Parse a tag at the start of `s` (which begins with `{%`).
///
/// Returns the tag kind, trimmed argument string and the tag's byte length.
fn parse_tag(s: &str) -> Option<(TagKind, String, usize)> {
    let inner = s.strip_prefix("{%")?;
    let lead = inner.len() - inner.trim_start().len();
    let rest = &inner[lead..];

    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    let name = &rest[..name_len];
    let after_name = &rest[name_len..];

    let close = find_close(after_name)?;
    let raw_args = &after_name[..close];
    if !(raw_args.is_empty() || raw_args.starts_with(char::is_whitespace)) {
        return None;
    }

    let len = 2 + lead + name_len + close + 2;
    let args = raw_args.trim().to_string();

    let kind = if let Some(kind) = DirectiveKind::from_name(name) {
        if kind.is_block() {
            TagKind::Open(kind)
        } else {
            TagKind::Leaf(kind)
        }
    } else if let Some(kind) = name
        .strip_prefix("end")
        .and_then(DirectiveKind::from_name)
        .filter(|k| k.is_block())
    {
        TagKind::Close(kind)
    } else {
        TagKind::Unknown(name.to_string())
    };

    Some((kind, args, len))
}
