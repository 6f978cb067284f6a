//! Directive linting.
//!
//! Walks every directive in a document, nested ones included, and reports
//! malformed tags plus argument problems that would render a degraded
//! fragment. Returns a list of `Diagnostic` items (non-fatal).

use crate::args::BUTTON_SIZES;
use crate::directives::{Directive, resolve};
use crate::error::{Diagnostic, TagError};
use crate::render::MAX_DEPTH;
use crate::tokenize::Tokenizer;
use crate::types::{DirectiveKind, Segment, Span};

/// Check a document and return its diagnostics in document order.
///
/// Reports exactly what a render would, without producing any HTML.
pub fn check(text: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_text(text, 0, 1, 0, &mut diagnostics);
    diagnostics.sort_by_key(|d| d.span.map(|s| s.start_offset));
    diagnostics
}

fn check_text(
    text: &str,
    offset: usize,
    line: usize,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if depth >= MAX_DEPTH {
        return;
    }

    let tokenized = Tokenizer::with_base(text, offset, line).tokenize();
    diagnostics.extend(tokenized.diagnostics);

    for segment in &tokenized.segments {
        let Segment::Directive(m) = segment else {
            continue;
        };
        let directive = resolve(m);
        lint_directive(&directive, m.span, diagnostics);
        for part in directive.parts() {
            check_text(&part.text, part.offset, part.line, depth + 1, diagnostics);
        }
    }
}

pub(crate) fn lint_directive(
    directive: &Directive,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut push = |err: TagError| diagnostics.push(err.into_diagnostic(Some(span)));

    match directive {
        Directive::Link(link) => {
            if link.url.is_none() {
                push(TagError::MissingUrl {
                    kind: DirectiveKind::Link,
                });
            }
        }
        Directive::Button(button) => {
            if button.url.is_none() {
                push(TagError::MissingUrl {
                    kind: DirectiveKind::Button,
                });
            }
            if !BUTTON_SIZES.contains(&button.size.as_str()) {
                push(TagError::ButtonSize {
                    size: button.size.clone(),
                });
            }
        }
        Directive::Tabs { tabs } if tabs.is_empty() => push(TagError::NoMarkers {
            kind: DirectiveKind::Tabs,
            marker: "tab",
        }),
        Directive::Grid { cells, .. } if cells.is_empty() => push(TagError::NoMarkers {
            kind: DirectiveKind::Grid,
            marker: "cell",
        }),
        Directive::Timeline { nodes } if nodes.is_empty() => push(TagError::NoMarkers {
            kind: DirectiveKind::Timeline,
            marker: "node",
        }),
        _ => {}
    }
}
