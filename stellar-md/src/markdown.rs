//! Markdown compilation.
//!
//! The pipeline hands the fully expanded document to a [`MarkdownCompiler`].
//! [`CmarkCompiler`] is the default, built on `pulldown-cmark` with the GFM
//! extensions. Raw HTML (including every directive fragment) passes through
//! untouched; fenced code gets the highlighter's class hook; headings get
//! de-duplicated anchor ids and are collected as a table of contents.

use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::emit::escape_html;
use crate::types::Heading;

/// Output of a Markdown compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiled {
    pub html: String,
    /// Headings in document order with their assigned ids.
    pub headings: Vec<Heading>,
}

/// A Markdown-to-HTML compiler the renderer can hand off to.
pub trait MarkdownCompiler {
    fn compile(&self, text: &str) -> Compiled;
}

/// `pulldown-cmark` backed compiler.
#[derive(Debug, Clone)]
pub struct CmarkCompiler {
    /// Assign anchor ids to headings.
    pub heading_ids: bool,
    /// Class prefix for the fence language (`language-rust`).
    pub code_class_prefix: String,
}

impl Default for CmarkCompiler {
    fn default() -> Self {
        Self {
            heading_ids: true,
            code_class_prefix: "language-".to_string(),
        }
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

impl MarkdownCompiler for CmarkCompiler {
    fn compile(&self, text: &str) -> Compiled {
        let mut events: Vec<Event> = Vec::new();
        let mut headings = Vec::new();
        let mut ids = IdGenerator::default();

        let mut parser = Parser::new_ext(text, options());
        while let Some(event) = parser.next() {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let inner = collect_until_end(&mut parser);
                    let heading_text = plain_text(&inner);
                    let id = match id {
                        Some(explicit) => explicit.to_string(),
                        None => ids.generate(&heading_text),
                    };
                    headings.push(Heading {
                        level: level as u8,
                        text: heading_text,
                        id: id.clone(),
                    });
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: self.heading_ids.then(|| CowStr::from(id)),
                        classes,
                        attrs,
                    }));
                    events.extend(inner);
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let inner = collect_until_end(&mut parser);
                    events.push(Event::Html(self.code_block(&kind, &plain_text(&inner)).into()));
                }
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    let inner = collect_until_end(&mut parser);
                    events.push(Event::InlineHtml(
                        image_tag(&dest_url, &title, &plain_text(&inner)).into(),
                    ));
                }
                other => events.push(other),
            }
        }

        let mut html = String::with_capacity(text.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        Compiled { html, headings }
    }
}

impl CmarkCompiler {
    fn code_block(&self, kind: &CodeBlockKind, code: &str) -> String {
        let lang = match kind {
            CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
            CodeBlockKind::Indented => "",
        };
        let class = if lang.is_empty() {
            "hljs".to_string()
        } else {
            format!("hljs {}{}", self.code_class_prefix, escape_html(lang))
        };
        format!("<pre><code class=\"{class}\">{}</code></pre>\n", escape_html(code))
    }
}

/// Consume events up to the end of the element whose start was just read.
fn collect_until_end<'a>(parser: &mut Parser<'a>) -> Vec<Event<'a>> {
    let mut depth = 0usize;
    let mut inner = Vec::new();
    for event in parser.by_ref() {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            _ => {}
        }
        inner.push(event);
    }
    inner
}

fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn image_tag(src: &str, title: &str, alt: &str) -> String {
    let title = if title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_html(title))
    };
    format!(
        "<img src=\"{}\" alt=\"{}\"{title} referrerpolicy=\"no-referrer\" />",
        escape_html(src),
        escape_html(alt),
    )
}

/// Hands out unique heading ids: `slug`, `slug-1`, `slug-2`, ...
#[derive(Debug, Default)]
struct IdGenerator {
    counts: HashMap<String, usize>,
}

impl IdGenerator {
    fn generate(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.counts.entry(base.clone()).or_default();
        let id = match *count {
            0 => base,
            n => format!("{base}-{n}"),
        };
        *count += 1;
        id
    }
}

/// Convert heading text to an anchor slug.
///
/// Lowercases, keeps letters and digits from any script, collapses
/// whitespace, dashes and underscores into single dashes and drops the rest.
/// Text with nothing left becomes `section`.
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    if result.is_empty() {
        result.push_str("section");
    }
    result
}

/// Render a short title as inline Markdown.
///
/// Raw HTML is shown as text. Anything that does not come out as a single
/// paragraph (a title that looks like a list item or a heading) is escaped
/// verbatim instead.
pub(crate) fn render_inline(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let events = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events);

    match html
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>\n"))
    {
        Some(inner) if !inner.contains("<p>") => inner.to_string(),
        _ => escape_html(text),
    }
}
