//! Pipeline driver.
//!
//! Rendering is tokenize-then-rebuild in one pass: the document is split into
//! literal text and top-level directives, each directive is resolved and
//! emitted (its body parts expanded recursively the same way), and the rebuilt
//! text is compiled as Markdown once at the end.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::directives::{Part, resolve};
use crate::emit::{EmitContext, emit};
use crate::error::Diagnostic;
use crate::markdown::{CmarkCompiler, MarkdownCompiler};
use crate::tokenize::Tokenizer;
use crate::types::{Heading, Segment};
use crate::validate::lint_directive;

/// Bodies nested deeper than this are left unexpanded.
pub(crate) const MAX_DEPTH: usize = 64;

/// Client-side tab switching, appended once to documents that contain tabs.
///
/// One delegated click handler per cluster; switching only toggles the
/// `active` class within the clicked cluster.
pub const TAB_SCRIPT: &str = r#"<script>(function () {
  document.querySelectorAll('.tag-plugin.tabs:not([data-tabs-ready])').forEach(function (cluster) {
    cluster.setAttribute('data-tabs-ready', '');
    cluster.addEventListener('click', function (event) {
      var tab = event.target.closest('.nav-tab');
      if (!tab || tab.closest('.tag-plugin.tabs') !== cluster) return;
      var pane = tab.getAttribute('data-pane');
      cluster.querySelectorAll(':scope > .nav-tabs > .nav-tab').forEach(function (t) {
        t.classList.toggle('active', t === tab);
      });
      cluster.querySelectorAll(':scope > .tab-content > .tab-pane').forEach(function (p) {
        p.classList.toggle('active', p.id === pane);
      });
    });
  });
})();</script>
"#;

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append [`TAB_SCRIPT`] when the document contains tabs.
    pub tab_script: bool,
    /// Put anchor ids on heading elements.
    pub heading_ids: bool,
    /// Class prefix for fenced code languages.
    pub code_class_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tab_script: true,
            heading_ids: true,
            code_class_prefix: "language-".to_string(),
        }
    }
}

/// Result of rendering one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    pub html: String,
    pub headings: Vec<Heading>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders documents with a fixed configuration.
///
/// Holds no per-document state, so one renderer can serve any number of
/// concurrent renders.
#[derive(Debug, Clone)]
pub struct Renderer<C = CmarkCompiler> {
    options: RenderOptions,
    compiler: C,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        let compiler = CmarkCompiler {
            heading_ids: options.heading_ids,
            code_class_prefix: options.code_class_prefix.clone(),
        };
        Self { options, compiler }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: MarkdownCompiler> Renderer<C> {
    /// Use a different Markdown compiler.
    pub fn with_compiler(options: RenderOptions, compiler: C) -> Self {
        Self { options, compiler }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a document to HTML. Never fails; problems are reported in
    /// `diagnostics` and the offending text is passed through.
    pub fn render(&self, text: &str) -> RenderResult {
        let mut expansion = Expansion::new(text);
        let expanded = expansion.expand_text(text, 0, 1);
        let compiled = self.compiler.compile(&expanded);

        let mut html = compiled.html;
        if expansion.tabs > 0 && self.options.tab_script {
            html.push_str(TAB_SCRIPT);
        }

        let mut diagnostics = expansion.diagnostics;
        diagnostics.sort_by_key(|d| d.span.map(|s| s.start_offset));

        debug!(
            directives = expansion.directives,
            tabs = expansion.tabs,
            headings = compiled.headings.len(),
            diagnostics = diagnostics.len(),
            "rendered document"
        );

        RenderResult {
            html,
            headings: compiled.headings,
            diagnostics,
        }
    }

    /// Expand directives without compiling Markdown.
    ///
    /// The result is Markdown with raw HTML fragments in place of directives.
    pub fn expand(&self, text: &str) -> String {
        Expansion::new(text).expand_text(text, 0, 1)
    }
}

/// Render a document with default options, returning only the HTML.
pub fn render(text: &str) -> String {
    Renderer::new().render(text).html
}

/// Per-render state.
struct Expansion {
    /// Short content hash that scopes tab cluster ids to this document.
    doc_hash: String,
    tabs: usize,
    directives: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    fn new(text: &str) -> Self {
        let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
        Self {
            doc_hash: digest[..8].to_string(),
            tabs: 0,
            directives: 0,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    fn expand_text(&mut self, text: &str, offset: usize, line: usize) -> String {
        if self.depth >= MAX_DEPTH {
            debug!(line, "nesting too deep, leaving body unexpanded");
            return text.to_string();
        }

        let tokenized = Tokenizer::with_base(text, offset, line).tokenize();
        self.diagnostics.extend(tokenized.diagnostics);

        self.depth += 1;
        let mut out = String::with_capacity(text.len());
        for segment in tokenized.segments {
            match segment {
                Segment::Text { text } => out.push_str(&text),
                Segment::Directive(m) => {
                    self.directives += 1;
                    let directive = resolve(&m);
                    lint_directive(&directive, m.span, &mut self.diagnostics);
                    out.push_str(&emit(&directive, self));
                }
            }
        }
        self.depth -= 1;
        out
    }
}

impl EmitContext for Expansion {
    fn expand(&mut self, part: &Part) -> String {
        self.expand_text(&part.text, part.offset, part.line)
    }

    fn next_tab_id(&mut self) -> String {
        self.tabs += 1;
        format!("tabs-{}-{}", self.doc_hash, self.tabs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_markdown() {
        let html = render("# Hello\n\nSome *text*.\n");
        assert!(html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(html.contains("<p>Some <em>text</em>.</p>"));
    }

    #[test]
    fn note_scenario() {
        let html = render("{% note warning Careful %}\nDo not proceed.\n{% endnote %}");
        assert!(html.contains("<div class=\"tag-plugin note\" color=\"warning\">"));
        assert!(html.contains("<div class=\"title\"><strong>Careful</strong></div>"));
        assert!(html.contains("<p>Do not proceed.</p>"));
    }

    #[test]
    fn body_markdown_is_compiled() {
        let html = render("{% folding Details %}\n- one\n- **two**\n{% endfolding %}");
        assert!(html.contains("<li><strong>two</strong></li>"));
        assert!(html.contains("</div></details>"));
    }

    #[test]
    fn nested_directives_expand() {
        let input = "{% grid c:2 %}\n<!-- cell -->\n{% note info Inner %}\nHi\n{% endnote %}\n<!-- cell -->\n{% button Go /go %}\n{% endgrid %}";
        let result = Renderer::new().render(input);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.html.matches("<div class=\"cell\">").count(), 2);
        assert!(result.html.contains("color=\"info\""));
        assert!(result.html.contains("<a class=\"tag-plugin button\""));
        assert!(!result.html.contains("{%"));
    }

    #[test]
    fn nested_same_kind_notes() {
        let html = render("{% note info Outer %}\nA\n{% note Inner %}\nB\n{% endnote %}\nC\n{% endnote %}");
        assert_eq!(html.matches("class=\"tag-plugin note\"").count(), 2);
        assert!(html.contains("<p>C</p>"));
        assert!(!html.contains("endnote"));
    }

    #[test]
    fn unclosed_directive_stays_literal() {
        let result = Renderer::new().render("{% note info %}\nNo closing tag");
        assert!(result.html.contains("{% note info %}"));
        assert!(!result.html.contains("tag-plugin"));
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("W001"));
    }

    #[test]
    fn tab_ids_are_deterministic_and_unique() {
        let input = "{% tabs %}\n<!-- tab A -->\na\n{% endtabs %}\n\n{% tabs %}\n<!-- tab B -->\nb\n{% endtabs %}";
        let first = render(input);
        assert_eq!(first, render(input));

        let hash = &format!("{:x}", Sha256::digest(input.as_bytes()))[..8];
        assert!(first.contains(&format!("id=\"tabs-{hash}-1\"")));
        assert!(first.contains(&format!("id=\"tabs-{hash}-2\"")));
        assert_eq!(first.matches("<script>").count(), 1);
    }

    #[test]
    fn tab_script_can_be_disabled() {
        let renderer = Renderer::with_options(RenderOptions {
            tab_script: false,
            ..RenderOptions::default()
        });
        let html = renderer.render("{% tabs %}\n<!-- tab A -->\na\n{% endtabs %}").html;
        assert!(html.contains("tag-plugin tabs"));
        assert!(!html.contains("<script>"));
        assert!(!render("no tabs here").contains("<script>"));
    }

    #[test]
    fn headings_inside_directives_are_collected() {
        let result = Renderer::new().render("# Top\n\n{% note %}\n## Inside\n{% endnote %}\n");
        let ids: Vec<_> = result.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "inside"]);
    }

    #[test]
    fn nested_diagnostics_have_document_lines() {
        let result = Renderer::new().render("intro\n\n{% note %}\nx\n{% endgrid %}\n{% endnote %}");
        assert_eq!(result.diagnostics.len(), 1);
        let span = result.diagnostics[0].span.expect("span");
        assert_eq!(span.start_line, 5);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("W002"));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let depth = 200;
        let input = format!("{}x{}", "{% note %}".repeat(depth), "{% endnote %}".repeat(depth));
        let html = render(&input);
        assert!(html.contains("tag-plugin note"));
    }

    #[test]
    fn unterminated_tags_render_in_linear_time() {
        let input = format!("{}%}}", "{% note ".repeat(40_000));
        let started = std::time::Instant::now();
        let result = Renderer::new().render(&input);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(2),
            "took {:?}",
            started.elapsed()
        );
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("W001"));
    }

    #[test]
    fn inline_code_shows_directive_syntax() {
        let html = render("Use `{% button Go /go %}` to add a button.\n");
        assert!(!html.contains("tag-plugin"), "{html}");
        assert!(html.contains("<code>{% button Go /go %}</code>"), "{html}");
    }

    #[test]
    fn link_cards_are_blocks_outside_paragraphs() {
        let html = render(
            "**Plain card:**\n{% link https://nextjs.org/ title:Next.js %}\n\n{% link https://github.com/ desc:Code icon:https://github.com/favicon.ico %}\n",
        );
        assert_eq!(html.matches("<a class=\"tag-plugin link\"").count(), 2);
        assert!(!html.contains("<p><a class=\"tag-plugin link\""), "{html}");
        assert!(html.contains("<p><strong>Plain card:</strong></p>"), "{html}");

        for card in html.split("<a class=\"tag-plugin link\"").skip(1) {
            let card = &card[..card.find("</a>").expect("closed card")];
            assert!(!card.contains("<div"), "{card}");
            assert!(!card.contains("<p>"), "{card}");
        }
    }

    #[test]
    fn expand_leaves_markdown_uncompiled() {
        let out = Renderer::new().expand("*a* {% button Go /go %}");
        assert!(out.starts_with("*a* <a class=\"tag-plugin button\""));
    }

    #[test]
    fn code_fences_show_directive_syntax() {
        let html = render("```md\n{% note info %}\nx\n{% endnote %}\n```\n");
        assert!(html.contains("class=\"hljs language-md\""));
        assert!(!html.contains("tag-plugin"));
        assert!(html.contains("&#123;% note info %&#125;"));
    }
}
