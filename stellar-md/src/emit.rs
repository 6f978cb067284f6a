//! Directive emitters.
//!
//! Each emitter turns one resolved [`Directive`] into the theme's DOM. Block
//! fragments put their opening and closing tags on lines of their own with
//! blank lines around the body, so the Markdown compiler treats the tags as
//! raw HTML blocks and still compiles the body between them. Link cards are
//! blocks too: the `<a>` sits alone on its line and holds only `<span>`s.

use tracing::trace;

use crate::args::{AboutArgs, ButtonArgs, FoldingArgs, GridArgs, LinkArgs, NoteArgs};
use crate::directives::{Directive, Part, Tab, TimelineNode};
use crate::markdown::render_inline;

/// Safe `rel` for anchors that leave the site.
const EXTERNAL_REL: &str = "external nofollow noopener noreferrer";

/// Services an emitter needs from the pipeline driving it.
pub(crate) trait EmitContext {
    /// Expand the directives inside a body part, returning Markdown with the
    /// nested fragments spliced in.
    fn expand(&mut self, part: &Part) -> String;

    /// A cluster id for the next tabs directive, unique within the render.
    fn next_tab_id(&mut self) -> String;
}

/// Emit the fragment for one directive.
pub(crate) fn emit(directive: &Directive, cx: &mut dyn EmitContext) -> String {
    trace!(kind = %directive.kind(), "emitting directive");
    match directive {
        Directive::Note { args, body } => emit_note(args, &cx.expand(body)),
        Directive::Folding { args, body } => emit_folding(args, &cx.expand(body)),
        Directive::Timeline { nodes } => emit_timeline(nodes, cx),
        Directive::Grid { args, cells } => emit_grid(args, cells, cx),
        Directive::Tabs { tabs } => {
            let id = cx.next_tab_id();
            emit_tabs(&id, tabs, cx)
        }
        Directive::Link(args) => emit_link(args),
        Directive::Button(args) => emit_button(args),
        Directive::About { args, body } => emit_about(args, &cx.expand(body)),
        Directive::Friends { raw } => emit_friends(raw),
    }
}

/// Escape HTML special characters. Tag delimiters are escaped too, so an
/// emitted fragment never contains text that looks like a directive.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace("{%", "&#123;%")
        .replace("%}", "%&#125;")
}

/// Inline Markdown for titles, headers and labels.
fn inline(text: &str) -> String {
    render_inline(text)
        .replace("{%", "&#123;%")
        .replace("%}", "%&#125;")
}

/// Body Markdown between blank lines.
fn block_body(body: &str) -> String {
    let trimmed = body.trim_matches(|c| c == '\n' || c == '\r');
    if trimmed.trim().is_empty() {
        "\n\n".to_string()
    } else {
        format!("\n\n{trimmed}\n\n")
    }
}

fn attr(name: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!(" {name}=\"{}\"", escape_html(v)),
        None => String::new(),
    }
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn href_attrs(url: Option<&str>) -> String {
    match url {
        Some(u) if is_external(u) => format!(
            " href=\"{}\" target=\"_blank\" rel=\"{EXTERNAL_REL}\"",
            escape_html(u)
        ),
        Some(u) => format!(" href=\"{}\"", escape_html(u)),
        None => String::new(),
    }
}

fn icon_img(class: &str, src: &str) -> String {
    format!(
        "<img class=\"{class}\" src=\"{}\" referrerpolicy=\"no-referrer\" alt=\"\">",
        escape_html(src)
    )
}

/// Host part of a URL, for link card captions.
fn domain_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

fn emit_note(args: &NoteArgs, body: &str) -> String {
    let title = match &args.title {
        Some(t) => format!("<div class=\"title\"><strong>{}</strong></div>", inline(t)),
        None => String::new(),
    };
    format!(
        "\n\n<div class=\"tag-plugin note\" color=\"{}\">{title}<div class=\"body\">{}</div></div>\n\n",
        escape_html(&args.color),
        block_body(body),
    )
}

fn emit_folding(args: &FoldingArgs, body: &str) -> String {
    let open = if args.open { " open" } else { "" };
    format!(
        "\n\n<details class=\"tag-plugin folding\"{}{}{open}><summary><span>{}</span></summary><div class=\"body\">{}</div></details>\n\n",
        attr("color", args.color.as_deref()),
        attr("child", args.child.as_deref()),
        inline(&args.title),
        block_body(body),
    )
}

fn emit_timeline(nodes: &[TimelineNode], cx: &mut dyn EmitContext) -> String {
    let mut html = String::from("\n\n<div class=\"tag-plugin timeline\">\n\n");
    for (index, node) in nodes.iter().enumerate() {
        html.push_str(&format!(
            "<div class=\"timenode\" index=\"{index}\"><div class=\"header\">{}</div><div class=\"body\">{}</div></div>\n\n",
            inline(&node.header),
            block_body(&cx.expand(&node.body)),
        ));
    }
    html.push_str("</div>\n\n");
    html
}

fn emit_grid(args: &GridArgs, cells: &[Part], cx: &mut dyn EmitContext) -> String {
    let mut html = format!(
        "\n\n<div class=\"tag-plugin grid\"{} style=\"{}\">\n\n",
        attr("bg", args.bg.as_deref()),
        escape_html(&args.style()),
    );
    for cell in cells {
        html.push_str(&format!(
            "<div class=\"cell\">{}</div>\n\n",
            block_body(&cx.expand(cell))
        ));
    }
    html.push_str("</div>\n\n");
    html
}

fn emit_tabs(id: &str, tabs: &[Tab], cx: &mut dyn EmitContext) -> String {
    let id = escape_html(id);
    let mut nav = String::new();
    let mut panes = String::new();

    for (i, tab) in tabs.iter().enumerate() {
        let active = if i == 0 { " active" } else { "" };
        let pane_id = format!("{id}-{}", i + 1);
        nav.push_str(&format!(
            "<a class=\"nav-tab{active}\" data-pane=\"{pane_id}\">{}</a>",
            inline(&tab.title)
        ));
        panes.push_str(&format!(
            "<div class=\"tab-pane{active}\" id=\"{pane_id}\">{}</div>\n\n",
            block_body(&cx.expand(&tab.body))
        ));
    }

    format!(
        "\n\n<div class=\"tag-plugin tabs\" id=\"{id}\"><div class=\"nav-tabs\">{nav}</div><div class=\"tab-content\">\n\n{panes}</div></div>\n\n"
    )
}

fn emit_link(args: &LinkArgs) -> String {
    let url = args.url.as_deref().unwrap_or("");
    let title = match &args.title {
        Some(t) => inline(t),
        None if !url.is_empty() => escape_html(domain_of(url)),
        None => String::new(),
    };
    let href = href_attrs(args.url.as_deref());

    if let Some(desc) = &args.desc {
        let icon = args
            .icon
            .as_deref()
            .map(|i| icon_img("icon", i))
            .unwrap_or_default();
        format!(
            "\n\n<a class=\"tag-plugin link\" layout=\"rich\"{href}>\n<span class=\"top\">{icon}<span class=\"domain\">{}</span></span><span class=\"bottom\"><span class=\"title\">{title}</span><span class=\"desc\">{}</span></span>\n</a>\n\n",
            escape_html(domain_of(url)),
            inline(desc),
        )
    } else {
        let icon = args
            .icon
            .as_deref()
            .map(|i| format!("<span class=\"right\">{}</span>", icon_img("icon", i)))
            .unwrap_or_default();
        format!(
            "\n\n<a class=\"tag-plugin link\" layout=\"plain\"{href}>\n<span class=\"left\"><span class=\"title\">{title}</span><span class=\"url\">{}</span></span>{icon}\n</a>\n\n",
            escape_html(url),
        )
    }
}

fn emit_button(args: &ButtonArgs) -> String {
    let icon = args
        .icon
        .as_deref()
        .map(|i| icon_img("icon", i))
        .unwrap_or_default();
    format!(
        "<a class=\"tag-plugin button\" color=\"{}\" size=\"{}\"{}>{icon}<span>{}</span></a>",
        escape_html(&args.color),
        escape_html(&args.size),
        href_attrs(args.url.as_deref()),
        inline(&args.label),
    )
}

fn emit_about(args: &AboutArgs, body: &str) -> String {
    let avatar = match &args.avatar {
        Some(src) => format!(
            "<img class=\"avatar\" src=\"{}\" style=\"height: {}; border-radius: {};\" referrerpolicy=\"no-referrer\" alt=\"\">",
            escape_html(src),
            escape_html(&args.height),
            escape_html(&args.border),
        ),
        None => String::new(),
    };
    format!(
        "\n\n<div class=\"tag-plugin about\"><div class=\"about-header\">{avatar}</div><div class=\"about-body\">{}</div></div>\n\n",
        block_body(body),
    )
}

fn emit_friends(raw: &str) -> String {
    format!(
        "\n\n<div class=\"tag-plugin friends\" data-args=\"{}\"></div>\n\n",
        escape_html(raw)
    )
}
