//! Standalone HTML pages around rendered posts.

use stellar_md::{RenderResult, escape_html};

use crate::config::StellarConfig;

/// Page title: the first level-1 heading, else the fallback (usually the
/// file stem).
pub fn page_title(result: &RenderResult, fallback: &str) -> String {
    result
        .headings
        .iter()
        .find(|h| h.level == 1)
        .map(|h| h.text.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Wrap a rendered post in a complete page with the theme stylesheet and a
/// table of contents.
pub fn render_page(result: &RenderResult, title: &str, config: &StellarConfig) -> String {
    let links: String = config
        .stylesheets
        .iter()
        .map(|href| format!("\n    <link rel=\"stylesheet\" href=\"{}\">", escape_html(href)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="stellar-md">
    <title>{title} | {site}</title>
    <style>{css}</style>{links}
</head>
<body>
<main class="stellar-page">
{toc}<article class="md-text content">
{body}
</article>
</main>
</body>
</html>
"#,
        title = escape_html(title),
        site = escape_html(&config.site_title),
        css = THEME_CSS,
        links = links,
        toc = render_toc(result),
        body = result.html,
    )
}

/// Index page linking every built post.
pub fn render_index(posts: &[(String, String)], config: &StellarConfig) -> String {
    let items: String = posts
        .iter()
        .map(|(href, title)| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(href),
                escape_html(title)
            )
        })
        .collect();
    let result = RenderResult {
        html: format!(
            "<h1>{}</h1>\n<ul class=\"post-list\">\n{items}</ul>",
            escape_html(&config.site_title)
        ),
        ..RenderResult::default()
    };
    render_page(&result, "Index", config)
}

fn render_toc(result: &RenderResult) -> String {
    if result.headings.is_empty() {
        return String::new();
    }
    let mut html = String::from("<nav class=\"toc\">\n<ol>\n");
    for heading in &result.headings {
        html.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>\n",
            heading.level,
            escape_html(&heading.id),
            escape_html(&heading.text),
        ));
    }
    html.push_str("</ol>\n</nav>\n");
    html
}

/// Embedded CSS for the tag-plugin DOM.
const THEME_CSS: &str = r#"
:root {
    --text: #1f2328;
    --text-dim: #59636e;
    --card: #f6f8fa;
    --border: #d1d9e0;
    --accent: #2196f3;
    --radius: 8px;
}

*, *::before, *::after { box-sizing: border-box; }
body { margin: 0; color: var(--text); font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; line-height: 1.7; }
.stellar-page { display: grid; grid-template-columns: 14rem minmax(0, 48rem); gap: 2rem; justify-content: center; padding: 2rem 1.5rem 4rem; }
.toc { position: sticky; top: 2rem; align-self: start; font-size: 0.85rem; }
.toc ol { list-style: none; padding: 0; margin: 0; }
.toc a { color: var(--text-dim); text-decoration: none; }
.toc .toc-level-3 { padding-left: 1rem; }
pre { background: var(--card); border-radius: var(--radius); padding: 1rem; overflow-x: auto; }
img { max-width: 100%; }

.tag-plugin { margin: 1rem 0; }

/* note */
.tag-plugin.note { --theme: var(--text-dim); border-left: 4px solid var(--theme); background: var(--card); border-radius: var(--radius); padding: 0.75rem 1rem; }
.tag-plugin.note > .title { margin-bottom: 0.25rem; }
.tag-plugin[color="blue"], .tag-plugin[color="info"] { --theme: #2196f3; }
.tag-plugin[color="green"], .tag-plugin[color="success"] { --theme: #3dc550; }
.tag-plugin[color="orange"], .tag-plugin[color="warning"] { --theme: #ff9800; }
.tag-plugin[color="red"], .tag-plugin[color="error"] { --theme: #f44336; }
.tag-plugin[color="purple"] { --theme: #9c27b0; }
.tag-plugin[color="pink"] { --theme: #e91e63; }

/* folding */
.tag-plugin.folding { border: 1px solid var(--border); border-radius: var(--radius); }
.tag-plugin.folding > summary { cursor: pointer; padding: 0.5rem 1rem; font-weight: 600; color: var(--theme, inherit); }
.tag-plugin.folding > .body { padding: 0 1rem; }

/* timeline */
.tag-plugin.timeline { border-left: 2px solid var(--border); padding-left: 1.25rem; }
.tag-plugin.timeline .timenode { position: relative; margin-bottom: 1rem; }
.tag-plugin.timeline .timenode::before { content: ""; position: absolute; left: -1.6rem; top: 0.55rem; width: 0.6rem; height: 0.6rem; border-radius: 50%; background: var(--accent); }
.tag-plugin.timeline .header { font-weight: 600; color: var(--text-dim); }

/* grid */
.tag-plugin.grid { display: grid; grid-gap: 1rem; }
.tag-plugin.grid > .cell { border-radius: var(--cell-radius, var(--radius)); }
.tag-plugin.grid[bg="card"] > .cell { background: var(--card); padding: 0.75rem 1rem; }

/* tabs */
.tag-plugin.tabs { border: 1px solid var(--border); border-radius: var(--radius); }
.tag-plugin.tabs .nav-tabs { display: flex; gap: 0.25rem; border-bottom: 1px solid var(--border); padding: 0.25rem; }
.tag-plugin.tabs .nav-tab { cursor: pointer; padding: 0.25rem 0.75rem; border-radius: 6px; color: var(--text-dim); }
.tag-plugin.tabs .nav-tab.active { background: var(--card); color: var(--text); }
.tag-plugin.tabs .tab-pane { display: none; padding: 0 1rem; }
.tag-plugin.tabs .tab-pane.active { display: block; }

/* link */
.tag-plugin.link { display: flex; justify-content: space-between; gap: 1rem; padding: 0.75rem 1rem; border-radius: var(--radius); background: var(--card); color: inherit; text-decoration: none; }
.tag-plugin.link[layout="rich"] { flex-direction: column; gap: 0.25rem; }
.tag-plugin.link > span { display: block; }
.tag-plugin.link .top { display: flex; align-items: center; gap: 0.5rem; }
.tag-plugin.link .icon { width: 2rem; height: 2rem; border-radius: 6px; }
.tag-plugin.link .title { display: block; font-weight: 600; }
.tag-plugin.link .url, .tag-plugin.link .domain, .tag-plugin.link .desc { display: block; font-size: 0.85rem; color: var(--text-dim); }

/* button */
.tag-plugin.button { display: inline-flex; align-items: center; gap: 0.4rem; padding: 0.3rem 0.9rem; margin: 0.25rem; border-radius: 999px; background: var(--theme, var(--card)); color: #fff; text-decoration: none; }
.tag-plugin.button[color="default"] { color: var(--text); }
.tag-plugin.button[size="xs"] { font-size: 0.75rem; }
.tag-plugin.button[size="sm"] { font-size: 0.85rem; }
.tag-plugin.button[size="lg"] { font-size: 1.15rem; padding: 0.5rem 1.25rem; }
.tag-plugin.button .icon { width: 1em; height: 1em; }

/* about */
.tag-plugin.about { text-align: center; background: var(--card); border-radius: var(--radius); padding: 1rem; }
.tag-plugin.about .avatar { object-fit: cover; aspect-ratio: 1; }

/* friends */
.tag-plugin.friends:empty::after { content: "Friends are loaded on the live site."; color: var(--text-dim); font-size: 0.85rem; }

@media (max-width: 768px) {
    .stellar-page { grid-template-columns: 1fr; }
    .toc { position: static; }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_md::Renderer;

    #[test]
    fn page_has_title_toc_and_body() {
        let result = Renderer::new().render("# Hello & World\n\n## Part\n\n{% note info %}\nx\n{% endnote %}\n");
        let title = page_title(&result, "fallback");
        assert_eq!(title, "Hello & World");

        let config = StellarConfig {
            stylesheets: vec!["/extra.css".into()],
            ..StellarConfig::default()
        };
        let html = render_page(&result, &title, &config);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Hello &amp; World | Stellar</title>"));
        assert!(html.contains("<a href=\"#part\">Part</a>"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"/extra.css\">"));
        assert!(html.contains("tag-plugin note"));
    }

    #[test]
    fn page_escapes_tag_delimiters_like_fragments() {
        let result = Renderer::new().render("# Using `{% note %}`\n\n## The `{% tabs %}` tag\n");
        let title = page_title(&result, "fallback");
        assert_eq!(title, "Using {% note %}");

        let html = render_page(&result, &title, &StellarConfig::default());
        assert!(html.contains("<title>Using &#123;% note %&#125; | Stellar</title>"), "{html}");
        assert!(html.contains("The &#123;% tabs %&#125; tag</a>"), "{html}");
    }

    #[test]
    fn title_falls_back_without_h1() {
        let result = Renderer::new().render("## Only h2\n");
        assert_eq!(page_title(&result, "my-post"), "my-post");
    }

    #[test]
    fn index_lists_posts() {
        let posts = vec![("a/index.html".to_string(), "A & B".to_string())];
        let html = render_index(&posts, &StellarConfig::default());
        assert!(html.contains("<li><a href=\"a/index.html\">A &amp; B</a></li>"));
        assert!(!html.contains("class=\"toc\""));
    }
}
