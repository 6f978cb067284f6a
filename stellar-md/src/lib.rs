//! `stellar-md` — renderer for Stellar-style tag directives in Markdown.
//!
//! Authors write ordinary Markdown with `{% name args %} ... {% endname %}`
//! directives for the theme's components (notes, folding sections,
//! timelines, grids, tabs, link cards, buttons, about cards and friend
//! galleries). This crate expands the directives into the theme's DOM and
//! compiles the result to HTML.
//!
//! # Quick start
//!
//! ```
//! let html = stellar_md::render("{% note info Heads up %}\nHello!\n{% endnote %}");
//! assert!(html.contains("<div class=\"tag-plugin note\" color=\"info\">"));
//! assert!(html.contains("<p>Hello!</p>"));
//! ```
//!
//! Use [`Renderer`] for options, headings and diagnostics:
//!
//! ```
//! use stellar_md::{RenderOptions, Renderer};
//!
//! let renderer = Renderer::with_options(RenderOptions {
//!     tab_script: false,
//!     ..RenderOptions::default()
//! });
//! let result = renderer.render("# Intro\n\n{% note %}\nunclosed");
//! assert_eq!(result.headings[0].id, "intro");
//! assert_eq!(result.diagnostics[0].code.as_deref(), Some("W001"));
//! ```

pub mod args;
pub mod directives;
mod emit;
pub mod error;
mod fence;
pub mod markdown;
pub mod render;
pub mod tokenize;
pub mod types;
pub mod validate;

pub use emit::escape_html;
pub use error::*;
pub use markdown::{CmarkCompiler, Compiled, MarkdownCompiler};
pub use render::{RenderOptions, RenderResult, Renderer, TAB_SCRIPT, render};
pub use tokenize::{Tokenized, Tokenizer, tokenize};
pub use types::*;
pub use validate::check;
