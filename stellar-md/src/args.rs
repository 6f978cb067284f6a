//! Directive argument parsing.
//!
//! Arguments are whitespace-separated tokens. A token shaped like `key:value`
//! is an option; everything else is free text, kept in order. Each directive
//! then reads the options it knows and reinterprets the free text through one
//! of the typed views below (`NoteArgs`, `ButtonArgs`, ...).

use std::collections::BTreeMap;

/// Color keywords the note directive accepts as its first word.
pub const NOTE_COLORS: [&str; 11] = [
    "default", "blue", "pink", "red", "purple", "orange", "green", "info", "warning", "error",
    "success",
];

/// Button sizes the theme styles.
pub const BUTTON_SIZES: [&str; 4] = ["xs", "sm", "md", "lg"];

/// Parsed arguments of one directive occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// `key:value` options. A repeated key keeps its last value.
    pub options: BTreeMap<String, String>,
    /// Free-text tokens in their original order.
    pub text: Vec<String>,
    /// Options whose value was literally `true` or `false`.
    pub flags: BTreeMap<String, bool>,
}

impl ParsedArgs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Boolean option; absent or unparseable values are `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    /// Free-text tokens joined with single spaces.
    pub fn joined_text(&self) -> String {
        self.text.join(" ")
    }
}

/// Parse a raw argument string into options, free text and flags.
///
/// Never fails; malformed tokens simply become free text.
pub fn parse_args(input: &str) -> ParsedArgs {
    let mut args = ParsedArgs::default();

    for token in input.split_whitespace() {
        match split_option(token) {
            Some((key, value)) => {
                match value {
                    "true" => {
                        args.flags.insert(key.to_string(), true);
                    }
                    "false" => {
                        args.flags.insert(key.to_string(), false);
                    }
                    _ => {
                        args.flags.remove(key);
                    }
                }
                args.options.insert(key.to_string(), value.to_string());
            }
            None => args.text.push(token.to_string()),
        }
    }

    args
}

/// Split `key:value` on the first colon, if the token is an option.
///
/// The key must be an identifier and the value non-empty. A value may only
/// contain another colon when it is itself a URL (`icon:https://...`), and a
/// value starting with `//` means the token was a bare URL (`https://...`).
fn split_option(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once(':')?;

    let mut chars = key.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    if value.is_empty() || value.starts_with("//") {
        return None;
    }
    if value.contains(':') && !value.contains("://") {
        return None;
    }

    Some((key, value))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// `{% note [color] [title...] %}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteArgs {
    pub color: String,
    pub title: Option<String>,
}

impl NoteArgs {
    pub fn from_args(args: &ParsedArgs) -> Self {
        let mut words = args.text.iter();
        let first = args.text.first();

        let color = match first {
            Some(word) if NOTE_COLORS.contains(&word.as_str()) => {
                words.next();
                word.clone()
            }
            _ => "default".to_string(),
        };
        let title = words.map(String::as_str).collect::<Vec<_>>().join(" ");

        Self {
            color,
            title: non_empty(title),
        }
    }
}

/// `{% folding [color:c] [open:bool] [child:kind] [title...] %}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldingArgs {
    pub color: Option<String>,
    pub open: bool,
    pub child: Option<String>,
    pub title: String,
}

impl FoldingArgs {
    pub fn from_args(args: &ParsedArgs) -> Self {
        Self {
            color: args.get("color").map(str::to_string),
            open: args.flag("open"),
            child: args.get("child").map(str::to_string),
            title: args.joined_text(),
        }
    }
}

/// `{% button [color:c] [size:s] [icon:url] label... url %}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonArgs {
    pub color: String,
    pub size: String,
    pub icon: Option<String>,
    pub url: Option<String>,
    pub label: String,
}

impl ButtonArgs {
    pub fn from_args(args: &ParsedArgs) -> Self {
        let mut url = None;
        let mut label = Vec::new();

        for word in &args.text {
            if is_url_token(word) {
                url = Some(word.clone());
            } else {
                label.push(word.as_str());
            }
        }

        Self {
            color: args.get("color").unwrap_or("default").to_string(),
            size: args.get("size").unwrap_or("md").to_string(),
            icon: args.get("icon").map(str::to_string),
            url,
            label: label.join(" "),
        }
    }
}

/// Whether a button word is its target URL.
///
/// A lone `/` is not a URL; it needs at least one path character after it.
fn is_url_token(word: &str) -> bool {
    word.starts_with("http://")
        || word.starts_with("https://")
        || (word.starts_with('/') && word.len() > 1)
}

/// `{% link url [title...] [title:t] [desc:d] [icon:url] %}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkArgs {
    pub url: Option<String>,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub icon: Option<String>,
}

impl LinkArgs {
    pub fn from_args(args: &ParsedArgs) -> Self {
        let url = args.text.first().cloned();
        let rest = args.text.iter().skip(1).map(String::as_str).collect::<Vec<_>>();
        let title = match args.get("title") {
            Some(t) => Some(t.to_string()),
            None => non_empty(rest.join(" ")),
        };

        Self {
            url,
            title,
            desc: args.get("desc").map(str::to_string),
            icon: args.get("icon").map(str::to_string),
        }
    }

    /// Rich cards carry a description; plain cards do not.
    pub fn is_rich(&self) -> bool {
        self.desc.is_some()
    }
}

/// `{% grid [w:width] [c:columns] [gap:g] [bg:b] [br:radius] %}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridArgs {
    pub width: String,
    pub columns: Option<u32>,
    pub gap: Option<String>,
    pub bg: Option<String>,
    pub radius: Option<String>,
}

impl GridArgs {
    pub fn from_args(args: &ParsedArgs) -> Self {
        Self {
            width: args.get("w").unwrap_or("240px").to_string(),
            columns: args
                .get("c")
                .and_then(|c| c.parse::<u32>().ok())
                .filter(|&c| c > 0),
            gap: args.get("gap").map(str::to_string),
            bg: args.get("bg").map(str::to_string),
            radius: args.get("br").map(str::to_string),
        }
    }

    /// Inline style for the grid container. Explicit columns win over
    /// width-based auto-fill.
    pub fn style(&self) -> String {
        let mut style = match self.columns {
            Some(c) => format!("grid-template-columns: repeat({c}, minmax(0, 1fr));"),
            None => format!(
                "grid-template-columns: repeat(auto-fill, minmax({}, 1fr));",
                self.width
            ),
        };
        if let Some(gap) = &self.gap {
            style.push_str(&format!(" grid-gap: {gap};"));
        }
        if let Some(radius) = &self.radius {
            style.push_str(&format!(" --cell-radius: {radius};"));
        }
        style
    }
}

/// `{% about [avatar:url] [height:h] [border:radius] %}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AboutArgs {
    pub avatar: Option<String>,
    pub height: String,
    pub border: String,
}

impl AboutArgs {
    pub fn from_args(args: &ParsedArgs) -> Self {
        Self {
            avatar: args.get("avatar").map(str::to_string),
            height: args.get("height").unwrap_or("80px").to_string(),
            border: args.get("border").unwrap_or("50%").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_args() {
        let args = parse_args("");
        assert!(args.options.is_empty());
        assert!(args.text.is_empty());
        assert!(args.flags.is_empty());
    }

    #[test]
    fn options_and_text_split() {
        let args = parse_args("color:blue  open:true   My   Title");
        assert_eq!(args.get("color"), Some("blue"));
        assert!(args.flag("open"));
        assert_eq!(args.text, vec!["My", "Title"]);
        assert_eq!(args.joined_text(), "My Title");
    }

    #[test]
    fn false_and_garbage_booleans() {
        let args = parse_args("open:false child:yes");
        assert!(!args.flag("open"));
        assert!(!args.flag("child"));
        assert!(!args.flag("missing"));
        assert_eq!(args.flags.get("open"), Some(&false));
    }

    #[test]
    fn last_duplicate_key_wins() {
        let args = parse_args("color:red color:green open:true open:maybe");
        assert_eq!(args.get("color"), Some("green"));
        assert!(!args.flag("open"));
    }

    #[test]
    fn bare_urls_are_text() {
        let args = parse_args("https://example.com/a http://x.org");
        assert!(args.options.is_empty());
        assert_eq!(args.text, vec!["https://example.com/a", "http://x.org"]);
    }

    #[test]
    fn url_values_are_options() {
        let args = parse_args("icon:https://cdn.example.com/i.png");
        assert_eq!(args.get("icon"), Some("https://cdn.example.com/i.png"));
    }

    #[test]
    fn ambiguous_colons_are_text() {
        let args = parse_args("12:30 a:b:c :x y: Note:");
        assert!(args.options.is_empty(), "{:?}", args.options);
        assert_eq!(args.text, vec!["12:30", "a:b:c", ":x", "y:", "Note:"]);
    }

    #[test]
    fn note_color_keyword() {
        let note = NoteArgs::from_args(&parse_args("warning Careful now"));
        assert_eq!(note.color, "warning");
        assert_eq!(note.title.as_deref(), Some("Careful now"));
    }

    #[test]
    fn note_without_keyword_is_all_title() {
        let note = NoteArgs::from_args(&parse_args("Careful now"));
        assert_eq!(note.color, "default");
        assert_eq!(note.title.as_deref(), Some("Careful now"));
    }

    #[test]
    fn note_keyword_only() {
        let note = NoteArgs::from_args(&parse_args("info"));
        assert_eq!(note.color, "info");
        assert_eq!(note.title, None);
    }

    #[test]
    fn note_keyword_is_case_sensitive() {
        let note = NoteArgs::from_args(&parse_args("Info box"));
        assert_eq!(note.color, "default");
        assert_eq!(note.title.as_deref(), Some("Info box"));
    }

    #[test]
    fn folding_defaults_closed() {
        let folding = FoldingArgs::from_args(&parse_args("color:blue Hidden stuff"));
        assert!(!folding.open);
        assert_eq!(folding.color.as_deref(), Some("blue"));
        assert_eq!(folding.title, "Hidden stuff");
        let open = FoldingArgs::from_args(&parse_args("open:true child:codeblock Code"));
        assert!(open.open);
        assert_eq!(open.child.as_deref(), Some("codeblock"));
        let upper = FoldingArgs::from_args(&parse_args("open:TRUE x"));
        assert!(!upper.open);
    }

    #[test]
    fn button_url_and_label() {
        let button = ButtonArgs::from_args(&parse_args("color:blue size:lg Get started https://x.io"));
        assert_eq!(button.color, "blue");
        assert_eq!(button.size, "lg");
        assert_eq!(button.url.as_deref(), Some("https://x.io"));
        assert_eq!(button.label, "Get started");
    }

    #[test]
    fn button_lone_slash_is_label() {
        let button = ButtonArgs::from_args(&parse_args("color:red Danger /"));
        assert_eq!(button.color, "red");
        assert_eq!(button.url, None);
        assert_eq!(button.label, "Danger /");
        assert_eq!(button.size, "md");
    }

    #[test]
    fn button_last_url_wins() {
        let button = ButtonArgs::from_args(&parse_args("/a Go /b"));
        assert_eq!(button.url.as_deref(), Some("/b"));
        assert_eq!(button.label, "Go");
    }

    #[test]
    fn link_plain_and_rich() {
        let plain = LinkArgs::from_args(&parse_args("https://nextjs.org/ Next.js site"));
        assert_eq!(plain.url.as_deref(), Some("https://nextjs.org/"));
        assert_eq!(plain.title.as_deref(), Some("Next.js site"));
        assert!(!plain.is_rich());

        let rich = LinkArgs::from_args(&parse_args(
            "https://github.com/ desc:Code icon:https://github.com/favicon.png",
        ));
        assert!(rich.is_rich());
        assert_eq!(rich.title, None);
        assert_eq!(rich.icon.as_deref(), Some("https://github.com/favicon.png"));
    }

    #[test]
    fn link_title_option_overrides_words() {
        let link = LinkArgs::from_args(&parse_args("https://nextjs.org/ title:Next.js ignored"));
        assert_eq!(link.title.as_deref(), Some("Next.js"));
    }

    #[test]
    fn grid_width_default_and_columns_precedence() {
        let grid = GridArgs::from_args(&parse_args(""));
        assert_eq!(grid.width, "240px");
        assert_eq!(
            grid.style(),
            "grid-template-columns: repeat(auto-fill, minmax(240px, 1fr));"
        );

        let grid = GridArgs::from_args(&parse_args("w:200px c:3 gap:16px br:12px bg:card"));
        assert_eq!(
            grid.style(),
            "grid-template-columns: repeat(3, minmax(0, 1fr)); grid-gap: 16px; --cell-radius: 12px;"
        );
        assert_eq!(grid.bg.as_deref(), Some("card"));
    }

    #[test]
    fn grid_bad_columns_fall_back_to_width() {
        let grid = GridArgs::from_args(&parse_args("c:three w:100px"));
        assert_eq!(grid.columns, None);
        assert!(grid.style().contains("minmax(100px, 1fr)"));
    }

    #[test]
    fn about_defaults() {
        let about = AboutArgs::from_args(&parse_args("avatar:/me.png"));
        assert_eq!(about.avatar.as_deref(), Some("/me.png"));
        assert_eq!(about.height, "80px");
        assert_eq!(about.border, "50%");
    }
}
