use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CONFIG_FILE, StellarConfig};

/// Scaffold a new site at the given path. Existing files are left alone.
pub fn init_site(path: Option<&str>, quiet: bool) -> Result<()> {
    let target = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let site_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "my-site".to_string());

    if !quiet {
        println!(
            "{} {} at {}",
            "Initializing".green().bold(),
            site_name,
            target.display()
        );
    }

    let config = StellarConfig::default();
    fs::create_dir_all(target.join(&config.content_dir))
        .with_context(|| format!("Failed to create '{}'", target.display()))?;

    let config_json = serde_json::to_string_pretty(&config)?;
    write_new(&target.join(CONFIG_FILE), &config_json, quiet)?;

    let post = Path::new(&config.content_dir).join("hello-stellar.md");
    write_new(&target.join(&post), SHOWCASE_POST, quiet)?;

    if !quiet {
        println!();
        println!("{}", "Done! Next steps:".bold());
        println!("  1. Edit {} or add posts next to it", post.display());
        println!("  2. Run `stellar build --watch` and open {}/index.html", config.out_dir);
    }

    Ok(())
}

fn write_new(path: &Path, contents: &str, quiet: bool) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if path.exists() {
        if !quiet {
            println!("  {} {} (already exists)", "Skipped".yellow(), name);
        }
        return Ok(());
    }

    fs::write(path, contents).with_context(|| format!("Failed to write '{}'", path.display()))?;
    if !quiet {
        println!("  {} {}", "Created".green(), name);
    }
    Ok(())
}

/// Starter post exercising every directive.
const SHOWCASE_POST: &str = r#"# Hello, Stellar

Posts are plain Markdown plus `{% ... %}` tag directives.

{% note info Welcome %}
Edit this file and run `stellar build` to see your changes.
{% endnote %}

## Timeline

{% timeline %}
<!-- node Step 1 -->
Write Markdown.
<!-- node Step 2 -->
Add directives where plain Markdown falls short.
{% endtimeline %}

## Grid

{% grid bg:card c:2 %}
<!-- cell -->
**Left**
Cells take any Markdown.
<!-- cell -->
**Right**
{% note success %}
Including other directives.
{% endnote %}
{% endgrid %}

## Folding

{% folding color:orange Click to expand %}
Hidden until opened.
{% endfolding %}

## Tabs

{% tabs %}
<!-- tab Rust -->
```rust
println!("hello");
```
<!-- tab Shell -->
```sh
echo hello
```
{% endtabs %}

## Links and buttons

{% link https://github.com/ GitHub desc:Where-the-world-builds-software %}

{% button color:blue Home /index.html %}
{% button color:green Source https://github.com/ %}

## About

{% about avatar:https://github.githubassets.com/favicons/favicon.png %}
**Your name**
A short bio.
{% endabout %}

## Friends

{% friends group:default %}
"#;
