//! `stellar build` — render every post under the content directory into a
//! static page, plus an index listing them.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use notify::{EventKind, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use stellar_md::{Renderer, Severity};
use walkdir::WalkDir;

use crate::config::{self, StellarConfig};
use crate::page;

/// Aggregate report from one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub warnings: Vec<String>,
}

impl BuildReport {
    fn record(&mut self, status: WriteStatus) {
        match status {
            WriteStatus::Created => self.created += 1,
            WriteStatus::Updated => self.updated += 1,
            WriteStatus::Unchanged => self.unchanged += 1,
        }
    }

    pub fn print_summary(&self) {
        println!();
        println!("{}", "========================================".dimmed());
        println!("{}", "Build complete!".green().bold());

        let mut parts = Vec::new();
        if self.created > 0 {
            parts.push(format!("{} created", self.created));
        }
        if self.updated > 0 {
            parts.push(format!("{} updated", self.updated));
        }
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if !parts.is_empty() {
            println!("Pages: {}", parts.join(", "));
        }

        for w in &self.warnings {
            println!("{} {}", "WARNING:".yellow(), w);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteStatus {
    Created,
    Updated,
    Unchanged,
}

/// Build the site rooted at `root`.
pub fn handle_build(root: &Path, quiet: bool) -> Result<BuildReport> {
    let config = config::load_config(root)?;
    let content_dir = root.join(&config.content_dir);
    let out_dir = root.join(&config.out_dir);

    if !content_dir.is_dir() {
        bail!(
            "Content directory '{}' not found (run `stellar init`?)",
            content_dir.display()
        );
    }

    let renderer = Renderer::with_options(config.render.options());
    let mut report = BuildReport::default();
    let mut index = Vec::new();

    for post in collect_posts(&content_dir)? {
        let rel = post.strip_prefix(&content_dir).unwrap_or(post.as_path());
        let shown = rel.display().to_string();
        let content = std::fs::read_to_string(&post)
            .with_context(|| format!("Failed to read '{}'", post.display()))?;

        let result = renderer.render(&content);
        crate::print_diagnostics(&shown, &result.diagnostics);
        let errors = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        if errors > 0 {
            report
                .warnings
                .push(format!("{shown}: {errors} directive error(s)"));
        }

        let href = page_href(rel);
        let title = page::page_title(&result, &post_stem(rel));
        let html = page::render_page(&result, &title, &config);
        let dest = out_dir.join(&href);
        let status = write_if_changed(&dest, &html)?;
        report.record(status);
        tracing::debug!(post = %shown, ?status, "built");

        if !quiet && status != WriteStatus::Unchanged {
            println!("  {} {} → {}", "page".dimmed(), shown, dest.display());
        }
        index.push((href, title));
    }

    if index.is_empty() {
        report.warnings.push(format!(
            "No posts found under {}",
            content_dir.display()
        ));
    }

    let index_html = page::render_index(&index, &config);
    report.record(write_if_changed(&out_dir.join("index.html"), &index_html)?);

    tracing::info!(
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        "build finished"
    );
    Ok(report)
}

/// Every `*.md` file under `dir`, sorted by path.
fn collect_posts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut posts = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk '{}'", dir.display()))?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            posts.push(entry.into_path());
        }
    }
    Ok(posts)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

fn post_stem(rel: &Path) -> String {
    rel.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `guides/intro.md` → `guides/intro/index.html`, always with `/`.
fn page_href(rel: &Path) -> String {
    let mut segments: Vec<String> = rel
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    segments.push(post_stem(rel));
    segments.push("index.html".to_string());
    segments.join("/")
}

/// Write `contents` unless the file already holds exactly these bytes.
fn write_if_changed(path: &Path, contents: &str) -> Result<WriteStatus> {
    let status = if path.exists() {
        if file_hash(path)? == content_hash(contents.as_bytes()) {
            return Ok(WriteStatus::Unchanged);
        }
        WriteStatus::Updated
    } else {
        WriteStatus::Created
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(status)
}

/// Compute SHA-256 hash of file contents.
fn file_hash(path: &Path) -> Result<String> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content_hash(&content))
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Watch the content directory and stellar.json, rebuilding on each save.
///
/// Debounces rapid events (e.g. editors that write in stages) with a 200ms window.
/// Ctrl+C exits cleanly.
pub fn watch_and_rebuild(root: &Path, quiet: bool) -> Result<()> {
    let config: StellarConfig = config::load_config(root)?;
    let content_dir = std::fs::canonicalize(root.join(&config.content_dir))
        .with_context(|| format!("Cannot resolve content directory '{}'", config.content_dir))?;
    let out_dir = root.join(&config.out_dir);
    let out_dir = std::fs::canonicalize(&out_dir).unwrap_or(out_dir);

    println!(
        "{} {} for changes (Ctrl+C to stop)",
        "Watching".cyan().bold(),
        content_dir.display()
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(&content_dir, RecursiveMode::Recursive)?;
    let config_path = root.join(config::CONFIG_FILE);
    if config_path.exists() {
        watcher.watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    let mut last_rebuild = Instant::now();
    let debounce = Duration::from_millis(200);

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => {
                let relevant_kind = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );
                let relevant_path = event.paths.iter().any(|p| {
                    !p.starts_with(&out_dir)
                        && (is_markdown(p) || p.ends_with(config::CONFIG_FILE))
                });

                if relevant_kind && relevant_path && last_rebuild.elapsed() > debounce {
                    // Let the editor finish writing.
                    std::thread::sleep(Duration::from_millis(50));

                    match handle_build(root, quiet) {
                        Ok(report) => {
                            if !quiet {
                                report.print_summary();
                            }
                            last_rebuild = Instant::now();
                        }
                        Err(e) => {
                            eprintln!("{} {:#}", "Build error:".red().bold(), e);
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}
