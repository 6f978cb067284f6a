use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod build;
mod config;
mod init;
mod page;

#[derive(Parser)]
#[command(name = "stellar", version, about = "Render Stellar tag directives in Markdown")]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RenderFormat {
    /// HTML fragment
    Html,
    /// Standalone page with theme stylesheet and table of contents
    Page,
    /// JSON with html, headings and diagnostics
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Markdown file with directives
    Render {
        /// Path to the .md file
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "html")]
        format: RenderFormat,
    },

    /// Check Markdown file(s) for malformed directives
    Check {
        /// Path to the .md file(s)
        files: Vec<String>,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },

    /// Build every post under the content directory into HTML pages
    Build {
        /// Site root containing stellar.json
        #[arg(long, default_value = ".")]
        root: String,

        /// Rebuild when posts change
        #[arg(long)]
        watch: bool,
    },

    /// Scaffold a new site
    Init {
        /// Directory to initialize (default: current directory)
        path: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render { file, format } => {
            handle_render(&file, format)?;
        }
        Commands::Check { files, strict } => {
            handle_check(&files, strict)?;
        }
        Commands::Build { root, watch } => {
            let root = Path::new(&root);
            let report = build::handle_build(root, cli.quiet)?;
            if !cli.quiet {
                report.print_summary();
            }
            if watch {
                build::watch_and_rebuild(root, cli.quiet)?;
            }
        }
        Commands::Init { path } => {
            init::init_site(path.as_deref(), cli.quiet)?;
        }
    }

    Ok(())
}

fn location(file: &str, diag: &stellar_md::Diagnostic) -> String {
    match diag.span {
        Some(span) => format!("{}:{}", file, span.start_line),
        None => file.to_string(),
    }
}

fn handle_render(file: &str, format: RenderFormat) -> Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read '{file}'"))?;

    let output = match format {
        RenderFormat::Html | RenderFormat::Json => {
            let result = stellar_md::Renderer::new().render(&content);
            print_diagnostics(file, &result.diagnostics);
            if matches!(format, RenderFormat::Json) {
                serde_json::to_string_pretty(&result)?
            } else {
                result.html
            }
        }
        RenderFormat::Page => {
            let config = config::load_config(Path::new("."))?;
            let result = stellar_md::Renderer::with_options(config.render.options()).render(&content);
            print_diagnostics(file, &result.diagnostics);
            let stem = Path::new(file)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file.to_string());
            let title = page::page_title(&result, &stem);
            page::render_page(&result, &title, &config)
        }
    };

    println!("{output}");
    Ok(())
}

/// Plain `file:line: message` lines on stderr.
pub(crate) fn print_diagnostics(file: &str, diagnostics: &[stellar_md::Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}: {}", location(file, diag), diag.message);
    }
}

fn handle_check(files: &[String], strict: bool) -> Result<()> {
    let mut failed = false;

    for file in files {
        let content =
            std::fs::read_to_string(file).with_context(|| format!("Failed to read '{file}'"))?;

        let diagnostics = stellar_md::check(&content);

        if diagnostics.is_empty() {
            println!("{}: {}", file, "OK".green());
            continue;
        }

        for diag in &diagnostics {
            let severity_str = match diag.severity {
                stellar_md::Severity::Error => {
                    failed = true;
                    format!("{}", "error".red().bold())
                }
                stellar_md::Severity::Warning => {
                    failed |= strict;
                    format!("{}", "warning".yellow().bold())
                }
                stellar_md::Severity::Info => format!("{}", "info".cyan().bold()),
            };

            let code_str = match &diag.code {
                Some(c) => format!("[{c}] "),
                None => String::new(),
            };

            println!(
                "{}: {severity_str}: {code_str}{}",
                location(file, diag),
                diag.message
            );
        }
    }

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
