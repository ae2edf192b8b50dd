//! Web Analyzer CLI

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use web_analyzer::{
    check_markup_files, has_extension,
    output::{render_console_summary, render_text_feedback, SeverityBuckets, Summary},
    review_source_file, server,
    storybook::{self, StoryLink},
    Config, MarkupDocument, OutputFormat, ReportStore, RuleEngine, RuleResult, ServerConfig,
    ServerOverrides, Severity, MARKUP_EXTENSIONS,
};

#[derive(Parser)]
#[command(name = "web-analyzer")]
#[command(about = "Accessibility checks for HTML and heuristic code review with live webhook updates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', default_value = "text", global = true)]
    format: Format,

    /// Configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check HTML files for accessibility problems and write reports
    Check {
        /// HTML files or directories
        #[arg(required_unless_present = "docs")]
        paths: Vec<PathBuf>,

        /// Check a component's docs view (its page once per story) instead of paths
        #[arg(long, value_name = "COMPONENT", conflicts_with = "paths")]
        docs: Option<String>,

        /// Do not write a11y/report.html and a11y/report.mdx
        #[arg(long)]
        no_reports: bool,

        /// Link reports into a sibling <name>.stories.js
        #[arg(long)]
        stories: bool,
    },
    /// Review source files with the code review heuristics
    Review {
        /// Source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List available rules
    Rules,
    /// Run the review server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides PORT)
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// Webhook secret (overrides WEBHOOK_SECRET)
        #[arg(long)]
        webhook_secret: Option<String>,

        /// Accept webhook deliveries without a signature
        #[arg(long)]
        allow_unsigned_webhooks: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        Commands::Check {
            paths,
            docs,
            no_reports,
            stories,
        } => {
            let options = CheckOptions {
                format: OutputFormat::from(cli.format),
                colored: !cli.no_color,
                write_reports: !*no_reports,
                stories: *stories,
            };
            match docs {
                Some(component) => run_docs_check(&config, component, &options),
                None => run_check(&config, paths, &options),
            }
        }
        Commands::Review { files } => run_review(&cli, &config, files),
        Commands::Rules => run_rules(&cli, &config),
        Commands::Serve {
            host,
            port,
            webhook_secret,
            allow_unsigned_webhooks,
        } => {
            let flags = ServerOverrides {
                host: host.clone(),
                port: *port,
                webhook_secret: webhook_secret.clone(),
                github_token: None,
                allow_unsigned_webhooks: *allow_unsigned_webhooks,
            };
            run_serve(config, flags)
        }
    }
}

fn load_config(cli: &Cli) -> web_analyzer::Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => {
            let cwd = std::env::current_dir().unwrap_or_default();
            Ok(Config::find_and_load(&cwd).unwrap_or_default())
        }
    }
}

struct CheckOptions {
    format: OutputFormat,
    colored: bool,
    write_reports: bool,
    stories: bool,
}

fn run_check(config: &Config, paths: &[PathBuf], options: &CheckOptions) -> ExitCode {
    let files = collect_files(paths, MARKUP_EXTENSIONS, config);
    if files.is_empty() {
        eprintln!("No HTML files found");
        return ExitCode::FAILURE;
    }
    tracing::debug!("checking {} file(s)", files.len());

    let engine = RuleEngine::markup().filtered(config);
    let mut failed = false;
    let mut json_results = Vec::new();

    for (path, result) in check_markup_files(&files, &engine) {
        match result {
            Ok(result) => failed |= finish_check(&path, &result, options, &mut json_results),
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                failed = true;
            }
        }
    }

    if options.format == OutputFormat::Json {
        print_json(&json_results);
    }
    exit_code(failed)
}

fn run_docs_check(config: &Config, component: &str, options: &CheckOptions) -> ExitCode {
    let root = std::env::current_dir().unwrap_or_default();
    let docs = match storybook::docs_document(&root, component) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if options.format == OutputFormat::Text {
        println!(
            "Checking docs view of {} ({} extra stor{})",
            docs.stories.display(),
            docs.variants.len(),
            if docs.variants.len() == 1 { "y" } else { "ies" }
        );
    }

    let document = MarkupDocument::parse(&docs.html, docs.page.display().to_string());
    let result = RuleEngine::markup().filtered(config).evaluate(&document);

    let mut json_results = Vec::new();
    let failed = finish_check(&docs.page, &result, options, &mut json_results);
    if options.format == OutputFormat::Json {
        print_json(&json_results);
    }
    exit_code(failed)
}

/// Write reports, link stories and print one result. Returns whether it failed.
fn finish_check(path: &Path, result: &RuleResult, options: &CheckOptions, json_results: &mut Vec<Value>) -> bool {
    let source = path.display().to_string();
    let text = options.format == OutputFormat::Text;
    let mut failed = false;

    if options.write_reports {
        match ReportStore::beside(path).write(result, &source, Utc::now()) {
            Ok(paths) => {
                if text {
                    println!("Reports written to {}", paths.html.parent().unwrap_or(Path::new("")).display());
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                failed = true;
            }
        }
        if options.stories {
            match storybook::link_report(path) {
                Ok(StoryLink::Linked { report_story, .. }) => {
                    if text {
                        println!("Storybook report story: {}", report_story.display());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error: {}", e);
                    failed = true;
                }
            }
        }
    }

    if result.max_severity().is_some_and(|s| s >= Severity::Serious) {
        failed = true;
    }

    match options.format {
        OutputFormat::Text => print!("{}", render_console_summary(result, &source, options.colored)),
        OutputFormat::Json => json_results.push(json!({
            "file": source,
            "summary": Summary::from_result(result),
            "result": result,
        })),
    }
    failed
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_review(cli: &Cli, config: &Config, files: &[PathBuf]) -> ExitCode {
    let engine = RuleEngine::source().filtered(config);
    let format = OutputFormat::from(cli.format);
    let mut failed = false;
    let mut json_results = Vec::new();

    for path in files {
        let source = path.display().to_string();
        let result = match review_source_file(path, &engine) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error: {}", e);
                failed = true;
                continue;
            }
        };

        let buckets = SeverityBuckets::from_result(&result);
        if !buckets.critical.is_empty() {
            failed = true;
        }

        match format {
            OutputFormat::Text => println!("{}", render_text_feedback(&result, &source)),
            OutputFormat::Json => json_results.push(json!({
                "file": source,
                "feedback": render_text_feedback(&result, &source),
                "issues": buckets,
            })),
        }
    }

    if format == OutputFormat::Json {
        print_json(&json_results);
    }
    exit_code(failed)
}

fn run_rules(cli: &Cli, config: &Config) -> ExitCode {
    let markup = RuleEngine::markup().filtered(config);
    let source = RuleEngine::source().filtered(config);

    match OutputFormat::from(cli.format) {
        OutputFormat::Json => {
            let list = |rules: Vec<&web_analyzer::RuleMeta>| {
                rules
                    .into_iter()
                    .map(|meta| {
                        json!({
                            "id": meta.id,
                            "severity": meta.severity,
                            "summary": meta.summary,
                            "helpUrl": meta.help_url,
                        })
                    })
                    .collect::<Vec<_>>()
            };
            print_json(&json!({
                "markup": list(markup.rules().collect()),
                "source": list(source.rules().collect()),
            }));
        }
        OutputFormat::Text => {
            println!("{}", "Accessibility rules (HTML):".bold());
            for meta in markup.rules() {
                println!("  {:<28} {:<9} {}", meta.id, meta.severity.as_str(), meta.summary);
            }
            println!();
            println!("{}", "Code review rules (source files):".bold());
            for meta in source.rules() {
                println!("  {:<28} {:<9} {}", meta.id, meta.severity.bucket().as_str(), meta.summary);
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_serve(config: Config, flags: ServerOverrides) -> ExitCode {
    let overrides = match ServerOverrides::from_env() {
        Ok(env) => env.merge(flags),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let server_config = match ServerConfig::resolve(&config.server, overrides) {
        Ok(server_config) => server_config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server::run(config, server_config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn collect_files(paths: &[PathBuf], extensions: &[&str], config: &Config) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let file_path = entry.path();
                if !file_path.is_file() || !has_extension(file_path, extensions) {
                    continue;
                }
                // Generated reports live under a11y/ and must not be re-checked.
                if file_path
                    .parent()
                    .and_then(|p| p.file_name())
                    .is_some_and(|name| name == web_analyzer::storage::REPORT_DIR)
                {
                    continue;
                }
                if config.is_excluded(&file_path.to_string_lossy()) {
                    continue;
                }
                files.push(file_path.to_path_buf());
            }
        } else {
            eprintln!("Warning: {} does not exist", path.display());
        }
    }

    files.sort();
    files.dedup();
    files
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
