use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alexandria::backend::{Backend, HttpBackend};
use alexandria::classify::classify;
use alexandria::config::{find_config_file, get_config, load_config, Config};
use alexandria::models::{ResultPage, SortKey, StructuredCitation};
use alexandria::parse::ParseOrchestrator;
use alexandria::session::{SearchSession, SessionPhase};
use alexandria::sort::sort_view;
use alexandria::ui;
use alexandria::utils::clean_citation;
use alexandria::ParsedCitationMap;

/// Alexandria - search a knowledge source and structure its citations
#[derive(Parser, Debug)]
#[command(name = "alexandria")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Search a knowledge source for a topic and structure its citations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base address of the search/parse service
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (styled if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Sort key for the citation display order
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortArg {
    /// Keep the order the service returned
    None,
    /// Title, ascending
    TitleAsc,
    /// Title, descending
    TitleDesc,
    /// Author, ascending
    AuthorAsc,
    /// Author, descending
    AuthorDesc,
    /// Year, ascending
    YearAsc,
    /// Year, descending
    YearDesc,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::None => SortKey::None,
            SortArg::TitleAsc => SortKey::TitleAsc,
            SortArg::TitleDesc => SortKey::TitleDesc,
            SortArg::AuthorAsc => SortKey::AuthorAsc,
            SortArg::AuthorDesc => SortKey::AuthorDesc,
            SortArg::YearAsc => SortKey::YearAsc,
            SortArg::YearDesc => SortKey::YearDesc,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for a topic and list its citations
    #[command(alias = "s")]
    Search {
        /// Topic to search for
        query: String,

        /// Parse citations into structured records
        #[arg(long)]
        structured: bool,

        /// Parse each citation with its own request instead of one batch
        #[arg(long, requires = "structured")]
        per_item: bool,

        /// Sort key for the display order
        #[arg(long, value_enum, default_value_t = SortArg::None)]
        sort: SortArg,

        /// Show at most this many citations (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,

        /// Resolve a disambiguation non-interactively by option number (1-based)
        #[arg(long)]
        pick: Option<usize>,

        /// Strip page numbers, archive notes, and "(PDF)" markers from display
        #[arg(long)]
        clean: bool,
    },

    /// Fetch the citations of a specific page by exact title
    #[command(alias = "p")]
    Page {
        /// Exact page title
        title: String,

        /// Parse citations into structured records
        #[arg(long)]
        structured: bool,

        /// Parse each citation with its own request instead of one batch
        #[arg(long, requires = "structured")]
        per_item: bool,

        /// Sort key for the display order
        #[arg(long, value_enum, default_value_t = SortArg::None)]
        sort: SortArg,

        /// Show at most this many citations (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,

        /// Strip page numbers, archive notes, and "(PDF)" markers from display
        #[arg(long)]
        clean: bool,
    },

    /// Print the parser format a citation string classifies to
    Classify {
        /// Citation text
        citation: String,
    },

    /// Print a citation with trailing catalog noise removed
    Clean {
        /// Citation text
        citation: String,
    },
}

/// Display options shared by the search and page commands.
#[derive(Debug, Clone, Copy)]
struct DisplayOptions {
    structured: bool,
    per_item: bool,
    sort: SortKey,
    limit: usize,
    clean: bool,
    format: OutputFormat,
}

#[derive(Serialize)]
struct CitationEntry<'a> {
    position: usize,
    original_index: usize,
    citation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a StructuredCitation>,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    page_title: &'a str,
    count: usize,
    sort: SortKey,
    structured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_error: Option<&'a str>,
    citations: Vec<CitationEntry<'a>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("alexandria={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration, then apply flag overrides
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()
    };
    apply_overrides(&mut config, &cli);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(
        &config.service.base_url,
        Duration::from_secs(config.service.timeout_secs),
    )?);

    match cli.command {
        Commands::Search {
            query,
            structured,
            per_item,
            sort,
            limit,
            pick,
            clean,
        } => {
            let options = DisplayOptions {
                structured,
                per_item,
                sort: sort.into(),
                limit,
                clean,
                format: cli.output,
            };
            run_search(backend, &query, pick, options).await?;
        }
        Commands::Page {
            title,
            structured,
            per_item,
            sort,
            limit,
            clean,
        } => {
            let options = DisplayOptions {
                structured,
                per_item,
                sort: sort.into(),
                limit,
                clean,
                format: cli.output,
            };
            let session = SearchSession::new(Arc::clone(&backend));
            let spinner = ui::request_spinner("Fetching page...");
            session.open_page(&title).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            render_session(&session, &backend, options).await?;
        }
        Commands::Classify { citation } => {
            println!("{}", classify(&citation));
        }
        Commands::Clean { citation } => {
            println!("{}", clean_citation(&citation));
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(base_url) = &cli.base_url {
        config.service.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.service.timeout_secs = timeout;
    }
}

async fn run_search(
    backend: Arc<dyn Backend>,
    query: &str,
    mut pick: Option<usize>,
    options: DisplayOptions,
) -> Result<()> {
    let session = SearchSession::new(Arc::clone(&backend));

    let spinner = ui::request_spinner("Searching...");
    session.search(query).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    // Resolve disambiguation rounds until the session settles elsewhere.
    loop {
        let snapshot = session.snapshot();
        let (kind, options_list) = match snapshot.phase {
            SessionPhase::Ambiguous { kind, options } => (kind, options),
            _ => break,
        };

        let choice = match pick.take() {
            Some(n) => n,
            None => {
                if options.format == OutputFormat::Json {
                    let body = serde_json::json!({
                        "status": kind.to_string(),
                        "options": options_list,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                    return Ok(());
                }
                ui::print_topic_options(kind, &options_list);
                if !ui::is_terminal() {
                    return Ok(());
                }
                match prompt_selection(options_list.len())? {
                    Some(n) => n,
                    None => return Ok(()),
                }
            }
        };

        if choice == 0 || choice > options_list.len() {
            ui::print_error(&format!(
                "option {} is out of range (1-{})",
                choice,
                options_list.len()
            ));
            std::process::exit(1);
        }
        let option = &options_list[choice - 1];

        let spinner = ui::request_spinner("Fetching page...");
        session.select_topic(&option.title).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
    }

    render_session(&session, &backend, options).await
}

/// Read a 1-based option number from stdin; `None` means the user declined.
fn prompt_selection(count: usize) -> Result<Option<usize>> {
    loop {
        print!("Select a topic [1-{}], or q to cancel: ", count);
        std::io::stdout().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return Ok(Some(n)),
            _ => ui::print_warning("enter a number from the list, or q"),
        }
    }
}

async fn render_session(
    session: &SearchSession,
    backend: &Arc<dyn Backend>,
    options: DisplayOptions,
) -> Result<()> {
    let snapshot = session.snapshot();
    let page = match snapshot.phase {
        SessionPhase::Results(page) => page,
        SessionPhase::Error { message } => {
            ui::print_error(&message);
            std::process::exit(1);
        }
        // Non-interactive disambiguation was already printed.
        _ => return Ok(()),
    };

    session.set_sort_key(options.sort);

    // The session's search already ran the batch parse; the structured flag
    // decides whether its map feeds the display. Per-item re-parses here with
    // one request per citation.
    let parsed: Option<ParsedCitationMap> = if options.structured {
        if options.per_item {
            let spinner = ui::request_spinner("Parsing citations...");
            let orchestrator = ParseOrchestrator::new(Arc::clone(backend));
            let map = orchestrator.parse_per_item(&page.citations).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            Some(map)
        } else {
            session.set_structured_view(options.structured).await;
            session.snapshot().parsed
        }
    } else {
        snapshot.parsed
    };

    let parse_error = session.snapshot().parse_error;
    if options.structured {
        if let Some(message) = parse_error.as_deref() {
            ui::print_warning(&format!(
                "structured parsing unavailable, showing raw citations: {}",
                message
            ));
        }
    }

    let view = sort_view(&page.citations, parsed.as_ref(), options.structured, options.sort);

    let format = match options.format {
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Plain
            } else {
                OutputFormat::Json
            }
        }
        other => other,
    };

    match format {
        OutputFormat::Json => {
            let report = build_report(&page, &view, parsed.as_ref(), &options, &parse_error);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            ui::print_results_header(&page.page_title, page.len());
            if page.is_empty() {
                ui::print_no_results();
            } else {
                let table =
                    ui::citations_table(&view, parsed.as_ref(), options.limit, options.clean);
                println!("{table}");
            }
        }
        OutputFormat::Plain => {
            ui::print_results_header(&page.page_title, page.len());
            if page.is_empty() {
                ui::print_no_results();
            } else if options.structured {
                ui::print_structured_citations(&view, parsed.as_ref(), options.limit, options.clean);
            } else {
                ui::print_raw_citations(&view, options.limit, options.clean);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn build_report<'a>(
    page: &'a ResultPage,
    view: &[alexandria::sort::SortedCitation<'a>],
    parsed: Option<&'a ParsedCitationMap>,
    options: &DisplayOptions,
    parse_error: &'a Option<String>,
) -> SearchReport<'a> {
    let citations = view
        .iter()
        .enumerate()
        .map(|(position, item)| CitationEntry {
            position: position + 1,
            original_index: item.original_index,
            citation: item.citation,
            record: parsed.and_then(|map| map.get(&item.original_index)),
        })
        .collect();

    SearchReport {
        query: &page.query,
        page_title: &page.page_title,
        count: page.len(),
        sort: options.sort,
        structured: options.structured,
        parse_error: parse_error.as_deref(),
        citations,
    }
}
