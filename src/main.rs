use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use scholar_digest::config::{
    default_config_path, find_config_file, load_config, Config, ConfigFile, LOCAL_CONFIG_FILE,
};
use scholar_digest::engines::EngineKind;
use scholar_digest::extraction::{select_pages, PageStrategy};
use scholar_digest::harvest::{harvest_links, search_url};
use scholar_digest::models::{ArticleRecord, CandidateLink, Summary};
use scholar_digest::ui::{self, Status};
use scholar_digest::utils::HttpClient;
use scholar_digest::Summarizer;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Digest - Summarize academic PDFs into keywords, abstract, future work and conclusions
#[derive(Parser, Debug)]
#[command(name = "scholar-digest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Harvest academic PDF links and summarize each paper", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (text if TTY, JSON otherwise)
    Auto,
    /// Colored, human-readable text
    Text,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Text,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Page selection on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PagesArg {
    /// Every page up to the page limit
    All,
    /// Leading and trailing windows only
    Portion,
}

/// Extraction overrides shared by the document commands
#[derive(clap::Args, Debug, Clone, Default)]
struct ExtractionArgs {
    /// Text extraction engine (pdf-extract, lopdf, layout)
    #[arg(long, short)]
    engine: Option<EngineKind>,

    /// Decode pages in parallel on the worker pool
    #[arg(long)]
    parallel: bool,

    /// Number of pool workers
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum number of pages read per document
    #[arg(long)]
    max_pages: Option<usize>,

    /// Which pages to decode
    #[arg(long, value_enum)]
    pages: Option<PagesArg>,

    /// Leading window for --pages portion, in percent
    #[arg(long, default_value_t = 33)]
    start_percent: u32,

    /// Trailing window for --pages portion, in percent
    #[arg(long, default_value_t = 33)]
    end_percent: u32,
}

impl ExtractionArgs {
    fn apply(&self, config: &mut Config) {
        let extraction = &mut config.extraction;
        if let Some(engine) = self.engine {
            extraction.engine = engine;
        }
        if self.parallel {
            extraction.parallel = true;
        }
        if let Some(workers) = self.workers {
            extraction.pool_size = workers;
        }
        if let Some(max_pages) = self.max_pages {
            extraction.max_pages = max_pages;
        }
        match self.pages {
            Some(PagesArg::All) => extraction.strategy = PageStrategy::All,
            Some(PagesArg::Portion) => {
                extraction.strategy = PageStrategy::portion(self.start_percent, self.end_percent)
            }
            None => {}
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize one document
    #[command(alias = "s")]
    Summarize {
        /// Document URL, or a local path with --no-download
        url: String,

        /// Read the document from a local path instead of downloading it
        #[arg(long)]
        no_download: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// List candidate PDF links found on a results page
    #[command(alias = "h")]
    Harvest {
        /// Results page URL
        url: String,
    },

    /// Search for papers and summarize every PDF found
    #[command(alias = "d")]
    Digest {
        /// Search keywords
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Maximum number of summarized papers
        #[arg(long, short, default_value_t = 10)]
        max_results: usize,

        /// Summarize the links of this results page instead of searching
        #[arg(long)]
        from: Option<String>,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Show which pages of a local document would be read
    Pages {
        /// Local PDF path
        path: PathBuf,

        /// Also print the decoded text of the selected pages
        #[arg(long)]
        text: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a configuration file with default values
    Init {
        /// Where to write the file (default: user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print which configuration file is used
    Path,
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Scholar Digest - Environment Variables");
    println!();
    println!("Any configuration key can be overridden with SCHOLAR_DIGEST_<SECTION>__<KEY>:");
    println!("  SCHOLAR_DIGEST_EXTRACTION__ENGINE          pdf-extract | lopdf | layout (default: pdf-extract)");
    println!("  SCHOLAR_DIGEST_EXTRACTION__PARALLEL        Decode pages in parallel (default: false)");
    println!("  SCHOLAR_DIGEST_EXTRACTION__POOL_SIZE       Worker pool size (default: CPU count)");
    println!("  SCHOLAR_DIGEST_EXTRACTION__MAX_PAGES       Pages read per document (default: 20)");
    println!("  SCHOLAR_DIGEST_DOWNLOADS__TEMP_DIR         Directory for temporary downloads");
    println!("  SCHOLAR_DIGEST_DOWNLOADS__MAX_FILE_SIZE_MB Maximum download size in MB (default: 100)");
    println!("  SCHOLAR_DIGEST_DOWNLOADS__TIMEOUT_SECS     Download timeout (default: 30)");
    println!("  SCHOLAR_DIGEST_DOWNLOADS__MAX_ATTEMPTS     Download attempts (default: 2)");
    println!("  SCHOLAR_DIGEST_LOGGING__LEVEL              Log level (default: info)");
    println!("  SCHOLAR_DIGEST_LOGGING__FORMAT             Set to json for JSON logs");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging filter (e.g., scholar_digest=debug)");
    println!("  HTTP_PROXY / HTTPS_PROXY    Proxy used for all requests");
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_digest={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let path = cli.config.clone().or_else(find_config_file);
    let config = load_config(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from environment".to_string(),
    })?;
    Ok((config, path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let (mut config, config_path) = resolve_config(&cli)?;
    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    let format = cli.output.resolve();

    match cli.command {
        Some(Commands::Summarize {
            url,
            no_download,
            extraction,
        }) => {
            extraction.apply(&mut config);
            let summarizer = Summarizer::from_config(&config)?;

            let spinner = (!cli.quiet && format == OutputFormat::Text)
                .then(|| ui::Spinner::new(&format!("Summarizing {}", url)));
            let summary = summarizer
                .summarize(&url, !no_download, config.extraction.max_pages)
                .await;
            if let Some(spinner) = spinner {
                spinner.finish();
            }
            summarizer.shutdown().await;

            output_summary(&summary, format)?;
        }

        Some(Commands::Harvest { url }) => {
            let client =
                HttpClient::with_options(&config.harvest.user_agent, config.harvest.timeout())?;
            let links = harvest_links(&client, &url, config.harvest.retry()).await;
            output_links(&links, format, cli.quiet)?;
        }

        Some(Commands::Digest {
            keywords,
            max_results,
            from,
            extraction,
        }) => {
            extraction.apply(&mut config);
            let summarizer = Summarizer::from_config(&config)?;

            let records = match from {
                Some(page) => {
                    let links = summarizer.harvest(&page).await;
                    digest_with_progress(
                        &summarizer,
                        &links,
                        &keywords,
                        max_results,
                        cli.quiet || format == OutputFormat::Json,
                    )
                    .await
                }
                None => {
                    tracing::info!(
                        "Searching {}",
                        search_url(&config.harvest.search_url, &keywords, 0)
                    );
                    summarizer.search(&keywords, max_results).await
                }
            };
            summarizer.shutdown().await;

            output_records(&records, format, cli.quiet)?;
        }

        Some(Commands::Pages {
            path,
            text,
            extraction,
        }) => {
            extraction.apply(&mut config);
            show_pages(&path, text, &config).await?;
        }

        Some(Commands::Config { action }) => match action {
            ConfigCommands::Init { path, force } => {
                let path = path
                    .or_else(default_config_path)
                    .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                ConfigFile::new(&path, Config::default()).save()?;
                ui::print_status(
                    Status::Success,
                    &format!("Wrote default configuration to {}", path.display()),
                );
            }
            ConfigCommands::Show => {
                let file = ConfigFile::new(config_path.unwrap_or_default(), config);
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(file.config())?)
                    }
                    _ => print!("{}", file.to_toml()?),
                }
            }
            ConfigCommands::Path => match config_path {
                Some(path) => println!("{}", path.display()),
                None => ui::print_status(
                    Status::Info,
                    "No configuration file found, using defaults and environment",
                ),
            },
        },

        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "scholar-digest",
                &mut std::io::stdout(),
            );
        }

        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

async fn digest_with_progress(
    summarizer: &Summarizer,
    links: &[CandidateLink],
    keywords: &[String],
    max_results: usize,
    hidden: bool,
) -> Vec<ArticleRecord> {
    if hidden {
        return summarizer.digest(links, keywords, max_results).await;
    }

    let progress = ui::DigestProgress::new(links.len() as u64, "Summarizing");
    let mut records = Vec::new();
    for link in links {
        if records.len() >= max_results {
            break;
        }
        records.extend(
            summarizer
                .digest(std::slice::from_ref(link), keywords, 1)
                .await,
        );
        progress.inc();
    }
    progress.finish(&format!("{} papers summarized", records.len()));
    records
}

async fn show_pages(path: &Path, text: bool, config: &Config) -> Result<()> {
    let engine = config.extraction.engine.engine();
    let owned = path.to_path_buf();
    let document = tokio::task::spawn_blocking(move || engine.open(&owned))
        .await?
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let total = document.page_count();
    let pages = select_pages(total, config.extraction.max_pages, &config.extraction.strategy);

    println!(
        "{}: {} pages, reading {} ({})",
        path.display(),
        total,
        pages.len(),
        pages
            .iter()
            .map(|index| (index + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if text {
        for index in pages.iter() {
            ui::print_section(&format!("Page {}", index + 1));
            match document.page_text(index) {
                Ok(page) => println!("{}", page),
                Err(e) => ui::print_status(Status::Error, &e.to_string()),
            }
        }
    }

    Ok(())
}

fn output_summary(summary: &Summary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        _ => ui::print_summary(summary),
    }
    Ok(())
}

fn output_links(links: &[CandidateLink], format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(links)?),
        _ => {
            if !quiet {
                ui::print_status(Status::Info, &format!("Found {} PDF links", links.len()));
            }
            ui::print_links(links);
        }
    }
    Ok(())
}

fn output_records(records: &[ArticleRecord], format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        _ => {
            for record in records {
                ui::print_record(record);
            }
            if !quiet {
                ui::print_status(
                    Status::Success,
                    &format!("{} papers summarized", records.len()),
                );
            }
        }
    }
    Ok(())
}
