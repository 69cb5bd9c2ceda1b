//! Sumi-Page main entry point
//!
//! This is the command-line interface for the Sumi-Page single-page crawler.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use sumi_page::config::{device_names, load_config_with_hash, validate, CrawlConfig};
use sumi_page::crawler::{crawl, CrawlOutcome};
use sumi_page::driver::PageDriver;
use sumi_page::output::write_outcome;
use sumi_page::StaticDriver;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "browser")]
use sumi_page::{BrowserDriver, BrowserOptions};

/// Page driver a crawl runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Plain HTTP, no JavaScript
    Static,
    /// Headless Chromium (requires the `browser` feature)
    Browser,
}

impl Default for Engine {
    fn default() -> Self {
        if cfg!(feature = "browser") {
            Self::Browser
        } else {
            Self::Static
        }
    }
}

/// Sumi-Page: crawl one page and record what it holds
///
/// Sumi-Page prepares a page, navigates to the target, and writes a JSON
/// crawl record: timing, response and request metadata, redirect history,
/// evaluation result, screenshot, links and body text.
#[derive(Parser, Debug)]
#[command(name = "sumi-page")]
#[command(version)]
#[command(about = "A single-page crawl pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present_any = ["url", "list_devices"])]
    config: Option<PathBuf>,

    /// Target URL (overrides the config file's url)
    #[arg(long)]
    url: Option<String>,

    /// Page driver to crawl with
    #[arg(long, value_enum, default_value_t = Engine::default())]
    engine: Engine,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headful: bool,

    /// Chrome/Chromium binary for the browser engine
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Write the crawl record to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// List the built-in device profiles and exit
    #[arg(long, conflicts_with = "dry_run")]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if cli.list_devices {
        for name in device_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &cli);
        return Ok(());
    }

    handle_crawl(config, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_page=info,warn"),
            1 => EnvFilter::new("sumi_page=debug,info"),
            2 => EnvFilter::new("sumi_page=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout carries only the JSON record
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the crawl configuration from the config file and/or `--url`
fn load(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => match &cli.url {
            Some(url) => CrawlConfig::new(url.clone()),
            None => bail!("Either a config file or --url is required"),
        },
    };

    if let Some(url) = &cli.url {
        config.url = url.clone();
    }

    validate(&config).context("Invalid crawl configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &CrawlConfig, cli: &Cli) {
    println!("=== Sumi-Page Dry Run ===\n");

    println!("Target: {}", config.url);
    println!("Engine: {:?}", cli.engine);
    if cli.engine == Engine::Browser {
        println!("  Headless: {}", !cli.headful);
        if let Some(chrome) = &cli.chrome {
            println!("  Chrome: {}", chrome.display());
        }
    }

    println!("\nNavigation:");
    println!("  Timeout: {}ms", config.navigation.timeout_ms);
    println!("  Wait until: {:?}", config.navigation.wait_until);

    println!("\nPage settings:");
    println!("  Follow redirects: {}", config.follow_redirects);
    println!("  Browser cache: {}", config.browser_cache);
    println!("  JavaScript: {}", config.javascript_enabled);
    if let Some(agent) = &config.user_agent {
        println!("  User agent: {}", agent);
    }
    if let Some(headers) = config.effective_extra_headers() {
        println!("  Extra headers: {}", headers.len());
    }
    if config.credentials.is_some() {
        println!("  Credentials: yes");
    }

    println!("\nExtraction:");
    println!("  Wait for: {}", describe(config.wait_for.is_some()));
    println!("  Evaluate page: {}", describe(config.evaluate_page.is_some()));
    println!("  jQuery: {}", config.jquery);
    println!("  Screenshot: {}", describe(config.screenshot.is_some()));

    println!("\n✓ Configuration is valid");
}

fn describe(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "none"
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: CrawlConfig, cli: &Cli) -> anyhow::Result<()> {
    let outcome = match cli.engine {
        Engine::Static => {
            let driver = StaticDriver::new().context("Failed to create page driver")?;
            run(driver, config).await?
        }
        Engine::Browser => crawl_in_browser(config, cli).await?,
    };

    if outcome.is_redirect() {
        tracing::info!("Target redirected; record holds response metadata only");
    }

    write_outcome(&outcome, cli.output.as_deref()).context("Failed to write crawl record")?;
    Ok(())
}

async fn run<D: PageDriver>(driver: D, config: CrawlConfig) -> anyhow::Result<CrawlOutcome> {
    let url = config.url.clone();
    match crawl(driver, config).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).with_context(|| format!("Crawl of {} failed", url))
        }
    }
}

#[cfg(feature = "browser")]
async fn crawl_in_browser(config: CrawlConfig, cli: &Cli) -> anyhow::Result<CrawlOutcome> {
    let options = BrowserOptions {
        headless: !cli.headful,
        executable: cli.chrome.clone(),
        ..BrowserOptions::default()
    };
    let driver = BrowserDriver::launch(&options)
        .await
        .context("Failed to launch browser")?;
    run(driver, config).await
}

#[cfg(not(feature = "browser"))]
async fn crawl_in_browser(_config: CrawlConfig, _cli: &Cli) -> anyhow::Result<CrawlOutcome> {
    bail!("Browser support not compiled. Rebuild with: cargo build --features browser")
}
