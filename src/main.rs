//! Gallery-Scrape main entry point
//!
//! This is the command-line interface for the wiki art gallery scraper.

use clap::Parser;
use gallery_scrape::config::{load_config_with_hash, Config};
use gallery_scrape::scrape::run_scrape;
use gallery_scrape::storage::open_snapshot;
use gallery_scrape::viewer::{build_image_client, fetch_image_bytes, load_entries};
use gallery_scrape::GalleryEntry;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Gallery-Scrape: a wiki art gallery scraper
///
/// Gallery-Scrape reads a wiki's Art Gallery page, resolves every thumbnail
/// through its detail page, and stores the entries as a CSV table and a
/// SQLite snapshot for the viewer.
#[derive(Parser, Debug)]
#[command(name = "gallery-scrape")]
#[command(version = "1.0.0")]
#[command(about = "A wiki art gallery scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List the entries of the stored snapshot instead of scraping
    #[arg(long, conflicts_with_all = ["dry_run", "runs", "fetch_image"])]
    use_stored: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with_all = ["use_stored", "runs", "fetch_image"])]
    dry_run: bool,

    /// Show the run history from the snapshot store and exit
    #[arg(long, conflicts_with_all = ["use_stored", "dry_run", "fetch_image"])]
    runs: bool,

    /// Fetch one image as PNG (as the viewer does) and exit
    #[arg(long, value_name = "URL", requires = "output")]
    fetch_image: Option<String>,

    /// Where --fetch-image writes the PNG
    #[arg(long, value_name = "PATH", requires = "fetch_image")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.runs {
        handle_runs(&config)?;
    } else if cli.use_stored {
        handle_use_stored(&config)?;
    } else if let (Some(url), Some(output)) = (cli.fetch_image, cli.output) {
        handle_fetch_image(&url, &output).await?;
    } else {
        handle_scrape(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gallery_scrape=info,warn"),
            1 => EnvFilter::new("gallery_scrape=debug,info"),
            2 => EnvFilter::new("gallery_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_entries(entries: &[GalleryEntry]) {
    for (position, entry) in entries.iter().enumerate() {
        println!(
            "  {:>3}. {} ({}) - {} artworks, {} source images",
            position + 1,
            entry.source_title,
            entry.date,
            entry.artworks.len(),
            entry.source_images.len()
        );
    }
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Gallery-Scrape Dry Run ===\n");

    println!("Site:");
    println!("  Base origin: {}", config.site.base_origin);
    println!("  Gallery: {}", config.site.gallery_url);

    println!("\nMarkup:");
    println!("  Container class: {}", config.markup.container_class);
    println!("  Entry class: {}", config.markup.entry_class);
    println!("  Cell class: {}", config.markup.cell_class);
    println!("  Text container: <{}>", config.markup.text_container);
    println!("  Detail container id: {}", config.markup.detail_container_id);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nFetch:");
    println!(
        "  Dedupe detail pages: {}",
        config.fetch.dedupe_detail_pages
    );
    match config.fetch.timeout_secs {
        Some(secs) => println!("  Timeout: {}s", secs),
        None => println!("  Timeout: none"),
    }

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!("  Snapshot: {}", config.output.snapshot_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --runs mode: shows the recorded run history
fn handle_runs(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Snapshot: {}\n", config.output.snapshot_path);

    let store = open_snapshot(Path::new(&config.output.snapshot_path))?;
    let runs = store.list_runs()?;

    if runs.is_empty() {
        println!("No runs recorded");
        return Ok(());
    }

    for run in &runs {
        println!(
            "  #{:<4} {:<28} {:<28} {:>5} entries  {}",
            run.id,
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-"),
            run.entry_count,
            run.status
        );
    }

    Ok(())
}

/// Handles the --use-stored mode: lists the stored snapshot without scraping
fn handle_use_stored(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let entries = load_entries(Path::new(&config.output.snapshot_path))?;

    println!(
        "=== {} stored entries ({}) ===\n",
        entries.len(),
        config.output.snapshot_path
    );
    print_entries(&entries);

    Ok(())
}

/// Handles the --fetch-image mode: writes one image as PNG
async fn handle_fetch_image(url: &str, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_image_client()?;
    let png = fetch_image_bytes(&client, url).await?;
    std::fs::write(output, &png)?;

    println!("✓ Wrote {} bytes to {}", png.len(), output.display());

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Scraping {}", config.site.gallery_url);

    match run_scrape(config, config_hash).await {
        Ok(entries) => {
            tracing::info!("Scrape completed successfully");
            print_entries(&entries);
            println!(
                "\n✓ {} entries written to {} and {}",
                entries.len(),
                config.output.csv_path,
                config.output.snapshot_path
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
