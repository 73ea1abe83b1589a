mod crawler;
mod db;
mod error;
mod fetch;
mod html;
mod layout;
mod parser;
mod pipeline;
mod report;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fetch::HttpFetcher;
use report::{Reporter, TracingReporter};
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "worksheet_scraper",
    about = "Extract question/answer pairs from math worksheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every worksheet, optionally re-crawling and re-downloading first
    Run {
        /// Re-crawl the site and re-download all PDFs instead of re-using the local ones
        #[arg(long)]
        overwrite: bool,
    },
    /// Discover worksheet PDFs and record them in the catalog
    Crawl,
    /// Download catalogued PDFs that are not on disk yet
    Download {
        /// Max files to download (default: all pending)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract question/answer pairs from local documents
    Extract {
        /// PDFs or *.layout.json files (default: everything in the PDF directory)
        paths: Vec<PathBuf>,
    },
    /// Scrape an HTML index page of interactive worksheets
    Html {
        /// URL of the index page
        url: String,
    },
    /// Show catalog statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(?settings, "Loaded settings");
    let reporter = TracingReporter;

    for dir in [&settings.output_dir, &settings.pdf_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let result = match cli.command {
        Commands::Run { overwrite } => {
            let paths = if overwrite {
                let fetcher = HttpFetcher::new(settings.fetch_timeout())?;
                let conn = open_catalog(&settings)?;
                crawl_into_catalog(&settings, &fetcher, &conn, &reporter).await?;
                let reset = db::reset_downloads(&conn)?;
                println!("Re-downloading {} documents...", reset);
                download_pending(&settings, &fetcher, &conn, None, &reporter).await?
            } else {
                pipeline::local_documents(&settings.pdf_dir)?
            };
            extract(&settings, &paths, &reporter)
        }
        Commands::Crawl => {
            let fetcher = HttpFetcher::new(settings.fetch_timeout())?;
            let conn = open_catalog(&settings)?;
            crawl_into_catalog(&settings, &fetcher, &conn, &reporter).await?;
            Ok(())
        }
        Commands::Download { limit } => {
            let fetcher = HttpFetcher::new(settings.fetch_timeout())?;
            let conn = open_catalog(&settings)?;
            let written = download_pending(&settings, &fetcher, &conn, limit, &reporter).await?;
            if written.is_empty() {
                println!("Nothing downloaded. Run 'crawl' first or all documents are on disk.");
            }
            Ok(())
        }
        Commands::Extract { paths } => {
            let paths = if paths.is_empty() {
                pipeline::local_documents(&settings.pdf_dir)?
            } else {
                paths
            };
            extract(&settings, &paths, &reporter)
        }
        Commands::Html { url } => {
            let fetcher = HttpFetcher::new(settings.fetch_timeout())?;
            let stats = html::scrape_index(&fetcher, &url, &settings.output_dir, &reporter).await?;
            println!(
                "Saved {} questions from {} pages ({} bad links).",
                stats.problems,
                stats.pages,
                stats.bad_links.len()
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = open_catalog(&settings)?;
            let s = db::get_stats(&conn)?;
            println!("Documents:  {}", s.total);
            println!("Downloaded: {}", s.downloaded);
            println!("Pending:    {}", s.pending);
            println!("Extracted:  {}", s.extracted);
            println!("Failed:     {}", s.failed);
            println!("Records:    {}", s.records);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_catalog(settings: &Settings) -> Result<rusqlite::Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

async fn crawl_into_catalog(
    settings: &Settings,
    fetcher: &HttpFetcher,
    conn: &rusqlite::Connection,
    reporter: &dyn Reporter,
) -> Result<()> {
    println!("Crawling {} for {} files...", settings.base_url, settings.extension);
    let urls = pipeline::crawl(settings, fetcher, reporter).await;
    let entries = pipeline::catalog_entries(&urls);
    let inserted = db::insert_documents(conn, &entries)?;
    println!("Inserted {} new documents ({} total found)", inserted, entries.len());
    Ok(())
}

async fn download_pending(
    settings: &Settings,
    fetcher: &HttpFetcher,
    conn: &rusqlite::Connection,
    limit: Option<usize>,
    reporter: &dyn Reporter,
) -> Result<Vec<PathBuf>> {
    let pending = db::fetch_undownloaded(conn, limit)?;
    let mut written = Vec::with_capacity(pending.len());
    for doc in pending {
        match pipeline::download(fetcher, &doc.url, &doc.filename, &settings.pdf_dir).await {
            Ok(path) => {
                db::mark_downloaded(conn, doc.id)?;
                written.push(path);
            }
            Err(e) => reporter.link_skipped(&doc.url, &e),
        }
    }
    println!("Downloaded {} documents", written.len());
    Ok(written)
}

fn extract(settings: &Settings, paths: &[PathBuf], reporter: &dyn Reporter) -> Result<()> {
    if paths.is_empty() {
        println!(
            "No documents in {}. Run with --overwrite to fetch them.",
            settings.pdf_dir.display()
        );
        return Ok(());
    }
    println!("Extracting {} documents...", paths.len());
    let outcomes = pipeline::process_documents(paths, settings, reporter);

    let conn = open_catalog(settings)?;
    pipeline::record_outcomes(&conn, &outcomes)?;

    let written = outcomes.iter().filter(|o| o.written.is_some()).count();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let records: usize = outcomes.iter().map(|o| o.records).sum();
    println!(
        "Saved {} records to {} files ({} documents failed).",
        records, written, failed
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
