//! Crawl → download → extract → persist, built from the pieces in the
//! other modules.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::info;
use url::Url;

use crate::crawler::{Crawler, UrlSet};
use crate::db;
use crate::fetch::Fetch;
use crate::layout::{self, BlockResolver, LAYOUT_SUFFIX};
use crate::parser::{self, PageExtraction};
use crate::report::Reporter;
use crate::settings::Settings;

const CHUNK_SIZE: usize = 64;

pub async fn crawl<F: Fetch>(settings: &Settings, fetcher: &F, reporter: &dyn Reporter) -> UrlSet {
    Crawler::new(
        fetcher,
        reporter,
        &settings.base_url,
        &settings.extension,
        settings.link_filter(),
    )
    .with_limits(settings.crawl_limits())
    .discover(&settings.seed_paths)
    .await
}

/// Local file name for a document URL: its path segments joined with `_`.
/// `%` and `_` inside a segment are escaped first, so two paths never map
/// to the same name. Query and host are not part of the name.
pub fn local_file_name(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    if url.path().ends_with('/') {
        return None;
    }
    let segments: Vec<String> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace('%', "%25").replace('_', "%5F"))
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("_"))
}

/// URL and local file name for each discovered document.
pub fn catalog_entries(urls: &UrlSet) -> Vec<(String, String)> {
    urls.iter()
        .filter_map(|url| Some((url.clone(), local_file_name(url)?)))
        .collect()
}

/// Download one file into `dir`, returning where it was written.
pub async fn download<F: Fetch>(fetcher: &F, url: &str, filename: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = fetcher.fetch_bytes(url).await?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Documents already on disk: `*.pdf` and `*.layout.json`, sorted by name.
pub fn local_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && document_name(path).is_some())
        .collect();
    paths.sort();
    Ok(paths)
}

/// `sheet.pdf` and `sheet.layout.json` are both named `sheet`.
pub fn document_name(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .strip_suffix(LAYOUT_SUFFIX)
        .or_else(|| file_name.strip_suffix(".pdf"))
        .filter(|name| !name.is_empty())
}

pub fn write_extraction(out_dir: &Path, name: &str, records: &PageExtraction) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}.json", name));
    let json = serde_json::to_string(records)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub struct DocumentOutcome {
    pub path: PathBuf,
    pub records: usize,
    pub error: Option<String>,
    pub written: Option<PathBuf>,
}

/// Load, extract and persist a single document. Failures are confined to
/// the document and recorded in the outcome.
pub fn process_document(
    path: &Path,
    settings: &Settings,
    resolver: &BlockResolver,
    reporter: &dyn Reporter,
) -> DocumentOutcome {
    let display = path.display().to_string();
    let name = document_name(path).unwrap_or(&display);

    let result = layout::load_document(path)
        .and_then(|doc| parser::extract_document(name, &doc, settings.page_roles(), resolver, reporter))
        .map_err(anyhow::Error::from)
        .and_then(|records| {
            let written = if records.is_empty() {
                None
            } else {
                Some(write_extraction(&settings.output_dir, name, &records)?)
            };
            Ok((records.len(), written))
        });

    match result {
        Ok((records, written)) => DocumentOutcome {
            path: path.to_path_buf(),
            records,
            error: None,
            written,
        },
        Err(e) => {
            reporter.document_skipped(&display, &e);
            DocumentOutcome {
                path: path.to_path_buf(),
                records: 0,
                error: Some(e.to_string()),
                written: None,
            }
        }
    }
}

/// Store each outcome in the catalog under the document's file name.
/// Returns the number of catalog rows updated.
pub fn record_outcomes(conn: &Connection, outcomes: &[DocumentOutcome]) -> Result<usize> {
    let mut updated = 0;
    for outcome in outcomes {
        if let Some(filename) = outcome.path.file_name().and_then(|n| n.to_str()) {
            let records = outcome.error.is_none().then_some(outcome.records);
            updated += db::record_extraction(conn, filename, records, outcome.error.as_deref())?;
        }
    }
    Ok(updated)
}

/// Extract every document, in parallel across documents.
pub fn process_documents(
    paths: &[PathBuf],
    settings: &Settings,
    reporter: &dyn Reporter,
) -> Vec<DocumentOutcome> {
    let resolver = BlockResolver::new(settings.layout.clone());
    let pb = ProgressBar::new(paths.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut outcomes = Vec::with_capacity(paths.len());
    for chunk in paths.chunks(CHUNK_SIZE) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| process_document(path, settings, &resolver, reporter))
            .collect();
        outcomes.extend(results);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    let records: usize = outcomes.iter().map(|o| o.records).sum();
    info!("Extracted {} records from {} documents", records, outcomes.len());
    outcomes
}
