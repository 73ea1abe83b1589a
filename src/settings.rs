use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::crawler::{CrawlLimits, LinkFilter};
use crate::layout::LayoutConfig;
use crate::parser::PageRoles;

/// Runtime settings: defaults, then `worksheet_scraper.toml`, then
/// `WORKSHEET_*` environment variables (`__` for nesting, `,` in lists).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub seed_paths: Vec<String>,
    pub extension: String,
    pub initial_key: Option<String>,
    pub default_key: Option<String>,
    pub pdf_dir: PathBuf,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    pub fetch_timeout_secs: u64,
    pub max_depth: Option<usize>,
    pub max_pages: Option<usize>,
    pub question_page: usize,
    pub solution_page: usize,
    pub layout: LayoutConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://www.k5learning.com".into(),
            seed_paths: vec!["/free-math-worksheets".into()],
            extension: ".pdf".into(),
            initial_key: Some("/free-math-worksheets/".into()),
            default_key: Some("word-problems".into()),
            pdf_dir: PathBuf::from("output/pdfs"),
            output_dir: PathBuf::from("output"),
            db_path: PathBuf::from("output/catalog.sqlite"),
            fetch_timeout_secs: 30,
            max_depth: None,
            max_pages: None,
            question_page: 0,
            solution_page: 1,
            layout: LayoutConfig::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name("worksheet_scraper").required(false))
            .add_source(
                Environment::with_prefix("WORKSHEET")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("seed_paths")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Invalid configuration")
    }

    pub fn link_filter(&self) -> LinkFilter {
        LinkFilter {
            initial_key: self.initial_key.clone(),
            default_key: self.default_key.clone(),
        }
    }

    pub fn crawl_limits(&self) -> CrawlLimits {
        CrawlLimits {
            max_depth: self.max_depth,
            max_pages: self.max_pages,
        }
    }

    pub fn page_roles(&self) -> PageRoles {
        PageRoles {
            question_page: self.question_page,
            solution_page: self.solution_page,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
