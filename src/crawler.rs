use std::collections::BTreeSet;

use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;
use crate::fetch::Fetch;
use crate::html;
use crate::report::Reporter;

/// Absolute http(s) URLs with the fragment removed.
pub type UrlSet = BTreeSet<String>;

/// Substring a link must contain to be followed. Links on the seed pages
/// (depth 0) are matched against `initial_key`, everything deeper against
/// `default_key`. A missing key accepts every link.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub initial_key: Option<String>,
    pub default_key: Option<String>,
}

impl LinkFilter {
    pub fn key_for(&self, depth: usize) -> Option<&str> {
        if depth == 0 {
            self.initial_key.as_deref()
        } else {
            self.default_key.as_deref()
        }
    }

    pub fn accepts(&self, url: &str, depth: usize) -> bool {
        self.key_for(depth).map_or(true, |key| url.contains(key))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlLimits {
    /// Deepest level whose pages are fetched; the seeds are level 0.
    pub max_depth: Option<usize>,
    /// Total number of pages fetched per crawl.
    pub max_pages: Option<usize>,
}

/// Resolve `href` against the page it was found on. Only http(s) targets
/// are kept, and the fragment is dropped so one page has one spelling.
pub fn normalize_link(page: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with("mailto:") || href.starts_with("javascript:") {
        return None;
    }
    let mut url = page.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

pub struct Crawler<'a, F> {
    fetcher: &'a F,
    reporter: &'a dyn Reporter,
    base_url: String,
    extension: String,
    filter: LinkFilter,
    limits: CrawlLimits,
}

impl<'a, F: Fetch> Crawler<'a, F> {
    pub fn new(
        fetcher: &'a F,
        reporter: &'a dyn Reporter,
        base_url: &str,
        extension: &str,
        filter: LinkFilter,
    ) -> Self {
        Self {
            fetcher,
            reporter,
            base_url: base_url.to_string(),
            extension: extension.to_string(),
            filter,
            limits: CrawlLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: CrawlLimits) -> Self {
        self.limits = limits;
        self
    }

    /// URL of every file with the target extension reachable from `seeds`
    /// (site paths or absolute URLs). Each call starts from an empty
    /// visited set.
    pub async fn discover(&self, seeds: &[String]) -> UrlSet {
        let mut visited = UrlSet::new();
        let mut found = UrlSet::new();
        let mut frontier = self.seed_urls(seeds);
        let mut depth = 0;
        let mut fetched = 0;

        while !frontier.is_empty() {
            debug!("Crawl depth {}: {} pages", depth, frontier.len());
            let mut linked = BTreeSet::new();
            for page in &frontier {
                if self.limits.max_pages.is_some_and(|max| fetched >= max) {
                    self.reporter.link_skipped(page, &"page limit reached");
                    continue;
                }
                fetched += 1;
                match self.outbound_links(page).await {
                    Ok(links) => linked.extend(
                        links
                            .into_iter()
                            .filter(|link| self.filter.accepts(link.as_str(), depth)),
                    ),
                    Err(e) => self.reporter.link_skipped(page, &e),
                }
            }
            visited.extend(frontier);

            // Nothing already fetched may be queued again; this is what
            // terminates the crawl on cyclic link graphs.
            let (targets, to_explore): (Vec<Url>, Vec<Url>) = linked
                .into_iter()
                .filter(|link| !visited.contains(link.as_str()))
                .partition(|link| link.path().ends_with(&self.extension));
            found.extend(targets.into_iter().map(String::from));

            if self.limits.max_depth.is_some_and(|max| depth >= max) {
                if !to_explore.is_empty() {
                    debug!("Depth limit reached, {} pages left unexplored", to_explore.len());
                }
                break;
            }
            frontier = to_explore.into_iter().map(String::from).collect();
            depth += 1;
        }

        info!(
            "Crawl finished: {} pages fetched, {} {} files found",
            fetched,
            found.len(),
            self.extension
        );
        found
    }

    fn seed_urls(&self, seeds: &[String]) -> UrlSet {
        let base = match Url::parse(&self.base_url) {
            Ok(base) => base,
            Err(source) => {
                let e = FetchError::InvalidUrl {
                    url: self.base_url.clone(),
                    source,
                };
                self.reporter.link_skipped(&self.base_url, &e);
                return UrlSet::new();
            }
        };
        seeds
            .iter()
            .filter_map(|seed| match normalize_link(&base, seed) {
                Some(url) => Some(String::from(url)),
                None => {
                    self.reporter.link_skipped(seed, &"not an http(s) link");
                    None
                }
            })
            .collect()
    }

    async fn outbound_links(&self, page: &str) -> Result<Vec<Url>, FetchError> {
        let page_url = Url::parse(page).map_err(|source| FetchError::InvalidUrl {
            url: page.to_string(),
            source,
        })?;
        let body = self.fetcher.fetch_text(page).await?;
        Ok(html::extract_hrefs(&body)
            .iter()
            .filter_map(|href| normalize_link(&page_url, href))
            .collect())
    }
}
