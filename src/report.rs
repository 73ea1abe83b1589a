use std::fmt::Display;

use tracing::{debug, warn};

/// Sink for the non-fatal events of a crawl or extraction.
pub trait Reporter: Sync {
    fn link_skipped(&self, url: &str, reason: &dyn Display);
    fn document_skipped(&self, document: &str, reason: &dyn Display);
    fn problem_dropped(&self, document: &str, number: u32);
}

/// Forwards every event to `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn link_skipped(&self, url: &str, reason: &dyn Display) {
        warn!("Skipping {}: {}", url, reason);
    }

    fn document_skipped(&self, document: &str, reason: &dyn Display) {
        warn!("Skipping document {}: {}", document, reason);
    }

    fn problem_dropped(&self, document: &str, number: u32) {
        debug!("Dropped problem {} in {}", number, document);
    }
}
