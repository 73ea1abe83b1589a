//! HTML side of the scraper: href listing for the crawler, and the
//! interactive worksheet pages whose questions live in `div.QuestionText`
//! and whose answers sit in an inline script array.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, info};

use crate::fetch::{self, Fetch};
use crate::report::Reporter;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static QUESTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.QuestionText").unwrap());
static ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[3\]\[0\]=new Array\('(\d+)'").unwrap());

/// Every `href` of every `<a>` in document order.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    Html::parse_document(html)
        .select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlProblem {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<u64>,
}

/// Questions keyed by their 0-based position on the page.
pub fn extract_worksheet(html: &str) -> BTreeMap<usize, HtmlProblem> {
    let document = Html::parse_document(html);
    let mut problems: BTreeMap<usize, HtmlProblem> = document
        .select(&QUESTION_SELECTOR)
        .map(|div| {
            // Only the div's own text nodes; nested markup is layout noise.
            let question = div
                .children()
                .filter_map(|child| child.value().as_text())
                .map(|text| text.trim())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            HtmlProblem {
                question,
                answer: None,
            }
        })
        .enumerate()
        .collect();

    for (index, caps) in ANSWER_RE.captures_iter(html).enumerate() {
        if let Some(problem) = problems.get_mut(&index) {
            problem.answer = caps[1].parse().ok();
        }
    }
    problems
}

/// Worksheet links on an index page start with an uppercase letter.
pub fn worksheet_links(hrefs: &[String]) -> Vec<&str> {
    hrefs
        .iter()
        .map(String::as_str)
        .filter(|href| href.chars().next().is_some_and(char::is_uppercase))
        .collect()
}

/// `"Apples.html"` -> `"Apples"`.
pub fn page_name(link: &str) -> &str {
    link.split('.').next().unwrap_or(link)
}

pub struct IndexStats {
    pub pages: usize,
    pub problems: usize,
    pub bad_links: Vec<String>,
}

/// Scrape every worksheet linked from `index_url`, writing one
/// `questions_<page>.json` per page into `out_dir`.
pub async fn scrape_index<F: Fetch>(
    fetcher: &F,
    index_url: &str,
    out_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<IndexStats> {
    let body = fetcher
        .fetch_text(index_url)
        .await
        .with_context(|| format!("Failed to fetch index {}", index_url))?;
    let hrefs = extract_hrefs(&body);
    let links = worksheet_links(&hrefs);
    info!("Found {} worksheet links on {}", links.len(), index_url);

    let mut stats = IndexStats {
        pages: 0,
        problems: 0,
        bad_links: Vec::new(),
    };
    for link in links {
        match scrape_worksheet(fetcher, index_url, link, out_dir).await {
            Ok(count) => {
                stats.pages += 1;
                stats.problems += count;
            }
            Err(e) => {
                debug!("Worksheet {} failed: {:#}", link, e);
                stats.bad_links.push(link.to_string());
            }
        }
    }

    if !stats.bad_links.is_empty() {
        let reason = format!("bad links: {}", stats.bad_links.join(", "));
        reporter.link_skipped(index_url, &reason);
    }
    Ok(stats)
}

async fn scrape_worksheet<F: Fetch>(
    fetcher: &F,
    index_url: &str,
    link: &str,
    out_dir: &Path,
) -> Result<usize> {
    let url = fetch::resolve(index_url, link)?;
    let html = fetcher.fetch_text(&url).await?;
    let problems = extract_worksheet(&html);
    let name = page_name(link);
    debug!("found {} questions in {}", problems.len(), name);

    let path: PathBuf = out_dir.join(format!("questions_{}.json", name));
    std::fs::write(&path, serde_json::to_string(&problems)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(problems.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MemoryFetcher;
    use crate::report::testing::RecordingReporter;

    const WORKSHEET: &str = r#"<html><body>
        <div class="QuestionText">Tom has 4 marbles. <b>Hint</b> He finds 3 more.</div>
        <div class="QuestionText">A bus has 12 seats.</div>
        <script>
          q[0][3][0]=new Array('7','x');
          q[1][3][0]=new Array('12','y');
        </script>
    </body></html>"#;

    #[test]
    fn hrefs_in_order() {
        let html = r#"<a href="/a">A</a><a>no href</a><a href="b.pdf">B</a>"#;
        assert_eq!(extract_hrefs(html), vec!["/a", "b.pdf"]);
    }

    #[test]
    fn worksheet_questions_and_answers() {
        let problems = extract_worksheet(WORKSHEET);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[&0].question, "Tom has 4 marbles. He finds 3 more.");
        assert_eq!(problems[&0].answer, Some(7));
        assert_eq!(problems[&1].answer, Some(12));
    }

    #[test]
    fn question_without_answer_keeps_question() {
        let html = r#"<div class="QuestionText">Lonely question</div>"#;
        let problems = extract_worksheet(html);
        assert_eq!(problems[&0].answer, None);
        let json = serde_json::to_string(&problems).unwrap();
        assert_eq!(json, r#"{"0":{"question":"Lonely question"}}"#);
    }

    #[test]
    fn only_capitalized_links() {
        let hrefs = vec![
            "Apples.html".to_string(),
            "index.html".to_string(),
            "".to_string(),
            "Pears.htm".to_string(),
        ];
        assert_eq!(worksheet_links(&hrefs), vec!["Apples.html", "Pears.htm"]);
    }

    #[test]
    fn page_names() {
        assert_eq!(page_name("Apples.html"), "Apples");
        assert_eq!(page_name("NoExtension"), "NoExtension");
    }

    #[tokio::test]
    async fn index_scrape_writes_files_and_collects_bad_links() {
        let fetcher = MemoryFetcher::default()
            .with_page(
                "http://example.test/wp/wpindex.html",
                r#"<a href="Apples.html">a</a><a href="Missing.html">m</a><a href="about.html">x</a>"#,
            )
            .with_page("http://example.test/wp/Apples.html", WORKSHEET);
        let reporter = RecordingReporter::default();
        let dir = tempfile::tempdir().unwrap();

        let stats = scrape_index(
            &fetcher,
            "http://example.test/wp/wpindex.html",
            dir.path(),
            &reporter,
        )
        .await
        .unwrap();

        assert_eq!(stats.pages, 1);
        assert_eq!(stats.problems, 2);
        assert_eq!(stats.bad_links, vec!["Missing.html"]);
        assert!(dir.path().join("questions_Apples.json").exists());
        assert_eq!(reporter.events().len(), 1);
        assert!(!fetcher.hits().iter().any(|u| u.ends_with("about.html")));
    }
}
