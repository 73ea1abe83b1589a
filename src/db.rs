use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id            INTEGER PRIMARY KEY,
            url           TEXT UNIQUE NOT NULL,
            filename      TEXT NOT NULL,
            downloaded    BOOLEAN NOT NULL DEFAULT 0,
            downloaded_at TEXT,
            extracted_at  TEXT,
            records       INTEGER,
            error         TEXT,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_documents_downloaded ON documents(downloaded);
        CREATE INDEX IF NOT EXISTS idx_documents_filename ON documents(filename);
        ",
    )?;
    Ok(())
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

// ── Crawling ──

/// Record discovered `(url, filename)` pairs; already known URLs are kept.
pub fn insert_documents(conn: &Connection, docs: &[(String, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO documents (url, filename) VALUES (?1, ?2)")?;
        for (url, filename) in docs {
            count += stmt.execute(rusqlite::params![url, filename])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct PendingDocument {
    pub id: i64,
    pub url: String,
    pub filename: String,
}

pub fn fetch_undownloaded(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingDocument>> {
    let sql = format!(
        "SELECT id, url, filename FROM documents WHERE downloaded = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingDocument {
                id: row.get(0)?,
                url: row.get(1)?,
                filename: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Queue every known document for download again.
pub fn reset_downloads(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("UPDATE documents SET downloaded = 0", [])?)
}

// ── Downloading / extraction ──

pub fn mark_downloaded(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE documents SET downloaded = 1, downloaded_at = ?2 WHERE id = ?1",
        rusqlite::params![id, now()],
    )?;
    Ok(())
}

/// Store the outcome of extracting `filename`. Returns the rows touched,
/// zero for local files that never went through the crawler.
pub fn record_extraction(
    conn: &Connection,
    filename: &str,
    records: Option<usize>,
    error: Option<&str>,
) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE documents SET extracted_at = ?2, records = ?3, error = ?4 WHERE filename = ?1",
        rusqlite::params![filename, now(), records.map(|n| n as i64), error],
    )?;
    Ok(updated)
}

pub struct Stats {
    pub total: usize,
    pub downloaded: usize,
    pub pending: usize,
    pub extracted: usize,
    pub failed: usize,
    pub records: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let downloaded: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE downloaded = 1",
        [],
        |r| r.get(0),
    )?;
    let extracted: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE extracted_at IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let failed: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let records: usize = conn.query_row(
        "SELECT COALESCE(SUM(records), 0) FROM documents",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        downloaded,
        pending: total - downloaded,
        extracted,
        failed,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn docs() -> Vec<(String, String)> {
        vec![
            ("http://x.test/a.pdf".into(), "a.pdf".into()),
            ("http://x.test/b.pdf".into(), "b.pdf".into()),
        ]
    }

    #[test]
    fn insert_is_idempotent() {
        let conn = memory();
        assert_eq!(insert_documents(&conn, &docs()).unwrap(), 2);
        assert_eq!(insert_documents(&conn, &docs()).unwrap(), 0);
        assert_eq!(get_stats(&conn).unwrap().total, 2);
    }

    #[test]
    fn download_and_extraction_lifecycle() {
        let conn = memory();
        insert_documents(&conn, &docs()).unwrap();

        let pending = fetch_undownloaded(&conn, Some(1)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].filename, "a.pdf");
        mark_downloaded(&conn, pending[0].id).unwrap();
        assert_eq!(fetch_undownloaded(&conn, None).unwrap().len(), 1);

        assert_eq!(record_extraction(&conn, "a.pdf", Some(4), None).unwrap(), 1);
        assert_eq!(
            record_extraction(&conn, "b.pdf", None, Some("missing page 2")).unwrap(),
            1
        );
        assert_eq!(record_extraction(&conn, "local.pdf", Some(1), None).unwrap(), 0);

        let s = get_stats(&conn).unwrap();
        assert_eq!(s.downloaded, 1);
        assert_eq!(s.pending, 1);
        assert_eq!(s.extracted, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.records, 4);

        assert_eq!(reset_downloads(&conn).unwrap(), 2);
        assert_eq!(fetch_undownloaded(&conn, None).unwrap().len(), 2);
    }
}
