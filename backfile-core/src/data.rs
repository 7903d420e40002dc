use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ArchiveError, Result};

/// One SQLite file holding both archive tables: `file_names` maps each url
/// to the id its on-disk copy is named after, `scanned` is the write-once
/// ledger of links extracted from a page.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Removes the database file together with its WAL sidecars. Leaving a
    /// stale `-wal` file next to a recreated database would let SQLite
    /// recover frames from the old store.
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = path.as_os_str().to_os_string();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                fs::remove_file(&sidecar)?;
            }
        }
        Ok(())
    }

    /// Opens the store at `path`, creating it when absent. A file that is
    /// present but not a SQLite database fails here, not at first use.
    pub fn new(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Creating archive database at {}", path.display());
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- url -> id identity map. AUTOINCREMENT keeps ids monotonically
            -- increasing and never reused, even across deletes.
            CREATE TABLE IF NOT EXISTS file_names (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE
            );

            -- Write-once scan ledger; links is a JSON array of raw hrefs
            -- in document order.
            CREATE TABLE IF NOT EXISTS scanned (
                url TEXT PRIMARY KEY,
                links TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // Identity map operations

    /// Returns the id assigned to `url`, assigning the next free one on
    /// first sight. The url/id pair is durable before this returns.
    pub fn assign_or_get(&self, url: &str) -> Result<i64> {
        let url = valid_url(url)?;

        if let Some(id) = self.find_id(url)? {
            return Ok(id);
        }

        self.conn
            .execute("INSERT INTO file_names (url) VALUES (?1)", params![url])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The id previously assigned to `url`; NotFound when it never was.
    pub fn lookup(&self, url: &str) -> Result<i64> {
        let url = valid_url(url)?;
        self.find_id(url)?
            .ok_or_else(|| ArchiveError::NotFound(url.to_string()))
    }

    fn find_id(&self, url: &str) -> Result<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM file_names WHERE url = ?1")?;

        let id = stmt.query_row(params![url], |row| row.get(0)).optional()?;
        Ok(id)
    }

    pub fn url_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM file_names", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // Scan ledger operations

    pub fn is_scanned(&self, url: &str) -> Result<bool> {
        let url = valid_url(url)?;
        let mut stmt = self.conn.prepare("SELECT 1 FROM scanned WHERE url = ?1")?;

        let hit: Option<i64> = stmt.query_row(params![url], |row| row.get(0)).optional()?;
        Ok(hit.is_some())
    }

    /// Records the links extracted from `url`. The ledger is write-once: a
    /// second record for the same url is AlreadyScanned, never an update.
    pub fn record_links(&self, url: &str, links: &[String]) -> Result<()> {
        let url = valid_url(url)?;
        if self.is_scanned(url)? {
            return Err(ArchiveError::AlreadyScanned(url.to_string()));
        }

        let links_json = serde_json::to_string(links)?;
        self.conn.execute(
            "INSERT INTO scanned (url, links) VALUES (?1, ?2)",
            params![url, links_json],
        )?;
        Ok(())
    }

    /// The links recorded for `url`, exactly as extracted.
    pub fn links_for(&self, url: &str) -> Result<Vec<String>> {
        let url = valid_url(url)?;
        let mut stmt = self
            .conn
            .prepare("SELECT links FROM scanned WHERE url = ?1")?;

        let raw: Option<String> = stmt.query_row(params![url], |row| row.get(0)).optional()?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(ArchiveError::NotFound(url.to_string())),
        }
    }

    /// Every scanned page with its recorded links, in the order the pages
    /// were first scanned.
    pub fn scanned_pages(&self) -> Result<Vec<(String, Vec<String>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, links FROM scanned ORDER BY rowid")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut pages = Vec::with_capacity(rows.len());
        for (url, json) in rows {
            pages.push((url, serde_json::from_str(&json)?));
        }
        Ok(pages)
    }

    pub fn scanned_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scanned", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn valid_url(url: &str) -> Result<&str> {
    if url.trim().is_empty() {
        return Err(ArchiveError::InvalidArgument(
            "url must be a non-empty string".to_string(),
        ));
    }
    Ok(url)
}
