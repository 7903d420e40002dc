use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use backfile_fetch::{FetchError, Fetcher, page};

use crate::cache::{FetchCache, filename_for};
use crate::data::Database;
use crate::error::{ArchiveError, Result};

/// On-disk layout of one archive: the database beside a `pages/` directory
/// of fetched bodies and a `text/` directory of extracted article text.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    pub root: PathBuf,
}

impl ArchiveLayout {
    pub const DB_FILE: &'static str = "archive.db";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(Self::DB_FILE)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    pub fn text_dir(&self) -> PathBuf {
        self.root.join("text")
    }
}

/// Lifecycle of a url within the archive. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Never registered with the identity map.
    Unseeded,
    /// Has an id but no stored body yet.
    Seeded,
    /// Body stored under `pages/`.
    Fetched,
    /// Links recorded in the ledger.
    Scanned,
}

/// Per-url outcome of a fetch pass. One bad url never aborts a batch, so
/// failures travel in the outcome rather than as errors.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub url: String,
    pub file: Option<PathBuf>,
    pub from_cache: bool,
    pub error: Option<String>,
}

impl PageOutcome {
    fn stored(url: String, file: PathBuf, from_cache: bool) -> Self {
        Self {
            url,
            file: Some(file),
            from_cache,
            error: None,
        }
    }

    fn failed(url: String, error: String) -> Self {
        Self {
            url,
            file: None,
            from_cache: false,
            error: Some(error),
        }
    }
}

/// Per-url outcome of a scan pass.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub url: String,
    pub links: usize,
    pub skipped: bool,
    pub error: Option<String>,
}

impl ScanOutcome {
    fn recorded(url: String, links: usize) -> Self {
        Self {
            url,
            links,
            skipped: false,
            error: None,
        }
    }

    fn skipped(url: String) -> Self {
        Self {
            url,
            links: 0,
            skipped: true,
            error: None,
        }
    }

    fn failed(url: String, error: String) -> Self {
        Self {
            url,
            links: 0,
            skipped: false,
            error: Some(error),
        }
    }
}

/// Totals of one text-extraction pass over the fetched articles.
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub written: usize,
    pub skipped: usize,
    pub missing: usize,
    pub failed: usize,
}

/// The archive agent: seeds urls into the identity map, fetches their
/// bodies through the cache, records their links in the ledger, and
/// derives article urls from what the ledger holds.
pub struct Agent {
    layout: ArchiveLayout,
    db: Database,
    cache: FetchCache,
}

impl Agent {
    /// Opens the archive at `layout`, creating directories and the database
    /// as needed. An existing valid store is loaded; a corrupt one fails
    /// here rather than limping along.
    pub fn open(layout: ArchiveLayout, fetcher: Box<dyn Fetcher>) -> Result<Self> {
        if layout.root.as_os_str().is_empty() {
            return Err(ArchiveError::InvalidArgument(
                "archive directory must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&layout.root)?;
        let db = Database::new(&layout.db_path())?;
        let cache = FetchCache::new(layout.pages_dir(), fetcher)?;
        Ok(Self { layout, db, cache })
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    // Seeding

    /// Registers `url` with the identity map and returns its id. Seeding a
    /// known url returns the id it already had.
    pub fn seed(&self, url: &str) -> Result<i64> {
        self.db.assign_or_get(url)
    }

    /// Seeds every url in order; returns how many were new.
    pub fn seed_all(&self, urls: &[String]) -> Result<usize> {
        let before = self.db.url_count()?;
        for url in urls {
            self.db.assign_or_get(url)?;
        }
        let after = self.db.url_count()?;
        info!("Seeded {} urls ({} new)", urls.len(), after - before);
        Ok(after - before)
    }

    // Fetching

    /// Ensures the body of `url` is stored locally, fetching it at most
    /// once per archive.
    pub fn fetch(&self, url: &str) -> Result<PathBuf> {
        self.cache.get_or_fetch(&self.db, url)
    }

    /// Like [`fetch`](Self::fetch) but never fails the caller: the error
    /// rides in the outcome.
    pub fn fetch_page(&self, url: &str) -> PageOutcome {
        let from_cache = match self.cache.is_stored(&self.db, url) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                return PageOutcome::failed(url.to_string(), e.to_string());
            }
        };

        match self.cache.get_or_fetch(&self.db, url) {
            Ok(path) => PageOutcome::stored(url.to_string(), path, from_cache),
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                PageOutcome::failed(url.to_string(), e.to_string())
            }
        }
    }

    /// Fetches each url in order, continuing past failures.
    pub fn fetch_all(&self, urls: &[String]) -> Vec<PageOutcome> {
        urls.iter().map(|url| self.fetch_page(url)).collect()
    }

    // Scanning

    /// Extracts the links of a stored page into the ledger. A url is
    /// scanned at most once; re-scans are skips, not errors. Scanning an
    /// unfetched url is NotFetched; scan never triggers a fetch.
    pub fn scan(&self, url: &str, scope: Option<&str>) -> Result<ScanOutcome> {
        if self.db.is_scanned(url)? {
            debug!("Already scanned: {}", url);
            return Ok(ScanOutcome::skipped(url.to_string()));
        }

        let document = self.cache.read(&self.db, url)?;
        let links = page::extract_links(&document, scope).map_err(|e| match e {
            FetchError::InvalidSelector(css) => ArchiveError::Selector(css),
            other => ArchiveError::Fetch(other),
        })?;
        self.db.record_links(url, &links)?;
        debug!("Recorded {} links for {}", links.len(), url);
        Ok(ScanOutcome::recorded(url.to_string(), links.len()))
    }

    /// Scans each url in order, continuing past failures.
    pub fn scan_all(&self, urls: &[String], scope: Option<&str>) -> Vec<ScanOutcome> {
        urls.iter()
            .map(|url| {
                self.scan(url, scope).unwrap_or_else(|e| {
                    warn!("Scan failed for {}: {}", url, e);
                    ScanOutcome::failed(url.clone(), e.to_string())
                })
            })
            .collect()
    }

    // Articles

    /// Every url linked from a scanned page: resolved against the page it
    /// appeared on, http(s) only, first-seen order, deduplicated. Articles
    /// are leaves; they are fetched and read but never scanned themselves.
    pub fn article_urls(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut articles = Vec::new();

        for (source, links) in self.db.scanned_pages()? {
            for href in links {
                if let Some(resolved) = page::resolve_link(&source, &href)
                    && seen.insert(resolved.clone())
                {
                    articles.push(resolved);
                }
            }
        }
        Ok(articles)
    }

    /// Fetches every article url through the cache.
    pub fn fetch_articles(&self) -> Result<Vec<PageOutcome>> {
        let articles = self.article_urls()?;
        info!("Fetching {} linked articles", articles.len());
        Ok(self.fetch_all(&articles))
    }

    /// Writes the plain text of each fetched article to `text/<id>.txt`.
    /// Existing text files are left alone; unfetched articles are counted
    /// as missing and skipped.
    pub fn extract_text(&self) -> Result<ExtractSummary> {
        let text_dir = self.layout.text_dir();
        fs::create_dir_all(&text_dir)?;

        let mut summary = ExtractSummary::default();
        for url in self.article_urls()? {
            let id = match self.db.lookup(&url) {
                Ok(id) => id,
                Err(ArchiveError::NotFound(_)) => {
                    summary.missing += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let out_path = text_dir.join(format!("{}.txt", filename_for(id)));
            if out_path.exists() {
                summary.skipped += 1;
                continue;
            }

            let document = match self.cache.read(&self.db, &url) {
                Ok(document) => document,
                Err(ArchiveError::NotFetched(_)) => {
                    summary.missing += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Text extraction failed for {}: {}", url, e);
                    summary.failed += 1;
                    continue;
                }
            };

            fs::write(&out_path, page::extract_text(&document))?;
            summary.written += 1;
        }

        info!(
            "Extracted text for {} articles ({} already done, {} not fetched)",
            summary.written, summary.skipped, summary.missing
        );
        Ok(summary)
    }

    // State

    /// Where `url` sits in its lifecycle.
    pub fn state(&self, url: &str) -> Result<PageState> {
        let id = match self.db.lookup(url) {
            Ok(id) => id,
            Err(ArchiveError::NotFound(_)) => return Ok(PageState::Unseeded),
            Err(e) => return Err(e),
        };

        if self.db.is_scanned(url)? {
            return Ok(PageState::Scanned);
        }
        if self.cache.path_for(id).exists() {
            return Ok(PageState::Fetched);
        }
        Ok(PageState::Seeded)
    }

    // Reset

    /// Full reset: removes the database and every fetched or extracted
    /// file. The next open starts a fresh store with ids from 1. The root
    /// directory itself is left in place.
    pub fn clean(self) -> Result<()> {
        let layout = self.layout.clone();
        // Close the connection before unlinking its file.
        drop(self);
        clean_archive(&layout)
    }
}

/// Removes the database and the `pages/` and `text/` directories of an
/// archive without opening it, so even a corrupt store can be reset.
pub fn clean_archive(layout: &ArchiveLayout) -> Result<()> {
    info!("Removing archive contents under {}", layout.root.display());
    let db_path = layout.db_path();
    if db_path.exists() {
        Database::drop(&db_path)?;
    }
    for dir in [layout.pages_dir(), layout.text_dir()] {
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
    }
    Ok(())
}
