use scraper::Html;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use backfile_fetch::Fetcher;

use crate::data::Database;
use crate::error::{ArchiveError, Result};

/// Width of the zero-padded filename derived from an id.
pub const FILENAME_WIDTH: usize = 6;

/// The canonical on-disk name for an assigned id: 1 becomes `000001`.
/// Ids past six digits simply widen; nothing truncates.
pub fn filename_for(id: i64) -> String {
    format!("{:0width$}", id, width = FILENAME_WIDTH)
}

/// Local page store keyed by assigned id. A url's body lands at exactly one
/// path, and the network is consulted only when that path is absent.
pub struct FetchCache {
    pages_dir: PathBuf,
    fetcher: Box<dyn Fetcher>,
}

impl FetchCache {
    pub fn new(pages_dir: PathBuf, fetcher: Box<dyn Fetcher>) -> Result<Self> {
        fs::create_dir_all(&pages_dir)?;
        Ok(Self { pages_dir, fetcher })
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Canonical path for an assigned id. The sole place a path is derived
    /// from an id; everything else asks here.
    pub fn path_for(&self, id: i64) -> PathBuf {
        self.pages_dir.join(filename_for(id))
    }

    /// Returns the stored copy of `url`, fetching and storing it first when
    /// absent. A failed fetch stores nothing, so the next call retries.
    pub fn get_or_fetch(&self, db: &Database, url: &str) -> Result<PathBuf> {
        let id = db.assign_or_get(url)?;
        let path = self.path_for(id);

        if path.exists() {
            debug!("Cache hit for {} at {}", url, path.display());
            return Ok(path);
        }

        let page = self.fetcher.fetch(url)?;
        self.write_atomic(&path, &page.body)?;
        info!("Stored {} ({} bytes) as {}", url, page.body.len(), filename_for(id));
        Ok(path)
    }

    /// Whether a body for `url` is already on disk. Unassigned urls are
    /// simply not stored, not an error.
    pub fn is_stored(&self, db: &Database, url: &str) -> Result<bool> {
        match db.lookup(url) {
            Ok(id) => Ok(self.path_for(id).exists()),
            Err(ArchiveError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Path of the stored copy of `url`. NotFetched when the url has an id
    /// but no body on disk yet.
    pub fn stored_path(&self, db: &Database, url: &str) -> Result<PathBuf> {
        let id = db.lookup(url)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(ArchiveError::NotFetched(url.to_string()));
        }
        Ok(path)
    }

    /// Parses the stored copy of `url`. Never touches the network.
    pub fn read(&self, db: &Database, url: &str) -> Result<Html> {
        let path = self.stored_path(db, url)?;
        let bytes = fs::read(&path)?;
        Ok(Html::parse_document(&String::from_utf8_lossy(&bytes)))
    }

    // Full body to a temp name, then rename: a crash mid-write must not
    // leave a truncated page at the canonical path.
    fn write_atomic(&self, path: &Path, body: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
