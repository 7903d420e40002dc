pub mod archive;
pub mod cache;
pub mod data;
pub mod error;
pub mod report;
pub mod seeds;

pub use archive::{Agent, ArchiveLayout, ExtractSummary, PageOutcome, PageState, ScanOutcome};
pub use cache::FetchCache;
pub use data::Database;
pub use error::{ArchiveError, Result};

/// Version banner the CLI prints unless asked to be quiet.
pub fn print_banner() {
    println!("backfile v{}", env!("CARGO_PKG_VERSION"));
    println!("a single-site dated-archive crawler\n");
}
