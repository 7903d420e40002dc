pub mod error;
pub mod fetcher;
pub mod page;

pub use error::FetchError;
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher};
