//! News retrieval: query expansion, feed sources, retrying fetcher, dedup.

pub mod connectivity;
pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod query;
pub mod source;

pub use connectivity::{AlwaysReachable, ConnectivityProbe, HttpProbe};
pub use dedup::dedup;
pub use error::FetchError;
pub use fetcher::{FeedFetcher, NewsFetcher};
pub use query::{expand, QUERY_TEMPLATES};
pub use source::{parse_feed, FeedQuery, FeedSource, GoogleNewsSource};
