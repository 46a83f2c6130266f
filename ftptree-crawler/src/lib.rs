pub mod connection;
pub mod error;
pub mod listing;
pub mod protocol;
pub mod tree;

pub use connection::{ConnectionManager, Listing};
pub use error::CrawlError;
pub use listing::{EntryKind, ListingEntry, ListingMethod, ListingParser};
pub use tree::{CrawlNode, CrawlStats, TreeBuilder};
