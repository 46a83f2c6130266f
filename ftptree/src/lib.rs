// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{parse_host_argument, parse_method, verbosity_level};

// Re-export crawl functionality from ftptree-core
pub use ftptree_core::crawl::{CrawlOptions, CrawlSummary, execute_crawl};
