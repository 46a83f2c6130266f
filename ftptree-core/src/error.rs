use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("crawl failed: {0}")]
    Crawl(#[from] ftptree_crawler::CrawlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {0} has an unresolved size")]
    UnresolvedSize(String),

    #[error("failed to spawn worker for site {0}: {1}")]
    Spawn(String, std::io::Error),

    #[error("site registry {0}: {1}")]
    Registry(String, String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
