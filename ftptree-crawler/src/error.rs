use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("server reply {0}: {1}")]
    Reply(u16, String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("could not detect listing format: {0}")]
    FormatDetection(String),

    #[error("unrecognized entry type in listing line: {0}")]
    UnrecognizedEntry(String),
}

impl CrawlError {
    /// Fatal errors abort the whole crawl instead of being retried:
    /// a host with no usable listing parser, or a line no parser
    /// understands, cannot yield a correct tree however often we
    /// reconnect. Everything else is transient.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CrawlError::FormatDetection(_) | CrawlError::UnrecognizedEntry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
