//! Connection manager: exactly one control connection per host, with
//! unbounded reconnect-backoff and a bounded per-path listing retry
//! budget that degrades to abandonment.

use crate::error::{CrawlError, Result};
use crate::listing::{ListingEntry, ListingMethod, ListingParser, detect_from_list};
use crate::protocol::FtpCodec;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_CONNECT_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_LIST_BACKOFF: Duration = Duration::from_secs(2);
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of listing one path.
#[derive(Debug)]
pub enum Listing {
    Entries(Vec<ListingEntry>),
    /// The path failed past the retry budget. Treated as an empty
    /// subtree by the tree builder, not as a crawl-ending error.
    Abandoned,
}

pub struct ConnectionManager {
    host: String,
    codec: Option<FtpCodec>,
    parser: Option<ListingParser>,
    failed_attempts: u32,
    max_attempts: u32,
    connect_backoff: Duration,
    list_backoff: Duration,
    command_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            codec: None,
            parser: None,
            failed_attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            connect_backoff: DEFAULT_CONNECT_BACKOFF,
            list_backoff: DEFAULT_LIST_BACKOFF,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_method(mut self, method: ListingMethod) -> Self {
        self.parser = method.parser();
        self
    }

    /// Pin an already-resolved parser, bypassing detection entirely.
    pub fn with_parser(mut self, parser: ListingParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, connect: Duration, list: Duration) -> Self {
        self.connect_backoff = connect;
        self.list_backoff = list;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// The parser in use, once resolved (explicitly or by detection).
    pub fn parser(&self) -> Option<ListingParser> {
        self.parser
    }

    /// Connect and log in, retrying with jittered backoff until the
    /// host accepts us. The host is assumed eventually reachable, so
    /// the loop has no upper bound.
    pub async fn connect(&mut self) {
        let mut attempt: u64 = 1;
        loop {
            info!("connecting to {} (attempt {})", self.host, attempt);
            match self.try_connect().await {
                Ok(codec) => {
                    self.codec = Some(codec);
                    info!("connected to {}", self.host);
                    return;
                }
                Err(e) => {
                    let wait = jitter(self.connect_backoff);
                    warn!(
                        "failed to connect to {}: {}; retrying in {:?}",
                        self.host, e, wait
                    );
                    sleep(wait).await;
                }
            }
            attempt += 1;
        }
    }

    async fn try_connect(&self) -> Result<FtpCodec> {
        let (mut codec, _banner) = FtpCodec::connect(&self.host, self.command_timeout).await?;
        codec.login_anonymous().await?;
        Ok(codec)
    }

    /// List one path.
    ///
    /// Transient failures drop the socket, wait a jittered backoff,
    /// reconnect and retry the same path; after `max_attempts`
    /// consecutive failures the path is abandoned and the budget
    /// resets so the next path starts clean. Fatal errors (no usable
    /// parser, unrecognized entry type) propagate immediately.
    pub async fn list(&mut self, path: &str) -> Result<Listing> {
        loop {
            if self.codec.is_none() {
                self.connect().await;
            }
            match self.try_list(path).await {
                Ok(entries) => {
                    self.failed_attempts = 0;
                    info!("processed {}", path);
                    return Ok(Listing::Entries(entries));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.failed_attempts += 1;
                    warn!(
                        "listing failed for {} (attempt {}/{}): {}",
                        path, self.failed_attempts, self.max_attempts, e
                    );
                    self.codec = None;
                    if self.failed_attempts >= self.max_attempts {
                        warn!(
                            "abandoning {} after {} failed attempts",
                            path, self.max_attempts
                        );
                        self.failed_attempts = 0;
                        return Ok(Listing::Abandoned);
                    }
                    sleep(jitter(self.list_backoff)).await;
                    self.connect().await;
                }
            }
        }
    }

    async fn try_list(&mut self, path: &str) -> Result<Vec<ListingEntry>> {
        match self.parser {
            Some(parser) => {
                let raw = self.fetch_raw(parser, path).await?;
                parser.parse(&raw)
            }
            None => self.detect_and_list(path).await,
        }
    }

    async fn fetch_raw(&mut self, parser: ListingParser, path: &str) -> Result<String> {
        let codec = self
            .codec
            .as_mut()
            .ok_or_else(|| CrawlError::Protocol("no active connection".into()))?;
        let cmd = match parser {
            ListingParser::Mlsd => format!("MLSD {}", path),
            _ => format!("LIST {}", path),
        };
        codec.retrieve_listing(&cmd).await
    }

    /// Resolve the parser on the first listing of the crawl: probe
    /// MLSD, and on a permanent rejection classify a raw LIST body.
    /// The result is cached for the rest of the crawl, surviving
    /// reconnects.
    async fn detect_and_list(&mut self, path: &str) -> Result<Vec<ListingEntry>> {
        let codec = self
            .codec
            .as_mut()
            .ok_or_else(|| CrawlError::Protocol("no active connection".into()))?;

        match codec.retrieve_listing(&format!("MLSD {}", path)).await {
            Ok(raw) => {
                info!("{} speaks mlsd", self.host);
                self.parser = Some(ListingParser::Mlsd);
                ListingParser::Mlsd.parse(&raw)
            }
            Err(CrawlError::Reply(code, _)) if (400..600).contains(&code) => {
                let raw = codec.retrieve_listing(&format!("LIST {}", path)).await?;
                let parser = detect_from_list(&raw)?;
                info!("detected {}-style listings on {}", parser.name(), self.host);
                self.parser = Some(parser);
                parser.parse(&raw)
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort graceful close at end of crawl.
    pub async fn quit(&mut self) {
        if let Some(mut codec) = self.codec.take() {
            codec.quit().await;
        }
    }
}

fn jitter(base: Duration) -> Duration {
    base.mul_f64(rand::random::<f64>())
}
