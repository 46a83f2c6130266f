use ftptree_crawler::ListingMethod;
use tracing::Level;
use url::Url;

// Helper functions for the crawl and run handlers

/// Normalize the --host argument.
///
/// Accepts a bare `host`, `host:port`, or an `ftp://host[:port][/path]`
/// URL; a path embedded in the URL is returned as a candidate root for
/// the crawl.
pub fn parse_host_argument(raw: &str) -> Result<(String, Option<String>), String> {
    if !raw.contains("://") {
        if raw.is_empty() {
            return Err("host must not be empty".to_string());
        }
        return Ok((raw.to_string(), None));
    }

    let url = Url::parse(raw).map_err(|e| format!("invalid host URL '{}': {}", raw, e))?;
    if url.scheme() != "ftp" {
        return Err(format!(
            "unsupported scheme '{}' in '{}' (only ftp:// is crawled)",
            url.scheme(),
            raw
        ));
    }
    let host = url
        .host_str()
        .ok_or_else(|| format!("no host in '{}'", raw))?;
    let host = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let root = match url.path() {
        "" | "/" => None,
        path => Some(path.to_string()),
    };
    Ok((host, root))
}

/// Parse the --method argument.
pub fn parse_method(raw: &str) -> Result<ListingMethod, String> {
    raw.parse()
}

/// Map repeated -v flags onto a tracing level.
pub fn verbosity_level(occurrences: u8) -> Level {
    match occurrences {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
