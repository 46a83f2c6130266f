// One crawl worker: crawl a single site and persist its tree document.

use crate::document::TreeDocument;
use crate::error::Result;
use ftptree_crawler::{ConnectionManager, ListingMethod, TreeBuilder};
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for one crawl worker, matching the `crawl` subcommand's
/// invocation surface.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub host: String,
    pub root: String,
    pub method: ListingMethod,
    pub output: PathBuf,
}

/// What one completed crawl produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub total_size: u64,
    pub files: u64,
    pub directories: u64,
    pub abandoned: u64,
}

/// Crawl one site to completion and write its tree document.
///
/// Abandoned subtrees degrade to empty directories and never fail the
/// worker; fatal parser/detection errors and output I/O errors do.
pub async fn execute_crawl(options: CrawlOptions) -> Result<CrawlSummary> {
    let CrawlOptions {
        host,
        root,
        method,
        output,
    } = options;

    let mut conn = ConnectionManager::new(host).with_method(method);
    conn.connect().await;

    let (mut tree, stats) = TreeBuilder::new(&mut conn).build(&root).await?;
    conn.quit().await;

    let total_size = tree.total_size();
    info!("total size of {} is {} bytes", tree.full_path(), total_size);
    if stats.abandoned > 0 {
        warn!(
            "{} path(s) abandoned; the total is a lower bound",
            stats.abandoned
        );
    }

    let date = chrono::Utc::now().date_naive().to_string();
    let document = TreeDocument::from_tree(&tree, date)?;
    document.write(&output)?;
    info!("wrote tree document to {}", output.display());

    Ok(CrawlSummary {
        total_size,
        files: stats.files,
        directories: stats.directories,
        abandoned: stats.abandoned,
    })
}
