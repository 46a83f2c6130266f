//! The crawl tree: node type, recursive construction from listings,
//! and lazy bottom-up size aggregation.
//!
//! Nodes form a strict tree: each node is owned by its parent's
//! children map and the root is owned by the caller, so there are no
//! cycles and no shared ownership to manage.

use crate::connection::{ConnectionManager, Listing};
use crate::error::Result;
use crate::listing::EntryKind;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// One node of the crawled tree. `size` is `None` until resolved:
/// directly from the listing for files, by [`CrawlNode::total_size`]
/// for directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlNode {
    /// Entry name as reported by the server (Latin-1 decoded bytes).
    pub name: String,
    /// Full path of the parent directory; empty for the root.
    pub ancestors: String,
    pub size: Option<u64>,
    pub children: BTreeMap<String, CrawlNode>,
}

impl CrawlNode {
    /// The root of a crawl, named after the configured root path.
    pub fn root(path: impl Into<String>) -> Self {
        Self {
            name: path.into(),
            ancestors: String::new(),
            size: None,
            children: BTreeMap::new(),
        }
    }

    pub fn dir(name: impl Into<String>, ancestors: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ancestors: ancestors.into(),
            size: None,
            children: BTreeMap::new(),
        }
    }

    pub fn leaf(name: impl Into<String>, ancestors: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            ancestors: ancestors.into(),
            size: Some(size),
            children: BTreeMap::new(),
        }
    }

    /// Full remote path of this node.
    pub fn full_path(&self) -> String {
        if self.ancestors.is_empty() {
            self.name.clone()
        } else if self.ancestors.ends_with('/') {
            format!("{}{}", self.ancestors, self.name)
        } else {
            format!("{}/{}", self.ancestors, self.name)
        }
    }

    /// Resolve and return this node's total size.
    ///
    /// Already-resolved sizes are returned as-is; otherwise the
    /// resolved sizes of all children are summed (resolving them
    /// first) and cached, so every node is aggregated exactly once.
    /// A node abandoned during the crawl has no children and resolves
    /// to zero.
    pub fn total_size(&mut self) -> u64 {
        if let Some(size) = self.size {
            return size;
        }
        let total: u64 = self.children.values_mut().map(|c| c.total_size()).sum();
        self.size = Some(total);
        total
    }
}

/// Counters accumulated over one crawl, reported in the worker summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub files: u64,
    pub directories: u64,
    pub abandoned: u64,
}

/// Depth-first recursive descent driven by a connection manager.
pub struct TreeBuilder<'a> {
    conn: &'a mut ConnectionManager,
    stats: CrawlStats,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(conn: &'a mut ConnectionManager) -> Self {
        Self {
            conn,
            stats: CrawlStats::default(),
        }
    }

    /// Crawl the subtree rooted at `root_path` and return it together
    /// with the crawl counters. Children appear in listing order;
    /// an abandoned path yields a node with no children and an
    /// unresolved size, containing the damage to that branch.
    pub async fn build(mut self, root_path: &str) -> Result<(CrawlNode, CrawlStats)> {
        let mut root = CrawlNode::root(root_path);
        self.populate(&mut root).await?;
        Ok((root, self.stats))
    }

    fn populate<'b>(
        &'b mut self,
        node: &'b mut CrawlNode,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'b>> {
        Box::pin(async move {
            let path = node.full_path();
            match self.conn.list(&path).await? {
                Listing::Abandoned => {
                    self.stats.abandoned += 1;
                    return Ok(());
                }
                Listing::Entries(entries) => {
                    for entry in entries {
                        match entry.kind {
                            EntryKind::File => {
                                let leaf = CrawlNode::leaf(
                                    entry.name.clone(),
                                    path.clone(),
                                    entry.size.unwrap_or(0),
                                );
                                debug!("appended file {}", leaf.full_path());
                                self.stats.files += 1;
                                node.children.insert(entry.name, leaf);
                            }
                            EntryKind::Dir => {
                                self.stats.directories += 1;
                                let mut child =
                                    CrawlNode::dir(entry.name.clone(), path.clone());
                                self.populate(&mut child).await?;
                                node.children.insert(entry.name, child);
                            }
                        }
                    }
                }
            }
            debug!("completed directory {}", path);
            Ok(())
        })
    }
}
