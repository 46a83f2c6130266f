// The persisted tree document: the sole contract with readers such as
// the visualization server. Names pass through Latin-1 decoding, so
// arbitrary filename bytes survive the JSON round trip.

use crate::error::{CoreError, Result};
use ftptree_crawler::CrawlNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    /// Snapshot date, YYYY-MM-DD.
    pub date: String,
    pub root: DocNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    pub name: String,
    /// Full path of the parent directory; empty for the root. Readers
    /// locate subtrees by this prefix.
    pub path: String,
    pub size: u64,
    pub children: BTreeMap<String, DocNode>,
}

impl TreeDocument {
    /// Convert a fully aggregated crawl tree.
    ///
    /// Fails if any node still carries the unresolved-size sentinel,
    /// so a persisted document never contains one.
    pub fn from_tree(root: &CrawlNode, date: impl Into<String>) -> Result<Self> {
        Ok(Self {
            date: date.into(),
            root: convert(root)?,
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

fn convert(node: &CrawlNode) -> Result<DocNode> {
    let size = node
        .size
        .ok_or_else(|| CoreError::UnresolvedSize(node.full_path()))?;
    let mut children = BTreeMap::new();
    for (name, child) in &node.children {
        children.insert(name.clone(), convert(child)?);
    }
    Ok(DocNode {
        name: node.name.clone(),
        path: node.ancestors.clone(),
        size,
        children,
    })
}
