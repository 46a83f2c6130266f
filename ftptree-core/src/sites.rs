// Site registry: the ordered collection of sites an orchestrator run
// crawls, one tree document per entry.

use crate::error::{CoreError, Result};
use ftptree_crawler::ListingMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One site to crawl. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub host: String,
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub method: ListingMethod,
    pub output: PathBuf,
}

fn default_root() -> String {
    "/".to_string()
}

/// Load the site registry from a JSON array, preserving its order.
pub fn load_registry(path: &Path) -> Result<Vec<Site>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CoreError::Registry(path.display().to_string(), e.to_string()))?;
    let sites: Vec<Site> = serde_json::from_str(&raw)
        .map_err(|e| CoreError::Registry(path.display().to_string(), e.to_string()))?;
    Ok(sites)
}
