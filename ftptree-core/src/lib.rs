pub mod crawl;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod sites;

pub use crawl::{CrawlOptions, CrawlSummary, execute_crawl};
pub use document::{DocNode, TreeDocument};
pub use error::CoreError;
pub use orchestrator::{Orchestrator, WorkerHandle, WorkerStatus};
pub use sites::{Site, load_registry};

use colored::Colorize;

/// Print the startup banner.
pub fn print_banner() {
    let banner = r#"
   __ _         _
  / _| |_ _ __ | |_ _ __ ___  ___
 | |_| __| '_ \| __| '__/ _ \/ _ \
 |  _| |_| |_) | |_| | |  __/  __/
 |_|  \__| .__/ \__|_|  \___|\___|
         |_|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "{}",
        format!("  ftptree v{} - FTP sites as sized trees", env!("CARGO_PKG_VERSION"))
            .bright_white()
            .bold()
    );
    println!();
}
