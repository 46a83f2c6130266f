use clap::ArgMatches;
use clap::parser::ValueSource;
use colored::Colorize;
use commands::command_argument_builder;
use ftptree_core::crawl::{CrawlOptions, execute_crawl};
use ftptree_core::orchestrator::{Orchestrator, WorkerStatus};
use ftptree_core::{load_registry, print_banner};
use handlers::{parse_host_argument, parse_method, verbosity_level};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

mod commands;
mod handlers;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("run", primary_command)) => handle_run(primary_command).await,
        None => {
            // No subcommand provided, just show the banner
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn init_tracing(args: &ArgMatches) {
    let level = verbosity_level(args.get_count("verbose"));
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

// Handler functions

async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    init_tracing(sub_matches);

    let raw_host = sub_matches.get_one::<String>("host").unwrap();
    let (host, url_root) = match parse_host_argument(raw_host) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(2);
        }
    };

    // An explicit --root wins over a root embedded in the host URL.
    let root_flag = sub_matches.get_one::<String>("root").unwrap();
    let root = if sub_matches.value_source("root") == Some(ValueSource::CommandLine) {
        root_flag.clone()
    } else {
        url_root.unwrap_or_else(|| root_flag.clone())
    };

    let method = parse_method(sub_matches.get_one::<String>("method").unwrap()).unwrap();
    let output = sub_matches.get_one::<PathBuf>("output").unwrap();
    let output = PathBuf::from(shellexpand::tilde(&output.to_string_lossy()).to_string());

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("crawling {}{}", host, root));
        Some(pb)
    };

    match execute_crawl(CrawlOptions {
        host,
        root,
        method,
        output: output.clone(),
    })
    .await
    {
        Ok(summary) => {
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            println!("{} Crawl complete!", "✓".green().bold());
            println!("  Total size: {} bytes", summary.total_size);
            println!("  Files: {}", summary.files);
            println!("  Directories: {}", summary.directories);
            if summary.abandoned > 0 {
                println!(
                    "  {} {} path(s) abandoned; sizes are a lower bound",
                    "!".yellow().bold(),
                    summary.abandoned
                );
            }
            println!("  Tree document: {}", output.display());
        }
        Err(e) => {
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            eprintln!("{} Crawl failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn handle_run(sub_matches: &ArgMatches) {
    init_tracing(sub_matches);

    let sites_path = sub_matches.get_one::<String>("sites").unwrap();
    let expanded = shellexpand::tilde(sites_path);
    let sites = match load_registry(Path::new(expanded.as_ref())) {
        Ok(sites) => sites,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(2);
        }
    };
    if sites.is_empty() {
        eprintln!("{} registry is empty, nothing to crawl", "✗".red().bold());
        return;
    }

    let poll_interval =
        Duration::from_secs(*sub_matches.get_one::<u64>("poll-interval").unwrap());

    let program = match std::env::current_exe() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{} cannot locate own binary: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    info!("orchestrating {} site(s)", sites.len());
    let mut orchestrator = match Orchestrator::spawn_all(&program, &sites) {
        Ok(orchestrator) => orchestrator.with_poll_interval(poll_interval),
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    orchestrator.supervise().await;

    let failed: Vec<&str> = orchestrator
        .workers()
        .iter()
        .filter(|w| w.status() == WorkerStatus::Failed)
        .map(|w| w.site_id())
        .collect();

    if failed.is_empty() {
        println!("{} All sites crawled", "✓".green().bold());
    } else {
        eprintln!(
            "{} {} of {} site(s) failed: {}",
            "✗".red().bold(),
            failed.len(),
            orchestrator.workers().len(),
            failed.join(", ")
        );
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
