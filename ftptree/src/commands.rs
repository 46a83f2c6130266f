use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("ftptree")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("ftptree")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and progress output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a single FTP site and write its sized tree as a JSON \
                document.",
                )
                .arg(
                    arg!(-H --"host" <HOST>)
                        .required(true)
                        .help("Host to crawl: host, host:port, or ftp://host[:port][/root]"),
                )
                .arg(
                    arg!(-r --"root" <PATH>)
                        .required(false)
                        .help("Remote path to start the crawl from")
                        .default_value("/"),
                )
                .arg(
                    arg!(-m --"method" <METHOD>)
                        .required(false)
                        .help("Directory-listing format the server speaks")
                        .value_parser(["auto", "mlsd", "unix", "windows"])
                        .default_value("auto"),
                )
                .arg(
                    arg!(-o --"output" <FILE>)
                        .required(true)
                        .help("Where to write the tree document")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-v --"verbose" "Increase log verbosity (repeatable)")
                        .required(false)
                        .action(clap::ArgAction::Count),
                ),
        )
        .subcommand(
            command!("run")
                .about(
                    "Crawl every site in a registry, one supervised worker process \
                per site.",
                )
                .arg(
                    arg!(-s --"sites" <FILE>)
                        .required(true)
                        .help("Path to the sites.json registry"),
                )
                .arg(
                    arg!(-p --"poll-interval" <SECONDS>)
                        .required(false)
                        .help("How often to poll worker status")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                )
                .arg(
                    arg!(-v --"verbose" "Increase log verbosity (repeatable)")
                        .required(false)
                        .action(clap::ArgAction::Count),
                ),
        )
}
