use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub const DEFAULT_DATA_DIR: &str = "~/.config/strider/";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("strider")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("strider")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" ... "Raise log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the strider data directory and installs the stop-word list")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the strider data directory")
                        .default_value(DEFAULT_DATA_DIR),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrites an existing stop-word list at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl from one or more seed URLs, staying in scope and recording \
                analytics for every HTML page.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth from the seeds")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(data_dir_arg())
                .arg(
                    arg!(-a --"allowed-domain" <SUFFIX>)
                        .required(false)
                        .help("Allowed host suffix, e.g. .ics.uci.edu (repeatable; default: UCI domains)")
                        .action(clap::ArgAction::Append),
                )
                .arg(root_domain_arg())
                .arg(
                    arg!(--"trap-policy")
                        .required(false)
                        .help("Also reject deep, repetitive, calendar-like and over-long URLs")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("report")
                .about("Print the analytics report for the recorded crawl")
                .arg(data_dir_arg())
                .arg(
                    arg!(-s --"stop-words" <PATH>)
                        .required(false)
                        .help("Stop-word list (default: stop_words.txt in the data directory)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-n --"top" <N>)
                        .required(false)
                        .help("How many common words to list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(root_domain_arg())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("scope")
                .about("Check URLs against the scope filter without crawling")
                .arg(
                    arg!(<URLS> ...)
                        .required(true)
                        .help("URLs to check"),
                )
                .arg(
                    arg!(-a --"allowed-domain" <SUFFIX>)
                        .required(false)
                        .help("Allowed host suffix (repeatable; default: UCI domains)")
                        .action(clap::ArgAction::Append),
                ),
        )
}

fn data_dir_arg() -> clap::Arg {
    arg!(-d --"data-dir" <PATH>)
        .required(false)
        .help("Directory holding analytics.json and stop_words.txt")
        .default_value(DEFAULT_DATA_DIR)
}

fn root_domain_arg() -> clap::Arg {
    arg!(--"root-domain" <DOMAIN>)
        .required(false)
        .help("Domain whose subdomains are counted in the report")
        .default_value(strider_core::config::DEFAULT_ROOT_DOMAIN)
}
