use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("backfile")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("backfile")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes an archive directory and its database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the archive directory")
                        .default_value("./archive"),
                )
                .arg(
                    arg!(-f --"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Seeds archive pages from a dated url schema or a seeds file, fetches each \
                one at most once, and records the links it finds.",
                )
                .arg(
                    arg!(-d --"dir" <PATH>)
                        .required(false)
                        .help("The archive directory to work in")
                        .default_value("./archive"),
                )
                .arg(
                    arg!(-s --"schema" <TEMPLATE>)
                        .required(false)
                        .help("Archive url template with a {} date placeholder")
                        .conflicts_with("seeds-file"),
                )
                .arg(
                    arg!(--"from" <DATE>)
                        .required(false)
                        .help("Newest date to crawl: 'today' or YYYY-MM-DD")
                        .default_value("today"),
                )
                .arg(
                    arg!(--"until" <DATE>)
                        .required(false)
                        .help("Earliest date to crawl back to: 'today' or YYYY-MM-DD"),
                )
                .arg(
                    arg!(--"date-format" <STYLE>)
                        .required(false)
                        .help("How dates are rendered into the schema placeholder")
                        .value_parser(["compact", "dashed"])
                        .default_value("compact"),
                )
                .arg(
                    arg!(-S --"seeds-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed urls")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("schema"),
                )
                .arg(
                    arg!(-w --"within" <SELECTOR>)
                        .required(false)
                        .help("CSS selector limiting link extraction to matching containers, e.g. 'ul.list16'"),
                )
                .arg(
                    arg!(--"no-scan")
                        .required(false)
                        .help("Fetch pages only; skip link extraction")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                ),
        )
        .subcommand(
            command!("articles")
                .about("Fetches every page linked from the scanned archive pages")
                .arg(
                    arg!(-d --"dir" <PATH>)
                        .required(false)
                        .help("The archive directory to work in")
                        .default_value("./archive"),
                )
                .arg(
                    arg!(--"with-text")
                        .required(false)
                        .help("Extract article text after fetching")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                ),
        )
        .subcommand(
            command!("extract")
                .about("Writes the plain text of fetched articles to the text directory")
                .arg(
                    arg!(-d --"dir" <PATH>)
                        .required(false)
                        .help("The archive directory to work in")
                        .default_value("./archive"),
                ),
        )
        .subcommand(
            command!("report")
                .about("Summarizes the links recorded in the scan ledger")
                .arg(
                    arg!(-d --"dir" <PATH>)
                        .required(false)
                        .help("The archive directory to work in")
                        .default_value("./archive"),
                )
                .arg(
                    arg!(--"filter" <SUBSTRING>)
                        .required(false)
                        .help("Count only links containing this substring"),
                )
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
            command!("clean")
                .about("Removes the archive database and every fetched or extracted file")
                .arg(
                    arg!(-d --"dir" <PATH>)
                        .required(false)
                        .help("The archive directory to clean")
                        .default_value("./archive"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Skip the confirmation prompt")
                        .required(false),
                ),
        )
}
