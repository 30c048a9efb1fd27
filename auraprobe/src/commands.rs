use crate::CLAP_STYLING;
use clap::{ArgAction, arg, command};

/// `-u` and `-p`, shared by every subcommand.
fn target_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(true)
            .help("Base URL of the Salesforce site, e.g. https://acme.my.site.com/"),
    )
    .arg(
        arg!(-p --"proxy" <PROXY>)
            .required(false)
            .help("Route every request through an HTTP or SOCKS proxy, e.g. http://127.0.0.1:8080"),
    )
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("auraprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("auraprobe")
        .about("Audit what a guest user can read through a Salesforce Aura endpoint")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log more: -v for progress, -vv for request details")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(target_args(
            command!("check").about("Only check whether the site exposes an Aura endpoint"),
        ))
        .subcommand(target_args(
            command!("objects").about("List every object the guest user can see"),
        ))
        .subcommand(
            target_args(command!("dump").about(
                "Dump every accessible object to <object>.json files and download \
                exposed documents",
            ))
            .arg(
                arg!(-f --"full")
                    .required(false)
                    .help("Page through every record instead of stopping at the first page")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                arg!(-s --"skip")
                    .required(false)
                    .help("Skip objects whose <object>.json already exists")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Output directory (default: ./<host>[_<port>][_<path>])"),
            )
            .arg(
                arg!(--"max-pages" <N>)
                    .required(false)
                    .help("Stop an object after this many pages; 0 disables the cap")
                    .value_parser(clap::value_parser!(u32))
                    .default_value("1000"),
            )
            .arg(
                arg!(--"download-timeout" <SECONDS>)
                    .required(false)
                    .help("Timeout for each document download")
                    .value_parser(clap::value_parser!(u64))
                    .default_value("300"),
            ),
        )
        .subcommand(
            target_args(command!("record").about("Dump a single record by its id as JSON")).arg(
                arg!(<RECORD_ID>)
                    .required(true)
                    .help("The record id, e.g. 005A0000001abcD"),
            ),
        )
        .subcommand(
            target_args(
                command!("pull").about("Print the first page of the named objects as JSON"),
            )
            .arg(
                arg!(<OBJECT>)
                    .required(true)
                    .num_args(1..)
                    .help("One or more object names, e.g. User Account"),
            )
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Where documents are downloaded (default: current directory)"),
            )
            .arg(
                arg!(--"download-timeout" <SECONDS>)
                    .required(false)
                    .help("Timeout for each document download")
                    .value_parser(clap::value_parser!(u64))
                    .default_value("300"),
            ),
        )
}
