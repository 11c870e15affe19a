//! CLI definition and parameter extraction.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("oriel")
        .about("Compiler for the Oriel language")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compile")
                .about("Compile a source file to VM assembly, one file per class")
                .arg(
                    Arg::new("source")
                        .value_name("SOURCE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source file to compile"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory (created if absent)"),
                )
                .arg(
                    Arg::new("color")
                        .long("color")
                        .value_name("WHEN")
                        .default_value("auto")
                        .value_parser(["auto", "always", "never"])
                        .help("Colorize diagnostics"),
                ),
        )
}

pub struct CompileParams {
    pub source: PathBuf,
    pub out: PathBuf,
    pub colored: bool,
}

impl CompileParams {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let colored = match matches.get_one::<String>("color").map(String::as_str) {
            Some("always") => true,
            Some("never") => false,
            _ => std::io::stderr().is_terminal(),
        };
        Self {
            source: matches
                .get_one::<PathBuf>("source")
                .expect("source is required")
                .clone(),
            out: matches
                .get_one::<PathBuf>("out")
                .expect("out has a default")
                .clone(),
            colored,
        }
    }
}
