//! Parsing Options.
//! One or more net definition files (or directories of them), `--batch` for
//! the tabular overview, `--output` for a JSON report file.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

#[derive(Debug)]
pub struct Options {
    /// Files or directories given on the command line.
    pub inputs: Vec<PathBuf>,
    /// Render one summary table instead of per-file reports.
    pub batch: bool,
    /// Optional path for a machine-readable JSON report.
    pub output: Option<PathBuf>,
}

fn make_options_parser() -> Command {
    Command::new("pnbound")
        .about("Boundedness analysis of place/transition nets")
        .version("v0.1.0")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .help("Net definition files (.json/.ron) or directories to scan")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("batch")
                .short('b')
                .long("batch")
                .help("Print one result table for all files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the reports will be stored as JSON"),
        )
}

impl Options {
    pub fn from_args() -> Self {
        let matches = make_options_parser().get_matches();
        Self {
            inputs: matches
                .get_many::<String>("input")
                .expect("input is required")
                .map(PathBuf::from)
                .collect(),
            batch: matches.get_flag("batch"),
            output: matches.get_one::<String>("output").map(PathBuf::from),
        }
    }
}
