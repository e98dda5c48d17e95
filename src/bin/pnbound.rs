use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;

use pnbound::analysis::SimulationEngine;
use pnbound::net::io::{load_net, write_json};
use pnbound::options::Options;
use pnbound::report::{AnalysisReport, render_batch_table};

fn main() -> ExitCode {
    env_logger::init();
    let options = Options::from_args();

    let files = match collect_files(&options.inputs) {
        Ok(files) => files,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut reports = Vec::new();
    let mut failed = false;
    for file in &files {
        match analyze_file(file) {
            Ok(report) => {
                if !options.batch {
                    print!("{report}");
                }
                reports.push(report);
            }
            // a broken definition aborts this file only; the rest of the
            // batch continues
            Err(err) => {
                log::error!("{}: {err:#}", file.display());
                eprintln!("error: {}: {err:#}", file.display());
                failed = true;
            }
        }
    }

    if options.batch {
        print!("{}", render_batch_table(&reports));
    }
    if let Some(output) = &options.output {
        if let Err(err) = write_json(output, &reports)
            .with_context(|| format!("writing report to {}", output.display()))
        {
            eprintln!("error: {err:#}");
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn analyze_file(path: &Path) -> anyhow::Result<AnalysisReport> {
    let (mut net, mut graph) =
        load_net(path).with_context(|| format!("loading {}", path.display()))?;
    let verdict = SimulationEngine::new().run(&mut net, &mut graph);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(AnalysisReport::new(file_name, &verdict, &net, &graph))
}

/// Expands directories into their net definition files, sorted by name so
/// batch runs are reproducible.
fn collect_files(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("reading directory {}", input.display()))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    matches!(
                        path.extension().and_then(|ext| ext.to_str()),
                        Some("json") | Some("ron")
                    )
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    anyhow::ensure!(!files.is_empty(), "no net definition files found");
    Ok(files)
}
