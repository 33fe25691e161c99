//! CLI command: implindex list
//!
//! Summarize every implementor file under a docs directory.
//!
//! Usage:
//!   implindex list [target/doc] [--format text|json] [--all]

use anyhow::Result;
use implindex_core::{IndexError, LoadedIndex, Loader, SinkError};
use serde::Serialize;

use crate::cli::args::{ListArgs, OutputFormat};
use crate::exit_codes;

#[derive(Debug, Serialize)]
struct TraitRow {
    trait_path: String,
    packages: usize,
    implementing_packages: usize,
    implementors: usize,
    digest: String,
}

impl TraitRow {
    fn from_loaded(loaded: &LoadedIndex) -> Self {
        let index = &loaded.index;
        Self {
            trait_path: loaded
                .label()
                .unwrap_or_else(|| "(unknown trait)".to_string()),
            packages: index.len(),
            implementing_packages: index.non_empty_packages().count(),
            implementors: index.implementor_count(),
            digest: index.digest(),
        }
    }
}

pub async fn run(args: ListArgs, loader: &Loader) -> Result<i32> {
    let mut rows = Vec::new();
    let mut sink = |loaded: LoadedIndex| -> Result<(), SinkError> {
        if args.all || loaded.index.implementor_count() > 0 {
            rows.push(TraitRow::from_loaded(&loaded));
        }
        Ok(())
    };

    let report = match loader.load_tree(&args.root, &mut sink).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(exit_codes::for_error(&e));
        }
    };

    match args.format {
        OutputFormat::Text => {
            for row in &rows {
                println!(
                    "{}\t{}/{} packages\t{} implementors\t{}",
                    row.trait_path,
                    row.implementing_packages,
                    row.packages,
                    row.implementors,
                    row.digest
                );
            }
            println!(
                "{} traits, {} implementors",
                report.delivered.len(),
                report.implementors
            );
        }
        OutputFormat::Json => {
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "trait_path": f.trait_path.to_string(),
                        "path": f.path.display().to_string(),
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            let doc = serde_json::json!({ "traits": rows, "failures": failures });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    for failure in &report.failures {
        eprintln!("skipped {}: {}", failure.path.display(), failure.error);
    }

    Ok(if report.is_clean() {
        exit_codes::SUCCESS
    } else {
        worst_failure_code(report.failures.iter().map(|f| &f.error))
    })
}

fn worst_failure_code<'a>(errors: impl Iterator<Item = &'a IndexError>) -> i32 {
    errors
        .map(exit_codes::for_error)
        .max()
        .unwrap_or(exit_codes::CHECK_FAILED)
}
