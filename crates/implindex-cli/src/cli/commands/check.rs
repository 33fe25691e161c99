//! CLI command: implindex check
//!
//! Verify that implementor files parse and that rendering the parsed index
//! reproduces each file byte for byte.
//!
//! Usage:
//!   implindex check <FILE|DIR>... [--format text|json]

use std::path::{Path, PathBuf};

use anyhow::Result;
use implindex_core::{discover, file_digest, render_index, trait_path_for, Loader};
use serde::Serialize;
use tracing::debug;

use crate::cli::args::{CheckArgs, OutputFormat};
use crate::exit_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Ok,
    Mismatch,
    Error,
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    trait_path: Option<String>,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip)]
    exit_code: i32,
}

pub async fn run(args: CheckArgs, loader: &Loader) -> Result<i32> {
    let mut results = Vec::new();

    for path in &args.paths {
        match collect_files(path).await {
            Ok(files) => {
                for file in files {
                    results.push(check_file(loader, &file).await);
                }
            }
            Err(result) => results.push(result),
        }
    }

    match args.format {
        OutputFormat::Text => {
            for result in &results {
                let label = result.trait_path.as_deref().unwrap_or(&result.path);
                match (&result.status, &result.detail) {
                    (Status::Ok, _) => println!("ok       {label}"),
                    (status, detail) => println!(
                        "{:<8} {label}: {}",
                        format!("{status:?}").to_lowercase(),
                        detail.as_deref().unwrap_or("")
                    ),
                }
            }
            let failed = results.iter().filter(|r| r.status != Status::Ok).count();
            println!("{} checked, {} failed", results.len(), failed);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(results
        .iter()
        .map(|r| r.exit_code)
        .max()
        .unwrap_or(exit_codes::SUCCESS))
}

async fn collect_files(path: &Path) -> Result<Vec<PathBuf>, FileResult> {
    let is_dir = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Ok(vec![path.to_path_buf()]);
    }

    match discover(path).await {
        Ok(files) => Ok(files.into_iter().map(|f| f.path).collect()),
        Err(e) => Err(FileResult {
            path: path.display().to_string(),
            trait_path: None,
            status: Status::Error,
            digest: None,
            detail: Some(e.to_string()),
            exit_code: exit_codes::for_error(&e),
        }),
    }
}

async fn check_file(loader: &Loader, path: &Path) -> FileResult {
    let mut result = FileResult {
        path: path.display().to_string(),
        trait_path: trait_path_for(path).map(|p| p.to_string()),
        status: Status::Ok,
        digest: None,
        detail: None,
        exit_code: exit_codes::SUCCESS,
    };

    let parsed = match loader.read_file(path).await {
        Ok(source) => loader.load_source(&source).map(|index| (source, index)),
        Err(e) => Err(e),
    };

    match parsed {
        Ok((source, index)) => {
            result.digest = Some(file_digest(source.as_bytes()));
            let rendered = render_index(&index);
            if rendered != source {
                result.status = Status::Mismatch;
                result.detail = Some(first_difference(&source, &rendered));
                result.exit_code = exit_codes::CHECK_FAILED;
            }
            debug!(path = %path.display(), status = ?result.status, "checked implementor file");
        }
        Err(e) => {
            result.status = Status::Error;
            result.detail = Some(e.to_string());
            result.exit_code = exit_codes::for_error(&e);
        }
    }
    result
}

/// Describe the first line where two texts diverge.
fn first_difference(expected: &str, actual: &str) -> String {
    let mut expected_lines = expected.split_inclusive('\n');
    let mut actual_lines = actual.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            (None, None) => return "identical".to_string(),
            _ => return format!("re-rendered file differs at line {line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference("a\nb\n", "a\nb\n"), "identical");
        assert_eq!(
            first_difference("a\nb\nc\n", "a\nx\nc\n"),
            "re-rendered file differs at line 2"
        );
        assert_eq!(
            first_difference("a\n", "a\nextra\n"),
            "re-rendered file differs at line 2"
        );
    }
}
