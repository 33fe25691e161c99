//! CLI command: implindex render
//!
//! Turn a JSON index into an implementor file.
//!
//! Usage:
//!   implindex render index.json [-o trait.Foo.js]

use anyhow::{Context, Result};
use implindex_core::{render_index, ImplementorIndex};
use tracing::info;

use crate::cli::args::RenderArgs;
use crate::exit_codes;

pub async fn run(args: RenderArgs) -> Result<i32> {
    let json = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read index: {}", args.input.display()))?;

    let index = match ImplementorIndex::from_json(&json) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("error: {}: {e}", args.input.display());
            return Ok(exit_codes::INPUT_ERROR);
        }
    };

    let rendered = render_index(&index);
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                packages = index.len(),
                "wrote implementor file"
            );
        }
        None => print!("{rendered}"),
    }
    Ok(exit_codes::SUCCESS)
}
