//! CLI command: implindex show
//!
//! Print the index embedded in a single implementor file.
//!
//! Usage:
//!   implindex show target/doc/implementors/core/ops/bit/trait.Shl.js [--format text|json|js] [--plain]

use anyhow::Result;
use implindex_core::fragment::to_plain_text;
use implindex_core::{render_index, CollectSink, LoadedIndex, Loader};
use serde_json::json;

use crate::cli::args::{ShowArgs, ShowFormat};
use crate::exit_codes;

pub async fn run(args: ShowArgs, loader: &Loader) -> Result<i32> {
    let mut sink = CollectSink::new();
    if let Err(e) = loader.load_file(&args.file, &mut sink).await {
        eprintln!("error: {e}");
        return Ok(exit_codes::for_error(&e));
    }

    // load_file delivers exactly one index on success.
    let Some(loaded) = sink.into_inner().pop() else {
        anyhow::bail!("loader reported success without delivering an index");
    };

    let output = match args.format {
        ShowFormat::Text => format_text(&loaded, args.plain, args.non_empty),
        ShowFormat::Json => format_json(&loaded, args.plain, args.non_empty)?,
        ShowFormat::Js => render_index(&loaded.index),
    };
    print!("{output}");
    Ok(exit_codes::SUCCESS)
}

fn fragment_text(fragment: &str, plain: bool) -> String {
    if plain {
        to_plain_text(fragment)
    } else {
        fragment.to_string()
    }
}

fn format_text(loaded: &LoadedIndex, plain: bool, non_empty: bool) -> String {
    let index = &loaded.index;
    let mut out = String::new();

    let title = loaded
        .label()
        .unwrap_or_else(|| "(unknown trait)".to_string());
    out.push_str(&format!(
        "{title}: {} packages, {} implementors, {}\n",
        index.len(),
        index.implementor_count(),
        index.digest()
    ));

    for (package, fragments) in index.iter() {
        if fragments.is_empty() {
            if !non_empty {
                out.push_str(&format!("{package} (none)\n"));
            }
            continue;
        }
        out.push_str(&format!("{package}\n"));
        for fragment in fragments {
            out.push_str(&format!("  {}\n", fragment_text(fragment, plain)));
        }
    }
    out
}

fn format_json(loaded: &LoadedIndex, plain: bool, non_empty: bool) -> Result<String> {
    let packages: serde_json::Map<String, serde_json::Value> = loaded
        .index
        .iter()
        .filter(|(_, fragments)| !non_empty || !fragments.is_empty())
        .map(|(package, fragments)| {
            let rendered: Vec<String> = fragments
                .iter()
                .map(|f| fragment_text(f, plain))
                .collect();
            (package.to_string(), json!(rendered))
        })
        .collect();

    let doc = json!({
        "trait_path": loaded.label(),
        "source": loaded.source.as_ref().map(|p| p.display().to_string()),
        "digest": loaded.index.digest(),
        "packages": packages,
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&doc)?))
}
