//! Reader and writer for rustdoc implementor index files.
//!
//! rustdoc writes one `implementors/<crate>/<module>/trait.<Name>.js` file per
//! documented trait. Each file embeds a mapping from package name to the
//! HTML fragments describing that package's implementations of the trait,
//! then hands the mapping to a page-global hook or parks it in a pending
//! slot. This crate provides:
//!
//! - Parsing of the file form into an [`ImplementorIndex`], preserving
//!   package order, fragment order and fragment bytes
//! - Rendering back to the exact generator layout
//! - Exactly-once delivery of loaded indexes to an injected
//!   [`ImplementorSink`], including the hook-or-pending
//!   [`RegistrationChannel`]
//! - Walking a whole docs tree, naming each index by its [`TraitPath`]
//! - Plain-text and link extraction from fragments
//!
//! # Quick Start
//!
//! ```no_run
//! use implindex_core::{CollectSink, Loader};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let loader = Loader::from_env()?;
//! let mut sink = CollectSink::new();
//!
//! let report = loader.load_tree("target/doc", &mut sink).await?;
//! for loaded in sink.delivered() {
//!     println!("{:?}: {} packages", loaded.trait_path, loaded.index.len());
//! }
//! println!("{} files failed", report.failures.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `IMPLINDEX_STRICT` | Require the hook/pending dispatch trailer (default: true) |
//! | `IMPLINDEX_MAX_FILE_BYTES` | Per-file read limit in bytes (default: 16 MiB) |

pub mod config;
mod digest;
pub mod error;
pub mod fragment;
pub mod index;
pub mod loader;
pub mod parse;
pub mod render;
pub mod sink;
pub mod trait_path;
pub mod tree;

// Re-export main types
pub use config::{LoaderConfig, DEFAULT_MAX_FILE_BYTES};
pub use digest::file_digest;
pub use error::{IndexError, IndexResult, SinkError};
pub use fragment::{ImplSummary, Link};
pub use index::ImplementorIndex;
pub use loader::{load, load_str, trait_path_for, Loader, TreeFailure, TreeReport};
pub use parse::{parse_index, parse_index_with, ParseOptions};
pub use render::{js_string_literal, render_index};
pub use sink::{CollectSink, ImplementorSink, LoadedIndex, RegistrationChannel, RegistrationHook};
pub use trait_path::TraitPath;
pub use tree::{discover, TraitFile, IMPLEMENTORS_DIR};
