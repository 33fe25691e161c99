//! Loading indexes and handing them to a sink.
//!
//! Every successfully parsed file is delivered exactly once. A file that
//! fails to parse is never delivered. Sink failures are returned to the
//! caller as [`IndexError::Sink`].

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::ImplementorIndex;
use crate::parse::{parse_index, parse_index_with};
use crate::sink::{ImplementorSink, LoadedIndex};
use crate::trait_path::TraitPath;
use crate::tree::{self, IMPLEMENTORS_DIR};

/// Parse an index file and return the index directly.
pub fn load_str(source: &str) -> IndexResult<ImplementorIndex> {
    parse_index(source)
}

/// Parse an index file and deliver it to `sink` exactly once.
///
/// ```
/// use implindex_core::{load, RegistrationChannel};
///
/// let file = "(function() {var implementors = {};\n\
///             implementors[\"a\"] = [];\n\
///             if (window.register_implementors) { window.register_implementors(implementors); }\n\
///             else { window.pending_implementors = implementors; }\n\
///             })()\n";
///
/// let mut channel = RegistrationChannel::new();
/// load(file, &mut channel).unwrap();
/// assert!(channel.pending().unwrap().contains("a"));
/// ```
pub fn load<S>(source: &str, sink: &mut S) -> IndexResult<()>
where
    S: ImplementorSink + ?Sized,
{
    let index = parse_index(source)?;
    deliver(LoadedIndex::anonymous(index), sink)
}

fn deliver<S>(loaded: LoadedIndex, sink: &mut S) -> IndexResult<()>
where
    S: ImplementorSink + ?Sized,
{
    let trait_path = loaded.label();
    sink.accept(loaded)
        .map_err(|source| IndexError::Sink { trait_path, source })
}

/// Outcome of loading a whole tree.
#[derive(Debug, Default)]
pub struct TreeReport {
    /// Traits whose index was delivered, in delivery order.
    pub delivered: Vec<TraitPath>,

    /// Files that could not be read or parsed.
    pub failures: Vec<TreeFailure>,

    /// Packages across all delivered indexes.
    pub packages: usize,

    /// Implementor fragments across all delivered indexes.
    pub implementors: usize,
}

impl TreeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A file skipped while loading a tree.
#[derive(Debug)]
pub struct TreeFailure {
    pub trait_path: TraitPath,
    pub path: PathBuf,
    pub error: IndexError,
}

/// Loads index files from disk according to a [`LoaderConfig`].
#[derive(Debug, Clone)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a loader, rejecting unusable config.
    pub fn new(config: LoaderConfig) -> IndexResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a loader from environment variables.
    pub fn from_env() -> IndexResult<Self> {
        Self::new(LoaderConfig::from_env())
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Parse file text using this loader's settings.
    pub fn load_source(&self, source: &str) -> IndexResult<ImplementorIndex> {
        parse_index_with(source, self.config.parse_options())
    }

    /// Read a file, enforcing the size limit.
    pub async fn read_file(&self, path: impl AsRef<Path>) -> IndexResult<String> {
        let path = path.as_ref();
        let meta = fs::metadata(path)
            .await
            .map_err(|e| IndexError::io(path.display(), e))?;

        if meta.len() > self.config.max_file_bytes {
            return Err(IndexError::TooLarge {
                path: path.display().to_string(),
                size: meta.len(),
                limit: self.config.max_file_bytes,
            });
        }

        fs::read_to_string(path)
            .await
            .map_err(|e| IndexError::io(path.display(), e))
    }

    /// Read and parse one file without delivering it.
    pub async fn read_index(&self, path: impl AsRef<Path>) -> IndexResult<LoadedIndex> {
        let path = path.as_ref();
        let source = self.read_file(path).await?;
        let index = self.load_source(&source)?;
        Ok(LoadedIndex {
            trait_path: trait_path_for(path),
            source: Some(path.to_path_buf()),
            index,
        })
    }

    /// Load one file and deliver it to `sink`.
    ///
    /// The trait path is filled in when the file sits under an
    /// `implementors/` directory.
    pub async fn load_file<S>(&self, path: impl AsRef<Path>, sink: &mut S) -> IndexResult<()>
    where
        S: ImplementorSink + ?Sized,
    {
        let path = path.as_ref();
        let loaded = self.read_index(path).await?;
        debug!(
            path = %path.display(),
            trait_path = ?loaded.label(),
            packages = loaded.index.len(),
            "loaded implementor file"
        );
        deliver(loaded, sink)
    }

    /// Load every trait file under `root`, delivering each parsed index.
    ///
    /// Files that fail to read or parse are recorded in the report and
    /// skipped. A sink failure stops the walk and is returned.
    pub async fn load_tree<S>(&self, root: impl AsRef<Path>, sink: &mut S) -> IndexResult<TreeReport>
    where
        S: ImplementorSink + ?Sized,
    {
        let files = tree::discover(root.as_ref()).await?;
        let mut report = TreeReport::default();

        for file in files {
            let index = match self.read_file(&file.path).await {
                Ok(source) => self.load_source(&source),
                Err(e) => Err(e),
            };

            let index = match index {
                Ok(index) => index,
                Err(error) => {
                    warn!(
                        trait_path = %file.trait_path,
                        path = %file.path.display(),
                        error = %error,
                        "skipping unreadable implementor file"
                    );
                    report.failures.push(TreeFailure {
                        trait_path: file.trait_path,
                        path: file.path,
                        error,
                    });
                    continue;
                }
            };

            report.packages += index.len();
            report.implementors += index.implementor_count();
            report.delivered.push(file.trait_path.clone());

            deliver(
                LoadedIndex {
                    trait_path: Some(file.trait_path),
                    source: Some(file.path),
                    index,
                },
                sink,
            )?;
        }

        info!(
            root = %root.as_ref().display(),
            delivered = report.delivered.len(),
            failed = report.failures.len(),
            "loaded implementor tree"
        );
        Ok(report)
    }
}

/// Trait path for a file located somewhere under an `implementors/` directory.
pub fn trait_path_for(path: &Path) -> Option<TraitPath> {
    let components: Vec<Component<'_>> = path.components().collect();
    let anchor = components
        .iter()
        .rposition(|c| c.as_os_str() == IMPLEMENTORS_DIR)?;
    let relative: PathBuf = components[anchor + 1..].iter().collect();
    TraitPath::from_relative_path(relative).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::sink::{CollectSink, RegistrationChannel};

    const FILE: &str = "(function() {var implementors = {};\n\
        implementors[\"a\"] = [];\n\
        implementors[\"b\"] = [\"<impl X>\",];\n\
        \n            if (window.register_implementors) {\n\
                        window.register_implementors(implementors);\n\
                    } else {\n\
                        window.pending_implementors = implementors;\n\
                    }\n\
        })()\n";

    fn expected() -> ImplementorIndex {
        let mut index = ImplementorIndex::new();
        index.insert("a", vec![]).unwrap();
        index.insert("b", vec!["<impl X>".to_string()]).unwrap();
        index
    }

    #[test]
    fn test_load_without_hook_fills_pending() {
        let mut channel = RegistrationChannel::new();
        load(FILE, &mut channel).unwrap();
        assert_eq!(channel.pending(), Some(&expected()));
        assert_eq!(channel.hook_calls(), 0);
    }

    #[test]
    fn test_load_with_hook_calls_once() {
        let mut prior = ImplementorIndex::new();
        prior.insert("stale", vec![]).unwrap();

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = std::sync::Arc::clone(&seen);
        let mut channel = RegistrationChannel::with_hook(move |index| {
            record.lock().unwrap().push(index);
            Ok(())
        })
        .with_pending(prior.clone());

        load(FILE, &mut channel).unwrap();

        assert_eq!(channel.hook_calls(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![expected()]);
        assert_eq!(channel.pending(), Some(&prior));
    }

    #[test]
    fn test_parse_failure_does_not_deliver() {
        let mut sink = CollectSink::new();
        let result = load("(function() {var implementors = {};\nimplementors[", &mut sink);
        assert!(matches!(result, Err(IndexError::Parse { .. })));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sink_failure_is_surfaced() {
        let mut sink = |_: LoadedIndex| -> Result<(), SinkError> { Err("full".into()) };
        let err = load(FILE, &mut sink).unwrap_err();
        assert!(matches!(err, IndexError::Sink { trait_path: None, .. }));
    }

    #[test]
    fn test_load_str_returns_index() {
        assert_eq!(load_str(FILE).unwrap(), expected());
    }

    #[test]
    fn test_trait_path_for() {
        let path = Path::new("target/doc/implementors/core/ops/bit/trait.Shl.js");
        assert_eq!(
            trait_path_for(path).map(|p| p.to_string()),
            Some("core::ops::bit::Shl".to_string())
        );
        assert_eq!(trait_path_for(Path::new("loose/trait.Shl.js")), None);
    }

    #[test]
    fn test_loader_rejects_zero_limit() {
        let result = Loader::new(LoaderConfig::default().with_max_file_bytes(0));
        assert!(matches!(result, Err(IndexError::Config { .. })));
    }

    #[test]
    fn test_lenient_loader_accepts_missing_trailer() {
        let loader = Loader::new(LoaderConfig::default().with_strict(false)).unwrap();
        let index = loader
            .load_source("(function() {var implementors = {};\nimplementors[\"a\"] = [];\n")
            .unwrap();
        assert!(index.contains("a"));
    }
}
