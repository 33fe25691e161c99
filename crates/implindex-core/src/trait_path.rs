//! Trait paths derived from implementor file locations.
//!
//! rustdoc writes the index for `alloc::string::ToString` to
//! `implementors/alloc/string/trait.ToString.js`.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

const FILE_PREFIX: &str = "trait.";
const FILE_SUFFIX: &str = ".js";

/// Fully qualified path of a documented trait.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraitPath {
    segments: Vec<String>,
}

impl TraitPath {
    /// Build from a file path relative to the `implementors/` directory.
    ///
    /// ```
    /// use implindex_core::TraitPath;
    ///
    /// let path = TraitPath::from_relative_path("core/ops/bit/trait.Shl.js").unwrap();
    /// assert_eq!(path.to_string(), "core::ops::bit::Shl");
    /// assert_eq!(path.name(), "Shl");
    /// ```
    pub fn from_relative_path(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let invalid = |reason: &str| IndexError::InvalidTraitPath {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| invalid("path is not valid UTF-8"))?;
                    segments.push(part.to_string());
                }
                Component::CurDir => {}
                _ => return Err(invalid("path must be relative and normalized")),
            }
        }

        let file_name = segments.pop().ok_or_else(|| invalid("empty path"))?;
        let name = file_name
            .strip_prefix(FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            .ok_or_else(|| invalid("file name must look like trait.<Name>.js"))?;

        if segments.is_empty() {
            return Err(invalid("missing crate directory"));
        }
        segments.push(name.to_string());

        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(invalid(&format!("{bad:?} is not an identifier")));
        }

        Ok(Self { segments })
    }

    /// Trait name without its module path.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Crate the trait is defined in.
    pub fn krate(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// Module segments between the crate and the trait name.
    pub fn modules(&self) -> &[String] {
        match self.segments.len() {
            0 | 1 => &[],
            n => &self.segments[1..n - 1],
        }
    }

    /// Location of the index file relative to `implementors/`.
    pub fn file_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        if let Some((name, dirs)) = self.segments.split_last() {
            for dir in dirs {
                path.push(dir);
            }
            path.push(format!("{FILE_PREFIX}{name}{FILE_SUFFIX}"));
        }
        path
    }
}

impl FromStr for TraitPath {
    type Err = IndexError;

    fn from_str(s: &str) -> IndexResult<Self> {
        let segments: Vec<String> = s.split("::").map(str::to_string).collect();
        if segments.len() < 2 {
            return Err(IndexError::InvalidTraitPath {
                path: s.to_string(),
                reason: "expected crate::...::Trait".to_string(),
            });
        }
        if let Some(bad) = segments.iter().find(|seg| !is_identifier(seg)) {
            return Err(IndexError::InvalidTraitPath {
                path: s.to_string(),
                reason: format!("{bad:?} is not an identifier"),
            });
        }
        Ok(Self { segments })
    }
}

impl TryFrom<String> for TraitPath {
    type Error = IndexError;

    fn try_from(value: String) -> IndexResult<Self> {
        value.parse()
    }
}

impl From<TraitPath> for String {
    fn from(path: TraitPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_relative_path() {
        let path = TraitPath::from_relative_path("alloc/string/trait.ToString.js").unwrap();
        assert_eq!(path.to_string(), "alloc::string::ToString");
        assert_eq!(path.krate(), "alloc");
        assert_eq!(path.modules(), &["string".to_string()]);
        assert_eq!(path.name(), "ToString");
    }

    #[test]
    fn test_file_path_round_trip() {
        let path: TraitPath = "core::ops::bit::Shl".parse().unwrap();
        assert_eq!(
            path.file_path(),
            PathBuf::from("core").join("ops").join("bit").join("trait.Shl.js")
        );
        assert_eq!(TraitPath::from_relative_path(path.file_path()).unwrap(), path);
    }

    #[test]
    fn test_crate_root_trait() {
        let path = TraitPath::from_relative_path("serde/trait.Serialize.js").unwrap();
        assert_eq!(path.to_string(), "serde::Serialize");
        assert!(path.modules().is_empty());
    }

    #[test]
    fn test_rejects_non_trait_files() {
        for bad in [
            "alloc/string/struct.String.js",
            "trait.ToString.js",
            "alloc/string/trait.ToString.json",
            "../alloc/trait.X.js",
            "/abs/trait.X.js",
            "alloc/string/trait.To-String.js",
        ] {
            let result = TraitPath::from_relative_path(bad);
            assert!(
                matches!(result, Err(IndexError::InvalidTraitPath { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_strings() {
        assert!("ToString".parse::<TraitPath>().is_err());
        assert!("alloc::::ToString".parse::<TraitPath>().is_err());
        assert!("alloc::string::".parse::<TraitPath>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let path: TraitPath = "alloc::string::ToString".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"alloc::string::ToString\"");
        let back: TraitPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
