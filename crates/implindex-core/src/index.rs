//! The per-trait implementor index.
//!
//! An [`ImplementorIndex`] maps a package name to the HTML fragments rustdoc
//! rendered for each implementation of one trait in that package. Package
//! order and fragment order are display order and are kept exactly as
//! loaded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::digest::sha256_hex_bytes;
use crate::error::{IndexError, IndexResult};

/// Mapping from package name to its ordered implementor fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImplementorIndex {
    packages: IndexMap<String, Vec<String>>,
}

impl ImplementorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package with its fragments.
    ///
    /// Packages keep insertion order. Adding a package twice is an error;
    /// the existing entry is left untouched.
    pub fn insert(
        &mut self,
        package: impl Into<String>,
        fragments: Vec<String>,
    ) -> IndexResult<()> {
        let package = package.into();
        if self.packages.contains_key(&package) {
            return Err(IndexError::DuplicatePackage { package, line: 0 });
        }
        self.packages.insert(package, fragments);
        Ok(())
    }

    /// Fragments for a package, `None` if the package is absent.
    pub fn get(&self, package: &str) -> Option<&[String]> {
        self.packages.get(package).map(Vec::as_slice)
    }

    /// Whether the package is present (possibly with no implementors).
    pub fn contains(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// Package names in index order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// `(package, fragments)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.packages
            .iter()
            .map(|(name, fragments)| (name.as_str(), fragments.as_slice()))
    }

    /// Packages that contribute at least one implementor.
    pub fn non_empty_packages(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.iter().filter(|(_, fragments)| !fragments.is_empty())
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Total number of fragments across all packages.
    pub fn implementor_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    /// Content digest (`sha256:...`) over the canonical JSON form.
    ///
    /// Two indexes share a digest iff they have the same packages in the
    /// same order with the same fragments.
    pub fn digest(&self) -> String {
        let canonical = self.to_json();
        sha256_hex_bytes(canonical.as_bytes())
    }

    /// Compact JSON object, package order preserved.
    pub fn to_json(&self) -> String {
        // A map of strings to string lists always serializes.
        serde_json::to_string(&self.packages).unwrap_or_default()
    }

    /// Parse a JSON object of `package -> [fragment, ...]`.
    pub fn from_json(json: &str) -> IndexResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<(String, Vec<String>)> for ImplementorIndex {
    /// Later duplicates replace earlier ones, keeping the first position.
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ImplementorIndex {
    type Item = (String, Vec<String>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImplementorIndex {
        let mut index = ImplementorIndex::new();
        index.insert("b", vec!["<impl X>".to_string()]).unwrap();
        index.insert("a", vec![]).unwrap();
        index
    }

    #[test]
    fn test_insert_preserves_order() {
        let index = sample();
        let names: Vec<_> = index.packages().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.implementor_count(), 1);
    }

    #[test]
    fn test_empty_list_is_present_not_absent() {
        let index = sample();
        assert!(index.contains("a"));
        assert_eq!(index.get("a"), Some(&[][..]));
        assert_eq!(index.get("missing"), None);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut index = sample();
        let err = index.insert("a", vec!["<other>".to_string()]).unwrap_err();
        assert!(matches!(err, IndexError::DuplicatePackage { ref package, .. } if package == "a"));
        assert_eq!(index.get("a"), Some(&[][..]));
    }

    #[test]
    fn test_json_keeps_order_and_empty_lists() {
        let index = sample();
        assert_eq!(index.to_json(), r#"{"b":["<impl X>"],"a":[]}"#);

        let back = ImplementorIndex::from_json(&index.to_json()).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let result = ImplementorIndex::from_json("[1, 2]");
        assert!(matches!(result, Err(IndexError::Json { .. })));
    }

    #[test]
    fn test_digest_depends_on_order() {
        let forward = sample();
        let mut reversed = ImplementorIndex::new();
        reversed.insert("a", vec![]).unwrap();
        reversed.insert("b", vec!["<impl X>".to_string()]).unwrap();

        assert!(forward.digest().starts_with("sha256:"));
        assert_eq!(forward.digest(), sample().digest());
        assert_ne!(forward.digest(), reversed.digest());
    }

    #[test]
    fn test_non_empty_packages() {
        let index = sample();
        let names: Vec<_> = index.non_empty_packages().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b"]);
    }
}
