use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SpendsortError};

/// Prefix of the label given to rows no mapping entry recognizes.
pub const UNFILED: &str = "Unfiled";

/// One mapping document as stored on disk. Every section is optional.
#[derive(Debug, Default, Deserialize)]
struct MappingDocument {
    #[serde(default)]
    exact: HashMap<String, String>,
    #[serde(default, with = "crate::ordered")]
    partial: Vec<(String, String)>,
    #[serde(default)]
    category_replace: HashMap<String, String>,
    #[serde(default)]
    skip: Vec<String>,
}

/// Merged category mapping, built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    exact: HashMap<String, String>,
    /// Lowercased pattern → category, in document order.
    partial: Vec<(String, String)>,
    replace: HashMap<String, String>,
    skip: HashSet<String>,
}

impl CategoryMap {
    pub fn from_json(content: &str) -> Result<Self> {
        let mut map = Self::default();
        map.merge(serde_json::from_str(content)?);
        Ok(map)
    }

    /// Load and merge every `*.json` document in `dir`, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let config_err = |path: &Path, e: std::io::Error| {
            SpendsortError::Config(format!("{}: {e}", path.display()))
        };
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| config_err(dir, e))? {
            let path = entry.map_err(|e| config_err(dir, e))?.path();
            if path.is_file()
                && path
                    .extension()
                    .map_or(false, |e| e.eq_ignore_ascii_case("json"))
            {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(SpendsortError::Config(format!(
                "No mapping documents found in {}",
                dir.display()
            )));
        }

        let mut map = Self::default();
        for path in &paths {
            let content = std::fs::read_to_string(path).map_err(|e| config_err(path.as_path(), e))?;
            let doc: MappingDocument = serde_json::from_str(&content).map_err(|e| {
                SpendsortError::Config(format!("{}: {e}", path.display()))
            })?;
            debug!("Loaded mapping {}", path.display());
            map.merge(doc);
        }
        Ok(map)
    }

    /// Later documents win on key collisions; skip lists accumulate.
    /// A redefined partial pattern keeps its original position.
    fn merge(&mut self, doc: MappingDocument) {
        self.exact.extend(doc.exact);
        for (pattern, category) in doc.partial {
            let pattern = pattern.to_lowercase();
            if pattern.trim().is_empty() {
                warn!("Ignoring empty partial pattern for {category:?}");
                continue;
            }
            match self.partial.iter_mut().find(|(p, _)| *p == pattern) {
                Some(entry) => entry.1 = category,
                None => self.partial.push((pattern, category)),
            }
        }
        self.replace.extend(doc.category_replace);
        self.skip.extend(doc.skip);
    }

    /// Resolve a category from lookup keys in priority order.
    ///
    /// Each key gets an exact lookup and then a case-insensitive substring
    /// scan over the partial patterns before the next key is tried. The
    /// first matching pattern wins. Nothing matching yields
    /// `Unfiled (<keys>)`.
    pub fn resolve<'a, I>(&self, keys: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keys: Vec<&str> = keys
            .into_iter()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();

        for key in &keys {
            if let Some(category) = self.lookup(key) {
                return category.to_string();
            }
        }
        format!("{UNFILED} ({})", keys.join(", "))
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        if let Some(category) = self.exact.get(key).filter(|c| !c.is_empty()) {
            return Some(category.as_str());
        }
        let lowered = key.to_lowercase();
        self.partial
            .iter()
            .find(|(pattern, _)| lowered.contains(pattern.as_str()))
            .map(|(_, category)| category.as_str())
    }

    /// Apply the rename table once. Chains are not followed.
    pub fn rewrite(&self, category: &str) -> String {
        match self.replace.get(category) {
            Some(replacement) if !replacement.is_empty() => replacement.clone(),
            _ => category.to_string(),
        }
    }

    pub fn is_skipped(&self, category: &str) -> bool {
        self.skip.contains(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> CategoryMap {
        CategoryMap::from_json(
            r#"{
                "exact": {"ACME s.r.o.": "Salary", "B": "Exact B", "Empty": ""},
                "partial": {"UBER": "Transport", "lidl": "Groceries", "a": "Partial A"},
                "category_replace": {"Transport": "Travel", "Travel": "Holidays", "Blank": ""},
                "skip": ["Transfer"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(mapping().resolve(["ACME s.r.o."]), "Salary");
    }

    #[test]
    fn test_later_key_used_when_first_has_no_match() {
        let map = CategoryMap::from_json(r#"{"exact": {"B": "Exact B"}}"#).unwrap();
        assert_eq!(map.resolve(["A", "B"]), "Exact B");
    }

    #[test]
    fn test_first_key_wins_entirely() {
        // "A" matches the partial pattern "a" before "B" is looked up exactly.
        assert_eq!(mapping().resolve(["A", "B"]), "Partial A");
    }

    #[test]
    fn test_partial_match_is_case_insensitive() {
        assert_eq!(mapping().resolve(["UBER EATS PRAGUE"]), "Transport");
        assert_eq!(mapping().resolve(["Platba LIDL Praha"]), "Groceries");
    }

    #[test]
    fn test_first_listed_pattern_wins() {
        let map = CategoryMap::from_json(
            r#"{"partial": {"shop": "Shopping", "coffee shop": "Coffee"}}"#,
        )
        .unwrap();
        assert_eq!(map.resolve(["Coffee Shop Brno"]), "Shopping");
    }

    #[test]
    fn test_blank_keys_are_ignored() {
        let map = CategoryMap::from_json(r#"{"exact": {"Rent": "Housing"}}"#).unwrap();
        assert_eq!(map.resolve(["", "   ", " Rent "]), "Housing");
    }

    #[test]
    fn test_empty_exact_value_is_no_match() {
        let map = CategoryMap::from_json(r#"{"exact": {"Empty": ""}}"#).unwrap();
        assert_eq!(map.resolve(["Empty"]), "Unfiled (Empty)");
    }

    #[test]
    fn test_unfiled_embeds_keys() {
        assert_eq!(mapping().resolve(["XYZ 1", "", "0000/0100"]), "Unfiled (XYZ 1, 0000/0100)");
        assert_eq!(mapping().resolve(Vec::<&str>::new()), "Unfiled ()");
    }

    #[test]
    fn test_rewrite_is_single_pass() {
        let map = mapping();
        assert_eq!(map.rewrite("Transport"), "Travel");
        assert_eq!(map.rewrite("Travel"), "Holidays");
        assert_eq!(map.rewrite("Groceries"), "Groceries");
        assert_eq!(map.rewrite("Blank"), "Blank");
    }

    #[test]
    fn test_skip_list() {
        let map = mapping();
        assert!(map.is_skipped("Transfer"));
        assert!(!map.is_skipped("Groceries"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let map = CategoryMap::from_json("{}").unwrap();
        assert_eq!(map.resolve(["anything"]), "Unfiled (anything)");
        assert_eq!(map.rewrite("X"), "X");
    }

    #[test]
    fn test_load_dir_merges_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("01-base.json"),
            r#"{
                "exact": {"Rent": "Housing", "Gym": "Sport"},
                "partial": {"albert": "Groceries", "shell": "Fuel"},
                "category_replace": {"Fuel": "Car"},
                "skip": ["Transfer"]
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("02-override.json"),
            r#"{
                "exact": {"Gym": "Health"},
                "partial": {"omv": "Fuel", "ALBERT": "Food"},
                "skip": ["Savings"]
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let map = CategoryMap::load_dir(dir.path()).unwrap();
        assert_eq!(map.resolve(["Rent"]), "Housing");
        assert_eq!(map.resolve(["Gym"]), "Health");
        assert_eq!(map.resolve(["Albert Praha"]), "Food");
        assert_eq!(map.rewrite("Fuel"), "Car");
        assert!(map.is_skipped("Transfer"));
        assert!(map.is_skipped("Savings"));
        let patterns: Vec<&str> = map.partial.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(patterns, vec!["albert", "shell", "omv"]);
    }

    #[test]
    fn test_load_dir_without_documents_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = CategoryMap::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SpendsortError::Config(_)));
    }

    #[test]
    fn test_load_dir_reports_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("01-ok.json"), "{}").unwrap();
        std::fs::write(dir.path().join("02-latin2.json"), [0x7b, 0xe8, 0x7d]).unwrap();
        let err = CategoryMap::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SpendsortError::Config(_)));
        assert!(err.to_string().contains("02-latin2.json"));
    }

    #[test]
    fn test_load_dir_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mapping.json"), "{not json").unwrap();
        let err = CategoryMap::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("mapping.json"));
    }
}
