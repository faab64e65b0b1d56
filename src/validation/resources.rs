//! Resource strings: namespace → key → text.

use std::collections::HashMap;

use parking_lot::RwLock;

pub const DEFAULT_NAMESPACE: &str = "default";

/// Thread-safe resource catalog, seeded from configuration.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    entries: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: HashMap<String, HashMap<String, String>>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Text for `key` in `namespace`, or the empty string.
    pub fn get(&self, namespace: &str, key: &str) -> String {
        self.entries
            .read()
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&self, namespace: &str, key: &str, text: impl Into<String>) {
        self.entries
            .write()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), text.into());
    }

    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_missing() {
        let catalog = ResourceCatalog::new();
        catalog.set(DEFAULT_NAMESPACE, "email", "Invalid e-mail.");
        catalog.set("forms", "name", "Name is required.");

        assert_eq!(catalog.get("default", "email"), "Invalid e-mail.");
        assert_eq!(catalog.get("forms", "name"), "Name is required.");
        assert_eq!(catalog.get("forms", "email"), "");
        assert_eq!(catalog.get("nope", "email"), "");
        assert_eq!(catalog.namespaces(), vec!["default", "forms"]);
    }
}
