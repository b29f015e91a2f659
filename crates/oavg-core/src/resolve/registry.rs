use indexmap::IndexMap;

use super::reserved;
use super::strict_name;

/// Mapping from schema key to exported identifier for one generation run.
///
/// Built once by the resolver and never mutated afterwards. Keys are the
/// component schema keys after collision repair, so every `$ref` left in a
/// resolved document can be looked up directly.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    identifiers: IndexMap<String, String>,
    renames: IndexMap<String, String>,
}

impl NameRegistry {
    pub(crate) fn new(
        identifiers: IndexMap<String, String>,
        renames: IndexMap<String, String>,
    ) -> Self {
        Self {
            identifiers,
            renames,
        }
    }

    /// Loose identifier for a schema key.
    pub fn identifier(&self, logical: &str) -> Option<&str> {
        self.identifiers.get(logical).map(String::as_str)
    }

    /// Strict identifier for a schema key; always the loose one plus `Strict`.
    pub fn strict_identifier(&self, logical: &str) -> Option<String> {
        self.identifier(logical).map(strict_name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        reserved::is_reserved(name)
    }

    /// Keys renamed by collision repair, original → new.
    pub fn renames(&self) -> &IndexMap<String, String> {
        &self.renames
    }

    /// `(key, identifier)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.identifiers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
