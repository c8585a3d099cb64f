use std::fmt;

use serde::{Deserialize, Serialize};

/// A single principal contributed by a realm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RealmPrincipal {
    /// Name of the realm that vouched for this principal.
    pub realm: String,
    /// The identifying value (username, user id, email, ...).
    pub principal: String,
}

/// `PrincipalCollection` is the aggregated identity of one subject.
///
/// Entries are `(realm, principal)` pairs kept in insertion order with
/// duplicates dropped. The primary principal is the first entry unless it is
/// moved to the front with [`PrincipalCollection::set_primary`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalCollection {
    entries: Vec<RealmPrincipal>,
}

impl PrincipalCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection holding one principal from one realm.
    #[must_use]
    pub fn single(realm: impl Into<String>, principal: impl Into<String>) -> Self {
        let mut pc = Self::new();
        pc.add(realm, principal);
        pc
    }

    /// Append a principal. Returns `false` when the exact pair was already present.
    pub fn add(&mut self, realm: impl Into<String>, principal: impl Into<String>) -> bool {
        let entry = RealmPrincipal {
            realm: realm.into(),
            principal: principal.into(),
        };
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Append every entry of `other` that is not present yet.
    pub fn add_all(&mut self, other: &PrincipalCollection) {
        for e in &other.entries {
            self.add(e.realm.clone(), e.principal.clone());
        }
    }

    /// The primary principal (first entry), if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.entries.first().map(|e| e.principal.as_str())
    }

    /// Move an existing entry to the front so it becomes the primary principal.
    ///
    /// Returns `false` if the pair is not part of the collection.
    pub fn set_primary(&mut self, realm: &str, principal: &str) -> bool {
        let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.realm == realm && e.principal == principal)
        else {
            return false;
        };
        let entry = self.entries.remove(idx);
        self.entries.insert(0, entry);
        true
    }

    /// Principals contributed by the named realm, in insertion order.
    #[must_use]
    pub fn from_realm(&self, realm: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.realm == realm)
            .map(|e| e.principal.as_str())
            .collect()
    }

    /// Distinct realm names in order of first appearance.
    #[must_use]
    pub fn realm_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for e in &self.entries {
            if !names.contains(&e.realm.as_str()) {
                names.push(e.realm.as_str());
            }
        }
        names
    }

    #[must_use]
    pub fn contains_realm(&self, realm: &str) -> bool {
        self.entries.iter().any(|e| e.realm == realm)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RealmPrincipal> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for PrincipalCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.entries {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", e.realm, e.principal)?;
            first = false;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PrincipalCollection {
    type Item = &'a RealmPrincipal;
    type IntoIter = std::slice::Iter<'a, RealmPrincipal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn add_deduplicates_exact_pairs() {
        let mut pc = PrincipalCollection::new();
        assert!(pc.add("ldap", "alice"));
        assert!(!pc.add("ldap", "alice"));
        assert!(pc.add("db", "alice"));
        assert_eq!(pc.len(), 2);
    }

    #[test]
    fn primary_is_first_entry_until_reordered() {
        let mut pc = PrincipalCollection::single("ldap", "alice");
        pc.add("db", "42");
        assert_eq!(pc.primary(), Some("alice"));

        assert!(pc.set_primary("db", "42"));
        assert_eq!(pc.primary(), Some("42"));
        assert!(!pc.set_primary("db", "missing"));
    }

    #[test]
    fn from_realm_and_realm_names_keep_order() {
        let mut pc = PrincipalCollection::new();
        pc.add("b", "x");
        pc.add("a", "y");
        pc.add("b", "z");

        assert_eq!(pc.realm_names(), vec!["b", "a"]);
        assert_eq!(pc.from_realm("b"), vec!["x", "z"]);
        assert!(pc.from_realm("c").is_empty());
        assert!(pc.contains_realm("a"));
    }

    #[test]
    fn add_all_merges_without_duplicates() {
        let mut left = PrincipalCollection::single("r1", "alice");
        let mut right = PrincipalCollection::single("r1", "alice");
        right.add("r2", "alice@example.com");

        left.add_all(&right);
        assert_eq!(left.len(), 2);
        assert_eq!(left.to_string(), "r1:alice,r2:alice@example.com");
    }

    #[test]
    fn equal_collections_hash_equally() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(PrincipalCollection::single("r", "a"));
        assert!(set.contains(&PrincipalCollection::single("r", "a")));
    }
}
