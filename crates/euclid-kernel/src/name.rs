//! Variable and declaration names.
//!
//! Names are flat interned strings. Hierarchical declaration names like
//! `Nat.succ` are stored as a single component; the kernel never needs to
//! split them. The hash is computed once at creation and cached so that
//! context lookups and environment maps stay O(1) on the hash path.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An identifier with a cached hash.
#[derive(Clone)]
pub struct Name {
    text: Arc<str>,
    /// Cached hash value, computed at creation time.
    cached_hash: u64,
}

impl Name {
    fn compute_hash(text: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    /// Create a name from a string.
    pub fn new(text: impl AsRef<str>) -> Self {
        let text: Arc<str> = Arc::from(text.as_ref());
        let cached_hash = Self::compute_hash(&text);
        Name { text, cached_hash }
    }

    /// The placeholder name for goal `id` in a partial proof term.
    pub fn meta(id: u64) -> Self {
        Name::new(format!("?g{id}"))
    }

    /// Whether this name is a goal placeholder (`?g<N>`).
    pub fn is_meta(&self) -> bool {
        self.text.starts_with('?')
    }

    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// A variant of this name not present in `avoid`, formed by appending
    /// primes. Used by capture-avoiding substitution: substituting under a
    /// binder `y` that would capture renames the binder to `y'`, `y''`, ...
    pub fn freshen(&self, avoid: &HashSet<Name>) -> Name {
        let mut candidate = self.clone();
        while avoid.contains(&candidate) {
            candidate = Name::new(format!("{}'", candidate.as_str()));
        }
        candidate
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: different hashes mean different names.
        if self.cached_hash != other.cached_hash {
            return false;
        }
        self.text == other.text
    }
}

impl Eq for Name {}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cached_hash.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text.cmp(&other.text)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(s)
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Name::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_and_hash() {
        let a = Name::new("x");
        let b = Name::new("x");
        let c = Name::new("y");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_freshen_appends_primes() {
        let mut avoid = HashSet::new();
        avoid.insert(Name::new("y"));
        assert_eq!(Name::new("y").freshen(&avoid).as_str(), "y'");

        avoid.insert(Name::new("y'"));
        assert_eq!(Name::new("y").freshen(&avoid).as_str(), "y''");

        // Nothing to avoid: unchanged.
        assert_eq!(Name::new("z").freshen(&avoid).as_str(), "z");
    }

    #[test]
    fn test_meta_names() {
        let m = Name::meta(3);
        assert_eq!(m.as_str(), "?g3");
        assert!(m.is_meta());
        assert!(!Name::new("g3").is_meta());
    }
}
