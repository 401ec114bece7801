use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Versions tracked for one variable. `BTreeSet` keeps them unique and in
/// plain string order ("3.10" sorts before "3.9").
pub type VersionSet = BTreeSet<String>;

/// Map a package name to the env var it is tracked under in the matrix.
///
/// `foo-bar` → `_FOO_BAR`, `PyYAML` → `_PYYAML`.
pub fn env_var_name(package: &str) -> String {
    format!("_{}", package.to_uppercase().replace('-', "_"))
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Identity of a group: the set of variable names seen together on a line.
///
/// Order-insensitive, so `A=1 B=2` and `B=3 A=4` land in the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(BTreeSet<String>);

impl GroupKey {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Member names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "({})", names.join(", "))
    }
}

/// Accumulated versions for every variable of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    vars: BTreeMap<String, VersionSet>,
}

impl Group {
    /// Record `value` for `name`. Returns true if the set grew.
    pub fn insert(&mut self, name: &str, value: &str) -> bool {
        self.vars
            .entry(name.to_string())
            .or_default()
            .insert(value.to_string())
    }

    pub fn versions(&self, name: &str) -> Option<&VersionSet> {
        self.vars.get(name)
    }

    /// Variables with their version sets, names in sorted order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &VersionSet)> {
        self.vars.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of lines this group expands to.
    pub fn combinations(&self) -> usize {
        if self.vars.is_empty() {
            return 0;
        }
        self.vars.values().map(BTreeSet::len).product()
    }
}

/// All groups of a parsed matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    groups: BTreeMap<GroupKey, Group>,
}

impl Groups {
    /// Accumulator for `key`, created on first use.
    pub fn entry(&mut self, key: GroupKey) -> &mut Group {
        self.groups.entry(key).or_default()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Group> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &Group)> {
        self.groups.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&GroupKey, &mut Group)> {
        self.groups.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reconciliation result
// ---------------------------------------------------------------------------

/// Why the regenerated matrix differs from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The new version produced additional lines.
    VersionAdded,
    /// Same jobs, but the input was not in canonical order.
    Reordered,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionAdded => write!(f, "version_added"),
            Self::Reordered => write!(f, "reordered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Regenerated matrix is byte-identical to the input.
    Unchanged,
    /// Replace the matrix with `lines`.
    Updated { lines: Vec<String>, change: ChangeKind },
}

impl Outcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Result of reconciling one matrix against one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Env var the package maps to.
    pub variable: String,
    /// False when no group carries `variable`; the release was ignored.
    pub tracked: bool,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_name_normalizes_package() {
        assert_eq!(env_var_name("PyYAML"), "_PYYAML");
        assert_eq!(env_var_name("jinja-ab"), "_JINJA_AB");
        assert_eq!(env_var_name("django-rest-framework"), "_DJANGO_REST_FRAMEWORK");
    }

    #[test]
    fn group_key_ignores_order() {
        assert_eq!(GroupKey::new(["B", "A"]), GroupKey::new(["A", "B"]));
        assert_ne!(GroupKey::new(["A"]), GroupKey::new(["A", "B"]));
        assert_eq!(GroupKey::new(["B", "A"]).to_string(), "(A, B)");
    }

    #[test]
    fn group_counts_combinations() {
        let mut group = Group::default();
        assert_eq!(group.combinations(), 0);
        group.insert("A", "1");
        group.insert("A", "2");
        group.insert("B", "3");
        assert!(!group.insert("B", "3"));
        assert_eq!(group.combinations(), 2);
    }
}
