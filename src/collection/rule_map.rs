use super::ExpansionRule;
use crate::path::ObjectPath;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// The flattened rule recorded for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipRule {
    Include(ExpansionRule),
    Exclude,
}

impl MembershipRule {
    #[must_use]
    pub const fn is_include(self) -> bool {
        matches!(self, Self::Include(_))
    }

    /// Whether this entry also covers the containers beneath its path.
    #[must_use]
    pub const fn is_expanding_include(self) -> bool {
        match self {
            Self::Include(rule) => rule.expands_containers(),
            Self::Exclude => false,
        }
    }
}

/// At most one [`MembershipRule`] per path, ordered by path.
///
/// Membership of a path is decided by the nearest entry found walking from the
/// path up to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FlattenedRuleMap {
    entries: BTreeMap<ObjectPath, MembershipRule>,
}

impl FlattenedRuleMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `rule` for `path`, replacing whatever was there.
    pub fn insert(&mut self, path: ObjectPath, rule: MembershipRule) {
        let _ = self.entries.insert(path, rule);
    }

    /// Copies every entry of `other` over this map; on conflicts `other` wins.
    pub fn merge_from(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    pub fn get(&self, path: &ObjectPath) -> Option<MembershipRule> {
        self.entries.get(path).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectPath, MembershipRule)> {
        self.entries.iter().map(|(path, rule)| (path, *rule))
    }

    /// The entry at `path` or its nearest ancestor.
    #[must_use]
    pub fn governing_entry(&self, path: &ObjectPath) -> Option<(&ObjectPath, MembershipRule)> {
        path.ancestors_inclusive()
            .find_map(|ancestor| self.entries.get_key_value(&ancestor).map(|(p, rule)| (p, *rule)))
    }

    /// Whether any entry lives strictly beneath `path`.
    #[must_use]
    pub fn has_entries_below(&self, path: &ObjectPath) -> bool {
        use core::ops::Bound::{Excluded, Unbounded};

        self.entries
            .range((Excluded(path), Unbounded))
            .take_while(|(candidate, _)| candidate.as_str().starts_with(path.as_str()))
            .any(|(candidate, _)| candidate.has_prefix(path))
    }

    /// Evaluates membership of an absolute path.
    ///
    /// Without a governing entry only the root can be a member, and only when
    /// `include_root` is set.
    #[must_use]
    pub fn includes(&self, path: &ObjectPath, include_root: bool) -> bool {
        let Some((entry_path, rule)) = self.governing_entry(path) else {
            return include_root && path.is_root();
        };

        match rule {
            MembershipRule::Exclude => false,
            MembershipRule::Include(_) if entry_path == path => true,
            MembershipRule::Include(ExpansionRule::ExplicitOnly) => false,
            MembershipRule::Include(ExpansionRule::ExpandContainers) => !path.is_property(),
            MembershipRule::Include(ExpansionRule::ExpandContainersAndProperties) => true,
        }
    }
}

impl<'a> IntoIterator for &'a FlattenedRuleMap {
    type Item = (&'a ObjectPath, &'a MembershipRule);
    type IntoIter = btree_map::Iter<'a, ObjectPath, MembershipRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(ObjectPath, MembershipRule)> for FlattenedRuleMap {
    fn from_iter<T: IntoIterator<Item = (ObjectPath, MembershipRule)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
