use super::membership_query::compute_rule_map_query;
use super::{CollectionId, CollectionStore, ExpansionRule, MembershipQuery, compute_membership_query};
use crate::Result;
use crate::expr::PathExpression;
use crate::graph::ObjectGraph;
use crate::path::ObjectPath;
use ohno::bail;
use std::sync::Arc;

/// The authored description of one collection.
///
/// A spec is in relationship mode when it has includes, excludes or an
/// included root, and in expression mode when it instead carries a non-empty
/// membership expression. Editing a spec never updates queries computed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    id: CollectionId,

    /// The authored expansion rule; `None` behaves as [`ExpansionRule::ExpandContainers`].
    pub expansion_rule: Option<ExpansionRule>,
    pub include_root: bool,
    pub includes: Vec<ObjectPath>,
    pub excludes: Vec<ObjectPath>,

    /// Expression text, parsed when the spec is resolved.
    pub membership_expression: Option<String>,
}

impl CollectionSpec {
    /// An empty spec for `id`.
    #[must_use]
    pub const fn new(id: CollectionId) -> Self {
        Self {
            id,
            expansion_rule: None,
            include_root: false,
            includes: Vec::new(),
            excludes: Vec::new(),
            membership_expression: None,
        }
    }

    #[must_use]
    pub const fn with_expansion_rule(mut self, rule: ExpansionRule) -> Self {
        self.expansion_rule = Some(rule);
        self
    }

    #[must_use]
    pub const fn with_include_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }

    #[must_use]
    pub fn with_includes(mut self, includes: impl IntoIterator<Item = ObjectPath>) -> Self {
        self.includes.extend(includes);
        self
    }

    #[must_use]
    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = ObjectPath>) -> Self {
        self.excludes.extend(excludes);
        self
    }

    #[must_use]
    pub fn with_membership_expression(mut self, text: impl Into<String>) -> Self {
        self.membership_expression = Some(text.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> &CollectionId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    #[must_use]
    pub const fn collection_path(&self) -> &ObjectPath {
        self.id.collection_path()
    }

    #[must_use]
    pub fn effective_expansion_rule(&self) -> ExpansionRule {
        self.expansion_rule.unwrap_or_default()
    }

    /// Whether a non-blank membership expression is authored.
    #[must_use]
    pub fn has_membership_expression(&self) -> bool {
        self.membership_expression.as_deref().is_some_and(|text| !text.trim().is_empty())
    }

    #[must_use]
    pub fn is_in_relationships_mode(&self) -> bool {
        self.include_root || !self.includes.is_empty() || !self.excludes.is_empty()
    }

    /// Expression mode applies only when no relationship rules are authored.
    #[must_use]
    pub fn is_in_expression_mode(&self) -> bool {
        !self.is_in_relationships_mode() && self.has_membership_expression()
    }

    /// Whether the spec can include anything at all.
    #[must_use]
    pub fn has_no_included_paths(&self) -> bool {
        !self.include_root && self.includes.is_empty() && !self.has_membership_expression()
    }

    /// Parses the authored expression; an absent expression is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the authored text does not parse.
    pub fn parsed_membership_expression(&self) -> Result<PathExpression> {
        self.membership_expression.as_deref().map_or(Ok(PathExpression::Nothing), PathExpression::parse)
    }

    /// Computes the membership query of this spec against `stage`.
    #[must_use]
    pub fn compute_membership_query<S>(&self, stage: &Arc<S>) -> MembershipQuery
    where
        S: ObjectGraph + CollectionStore + 'static,
    {
        compute_membership_query(self, stage)
    }

    /// Makes `path` a member, adjusting includes and excludes as little as possible.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is relative or the spec is in expression mode.
    pub fn include_path<C: CollectionStore + ?Sized>(&mut self, path: &ObjectPath, store: &C) -> Result<()> {
        self.check_editable(path)?;

        if compute_rule_map_query(self, store).is_included(path)? {
            return Ok(());
        }

        if path.is_root() {
            self.include_root = true;
            return Ok(());
        }

        if let Some(index) = self.excludes.iter().position(|exclude| exclude == path) {
            let _ = self.excludes.remove(index);
            if compute_rule_map_query(self, store).is_included(path)? {
                return Ok(());
            }
        }

        self.includes.push(path.clone());
        Ok(())
    }

    /// Removes `path` from the members, adjusting includes and excludes as little as possible.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is relative or the spec is in expression mode.
    pub fn exclude_path<C: CollectionStore + ?Sized>(&mut self, path: &ObjectPath, store: &C) -> Result<()> {
        self.check_editable(path)?;

        if !compute_rule_map_query(self, store).is_included(path)? {
            return Ok(());
        }

        if path.is_root() {
            self.include_root = false;
            return Ok(());
        }

        if let Some(index) = self.includes.iter().position(|include| include == path) {
            let _ = self.includes.remove(index);
            if !compute_rule_map_query(self, store).is_included(path)? {
                return Ok(());
            }
        }

        self.excludes.push(path.clone());
        Ok(())
    }

    fn check_editable(&self, path: &ObjectPath) -> Result<()> {
        if !path.is_absolute() {
            bail!("cannot edit collection '{}' with relative path '{path}'", self.id);
        }

        if self.is_in_expression_mode() {
            bail!("cannot edit includes or excludes of collection '{}' while it uses a membership expression", self.id);
        }

        Ok(())
    }
}
