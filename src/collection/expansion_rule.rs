use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How an include entry covers the objects beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ExpansionRule {
    /// Only the exact included paths.
    ExplicitOnly,

    /// The included paths and every container beneath them.
    #[default]
    ExpandContainers,

    /// The included paths, every container beneath them, and all of their properties.
    ExpandContainersAndProperties,
}

impl ExpansionRule {
    #[must_use]
    pub const fn expands_containers(self) -> bool {
        !matches!(self, Self::ExplicitOnly)
    }

    #[must_use]
    pub const fn expands_properties(self) -> bool {
        matches!(self, Self::ExpandContainersAndProperties)
    }
}
