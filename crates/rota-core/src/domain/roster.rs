//! NameRoster: the fixed, ordered candidate list.

use std::collections::HashSet;

use super::errors::ConfigError;
use super::name::Name;

/// Ordered, immutable list of candidate names.
///
/// Duplicate entries are allowed; membership is by value, so a name listed
/// twice is still a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRoster {
    names: Vec<Name>,
}

impl NameRoster {
    /// Build a roster, rejecting an empty list or blank entries.
    pub fn new<I, N>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let names: Vec<Name> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        if let Some(index) = names.iter().position(Name::is_blank) {
            return Err(ConfigError::BlankName { index });
        }
        Ok(Self { names })
    }

    /// Names in configured order, duplicates included.
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    /// Distinct names, keeping the first occurrence's position.
    pub fn distinct(&self) -> Vec<Name> {
        let mut seen = HashSet::new();
        self.names
            .iter()
            .filter(|n| seen.insert(*n))
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
