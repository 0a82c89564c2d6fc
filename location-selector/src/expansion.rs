use std::collections::HashSet;

use relay_list::RelayLocation;

/// The locations currently shown expanded in one tree.
///
/// Membership is independent per location: collapsing a country leaves its
/// cities' entries untouched, so they reappear as they were when the country
/// is expanded again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet(HashSet<RelayLocation>);

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, location: &RelayLocation) -> bool {
        self.0.contains(location)
    }

    /// Flip membership of `location`. Returns the new membership.
    pub fn toggle(&mut self, location: &RelayLocation) -> bool {
        if self.0.remove(location) {
            false
        } else {
            self.0.insert(location.clone());
            true
        }
    }

    pub fn insert(&mut self, location: RelayLocation) -> bool {
        self.0.insert(location)
    }

    /// Swap in a whole new membership, as done when restoring a snapshot.
    pub fn replace(&mut self, other: ExpansionSet) {
        self.0 = other.0;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelayLocation> {
        self.0.iter()
    }

    /// Members in location order.
    pub fn to_sorted_vec(&self) -> Vec<RelayLocation> {
        let mut locations: Vec<_> = self.0.iter().cloned().collect();
        locations.sort();
        locations
    }
}

impl FromIterator<RelayLocation> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = RelayLocation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ExpansionSet {
    type Item = RelayLocation;
    type IntoIter = std::collections::hash_set::IntoIter<RelayLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
