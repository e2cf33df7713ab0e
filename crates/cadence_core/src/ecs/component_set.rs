// component_set.rs - Sorted component id sets
//
// Used both for an entity's owned components and for a system's required
// conjunction. Ids are kept sorted so subset checks are a single merge walk.

use crate::ecs::{name_of, ComponentId};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentSet {
    ids: Vec<ComponentId>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary ids. The input is sorted and deduplicated.
    pub fn from_ids(mut ids: Vec<ComponentId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: ComponentId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, id);
                true
            }
        }
    }

    /// Returns false if the id was absent.
    pub fn remove(&mut self, id: ComponentId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(pos) => {
                self.ids.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// True if every id in `other` is in `self`. Every set is a superset
    /// of the empty set.
    pub fn is_superset_of(&self, other: &ComponentSet) -> bool {
        let mut mine = self.ids.iter();
        'outer: for wanted in &other.ids {
            for have in mine.by_ref() {
                if have == wanted {
                    continue 'outer;
                }
                if have > wanted {
                    return false;
                }
            }
            return false;
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[ComponentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ComponentId> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self::from_ids(iter.into_iter().collect())
    }
}

impl fmt::Display for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&name_of(*id))?;
        }
        f.write_str("}")
    }
}
