// dirty.rs - Per-frame change log
//
// Append-only within a frame, cleared once by the world after the last
// system's update. Systems never see the raw log; they get a `DirtySet`
// filtered down to their own members and declared component types.

use crate::ecs::{ComponentId, ComponentSet, Entity};
use std::collections::{BTreeSet, HashMap};

pub(crate) struct DirtyLog {
    marks: HashMap<ComponentId, BTreeSet<Entity>>,
    records: usize,
}

impl DirtyLog {
    pub fn new() -> Self {
        Self {
            marks: HashMap::new(),
            records: 0,
        }
    }

    pub fn record(&mut self, component: ComponentId, entity: Entity) {
        self.marks.entry(component).or_default().insert(entity);
        self.records += 1;
    }

    /// Entities touched for any of `components` that also pass `is_member`.
    pub fn collect(
        &self,
        components: &ComponentSet,
        is_member: impl Fn(Entity) -> bool,
    ) -> DirtySet {
        let mut entities = BTreeSet::new();
        for id in components.iter() {
            if let Some(marked) = self.marks.get(&id) {
                entities.extend(marked.iter().copied().filter(|e| is_member(*e)));
            }
        }
        DirtySet { entities }
    }

    /// Number of `record` calls since the last clear, duplicates included.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.records = 0;
    }
}

/// Entities whose watched components changed this frame, for one system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    entities: BTreeSet<Entity>,
}

impl DirtySet {
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
