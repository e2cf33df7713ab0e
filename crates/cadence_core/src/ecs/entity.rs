//! Entity handles and the id allocator
//!
//! Entities are plain 64-bit ids with no payload. Ids are handed out
//! monotonically and never reused, so a handle kept past its entity's
//! destruction can be detected but can never alias a newer entity.

use crate::ecs::{EcsError, EcsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Entity handle (opaque ID)
///
/// Holding an `Entity` implies no ownership. Code that keeps one around
/// (e.g. "follow this target") must check `World::contains` before use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

impl Entity {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Allocates ids and tracks which ones are alive.
pub(crate) struct EntityStore {
    next_id: u64,
    live: BTreeSet<Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            live: BTreeSet::new(),
        }
    }

    pub fn create(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        self.live.insert(entity);
        entity
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    pub fn ensure_live(&self, entity: Entity) -> EcsResult<()> {
        if self.contains(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity { entity })
        }
    }

    /// Forget a live entity. The id is retired for good.
    pub fn release(&mut self, entity: Entity) -> EcsResult<()> {
        if self.live.remove(&entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity { entity })
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Live entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.live.iter().copied()
    }
}
