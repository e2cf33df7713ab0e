// storage.rs - Per-type component columns
//
// Each component type gets its own typed column keyed by entity. Every live
// entity also has a `ComponentSet` mask so membership checks never touch
// the columns themselves.

use crate::ecs::{Component, ComponentId, ComponentSet, EcsError, EcsResult, Entity};
use std::any::Any;
use std::collections::HashMap;

/// Type-erased view of a column so the store can drop rows by id alone.
trait ErasedColumn {
    fn remove_row(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Column<T> {
    rows: HashMap<Entity, T>,
}

impl<T: 'static> ErasedColumn for Column<T> {
    fn remove_row(&mut self, entity: Entity) -> bool {
        self.rows.remove(&entity).is_some()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every attached component instance.
///
/// The store knows nothing about systems. The world sequences hook calls
/// around these primitives so `on_remove` still sees the payload.
pub(crate) struct ComponentStore {
    columns: HashMap<ComponentId, Box<dyn ErasedColumn>>,
    masks: HashMap<Entity, ComponentSet>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
            masks: HashMap::new(),
        }
    }

    /// Start tracking a freshly created entity with no components.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.masks.entry(entity).or_default();
    }

    pub fn mask(&self, entity: Entity) -> Option<&ComponentSet> {
        self.masks.get(&entity)
    }

    pub fn has(&self, entity: Entity, id: ComponentId) -> bool {
        self.masks
            .get(&entity)
            .is_some_and(|mask| mask.contains(id))
    }

    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<()> {
        if self.has(entity, T::ID) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: T::NAME,
            });
        }
        let column = self
            .columns
            .entry(T::ID)
            .or_insert_with(|| {
                Box::new(Column::<T> {
                    rows: HashMap::new(),
                })
            })
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .unwrap_or_else(|| {
                panic!(
                    "component id {} is shared by {} and another type",
                    T::ID,
                    T::NAME
                )
            });
        column.rows.insert(entity, value);
        self.masks.entry(entity).or_default().insert(T::ID);
        Ok(())
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        let missing = EcsError::MissingComponent {
            entity,
            component: T::NAME,
        };
        let value = self
            .column_mut::<T>()
            .and_then(|column| column.rows.remove(&entity))
            .ok_or(missing)?;
        if let Some(mask) = self.masks.get_mut(&entity) {
            mask.remove(T::ID);
        }
        Ok(value)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.column::<T>()?.rows.get(&entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.column_mut::<T>()?.rows.get_mut(&entity)
    }

    /// Drop every component the entity owns and stop tracking it.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<ComponentSet> {
        let mask = self.masks.remove(&entity)?;
        for id in mask.iter() {
            if let Some(column) = self.columns.get_mut(&id) {
                column.remove_row(entity);
            }
        }
        Some(mask)
    }

    /// Number of stored instances of one component type.
    pub fn count(&self, id: ComponentId) -> usize {
        self.columns.get(&id).map_or(0, |column| column.len())
    }

    fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns.get(&T::ID)?.as_any().downcast_ref::<Column<T>>()
    }

    fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&T::ID)?
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }
}
