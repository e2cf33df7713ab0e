// aspect.rs - Per-(system, entity) cached views
//
// A system's `AspectCache` holds exactly one `Aspect` per member entity. The
// aspect carries the system's private state for that entity (e.g. a sprite
// handle); component access goes through `AspectRef`/`AspectMut`, which only
// expose the component types the system declared.

use crate::ecs::storage::ComponentStore;
use crate::ecs::{Component, ComponentSet, DirtyLog, EcsError, EcsResult, Entity};
use std::any::Any;
use std::collections::BTreeMap;

/// One member entity plus the system-private state created for it.
#[derive(Debug)]
pub struct Aspect<St> {
    entity: Entity,
    state: St,
}

impl<St> Aspect<St> {
    pub(crate) fn new(entity: Entity, state: St) -> Self {
        Self { entity, state }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn state(&self) -> &St {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut St {
        &mut self.state
    }
}

/// Member entities of one system, in ascending id order.
#[derive(Debug)]
pub struct AspectCache<St> {
    aspects: BTreeMap<Entity, Aspect<St>>,
}

impl<St> AspectCache<St> {
    pub(crate) fn new() -> Self {
        Self {
            aspects: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, aspect: Aspect<St>) {
        self.aspects.insert(aspect.entity, aspect);
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Option<Aspect<St>> {
        self.aspects.remove(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.aspects.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&Aspect<St>> {
        self.aspects.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut Aspect<St>> {
        self.aspects.get_mut(&entity)
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aspect<St>> {
        self.aspects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Aspect<St>> {
        self.aspects.values_mut()
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.aspects.keys().copied().collect()
    }
}

/// Untyped cache access for the registry, which stores caches of many
/// different state types side by side.
pub(crate) trait ErasedCache {
    fn is_member(&self, entity: Entity) -> bool;
    fn members(&self) -> Vec<Entity>;
    fn member_count(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<St: 'static> ErasedCache for AspectCache<St> {
    fn is_member(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn members(&self) -> Vec<Entity> {
        self.entities()
    }

    fn member_count(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn check_declared<T: Component>(required: &ComponentSet, entity: Entity) -> EcsResult<()> {
    if required.contains(T::ID) {
        Ok(())
    } else {
        Err(EcsError::MissingComponent {
            entity,
            component: T::NAME,
        })
    }
}

/// Read-only typed view of one member entity.
pub struct AspectRef<'w, St> {
    aspect: &'w Aspect<St>,
    required: &'w ComponentSet,
    components: &'w ComponentStore,
}

impl<'w, St> AspectRef<'w, St> {
    pub(crate) fn new(
        aspect: &'w Aspect<St>,
        required: &'w ComponentSet,
        components: &'w ComponentStore,
    ) -> Self {
        Self {
            aspect,
            required,
            components,
        }
    }

    pub fn entity(&self) -> Entity {
        self.aspect.entity
    }

    pub fn state(&self) -> &'w St {
        &self.aspect.state
    }

    /// Whether `T` is one of the declared types and currently attached.
    pub fn has<T: Component>(&self) -> bool {
        self.required.contains(T::ID) && self.components.has(self.entity(), T::ID)
    }

    pub fn get<T: Component>(&self) -> EcsResult<&'w T> {
        let entity = self.entity();
        check_declared::<T>(self.required, entity)?;
        self.components
            .get::<T>(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }
}

/// Mutable typed view of one member entity.
///
/// Handed to `on_add`/`on_remove` and returned by `World::aspect_mut`.
/// Mutating a component through `get_mut` does not mark it dirty; call
/// `dirty::<T>()` after an observable change.
pub struct AspectMut<'w, St> {
    aspect: &'w mut Aspect<St>,
    required: &'w ComponentSet,
    components: &'w mut ComponentStore,
    dirty: &'w mut DirtyLog,
}

impl<'w, St> AspectMut<'w, St> {
    pub(crate) fn new(
        aspect: &'w mut Aspect<St>,
        required: &'w ComponentSet,
        components: &'w mut ComponentStore,
        dirty: &'w mut DirtyLog,
    ) -> Self {
        Self {
            aspect,
            required,
            components,
            dirty,
        }
    }

    pub fn entity(&self) -> Entity {
        self.aspect.entity
    }

    pub fn state(&self) -> &St {
        &self.aspect.state
    }

    pub fn state_mut(&mut self) -> &mut St {
        &mut self.aspect.state
    }

    pub fn has<T: Component>(&self) -> bool {
        self.required.contains(T::ID) && self.components.has(self.entity(), T::ID)
    }

    pub fn get<T: Component>(&self) -> EcsResult<&T> {
        let entity = self.entity();
        check_declared::<T>(self.required, entity)?;
        self.components
            .get::<T>(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    pub fn get_mut<T: Component>(&mut self) -> EcsResult<&mut T> {
        let entity = self.entity();
        check_declared::<T>(self.required, entity)?;
        self.components
            .get_mut::<T>(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Record that `T` changed on this entity during the current frame.
    pub fn dirty<T: Component>(&mut self) -> EcsResult<()> {
        let entity = self.entity();
        check_declared::<T>(self.required, entity)?;
        self.dirty.record(T::ID, entity);
        Ok(())
    }
}
