// world.rs - ECS facade: entities, components, systems and the frame loop
//
// Every mutation point re-evaluates membership synchronously. Joins happen
// after the component lands so `on_add` can read it; leaves happen before
// the component goes away so `on_remove` can read the final value.

use crate::ecs::entity::EntityStore;
use crate::ecs::storage::ComponentStore;
use crate::ecs::system_registry::SystemRegistry;
use crate::ecs::{
    AspectCache, AspectMut, AspectRef, Component, ComponentSet, DirtyLog, EcsError, EcsResult,
    Entity, Frame, System, SystemHandle,
};
use crate::time::{Clock, ClockConfig, SlowMotion};
use cadence_metrics::{Counter, SystemProfiler};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, error, info, trace_span};

/// Summary of one `run_frame` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub index: u64,
    /// Logic delta handed to every system this frame.
    pub granted: Duration,
    pub gametime: Duration,
    pub systems_run: usize,
    /// `dirty` calls drained at the end of the frame.
    pub dirty_records: usize,
}

/// The main ECS world containing all entities, components and systems.
pub struct World {
    entities: EntityStore,
    components: ComponentStore,
    dirty: DirtyLog,
    registry: SystemRegistry,
    clock: Clock,
    counters: Counter,
    profiler: SystemProfiler,
}

impl World {
    /// Create a new empty world with a default clock.
    pub fn new() -> Self {
        Self::with_clock_config(ClockConfig::default())
    }

    pub fn with_clock_config(config: ClockConfig) -> Self {
        Self {
            entities: EntityStore::new(),
            components: ComponentStore::new(),
            dirty: DirtyLog::new(),
            registry: SystemRegistry::new(),
            clock: Clock::with_config(config),
            counters: Counter::new(),
            profiler: SystemProfiler::new(),
        }
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Allocate a fresh entity. Systems with an empty requirement pick it
    /// up immediately.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.create();
        self.components.insert_entity(entity);
        self.counters.increment("entities.created", 1);
        self.refresh_membership(entity);
        entity
    }

    /// Destroy an entity and every component it owns. Each member system
    /// gets `on_remove` in registration order before anything is dropped.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.entities.ensure_live(entity)?;
        self.evict(entity, |_| true);
        self.components.remove_entity(entity);
        self.entities.release(entity)?;
        self.counters.increment("entities.destroyed", 1);
        debug!(%entity, "entity destroyed");
        Ok(())
    }

    /// Whether the entity is still alive. Use before following a stored
    /// reference to another entity.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component. Fails if the entity already owns one of this
    /// type; detach first to replace it.
    pub fn attach<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.entities.ensure_live(entity)?;
        T::ensure_registered();
        self.components.insert(entity, component)?;
        self.counters.increment("components.attached", 1);
        self.refresh_membership(entity);
        Ok(())
    }

    /// Detach and return a component.
    pub fn detach<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        self.entities.ensure_live(entity)?;
        if !self.components.has(entity, T::ID) {
            return Err(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            });
        }
        self.evict(entity, |required| required.contains(T::ID));
        let component = self.components.remove::<T>(entity)?;
        self.counters.increment("components.detached", 1);
        Ok(component)
    }

    /// Detach if present. Never fails, including on destroyed entities.
    /// Returns whether a component was removed.
    pub fn detach_if_exists<T: Component>(&mut self, entity: Entity) -> bool {
        if !self.has::<T>(entity) {
            return false;
        }
        self.detach::<T>(entity).is_ok()
    }

    /// Read view over everything the entity owns.
    pub fn query(&self, entity: Entity) -> EcsResult<ComponentView<'_>> {
        self.entities.ensure_live(entity)?;
        Ok(ComponentView {
            entity,
            components: &self.components,
        })
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.components.has(entity, T::ID)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.entities.ensure_live(entity)?;
        self.components
            .get::<T>(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Number of live `T` instances across all entities.
    pub fn component_count<T: Component>(&self) -> usize {
        self.components.count(T::ID)
    }

    /// Mutable access. Call `mark_dirty` afterwards if the change matters
    /// to watchers, or use `modify`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.entities.ensure_live(entity)?;
        self.components
            .get_mut::<T>(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Lenient lookup for "maybe gone" references.
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.get::<T>(entity)
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    /// Record that `T` changed on `entity` this frame.
    pub fn mark_dirty<T: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        self.entities.ensure_live(entity)?;
        if !self.components.has(entity, T::ID) {
            return Err(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            });
        }
        self.dirty.record(T::ID, entity);
        Ok(())
    }

    /// Mutate a component and mark it dirty.
    pub fn modify<T, R>(&mut self, entity: Entity, f: impl FnOnce(&mut T) -> R) -> EcsResult<R>
    where
        T: Component,
    {
        let result = f(self.get_mut::<T>(entity)?);
        self.dirty.record(T::ID, entity);
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register a system at the end of the update order. Entities that
    /// already match join it right away.
    pub fn register_system<S: System>(&mut self, system: S) -> EcsResult<SystemHandle> {
        let handle = self.registry.register(system)?;
        if let Some(slot) = self.registry.get(handle) {
            debug!(
                system = slot.name(),
                %handle,
                required = %slot.descriptor.required(),
                watches = %slot.descriptor.dirty_components(),
                "system registered"
            );
        }
        let existing: Vec<Entity> = self.entities.iter().collect();
        for entity in existing {
            self.refresh_membership(entity);
        }
        if let Some(slot) = self.registry.get(handle) {
            debug!(
                system = slot.name(),
                members = slot.aspects.member_count(),
                "initial membership seeded"
            );
        }
        Ok(handle)
    }

    /// Resolve a registered system instance by type.
    pub fn system<S: System>(&self) -> EcsResult<&S> {
        let handle = self.handle_of::<S>()?;
        self.registry
            .get(handle)
            .and_then(|slot| slot.system.as_any().downcast_ref::<S>())
            .ok_or_else(unknown_system::<S>)
    }

    pub fn enable_system<S: System>(&mut self) -> EcsResult<()> {
        let handle = self.handle_of::<S>()?;
        self.set_enabled(handle, true);
        Ok(())
    }

    pub fn disable_system<S: System>(&mut self) -> EcsResult<()> {
        let handle = self.handle_of::<S>()?;
        self.set_enabled(handle, false);
        Ok(())
    }

    pub fn is_enabled<S: System>(&self) -> EcsResult<bool> {
        let handle = self.handle_of::<S>()?;
        Ok(self.registry.get(handle).is_some_and(|slot| slot.enabled))
    }

    /// Flip a system by its descriptor name. Returns the new state.
    pub fn toggle_system_by_name(&mut self, name: &str) -> EcsResult<bool> {
        let handle = self.handle_by_name(name)?;
        let enabled = !self.registry.get(handle).is_some_and(|slot| slot.enabled);
        self.set_enabled(handle, enabled);
        Ok(enabled)
    }

    /// Set a system's state by descriptor name.
    pub fn set_system_enabled_by_name(&mut self, name: &str, enabled: bool) -> EcsResult<()> {
        let handle = self.handle_by_name(name)?;
        self.set_enabled(handle, enabled);
        Ok(())
    }

    /// Descriptor names in update order.
    pub fn system_names(&self) -> Vec<&str> {
        self.registry.iter().map(|slot| slot.name()).collect()
    }

    pub fn system_count(&self) -> usize {
        self.registry.len()
    }

    // ------------------------------------------------------------------
    // Aspects
    // ------------------------------------------------------------------

    /// Typed read view of `S`'s aspect for `entity`, if it is a member.
    pub fn aspect<S: System>(&self, entity: Entity) -> Option<AspectRef<'_, S::State>> {
        let slot = self.registry.get(self.registry.handle_of::<S>()?)?;
        let cache = slot
            .aspects
            .as_any()
            .downcast_ref::<AspectCache<S::State>>()?;
        let aspect = cache.get(entity)?;
        Some(AspectRef::new(
            aspect,
            slot.descriptor.required(),
            &self.components,
        ))
    }

    /// Typed mutable view of `S`'s aspect for `entity`, if it is a member.
    pub fn aspect_mut<S: System>(&mut self, entity: Entity) -> Option<AspectMut<'_, S::State>> {
        let handle = self.registry.handle_of::<S>()?;
        let slot = self.registry.get_mut(handle)?;
        let cache = slot
            .aspects
            .as_any_mut()
            .downcast_mut::<AspectCache<S::State>>()?;
        let aspect = cache.get_mut(entity)?;
        Some(AspectMut::new(
            aspect,
            slot.descriptor.required(),
            &mut self.components,
            &mut self.dirty,
        ))
    }

    /// Current members of `S`, ascending ids.
    pub fn aspect_entities<S: System>(&self) -> EcsResult<Vec<Entity>> {
        let handle = self.handle_of::<S>()?;
        Ok(self
            .registry
            .get(handle)
            .map(|slot| slot.aspects.members())
            .unwrap_or_default())
    }

    pub fn is_member<S: System>(&self, entity: Entity) -> bool {
        self.registry
            .handle_of::<S>()
            .and_then(|handle| self.registry.get(handle))
            .is_some_and(|slot| slot.aspects.is_member(entity))
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Run one frame.
    ///
    /// The clock turns `wall_delta` into the granted logic delta, then each
    /// enabled system updates in registration order with a snapshot of its
    /// members and, if it watches anything, the members dirtied so far this
    /// frame. The dirty log is cleared once, after the last system.
    ///
    /// The first error returned by a system aborts the frame and is passed
    /// through unchanged; later systems do not run. The dirty log is still
    /// cleared, so marks never leak into the next frame.
    pub fn run_frame(&mut self, wall_delta: Duration) -> EcsResult<FrameReport> {
        let granted = self.clock.advance(wall_delta);
        let gametime = self.clock.gametime();
        let index = self.clock.frame_count();
        let _frame = trace_span!("frame", index).entered();

        let mut systems_run = 0;
        let mut position = 0;
        while position < self.registry.len() {
            let handle = SystemHandle::new(position as u32);
            position += 1;

            let Some(slot) = self.registry.get(handle) else {
                continue;
            };
            if !slot.enabled {
                continue;
            }
            let system = Rc::clone(&slot.system);
            let name = slot.name().to_string();
            let entities = slot.aspects.members();
            let dirty = slot.descriptor.tracks_dirty().then(|| {
                let aspects = &slot.aspects;
                self.dirty
                    .collect(slot.descriptor.dirty_components(), |e| aspects.is_member(e))
            });

            let frame = Frame::new(granted, gametime, index, &entities, dirty.as_ref());
            let _system = debug_span!("system", name = %name).entered();
            let started = Instant::now();
            let result = system.run(self, &frame);
            self.profiler.record(&name, started.elapsed());

            if let Err(err) = result {
                error!(system = %name, %err, "system update failed, frame aborted");
                self.dirty.clear();
                return Err(err);
            }
            systems_run += 1;
        }

        let dirty_records = self.dirty.records();
        self.dirty.clear();
        if granted.is_zero() && !wall_delta.is_zero() {
            self.counters.increment("frames.skipped", 1);
        }

        Ok(FrameReport {
            index,
            granted,
            gametime,
            systems_run,
            dirty_records,
        })
    }

    /// Reset the world for a scene change: destroy every entity (hooks fire
    /// as usual), drop pending dirty marks, then give every system its
    /// `on_clear`. Systems stay registered and keep their enabled state.
    pub fn clear(&mut self) {
        let entities: Vec<Entity> = self.entities.iter().collect();
        let destroyed = entities.len();
        for entity in entities {
            if let Err(err) = self.destroy_entity(entity) {
                error!(%entity, %err, "failed to destroy entity during clear");
            }
        }
        self.dirty.clear();
        for slot in self.registry.iter() {
            slot.system.clear();
        }
        info!(destroyed, "world cleared");
    }

    // ------------------------------------------------------------------
    // Clock and metrics
    // ------------------------------------------------------------------

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn slow_motion(&self) -> &SlowMotion {
        self.clock.slow_motion()
    }

    pub fn slow_motion_mut(&mut self) -> &mut SlowMotion {
        self.clock.slow_motion_mut()
    }

    /// Total granted logic time.
    pub fn gametime(&self) -> Duration {
        self.clock.gametime()
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    pub fn profiler_mut(&mut self) -> &mut SystemProfiler {
        &mut self.profiler
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn handle_of<S: System>(&self) -> EcsResult<SystemHandle> {
        self.registry
            .handle_of::<S>()
            .ok_or_else(unknown_system::<S>)
    }

    fn handle_by_name(&self, name: &str) -> EcsResult<SystemHandle> {
        self.registry
            .handle_by_name(name)
            .ok_or_else(|| EcsError::UnknownSystem {
                name: name.to_string(),
            })
    }

    fn set_enabled(&mut self, handle: SystemHandle, enabled: bool) {
        let Some(slot) = self.registry.get_mut(handle) else {
            return;
        };
        if slot.enabled == enabled {
            return;
        }
        slot.enabled = enabled;
        if enabled {
            slot.system.enabled(&mut *slot.aspects);
        } else {
            slot.system.disabled(&mut *slot.aspects);
        }
        info!(
            system = slot.name(),
            handle = %slot.handle,
            kind = slot.system.type_name(),
            enabled,
            "system toggled"
        );
    }

    /// Join every system the entity now matches but is not yet a member of.
    fn refresh_membership(&mut self, entity: Entity) {
        let Some(mask) = self.components.mask(entity).cloned() else {
            return;
        };
        for slot in self.registry.iter_mut() {
            if slot.aspects.is_member(entity)
                || !mask.is_superset_of(slot.descriptor.required())
            {
                continue;
            }
            slot.system.join(
                &mut *slot.aspects,
                entity,
                slot.descriptor.required(),
                &mut self.components,
                &mut self.dirty,
            );
            self.counters.increment("aspects.added", 1);
            debug!(system = slot.name(), %entity, "aspect added");
        }
    }

    /// Remove the entity from every member system whose requirement passes
    /// `affected`, firing `on_remove` in registration order.
    fn evict(&mut self, entity: Entity, affected: impl Fn(&ComponentSet) -> bool) {
        for slot in self.registry.iter_mut() {
            if !slot.aspects.is_member(entity) || !affected(slot.descriptor.required()) {
                continue;
            }
            let removed = slot.system.leave(
                &mut *slot.aspects,
                entity,
                slot.descriptor.required(),
                &mut self.components,
                &mut self.dirty,
            );
            if removed {
                self.counters.increment("aspects.removed", 1);
                debug!(system = slot.name(), %entity, "aspect removed");
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_system<S: System>() -> EcsError {
    EcsError::UnknownSystem {
        name: std::any::type_name::<S>().to_string(),
    }
}

/// Read-only view over one entity's components.
pub struct ComponentView<'w> {
    entity: Entity,
    components: &'w ComponentStore,
}

impl<'w> ComponentView<'w> {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn has<T: Component>(&self) -> bool {
        self.components.has(self.entity, T::ID)
    }

    pub fn get<T: Component>(&self) -> EcsResult<&'w T> {
        self.components
            .get::<T>(self.entity)
            .ok_or(EcsError::MissingComponent {
                entity: self.entity,
                component: T::NAME,
            })
    }

    pub fn try_get<T: Component>(&self) -> Option<&'w T> {
        self.components.get::<T>(self.entity)
    }

    /// Ids of every attached component type.
    pub fn component_ids(&self) -> ComponentSet {
        self.components
            .mask(self.entity)
            .cloned()
            .unwrap_or_default()
    }
}
