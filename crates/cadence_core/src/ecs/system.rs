// system.rs - The system authoring contract
//
// Every method takes `&self`. A system's own `on_add`/`on_remove` can then
// fire synchronously while its `update` is still on the stack mutating the
// world. Keep per-entity state in `Self::State` and anything system-wide in
// `Cell`/`RefCell` fields.

use crate::ecs::aspect::ErasedCache;
use crate::ecs::storage::ComponentStore;
use crate::ecs::{
    Aspect, AspectCache, AspectMut, ComponentSet, DirtyLog, DirtySet, EcsResult, Entity,
    SystemDescriptor, World,
};
use std::any::Any;
use std::time::Duration;

/// Logic that runs once per frame over every entity owning all of the
/// descriptor's required components.
///
/// # Example
/// ```ignore
/// struct Movement;
///
/// impl System for Movement {
///     type State = ();
///
///     fn descriptor(&self) -> SystemDescriptor {
///         SystemDescriptor::new("movement")
///             .require::<Velocity>()
///             .watch::<Position>()
///     }
///
///     fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
///         for &entity in frame.entities() {
///             let Some(mut aspect) = world.aspect_mut::<Self>(entity) else { continue };
///             let velocity = aspect.get::<Velocity>()?.0;
///             aspect.get_mut::<Position>()?.0 += velocity * frame.delta_secs();
///             aspect.dirty::<Position>()?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait System: Any {
    /// Private per-entity state, created when an entity starts matching and
    /// dropped when it stops.
    type State: Default + 'static;

    fn descriptor(&self) -> SystemDescriptor;

    /// Aspect factory. Runs right before `on_add`.
    fn make_aspect(&self, _entity: Entity) -> Self::State {
        Self::State::default()
    }

    /// The entity just started matching.
    fn on_add(&self, _aspect: &mut AspectMut<'_, Self::State>) {}

    /// The entity is about to stop matching. Its components are still
    /// attached, so final values can be read here.
    fn on_remove(&self, _aspect: &mut AspectMut<'_, Self::State>) {}

    /// The system was re-enabled. Membership was tracked while disabled.
    fn on_enabled(&self, _aspects: &mut AspectCache<Self::State>) {}

    /// The system was disabled. Hide, don't free: members stay cached.
    fn on_disabled(&self, _aspects: &mut AspectCache<Self::State>) {}

    /// The world was reset. Runs after every entity has been destroyed.
    fn on_clear(&self) {}

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()>;
}

/// Per-update input handed to a system.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    delta: Duration,
    gametime: Duration,
    index: u64,
    entities: &'a [Entity],
    dirty: Option<&'a DirtySet>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(
        delta: Duration,
        gametime: Duration,
        index: u64,
        entities: &'a [Entity],
        dirty: Option<&'a DirtySet>,
    ) -> Self {
        Self {
            delta,
            gametime,
            index,
            entities,
            dirty,
        }
    }

    /// Logic time granted to this frame. Zero on skipped or paused frames.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Game time after this frame's delta was applied.
    pub fn gametime(&self) -> Duration {
        self.gametime
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Members at the moment the update started, ascending ids. An entity
    /// in this list may have been removed by the time it is visited;
    /// `World::aspect_mut` then returns `None`.
    pub fn entities(&self) -> &'a [Entity] {
        self.entities
    }

    /// Members whose watched components changed this frame. `None` when the
    /// system watches nothing.
    pub fn dirty(&self) -> Option<&'a DirtySet> {
        self.dirty
    }

    pub fn is_dirty(&self, entity: Entity) -> bool {
        self.dirty.is_some_and(|set| set.contains(entity))
    }
}

/// Object-safe face of `System` used by the registry.
pub(crate) trait ErasedSystem {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
    fn new_cache(&self) -> Box<dyn ErasedCache>;
    fn join(
        &self,
        cache: &mut dyn ErasedCache,
        entity: Entity,
        required: &ComponentSet,
        components: &mut ComponentStore,
        dirty: &mut DirtyLog,
    );
    fn leave(
        &self,
        cache: &mut dyn ErasedCache,
        entity: Entity,
        required: &ComponentSet,
        components: &mut ComponentStore,
        dirty: &mut DirtyLog,
    ) -> bool;
    fn enabled(&self, cache: &mut dyn ErasedCache);
    fn disabled(&self, cache: &mut dyn ErasedCache);
    fn clear(&self);
    fn run(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()>;
}

pub(crate) fn typed_cache<St: 'static>(cache: &mut dyn ErasedCache) -> &mut AspectCache<St> {
    cache
        .as_any_mut()
        .downcast_mut::<AspectCache<St>>()
        .expect("aspect cache was created by the same system")
}

impl<S: System> ErasedSystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<S>()
    }

    fn new_cache(&self) -> Box<dyn ErasedCache> {
        Box::new(AspectCache::<S::State>::new())
    }

    fn join(
        &self,
        cache: &mut dyn ErasedCache,
        entity: Entity,
        required: &ComponentSet,
        components: &mut ComponentStore,
        dirty: &mut DirtyLog,
    ) {
        let mut aspect = Aspect::new(entity, self.make_aspect(entity));
        self.on_add(&mut AspectMut::new(&mut aspect, required, components, dirty));
        typed_cache::<S::State>(cache).insert(aspect);
    }

    fn leave(
        &self,
        cache: &mut dyn ErasedCache,
        entity: Entity,
        required: &ComponentSet,
        components: &mut ComponentStore,
        dirty: &mut DirtyLog,
    ) -> bool {
        let Some(mut aspect) = typed_cache::<S::State>(cache).remove(entity) else {
            return false;
        };
        self.on_remove(&mut AspectMut::new(&mut aspect, required, components, dirty));
        true
    }

    fn enabled(&self, cache: &mut dyn ErasedCache) {
        self.on_enabled(typed_cache::<S::State>(cache));
    }

    fn disabled(&self, cache: &mut dyn ErasedCache) {
        self.on_disabled(typed_cache::<S::State>(cache));
    }

    fn clear(&self) {
        self.on_clear();
    }

    fn run(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        self.update(world, frame)
    }
}
