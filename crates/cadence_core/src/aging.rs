//! Timed destruction
//!
//! Any component that should disappear after a while (a projectile, a
//! temporary shield, a hit flash) carries a [`Timebomb`] and implements
//! [`Aging`]. One [`AgingSystem<T>`] per such type ages every holder by the
//! granted frame delta and, once the timer runs out or the fuse is lit,
//! runs the optional callback and then either detaches the component or
//! destroys the whole entity.

use crate::ecs::{Component, EcsResult, Entity, Frame, System, SystemDescriptor, World};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;

/// Invoked right before the destruct action. The entity is still alive and
/// still owns the expiring component.
pub type ExpireCallback = fn(&mut World, Entity) -> EcsResult<()>;

/// What happens when a timebomb goes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructAction {
    /// Detach only the aging component.
    RemoveComponent,
    /// Destroy the entity that owns it.
    RemoveEntity,
}

/// Countdown policy embedded in an aging component.
#[derive(Debug, Clone)]
pub struct Timebomb {
    duration: Duration,
    elapsed: Duration,
    action: DestructAction,
    fuse: bool,
    on_expire: Option<ExpireCallback>,
}

impl Timebomb {
    pub fn new(duration: Duration, action: DestructAction) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            action,
            fuse: false,
            on_expire: None,
        }
    }

    pub fn remove_component(duration: Duration) -> Self {
        Self::new(duration, DestructAction::RemoveComponent)
    }

    pub fn remove_entity(duration: Duration) -> Self {
        Self::new(duration, DestructAction::RemoveEntity)
    }

    pub fn with_callback(mut self, on_expire: ExpireCallback) -> Self {
        self.on_expire = Some(on_expire);
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }

    pub fn action(&self) -> DestructAction {
        self.action
    }

    /// Fraction of the duration used up, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Request destruction on the next aging update regardless of time left.
    pub fn fuse(&mut self) {
        self.fuse = true;
    }

    pub fn is_fused(&self) -> bool {
        self.fuse
    }

    pub fn is_expired(&self) -> bool {
        self.fuse || self.elapsed >= self.duration
    }

    /// Age by `delta`. Returns whether the bomb should go off now.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(delta);
        self.is_expired()
    }

    /// Start the countdown over and put the fuse out.
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.fuse = false;
    }
}

/// A component with a built-in countdown.
pub trait Aging: Component {
    fn timebomb(&self) -> &Timebomb;
    fn timebomb_mut(&mut self) -> &mut Timebomb;
}

/// Ages every entity owning `T`. Register one per aging component type;
/// the system is named `aging<NAME>`.
pub struct AgingSystem<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Aging> AgingSystem<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn system_name() -> String {
        format!("aging<{}>", T::NAME)
    }
}

impl<T: Aging> Default for AgingSystem<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Aging> System for AgingSystem<T> {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new(Self::system_name()).require::<T>()
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        let mut expired = Vec::new();
        for &entity in frame.entities() {
            let Some(mut aspect) = world.aspect_mut::<Self>(entity) else {
                continue;
            };
            let bomb = aspect.get_mut::<T>()?.timebomb_mut();
            if bomb.tick(frame.delta()) {
                expired.push((entity, bomb.action, bomb.on_expire));
            }
        }

        for (entity, action, on_expire) in expired {
            // An earlier callback may already have taken care of it.
            if !world.has::<T>(entity) {
                continue;
            }
            if let Some(on_expire) = on_expire {
                on_expire(world, entity)?;
            }
            if !world.contains(entity) {
                continue;
            }
            match action {
                DestructAction::RemoveComponent => {
                    world.detach_if_exists::<T>(entity);
                }
                DestructAction::RemoveEntity => world.destroy_entity(entity)?,
            }
            debug!(component = T::NAME, %entity, ?action, "timebomb expired");
        }
        Ok(())
    }
}
