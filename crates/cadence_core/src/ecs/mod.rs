//! Entity Component System core types.
//!
//! Entities are bare ids. Components live in per-type columns keyed by
//! entity. Systems declare the component types they require; the world
//! keeps one aspect per (system, matching entity) up to date on every
//! attach, detach and destroy, and fires the system's `on_add`/`on_remove`
//! hooks synchronously. A per-frame dirty log lets systems react only to
//! entities whose watched components changed.

mod aspect;
mod component;
mod component_set;
mod dirty;
mod entity;
mod error;
mod storage;
mod system;
mod system_descriptor;
mod system_handle;
mod system_registration_error;
mod system_registry;
mod world;

#[cfg(test)]
mod tests;

pub use aspect::{Aspect, AspectCache, AspectMut, AspectRef};
pub use component::{meta_of, name_of, register_component, Component, ComponentId, ComponentMeta};
pub use component_set::ComponentSet;
pub(crate) use dirty::DirtyLog;
pub use dirty::DirtySet;
pub use entity::Entity;
pub use error::{EcsError, EcsResult};
pub use system::{Frame, System};
pub use system_descriptor::SystemDescriptor;
pub use system_handle::SystemHandle;
pub use system_registration_error::SystemRegistrationError;
pub use world::{ComponentView, FrameReport, World};

/// Create an entity and attach every listed component.
///
/// Evaluates to `EcsResult<Entity>`. If any attach fails the entity is
/// destroyed again and the error is returned.
///
/// ```ignore
/// let player = spawn!(world, Position(Vec2::ZERO), Health::new(100))?;
/// ```
#[macro_export]
macro_rules! spawn {
    ($world:expr $(, $component:expr)* $(,)?) => {{
        let entity = $world.create_entity();
        let attached = (|| -> $crate::ecs::EcsResult<()> {
            $( $world.attach(entity, $component)?; )*
            Ok(())
        })();
        match attached {
            Ok(()) => Ok(entity),
            Err(err) => {
                let _ = $world.destroy_entity(entity);
                Err(err)
            }
        }
    }};
}
