// component.rs - Compile-time component identity
//
// Components are identified by u32 IDs fixed on the type, not by TypeId or
// by name. The registry only keeps names around for diagnostics.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

pub type ComponentId = u32;

/// Diagnostic metadata for a registered component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    pub id: ComponentId,
    pub name: &'static str,
}

/// Global id -> name registry.
static REGISTRY: Lazy<RwLock<HashMap<ComponentId, ComponentMeta>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a component's metadata.
///
/// Re-registering the same id under a different name is a wiring bug and
/// panics: two types sharing an id would silently shadow each other.
pub fn register_component(meta: ComponentMeta) {
    if meta_of(meta.id).as_ref() == Some(&meta) {
        return;
    }
    let mut map = REGISTRY.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(prev) = map.insert(meta.id, meta.clone()) {
        assert_eq!(
            prev.name, meta.name,
            "component id {} registered as both {} and {}",
            meta.id, prev.name, meta.name
        );
    }
}

/// Look up component metadata by ID.
pub fn meta_of(id: ComponentId) -> Option<ComponentMeta> {
    REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&id)
        .cloned()
}

/// Registered name for an id, or a placeholder.
pub fn name_of(id: ComponentId) -> String {
    meta_of(id)
        .map(|meta| meta.name.to_string())
        .unwrap_or_else(|| format!("component#{id}"))
}

/// Trait for component types.
///
/// At most one instance of a given component type is attached to an
/// entity at any time. Mutators report changes with `World::mark_dirty`
/// or `AspectMut::dirty`.
pub trait Component: 'static + Sized {
    /// Globally unique component ID.
    const ID: ComponentId;

    /// Human-readable name for debugging.
    const NAME: &'static str;

    /// Register this component's name with the global registry.
    /// The world calls this on first attach.
    fn ensure_registered() {
        register_component(ComponentMeta {
            id: Self::ID,
            name: Self::NAME,
        });
    }
}

/// Helper macro to implement Component trait.
///
/// # Example
/// ```ignore
/// struct Health(i32);
///
/// define_component!(Health, 1, "Health");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentId = $id;
            const NAME: &'static str = $name;
        }
    };
}
