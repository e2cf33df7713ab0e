use crate::ecs::{Component, ComponentId, ComponentSet};

/// What a system wants from the world: a name, the component conjunction an
/// entity must own to be a member, and the subset whose changes it wants
/// reported each frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemDescriptor {
    name: String,
    required: ComponentSet,
    dirty: ComponentSet,
}

impl SystemDescriptor {
    /// Create a new descriptor with the provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: ComponentSet::new(),
            dirty: ComponentSet::new(),
        }
    }

    /// Replace the required component set.
    pub fn requires<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentId>,
    {
        self.required = components.into_iter().collect();
        self
    }

    /// Replace the watched (dirty-tracked) component set.
    pub fn watches<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentId>,
    {
        self.dirty = components.into_iter().collect();
        self
    }

    /// Require one component type.
    pub fn require<T: Component>(mut self) -> Self {
        T::ensure_registered();
        self.required.insert(T::ID);
        self
    }

    /// Require one component type and report its changes.
    pub fn watch<T: Component>(mut self) -> Self {
        T::ensure_registered();
        self.required.insert(T::ID);
        self.dirty.insert(T::ID);
        self
    }

    /// Unique system name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components an entity must own to be a member.
    pub fn required(&self) -> &ComponentSet {
        &self.required
    }

    /// Components whose changes are reported to `update`.
    pub fn dirty_components(&self) -> &ComponentSet {
        &self.dirty
    }

    /// Whether the system asked for change reports at all.
    pub fn tracks_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// First watched component that is not also required.
    pub(crate) fn unrequired_dirty(&self) -> Option<ComponentId> {
        self.dirty.iter().find(|id| !self.required.contains(*id))
    }
}
