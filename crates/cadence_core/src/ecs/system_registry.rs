use crate::ecs::aspect::ErasedCache;
use crate::ecs::system::ErasedSystem;
use crate::ecs::{System, SystemDescriptor, SystemHandle, SystemRegistrationError};
use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

/// Systems in registration order, with their aspect caches.
pub(crate) struct SystemRegistry {
    systems: Vec<RegisteredSystem>,
    name_lookup: HashMap<String, SystemHandle>,
    type_lookup: HashMap<TypeId, SystemHandle>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            name_lookup: HashMap::new(),
            type_lookup: HashMap::new(),
        }
    }

    pub fn register<S: System>(
        &mut self,
        system: S,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        let descriptor = system.descriptor();
        let name_key = descriptor.name().to_string();

        if let Some(existing) = self.type_lookup.get(&TypeId::of::<S>()) {
            let existing = self
                .get(*existing)
                .map(|sys| sys.descriptor.name().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            return Err(SystemRegistrationError::DuplicateType {
                type_name: std::any::type_name::<S>(),
                existing,
            });
        }

        if self.name_lookup.contains_key(&name_key) {
            return Err(SystemRegistrationError::DuplicateName { name: name_key });
        }

        if let Some(component) = descriptor.unrequired_dirty() {
            return Err(SystemRegistrationError::DirtyNotRequired {
                name: name_key,
                component,
            });
        }

        let handle = SystemHandle::new(self.systems.len() as u32);
        let system: Rc<dyn ErasedSystem> = Rc::new(system);
        let aspects = system.new_cache();

        self.name_lookup.insert(name_key, handle);
        self.type_lookup.insert(TypeId::of::<S>(), handle);
        self.systems.push(RegisteredSystem {
            handle,
            descriptor,
            enabled: true,
            system,
            aspects,
        });

        Ok(handle)
    }

    pub fn handle_of<S: System>(&self) -> Option<SystemHandle> {
        self.type_lookup.get(&TypeId::of::<S>()).copied()
    }

    pub fn handle_by_name(&self, name: &str) -> Option<SystemHandle> {
        self.name_lookup.get(name).copied()
    }

    pub fn get(&self, handle: SystemHandle) -> Option<&RegisteredSystem> {
        self.systems.get(handle.index() as usize)
    }

    pub fn get_mut(&mut self, handle: SystemHandle) -> Option<&mut RegisteredSystem> {
        self.systems.get_mut(handle.index() as usize)
    }

    /// Registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSystem> {
        self.systems.iter()
    }

    /// Registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegisteredSystem> {
        self.systems.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }
}

pub(crate) struct RegisteredSystem {
    pub handle: SystemHandle,
    pub descriptor: SystemDescriptor,
    pub enabled: bool,
    pub system: Rc<dyn ErasedSystem>,
    pub aspects: Box<dyn ErasedCache>,
}

impl RegisteredSystem {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}
