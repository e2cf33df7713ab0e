use crate::ecs::ComponentId;
use thiserror::Error;

/// Errors that can occur while registering a system with the world.
#[derive(Debug, Error)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("system type {type_name} is already registered as '{existing}'")]
    DuplicateType {
        type_name: &'static str,
        existing: String,
    },

    #[error("system '{name}' watches component {component} for changes without requiring it")]
    DirtyNotRequired { name: String, component: ComponentId },
}
