use crate::ecs::{Entity, SystemRegistrationError};
use thiserror::Error;

/// Wiring errors raised by world operations.
///
/// None of these are transient. They are returned to the caller as soon as
/// they happen and the world never retries; a frame that sees one escape a
/// system's update stops there.
#[derive(Debug, Error)]
pub enum EcsError {
    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("no system registered as '{name}'")]
    UnknownSystem { name: String },

    #[error("entity {entity} has already been destroyed")]
    StaleEntity { entity: Entity },

    #[error(transparent)]
    Registration(#[from] SystemRegistrationError),
}

pub type EcsResult<T> = Result<T, EcsError>;
