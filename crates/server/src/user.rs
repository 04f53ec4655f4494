//! Users table access for the auth middleware.
//!
//! The engine owns the entity; the server only reads it to resolve the
//! authenticated caller and their role.

pub use engine::users::{Column, Entity, Model};

use engine::users::UserRole;

use crate::ServerError;

/// Maps the stored role string to an engine actor for `user`.
pub fn actor_for(user: &Model) -> Result<engine::Actor, ServerError> {
    let role = UserRole::try_from(user.role.as_str()).map_err(ServerError::Engine)?;
    Ok(match role {
        UserRole::Client => engine::Actor::Client(user.id.clone()),
        UserRole::Reader => engine::Actor::Reader(user.id.clone()),
        UserRole::Admin => engine::Actor::Admin(user.id.clone()),
    })
}
