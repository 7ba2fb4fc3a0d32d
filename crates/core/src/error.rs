use crate::types::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A lifecycle command was issued against a job in a state that does
    /// not accept it (e.g. retrying a job that has not failed).
    #[error("Cannot {action} a job in '{status}' state")]
    InvalidTransition {
        action: &'static str,
        status: &'static str,
    },
}
