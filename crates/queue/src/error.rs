//! Typed error type for the queue crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("automation '{0}' is not scheduled")]
    NotScheduled(uuid::Uuid),

    #[error("cron schedule has no future fire time")]
    NoUpcomingFire,
}
