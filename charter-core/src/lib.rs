pub mod availability;
pub mod booking;
pub mod calendar;
pub mod flight;
pub mod inquiry;
pub mod mail;
pub mod notification;
pub mod repository;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("External service error: {0}")]
    External(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
