use crate::binder::BindError;
use crate::config::ConfigError;
use crate::event::EventError;
use thiserror::Error;

/// Top-level error type for the nemo library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("binding error: {0}")]
    Bind(#[from] BindError),

    #[error("event error: {0}")]
    Event(#[from] EventError),
}
