//! Layered configuration: ranked property sources (maps, TOML/YAML/properties files and
//! the process environment) merged into one nested key space, queried by dotted path
//! and bound onto typed structures.

pub mod binder;
pub mod config;
mod environment;
mod error;
pub mod event;

pub use binder::{Bind, BindError, BindField, Binder, FromValue};
pub use config::{
    ConfigError, FileRef, LoadReport, NestedStore, Options, PropertySource, SuccessThreshold,
    Table, Value,
};
pub use environment::{profiles, Environment, EnvironmentBuilder};
pub use error::Error;
pub use event::{Event, EventBus, EventError};
