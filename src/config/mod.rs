//! Property sources, their resolution from options, and loading into the nested store.

mod builder;
mod env;
mod error;
mod file;
mod loader;
mod properties;
mod resolve;
mod source;
mod store;
mod value;

pub use builder::{Options, SuccessThreshold, DEFAULT_CONFUSED_MARKERS};
pub use env::{environment_source, process_environ, ENVIRONMENT_SOURCE_NAME};
pub use error::{ConfigError, DecodeError};
pub use file::{
    Decoder, DecoderRegistry, TomlDecoder, YamlDecoder, PROPERTIES, SUPPORTED_CONFIG_TYPES, TOML,
    YAML, YML,
};
pub use loader::{LoadReport, Loader};
pub use properties::PropertiesDecoder;
pub use resolve::{
    Resolution, SourceResolver, DEFAULT_CONFIG_NAMES, DEFAULT_PROFILE, PROPERTIES_SOURCE_NAME,
};
pub use source::{
    sort_by_priority, FileRef, PropertySource, SourceKind, ABSOLUTE_FILE_PRIORITY,
    ABSOLUTE_PATH_PRIORITY, DEFAULT_PRIORITY, DEFAULT_STEP, ENVIRONMENT_PRIORITY,
    HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE, MAX_PROFILE_OFFSET, PROFILE_STEP,
    SEARCH_PATH_FILE_PRIORITY, SEARCH_PATH_PRIORITY,
};
pub use store::{deep_merge, NestedStore, PATH_SEPARATOR};
pub use value::{Table, Value};
