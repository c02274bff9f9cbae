//! File decoders, keyed by suffix.

use std::fmt;
use std::path::Path;

use super::error::DecodeError;
use super::properties::PropertiesDecoder;
use super::value::{from_toml_table, from_yaml_mapping, Table};
use super::ConfigError;

pub const TOML: &str = "toml";
pub const YAML: &str = "yaml";
pub const YML: &str = "yml";
pub const PROPERTIES: &str = "properties";

/// Every suffix the default registry can decode, in candidate order.
pub const SUPPORTED_CONFIG_TYPES: [&str; 4] = [YAML, YML, TOML, PROPERTIES];

/// Turns the text of one configuration file into a table.
pub trait Decoder: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Suffixes (without the dot) this decoder claims.
    fn suffixes(&self) -> &[&'static str];

    fn decode(&self, contents: &str) -> Result<Table, DecodeError>;

    fn supports(&self, suffix: &str) -> bool {
        self.suffixes().iter().any(|s| s.eq_ignore_ascii_case(suffix))
    }

    /// Reads and decodes the file at `path`.
    fn load(&self, path: &Path) -> Result<Table, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => self.decode(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                format: self.name(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDecoder;

impl Decoder for TomlDecoder {
    fn name(&self) -> &'static str {
        TOML
    }

    fn suffixes(&self) -> &[&'static str] {
        &[TOML]
    }

    fn decode(&self, contents: &str) -> Result<Table, DecodeError> {
        let table: toml::Table = toml::from_str(contents)?;
        Ok(from_toml_table(table))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn name(&self) -> &'static str {
        YAML
    }

    fn suffixes(&self) -> &[&'static str] {
        &[YAML, YML]
    }

    fn decode(&self, contents: &str) -> Result<Table, DecodeError> {
        match serde_yaml::from_str::<serde_yaml::Value>(contents)? {
            serde_yaml::Value::Mapping(mapping) => Ok(from_yaml_mapping(mapping)),
            // an empty document
            serde_yaml::Value::Null => Ok(Table::new()),
            other => {
                Err(format!("expected a mapping at the document root, found {other:?}").into())
            }
        }
    }
}

/// The set of decoders available to a loader. At most one decoder may claim a suffix.
#[derive(Debug)]
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderRegistry {
    /// A registry with no decoders.
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Adds `decoder`, failing if another decoder already claims one of its suffixes.
    pub fn register(&mut self, decoder: impl Decoder + 'static) -> Result<(), ConfigError> {
        if let Some(taken) = decoder
            .suffixes()
            .iter()
            .find(|suffix| self.find(suffix).is_some())
        {
            return Err(ConfigError::DuplicateDecoder((*taken).to_string()));
        }
        self.decoders.push(Box::new(decoder));
        Ok(())
    }

    /// Finds the decoder claiming `suffix`, ignoring case.
    pub fn find(&self, suffix: &str) -> Option<&dyn Decoder> {
        self.decoders
            .iter()
            .find(|d| d.supports(suffix))
            .map(|d| d.as_ref())
    }

    pub fn contains(&self, suffix: &str) -> bool {
        self.find(suffix).is_some()
    }

    pub fn decoders(&self) -> impl Iterator<Item = &dyn Decoder> {
        self.decoders.iter().map(|d| d.as_ref())
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self {
            decoders: vec![
                Box::new(YamlDecoder),
                Box::new(TomlDecoder),
                Box::new(PropertiesDecoder),
            ],
        }
    }
}
