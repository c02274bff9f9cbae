use std::path::{Path, PathBuf};

use super::file::SUPPORTED_CONFIG_TYPES;
use super::source::PropertySource;
use super::value::Table;
use super::ConfigError;

/// Marker substrings that flag an environment entry as suspicious by default.
pub const DEFAULT_CONFUSED_MARKERS: [&str; 1] = ["::"];

/// How many property-source load failures are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessThreshold {
    /// Failures are skipped; the load always succeeds.
    #[default]
    None,
    /// The load succeeds if at least one source loads.
    Anyone,
    /// The first failure aborts the load.
    All,
}

impl TryFrom<i64> for SuccessThreshold {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Anyone),
            2 => Ok(Self::All),
            other => Err(ConfigError::InvalidThreshold(other)),
        }
    }
}

/// Options for starting an [`Environment`](crate::Environment).
///
/// Every `with_*` call appends, except [`with_properties`](Self::with_properties),
/// [`with_threshold`](Self::with_threshold) and [`with_environ`](Self::with_environ),
/// which replace.
///
/// ## Example
///
/// ```no_run
/// use nemo::{Environment, Options, SuccessThreshold};
///
/// let mut env = Environment::new(Vec::new());
/// env.start(
///     Options::new()
///         .with_search_paths(["resources", "configs"])
///         .with_config_names(["application"])
///         .with_profiles(["dev"])
///         .with_threshold(SuccessThreshold::Anyone),
/// )?;
/// # Ok::<(), nemo::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "options do nothing until passed to Environment::start"]
pub struct Options {
    pub(crate) absolute_paths: Vec<PathBuf>,
    pub(crate) config_names: Vec<String>,
    pub(crate) config_types: Vec<String>,
    pub(crate) search_paths: Vec<PathBuf>,
    pub(crate) profiles: Vec<String>,
    pub(crate) sources: Vec<PropertySource>,
    pub(crate) properties: Table,
    pub(crate) threshold: SuccessThreshold,
    pub(crate) confused_markers: Vec<String>,
    pub(crate) environ: Option<Vec<String>>,
}

impl Options {
    /// Empty options: default names, types and profile, threshold `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute files or directories. Files are loaded directly; directories are searched.
    pub fn with_absolute_paths<P: AsRef<Path>>(
        mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> Self {
        self.absolute_paths
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Candidate base file names tried in each searched directory.
    pub fn with_config_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Candidate suffixes tried for each config name.
    pub fn with_config_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Directories to search, resolved against the working directory when relative.
    pub fn with_search_paths<P: AsRef<Path>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.search_paths
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Active profiles, in ascending precedence. Defaults to `default`.
    pub fn with_profiles<S: Into<String>>(mut self, profiles: impl IntoIterator<Item = S>) -> Self {
        self.profiles.extend(profiles.into_iter().map(Into::into));
        self
    }

    /// Explicit sources, loaded alongside the resolved ones.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = PropertySource>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Inline key/values, loaded at the default priority.
    pub fn with_properties(mut self, properties: Table) -> Self {
        self.properties = properties;
        self
    }

    /// How many load failures are tolerated. Replaces any earlier value.
    pub fn with_threshold(mut self, threshold: SuccessThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Extra substrings that flag an environment entry as confused, on top of `::`.
    pub fn with_confused_markers<S: Into<String>>(
        mut self,
        markers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.confused_markers.extend(markers.into_iter().map(Into::into));
        self
    }

    /// Uses these raw `KEY=VALUE` entries instead of the process environment.
    pub fn with_environ<S: Into<String>>(mut self, entries: impl IntoIterator<Item = S>) -> Self {
        self.environ = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    /// The configured threshold.
    pub fn threshold(&self) -> SuccessThreshold {
        self.threshold
    }

    /// Checks every option before any I/O happens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in &self.absolute_paths {
            if !path.as_os_str().is_empty() && !path.is_absolute() {
                return Err(ConfigError::NotAbsolutePath(path.clone()));
            }
        }

        for config_type in &self.config_types {
            if !SUPPORTED_CONFIG_TYPES.contains(&config_type.as_str()) {
                return Err(ConfigError::UnsupportedConfigType(config_type.clone()));
            }
        }

        for source in &self.sources {
            if source.is_empty_source() {
                return Err(ConfigError::EmptySource);
            }
            if source.as_map().is_some_and(Table::is_empty) {
                return Err(ConfigError::EmptyMapSource(source.property().to_string()));
            }
        }

        Ok(())
    }

    /// All markers in effect: the defaults followed by any registered ones.
    pub(crate) fn markers(&self) -> Vec<&str> {
        DEFAULT_CONFUSED_MARKERS
            .into_iter()
            .chain(self.confused_markers.iter().map(String::as_str))
            .collect()
    }
}
