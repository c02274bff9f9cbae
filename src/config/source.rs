//! Ranked, named units of configuration.

use std::path::{Path, PathBuf};

use super::value::Table;

/// Distance between neighbouring priority bands.
pub const DEFAULT_STEP: i64 = 100;

/// Sorts first, so everything loaded later overrides it.
pub const LOWEST_PRECEDENCE: i64 = i64::MIN;
/// Sorts last, so it overrides everything loaded before it.
pub const HIGHEST_PRECEDENCE: i64 = i64::MAX;

/// Inline properties and caller-built map sources.
pub const DEFAULT_PRIORITY: i64 = 0;
pub const SEARCH_PATH_PRIORITY: i64 = 10 * DEFAULT_STEP;
/// Literal files found while expanding a search path.
pub const SEARCH_PATH_FILE_PRIORITY: i64 = 15 * DEFAULT_STEP;
pub const ABSOLUTE_PATH_PRIORITY: i64 = 20 * DEFAULT_STEP;
/// Direct file references, ranked ahead of any directory candidate.
pub const ABSOLUTE_FILE_PRIORITY: i64 = 30 * DEFAULT_STEP;
pub const ENVIRONMENT_PRIORITY: i64 = HIGHEST_PRECEDENCE;

/// Offset added per active profile to profile-qualified candidates.
pub const PROFILE_STEP: i64 = 10;
/// Upper bound of the profile offset, so a candidate never leaves its band
/// (e.g. search-path candidates stay below [`SEARCH_PATH_FILE_PRIORITY`]). From the 50th
/// profile on, candidates share this offset and keep their declaration order.
pub const MAX_PROFILE_OFFSET: i64 = 5 * DEFAULT_STEP - 1;

/// A file to be loaded through the decoder registered for its suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    dir: PathBuf,
    name: String,
    suffix: String,
    required: bool,
}

impl FileRef {
    /// A required file `dir/name.suffix`. A leading `.` on `suffix` is ignored.
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>, suffix: impl Into<String>) -> Self {
        let suffix: String = suffix.into();
        Self {
            dir: dir.as_ref().to_path_buf(),
            name: name.into(),
            suffix: suffix.trim_start_matches('.').to_string(),
            required: true,
        }
    }

    /// Splits a full file path into directory, stem and suffix.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(dir, stem, suffix)
    }

    /// Directory containing the file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name without the suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Suffix without the leading dot; selects the decoder.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether a missing file counts as a load failure.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The full path: `dir/name.suffix`, or `dir/name` when there is no suffix.
    pub fn path(&self) -> PathBuf {
        if self.suffix.is_empty() {
            self.dir.join(&self.name)
        } else {
            self.dir.join(format!("{}.{}", self.name, self.suffix))
        }
    }

    fn is_blank(&self) -> bool {
        self.dir.as_os_str().is_empty()
            && self.name.trim().is_empty()
            && self.suffix.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SourceKind {
    Map(Table),
    File(FileRef),
    #[default]
    Empty,
}

/// A named, prioritized origin of configuration data.
///
/// Sources are immutable once built; [`with_priority`](Self::with_priority) and
/// [`optional`](Self::optional) consume and return a new value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySource {
    priority: i64,
    property: String,
    kind: SourceKind,
}

impl PropertySource {
    /// A map source at [`DEFAULT_PRIORITY`].
    pub fn map(property: impl Into<String>, map: Table) -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            property: property.into(),
            kind: SourceKind::Map(map),
        }
    }

    /// A required file source at [`DEFAULT_PRIORITY`].
    pub fn file(property: impl Into<String>, file: FileRef) -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            property: property.into(),
            kind: SourceKind::File(file),
        }
    }

    /// A required file source for `path`, named after the path itself.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::file(path.display().to_string(), FileRef::from_path(path))
    }

    /// Sets the priority. Higher priorities load later and override lower ones.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Marks a file source as optional: a missing file is skipped instead of failing.
    pub fn optional(mut self) -> Self {
        if let SourceKind::File(file) = &mut self.kind {
            file.required = false;
        }
        self
    }

    /// Sort key for loading; ties keep declaration order.
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Name used in logs and errors.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// What this source holds.
    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// The inline table of a map source.
    pub fn as_map(&self) -> Option<&Table> {
        match &self.kind {
            SourceKind::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The file of a file source, unless its reference is blank.
    pub fn as_file(&self) -> Option<&FileRef> {
        match &self.kind {
            SourceKind::File(file) if !file.is_blank() => Some(file),
            _ => None,
        }
    }

    pub fn is_map_source(&self) -> bool {
        matches!(self.kind, SourceKind::Map(_))
    }

    pub fn is_file_source(&self) -> bool {
        self.as_file().is_some()
    }

    pub fn is_empty_source(&self) -> bool {
        !self.is_map_source() && !self.is_file_source()
    }
}

/// Stable ascending sort: lower priorities load first and are overridden by later ones.
pub fn sort_by_priority(sources: &mut [PropertySource]) {
    sources.sort_by_key(PropertySource::priority);
}
