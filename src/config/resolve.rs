//! Expansion of [`Options`] into a concrete list of property sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::builder::Options;
use super::env::{environment_source, process_environ};
use super::file::SUPPORTED_CONFIG_TYPES;
use super::source::{
    FileRef, PropertySource, ABSOLUTE_FILE_PRIORITY, ABSOLUTE_PATH_PRIORITY, DEFAULT_PRIORITY,
    MAX_PROFILE_OFFSET, PROFILE_STEP, SEARCH_PATH_FILE_PRIORITY, SEARCH_PATH_PRIORITY,
};
use super::ConfigError;
use crate::event::EventBus;

/// Base names tried in each searched directory when none are configured.
pub const DEFAULT_CONFIG_NAMES: [&str; 5] = ["ini", "conf", "config", "configs", "application"];

pub const DEFAULT_PROFILE: &str = "default";
pub const PROPERTIES_SOURCE_NAME: &str = "opt.properties";

/// The outcome of resolving options: the sources to load and the active profiles.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub sources: Vec<PropertySource>,
    pub profiles: Vec<String>,
}

/// Expands options into property sources. Validation runs first, before any I/O.
#[derive(Debug)]
pub struct SourceResolver<'a> {
    options: &'a Options,
    config_names: Vec<String>,
    config_types: Vec<String>,
    profiles: Vec<String>,
}

impl<'a> SourceResolver<'a> {
    pub fn new(options: &'a Options) -> Result<Self, ConfigError> {
        options.validate()?;

        let config_names = dedup_or_default(&options.config_names, &DEFAULT_CONFIG_NAMES);
        let config_types = dedup_or_default(&options.config_types, &SUPPORTED_CONFIG_TYPES);
        let profiles = dedup_or_default(&options.profiles, &[DEFAULT_PROFILE]);

        Ok(Self {
            options,
            config_names,
            config_types,
            profiles,
        })
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Produces every source, the environment source last.
    pub fn resolve(self, bus: &EventBus) -> Resolution {
        let mut sources = self.options.sources.clone();

        sources.push(
            PropertySource::map(PROPERTIES_SOURCE_NAME, self.options.properties.clone())
                .with_priority(DEFAULT_PRIORITY),
        );

        for path in &self.options.absolute_paths {
            if path.as_os_str().is_empty() {
                continue;
            }
            self.expand_path(
                path,
                ABSOLUTE_FILE_PRIORITY,
                ABSOLUTE_PATH_PRIORITY,
                &mut sources,
            );
        }

        for path in &self.options.search_paths {
            match std::path::absolute(path) {
                Ok(abs) => self.expand_path(
                    &abs,
                    SEARCH_PATH_FILE_PRIORITY,
                    SEARCH_PATH_PRIORITY,
                    &mut sources,
                ),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unresolvable search path");
                }
            }
        }

        let markers = self.options.markers();
        let env = match &self.options.environ {
            Some(entries) => environment_source(entries.as_slice(), &markers, bus),
            None => environment_source(process_environ().as_slice(), &markers, bus),
        };
        sources.push(env);

        let sources = dedup_files(sources);
        debug!(count = sources.len(), profiles = ?self.profiles, "resolved property sources");

        Resolution {
            sources,
            profiles: self.profiles,
        }
    }

    /// A file is referenced directly; anything else is searched as a directory.
    fn expand_path(
        &self,
        path: &Path,
        file_priority: i64,
        dir_priority: i64,
        sources: &mut Vec<PropertySource>,
    ) {
        let path = clean(path);
        if path.is_file() {
            debug!(path = %path.display(), priority = file_priority, "direct file source");
            sources.push(PropertySource::from_path(&path).with_priority(file_priority));
            return;
        }

        for name in &self.config_names {
            let qualified = self
                .profiles
                .iter()
                .enumerate()
                .map(|(i, profile)| (format!("{name}-{profile}"), profile_offset(i)));

            for (candidate, offset) in std::iter::once((name.clone(), 0)).chain(qualified) {
                let literal = path.join(&candidate);
                if literal.is_file() {
                    debug!(path = %literal.display(), "literal config file");
                    sources.push(
                        PropertySource::from_path(&literal).with_priority(file_priority + offset),
                    );
                    continue;
                }

                for suffix in &self.config_types {
                    let file = FileRef::new(&path, candidate.as_str(), suffix.as_str());
                    sources.push(
                        PropertySource::file(file.path().display().to_string(), file)
                            .optional()
                            .with_priority(dir_priority + offset),
                    );
                }
            }
        }
    }
}

/// Offset of the `index`-th profile's candidates above their band.
fn profile_offset(index: usize) -> i64 {
    let rank = i64::try_from(index).unwrap_or(i64::MAX).saturating_add(1);
    PROFILE_STEP.saturating_mul(rank).min(MAX_PROFILE_OFFSET)
}

fn dedup_or_default(values: &[String], defaults: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let candidates: Vec<&str> = if values.is_empty() {
        defaults.to_vec()
    } else {
        values.iter().map(String::as_str).collect()
    };
    for value in candidates {
        if !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Lexically normalizes `.` and `..` components.
fn clean(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Keeps one source per file path. A required source beats an optional one; otherwise
/// the higher priority wins.
fn dedup_files(sources: Vec<PropertySource>) -> Vec<PropertySource> {
    let mut out: Vec<PropertySource> = Vec::with_capacity(sources.len());
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();

    for source in sources {
        let Some(path) = source.as_file().map(FileRef::path) else {
            out.push(source);
            continue;
        };
        match seen.get(&path) {
            Some(&at) => {
                if outranks(&source, &out[at]) {
                    out[at] = source;
                }
            }
            None => {
                seen.insert(path, out.len());
                out.push(source);
            }
        }
    }
    out
}

fn outranks(candidate: &PropertySource, kept: &PropertySource) -> bool {
    let required = |s: &PropertySource| s.as_file().is_some_and(FileRef::is_required);
    match (required(candidate), required(kept)) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.priority() > kept.priority(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::source::ENVIRONMENT_PRIORITY;
    use crate::config::value::{Table, Value};
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Options {
        Options::new().with_environ(Vec::<String>::new())
    }

    fn file_paths(resolution: &Resolution) -> Vec<(PathBuf, i64, bool)> {
        resolution
            .sources
            .iter()
            .filter_map(|s| s.as_file().map(|f| (f.path(), s.priority(), f.is_required())))
            .collect()
    }

    #[test]
    fn test_validation_runs_first() {
        let options = no_env().with_config_types(["ini"]);
        assert!(matches!(
            SourceResolver::new(&options),
            Err(ConfigError::UnsupportedConfigType(_))
        ));
    }

    #[test]
    fn test_default_profile() {
        let options = no_env();
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());
        assert_eq!(resolution.profiles, ["default"]);

        let options = no_env().with_profiles(["dev", "prod", "dev"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());
        assert_eq!(resolution.profiles, ["dev", "prod"]);
    }

    #[test]
    fn test_properties_and_environment_sources() {
        let mut props = Table::new();
        props.insert("hello".into(), Value::from("world"));
        let options = Options::new()
            .with_properties(props)
            .with_environ(["HOME=/root"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        assert_eq!(resolution.sources.len(), 2);
        let properties = &resolution.sources[0];
        assert_eq!(properties.property(), PROPERTIES_SOURCE_NAME);
        assert_eq!(properties.priority(), DEFAULT_PRIORITY);

        let env = resolution.sources.last().unwrap();
        assert_eq!(env.priority(), ENVIRONMENT_PRIORITY);
        assert_eq!(env.as_map().unwrap()["HOME"], Value::from("/root"));
    }

    #[test]
    fn test_absolute_file_is_direct_source() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.toml");
        fs::write(&file, "a = 1").unwrap();

        let options = no_env().with_absolute_paths([&file]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        assert_eq!(file_paths(&resolution), [(file, ABSOLUTE_FILE_PRIORITY, true)]);
    }

    #[test]
    fn test_directory_expansion_candidates() {
        let dir = TempDir::new().unwrap();
        let options = no_env()
            .with_absolute_paths([dir.path()])
            .with_config_names(["application"])
            .with_config_types(["yaml", "toml"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        let base = ABSOLUTE_PATH_PRIORITY;
        let profiled = ABSOLUTE_PATH_PRIORITY + PROFILE_STEP;
        assert_eq!(
            file_paths(&resolution),
            [
                (dir.path().join("application.yaml"), base, false),
                (dir.path().join("application.toml"), base, false),
                (dir.path().join("application-default.yaml"), profiled, false),
                (dir.path().join("application-default.toml"), profiled, false),
            ]
        );
    }

    #[test]
    fn test_literal_name_stops_suffix_expansion() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.yml"), "a: 1").unwrap();

        let options = no_env()
            .with_absolute_paths([dir.path()])
            .with_config_names(["app.yml"])
            .with_profiles(["dev"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());
        let files = file_paths(&resolution);

        assert_eq!(files[0], (dir.path().join("app.yml"), ABSOLUTE_FILE_PRIORITY, true));
        // only the profile-qualified name is expanded by suffix
        assert_eq!(files.len(), 1 + SUPPORTED_CONFIG_TYPES.len());
        let profiled = ABSOLUTE_PATH_PRIORITY + PROFILE_STEP;
        assert!(files[1..]
            .iter()
            .all(|(p, prio, _)| p.starts_with(dir.path()) && *prio == profiled));
    }

    #[test]
    fn test_later_profiles_rank_higher() {
        let dir = TempDir::new().unwrap();
        let options = no_env()
            .with_absolute_paths([dir.path()])
            .with_config_names(["application"])
            .with_config_types(["toml"])
            .with_profiles(["dev", "local"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        let priorities: Vec<i64> = file_paths(&resolution).iter().map(|f| f.1).collect();
        assert_eq!(
            priorities,
            [
                ABSOLUTE_PATH_PRIORITY,
                ABSOLUTE_PATH_PRIORITY + PROFILE_STEP,
                ABSOLUTE_PATH_PRIORITY + 2 * PROFILE_STEP,
            ]
        );
    }

    #[test]
    fn test_search_paths_rank_below_absolute_paths() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        let options = no_env()
            .with_search_paths([nested.join("..").join("nested")])
            .with_config_names(["config"])
            .with_config_types(["toml"])
            .with_profiles(["p"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());
        let files = file_paths(&resolution);

        assert_eq!(files[0], (nested.join("config.toml"), SEARCH_PATH_PRIORITY, false));
        assert!(SEARCH_PATH_PRIORITY < ABSOLUTE_PATH_PRIORITY);
        assert!(SEARCH_PATH_FILE_PRIORITY < ABSOLUTE_PATH_PRIORITY);
    }

    #[test]
    fn test_duplicate_paths_keep_highest_priority() {
        let dir = TempDir::new().unwrap();
        let options = no_env()
            .with_search_paths([dir.path()])
            .with_absolute_paths([dir.path()])
            .with_config_names(["config"])
            .with_config_types(["toml"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());
        let files = file_paths(&resolution);

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.1 >= ABSOLUTE_PATH_PRIORITY));
    }

    #[test]
    fn test_required_source_survives_same_path_candidate() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("application.toml");
        let options = no_env()
            .with_sources([PropertySource::from_path(&explicit).with_priority(5)])
            .with_absolute_paths([dir.path()])
            .with_config_names(["application"])
            .with_config_types(["toml"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        let matching: Vec<_> = file_paths(&resolution)
            .into_iter()
            .filter(|f| f.0 == explicit)
            .collect();
        assert_eq!(matching, [(explicit.clone(), 5, true)]);
    }

    #[test]
    fn test_unresolvable_search_path_is_skipped() {
        let dir = TempDir::new().unwrap();
        let options = no_env()
            .with_search_paths([Path::new(""), dir.path()])
            .with_config_names(["config"])
            .with_config_types(["toml"]);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        let files = file_paths(&resolution);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.0.starts_with(dir.path())));
        assert!(files.iter().all(|f| f.1 >= SEARCH_PATH_PRIORITY && !f.2));
    }

    #[test]
    fn test_profile_offsets_stay_inside_band() {
        assert_eq!(profile_offset(0), PROFILE_STEP);
        assert_eq!(profile_offset(48), 49 * PROFILE_STEP);
        assert_eq!(profile_offset(49), MAX_PROFILE_OFFSET);
        assert_eq!(profile_offset(10_000), MAX_PROFILE_OFFSET);

        let dir = TempDir::new().unwrap();
        let profiles: Vec<String> = (0..80).map(|i| format!("p{i}")).collect();
        let options = no_env()
            .with_search_paths([dir.path()])
            .with_config_names(["application"])
            .with_config_types(["toml"])
            .with_profiles(profiles);
        let resolution = SourceResolver::new(&options).unwrap().resolve(&EventBus::new());

        let files = file_paths(&resolution);
        assert_eq!(files.len(), 81);
        assert!(files.iter().all(|f| f.1 < SEARCH_PATH_FILE_PRIORITY));
        assert_eq!(files.last().unwrap().1, SEARCH_PATH_PRIORITY + MAX_PROFILE_OFFSET);
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    }
}
