//! Loads sorted property sources into a [`NestedStore`].

use tracing::{debug, info, warn};

use super::builder::SuccessThreshold;
use super::file::DecoderRegistry;
use super::source::{sort_by_priority, FileRef, PropertySource, SourceKind};
use super::store::NestedStore;
use super::value::Table;
use super::ConfigError;

/// Per-load counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Optional files that did not exist.
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct Loader<'a> {
    decoders: &'a DecoderRegistry,
    threshold: SuccessThreshold,
}

impl<'a> Loader<'a> {
    pub fn new(decoders: &'a DecoderRegistry, threshold: SuccessThreshold) -> Self {
        Self {
            decoders,
            threshold,
        }
    }

    /// Sorts `sources` by ascending priority and merges each into `store` in that order,
    /// so later sources override earlier ones.
    ///
    /// Under [`SuccessThreshold::All`] the first failure is returned and nothing after it is
    /// merged; sources merged before it stay merged.
    pub fn load(
        &self,
        store: &mut NestedStore,
        sources: &mut [PropertySource],
    ) -> Result<LoadReport, ConfigError> {
        sort_by_priority(sources);

        let mut report = LoadReport::default();
        let mut errors = Vec::new();

        for source in sources.iter() {
            match self.read(source) {
                Ok(Some(table)) => {
                    debug!(
                        source = source.property(),
                        priority = source.priority(),
                        "merging property source"
                    );
                    store.merge(table);
                    report.loaded += 1;
                }
                Ok(None) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    if self.threshold == SuccessThreshold::All {
                        return Err(e);
                    }
                    warn!(source = source.property(), error = %e, "failed to load property source");
                    errors.push(e);
                }
            }
        }

        if self.threshold == SuccessThreshold::Anyone && report.loaded == 0 {
            return Err(ConfigError::AllSourcesFailed(errors));
        }

        info!(
            loaded = report.loaded,
            skipped = report.skipped,
            failed = report.failed,
            "property sources loaded"
        );
        Ok(report)
    }

    /// Returns `Ok(None)` for an optional file that does not exist.
    pub fn read(&self, source: &PropertySource) -> Result<Option<Table>, ConfigError> {
        match source.kind() {
            SourceKind::Map(map) => Ok(Some(map.clone())),
            SourceKind::File(_) => match source.as_file() {
                Some(file) => self.read_file(file),
                None => Err(ConfigError::EmptySource),
            },
            SourceKind::Empty => Err(ConfigError::EmptySource),
        }
    }

    fn read_file(&self, file: &FileRef) -> Result<Option<Table>, ConfigError> {
        let path = file.path();
        if !file.is_required() && !path.is_file() {
            debug!(path = %path.display(), "optional config file not present");
            return Ok(None);
        }

        match self.decoders.find(file.suffix()) {
            Some(decoder) => decoder.load(&path).map(Some),
            None => Err(ConfigError::NoDecoder {
                suffix: file.suffix().to_string(),
                path,
            }),
        }
    }
}
