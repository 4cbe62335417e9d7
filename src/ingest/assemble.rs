use crate::config::{Config, PathPolicy};
use crate::error::IngestError;
use crate::ingest::extract::{self, ResourceUsage};
use crate::ingest::filename::{self, RunFiles};
use crate::ingest::path::{self, Labels};
use crate::ingest::store::LogStore;
use crate::model::{RunRecord, SkippedRun, Stage};
use crate::util;

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub anchor: String,
    pub path_policy: PathPolicy,
    pub unknown_label: String,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AssembleOptions {
    fn from(config: &Config) -> Self {
        Self {
            anchor: config.anchor.clone(),
            path_policy: config.path_policy,
            unknown_label: config.unknown_label.clone(),
        }
    }
}

/// A run that made it into the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub record: RunRecord,
    /// Labels are placeholders because the path could not be resolved.
    pub unlabeled: bool,
}

/// Combines the four log files of one run into a [`RunRecord`].
pub struct RecordAssembler<'a, S: LogStore + ?Sized> {
    store: &'a S,
    options: &'a AssembleOptions,
}

impl<'a, S: LogStore + ?Sized> RecordAssembler<'a, S> {
    pub fn new(store: &'a S, options: &'a AssembleOptions) -> Self {
        Self { store, options }
    }

    pub fn assemble(&self, files: &RunFiles) -> Result<Accepted, SkippedRun> {
        let primary = files.precompile.as_str();
        let identity = filename::decode_filename(util::file_name(primary))
            .map_err(|err| reject(Stage::Filename, primary, &err))?;

        let (labels, unlabeled) = match path::resolve_labels(primary, &self.options.anchor) {
            Ok(labels) => (labels, false),
            Err(err) if self.options.path_policy == PathPolicy::Reject => {
                return Err(reject(Stage::Path, primary, &err));
            }
            Err(err) => {
                tracing::warn!(
                    path = primary,
                    anchor = %self.options.anchor,
                    label = %self.options.unknown_label,
                    "unlabeled run kept: {err}"
                );
                let placeholder = Labels {
                    package_name: self.options.unknown_label.clone(),
                    task_name: self.options.unknown_label.clone(),
                };
                (placeholder, true)
            }
        };

        let precompile_log = self
            .store
            .read(primary)
            .map_err(|err| reject(Stage::PrecompileRead, primary, &err))?;
        let precompile_time = extract::precompile_time(primary, &precompile_log)
            .map_err(|err| reject(Stage::PrecompileTime, primary, &err))?;

        let task_log = self
            .store
            .read(&files.task)
            .map_err(|err| reject(Stage::TaskRead, &files.task, &err))?;
        let timings = extract::task_timings(&files.task, &task_log)
            .map_err(|err| reject(Stage::TaskTiming, &files.task, &err))?;

        let precompile_usage = self.resource_usage(&files.precompile_resource);
        let task_usage = self.resource_usage(&files.task_resource);

        Ok(Accepted {
            record: RunRecord {
                identity,
                package_name: labels.package_name,
                task_name: labels.task_name,
                precompile_time,
                loading_time: timings.loading_time,
                task_time: timings.task_time,
                precompile_cpu: precompile_usage.cpu_percent,
                task_cpu: task_usage.cpu_percent,
                precompile_resident: precompile_usage.max_resident_kb,
                task_resident: task_usage.max_resident_kb,
            },
            unlabeled,
        })
    }

    fn resource_usage(&self, path: &str) -> ResourceUsage {
        let content = match self.store.read(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path, "resource log unavailable: {err}");
                return ResourceUsage::default();
            }
        };
        let usage = extract::resource_usage(&content);
        if usage.cpu_percent.is_none() {
            tracing::debug!(path, metric = "cpu_percent", "metric absent");
        }
        if usage.max_resident_kb.is_none() {
            tracing::debug!(path, metric = "max_resident_kb", "metric absent");
        }
        usage
    }
}

fn reject(stage: Stage, path: &str, err: &IngestError) -> SkippedRun {
    tracing::warn!(stage = stage.as_str(), path, reason = %err, "run skipped");
    SkippedRun {
        path: path.to_string(),
        stage,
        reason: err.to_string(),
    }
}
