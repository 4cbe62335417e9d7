use crate::ingest::assemble::{AssembleOptions, RecordAssembler};
use crate::ingest::filename::{FileRole, RunFiles};
use crate::ingest::store::LogStore;
use crate::model::{IngestReport, RunRecord};
use anyhow::{Context, Result};
use std::time::Instant;

pub mod assemble;
pub mod extract;
pub mod filename;
pub mod path;
pub mod store;

/// Accepted runs in discovery order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<RunRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<RunRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<RunRecord> {
        self.records
    }
}

/// Walks every run in a log store and folds the accepted ones into a [`Dataset`].
pub struct DatasetBuilder<'a, S: LogStore + ?Sized> {
    store: &'a S,
    options: AssembleOptions,
}

impl<'a, S: LogStore + ?Sized> DatasetBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_options(store, AssembleOptions::default())
    }

    pub fn with_options(store: &'a S, options: AssembleOptions) -> Self {
        Self { store, options }
    }

    /// Primary files in the store, each mapped to its companions.
    pub fn discover(&self) -> Result<Vec<RunFiles>> {
        let primary = FileRole::PRIMARY.extension();
        let paths = self
            .store
            .list(primary)
            .with_context(|| format!("list {primary} files"))?;
        Ok(paths
            .iter()
            .filter_map(|path| RunFiles::from_primary(path))
            .collect())
    }

    pub fn build(&self) -> Result<(Dataset, IngestReport)> {
        let started = Instant::now();
        let runs = self.discover()?;
        let assembler = RecordAssembler::new(self.store, &self.options);

        let mut report = IngestReport {
            discovered: runs.len(),
            ..IngestReport::default()
        };
        let mut records = Vec::with_capacity(runs.len());
        for files in &runs {
            match assembler.assemble(files) {
                Ok(accepted) => {
                    if accepted.unlabeled {
                        report.unlabeled += 1;
                    }
                    records.push(accepted.record);
                }
                Err(skipped) => {
                    *report.skipped_by_stage.entry(skipped.stage).or_insert(0) += 1;
                    report.skipped_runs.push(skipped);
                }
            }
        }
        report.accepted = records.len();
        report.skipped = report.skipped_runs.len();
        report.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            discovered = report.discovered,
            accepted = report.accepted,
            skipped = report.skipped,
            unlabeled = report.unlabeled,
            "dataset built"
        );
        Ok((Dataset::from_records(records), report))
    }
}
