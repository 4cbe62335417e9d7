use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity of one benchmark run, decoded from its filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunIdentity {
    pub hash: String,
    pub date: NaiveDate,
    pub julia_version: String,
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub identity: RunIdentity,
    pub package_name: String,
    pub task_name: String,
    pub precompile_time: f64,
    pub loading_time: f64,
    pub task_time: f64,
    pub precompile_cpu: Option<f64>,
    pub task_cpu: Option<f64>,
    pub precompile_resident: Option<u64>,
    pub task_resident: Option<u64>,
}

impl RunRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::PrecompileTime => Some(self.precompile_time),
            Metric::LoadingTime => Some(self.loading_time),
            Metric::TaskTime => Some(self.task_time),
            Metric::PrecompileCpu => self.precompile_cpu,
            Metric::TaskCpu => self.task_cpu,
            Metric::PrecompileResident => self.precompile_resident.map(|kb| kb as f64),
            Metric::TaskResident => self.task_resident.map(|kb| kb as f64),
        }
    }
}

/// The numeric columns shared by dataset, normalized and summary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PrecompileTime,
    LoadingTime,
    TaskTime,
    PrecompileCpu,
    TaskCpu,
    PrecompileResident,
    TaskResident,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::PrecompileTime,
        Metric::LoadingTime,
        Metric::TaskTime,
        Metric::PrecompileCpu,
        Metric::TaskCpu,
        Metric::PrecompileResident,
        Metric::TaskResident,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::PrecompileTime => "precompile_time",
            Metric::LoadingTime => "loading_time",
            Metric::TaskTime => "task_time",
            Metric::PrecompileCpu => "precompile_cpu",
            Metric::TaskCpu => "task_cpu",
            Metric::PrecompileResident => "precompile_resident",
            Metric::TaskResident => "task_resident",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One value slot per [`Metric`], each independently present or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValues([Option<f64>; 7]);

impl MetricValues {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.0[metric.index()] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// A run whose metrics have been divided by their group baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub identity: RunIdentity,
    pub package_name: String,
    pub task_name: String,
    pub values: MetricValues,
}

impl NormalizedRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.values.get(metric)
    }
}

/// Geometric means for one (julia_version, date) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub julia_version: String,
    pub date: NaiveDate,
    pub runs: usize,
    pub values: MetricValues,
}

impl SummaryRow {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.values.get(metric)
    }
}

/// The step of record assembly that rejected a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Filename,
    Path,
    PrecompileRead,
    PrecompileTime,
    TaskRead,
    TaskTiming,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Filename => "filename",
            Stage::Path => "path",
            Stage::PrecompileRead => "precompile_read",
            Stage::PrecompileTime => "precompile_time",
            Stage::TaskRead => "task_read",
            Stage::TaskTiming => "task_timing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRun {
    pub path: String,
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub discovered: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub unlabeled: usize,
    pub skipped_by_stage: BTreeMap<Stage, usize>,
    pub skipped_runs: Vec<SkippedRun>,
    pub duration_ms: u64,
}
