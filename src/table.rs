//! Delimited tables for the dataset, normalized and summary stages.
//!
//! Absent values are written as empty fields and read back as absent.

use crate::ingest::Dataset;
use crate::model::{Metric, MetricValues, NormalizedRecord, RunIdentity, RunRecord, SummaryRow};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct DatasetRow {
    package_name: String,
    task_name: String,
    date: NaiveDate,
    julia_version: String,
    hostname: String,
    hash: String,
    precompile_time: f64,
    loading_time: f64,
    task_time: f64,
    precompile_cpu: Option<f64>,
    task_cpu: Option<f64>,
    precompile_resident: Option<u64>,
    task_resident: Option<u64>,
}

impl From<&RunRecord> for DatasetRow {
    fn from(r: &RunRecord) -> Self {
        DatasetRow {
            package_name: r.package_name.clone(),
            task_name: r.task_name.clone(),
            date: r.identity.date,
            julia_version: r.identity.julia_version.clone(),
            hostname: r.identity.hostname.clone(),
            hash: r.identity.hash.clone(),
            precompile_time: r.precompile_time,
            loading_time: r.loading_time,
            task_time: r.task_time,
            precompile_cpu: r.precompile_cpu,
            task_cpu: r.task_cpu,
            precompile_resident: r.precompile_resident,
            task_resident: r.task_resident,
        }
    }
}

impl From<DatasetRow> for RunRecord {
    fn from(row: DatasetRow) -> Self {
        RunRecord {
            identity: RunIdentity {
                hash: row.hash,
                date: row.date,
                julia_version: row.julia_version,
                hostname: row.hostname,
            },
            package_name: row.package_name,
            task_name: row.task_name,
            precompile_time: row.precompile_time,
            loading_time: row.loading_time,
            task_time: row.task_time,
            precompile_cpu: row.precompile_cpu,
            task_cpu: row.task_cpu,
            precompile_resident: row.precompile_resident,
            task_resident: row.task_resident,
        }
    }
}

/// Metric columns in output order, as optional ratios.
#[derive(Debug)]
struct MetricColumns {
    precompile_time: Option<f64>,
    loading_time: Option<f64>,
    task_time: Option<f64>,
    precompile_cpu: Option<f64>,
    task_cpu: Option<f64>,
    precompile_resident: Option<f64>,
    task_resident: Option<f64>,
}

impl From<&MetricValues> for MetricColumns {
    fn from(values: &MetricValues) -> Self {
        MetricColumns {
            precompile_time: values.get(Metric::PrecompileTime),
            loading_time: values.get(Metric::LoadingTime),
            task_time: values.get(Metric::TaskTime),
            precompile_cpu: values.get(Metric::PrecompileCpu),
            task_cpu: values.get(Metric::TaskCpu),
            precompile_resident: values.get(Metric::PrecompileResident),
            task_resident: values.get(Metric::TaskResident),
        }
    }
}

impl From<&MetricColumns> for MetricValues {
    fn from(cols: &MetricColumns) -> Self {
        let mut values = MetricValues::default();
        values.set(Metric::PrecompileTime, cols.precompile_time);
        values.set(Metric::LoadingTime, cols.loading_time);
        values.set(Metric::TaskTime, cols.task_time);
        values.set(Metric::PrecompileCpu, cols.precompile_cpu);
        values.set(Metric::TaskCpu, cols.task_cpu);
        values.set(Metric::PrecompileResident, cols.precompile_resident);
        values.set(Metric::TaskResident, cols.task_resident);
        values
    }
}

// csv cannot flatten nested structs, so the metric columns are spelled out
// and converted through `MetricColumns`.
#[derive(Debug, Serialize, Deserialize)]
struct NormalizedRow {
    package_name: String,
    task_name: String,
    date: NaiveDate,
    julia_version: String,
    hostname: String,
    hash: String,
    precompile_time: Option<f64>,
    loading_time: Option<f64>,
    task_time: Option<f64>,
    precompile_cpu: Option<f64>,
    task_cpu: Option<f64>,
    precompile_resident: Option<f64>,
    task_resident: Option<f64>,
}

impl NormalizedRow {
    fn columns(&self) -> MetricColumns {
        MetricColumns {
            precompile_time: self.precompile_time,
            loading_time: self.loading_time,
            task_time: self.task_time,
            precompile_cpu: self.precompile_cpu,
            task_cpu: self.task_cpu,
            precompile_resident: self.precompile_resident,
            task_resident: self.task_resident,
        }
    }
}

impl From<&NormalizedRecord> for NormalizedRow {
    fn from(r: &NormalizedRecord) -> Self {
        let cols = MetricColumns::from(&r.values);
        NormalizedRow {
            package_name: r.package_name.clone(),
            task_name: r.task_name.clone(),
            date: r.identity.date,
            julia_version: r.identity.julia_version.clone(),
            hostname: r.identity.hostname.clone(),
            hash: r.identity.hash.clone(),
            precompile_time: cols.precompile_time,
            loading_time: cols.loading_time,
            task_time: cols.task_time,
            precompile_cpu: cols.precompile_cpu,
            task_cpu: cols.task_cpu,
            precompile_resident: cols.precompile_resident,
            task_resident: cols.task_resident,
        }
    }
}

impl From<NormalizedRow> for NormalizedRecord {
    fn from(row: NormalizedRow) -> Self {
        let values = MetricValues::from(&row.columns());
        NormalizedRecord {
            identity: RunIdentity {
                hash: row.hash,
                date: row.date,
                julia_version: row.julia_version,
                hostname: row.hostname,
            },
            package_name: row.package_name,
            task_name: row.task_name,
            values,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRowOut<'a> {
    julia_version: &'a str,
    date: NaiveDate,
    runs: usize,
    precompile_time: Option<f64>,
    loading_time: Option<f64>,
    task_time: Option<f64>,
    precompile_cpu: Option<f64>,
    task_cpu: Option<f64>,
    precompile_resident: Option<f64>,
    task_resident: Option<f64>,
}

impl<'a> From<&'a SummaryRow> for SummaryRowOut<'a> {
    fn from(r: &'a SummaryRow) -> Self {
        let cols = MetricColumns::from(&r.values);
        SummaryRowOut {
            julia_version: &r.julia_version,
            date: r.date,
            runs: r.runs,
            precompile_time: cols.precompile_time,
            loading_time: cols.loading_time,
            task_time: cols.task_time,
            precompile_cpu: cols.precompile_cpu,
            task_cpu: cols.task_cpu,
            precompile_resident: cols.precompile_resident,
            task_resident: cols.task_resident,
        }
    }
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("serialize row")?;
    }
    wtr.flush().context("flush table")?;
    Ok(())
}

fn read_rows<R: Read, T: for<'de> Deserialize<'de>>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (idx, row) in rdr.deserialize().enumerate() {
        // Line 1 is the header.
        rows.push(row.with_context(|| format!("parse row at line {}", idx + 2))?);
    }
    Ok(rows)
}

fn create(path: &Path) -> Result<File> {
    crate::util::ensure_parent_dir(path)?;
    File::create(path).with_context(|| format!("create {}", path.display()))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("open {}", path.display()))
}

pub fn write_dataset_to<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    write_rows(writer, dataset.iter().map(DatasetRow::from))
}

pub fn read_dataset_from<R: Read>(reader: R) -> Result<Dataset> {
    let rows: Vec<DatasetRow> = read_rows(reader)?;
    Ok(Dataset::from_records(rows.into_iter().map(RunRecord::from).collect()))
}

pub fn write_normalized_to<W: Write>(writer: W, rows: &[NormalizedRecord]) -> Result<()> {
    write_rows(writer, rows.iter().map(NormalizedRow::from))
}

pub fn read_normalized_from<R: Read>(reader: R) -> Result<Vec<NormalizedRecord>> {
    let rows: Vec<NormalizedRow> = read_rows(reader)?;
    Ok(rows.into_iter().map(NormalizedRecord::from).collect())
}

pub fn write_summary_to<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<()> {
    write_rows(writer, rows.iter().map(SummaryRowOut::from))
}

pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    write_dataset_to(create(path)?, dataset).with_context(|| format!("write {}", path.display()))
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    read_dataset_from(open(path)?).with_context(|| format!("read {}", path.display()))
}

pub fn write_normalized(path: &Path, rows: &[NormalizedRecord]) -> Result<()> {
    write_normalized_to(create(path)?, rows).with_context(|| format!("write {}", path.display()))
}

pub fn read_normalized(path: &Path) -> Result<Vec<NormalizedRecord>> {
    read_normalized_from(open(path)?).with_context(|| format!("read {}", path.display()))
}

pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    write_summary_to(create(path)?, rows).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunRecord {
        RunRecord {
            identity: RunIdentity {
                hash: "abc1234".to_string(),
                date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                julia_version: "1.9.0".to_string(),
                hostname: "hostA".to_string(),
            },
            package_name: "Plots".to_string(),
            task_name: "plot".to_string(),
            precompile_time: 3.14,
            loading_time: 0.512,
            task_time: 1.234,
            precompile_cpu: None,
            task_cpu: Some(99.0),
            precompile_resident: None,
            task_resident: Some(0),
        }
    }

    #[test]
    fn dataset_header_and_absent_fields() {
        let mut out = Vec::new();
        write_dataset_to(&mut out, &Dataset::from_records(vec![sample()])).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "package_name,task_name,date,julia_version,hostname,hash,precompile_time,\
             loading_time,task_time,precompile_cpu,task_cpu,precompile_resident,task_resident"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Plots,plot,2023-05-01,1.9.0,hostA,abc1234,3.14,0.512,1.234,,99.0,,0"
        );
    }

    #[test]
    fn empty_mandatory_field_is_an_error() {
        let text = "package_name,task_name,date,julia_version,hostname,hash,precompile_time,\
                    loading_time,task_time,precompile_cpu,task_cpu,precompile_resident,task_resident\n\
                    P,t,2023-05-01,1.9.0,h,x,,1,1,,,,\n";
        assert!(read_dataset_from(text.as_bytes()).is_err());
    }

    #[test]
    fn summary_omits_missing_metric() {
        let mut values = MetricValues::default();
        values.set(Metric::TaskTime, Some(2.0));
        let rows = vec![SummaryRow {
            julia_version: "1.10.0".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            runs: 3,
            values,
        }];
        let mut out = Vec::new();
        write_summary_to(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1).unwrap(), "1.10.0,2024-01-01,3,,,2.0,,,,");
    }
}
