//! Metric extraction from the four per-run log bodies.
//!
//! Every function takes a source identifier (the store path) used only for
//! error reporting, and the raw text of the log.

use crate::error::IngestError;
use regex::Regex;
use std::sync::OnceLock;

const SECONDS: &str = "seconds";
const COMPILATION_TIME: &str = "compilation time";
const TIMING_SUFFIX: &str = " seconds";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskTimings {
    pub loading_time: f64,
    pub task_time: f64,
}

/// CPU and memory figures from a `time -v` report; each independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    pub cpu_percent: Option<f64>,
    pub max_resident_kb: Option<u64>,
}

/// Seconds reported by the first `@time` line mentioning compilation time.
pub fn precompile_time(source_id: &str, content: &str) -> Result<f64, IngestError> {
    let line = content
        .lines()
        .find(|line| line.contains(SECONDS) && line.contains(COMPILATION_TIME))
        .ok_or_else(|| IngestError::MetricNotFound {
            source_id: source_id.to_string(),
        })?;
    if let Some(value) = seconds_regex()
        .captures_iter(line)
        .find_map(|caps| caps.get(1).and_then(|m| parse_decimal(m.as_str())))
    {
        return Ok(value);
    }
    let before = line.split(SECONDS).next().unwrap_or("");
    let token = before.split_whitespace().last().unwrap_or("");
    Err(IngestError::MetricUnparsable {
        source_id: source_id.to_string(),
        token: token.to_string(),
    })
}

/// Loading and task seconds from the last `<load>, <task>[, ...] seconds` line.
pub fn task_timings(source_id: &str, content: &str) -> Result<TaskTimings, IngestError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(IngestError::EmptyContent {
            source_id: source_id.to_string(),
        });
    }
    let line = trimmed
        .lines()
        .rev()
        .map(str::trim_end)
        .find(|line| line.ends_with(TIMING_SUFFIX))
        .ok_or_else(|| IngestError::NoTimingLine {
            source_id: source_id.to_string(),
        })?;
    let body = &line[..line.len() - TIMING_SUFFIX.len()];
    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    if fields.len() < 2 {
        return Err(IngestError::MalformedTimingLine {
            source_id: source_id.to_string(),
            line: line.to_string(),
        });
    }
    let parse = |field: &str| {
        parse_decimal(field).ok_or_else(|| IngestError::NumericParseError {
            source_id: source_id.to_string(),
            field: field.to_string(),
        })
    };
    Ok(TaskTimings {
        loading_time: parse(fields[0])?,
        task_time: parse(fields[1])?,
    })
}

pub fn resource_usage(content: &str) -> ResourceUsage {
    let cpu_percent = cpu_regex()
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|value| parse_decimal(value.as_str()));
    let max_resident_kb = resident_regex()
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|value| value.as_str().parse::<u64>().ok());
    ResourceUsage {
        cpu_percent,
        max_resident_kb,
    }
}

fn parse_decimal(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

// A standalone decimal directly followed by "seconds".
fn seconds_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|\s)([0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)\s*seconds")
            .expect("valid seconds regex")
    })
}

fn cpu_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*Percent of CPU this job got:\s*([0-9]+(?:\.[0-9]+)?)%")
            .expect("valid cpu regex")
    })
}

fn resident_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*Maximum resident set size \(kbytes\):\s*([0-9]+)\s*$")
            .expect("valid resident regex")
    })
}
