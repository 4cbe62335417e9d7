use crate::error::IngestError;
use crate::model::RunIdentity;
use chrono::NaiveDate;

/// The four log files written for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    Precompile,
    Task,
    PrecompileResource,
    TaskResource,
}

// Longest first so ".precompile.rusage" wins over ".precompile".
static ROLES_BY_SUFFIX_LEN: &[FileRole] = &[
    FileRole::PrecompileResource,
    FileRole::TaskResource,
    FileRole::Precompile,
    FileRole::Task,
];

impl FileRole {
    pub const PRIMARY: FileRole = FileRole::Precompile;

    pub fn extension(self) -> &'static str {
        match self {
            FileRole::Precompile => ".precompile",
            FileRole::Task => ".task",
            FileRole::PrecompileResource => ".precompile.rusage",
            FileRole::TaskResource => ".task.rusage",
        }
    }

    pub fn detect(name: &str) -> Option<FileRole> {
        ROLES_BY_SUFFIX_LEN
            .iter()
            .copied()
            .find(|role| name.ends_with(role.extension()))
    }
}

/// Paths of the four files belonging to one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFiles {
    pub precompile: String,
    pub task: String,
    pub precompile_resource: String,
    pub task_resource: String,
}

impl RunFiles {
    /// Derive companion paths from a primary path. Returns `None` unless the
    /// path carries the primary extension.
    pub fn from_primary(path: &str) -> Option<Self> {
        if FileRole::detect(path) != Some(FileRole::PRIMARY) {
            return None;
        }
        let stem = path.strip_suffix(FileRole::PRIMARY.extension())?;
        let with = |role: FileRole| format!("{stem}{}", role.extension());
        Some(Self {
            precompile: path.to_string(),
            task: with(FileRole::Task),
            precompile_resource: with(FileRole::PrecompileResource),
            task_resource: with(FileRole::TaskResource),
        })
    }
}

/// Decode `<hash>_<YYYY-MM-DD>_<julia_version>_<hostname>.<extension>`.
///
/// All four parts must be non-empty and the date must be zero-padded
/// `YYYY-MM-DD`. Parts beyond the fourth are ignored.
pub fn decode_filename(filename: &str) -> Result<RunIdentity, IngestError> {
    let stem = match FileRole::detect(filename) {
        Some(role) => &filename[..filename.len() - role.extension().len()],
        None => filename,
    };
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 {
        return Err(IngestError::MalformedFilename {
            filename: filename.to_string(),
            parts: parts.len(),
        });
    }
    if parts[..4].iter().any(|part| part.is_empty()) {
        return Err(IngestError::MalformedFilename {
            filename: filename.to_string(),
            parts: parts.len(),
        });
    }
    let invalid_date = || IngestError::InvalidDate {
        filename: filename.to_string(),
        value: parts[1].to_string(),
    };
    if !is_padded_date(parts[1]) {
        return Err(invalid_date());
    }
    let date = NaiveDate::parse_from_str(parts[1], "%Y-%m-%d").map_err(|_| invalid_date())?;
    Ok(RunIdentity {
        hash: parts[0].to_string(),
        date,
        julia_version: parts[2].to_string(),
        hostname: parts[3].to_string(),
    })
}

// chrono accepts `2023-5-1` and a leading sign, so check the shape first.
fn is_padded_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}
