use crate::error::IngestError;
use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Read access to a corpus of benchmark logs addressed by relative, `/`-separated paths.
pub trait LogStore {
    /// All stored paths ending in `suffix`, sorted.
    fn list(&self, suffix: &str) -> Result<Vec<String>>;

    fn read(&self, path: &str) -> Result<String, IngestError>;
}

fn access_error(path: &str, message: impl ToString) -> IngestError {
    IngestError::FileAccessError {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Logs laid out in a directory tree.
#[derive(Debug, Clone)]
pub struct FsLogStore {
    root: PathBuf,
}

impl FsLogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = fs::canonicalize(&root).unwrap_or(root);
        Self { root }
    }
}

impl LogStore for FsLogStore {
    fn list(&self, suffix: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            bail!("log directory {} does not exist", self.root.display());
        }
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(false)
            .filter_entry(|entry| entry.file_name() != OsStr::new(".git"))
            .build();
        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(root = %self.root.display(), "walk error: {err}");
                    continue;
                }
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let rel_path = crate::util::normalize_rel_path(&self.root, entry.path())?;
            if rel_path.ends_with(suffix) {
                paths.push(rel_path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<String, IngestError> {
        fs::read_to_string(self.root.join(path)).map_err(|err| access_error(path, err))
    }
}

/// Logs committed to a git repository, read at a fixed revision.
#[derive(Debug, Clone)]
pub struct GitLogStore {
    repo_root: PathBuf,
    revision: String,
}

impl GitLogStore {
    pub fn new(repo_root: impl Into<PathBuf>, revision: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            revision: revision.into(),
        }
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_root);
        cmd
    }
}

impl LogStore for GitLogStore {
    fn list(&self, suffix: &str) -> Result<Vec<String>> {
        let output = self
            .git()
            .arg("ls-tree")
            .arg("-r")
            .arg("-z")
            .arg("--name-only")
            .arg(&self.revision)
            .output()
            .context("Failed to run git ls-tree")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git ls-tree {} failed: {}", self.revision, stderr.trim());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut paths: Vec<String> = stdout
            .split('\0')
            .filter(|path| !path.is_empty() && path.ends_with(suffix))
            .map(str::to_string)
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<String, IngestError> {
        let output = self
            .git()
            .arg("show")
            // `./` resolves against `-C`, matching the ls-tree paths.
            .arg(format!("{}:./{}", self.revision, path))
            .output()
            .map_err(|err| access_error(path, err))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(access_error(path, stderr.trim()));
        }
        String::from_utf8(output.stdout).map_err(|err| access_error(path, err))
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    files: BTreeMap<String, String>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl LogStore for MemoryLogStore {
    fn list(&self, suffix: &str) -> Result<Vec<String>> {
        Ok(self
            .files
            .keys()
            .filter(|path| path.ends_with(suffix))
            .cloned()
            .collect())
    }

    fn read(&self, path: &str) -> Result<String, IngestError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| access_error(path, "not found"))
    }
}
