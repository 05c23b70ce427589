use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::task::Task;
use crate::ops::hydrate::{HydrateError, Hydrated, dehydrate, hydrate};
use crate::ops::project_ops::sort_projects;
use crate::parse::jsonl::{JsonlError, parse_jsonl, serialize_jsonl};

/// Error type for reading and writing the data file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: JsonlError },
    #[error("{path}: {source}")]
    Hydrate { path: PathBuf, source: HydrateError },
    #[error("could not serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load tasks and projects from a JSONL file. A missing file is an empty store.
pub fn load_store(path: &Path) -> Result<Hydrated, StoreError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "data file missing, starting empty");
        return Ok(Hydrated::default());
    }
    let text = fs::read_to_string(path).map_err(|e| StoreError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let records = parse_jsonl(&text).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    hydrate(records).map_err(|e| StoreError::Hydrate {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write tasks and projects back: sorted project declarations, then tasks.
pub fn save_store(path: &Path, tasks: &[Task], projects: &[String]) -> Result<(), StoreError> {
    let mut projects = projects.to_vec();
    sort_projects(&mut projects);

    let mut content = serialize_jsonl(&dehydrate(tasks, &projects)?);
    if !content.is_empty() {
        content.push('\n');
    }
    atomic_write(path, content.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(
        path = %path.display(),
        tasks = tasks.len(),
        projects = projects.len(),
        "saved data file"
    );
    Ok(())
}

/// Write `content` to `path` atomically using a temp file + rename.
/// An existing file keeps its permissions.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
