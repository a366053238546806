//! Writes a fixed payload to `<base>/.streamlit/config.toml`.
//!
//! Every call leaves the same end state behind: the directory exists and the
//! file holds exactly the payload bytes. Failures are returned as
//! [`FilesystemError`] and never abort the process.

use std::fs::{self, File};
use std::io::{self, Write};
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::payload::ConfigPayload;

pub const CONFIG_DIR: &str = ".streamlit";
pub const CONFIG_FILE: &str = "config.toml";

/// Anything the filesystem refused while materializing the config.
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("{path} exists but is not a directory")]
    NotADirectory { path: Utf8PathBuf },

    #[error("creating directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        /// Directory this run created before the write failed, if any.
        created_directory: Option<Utf8PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error("reading metadata for {path}: {source}")]
    Metadata {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FilesystemError {
    pub fn path(&self) -> &Utf8Path {
        match self {
            FilesystemError::NotADirectory { path }
            | FilesystemError::CreateDir { path, .. }
            | FilesystemError::Write { path, .. }
            | FilesystemError::Metadata { path, .. } => path,
        }
    }

    pub fn created_directory(&self) -> Option<&Utf8Path> {
        match self {
            FilesystemError::Write {
                created_directory, ..
            } => created_directory.as_deref(),
            _ => None,
        }
    }

    fn after_creating(mut self, directory: &Utf8Path) -> Self {
        if let FilesystemError::Write {
            created_directory, ..
        } = &mut self
        {
            *created_directory = Some(directory.to_owned());
        }
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DirState {
    Created,
    Existing,
}

/// Confirmation of a successful write.
#[derive(Clone, Debug)]
pub struct Materialized {
    pub directory: Utf8PathBuf,
    pub directory_state: DirState,
    pub path: Utf8PathBuf,
    pub bytes_written: usize,
    pub size_on_disk: u64,
    pub modified: Option<SystemTime>,
}

pub type OperationResult = Result<Materialized, FilesystemError>;

/// What a write would do, without doing it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Preview {
    pub directory: Utf8PathBuf,
    pub directory_exists: bool,
    /// Something other than a directory already sits at `directory`.
    pub directory_collision: bool,
    pub path: Utf8PathBuf,
    pub file_exists: bool,
    pub bytes: usize,
}

/// Ensure `path` is a directory, creating it and any missing parents.
pub fn ensure_directory(path: &Utf8Path) -> Result<DirState, FilesystemError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %path, "directory already present");
            Ok(DirState::Existing)
        }
        Ok(_) => Err(FilesystemError::NotADirectory {
            path: path.to_owned(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|source| FilesystemError::CreateDir {
                path: path.to_owned(),
                source,
            })?;
            info!(path = %path, "created directory");
            Ok(DirState::Created)
        }
        Err(source) => Err(FilesystemError::Metadata {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Truncate `path` and write `payload` to it, synced to disk before returning.
pub fn write_config(path: &Utf8Path, payload: &ConfigPayload) -> Result<usize, FilesystemError> {
    let write = || -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(payload.as_bytes())?;
        file.sync_all()
    };
    write().map_err(|source| FilesystemError::Write {
        path: path.to_owned(),
        created_directory: None,
        source,
    })?;
    debug!(path = %path, bytes = payload.len(), "wrote config");
    Ok(payload.len())
}

pub struct ConfigMaterializer<'a> {
    directory: Utf8PathBuf,
    target: Utf8PathBuf,
    payload: &'a ConfigPayload,
}

impl<'a> ConfigMaterializer<'a> {
    /// Target `<base>/.streamlit/config.toml`. A base of `.` yields relative paths.
    pub fn new(base: &Utf8Path, payload: &'a ConfigPayload) -> Self {
        let directory = if base == Utf8Path::new(".") || base.as_str().is_empty() {
            Utf8PathBuf::from(CONFIG_DIR)
        } else {
            base.join(CONFIG_DIR)
        };
        let target = directory.join(CONFIG_FILE);
        Self {
            directory,
            target,
            payload,
        }
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    pub fn payload(&self) -> &ConfigPayload {
        self.payload
    }

    pub fn materialize(&self) -> OperationResult {
        let directory_state = ensure_directory(&self.directory)?;
        let bytes_written = write_config(&self.target, self.payload).map_err(|err| {
            match directory_state {
                DirState::Created => err.after_creating(&self.directory),
                DirState::Existing => err,
            }
        })?;
        let meta = fs::metadata(&self.target).map_err(|source| FilesystemError::Metadata {
            path: self.target.clone(),
            source,
        })?;

        info!(path = %self.target, bytes = meta.len(), "materialized config");
        Ok(Materialized {
            directory: self.directory.clone(),
            directory_state,
            path: self.target.clone(),
            bytes_written,
            size_on_disk: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    pub fn preview(&self) -> Preview {
        let directory_exists = self.directory.is_dir();
        Preview {
            directory: self.directory.clone(),
            directory_exists,
            directory_collision: !directory_exists && self.directory.exists(),
            path: self.target.clone(),
            file_exists: self.target.exists(),
            bytes: self.payload.len(),
        }
    }
}
