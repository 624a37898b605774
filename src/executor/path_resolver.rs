use std::fs;
use std::path::{Path, PathBuf};
use log::trace;
use nix::unistd::{access, AccessFlags};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("{0}: No such file or directory")]
    NoSuchFile(String),
    #[error("{0}: Is a directory")]
    IsDirectory(String),
    #[error("{0}: Permission denied")]
    PermissionDenied(String),
}

impl ResolveError {
    pub fn status(&self) -> i32 {
        match self {
            ResolveError::NotFound(_) | ResolveError::NoSuchFile(_) => 127,
            ResolveError::IsDirectory(_) | ResolveError::PermissionDenied(_) => 126,
        }
    }
}

/// Finds the program a command word names.
pub struct PathResolver;

impl PathResolver {
    /// Words containing `/` are used as given. Other words are looked up in
    /// each `PATH` entry; an empty entry, or an unset or empty `PATH`, means
    /// the current directory.
    pub fn resolve(&self, command: &str, path_var: Option<&str>) -> Result<PathBuf, ResolveError> {
        if command.is_empty() {
            return Err(ResolveError::NotFound(String::new()));
        }
        if command.contains('/') {
            return Self::check(Path::new(command), command);
        }

        let dirs: Vec<&str> = match path_var {
            Some(p) if !p.is_empty() => p.split(':').collect(),
            _ => vec!["."],
        };

        let mut denied = None;
        for dir in dirs {
            let dir = if dir.is_empty() { "." } else { dir };
            let candidate = Path::new(dir).join(command);
            match Self::check(&candidate, command) {
                Ok(path) => {
                    trace!("resolved {} to {}", command, path.display());
                    return Ok(path);
                }
                Err(e @ ResolveError::PermissionDenied(_)) if denied.is_none() => denied = Some(e),
                Err(_) => {}
            }
        }
        Err(denied.unwrap_or_else(|| ResolveError::NotFound(command.to_string())))
    }

    fn check(path: &Path, command: &str) -> Result<PathBuf, ResolveError> {
        let meta = fs::metadata(path).map_err(|_| ResolveError::NoSuchFile(command.to_string()))?;
        if meta.is_dir() {
            return Err(ResolveError::IsDirectory(command.to_string()));
        }
        if access(path, AccessFlags::X_OK).is_err() {
            return Err(ResolveError::PermissionDenied(command.to_string()));
        }
        Ok(path.to_path_buf())
    }
}
