use crate::server_error::ServerError;
use derive_more::derive::{Display, Error};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum PathError {
    #[display("requested file {requested:?} escapes the log directory")]
    Traversal { requested: String },
    #[display("requested file {requested:?} does not exist")]
    NotFound { requested: String },
}

impl From<PathError> for ServerError {
    fn from(err: PathError) -> Self {
        let message = match err {
            PathError::Traversal { .. } => "Permission denied",
            PathError::NotFound { .. } => "File does not exist",
        };
        ServerError::bad_request(message)
    }
}

/// Resolves `file_name` inside `log_dir` without touching the filesystem for
/// the `..` handling, then checks that a regular file exists there.
///
/// Absolute names are treated as relative to `log_dir`.
pub fn validate_file_path(log_dir: &Path, file_name: &str) -> Result<PathBuf, PathError> {
    let mut relative = PathBuf::new();
    let mut depth = 0usize;
    for component in Path::new(file_name).components() {
        match component {
            Component::Normal(part) => {
                relative.push(part);
                depth += 1;
            }
            Component::ParentDir if depth > 0 => {
                relative.pop();
                depth -= 1;
            }
            Component::ParentDir => {
                return Err(PathError::Traversal {
                    requested: file_name.to_string(),
                });
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let path = log_dir.join(relative);
    if !path.is_file() {
        return Err(PathError::NotFound {
            requested: file_name.to_string(),
        });
    }
    Ok(path)
}
