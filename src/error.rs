use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClassError>;

#[derive(Debug, Error)]
pub enum ClassError {
    #[error("{0}")]
    Argument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Visibility(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Archive {
        context: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{0}")]
    Access(String),
}

impl ClassError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn archive(path: &Path, source: zip::result::ZipError) -> Self {
        Self::zip(format!("failed to read archive [{}]", path.display()), source)
    }

    pub fn zip(context: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_visibility(&self) -> bool {
        matches!(self, Self::Visibility(_))
    }
}

pub(crate) fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClassError::Argument(format!("{what} cannot be empty")));
    }
    Ok(())
}
