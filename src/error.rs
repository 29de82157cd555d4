use std::path::PathBuf;

use thiserror::Error;

/// Failures of the unit generation pipeline, one variant per stage that can
/// abort a run.
#[derive(Debug, Error)]
pub enum MkunitError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("template '{name}' not found (searched: {searched})")]
    TemplateNotFound { name: String, searched: String },

    #[error("failed to render {unit}: {reason}")]
    Render { unit: String, reason: String },

    #[error("permission denied writing {}: run as root to install system units", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MkunitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        MkunitError::Validation(msg.into())
    }

    pub fn render(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        MkunitError::Render {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Classify a write failure at `path`.
    pub fn from_write(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            MkunitError::PermissionDenied { path }
        } else {
            MkunitError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn write_failure_maps_permission_denied() {
        let err = MkunitError::from_write(
            PathBuf::from("/etc/systemd/system/x.service"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, MkunitError::PermissionDenied { .. }));
    }

    #[test]
    fn write_failure_keeps_other_io_errors() {
        let err = MkunitError::from_write(
            PathBuf::from("/tmp/x.service"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, MkunitError::Io { .. }));
        assert!(err.to_string().contains("/tmp/x.service"));
    }
}
