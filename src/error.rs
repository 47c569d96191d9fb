use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for a generation run. Every variant is fatal for the run.
#[derive(Debug)]
pub enum Error {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigParse {
        file: PathBuf,
        message: String,
        line: Option<usize>,
    },
    SourceParse {
        file: PathBuf,
        message: String,
    },
    Serialization(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(file: impl Into<PathBuf>, err: serde_yaml::Error) -> Self {
        Error::ConfigParse {
            file: file.into(),
            line: err.location().map(|loc| loc.line()),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "IO error on {}: {}", path.display(), source),
            Error::ConfigParse { file, message, .. } => {
                write!(f, "config parse error in {}: {}", file.display(), message)
            }
            Error::SourceParse { file, message } => {
                write!(f, "source parse error in {}: {}", file.display(), message)
            }
            Error::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON serialization failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_carries_line() {
        let err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        let err = Error::config("api.yml", err);

        match &err {
            Error::ConfigParse { line, .. } => assert!(line.is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().starts_with("config parse error in api.yml"));
    }

    #[test]
    fn test_io_error_exposes_source() {
        let err = Error::io(
            "missing.go",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );

        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("missing.go"));
    }
}
