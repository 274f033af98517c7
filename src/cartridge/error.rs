use std::fmt;
use std::io;

/// Errors from getting a ROM image off disk. Distinct from `CoreError`:
/// these happen before any emulator state exists.
#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    MissingExtension,
    InvalidExtension {
        expected: &'static str,
        found: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "I/O error: {}", err),
            LoadError::MissingExtension => write!(f, "ROM file has no extension"),
            LoadError::InvalidExtension { expected, found } => write!(
                f,
                "Invalid ROM file extension: expected '{}', found '{}'",
                expected, found
            ),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_missing_extension() {
        let err = LoadError::MissingExtension;
        assert_eq!(format!("{}", err), "ROM file has no extension");
    }

    #[test]
    fn test_display_invalid_extension() {
        let err = LoadError::InvalidExtension {
            expected: ".gb or .gbc",
            found: "txt".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Invalid ROM file extension: expected '.gb or .gbc', found 'txt'"
        );
    }

    #[test]
    fn test_display_io_error() {
        let io_err = std::io::Error::other("oh no");
        let err = LoadError::Io(io_err);
        assert!(format!("{}", err).contains("I/O error: oh no"));
    }
}
