/// Error type shared by the rendering pipeline and its loaders
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// Camera parameters that cannot produce an orthonormal basis
    DegenerateCamera(String),
    /// A light direction of zero length
    DegenerateLight,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed mesh content; `line` is 1-based, 0 when the format has no lines
    Parse { line: usize, message: String },
    Image(image::ImageError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DegenerateCamera(reason) => write!(f, "degenerate camera: {}", reason),
            Error::DegenerateLight => write!(f, "light direction has zero length"),
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Parse { line: 0, message } => write!(f, "parse error: {}", message),
            Error::Parse { line, message } => {
                write!(f, "parse error on line {}: {}", line, message)
            }
            Error::Image(e) => write!(f, "image error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let e = Error::parse(12, "bad face index");
        assert_eq!(e.to_string(), "parse error on line 12: bad face index");

        let e = Error::parse(0, "file too small");
        assert_eq!(e.to_string(), "parse error: file too small");
    }
}
