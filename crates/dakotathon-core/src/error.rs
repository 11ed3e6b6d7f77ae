use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A block or configuration setting Dakota would reject.
    InvalidConfig(String),
    /// Malformed text in a parameters file, output file or template.
    Parse { line: usize, message: String },
    /// A template placeholder with no value to substitute.
    MissingParameter(String),
    UnknownStatistic(String),
    /// A `kind` name that does not match any method, variables, interface,
    /// responses or plugin kind.
    UnknownKind { section: &'static str, name: String },
    /// Two lists that must pair up element-wise have different lengths.
    Mismatch {
        what: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Error::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Error::MissingParameter(name) => write!(f, "no value for template parameter '{name}'"),
            Error::UnknownStatistic(name) => write!(f, "unknown statistic '{name}'"),
            Error::UnknownKind { section, name } => write!(f, "unknown {section} kind '{name}'"),
            Error::Mismatch {
                what,
                expected,
                found,
            } => write!(f, "{what}: expected {expected} entries, found {found}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Error::Mismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
