use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum RunError {
    Io { path: PathBuf, source: io::Error },
    Core(dakotathon_core::Error),
    Config { path: PathBuf, message: String },
    ConfigNotFound(PathBuf),
    Spawn { program: String, source: io::Error },
    Process { program: String, status: String, stderr: String },
    MissingOutput(PathBuf),
    MissingResponse(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            RunError::Core(e) => write!(f, "{e}"),
            RunError::Config { path, message } => {
                write!(f, "invalid configuration file {}: {message}", path.display())
            }
            RunError::ConfigNotFound(start) => write!(
                f,
                "no {} found in {} or its parents",
                dakotathon_core::DEFAULT_CONFIG_FILE,
                start.display()
            ),
            RunError::Spawn { program, source } => write!(f, "failed to start {program}: {source}"),
            RunError::Process {
                program,
                status,
                stderr,
            } => {
                write!(f, "{program} failed ({status})")?;
                if !stderr.is_empty() {
                    write!(f, ":\n{stderr}")?;
                }
                Ok(())
            }
            RunError::MissingOutput(path) => {
                write!(f, "model output file {} not found", path.display())
            }
            RunError::MissingResponse(label) => {
                write!(f, "no value computed for requested response '{label}'")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Io { source, .. } | RunError::Spawn { source, .. } => Some(source),
            RunError::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<dakotathon_core::Error> for RunError {
    fn from(e: dakotathon_core::Error) -> Self {
        RunError::Core(e)
    }
}

impl RunError {
    /// Adapter for `map_err` that attaches the path an I/O call was for.
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> RunError + '_ {
        move |source| RunError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Last lines of a process's stderr, for error messages.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    const LINES: usize = 10;
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(LINES)..].join("\n")
}
