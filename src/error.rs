use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::config::Tracepoint;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can stop the probe from getting attached.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to remove memlock limit: {0}")]
    Memlock(#[source] io::Error),

    #[error("failed to load eBPF spec from {}: {source}", .path.display())]
    Spec {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("failed to load eBPF collection: {0}")]
    Instantiate(#[source] LoadError),

    #[error("program '{0}' not found in eBPF collection")]
    ProgramNotFound(String),

    #[error("failed to attach '{program}' to tracepoint {tracepoint}: {source}")]
    Attach {
        program: String,
        tracepoint: Tracepoint,
        #[source]
        source: BoxError,
    },
}

impl ProbeError {
    /// The verifier rejection behind a load failure, if that is what it was.
    pub fn verifier(&self) -> Option<&VerifierError> {
        match self {
            ProbeError::Spec { source, .. } | ProbeError::Instantiate(source) => source.verifier(),
            _ => None,
        }
    }

    /// Log lines for the operator. A verifier rejection gets its full log
    /// first.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(verifier) = self.verifier() {
            lines.push(format!("Verifier error: {:#}", verifier));
        }
        lines.push(self.to_string());
        lines
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Verifier(VerifierError),

    #[error("{0}")]
    Other(#[source] BoxError),
}

impl LoadError {
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        LoadError::Other(err.into())
    }

    pub fn verifier(&self) -> Option<&VerifierError> {
        match self {
            LoadError::Verifier(err) => Some(err),
            LoadError::Other(_) => None,
        }
    }
}

/// The kernel verifier refused a program.
///
/// `{}` gives a one-line summary, `{:#}` prints the whole verifier log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierError {
    pub errno: Option<i32>,
    pub program: Option<String>,
    pub reason: Option<String>,
    pub log: Vec<String>,
}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("verifier rejected program")?;
        if let Some(program) = &self.program {
            write!(f, " '{}'", program)?;
        }
        match (&self.reason, self.errno) {
            (Some(reason), _) => write!(f, ": {}", reason)?,
            (None, Some(errno)) => write!(f, ": {}", io::Error::from_raw_os_error(errno))?,
            (None, None) => {}
        }

        if f.alternate() {
            for line in &self.log {
                write!(f, "\n\t{}", line)?;
            }
        } else if let Some(last) = self.log.last() {
            write!(f, " ({} log lines, last: {})", self.log.len(), last)?;
        }

        Ok(())
    }
}

impl std::error::Error for VerifierError {}
