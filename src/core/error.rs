use std::fmt::{Display, Debug};
#[cfg(debug_assertions)]
use std::{backtrace::{Backtrace, BacktraceStatus}, sync::Arc};
use super::{Status, CL_BUILD_PROGRAM_FAILURE};

pub type Result<T> = ::std::result::Result<T, Error>;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A platform call returned a non-success status.
    Platform { function: &'static str, status: Status },
    /// The platform binding could not be initialized (no platforms, or the platform query failed).
    BackendUnavailable,
    /// Enumeration succeeded but no device is available to run on.
    NoDevices,
    /// The requested operands can't be offloaded with the configured tile.
    ShapeUnsupported,
}

#[derive(Clone)]
#[non_exhaustive]
pub struct Error {
    pub kind: ErrorKind,
    pub desc: Option<String>,
    #[cfg(debug_assertions)]
    pub backtrace: Arc<Backtrace>
}

impl Error {
    #[inline(always)]
    pub fn new (kind: ErrorKind, desc: impl ToString) -> Self {
        Self::from_parts(kind, Some(desc.to_string()))
    }

    #[inline(always)]
    pub fn from_kind (kind: ErrorKind) -> Self {
        Self::from_parts(kind, None)
    }

    #[inline(always)]
    pub fn platform (function: &'static str, status: Status) -> Self {
        Self::from_kind(ErrorKind::Platform { function, status })
    }

    #[inline(always)]
    fn from_parts (kind: ErrorKind, desc: Option<String>) -> Self {
        Self {
            kind,
            desc,
            #[cfg(debug_assertions)]
            backtrace: Arc::new(Backtrace::capture())
        }
    }

    /// Appends a context line to the description.
    pub fn attach (mut self, line: impl Display) -> Self {
        match self.desc {
            Some(ref mut desc) => {
                desc.push('\n');
                desc.push_str(&line.to_string());
            },
            None => self.desc = Some(line.to_string())
        }

        self
    }

    /// Name of the failing platform call, if this is a platform failure.
    #[inline]
    pub fn function (&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::Platform { function, .. } => Some(function),
            _ => None
        }
    }

    /// Raw platform status, if this is a platform failure.
    #[inline]
    pub fn status (&self) -> Option<Status> {
        match self.kind {
            ErrorKind::Platform { status, .. } => Some(status),
            _ => None
        }
    }

    #[inline(always)]
    pub fn is_build_failure (&self) -> bool {
        self.status() == Some(CL_BUILD_PROGRAM_FAILURE)
    }
}

impl From<ErrorKind> for Error {
    #[inline(always)]
    fn from (kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform { function, status } => write!(f, "Function {function} code {} ({})", status.name(), status.code()),
            Self::BackendUnavailable => f.write_str("compute backend unavailable"),
            Self::NoDevices => f.write_str("no compute devices found"),
            Self::ShapeUnsupported => f.write_str("shape unsupported")
        }
    }
}

impl Display for Error {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.kind, f)?;

        if let Some(ref desc) = self.desc {
            write!(f, ": {desc}")?;
        }

        Ok(())
    }
}

impl Debug for Error {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)?;

        #[cfg(debug_assertions)]
        if self.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\n{}", self.backtrace)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
