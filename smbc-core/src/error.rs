use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum SMBCError {
    FormatError(SMBCFormatError),
    AuthorizationError(SMBCAuthorizationError),
    ConfigurationError(SMBCConfigurationError),
    Cancelled(SMBCCancelledError),
    IOError(SMBCIOError),
}

impl SMBCError {
    pub fn format_error<T: Into<SMBCFormatError>>(error: T) -> Self {
        Self::FormatError(error.into())
    }

    pub fn authorization_error<T: Into<SMBCAuthorizationError>>(error: T) -> Self {
        Self::AuthorizationError(error.into())
    }

    pub fn configuration_error<T: Into<SMBCConfigurationError>>(error: T) -> Self {
        Self::ConfigurationError(error.into())
    }

    pub fn cancelled<T: Into<SMBCCancelledError>>(error: T) -> Self {
        Self::Cancelled(error.into())
    }

    pub fn io_error<T: Into<SMBCIOError>>(error: T) -> Self {
        Self::IOError(error.into())
    }

    /// True when the transport rejected the supplied credentials, either explicitly or
    /// through a permission-class I/O failure (EACCES / EPERM).
    pub fn is_authorization_failure(&self) -> bool {
        match self {
            Self::AuthorizationError(_) => true,
            Self::IOError(x) => x.kind() == TransportErrorKind::PermissionDenied,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Folds a permission-class I/O failure into an `AuthorizationError` that keeps the
    /// I/O error as its cause. Every other error is returned unchanged.
    pub fn into_authorization_error(self) -> Self {
        match self {
            Self::IOError(x) if x.kind() == TransportErrorKind::PermissionDenied => {
                Self::AuthorizationError(SMBCAuthorizationError::with_cause("permission denied", Self::IOError(x)))
            }
            other => other,
        }
    }
}

#[derive(Debug)]
pub struct SMBCFormatError {
    error: Box<dyn Error + Send + Sync>,
}

impl<T: Into<Box<dyn Error + Send + Sync>>> From<T> for SMBCFormatError {
    fn from(value: T) -> Self {
        Self {
            error: value.into()
        }
    }
}

impl Display for SMBCFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Malformed security descriptor: {}", self.error)
    }
}

#[derive(Debug)]
pub struct SMBCAuthorizationError {
    message: String,
    cause: Option<Box<SMBCError>>,
}

impl SMBCAuthorizationError {
    pub fn with_cause<T: Into<String>>(message: T, cause: SMBCError) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The transport failure the rejection was reported through, if any.
    pub fn cause(&self) -> Option<&SMBCError> {
        self.cause.as_deref()
    }
}

impl<T: Into<String>> From<T> for SMBCAuthorizationError {
    fn from(value: T) -> Self {
        Self {
            message: value.into(),
            cause: None,
        }
    }
}

impl Display for SMBCAuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "Credentials rejected: {} ({})", self.message, cause),
            None => write!(f, "Credentials rejected: {}", self.message),
        }
    }
}

#[derive(Debug)]
pub struct SMBCConfigurationError {
    message: String,
    cause: Option<Box<SMBCError>>,
}

impl SMBCConfigurationError {
    pub fn with_cause<T: Into<String>>(message: T, cause: SMBCError) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn cause(&self) -> Option<&SMBCError> {
        self.cause.as_deref()
    }
}

impl<T: Into<String>> From<T> for SMBCConfigurationError {
    fn from(value: T) -> Self {
        Self {
            message: value.into(),
            cause: None,
        }
    }
}

impl Display for SMBCConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "Negotiator misconfigured: {} ({})", self.message, cause),
            None => write!(f, "Negotiator misconfigured: {}", self.message),
        }
    }
}

#[derive(Debug)]
pub struct SMBCCancelledError {
    server: String,
}

impl<T: Into<String>> From<T> for SMBCCancelledError {
    fn from(value: T) -> Self {
        Self {
            server: value.into()
        }
    }
}

impl Display for SMBCCancelledError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Authentication for {} was cancelled by the user", self.server)
    }
}

/// Transport failure categories, following the errno classes libsmbclient reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    PermissionDenied,
    NoEntry,
    Exists,
    NotEmpty,
    TimedOut,
    NoSpace,
    NotDirectory,
    ConnectionRefused,
    InvalidArgument,
    OutOfMemory,
    Other,
}

impl From<io::ErrorKind> for TransportErrorKind {
    fn from(value: io::ErrorKind) -> Self {
        match value {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::NoEntry,
            io::ErrorKind::AlreadyExists => Self::Exists,
            io::ErrorKind::DirectoryNotEmpty => Self::NotEmpty,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::StorageFull => Self::NoSpace,
            io::ErrorKind::NotADirectory => Self::NotDirectory,
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::InvalidInput => Self::InvalidArgument,
            io::ErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::Other,
        }
    }
}

#[derive(Debug)]
pub struct SMBCIOError {
    error: io::Error,
}

impl SMBCIOError {
    pub fn kind(&self) -> TransportErrorKind {
        self.error.kind().into()
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        self.error.raw_os_error()
    }
}

impl<T: Into<io::Error>> From<T> for SMBCIOError {
    fn from(value: T) -> Self {
        Self {
            error: value.into()
        }
    }
}

impl Display for SMBCIOError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMB transport operation failed ({:?}): {}", self.kind(), self.error)
    }
}

impl Display for SMBCError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FormatError(x) => write!(f, "{}", x),
            Self::AuthorizationError(x) => write!(f, "{}", x),
            Self::ConfigurationError(x) => write!(f, "{}", x),
            Self::Cancelled(x) => write!(f, "{}", x),
            Self::IOError(x) => write!(f, "{}", x)
        }
    }
}

impl std::error::Error for SMBCError {}

impl From<io::Error> for SMBCError {
    fn from(value: io::Error) -> Self {
        Self::io_error(value)
    }
}

impl<I: std::fmt::Debug> From<nom::Err<nom::error::Error<I>>> for SMBCError {
    fn from(err: nom::Err<nom::error::Error<I>>) -> Self {
        match err {
            nom::Err::Error(x) | nom::Err::Failure(x) => {
                Self::format_error(format!("unexpected input {:?} ({:?})", x.input, x.code))
            }
            nom::Err::Incomplete(_) => Self::format_error("truncated input"),
        }
    }
}
