use std::error::Error as StdError;
use std::fmt;
use std::io;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    OutOfMemory,
    InvalidArgument,
    TransferFault,
    NotSupported,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    offset: Option<i128>,
    index: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            offset: None,
            index: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Stream offset the failing operation targeted, when there was one.
    pub fn offset(&self) -> Option<i128> {
        self.offset
    }

    /// Record index the failing operation targeted, when there was one.
    pub fn index(&self) -> Option<u64> {
        self.index
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_offset(mut self, offset: impl Into<i128>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(index) = self.index {
            write!(f, " (index: {index})")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {offset})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::OutOfMemory => io::ErrorKind::OutOfMemory,
            ErrorKind::InvalidArgument | ErrorKind::Usage => io::ErrorKind::InvalidInput,
            ErrorKind::NotSupported => io::ErrorKind::Unsupported,
            ErrorKind::TransferFault | ErrorKind::Io | ErrorKind::Internal => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::OutOfMemory => 3,
        ErrorKind::InvalidArgument => 4,
        ErrorKind::TransferFault => 5,
        ErrorKind::NotSupported => 6,
        ErrorKind::Io => 7,
    }
}

/// OS error number an outer device layer reports for `kind`.
pub fn to_errno(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::OutOfMemory => libc::ENOMEM,
        ErrorKind::InvalidArgument | ErrorKind::Usage => libc::EINVAL,
        ErrorKind::TransferFault => libc::EFAULT,
        ErrorKind::NotSupported => libc::ENOTTY,
        ErrorKind::Io | ErrorKind::Internal => libc::EIO,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_errno, to_exit_code};
    use std::io;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::OutOfMemory, 3),
            (ErrorKind::InvalidArgument, 4),
            (ErrorKind::TransferFault, 5),
            (ErrorKind::NotSupported, 6),
            (ErrorKind::Io, 7),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn errno_mapping_matches_device_abi() {
        assert_eq!(to_errno(ErrorKind::OutOfMemory), libc::ENOMEM);
        assert_eq!(to_errno(ErrorKind::InvalidArgument), libc::EINVAL);
        assert_eq!(to_errno(ErrorKind::TransferFault), libc::EFAULT);
        assert_eq!(to_errno(ErrorKind::NotSupported), libc::ENOTTY);
        assert_eq!(to_errno(ErrorKind::Io), libc::EIO);
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::InvalidArgument)
            .with_message("seek target out of range")
            .with_offset(-3i64);
        assert_eq!(
            err.to_string(),
            "InvalidArgument: seek target out of range (offset: -3)"
        );
    }

    #[test]
    fn io_conversion_keeps_kind_and_source() {
        let err = Error::new(ErrorKind::InvalidArgument).with_message("bad whence");
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);
        let inner = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<Error>())
            .expect("inner error");
        assert_eq!(inner.kind(), ErrorKind::InvalidArgument);
    }
}
