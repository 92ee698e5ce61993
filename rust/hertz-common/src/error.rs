use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_range(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::OutOfRange {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn overflow(context: impl Into<String>) -> Error {
        Error(
            ErrorKind::Overflow {
                context: context.into(),
            }
            .into(),
        )
    }

    pub fn out_of_memory(bytes: usize) -> Error {
        Error(ErrorKind::OutOfMemory { bytes }.into())
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidOperation { .. })
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfRange { .. })
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self.kind(), ErrorKind::Overflow { .. })
    }

    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfMemory { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("{name} out of range: {message}")]
    OutOfRange { name: String, message: String },

    #[error("arithmetic overflow computing {context}")]
    Overflow { context: String },

    #[error("failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
