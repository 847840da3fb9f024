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

    pub fn out_of_range(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::OutOfRange {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn corrupt_data(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptData {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn encoding_unsupported(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::EncodingUnsupported {
                message: message.into(),
            }
            .into(),
        )
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

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfRange { .. })
    }

    pub fn is_corrupt_data(&self) -> bool {
        matches!(self.kind(), ErrorKind::CorruptData { .. })
    }

    pub fn is_encoding_unsupported(&self) -> bool {
        matches!(self.kind(), ErrorKind::EncodingUnsupported { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The numeric domain cannot be represented by the chosen encoder.
    #[error("value out of range for '{name}': {message}")]
    OutOfRange { name: String, message: String },

    /// Malformed or truncated input met while decompressing or decoding.
    #[error("corrupt data in '{element}': {message}")]
    CorruptData { element: String, message: String },

    /// A maker was asked to encode a value outside of its declared capability.
    #[error("encoding unsupported: {message}")]
    EncodingUnsupported { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("destination buffer is too small")]
    DestBufferTooSmall,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
