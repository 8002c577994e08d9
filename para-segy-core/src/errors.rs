use crate::keys::TraceField;

/// Basic Error types.
#[derive(Debug)]
pub enum PsgError {
    /// TryFromSliceError from the std library.
    TryFromSlice(std::array::TryFromSliceError),
    /// IoError from the std library.
    StdIoError(std::io::Error),
    /// Opening an IO driver against a missing path.
    FileNotFound { path: String, source: std::io::Error },
    /// A failure in the underlying transport read/write/resize/sync.
    IoError { msg: String },
    /// A previous transport error has poisoned the file session.
    SessionFailed { msg: String },
    /// The file does not have a consistent SEG-Y shape.
    CorruptFile { msg: String },
    /// Metadata get/set for a key not in the container, or with the wrong
    /// native type.
    EntryNotFound { field: TraceField },
    /// A byte range falls outside of `[0, size)` of the backing object, or
    /// no SEG-Y coordinate scalar can represent a value as an i32.
    OutOfRange { msg: String },
    /// A number format the library cannot read or write.
    UnsupportedFormat { code: u16 },
    /// Bit converter cannot fulfil the conversion.
    BitConversionError { msg: String },
    #[cfg(feature = "to_json")]
    /// Serialisation/Deserialisation error.
    SerdeError(serde_json::Error),
}

impl From<std::array::TryFromSliceError> for PsgError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        Self::TryFromSlice(e)
    }
}

impl From<std::io::Error> for PsgError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl std::fmt::Display for PsgError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::PsgError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => write!(fmt, "{}", x),
            TryFromSlice(x) => write!(fmt, "{}", x),
            StdIoError(x) => write!(fmt, "{}", x),
            FileNotFound { path, source } => write!(fmt, "Could not open '{}': {}", path, source),
            IoError { msg } => write!(fmt, "Transport failure: {}", msg),
            SessionFailed { msg } => write!(fmt, "File session failed previously: {}", msg),
            CorruptFile { msg } => write!(fmt, "Corrupt SEG-Y: {}", msg),
            EntryNotFound { field } => write!(fmt, "Metadata entry {:?} not found (the key is absent or holds another type)", field),
            OutOfRange { msg } => write!(fmt, "Out of range: {}", msg),
            UnsupportedFormat { code } => write!(fmt, "Number format {} is not supported (only IBM fp32 (1) and IEEE fp32 (5) are)", code),
            BitConversionError { msg } => write!(fmt, "Bit conversion failed: {}", msg),
        }
    }
}

impl From<PsgError> for String {
    fn from(e: PsgError) -> String {
        e.to_string()
    }
}

impl std::error::Error for PsgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::PsgError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => x.source(),
            StdIoError(x) => x.source(),
            FileNotFound { source, .. } => source.source(),
            TryFromSlice(x) => x.source(),
            _ => None,
        }
    }
}
