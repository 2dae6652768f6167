use std::io;

/// Errors produced while resolving a normalization form, attaching a
/// filter, or filtering a stream.
///
/// None of these represent transient conditions, so nothing in this crate
/// retries after receiving one. Errors returned from
/// [`FilterSession::filter`](crate::FilterSession::filter) or
/// [`FilterSession::finish`](crate::FilterSession::finish) mean that the
/// stream can no longer be normalized and the host should treat it as
/// broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The given form identifier is not a known code or alias.
    #[error("invalid normalization form/mode: {0:?}")]
    InvalidForm(String),

    /// [`Form::NfdMac`](crate::Form::NfdMac) was requested but the host
    /// cannot produce it.
    #[error("the NFD_MAC normalization form is not supported on this host")]
    UnsupportedVariant,

    /// The input is not valid UTF-8 at the given offset of the chunk.
    #[error("malformed UTF-8 input at offset {offset} (byte {byte:#04x})")]
    MalformedInput { offset: usize, byte: u8 },

    /// The normalization engine or the host transliteration rejected the
    /// input.
    #[error("normalization failed: {0}")]
    EngineFailure(String),

    /// The stream ended while the last codepoint was still incomplete.
    #[error("end of input in the middle of a codepoint ({pending} pending bytes)")]
    EndOfInputMidCodepoint { pending: usize },

    /// The filter was invoked with nothing to filter.
    #[error("filter invoked with an empty chunk")]
    EmptyChunk,

    /// No transform with the given name (or name family) is registered.
    #[error("no normalization transform registered as {0:?}")]
    NotRegistered(String),

    /// The transform was attached without a form parameter and its name
    /// carries no form suffix.
    #[error("invalid normalization form/mode: none given for {0:?}")]
    MissingForm(String),

    /// The session already saw the end of its stream.
    #[error("filter session is closed")]
    Closed,
}

impl Error {
    /// Returns `true` for errors that abort an already-flowing stream, as
    /// opposed to errors reported while a transform is being resolved or
    /// attached.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MalformedInput { .. }
                | Error::EngineFailure(_)
                | Error::EndOfInputMidCodepoint { .. }
                | Error::EmptyChunk
                | Error::Closed
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::MalformedInput { .. } | Error::EndOfInputMidCodepoint { .. } => {
                io::ErrorKind::InvalidData
            }
            Error::InvalidForm(_) | Error::MissingForm(_) => io::ErrorKind::InvalidInput,
            Error::UnsupportedVariant => io::ErrorKind::Unsupported,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Shorthand for results whose error is this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
