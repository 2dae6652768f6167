use std::sync::Arc;

use crate::boundary::{self, aligned_len};
use crate::{Capability, Error, Form, MacVariant, NormalizationEngine, Result};

/// A normalizing filter bound to one stream.
///
/// This is a filter tailored for streaming input that arrives in chunks of
/// arbitrary size, such as from a socket or a pipe. It does not keep any
/// text buffers of its own: each call to [`Self::filter`] normalizes as
/// much of the given chunk as it safely can and reports how many bytes it
/// consumed, and the caller is responsible for presenting the unconsumed
/// remainder again at the start of the next chunk. When the stream ends,
/// whatever remains is handed to [`Self::finish`].
///
/// A chunk is never split in the middle of a codepoint, and also never
/// just before a combining mark or other codepoint that could change how
/// the text before it normalizes. Feeding a text through a filter in any
/// number of chunks therefore produces exactly the same bytes as
/// normalizing it in one go.
///
/// [`crate::io::NormalizingWriter`] and [`crate::io::NormalizingReader`]
/// implement that caller side for [`std::io`] streams.
///
/// Every method takes `&mut self`, so a session is only ever driven by one
/// thread at a time. Independent sessions share nothing.
pub struct FilterSession {
    form: Form,
    state: State,
    engine: Arc<dyn NormalizationEngine>,
    mac: Option<MacVariant>,
}

/// The lifecycle of a [`FilterSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Accepting chunks.
    Active,
    /// The stream ended, or a fatal error made it unusable.
    Closed,
}

/// What a call to [`FilterSession::filter`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filtered {
    /// The normalized form of `chunk[..consumed]`.
    pub output: Vec<u8>,
    /// How many bytes at the start of the chunk were used. The rest must be
    /// presented again, ahead of the next chunk.
    pub consumed: usize,
}

impl FilterSession {
    /// Constructs a new session in the [`State::Active`] state that
    /// normalizes to `form`.
    ///
    /// Returns [`Error::UnsupportedVariant`] for [`Form::NfdMac`] unless
    /// `capability` reports support for it. There's no fallback to plain
    /// NFD in that case because the result would differ from what HFS+
    /// expects.
    pub fn new(
        form: Form,
        engine: Arc<dyn NormalizationEngine>,
        capability: Capability,
    ) -> Result<Self> {
        let mac = match form {
            Form::NfdMac => Some(MacVariant::new(engine.clone(), capability)?),
            _ => None,
        };
        Ok(FilterSession {
            form,
            state: State::Active,
            engine,
            mac,
        })
    }

    /// Returns the form this session normalizes to, fixed at creation.
    pub fn form(&self) -> Form {
        self.form
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Normalizes the longest safe prefix of `chunk`.
    ///
    /// The prefix stops before any incomplete codepoint at the end of the
    /// chunk and before the last codepoint that could still combine with
    /// whatever comes next. With [`Form::None`] the whole chunk is passed
    /// through without looking at it, so it need not even be UTF-8.
    ///
    /// An empty chunk, a chunk that doesn't start on a codepoint, invalid
    /// UTF-8, and a failure of the normalization engine are all fatal: the
    /// session moves to [`State::Closed`] and rejects further calls.
    pub fn filter(&mut self, chunk: &[u8]) -> Result<Filtered> {
        self.ensure_active()?;
        let result = self.filter_chunk(chunk);
        if result.is_err() {
            self.state = State::Closed;
        }
        result
    }

    fn filter_chunk(&self, chunk: &[u8]) -> Result<Filtered> {
        if chunk.is_empty() {
            return Err(Error::EmptyChunk);
        }
        if self.form == Form::None {
            return Ok(Filtered {
                output: chunk.to_vec(),
                consumed: chunk.len(),
            });
        }

        let aligned = aligned_len(chunk)?;
        let text = boundary::validate(&chunk[..aligned])?;
        let consumed = boundary::stable_len(text, &*self.engine, self.form);
        let output = self.normalize(&chunk[..consumed])?;
        log::trace!(
            "{}: consumed {consumed} of {} bytes, produced {}",
            self.form,
            chunk.len(),
            output.len()
        );
        Ok(Filtered { output, consumed })
    }

    /// Ends the stream, normalizing the `remainder` that earlier calls to
    /// [`Self::filter`] left unconsumed.
    ///
    /// Returns [`Error::EndOfInputMidCodepoint`] if the remainder ends
    /// with an incomplete codepoint. The session is closed afterwards
    /// either way.
    pub fn finish(&mut self, remainder: &[u8]) -> Result<Vec<u8>> {
        self.ensure_active()?;
        self.state = State::Closed;
        if remainder.is_empty() || self.form == Form::None {
            return Ok(remainder.to_vec());
        }

        let aligned = aligned_len(remainder)?;
        if aligned < remainder.len() {
            return Err(Error::EndOfInputMidCodepoint {
                pending: remainder.len() - aligned,
            });
        }
        boundary::validate(remainder)?;
        self.normalize(remainder)
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            State::Active => Ok(()),
            State::Closed => Err(Error::Closed),
        }
    }

    fn normalize(&self, text: &[u8]) -> Result<Vec<u8>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        match &self.mac {
            Some(mac) => mac.normalize(text),
            None => self.engine.normalize(text, self.form),
        }
    }
}

impl core::fmt::Debug for FilterSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FilterSession")
            .field("form", &self.form)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
