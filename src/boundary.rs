use unicode_normalization::char::canonical_combining_class;

use crate::{Error, Form, NormalizationEngine, Result};

/// No UTF-8 sequence is longer than this.
pub(crate) const MAX_SEQUENCE_LEN: usize = 4;

/// Once this many bytes would be held back waiting for the end of a
/// normalization segment, they are emitted anyway.
///
/// Text in the Unicode Stream-Safe Text Format never has more than 30
/// non-starters in a row, so this only triggers for degenerate input.
pub(crate) const MAX_DEFERRED_BYTES: usize = 128;

/// The shape of a single byte within UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteKind {
    /// `0xxxxxxx`: a complete one-byte sequence.
    Single,
    /// The first byte of a sequence of the given length (2, 3 or 4).
    Leader(usize),
    /// `10xxxxxx`: any byte after the first in a multi-byte sequence.
    Continuation,
    /// A byte that never appears in UTF-8.
    Invalid,
}

impl ByteKind {
    pub(crate) const fn of(b: u8) -> Self {
        match b {
            0x00..=0x7F => ByteKind::Single,
            0x80..=0xBF => ByteKind::Continuation,
            // 0xC0 and 0xC1 could only start overlong encodings.
            0xC2..=0xDF => ByteKind::Leader(2),
            0xE0..=0xEF => ByteKind::Leader(3),
            0xF0..=0xF4 => ByteKind::Leader(4),
            _ => ByteKind::Invalid,
        }
    }

    /// Returns the length of the sequence a byte of this kind starts, if
    /// it starts one.
    pub(crate) const fn sequence_len(self) -> Option<usize> {
        match self {
            ByteKind::Single => Some(1),
            ByteKind::Leader(n) => Some(n),
            ByteKind::Continuation | ByteKind::Invalid => None,
        }
    }
}

fn malformed(chunk: &[u8], offset: usize) -> Error {
    Error::MalformedInput {
        offset,
        byte: chunk[offset],
    }
}

/// Returns the length of the longest prefix of `chunk` that doesn't end
/// in the middle of a codepoint.
///
/// Only the first byte and the last (at most) four bytes are inspected;
/// the rest is left for the caller to validate. A chunk that starts on a
/// continuation byte, or whose tail can't be the start of some valid
/// UTF-8 sequence, is [`Error::MalformedInput`].
pub(crate) fn aligned_len(chunk: &[u8]) -> Result<usize> {
    let Some(&first) = chunk.first() else {
        return Err(Error::EmptyChunk);
    };
    if ByteKind::of(first).sequence_len().is_none() {
        return Err(malformed(chunk, 0));
    }

    let mut scanned = 0;
    for pos in (0..chunk.len()).rev().take(MAX_SEQUENCE_LEN) {
        scanned += 1;
        let declared = match ByteKind::of(chunk[pos]) {
            ByteKind::Continuation => continue,
            ByteKind::Invalid => return Err(malformed(chunk, pos)),
            ByteKind::Single => 1,
            ByteKind::Leader(n) => n,
        };
        return if declared == scanned {
            Ok(chunk.len())
        } else if declared > scanned {
            Ok(pos)
        } else {
            // More continuation bytes follow than the leader announced.
            Err(malformed(chunk, pos + declared))
        };
    }

    // Only reachable when the last four bytes are all continuations.
    Err(malformed(chunk, chunk.len() - scanned))
}

/// Checks that `bytes` is UTF-8 as a whole, reporting the first bad byte
/// relative to the start of `bytes`.
pub(crate) fn validate(bytes: &[u8]) -> Result<&str> {
    core::str::from_utf8(bytes).map_err(|err| malformed(bytes, err.valid_up_to()))
}

/// Returns the length of the longest prefix of `text` that normalizes the
/// same way on its own as it does followed by any further text.
///
/// This is the offset of the last codepoint in `text` where a new
/// normalization segment can begin. If that would hold back
/// [`MAX_DEFERRED_BYTES`] or more, the cut moves forward to the last
/// starter instead. A boundary followed only by non-starters leaves
/// nothing better to cut at, so then all of `text` is emitted.
pub(crate) fn stable_len(text: &str, engine: &dyn NormalizationEngine, form: Form) -> usize {
    let boundary = text
        .char_indices()
        .rev()
        .find(|&(_, c)| engine.is_stable_boundary(c, form))
        .map_or(0, |(pos, _)| pos);
    if text.len() - boundary < MAX_DEFERRED_BYTES {
        return boundary;
    }
    let starter = text
        .char_indices()
        .rev()
        .find(|&(_, c)| canonical_combining_class(c) == 0)
        .map_or(0, |(pos, _)| pos);
    if starter > boundary {
        log::debug!(
            "{form}: no normalization boundary in the last {} bytes, cutting before the last starter",
            text.len() - boundary
        );
        return starter;
    }
    log::warn!(
        "{form}: {} bytes of non-starters in a row, emitting them anyway",
        text.len() - boundary
    );
    text.len()
}
