//! Stream hosts that splice a [`FilterSession`] into [`std::io`] pipelines.
//!
//! A [`FilterSession`] never buffers anything itself, so something has to
//! hold on to the bytes it leaves unconsumed and present them again with
//! the next chunk. The adapters in this module do that for any [`Write`]
//! or [`Read`] implementation.

use std::io::{self, Read, Write};

use crate::FilterSession;

const CHUNK_SIZE: usize = 8 * 1024;

/// A writer that normalizes everything written to it before passing it on
/// to an inner writer.
///
/// Output lags input by at most a few codepoints, held back until it's
/// clear they can't combine with what follows. Call [`Self::finish`] at
/// the end of the stream to normalize and write those too. Dropping the
/// writer without finishing it discards them.
#[derive(Debug)]
pub struct NormalizingWriter<W: Write> {
    inner: W,
    session: FilterSession,
    pending: Vec<u8>,
}

impl<W: Write> NormalizingWriter<W> {
    pub fn new(inner: W, session: FilterSession) -> Self {
        NormalizingWriter {
            inner,
            session,
            pending: Vec::new(),
        }
    }

    /// Returns a reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns the number of bytes written but not yet normalized.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Normalizes and writes out whatever is still pending, then returns
    /// the inner writer.
    ///
    /// Fails with [`io::ErrorKind::InvalidData`] if the input ended in the
    /// middle of a codepoint.
    pub fn finish(self) -> io::Result<W> {
        let NormalizingWriter {
            mut inner,
            mut session,
            pending,
        } = self;
        let tail = session.finish(&pending)?;
        inner.write_all(&tail)?;
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for NormalizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.pending.extend_from_slice(buf);
        let filtered = self.session.filter(&self.pending)?;
        self.inner.write_all(&filtered.output)?;
        self.pending.drain(..filtered.consumed);
        Ok(buf.len())
    }

    /// Flushes the inner writer. Bytes still held back by the filter are
    /// not written; only [`NormalizingWriter::finish`] can do that.
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader that normalizes everything read from an inner reader.
///
/// The final, held-back codepoints are normalized and returned when the
/// inner reader reports end of file. An error from the filter is returned
/// from `read` as [`io::ErrorKind::InvalidData`] (or
/// [`io::ErrorKind::Other`] for engine failures), after which the reader
/// keeps failing.
#[derive(Debug)]
pub struct NormalizingReader<R: Read> {
    inner: R,
    session: FilterSession,
    pending: Vec<u8>,
    out: Vec<u8>,
    out_pos: usize,
    eof: bool,
}

impl<R: Read> NormalizingReader<R> {
    pub fn new(inner: R, session: FilterSession) -> Self {
        NormalizingReader {
            inner,
            session,
            pending: Vec::new(),
            out: Vec::new(),
            out_pos: 0,
            eof: false,
        }
    }

    /// Returns a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns the inner reader, discarding anything not yet returned.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Refills `out` with the next normalized bytes. Leaves it empty only
    /// at the end of the stream.
    fn fill(&mut self) -> io::Result<()> {
        self.out.clear();
        self.out_pos = 0;
        let mut chunk = [0; CHUNK_SIZE];
        while self.out.is_empty() && !self.eof {
            let n = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if n == 0 {
                self.out = self.session.finish(&self.pending)?;
                self.pending.clear();
                self.eof = true;
                break;
            }
            self.pending.extend_from_slice(&chunk[..n]);
            let filtered = self.session.filter(&self.pending)?;
            self.pending.drain(..filtered.consumed);
            self.out = filtered.output;
        }
        Ok(())
    }
}

impl<R: Read> Read for NormalizingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.out_pos == self.out.len() {
            self.fill()?;
        }
        let available = &self.out[self.out_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.out_pos += n;
        Ok(n)
    }
}
