//! Unicode normalization for UTF-8 byte streams that arrive in arbitrary
//! chunks.
//!
//! Normalization can't be applied to a stream one read at a time without
//! some care: a read may end in the middle of a multi-byte UTF-8 sequence,
//! or between a letter and a combining accent that the next read will
//! deliver. Normalizing each read on its own would then either fail or
//! produce different bytes than normalizing the text as a whole.
//!
//! [`FilterSession`] is the main type in this library. Construct one for
//! each stream, typically via [`Registry::attach`] or [`attach`], and then
//! present it the stream's bytes chunk by chunk. Each call normalizes as
//! much as can safely be normalized and tells you how many bytes it used;
//! the rest is yours to present again at the start of the next chunk. The
//! session itself doesn't buffer anything, so how to manage those few
//! leftover bytes is left entirely up to the caller. The [`io`] module has
//! ready-made [`std::io::Write`] and [`std::io::Read`] adapters that do it
//! for you.
//!
//! ```
//! use normalization_filter::Registry;
//!
//! let mut registry = Registry::new();
//! registry.register("normalize");
//! let mut session = registry.attach("normalize.nfc", None).unwrap();
//!
//! // "déjà" in decomposed form, split inside the first accent.
//! let first = session.filter(b"de\xCC").unwrap();
//! let mut rest = b"de\xCC"[first.consumed..].to_vec();
//! rest.extend_from_slice(b"\x81ja\xCC\x80");
//! let second = session.filter(&rest).unwrap();
//! let tail = session.finish(&rest[second.consumed..]).unwrap();
//!
//! let all = [first.output, second.output, tail].concat();
//! assert_eq!(all, "déjà".as_bytes());
//! ```
//!
//! # Forms
//!
//! Besides the four standard forms of
//! [UAX #15](https://www.unicode.org/reports/tr15/), filters can produce
//! [`Form::NfdMac`], the variant of NFD that HFS+ uses for filenames. That
//! one relies on the host's `iconv` supporting the `UTF-8-MAC` charset,
//! which [`Capability::detect`] checks once per process. Asking for it on
//! a host without that support fails with [`Error::UnsupportedVariant`]
//! rather than quietly falling back to plain NFD.
//!
//! Forms are usually chosen by name or number from configuration, so
//! [`form::parse`] accepts a generous set of aliases: `"nfd"`, `"D"`,
//! `"form_d"`, `"decompose"` and `2` all mean [`Form::Nfd`], for example.
//!
//! # Normalization engine
//!
//! The actual normalization algorithm comes from the
//! [`unicode-normalization`](https://docs.rs/unicode-normalization) crate
//! through [`UnicodeEngine`]. Another implementation of
//! [`NormalizationEngine`] can be used instead by constructing a
//! [`Registry`] with [`Registry::with_engine`].

use std::sync::Arc;

mod boundary;
mod capability;
mod engine;
mod error;
mod filter;
pub mod form;
mod iconv;
pub mod io;
mod mac;
mod registry;

pub use capability::{Capability, nfd_mac_available};
pub use engine::{NormalizationEngine, UnicodeEngine};
pub use error::{Error, Result};
pub use filter::{FilterSession, Filtered, State};
pub use form::{Form, FormParam, FormSelection};
pub use mac::MacVariant;
pub use registry::{Registry, attach, register};

/// Normalizes a whole string into `form`.
///
/// [`Form::NfdMac`] fails with [`Error::UnsupportedVariant`] on hosts that
/// can't produce it.
pub fn normalize(text: &str, form: Form) -> Result<String> {
    let bytes = match form {
        Form::NfdMac => mac_variant()?.normalize(text.as_bytes())?,
        _ => UnicodeEngine.normalize(text.as_bytes(), form)?,
    };
    String::from_utf8(bytes).map_err(|err| Error::EngineFailure(err.to_string()))
}

/// Returns `true` if `text` is already in `form`.
///
/// Always `false` for [`Form::NfdMac`] on hosts that can't produce it.
pub fn is_normalized(text: &str, form: Form) -> bool {
    match form {
        Form::NfdMac => mac_variant().is_ok_and(|mac| mac.is_normalized(text.as_bytes())),
        _ => UnicodeEngine.is_normalized(text.as_bytes(), form),
    }
}

fn mac_variant() -> Result<MacVariant> {
    MacVariant::new(Arc::new(UnicodeEngine), Capability::detect())
}
