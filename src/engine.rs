use unicode_normalization::char::{
    canonical_combining_class, decompose_canonical, decompose_compatible,
};
use unicode_normalization::{IsNormalized, UnicodeNormalization};

use crate::{Error, Form, Result};

/// The reserved byte that no normalization form accepts.
pub(crate) const RESERVED_BYTE: u8 = 0xFF;

/// Implements the Unicode normalization algorithm itself.
///
/// A [`FilterSession`](crate::FilterSession) only decides *which* bytes are
/// safe to normalize; the actual (de)composition is delegated to an
/// implementation of this trait. [`UnicodeEngine`] is the implementation
/// used unless the caller supplies another one to
/// [`Registry::with_engine`](crate::Registry::with_engine).
///
/// Engines deal only in the four standard forms and [`Form::None`]. The
/// HFS+ variant is layered on top of an engine by
/// [`MacVariant`](crate::MacVariant).
pub trait NormalizationEngine: Send + Sync {
    /// Normalizes `text`, which must be complete UTF-8, into `form`.
    fn normalize(&self, text: &[u8], form: Form) -> Result<Vec<u8>>;

    /// Returns `true` if `text` is already in `form`.
    fn is_normalized(&self, text: &[u8], form: Form) -> bool;

    /// Returns `true` if normalizing the text before `c` separately from
    /// the text starting at `c` gives the same result as normalizing both
    /// together, for every possible surrounding text.
    fn is_stable_boundary(&self, c: char, form: Form) -> bool;
}

/// A [`NormalizationEngine`] backed by the `unicode-normalization` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeEngine;

impl UnicodeEngine {
    fn checked_str(text: &[u8]) -> Result<&str> {
        if let Some(pos) = text.iter().position(|&b| b == RESERVED_BYTE) {
            return Err(Error::EngineFailure(format!(
                "reserved byte {RESERVED_BYTE:#04x} at offset {pos}"
            )));
        }
        core::str::from_utf8(text).map_err(|err| Error::EngineFailure(err.to_string()))
    }
}

impl NormalizationEngine for UnicodeEngine {
    fn normalize(&self, text: &[u8], form: Form) -> Result<Vec<u8>> {
        if form == Form::None {
            return Ok(text.to_vec());
        }
        let s = Self::checked_str(text)?;
        let out: String = match form {
            Form::None => s.to_owned(),
            Form::Nfd => s.nfd().collect(),
            Form::Nfkd => s.nfkd().collect(),
            Form::Nfc => s.nfc().collect(),
            Form::Nfkc => s.nfkc().collect(),
            Form::NfdMac => {
                return Err(Error::EngineFailure(
                    "NFD_MAC requires the host transliteration adapter".into(),
                ));
            }
        };
        Ok(out.into_bytes())
    }

    fn is_normalized(&self, text: &[u8], form: Form) -> bool {
        let Ok(s) = Self::checked_str(text) else {
            return false;
        };
        match form {
            Form::None => true,
            Form::Nfd => unicode_normalization::is_nfd(s),
            Form::Nfkd => unicode_normalization::is_nfkd(s),
            Form::Nfc => unicode_normalization::is_nfc(s),
            Form::Nfkc => unicode_normalization::is_nfkc(s),
            Form::NfdMac => false,
        }
    }

    fn is_stable_boundary(&self, c: char, form: Form) -> bool {
        let lead = match form {
            Form::None => return true,
            Form::Nfd | Form::Nfc | Form::NfdMac => leading_char(c, false),
            Form::Nfkd | Form::Nfkc => leading_char(c, true),
        };
        // Whatever `c` decomposes to must begin with a starter, or it gets
        // reordered into the text before it.
        let Some(lead) = lead.filter(|&lead| is_starter(lead)) else {
            return false;
        };
        let once = core::iter::once(lead);
        match form {
            // Composition can still join a "Maybe" starter, such as a Hangul
            // vowel or trailing consonant, onto what precedes it.
            Form::Nfc => unicode_normalization::is_nfc_quick(once) != IsNormalized::Maybe,
            Form::Nfkc => unicode_normalization::is_nfkc_quick(once) != IsNormalized::Maybe,
            _ => true,
        }
    }
}

/// Returns the first character of the full decomposition of `c`.
fn leading_char(c: char, compatible: bool) -> Option<char> {
    let mut first = None;
    let mut keep = |d: char| {
        first.get_or_insert(d);
    };
    if compatible {
        decompose_compatible(c, &mut keep);
    } else {
        decompose_canonical(c, &mut keep);
    }
    first
}

fn is_starter(c: char) -> bool {
    canonical_combining_class(c) == 0
}
