use std::sync::Arc;

use crate::engine::{NormalizationEngine, RESERVED_BYTE};
use crate::iconv::{self, UTF8, UTF8_MAC};
use crate::{Capability, Error, Form, Result};

/// Produces [`Form::NfdMac`], the decomposed form HFS+ uses for filenames.
///
/// HFS+ decomposes like NFD except for a few ranges (the general
/// punctuation and symbol blocks and the CJK compatibility ideographs)
/// which it leaves composed. This adapter gets there by decomposing to NFD
/// with a [`NormalizationEngine`] and then passing the result through the
/// host's `UTF-8-MAC` transliteration.
///
/// A `MacVariant` can only be obtained through [`MacVariant::new`], which
/// requires a [`Capability`] reporting support.
#[derive(Clone)]
pub struct MacVariant {
    engine: Arc<dyn NormalizationEngine>,
}

impl MacVariant {
    /// Returns an adapter over `engine`, or [`Error::UnsupportedVariant`]
    /// if `capability` says the host can't transliterate to `UTF-8-MAC`.
    pub fn new(engine: Arc<dyn NormalizationEngine>, capability: Capability) -> Result<Self> {
        if !capability.nfd_mac_available() {
            return Err(Error::UnsupportedVariant);
        }
        Ok(MacVariant { engine })
    }

    /// Normalizes complete UTF-8 `text` into [`Form::NfdMac`].
    pub fn normalize(&self, text: &[u8]) -> Result<Vec<u8>> {
        // ASCII has no decompositions.
        if text.is_ascii() {
            return Ok(text.to_vec());
        }
        if text.contains(&RESERVED_BYTE) {
            return Err(Error::EngineFailure(format!(
                "reserved byte {RESERVED_BYTE:#04x} can't be normalized"
            )));
        }
        let nfd = self.engine.normalize(text, Form::Nfd)?;
        iconv::transliterate(UTF8, UTF8_MAC, &nfd)
            .map_err(|err| Error::EngineFailure(format!("UTF-8-MAC transliteration: {err}")))
    }

    /// Returns `true` if `text` is already in [`Form::NfdMac`].
    ///
    /// There is no quick check for this form, so this normalizes the whole
    /// text and compares. That's fine for filenames, which is what this
    /// form is for, but not for bulk text.
    pub fn is_normalized(&self, text: &[u8]) -> bool {
        self.normalize(text)
            .is_ok_and(|normalized| normalized == text)
    }
}

impl core::fmt::Debug for MacVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MacVariant").finish_non_exhaustive()
    }
}
