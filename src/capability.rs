use std::sync::OnceLock;

use crate::iconv::{self, UTF8, UTF8_MAC};

/// `"déjà"` with precomposed letters.
pub(crate) const PROBE_COMPOSED: &[u8] = b"d\xC3\xA9j\xC3\xA0";
/// `"déjà"` as HFS+ stores it, with combining accents.
pub(crate) const PROBE_MAC: &[u8] = b"de\xCC\x81ja\xCC\x80";

static DETECTED: OnceLock<Capability> = OnceLock::new();

/// What the current host can do beyond the standard normalization forms.
///
/// The only such capability today is producing
/// [`Form::NfdMac`](crate::Form::NfdMac), which relies on the host's
/// `iconv` knowing the `UTF-8-MAC` charset. [`Capability::detect`] probes
/// for that once per process; the result is a plain value that can be
/// handed to a [`Registry`](crate::Registry) explicitly, which also lets
/// tests pretend to be on a different host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    nfd_mac: bool,
}

impl Capability {
    /// Returns the capabilities of the current host.
    ///
    /// The probe runs on the first call only, even if several threads
    /// race to make it; everyone else gets the cached answer.
    pub fn detect() -> Self {
        *DETECTED.get_or_init(|| {
            let nfd_mac = probe_nfd_mac();
            log::debug!("host UTF-8-MAC transliteration available: {nfd_mac}");
            Capability { nfd_mac }
        })
    }

    /// Returns a capability set with nothing beyond the standard forms.
    pub const fn standard_only() -> Self {
        Capability { nfd_mac: false }
    }

    /// Returns a capability set that claims `UTF-8-MAC` support whether
    /// or not the host really has it.
    ///
    /// Filters built from this on a host without `iconv` support will fail
    /// at their first non-ASCII chunk with
    /// [`Error::EngineFailure`](crate::Error::EngineFailure).
    pub const fn assume_nfd_mac() -> Self {
        Capability { nfd_mac: true }
    }

    /// Returns `true` if [`Form::NfdMac`](crate::Form::NfdMac) can be
    /// produced.
    pub const fn nfd_mac_available(self) -> bool {
        self.nfd_mac
    }
}

/// Checks that the host converts the composed probe text into exactly the
/// HFS+ probe text and back again.
fn probe_nfd_mac() -> bool {
    let to_mac = iconv::transliterate(UTF8, UTF8_MAC, PROBE_COMPOSED);
    let from_mac = iconv::transliterate(UTF8_MAC, UTF8, PROBE_MAC);
    match (to_mac, from_mac) {
        (Ok(mac), Ok(composed)) => mac == PROBE_MAC && composed == PROBE_COMPOSED,
        (Err(err), _) | (_, Err(err)) => {
            log::trace!("UTF-8-MAC probe failed: {err}");
            false
        }
    }
}

/// Returns `true` if this host supports [`Form::NfdMac`](crate::Form::NfdMac).
///
/// Shorthand for `Capability::detect().nfd_mac_available()`.
pub fn nfd_mac_available() -> bool {
    Capability::detect().nfd_mac_available()
}
