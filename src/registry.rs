use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::form::{self, FormParam, FormSelection};
use crate::{Capability, Error, FilterSession, NormalizationEngine, Result, UnicodeEngine};

/// A set of named normalization transforms that streams can attach to.
///
/// Registering a name `n` makes both `n` itself and the family `n.*`
/// available. A member of the family names its form in the suffix, so with
/// `"normalize"` registered, attaching `"normalize.nfd-mac"` without a
/// parameter produces an [`Form::NfdMac`](crate::Form::NfdMac) filter.
///
/// The registry carries the [`Capability`] and [`NormalizationEngine`]
/// that every session it creates uses.
pub struct Registry {
    names: BTreeSet<String>,
    engine: Arc<dyn NormalizationEngine>,
    capability: Capability,
}

impl Registry {
    /// Constructs an empty registry using [`UnicodeEngine`] and the
    /// capabilities detected on this host.
    pub fn new() -> Self {
        Self::with_engine(Arc::new(UnicodeEngine), Capability::detect())
    }

    /// Constructs an empty registry using the given engine and
    /// capabilities.
    pub fn with_engine(engine: Arc<dyn NormalizationEngine>, capability: Capability) -> Self {
        Registry {
            names: BTreeSet::new(),
            engine,
            capability,
        }
    }

    /// Returns the capabilities sessions from this registry are built with.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Registers the transform `name` along with the family `name.*`.
    ///
    /// Returns `false`, and changes nothing, if `name` was already
    /// registered.
    pub fn register(&mut self, name: &str) -> bool {
        let added = self.names.insert(name.to_owned());
        if added {
            log::debug!("registered normalization transforms {name:?} and \"{name}.*\"");
        }
        added
    }

    /// Returns `true` if `transform` names a registered transform or a
    /// member of a registered family.
    pub fn is_registered(&self, transform: &str) -> bool {
        self.claim(transform).is_some()
    }

    /// Finds the registration that `transform` belongs to, returning the
    /// form suffix if it came from a family.
    fn claim<'a>(&self, transform: &'a str) -> Option<Option<&'a str>> {
        if self.names.contains(transform) {
            return Some(None);
        }
        // Names may themselves contain dots. Try the split points from the
        // right so that the longest registered name claims the transform.
        transform
            .rmatch_indices('.')
            .map(|(pos, _)| (&transform[..pos], &transform[pos + 1..]))
            .find(|(base, _)| self.names.contains(*base))
            .map(|(_, suffix)| Some(suffix))
    }

    /// Creates a filter session for the registered `transform`.
    ///
    /// The form comes from `param` when given, or else from the dotted
    /// suffix of `transform`. The disabled sentinel produces a
    /// pass-through session.
    ///
    /// Fails with [`Error::NotRegistered`] if no registration claims
    /// `transform`, [`Error::MissingForm`] if there's neither a parameter
    /// nor a suffix, [`Error::InvalidForm`] if the form doesn't parse, and
    /// [`Error::UnsupportedVariant`] for [`Form::NfdMac`](crate::Form::NfdMac) on hosts that
    /// can't produce it.
    pub fn attach(&self, transform: &str, param: Option<FormParam>) -> Result<FilterSession> {
        let suffix = self
            .claim(transform)
            .ok_or_else(|| Error::NotRegistered(transform.to_owned()))?;
        let param = match (param, suffix) {
            (Some(param), _) => param,
            (None, Some(suffix)) if !suffix.is_empty() => FormParam::Str(suffix.to_owned()),
            (None, _) => return Err(Error::MissingForm(transform.to_owned())),
        };
        let selection = form::parse(&param)?;
        if selection == FormSelection::Disabled {
            log::debug!("{transform}: normalization disabled by {param:?}");
        }
        let session =
            FilterSession::new(selection.effective(), self.engine.clone(), self.capability)?;
        log::debug!("{transform}: attached {} filter", session.form());
        Ok(session)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names)
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}

fn global() -> MutexGuard<'static, Registry> {
    static GLOBAL: OnceLock<Mutex<Registry>> = OnceLock::new();
    let registry = GLOBAL.get_or_init(|| Mutex::new(Registry::new()));
    // Registration can't leave the set half-updated, so a poisoned lock
    // still guards a usable registry.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registers `name` (and `name.*`) in the process-wide registry.
///
/// Returns `false` if it was already registered.
pub fn register(name: &str) -> bool {
    global().register(name)
}

/// Attaches a transform from the process-wide registry.
///
/// See [`Registry::attach`].
pub fn attach(transform: &str, param: Option<FormParam>) -> Result<FilterSession> {
    global().attach(transform, param)
}
