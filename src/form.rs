use core::fmt;
use core::str::FromStr;

use crate::{Error, Result};

/// Enumeration of the normalization forms a filter can apply.
///
/// The four standard forms are those of
/// [UAX #15](https://www.unicode.org/reports/tr15/). [`Form::NfdMac`] is
/// the decomposed variant used for HFS+ filenames, which leaves some
/// punctuation, symbol and CJK compatibility ranges composed. It can only
/// be produced on hosts where [`Capability::nfd_mac_available`](crate::Capability::nfd_mac_available)
/// is `true`.
///
/// The discriminants are the integer codes accepted by [`parse`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// Pass bytes through unchanged.
    None = 1,
    Nfd = 2,
    Nfkd = 3,
    Nfc = 4,
    Nfkc = 5,
    NfdMac = 6,
}

impl Form {
    /// All forms, in code order.
    pub const ALL: [Form; 6] = [
        Form::None,
        Form::Nfd,
        Form::Nfkd,
        Form::Nfc,
        Form::Nfkc,
        Form::NfdMac,
    ];

    /// Returns the integer code of this form.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the form with the given integer code, if any.
    ///
    /// Code `0` is the disabled sentinel rather than a form, so this
    /// returns [`None`](Option::None) for it; use [`parse`] to tell the
    /// two apart.
    pub const fn from_code(code: i64) -> Option<Form> {
        match code {
            1 => Some(Form::None),
            2 => Some(Form::Nfd),
            3 => Some(Form::Nfkd),
            4 => Some(Form::Nfc),
            5 => Some(Form::Nfkc),
            6 => Some(Form::NfdMac),
            _ => None,
        }
    }

    /// Returns the canonical upper-case name of the form, such as `NFKC`.
    pub const fn name(self) -> &'static str {
        match self {
            Form::None => "NONE",
            Form::Nfd => "NFD",
            Form::Nfkd => "NFKD",
            Form::Nfc => "NFC",
            Form::Nfkc => "NFKC",
            Form::NfdMac => "NFD_MAC",
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of parsing a form identifier.
///
/// The "disabled" sentinel (`0`, `false`, `null` or an empty string) is
/// kept distinct from [`Form::None`] so that callers can tell "don't
/// transform at all" apart from "validate only", even though a filter
/// treats both as pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormSelection {
    Disabled,
    Form(Form),
}

impl FormSelection {
    /// Returns the form to apply, treating [`FormSelection::Disabled`] as
    /// [`Form::None`].
    pub const fn effective(self) -> Form {
        match self {
            FormSelection::Disabled => Form::None,
            FormSelection::Form(form) => form,
        }
    }
}

/// A form identifier as supplied by a caller: either an integer code or a
/// string alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormParam {
    Int(i64),
    Str(String),
}

impl From<i64> for FormParam {
    fn from(value: i64) -> Self {
        FormParam::Int(value)
    }
}

impl From<i32> for FormParam {
    fn from(value: i32) -> Self {
        FormParam::Int(value.into())
    }
}

impl From<&str> for FormParam {
    fn from(value: &str) -> Self {
        FormParam::Str(value.into())
    }
}

impl From<String> for FormParam {
    fn from(value: String) -> Self {
        FormParam::Str(value)
    }
}

impl From<Form> for FormParam {
    fn from(value: Form) -> Self {
        FormParam::Int(value.code().into())
    }
}

impl fmt::Display for FormParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormParam::Int(code) => write!(f, "{code}"),
            FormParam::Str(s) => f.write_str(s),
        }
    }
}

/// Tokens are matched after [`normalize_token`] has been applied, so
/// `"FORM_D"`, `"nf-d"` and `"D"` all arrive here as `"d"`.
const ALIASES: &[(&str, FormSelection)] = {
    use Form::*;
    use FormSelection::Disabled;
    use FormSelection::Form as F;
    &[
        ("", Disabled),
        ("0", Disabled),
        ("false", Disabled),
        ("null", Disabled),
        ("1", F(None)),
        ("none", F(None)),
        ("ignore", F(None)),
        ("validate", F(None)),
        ("validateonly", F(None)),
        ("2", F(Nfd)),
        ("d", F(Nfd)),
        ("decompose", F(Nfd)),
        ("collation", F(Nfd)),
        ("3", F(Nfkd)),
        ("kd", F(Nfkd)),
        ("4", F(Nfc)),
        ("c", F(Nfc)),
        ("compose", F(Nfc)),
        ("recompose", F(Nfc)),
        ("legacy", F(Nfc)),
        ("html5", F(Nfc)),
        ("5", F(Nfkc)),
        ("kc", F(Nfkc)),
        ("matching", F(Nfkc)),
        ("6", F(NfdMac)),
        ("mac", F(NfdMac)),
        ("dmac", F(NfdMac)),
    ]
};

/// Reduces a string identifier to the shape used as a key in [`ALIASES`]:
/// trimmed, lower-cased, without `-`/`_` and without a leading `nf` or
/// `form`.
fn normalize_token(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    // A bare prefix is left alone so that it fails lookup instead of
    // collapsing into the disabled sentinel.
    for prefix in ["form", "nf"] {
        if let Some(rest) = folded.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest.into();
            }
        }
    }
    folded
}

/// Parses a form identifier into a [`FormSelection`].
///
/// Integer codes must be one of `0` (disabled) through `6`
/// ([`Form::NfdMac`]). Strings are matched case-insensitively against a
/// fixed alias table after trimming, dropping `-` and `_`, and stripping a
/// leading `NF` or `FORM`, so `"nfd"`, `"Form-D"`, `"D"`, `"decompose"`
/// and `"collation"` all select [`Form::Nfd`].
///
/// [`Form::NfdMac`] always parses successfully here; whether the host can
/// actually produce it is checked when a filter is attached.
pub fn parse(param: &FormParam) -> Result<FormSelection> {
    match param {
        FormParam::Int(0) => Ok(FormSelection::Disabled),
        FormParam::Int(code) => Form::from_code(*code)
            .map(FormSelection::Form)
            .ok_or_else(|| Error::InvalidForm(code.to_string())),
        FormParam::Str(raw) => {
            let token = normalize_token(raw);
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == token)
                .map(|(_, selection)| *selection)
                .ok_or_else(|| Error::InvalidForm(raw.clone()))
        }
    }
}

impl FromStr for Form {
    type Err = Error;

    /// Parses a string alias into a [`Form`]. Unlike [`parse`] this
    /// rejects the disabled sentinel, since it names no form.
    fn from_str(s: &str) -> Result<Self> {
        match parse(&FormParam::Str(s.into()))? {
            FormSelection::Form(form) => Ok(form),
            FormSelection::Disabled => Err(Error::InvalidForm(s.into())),
        }
    }
}

impl TryFrom<i64> for Form {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Form::from_code(code).ok_or_else(|| Error::InvalidForm(code.to_string()))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Form {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FormVisitor;

        impl serde::de::Visitor<'_> for FormVisitor {
            type Value = Form;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a normalization form code or alias")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> core::result::Result<Form, E> {
                Form::try_from(v).map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> core::result::Result<Form, E> {
                let v = i64::try_from(v).map_err(E::custom)?;
                Form::try_from(v).map_err(E::custom)
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> core::result::Result<Form, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FormVisitor)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Form {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests;
