//! Legacy text grammar for the applied field.
//!
//! Each axis is configured by a static key and a dynamic key:
//!
//! ```text
//! E-x  = n E0 [phi]                  ; n must be 1, or <= 0 for no field
//! E-xt = 1 omega 0                   ; oscillating field
//! E-xt = 3 omega 0 t0 0 sigma 0      ; Gaussian pulse
//! ```
//!
//! The grammars date from a format that allowed several terms per axis; the
//! padding tokens are the phases of those terms. Only a single term per
//! axis is accepted. Parsing is pure: a malformed value is reported as an
//! [`InputError`], never truncated.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

use crate::config::ElectricFieldSection;
use crate::types::Axis;

/// Legacy `key = value` entries after comment stripping.
pub type LegacyEntries = BTreeMap<String, String>;

/// A user-facing configuration error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{key}: only one electric field term is supported for each dimension")]
    MultipleTerms { key: String },

    #[error("{key}: expected exactly one electric field amplitude value")]
    ExpectedOneAmplitude { key: String },

    #[error("{key}: please specify '1 omega 0' for non-pulsed fields")]
    NonPulsedFormat { key: String },

    #[error("{key}: please specify '3 omega 0 t0 0 sigma 0' for pulsed fields")]
    PulsedFormat { key: String },

    #[error("{key}: incomprehensible input for electric field")]
    Incomprehensible { key: String },

    #[error("{key}: '{token}' is not a valid number")]
    InvalidNumber { key: String, token: String },

    #[error("{key}: pulse width must not be negative, got {value}")]
    NegativePulseWidth { key: String, value: f64 },
}

/// Gaussian envelope parameters from a pulsed dynamic entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub center: f64,
    pub width: f64,
}

/// Parameters carried by a dynamic (`E-xt`) entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicParams {
    pub omega: f64,
    pub pulse: Option<Pulse>,
}

/// Legacy static key for `axis` (`E-x`, `E-y`, `E-z`).
pub fn static_key(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "E-x",
        Axis::Y => "E-y",
        Axis::Z => "E-z",
    }
}

/// Legacy dynamic key for `axis` (`E-xt`, `E-yt`, `E-zt`).
pub fn dynamic_key(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "E-xt",
        Axis::Y => "E-yt",
        Axis::Z => "E-zt",
    }
}

/// Legacy keys treat `_` and `-` as the same character.
pub fn normalize_key(key: &str) -> String {
    key.trim().replace('_', "-")
}

/// Parse a static entry into an amplitude (V/nm).
///
/// An empty value or a non-positive count means no field.
pub fn parse_static(key: &str, value: &str) -> Result<f64, InputError> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Ok(0.0);
    };
    let n: i64 = parse_token(key, first)?;
    if n <= 0 {
        return Ok(0.0);
    }
    if n != 1 {
        return Err(InputError::MultipleTerms { key: key.into() });
    }
    // `1 E0` or `1 E0 phi`; the phase is not used.
    if !(2..=3).contains(&tokens.len()) {
        return Err(InputError::ExpectedOneAmplitude { key: key.into() });
    }
    parse_token(key, tokens[1])
}

/// Parse a dynamic entry. An empty value yields `None`.
pub fn parse_dynamic(key: &str, value: &str) -> Result<Option<DynamicParams>, InputError> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let n: i64 = parse_token(key, first)?;
    match n {
        1 => {
            if tokens.len() != 3 {
                return Err(InputError::NonPulsedFormat { key: key.into() });
            }
            Ok(Some(DynamicParams {
                omega: parse_token(key, tokens[1])?,
                pulse: None,
            }))
        }
        3 => {
            if tokens.len() != 7 {
                return Err(InputError::PulsedFormat { key: key.into() });
            }
            Ok(Some(DynamicParams {
                omega: parse_token(key, tokens[1])?,
                pulse: Some(Pulse {
                    center: parse_token(key, tokens[3])?,
                    width: parse_token(key, tokens[5])?,
                }),
            }))
        }
        _ => Err(InputError::Incomprehensible { key: key.into() }),
    }
}

/// Convert the legacy field entries into a structured section.
///
/// Entries unrelated to the field are ignored.
pub fn transform_entries(entries: &LegacyEntries) -> Result<ElectricFieldSection, InputError> {
    let mut section = ElectricFieldSection::default();
    apply_entries(entries, &mut section)?;
    Ok(section)
}

/// Merge the legacy field entries into an existing section.
pub fn apply_entries(entries: &LegacyEntries, section: &mut ElectricFieldSection) -> Result<(), InputError> {
    for axis in Axis::ALL {
        let target = section.axis_mut(axis);

        let key = static_key(axis);
        if let Some(value) = lookup(entries, key) {
            target.e0 = parse_static(key, value)?;
        }

        let key = dynamic_key(axis);
        if let Some(value) = lookup(entries, key) {
            if let Some(params) = parse_dynamic(key, value)? {
                target.omega = params.omega;
                if let Some(pulse) = params.pulse {
                    target.t0 = pulse.center;
                    target.sigma = pulse.width;
                }
            }
        }
    }
    Ok(())
}

fn lookup<'a>(entries: &'a LegacyEntries, key: &str) -> Option<&'a str> {
    entries
        .iter()
        .rev()
        .find(|(k, _)| normalize_key(k) == key)
        .map(|(_, v)| v.as_str())
}

fn parse_token<T: FromStr>(key: &str, token: &str) -> Result<T, InputError> {
    token.parse().map_err(|_| InputError::InvalidNumber {
        key: key.into(),
        token: token.into(),
    })
}
