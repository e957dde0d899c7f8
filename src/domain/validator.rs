//! Post-match validators for regex patterns.
//!
//! Validators are named in configuration and resolved to this closed set
//! when the configuration is written; an unknown name is a configuration
//! error, never a silent no-op at detection time.

use crate::error::{AnonymizerError, AnonymizerResult};
use std::fmt;
use std::str::FromStr;

/// Israeli mobile prefixes accepted by [`Validator::ValidPhonePrefix`].
pub const MOBILE_PREFIXES: [&str; 6] = ["050", "052", "053", "054", "055", "058"];

/// A named check applied to a regex match before it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validator {
    /// Israeli ID weighted-digit checksum (mod 10).
    IsraeliIdChecksum,
    /// Rejects values made of a single repeated digit.
    NotAllSameDigit,
    /// Accepts Israeli mobile numbers only.
    ValidPhonePrefix,
    /// Luhn checksum for payment card numbers.
    Luhn,
}

impl Validator {
    pub const ALL: [Validator; 4] = [
        Validator::IsraeliIdChecksum,
        Validator::NotAllSameDigit,
        Validator::ValidPhonePrefix,
        Validator::Luhn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::IsraeliIdChecksum => "israeli_id_checksum",
            Self::NotAllSameDigit => "not_all_same_digit",
            Self::ValidPhonePrefix => "valid_phone_prefix",
            Self::Luhn => "luhn",
        }
    }

    /// Runs the check against matched text.
    pub fn validate(&self, value: &str) -> bool {
        match self {
            Self::IsraeliIdChecksum => israeli_id_checksum(value),
            Self::NotAllSameDigit => not_all_same_digit(value),
            Self::ValidPhonePrefix => valid_phone_prefix(value),
            Self::Luhn => luhn(value),
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Validator {
    type Err = AnonymizerError;

    fn from_str(name: &str) -> AnonymizerResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name() == name)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|v| v.name()).collect();
                AnonymizerError::config(
                    format!("validator '{}'", name),
                    format!("unknown validator, expected one of {}", known.join(", ")),
                )
            })
    }
}

fn digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Israeli ID checksum.
///
/// IDs are 9 digits; shorter values (5-8 digits) are left-padded with zeros
/// since leading zeros are commonly dropped in print. Odd positions are
/// doubled and their digits summed; the total must be divisible by 10.
pub fn israeli_id_checksum(value: &str) -> bool {
    let mut ds = digits(value);
    if ds.len() < 5 || ds.len() > 9 {
        return false;
    }
    while ds.len() < 9 {
        ds.insert(0, 0);
    }

    let total: u32 = ds
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let n = if i % 2 == 1 { d * 2 } else { d };
            if n > 9 {
                n / 10 + n % 10
            } else {
                n
            }
        })
        .sum();

    total % 10 == 0
}

/// Computes the check digit that completes an 8-digit Israeli ID body.
pub fn israeli_id_check_digit(body: &[u32; 8]) -> u32 {
    let total: u32 = body
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let n = if i % 2 == 1 { d * 2 } else { d };
            if n > 9 {
                n / 10 + n % 10
            } else {
                n
            }
        })
        .sum();
    (10 - total % 10) % 10
}

pub fn not_all_same_digit(value: &str) -> bool {
    let ds = digits(value);
    match ds.first() {
        Some(first) => ds.iter().any(|d| d != first),
        None => false,
    }
}

pub fn valid_phone_prefix(value: &str) -> bool {
    let ds: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    ds.len() >= 10 && MOBILE_PREFIXES.iter().any(|p| ds.starts_with(p))
}

pub fn luhn(value: &str) -> bool {
    let ds = digits(value);
    if ds.len() < 12 || ds.len() > 19 {
        return false;
    }

    let checksum: u32 = ds
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    checksum % 10 == 0
}
