//! Deterministic fake values for types without a replacement pool.
//!
//! Digits are drawn from a SHA-256 digest of the original value and an
//! attempt counter, so one original always yields the same fake and a
//! collision can be retried with the next attempt.

use crate::domain::validator::{israeli_id_check_digit, MOBILE_PREFIXES};
use crate::domain::PiiType;
use sha2::{Digest, Sha256};

/// Digit source seeded from an original value.
pub struct HashDigits {
    bytes: [u8; 32],
    pos: usize,
}

impl HashDigits {
    pub fn new(original: &str, attempt: u32) -> Self {
        let digest = Sha256::new()
            .chain_update(original.as_bytes())
            .chain_update(attempt.to_le_bytes())
            .finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self { bytes, pos: 0 }
    }

    /// Next value in `0..bound`. Wraps around the digest when exhausted.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        let byte = self.bytes[self.pos % self.bytes.len()];
        self.pos += 1;
        u32::from(byte) % bound.max(1)
    }

    pub fn next_digit(&mut self) -> u32 {
        self.next_below(10)
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| char::from_digit(self.next_digit(), 10).unwrap_or('0'))
            .collect()
    }
}

/// Index into a collection of `len` items chosen by hashing `original`.
pub fn hash_index(original: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let digest = Sha256::digest(original.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(head) % len as u64) as usize
}

/// Kinds of values that can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    IsraeliId,
    Phone,
    Email,
    BankAccount,
    BankBranch,
    CaseNumber,
    License,
}

impl Generator {
    pub fn for_type(pii_type: &PiiType) -> Option<Self> {
        match pii_type {
            PiiType::Id => Some(Self::IsraeliId),
            PiiType::Phone => Some(Self::Phone),
            PiiType::Email => Some(Self::Email),
            PiiType::Other(tag) => match tag.as_str() {
                "BANK_ACCOUNT" => Some(Self::BankAccount),
                "BANK_BRANCH" => Some(Self::BankBranch),
                "CASE_NUMBER" => Some(Self::CaseNumber),
                "LICENSE" => Some(Self::License),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn generate(&self, original: &str, attempt: u32) -> String {
        let mut rng = HashDigits::new(original, attempt);
        match self {
            Self::IsraeliId => {
                let mut body = [0u32; 8];
                for d in body.iter_mut() {
                    *d = rng.next_digit();
                }
                let mut id: String = body
                    .iter()
                    .map(|&d| char::from_digit(d, 10).unwrap_or('0'))
                    .collect();
                id.push(char::from_digit(israeli_id_check_digit(&body), 10).unwrap_or('0'));
                id
            }
            Self::Phone => {
                let prefix = MOBILE_PREFIXES[rng.next_below(MOBILE_PREFIXES.len() as u32) as usize];
                format!("{}-{}", prefix, rng.digits(7))
            }
            Self::Email => format!("user{}@example.com", 100 + rng.next_below(900)),
            Self::BankAccount => rng.digits(7),
            Self::BankBranch => (100 + rng.next_below(900)).to_string(),
            Self::CaseNumber => rng.digits(8),
            Self::License => rng.digits(5),
        }
    }
}
