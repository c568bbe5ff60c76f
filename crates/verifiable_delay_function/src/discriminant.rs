// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Deterministic discriminant derivation from a challenge seed.

use crate::fiat_shamir::{expand, SEARCH_LIMIT};
use crate::VdfError;

/// Smallest supported discriminant width.
pub(crate) const MIN_DISCRIMINANT_BITS: u32 = 512;

const DISCRIMINANT_TAG: &[u8] = b"vdf_discriminant";

/// Security levels expressed in bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityLevel {
    SecLvl112,
    SecLvl128,
}

impl From<SecurityLevel> for u32 {
    fn from(level: SecurityLevel) -> Self {
        match level {
            SecurityLevel::SecLvl112 => 112,
            SecurityLevel::SecLvl128 => 128,
        }
    }
}

/// Discriminant width matching the classical hardness of the level, following
/// the usual estimates for class groups of imaginary quadratic fields.
pub fn discriminant_bit_size(level: SecurityLevel) -> u32 {
    match level {
        SecurityLevel::SecLvl112 => 1348,
        SecurityLevel::SecLvl128 => 1827,
    }
}

/// Derives a negative prime discriminant of exactly `length_bits` bits from a
/// challenge seed.
///
/// Candidate `k` takes the first `ceil(length_bits / 8)` bytes of
/// `expand(DISCRIMINANT_TAG, k, challenge)`, clears the excess high bits,
/// forces bit `length_bits - 1` so the width is exact and forces the three low
/// bits so the magnitude is 7 mod 8. The first candidate with a prime
/// magnitude yields `D = -magnitude`, which is then 1 mod 8 as required for
/// the group to contain [`crate::generator`].
///
/// The search is deterministic, so the same challenge and width reproduce the
/// same discriminant on any host.
///
/// # Errors
///
/// [`VdfError::Parameter`] when `length_bits` is below 512, and
/// [`VdfError::SearchExhausted`] when no candidate below [`SEARCH_LIMIT`] has
/// a prime magnitude.
pub fn create_discriminant<Z: crate::z::Z>(
    challenge: &[u8],
    length_bits: u32,
) -> Result<Z, VdfError> {
    if length_bits < MIN_DISCRIMINANT_BITS {
        return Err(VdfError::Parameter("discriminant width below 512 bits"));
    }
    let length = (length_bits as usize).div_ceil(8);
    let excess = (8 - length_bits % 8) % 8;
    for counter in 0..SEARCH_LIMIT {
        let mut bytes = expand(DISCRIMINANT_TAG, counter, &[challenge], length);
        bytes[0] &= 0xff >> excess;
        bytes[0] |= 0x80 >> excess;
        bytes[length - 1] |= 0b111;
        let magnitude = Z::from_bytes_be(bytes, true);
        if magnitude.is_prime() {
            return Ok(magnitude.neg());
        }
    }
    Err(VdfError::SearchExhausted(SEARCH_LIMIT))
}

/// [`create_discriminant`] with the width picked from a security level.
pub fn create_discriminant_for_level<Z: crate::z::Z>(
    challenge: &[u8],
    level: SecurityLevel,
) -> Result<Z, VdfError> {
    create_discriminant(challenge, discriminant_bit_size(level))
}

/// Serializes a discriminant as the big-endian bytes of its magnitude, with
/// no leading zero byte.
pub fn encode_discriminant<Z: crate::z::Z>(discriminant: &Z) -> Result<Vec<u8>, VdfError> {
    if !discriminant.neg().is_positive() {
        return Err(VdfError::Parameter("discriminant must be negative"));
    }
    let (bytes, _) = discriminant.to_bytes_be();
    Ok(bytes)
}

/// Deserializes a discriminant produced by [`encode_discriminant`], checking
/// the width and congruence invariants but not primality.
pub fn decode_discriminant<Z: crate::z::Z + PartialEq>(bytes: &[u8]) -> Result<Z, VdfError> {
    if bytes.is_empty() {
        return Err(VdfError::Encoding("empty discriminant"));
    }
    if bytes[0] == 0 {
        return Err(VdfError::Encoding("discriminant has a leading zero byte"));
    }
    let magnitude = Z::from_bytes_be(bytes.to_vec(), true);
    if magnitude.bit_size() < MIN_DISCRIMINANT_BITS as u64 {
        return Err(VdfError::Parameter("discriminant width below 512 bits"));
    }
    if magnitude.take_mod(&Z::from(8)) != Z::from(7) {
        return Err(VdfError::Encoding("discriminant magnitude is not 7 mod 8"));
    }
    Ok(magnitude.neg())
}

#[cfg(test)]
#[cfg(feature = "gmp")]
mod tests {
    use super::*;
    use crate::z::Z;
    use rug::Integer;

    #[test]
    fn test_discriminant_is_reproducible() {
        let challenge = hex::decode("6c3b9aa767f785b537c0").unwrap();
        let d: Integer = create_discriminant(&challenge, 512).unwrap();
        let again: Integer = create_discriminant(&challenge, 512).unwrap();
        assert_eq!(d, again);
        assert!(d.is_negative());
        assert_eq!(d.bit_size(), 512);
        let magnitude = Z::abs(&d);
        assert!(magnitude.is_prime());
        assert_eq!(magnitude.take_mod(&Integer::from(8)), Integer::from(7));
        assert_eq!(d.take_mod(&Integer::from(8)), Integer::from(1));
    }

    #[test]
    fn test_distinct_challenges_give_distinct_discriminants() {
        let a: Integer = create_discriminant(b"first seed", 512).unwrap();
        let b: Integer = create_discriminant(b"second seed", 512).unwrap();
        assert_ne!(a, b);
        let wide: Integer = create_discriminant(b"first seed", 520).unwrap();
        assert_eq!(wide.bit_size(), 520);
        assert_ne!(a, wide);
    }

    #[test]
    fn test_rejects_undersized_widths() {
        for bits in [0u32, 8, 256, 511] {
            assert!(matches!(
                create_discriminant::<Integer>(b"seed", bits),
                Err(VdfError::Parameter(_))
            ));
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let d: Integer = create_discriminant(b"codec seed", 512).unwrap();
        let bytes = encode_discriminant(&d).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(decode_discriminant::<Integer>(&bytes).unwrap(), d);

        assert!(decode_discriminant::<Integer>(&[]).is_err());
        let mut padded = vec![0u8];
        padded.extend_from_slice(&bytes);
        assert!(decode_discriminant::<Integer>(&padded).is_err());
        let mut wrong_congruence = bytes.clone();
        *wrong_congruence.last_mut().unwrap() &= !0b111;
        assert!(decode_discriminant::<Integer>(&wrong_congruence).is_err());
        assert!(encode_discriminant(&Z::abs(&d)).is_err());
    }

    #[test]
    fn test_security_levels() {
        assert_eq!(u32::from(SecurityLevel::SecLvl112), 112);
        assert_eq!(u32::from(SecurityLevel::SecLvl128), 128);
        assert_eq!(discriminant_bit_size(SecurityLevel::SecLvl112), 1348);
        assert_eq!(discriminant_bit_size(SecurityLevel::SecLvl128), 1827);
        let d: Integer =
            create_discriminant_for_level(b"level seed", SecurityLevel::SecLvl112).unwrap();
        assert_eq!(d.bit_size(), 1348);
    }
}
