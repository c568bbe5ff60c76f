// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Fiat-Shamir challenge derivation over class group transcripts.

use std::fmt::Debug;

use crate::bqf::{BinaryQuadraticForm, BQF};
use crate::VdfError;

/// Bit length of the challenge prime, 2 * 128 bits of soundness plus a margin.
pub(crate) const CHALLENGE_PRIME_BITS: u32 = 264;

/// Candidates tried before a bounded derivation is declared unsound.
pub(crate) const SEARCH_LIMIT: u64 = 1 << 16;

const PRIME_TAG: &[u8] = b"vdf_challenge_prime";
const INT_TAG: &[u8] = b"vdf_challenge_int";

/// Expands `tag || counter || parts` into `length` bytes with the blake3 XOF.
pub(crate) fn expand(tag: &[u8], counter: u64, parts: &[&[u8]], length: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(tag);
    hasher.update(&counter.to_be_bytes());
    for part in parts {
        hasher.update(part);
    }
    let mut bytes = vec![0u8; length];
    hasher.finalize_xof().fill(&mut bytes);
    bytes
}

fn transcript<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    output: &BQF<Z>,
) -> Vec<u8> {
    let (discriminant_bytes, _) = discriminant.to_bytes_be();
    let mut bytes = discriminant_bytes;
    bytes.extend_from_slice(&input.to_bytes());
    bytes.extend_from_slice(&output.to_bytes());
    bytes
}

/// Derives the prime challenge binding an evaluation `(input, output)` to its
/// discriminant.
///
/// Candidate `k` is `expand(PRIME_TAG, k, transcript)` truncated to 33 bytes,
/// with the top and bottom bits forced so that every candidate is odd and
/// exactly [`CHALLENGE_PRIME_BITS`] wide. The first probable prime wins, so
/// the result is reproducible from the transcript alone.
///
/// # Errors
///
/// [`VdfError::SearchExhausted`] if no candidate below [`SEARCH_LIMIT`] is
/// prime, which indicates a broken hash configuration rather than bad input.
pub fn hash_prime<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    output: &BQF<Z>,
) -> Result<Z, VdfError> {
    let transcript = transcript(discriminant, input, output);
    let length = (CHALLENGE_PRIME_BITS as usize).div_ceil(8);
    for counter in 0..SEARCH_LIMIT {
        let mut bytes = expand(PRIME_TAG, counter, &[&transcript], length);
        bytes[0] |= 0x80;
        bytes[length - 1] |= 1;
        let candidate = Z::from_bytes_be(bytes, true);
        if candidate.is_prime() {
            return Ok(candidate);
        }
    }
    Err(VdfError::SearchExhausted(SEARCH_LIMIT))
}

/// Derives a deterministic integer below `2^bound_bits` from the same
/// transcript as [`hash_prime`], under a separate domain tag.
pub fn hash_int<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    output: &BQF<Z>,
    bound_bits: u32,
) -> Result<Z, VdfError> {
    if bound_bits == 0 {
        return Err(VdfError::Parameter("hash bound must be positive"));
    }
    let transcript = transcript(discriminant, input, output);
    let length = (bound_bits as usize).div_ceil(8);
    let mut bytes = expand(INT_TAG, 0, &[&transcript], length);
    bytes[0] &= 0xff >> ((8 - bound_bits % 8) % 8);
    Ok(Z::from_bytes_be(bytes, true))
}

#[cfg(test)]
#[cfg(feature = "gmp")]
mod tests {
    use super::*;
    use crate::bqf::generator;
    use crate::z::Z;
    use rug::Integer;

    fn fixture() -> (Integer, BQF<Integer>, BQF<Integer>) {
        let d = Integer::from(-2039);
        let x = generator::<Integer>(&d);
        let y = x.pow(&Integer::from(1729));
        (d, x, y)
    }

    #[test]
    fn test_hash_prime_is_prime_and_sized() {
        let (d, x, y) = fixture();
        let l = hash_prime(&d, &x, &y).unwrap();
        assert!(l.is_prime());
        assert!(l.is_odd());
        assert_eq!(l.bit_size(), CHALLENGE_PRIME_BITS as u64);
        // same transcript, same prime
        assert_eq!(hash_prime(&d, &x, &y).unwrap(), l);
    }

    #[test]
    fn test_hash_prime_binds_transcript() {
        let (d, x, y) = fixture();
        let l = hash_prime(&d, &x, &y).unwrap();
        let l_swapped = hash_prime(&d, &y, &x).unwrap();
        assert_ne!(l, l_swapped);
        let other_output = y.double();
        assert_ne!(hash_prime(&d, &x, &other_output).unwrap(), l);
    }

    #[test]
    fn test_hash_int_respects_bound() {
        let (d, x, y) = fixture();
        for bound_bits in [1u32, 7, 8, 100, 264] {
            let n = hash_int(&d, &x, &y, bound_bits).unwrap();
            assert!(n.bit_size() <= bound_bits as u64);
            assert!(n.compare(&Integer::from(0)).is_ge());
            assert_eq!(hash_int(&d, &x, &y, bound_bits).unwrap(), n);
        }
        assert!(matches!(
            hash_int(&d, &x, &y, 0),
            Err(VdfError::Parameter(_))
        ));
    }
}
