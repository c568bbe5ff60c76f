// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Hashing arbitrary bytes to a class group element.

use std::fmt::Debug;

use crate::bqf::{BinaryQuadraticForm, BQF};
use crate::fiat_shamir::{expand, SEARCH_LIMIT};
use crate::VdfError;

/// Discriminants this small make the sampled `a` coefficient overshoot
/// `sqrt(|discriminant|)`, so the map would no longer be uniform-ish.
const MIN_GROUP_HASH_BITS: u64 = 600;

/// Byte width of each sampled prime factor of the `a` coefficient.
const FACTOR_BYTES: usize = 16;

const GROUP_HASH_TAG: &[u8] = b"vdf_group_element";

/// Odd primes below 100, used to sieve factor candidates before the full
/// primality test.
const SMALL_PRIMES: [u64; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Hashes a seed to a class group element of the given discriminant.
///
/// The `a` coefficient is the product of two distinct 128-bit primes over
/// which the discriminant is a quadratic residue, sampled in counter mode
/// from the seed. The matching `b` is assembled from the two modular square
/// roots by the Chinese remainder theorem and shifted to the odd residue, so
/// the form lies on the discriminant. Deterministic in `(seed, discriminant)`.
///
/// # Errors
///
/// [`VdfError::Parameter`] for positive discriminants or discriminants of at
/// most [`MIN_GROUP_HASH_BITS`] bits, [`VdfError::SearchExhausted`] when the
/// factor search fails, which has negligible probability for prime
/// discriminants.
pub fn hash_to_class_group<Z: crate::z::Z + Debug + Clone + PartialEq>(
    seed: &[u8],
    discriminant: &Z,
) -> Result<BQF<Z>, VdfError> {
    if !discriminant.neg().is_positive() {
        return Err(VdfError::Parameter("discriminant must be negative"));
    }
    if discriminant.bit_size() <= MIN_GROUP_HASH_BITS {
        return Err(VdfError::Parameter("discriminant too small to hash into"));
    }
    let mut factors: Vec<Z> = Vec::new();
    let mut roots: Vec<Z> = Vec::new();
    for counter in 0..SEARCH_LIMIT {
        let mut bytes = expand(GROUP_HASH_TAG, counter, &[seed], FACTOR_BYTES);
        bytes[0] |= 0x80;
        bytes[FACTOR_BYTES - 1] |= 1;
        let candidate = Z::from_bytes_be(bytes, true);
        if SMALL_PRIMES
            .iter()
            .any(|&p| Z::from(p).divides(&candidate))
        {
            continue;
        }
        if factors.iter().any(|p| p == &candidate) {
            continue;
        }
        if discriminant.kronecker(&candidate) != 1 || !candidate.is_prime() {
            continue;
        }
        let root = match discriminant.take_mod(&candidate).sqrt_mod_prime(&candidate) {
            Some(root) => root,
            // Jacobi 1 does not imply a square root when the discriminant is composite
            None => continue,
        };
        factors.push(candidate);
        roots.push(root);
        if factors.len() == 2 {
            break;
        }
    }
    if factors.len() < 2 {
        return Err(VdfError::SearchExhausted(SEARCH_LIMIT));
    }
    let a = factors[0].mul(&factors[1]);
    let inverse = match factors[0].invert_mod(&factors[1]) {
        Some(inverse) => inverse,
        // distinct primes are coprime
        None => return Err(VdfError::SearchExhausted(SEARCH_LIMIT)),
    };
    let mut b = roots[1]
        .sub(&roots[0])
        .mul_mod(&inverse, &factors[1])
        .mul(&factors[0])
        .add(&roots[0]);
    if !b.is_odd() {
        b = b.sub(&a);
    }
    Ok(BQF::new_with_discriminant(&a, &b, discriminant).reduce())
}
