// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Verifiable delay functions over class groups of imaginary quadratic
//! fields, following Wesolowski's construction.
//!
//! Evaluation is inherently sequential: `iterations` squarings of a binary
//! quadratic form, with no known shortcut even with unbounded parallelism.
//! The accompanying proof lets anyone check the result in two group
//! exponentiations, exponentially faster than redoing the work.
//!
//! The class group of a negative prime discriminant is used as the group of
//! unknown order, so no trusted setup is needed: the discriminant is derived
//! from a public challenge seed.
//!
//! ## Usage
//!
//! ```rust
//! use verifiable_delay_function::{create_discriminant, generator, prove, verify};
//!
//! let discriminant: rug::Integer = create_discriminant(b"shared challenge", 512).unwrap();
//! let input = generator(&discriminant);
//! let iterations = 1_000;
//! let proof = prove(&discriminant, &input, iterations).unwrap();
//! assert!(verify(&discriminant, &input, &proof.output, &proof.proof, iterations).unwrap());
//! ```

use std::fmt::Debug;

use thiserror::Error;

mod bqf;
mod chain;
mod discriminant;
mod fiat_shamir;
mod group_hash;
#[cfg(feature = "gmp")]
pub mod mpz;
mod vdf;
pub mod z;

#[doc(inline)]
pub use crate::bqf::{coefficient_width, form_size, generator, identity, BinaryQuadraticForm, BQF};
#[doc(inline)]
pub use crate::chain::{prove_chained, verify_chained, ChainedProof, ProofSegment};
#[doc(inline)]
pub use crate::discriminant::{
    create_discriminant, create_discriminant_for_level, decode_discriminant, discriminant_bit_size,
    encode_discriminant, SecurityLevel,
};
#[doc(inline)]
pub use crate::fiat_shamir::{hash_int, hash_prime};
#[doc(inline)]
pub use crate::group_hash::hash_to_class_group;
#[doc(inline)]
pub use crate::vdf::{
    evaluate, evaluate_slow, evaluate_slow_interruptible, proof_parameters, prove,
    prove_from_checkpoints, prove_interruptible, verify, Evaluation, ProofParameters,
    WesolowskiProof,
};

/// Errors shared by every operation of the crate.
///
/// A cryptographically invalid proof is not an error: verification reports it
/// as `Ok(false)`. `Err` always means the caller broke a contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VdfError {
    /// A byte buffer does not parse as the type it claims to encode.
    #[error("malformed encoding: {0}")]
    Encoding(&'static str),
    /// A group element violates the shape contract of an operation.
    #[error("invalid form: {0}")]
    Form(&'static str),
    /// A numeric argument is outside the supported range.
    #[error("invalid parameter: {0}")]
    Parameter(&'static str),
    /// A bounded hash derivation ran out of candidates, which points at a
    /// broken configuration rather than bad luck.
    #[error("no valid candidate among {0} attempts")]
    SearchExhausted(u64),
    /// The stop flag was raised during evaluation.
    #[error("evaluation interrupted")]
    Interrupted,
}

/// Derives the discriminant from `challenge`, decodes `input` against it and
/// proves `iterations` squarings, returning `output || proof` in the
/// fixed-width encoding.
pub fn prove_bytes<Z: z::Z + Debug + Clone + PartialEq>(
    challenge: &[u8],
    input: &[u8],
    discriminant_bits: u32,
    iterations: u64,
) -> Result<Vec<u8>, VdfError> {
    let discriminant: Z = create_discriminant(challenge, discriminant_bits)?;
    let input = BQF::from_bytes(input, &discriminant)?;
    let proof = prove(&discriminant, &input, iterations)?;
    Ok(proof.to_bytes())
}

/// Decodes `input` and an `output || proof` buffer against the discriminant
/// and verifies the claim.
pub fn verify_bytes<Z: z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &[u8],
    proof: &[u8],
    iterations: u64,
) -> Result<bool, VdfError> {
    let input = BQF::from_bytes(input, discriminant)?;
    let proof = WesolowskiProof::from_bytes(proof, discriminant)?;
    verify(
        discriminant,
        &input,
        &proof.output,
        &proof.proof,
        iterations,
    )
}
