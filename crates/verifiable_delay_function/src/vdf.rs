// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Wesolowski proofs of sequential squaring in class groups.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::bqf::{form_size, BinaryQuadraticForm, BQF};
use crate::fiat_shamir;
use crate::VdfError;

/// Squarings between two polls of the stop flag.
const STOP_CHECK_STRIDE: u64 = 1 << 16;

/// Block parameters of the memory-saving proof construction.
///
/// The prover walks the challenge quotient in digits of `block_bits` bits,
/// split into `rounds` interleaved passes, so that only every
/// `block_bits * rounds`-th power of the input has to be kept around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofParameters {
    pub block_bits: u32,
    pub rounds: u32,
}

impl ProofParameters {
    /// Distance in squarings between two stored checkpoints.
    pub fn checkpoint_spacing(&self) -> u64 {
        self.block_bits as u64 * self.rounds as u64
    }

    /// Number of checkpoints an evaluation over `iterations` squarings keeps.
    pub fn checkpoint_count(&self, iterations: u64) -> u64 {
        iterations.div_ceil(self.checkpoint_spacing())
    }
}

/// Picks proof parameters for an iteration count.
///
/// Beyond 2^23.25 iterations the digit walk is split into ten rounds to cap
/// the checkpoint memory, and the digit width follows `ln z - ln ln z` for
/// `z = iterations * ln 2 / (2 * rounds)`, which balances the bucket fill
/// against the assembly passes.
pub fn proof_parameters(iterations: u64) -> ProofParameters {
    let log_memory = 23.25349666_f64;
    let rounds = if (iterations as f64).log2() - log_memory > 0.000001 {
        2f64.powf(log_memory - 20.0).ceil() as u32
    } else {
        1
    };
    let z = iterations as f64 * std::f64::consts::LN_2 / (2.0 * rounds as f64);
    let block_bits = (z.ln() - z.ln().ln() + 0.25).round().max(1.0) as u32;
    ProofParameters { block_bits, rounds }
}

/// Output of a checkpointed evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation<Z: crate::z::Z> {
    /// The final power `input^(2^iterations)`.
    pub output: BQF<Z>,
    /// Every `checkpoint_spacing`-th intermediate power, starting with the
    /// input itself.
    pub checkpoints: Vec<BQF<Z>>,
}

/// A Wesolowski proof: the claimed output together with
/// `input^(2^iterations div challenge)`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WesolowskiProof<Z: crate::z::Z> {
    pub output: BQF<Z>,
    pub proof: BQF<Z>,
}

impl<Z: crate::z::Z + Debug + Clone + PartialEq> WesolowskiProof<Z> {
    /// Concatenates the fixed-width encodings of the output and the proof.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.output.to_bytes();
        bytes.extend_from_slice(&self.proof.to_bytes());
        bytes
    }

    /// Splits a buffer holding exactly two forms back into a proof.
    pub fn from_bytes(bytes: &[u8], discriminant: &Z) -> Result<Self, VdfError> {
        let size = form_size(discriminant.bit_size());
        if bytes.len() != 2 * size {
            return Err(VdfError::Encoding("proof buffer has the wrong length"));
        }
        let output = BQF::from_bytes(&bytes[..size], discriminant)?;
        let proof = BQF::from_bytes(&bytes[size..], discriminant)?;
        Ok(WesolowskiProof { output, proof })
    }
}

fn check_discriminant<Z: crate::z::Z>(discriminant: &Z) -> Result<(), VdfError> {
    if !discriminant.neg().is_positive() {
        return Err(VdfError::Parameter("discriminant must be negative"));
    }
    Ok(())
}

fn check_element<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    form: &BQF<Z>,
) -> Result<(), VdfError> {
    if form.discriminant() != *discriminant {
        return Err(VdfError::Form("element is not on the discriminant"));
    }
    if !form.is_reduced() {
        return Err(VdfError::Form("element is not reduced"));
    }
    Ok(())
}

fn check_iterations(iterations: u64) -> Result<(), VdfError> {
    if iterations == 0 {
        return Err(VdfError::Parameter("iteration count must be positive"));
    }
    Ok(())
}

fn run_squarings<Z: crate::z::Z + Debug + Clone + PartialEq>(
    input: &BQF<Z>,
    iterations: u64,
    checkpoint_spacing: Option<u64>,
    stop: Option<&AtomicBool>,
) -> Result<(BQF<Z>, Vec<BQF<Z>>), VdfError> {
    let mut checkpoints = Vec::new();
    let mut power = input.clone();
    for i in 0..iterations {
        if i & (STOP_CHECK_STRIDE - 1) == 0 {
            if let Some(flag) = stop {
                if flag.load(Ordering::Relaxed) {
                    return Err(VdfError::Interrupted);
                }
            }
        }
        if let Some(spacing) = checkpoint_spacing {
            if i % spacing == 0 {
                checkpoints.push(power.clone());
            }
        }
        power = power.double();
    }
    Ok((power, checkpoints))
}

/// Computes `input^(2^iterations)` by strictly sequential squaring, one
/// square-and-reduce per iteration, without recording checkpoints.
pub fn evaluate<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    iterations: u64,
) -> Result<BQF<Z>, VdfError> {
    check_discriminant(discriminant)?;
    check_element(discriminant, input)?;
    let (output, _) = run_squarings(input, iterations, None, None)?;
    Ok(output)
}

/// Evaluates `input^(2^iterations)` while recording the checkpoints the
/// prover later replays.
pub fn evaluate_slow<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    iterations: u64,
) -> Result<Evaluation<Z>, VdfError> {
    evaluate_slow_inner(discriminant, input, iterations, None)
}

/// [`evaluate_slow`] with a stop flag, polled every [`STOP_CHECK_STRIDE`]
/// squarings so cancellation never lands mid-squaring.
pub fn evaluate_slow_interruptible<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    iterations: u64,
    stop: &AtomicBool,
) -> Result<Evaluation<Z>, VdfError> {
    evaluate_slow_inner(discriminant, input, iterations, Some(stop))
}

fn evaluate_slow_inner<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    iterations: u64,
    stop: Option<&AtomicBool>,
) -> Result<Evaluation<Z>, VdfError> {
    check_discriminant(discriminant)?;
    check_element(discriminant, input)?;
    check_iterations(iterations)?;
    let parameters = proof_parameters(iterations);
    let (output, checkpoints) = run_squarings(
        input,
        iterations,
        Some(parameters.checkpoint_spacing()),
        stop,
    )?;
    Ok(Evaluation {
        output,
        checkpoints,
    })
}

/// Digit `index` of the base `2^block_bits` expansion of
/// `2^iterations div challenge`, namely
/// `(2^block_bits * (2^(iterations - block_bits * (index + 1)) mod challenge)) div challenge`.
fn proof_digit<Z: crate::z::Z>(
    challenge: &Z,
    index: u64,
    block_bits: u32,
    iterations: u64,
) -> u64 {
    let exponent = Z::from(iterations - block_bits as u64 * (index + 1));
    let remainder = Z::from(2).pow_mod(&exponent, challenge);
    remainder
        .shl(block_bits)
        .div_floor(challenge)
        .to_u64()
        .expect("digit is bounded by 2^block_bits")
}

/// Assembles the proof `input^(2^iterations div challenge)` from recorded
/// checkpoints, without redoing the sequential work.
///
/// The quotient digits of one round land in `2^block_bits` buckets keyed by
/// digit value. Each bucket is then raised to its key, split into a low and a
/// high half so a key of `b` bits costs `O(2^(b/2))` compositions, and every
/// round folds into the accumulator Horner style.
pub fn prove_from_checkpoints<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    evaluation: &Evaluation<Z>,
    iterations: u64,
) -> Result<BQF<Z>, VdfError> {
    check_discriminant(discriminant)?;
    check_element(discriminant, input)?;
    check_element(discriminant, &evaluation.output)?;
    check_iterations(iterations)?;
    let parameters = proof_parameters(iterations);
    let groups = parameters.checkpoint_count(iterations);
    if (evaluation.checkpoints.len() as u64) < groups {
        return Err(VdfError::Parameter(
            "not enough checkpoints for the iteration count",
        ));
    }
    let challenge = fiat_shamir::hash_prime(discriminant, input, &evaluation.output)?;
    let block_bits = parameters.block_bits;
    let low_bits = block_bits - block_bits / 2;
    let high_bits = block_bits / 2;
    let identity = input.identity();
    let mut proof = identity.clone();
    for round in (0..parameters.rounds as u64).rev() {
        proof = proof.pow(&Z::from(1u64 << block_bits));
        let mut buckets = vec![identity.clone(); 1usize << block_bits];
        for group in 0..groups {
            let index = group * parameters.rounds as u64 + round;
            if iterations >= block_bits as u64 * (index + 1) {
                let digit = proof_digit(&challenge, index, block_bits, iterations) as usize;
                buckets[digit] = buckets[digit].compose(&evaluation.checkpoints[group as usize]);
            }
        }
        for high in 0..1u64 << high_bits {
            let mut power = identity.clone();
            for low in 0..1u64 << low_bits {
                power = power.compose(&buckets[(high << low_bits | low) as usize]);
            }
            proof = proof.compose(&power.pow(&Z::from(high << low_bits)));
        }
        for low in 0..1u64 << low_bits {
            let mut power = identity.clone();
            for high in 0..1u64 << high_bits {
                power = power.compose(&buckets[(high << low_bits | low) as usize]);
            }
            proof = proof.compose(&power.pow(&Z::from(low)));
        }
    }
    Ok(proof.reduce())
}

/// Runs the sequential evaluation and assembles the proof for it.
pub fn prove<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    iterations: u64,
) -> Result<WesolowskiProof<Z>, VdfError> {
    let evaluation = evaluate_slow(discriminant, input, iterations)?;
    let proof = prove_from_checkpoints(discriminant, input, &evaluation, iterations)?;
    Ok(WesolowskiProof {
        output: evaluation.output,
        proof,
    })
}

/// [`prove`] with a stop flag polled during the sequential phase.
pub fn prove_interruptible<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    iterations: u64,
    stop: &AtomicBool,
) -> Result<WesolowskiProof<Z>, VdfError> {
    let evaluation = evaluate_slow_interruptible(discriminant, input, iterations, stop)?;
    let proof = prove_from_checkpoints(discriminant, input, &evaluation, iterations)?;
    Ok(WesolowskiProof {
        output: evaluation.output,
        proof,
    })
}

/// Checks a Wesolowski proof in two group exponentiations.
///
/// Recomputes the prime challenge from the transcript, reduces `2^iterations`
/// modulo the challenge and accepts iff
/// `proof^challenge * input^remainder` equals `output`.
///
/// Returns `Ok(false)` for well-formed but cryptographically invalid proofs;
/// `Err` is reserved for inputs violating the shape contract.
pub fn verify<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    output: &BQF<Z>,
    proof: &BQF<Z>,
    iterations: u64,
) -> Result<bool, VdfError> {
    check_discriminant(discriminant)?;
    check_element(discriminant, input)?;
    check_element(discriminant, output)?;
    check_element(discriminant, proof)?;
    check_iterations(iterations)?;
    let challenge = fiat_shamir::hash_prime(discriminant, input, output)?;
    let remainder = Z::from(2).pow_mod(&Z::from(iterations), &challenge);
    let lhs = proof.pow(&challenge).compose(&input.pow(&remainder));
    Ok(lhs.equals(output))
}
