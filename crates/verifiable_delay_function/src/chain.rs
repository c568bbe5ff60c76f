// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Chained proofs over consecutive delay segments.

use std::fmt::Debug;

use serde::Serialize;

use crate::bqf::{form_size, BinaryQuadraticForm, BQF};
use crate::vdf;
use crate::VdfError;

/// One segment of a chained proof, attesting `iterations` squarings starting
/// from the previous segment's output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProofSegment<Z: crate::z::Z> {
    pub iterations: u64,
    pub output: BQF<Z>,
    pub proof: BQF<Z>,
}

/// A delay proof split into consecutive segments, so long evaluations can be
/// published and checked incrementally.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChainedProof<Z: crate::z::Z> {
    pub segments: Vec<ProofSegment<Z>>,
}

impl<Z: crate::z::Z + Debug + Clone + PartialEq> ChainedProof<Z> {
    /// Total number of squarings attested by the chain.
    pub fn total_iterations(&self) -> u64 {
        self.segments.iter().map(|segment| segment.iterations).sum()
    }

    /// Output of the final segment.
    pub fn output(&self) -> Option<&BQF<Z>> {
        self.segments.last().map(|segment| &segment.output)
    }

    /// Serializes the chain as consecutive
    /// `iterations (8 bytes big-endian) || output || proof` records.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for segment in &self.segments {
            bytes.extend_from_slice(&segment.iterations.to_be_bytes());
            bytes.extend_from_slice(&segment.output.to_bytes());
            bytes.extend_from_slice(&segment.proof.to_bytes());
        }
        bytes
    }

    /// Deserializes a chain produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8], discriminant: &Z) -> Result<Self, VdfError> {
        let size = form_size(discriminant.bit_size());
        let record = 8 + 2 * size;
        if bytes.is_empty() || bytes.len() % record != 0 {
            return Err(VdfError::Encoding("chain buffer has the wrong length"));
        }
        let mut segments = Vec::with_capacity(bytes.len() / record);
        for chunk in bytes.chunks_exact(record) {
            let iterations = u64::from_be_bytes(chunk[..8].try_into().expect("8 byte prefix"));
            let output = BQF::from_bytes(&chunk[8..8 + size], discriminant)?;
            let proof = BQF::from_bytes(&chunk[8 + size..], discriminant)?;
            segments.push(ProofSegment {
                iterations,
                output,
                proof,
            });
        }
        Ok(ChainedProof { segments })
    }
}

/// Proves a delay split into consecutive segments, each proof starting from
/// the previous segment's output.
pub fn prove_chained<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    segment_iterations: &[u64],
) -> Result<ChainedProof<Z>, VdfError> {
    if segment_iterations.is_empty() {
        return Err(VdfError::Parameter("chain must have at least one segment"));
    }
    let mut segments = Vec::with_capacity(segment_iterations.len());
    let mut current = input.clone();
    for &iterations in segment_iterations {
        let attested = vdf::prove(discriminant, &current, iterations)?;
        current = attested.output.clone();
        segments.push(ProofSegment {
            iterations,
            output: attested.output,
            proof: attested.proof,
        });
    }
    Ok(ChainedProof { segments })
}

/// Verifies a chained proof against the initial input by replaying the
/// segments in order.
///
/// Returns `Ok(false)` as soon as one segment fails; inputs violating the
/// shape contract surface as `Err` exactly as in [`vdf::verify`].
pub fn verify_chained<Z: crate::z::Z + Debug + Clone + PartialEq>(
    discriminant: &Z,
    input: &BQF<Z>,
    chain: &ChainedProof<Z>,
) -> Result<bool, VdfError> {
    if chain.segments.is_empty() {
        return Err(VdfError::Parameter("chain must have at least one segment"));
    }
    let mut current = input;
    for segment in &chain.segments {
        if !vdf::verify(
            discriminant,
            current,
            &segment.output,
            &segment.proof,
            segment.iterations,
        )? {
            return Ok(false);
        }
        current = &segment.output;
    }
    Ok(true)
}

#[cfg(test)]
#[cfg(feature = "gmp")]
mod tests {
    use super::*;
    use crate::bqf::generator;
    use crate::create_discriminant;
    use crate::vdf::evaluate;
    use rug::Integer;

    fn setup() -> (Integer, BQF<Integer>) {
        let d: Integer = create_discriminant(b"chained proofs", 512).unwrap();
        let x = generator::<Integer>(&d);
        (d, x)
    }

    #[test]
    fn test_chain_verifies_and_matches_single_run() {
        let (d, x) = setup();
        let chain = prove_chained(&d, &x, &[300, 500]).unwrap();
        assert!(verify_chained(&d, &x, &chain).unwrap());
        assert_eq!(chain.total_iterations(), 800);
        // the chain lands on the same power as one 800-iteration run
        let single = evaluate(&d, &x, 800).unwrap();
        assert!(chain.output().unwrap().equals(&single));
    }

    #[test]
    fn test_chain_rejects_tampering() {
        let (d, x) = setup();
        let mut tampered = prove_chained(&d, &x, &[300, 400]).unwrap();
        tampered.segments[0].iterations = 301;
        assert!(!verify_chained(&d, &x, &tampered).unwrap());
        let chain = prove_chained(&d, &x, &[300, 400]).unwrap();
        let mut reordered = chain.clone();
        reordered.segments.swap(0, 1);
        assert!(!verify_chained(&d, &x, &reordered).unwrap());
    }

    #[test]
    fn test_chain_must_not_be_empty() {
        let (d, x) = setup();
        assert!(matches!(
            prove_chained::<Integer>(&d, &x, &[]),
            Err(VdfError::Parameter(_))
        ));
        let empty = ChainedProof::<Integer> {
            segments: Vec::new(),
        };
        assert!(matches!(
            verify_chained(&d, &x, &empty),
            Err(VdfError::Parameter(_))
        ));
    }

    #[test]
    fn test_chain_codec_roundtrip() {
        let (d, x) = setup();
        let chain = prove_chained(&d, &x, &[300, 500, 300]).unwrap();
        let bytes = chain.to_bytes();
        let decoded = ChainedProof::from_bytes(&bytes, &d).unwrap();
        assert_eq!(decoded, chain);
        assert!(verify_chained(&d, &x, &decoded).unwrap());
        assert!(ChainedProof::<Integer>::from_bytes(&bytes[..10], &d).is_err());
        assert!(ChainedProof::<Integer>::from_bytes(&[], &d).is_err());
    }
}
