//! This module provides types and functionality for creating and verifying Chaum-Pedersen proofs,
//! enabling the demonstration that two group elements are related by the same discrete logarithm
//! (i.e., knowledge of a secret x such that xG = x*G and xH = x*H), without revealing x itself.
//!
//! Nodes use it to prove that their partial OPRF evaluation `xH` of the blinded query `H` was computed with the
//! private share `x` behind their registered public key share `xG`.
//!
//! The proof is made non-interactive with Fiat-Shamir. The challenge hashes the fixed-width encodings of
//! `G, xG, vG, vH, H, xH` (in this order) into the scalar field.

use ark_ec::CurveGroup;
use rand::{CryptoRng, Rng};
use zeroize::Zeroize;

use crate::{
    Error,
    group::{self, Affine, CURVE, ScalarField},
};

const DLOG_DS: &[u8] = b"DLEQ";

/// A Chaum-Pedersen discrete logarithm equality proof.
///
/// Proves in zero-knowledge that the prover knows `x` with `xG = x*G` and `xH = x*H`, without revealing `x`.
/// `c` is the Fiat-Shamir challenge and `r = v - c*x` the response for the one-time nonce `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DLogEqualityProof {
    /// Fiat-Shamir challenge.
    pub c: ScalarField,
    /// Proof response.
    pub r: ScalarField,
}

/// Error indicating that the DLog-Proof could not be verified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidProof;

impl std::fmt::Display for InvalidProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DLog equality proof is invalid")
    }
}

impl std::error::Error for InvalidProof {}

impl DLogEqualityProof {
    /// Creates a Chaum-Pedersen proof which shows that `x*G` and `x*H` share the same dlog `x`.
    ///
    /// A fresh nonce is drawn from `rng` for every call.
    ///
    /// # Errors
    /// Returns [`Error::RandomnessFailure`] if the nonce cannot be sampled.
    pub fn proof(
        h: Affine,
        x: ScalarField,
        rng: &mut (impl CryptoRng + Rng),
    ) -> Result<Self, Error> {
        let mut v = group::random_scalar(rng)?;
        let x_g = CURVE.mul_generator(x);
        let x_h = (h * x).into_affine();
        let v_g = CURVE.mul_generator(v);
        let v_h = (h * v).into_affine();
        let c = challenge_hash(x_g, v_g, v_h, h, x_h);
        let r = v - c * x;
        v.zeroize();
        Ok(DLogEqualityProof { c, r })
    }

    /// Verifies that `x_g = x*G` and `x_h = x*h` for the same `x`.
    ///
    /// Recomputes the commitments as `vG = r*G + c*xG` and `vH = r*H + c*xH` and checks the challenge.
    pub fn verify(&self, x_g: Affine, x_h: Affine, h: Affine) -> Result<(), InvalidProof> {
        // All points need to be valid curve elements.
        if [x_g, x_h, h]
            .iter()
            .any(|p| !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve())
        {
            return Err(InvalidProof);
        }
        // A zero key or query makes the statement trivial.
        if x_g.is_zero() || h.is_zero() {
            return Err(InvalidProof);
        }

        let v_g = CURVE.generator() * self.r + x_g * self.c;
        let v_h = h * self.r + x_h * self.c;
        let c = challenge_hash(x_g, v_g.into_affine(), v_h.into_affine(), h, x_h);
        if c == self.c {
            Ok(())
        } else {
            Err(InvalidProof)
        }
    }
}

pub(crate) fn challenge_hash(
    x_g: Affine,
    v_g: Affine,
    v_h: Affine,
    h: Affine,
    x_h: Affine,
) -> ScalarField {
    let encoded = [CURVE.generator(), x_g, v_g, v_h, h, x_h].map(group::point_to_bytes);
    let parts = encoded.each_ref().map(|p| p.as_slice());
    group::hash_to_scalar(DLOG_DS, &parts)
}

#[cfg(test)]
mod tests {
    use ark_ff::{PrimeField as _, UniformRand};
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha12Rng;

    use super::*;
    use crate::group::{SCALAR_BYTES, test_utils::FailingRng};

    #[test]
    fn test_dlog_equality() {
        let mut rng = rand::thread_rng();
        let x = ScalarField::rand(&mut rng);
        let h = group::hash_to_point(b"blinded");
        let x_g = CURVE.mul_generator(x);
        let x_h = (h * x).into_affine();

        let proof = DLogEqualityProof::proof(h, x, &mut rng).unwrap();
        assert!(proof.verify(x_g, x_h, h).is_ok());

        // proof for another base
        let h2 = group::hash_to_point(b"other");
        let invalid_proof = DLogEqualityProof::proof(h2, x, &mut rng).unwrap();
        assert!(invalid_proof.verify(x_g, x_h, h).is_err());

        // evaluation under another exponent
        let y = ScalarField::rand(&mut rng);
        let y_h = (h * y).into_affine();
        assert!(proof.verify(x_g, y_h, h).is_err());
        let y_proof = DLogEqualityProof::proof(h, y, &mut rng).unwrap();
        assert!(y_proof.verify(x_g, y_h, h).is_err());
    }

    #[test]
    fn test_fresh_nonce_per_proof() {
        let mut rng = rand::thread_rng();
        let x = ScalarField::rand(&mut rng);
        let h = group::hash_to_point(b"blinded");
        let p1 = DLogEqualityProof::proof(h, x, &mut rng).unwrap();
        let p2 = DLogEqualityProof::proof(h, x, &mut rng).unwrap();
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_rejects_invalid_points() {
        let mut rng = rand::thread_rng();
        let x = ScalarField::rand(&mut rng);
        let h = group::hash_to_point(b"blinded");
        let x_g = CURVE.mul_generator(x);
        let x_h = (h * x).into_affine();
        let proof = DLogEqualityProof::proof(h, x, &mut rng).unwrap();

        let zero = Affine::zero();
        assert_eq!(proof.verify(zero, x_h, h), Err(InvalidProof));
        assert_eq!(proof.verify(x_g, x_h, zero), Err(InvalidProof));
        let off_curve = Affine::new_unchecked(x_h.x, x_h.y + group::BaseField::from(1u64));
        assert_eq!(proof.verify(x_g, off_curve, h), Err(InvalidProof));
    }

    #[test]
    fn test_proof_randomness_failure() {
        let h = group::hash_to_point(b"blinded");
        assert_eq!(
            DLogEqualityProof::proof(h, ScalarField::from(7u64), &mut FailingRng),
            Err(Error::RandomnessFailure)
        );
    }

    fn flip_bit(s: ScalarField, bit: usize) -> Option<ScalarField> {
        let mut bytes = group::scalar_to_bytes(s);
        bytes[SCALAR_BYTES - 1 - bit / 8] ^= 1 << (bit % 8);
        // a flip that leaves [0, N) is not even a decodable transcript
        group::scalar_from_bytes(&bytes).ok()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn dlog_proof_completeness(seed in any::<u64>(), query in any::<Vec<u8>>()) {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let x = group::random_scalar(&mut rng).unwrap();
            let h = group::hash_to_point(&query);
            let proof = DLogEqualityProof::proof(h, x, &mut rng).unwrap();
            prop_assert!(proof.verify(CURVE.mul_generator(x), (h * x).into_affine(), h).is_ok());
        }

        #[test]
        fn dlog_proof_tampering(seed in any::<u64>(), bit in 0usize..251, tamper_c in any::<bool>()) {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let x = group::random_scalar(&mut rng).unwrap();
            let h = group::hash_to_point(&seed.to_le_bytes());
            let proof = DLogEqualityProof::proof(h, x, &mut rng).unwrap();
            let mut tampered = proof;
            let target = if tamper_c { &mut tampered.c } else { &mut tampered.r };
            if let Some(flipped) = flip_bit(*target, bit) {
                *target = flipped;
                prop_assert!(tampered.verify(CURVE.mul_generator(x), (h * x).into_affine(), h).is_err());
            }
        }
    }

    #[test]
    fn test_tampering_every_bit() {
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        let x = group::random_scalar(&mut rng).unwrap();
        let h = group::hash_to_point(b"blinded");
        let x_g = CURVE.mul_generator(x);
        let x_h = (h * x).into_affine();
        let proof = DLogEqualityProof::proof(h, x, &mut rng).unwrap();
        let bits = ScalarField::MODULUS_BIT_SIZE as usize;
        for bit in 0..bits {
            for tamper_c in [true, false] {
                let mut tampered = proof;
                let target = if tamper_c { &mut tampered.c } else { &mut tampered.r };
                if let Some(flipped) = flip_bit(*target, bit) {
                    *target = flipped;
                    assert!(tampered.verify(x_g, x_h, h).is_err());
                }
            }
        }
    }
}
