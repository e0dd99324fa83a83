//! This module provides the evaluating side of the OPRF.
//!
//! [`OprfServer`] holds the full (non-threshold) OPRF key and answers queries directly. In the threshold setting each
//! node evaluates with its share instead, see [`crate::keygen::Share::evaluate`]. Both produce the blinded response
//! `B * x` together with a proof that `x` is the discrete log of the corresponding public key.

use std::ops;

use ark_ec::CurveGroup;
use rand::{CryptoRng, Rng};
use zeroize::ZeroizeOnDrop;

use crate::{
    Error,
    dlog_equality::DLogEqualityProof,
    group::{self, Affine, CURVE, ScalarField},
    oprf::{BlindedOprfRequest, BlindedOprfResponse},
};

/// OPRF master secret key (scalar).
///
/// This should be handled as a secret and is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct OprfKey(ScalarField);

impl ops::Mul<Affine> for &OprfKey {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Self::Output {
        (rhs * self.0).into_affine()
    }
}

impl OprfKey {
    /// Generate a random OPRF key.
    ///
    /// # Errors
    /// Returns [`Error::RandomnessFailure`] if the random source fails.
    pub fn random(rng: &mut (impl CryptoRng + Rng)) -> Result<Self, Error> {
        Ok(OprfKey(group::random_nonzero_scalar(rng)?))
    }

    /// Wraps an existing scalar as OPRF key.
    pub fn new(key: ScalarField) -> Self {
        OprfKey(key)
    }

    /// Returns the secret scalar, e.g., to split it into shares.
    pub fn expose(&self) -> ScalarField {
        self.0
    }

    /// Returns the public key corresponding to this OPRF secret key.
    pub fn public_key(&self) -> Affine {
        CURVE.mul_generator(self.0)
    }
}

/// OPRF server, holding the full OPRF key and handling blinded queries.
///
/// Only used for the non-threshold variant of the protocol and as reference evaluation.
pub struct OprfServer {
    key: OprfKey,
}

impl OprfServer {
    /// Create a new OPRF server instance using the given key.
    pub fn new(key: OprfKey) -> Self {
        OprfServer { key }
    }

    /// Returns a reference to the OPRF server's key.
    pub fn key(&self) -> &OprfKey {
        &self.key
    }

    /// Returns the public key corresponding to the server's secret key.
    pub fn public_key(&self) -> Affine {
        self.key.public_key()
    }

    /// Computes the blinded OPRF response for a given blinded query.
    pub fn answer_query(&self, query: &BlindedOprfRequest) -> BlindedOprfResponse {
        BlindedOprfResponse(&self.key * query.0)
    }

    /// Computes the blinded OPRF response and produces a zero-knowledge proof that the response was computed correctly.
    ///
    /// # Errors
    /// Returns [`Error::RandomnessFailure`] if the proof nonce cannot be sampled.
    pub fn answer_query_with_proof(
        &self,
        query: &BlindedOprfRequest,
        rng: &mut (impl CryptoRng + Rng),
    ) -> Result<(BlindedOprfResponse, DLogEqualityProof), Error> {
        evaluate_with_proof(self.key.0, query, rng)
    }
}

/// Computes `B * x` and the proof that it shares its discrete log with `G * x`.
pub(crate) fn evaluate_with_proof(
    x: ScalarField,
    query: &BlindedOprfRequest,
    rng: &mut (impl CryptoRng + Rng),
) -> Result<(BlindedOprfResponse, DLogEqualityProof), Error> {
    let blinded_response = (query.0 * x).into_affine();
    let proof = DLogEqualityProof::proof(query.0, x, rng)?;
    Ok((BlindedOprfResponse(blinded_response), proof))
}
