//! This module defines the core functionality of the OPRF protocol.
//!
//! It provides types for representing client queries, blinding factors, and blinded server responses.
//!
//! Blinding is used to ensure the server cannot learn the client’s input. The roundtrip uses a blinding factor to blind
//! queries, and unblinding after server response to recover the OPRF output. Since blinding commutes with
//! exponentiation, the unblinded result `k*H(data)` does not depend on the blinding factor.
//!
//! See the `client` module for client-side helpers, and the `server` module for (partial) evaluation.

use ark_ec::CurveGroup;
use ark_ff::{Field, Zero};
use rand::{CryptoRng, Rng};

use crate::{
    Error,
    group::{self, Affine, ScalarField},
};

pub mod client;
pub mod server;

/// A blinded OPRF client request, containing the curve point encoding the blinded query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlindedOprfRequest(Affine);

impl BlindedOprfRequest {
    /// Construct a new [`BlindedOprfRequest`] from an affine point.
    pub fn new(value: Affine) -> Self {
        Self(value)
    }

    /// Returns the blinded query as an affine curve point.
    pub fn blinded_query(&self) -> Affine {
        self.0
    }
}

/// The OPRF query blinding factor.
///
/// Never zero. Must stay with the client until the response is unblinded.
#[derive(Clone, PartialEq, Eq)]
pub struct BlindingFactor(ScalarField);

impl std::fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlindingFactor(<redacted>)")
    }
}

impl BlindingFactor {
    /// Generate a new random, non-zero blinding factor using the provided RNG.
    ///
    /// # Errors
    /// Returns [`Error::RandomnessFailure`] if the random source fails.
    pub fn rand(rng: &mut (impl CryptoRng + Rng)) -> Result<Self, Error> {
        Ok(Self(group::random_nonzero_scalar(rng)?))
    }

    /// Construct a new [`BlindingFactor`] from a scalar value.
    ///
    /// Strongly prefer using [`BlindingFactor::rand`] to generate a secure random blinding factor and only use this method
    /// if you have a specific need for constructing a [`BlindingFactor`] directly.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBlindingFactor`] if the provided value is zero.
    pub fn from_scalar(value: ScalarField) -> Result<Self, Error> {
        if value.is_zero() {
            return Err(Error::InvalidBlindingFactor);
        }
        Ok(Self(value))
    }

    /// Prepare the blinding factor for unblinding (by inverting the blinding scalar).
    pub fn prepare(&self) -> PreparedBlindingFactor {
        // the factor is non-zero by construction
        PreparedBlindingFactor(self.0.inverse().unwrap_or_else(ScalarField::zero))
    }

    /// Returns the (non-inverted) blinding factor.
    pub fn beta(&self) -> ScalarField {
        self.0
    }
}

/// Prepared blinding factor, storing the inverse for unblinding.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedBlindingFactor(ScalarField);

impl PreparedBlindingFactor {
    /// Returns the (inverted) blinding factor.
    pub fn beta_inv(&self) -> ScalarField {
        self.0
    }
}

/// The blinded OPRF response of a node (or of the recombined quorum), as an affine curve point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlindedOprfResponse(Affine);

impl BlindedOprfResponse {
    /// Construct a new blinded response from an affine point.
    pub fn new(p: Affine) -> Self {
        Self(p)
    }

    /// Unblind the server response using the prepared blinding factor.
    pub fn unblind_response(&self, blinding_factor: &PreparedBlindingFactor) -> Affine {
        (self.0 * blinding_factor.beta_inv()).into_affine()
    }

    /// Return the affine curve point of the response.
    pub fn response(&self) -> Affine {
        self.0
    }
}
