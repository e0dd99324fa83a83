//! This module implements the client side of the OPRF protocol: hashing the input onto the curve, blinding it,
//! unblinding server responses, verifying server proofs of correctness and deriving the final PRF output.
//!
//! The threshold variant, which collects and verifies the contributions of several nodes before recombining them,
//! lives in [`crate::session`].

use ark_ec::CurveGroup;
use rand::{CryptoRng, Rng};

use crate::{
    Error,
    dlog_equality::{DLogEqualityProof, InvalidProof},
    group::{self, Affine},
    oprf::{BlindedOprfRequest, BlindedOprfResponse, BlindingFactor, PreparedBlindingFactor},
};

const QUERY_DS: &[u8] = b"TOPRF_Query";
const OUTPUT_DS: &[u8] = b"TOPRF_Output";

/// Computes the domain-separated fixed-length digest of the client input.
pub fn query_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(QUERY_DS);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Maps the client input onto the curve: `H(data) = HashToPoint(digest(data))`.
pub fn encode_query(data: &[u8]) -> Affine {
    group::hash_to_point(&query_digest(data))
}

/// Blinds the input with the given blinding factor: `H(data) * beta`.
pub fn blind_query(data: &[u8], blinding_factor: &BlindingFactor) -> BlindedOprfRequest {
    let blinded_query = (encode_query(data) * blinding_factor.beta()).into_affine();
    BlindedOprfRequest(blinded_query)
}

/// Blinds the input with a freshly sampled blinding factor.
///
/// The returned [`BlindingFactor`] must be kept private until the response is unblinded.
///
/// # Errors
/// Returns [`Error::RandomnessFailure`] if the random source fails.
pub fn blind(
    data: &[u8],
    rng: &mut (impl CryptoRng + Rng),
) -> Result<(BlindedOprfRequest, BlindingFactor), Error> {
    let blinding_factor = BlindingFactor::rand(rng)?;
    Ok((blind_query(data, &blinding_factor), blinding_factor))
}

/// Removes the blinding from a (possibly recombined) response: `response * beta^-1`.
pub fn unblind(response: &BlindedOprfResponse, blinding_factor: &PreparedBlindingFactor) -> Affine {
    response.unblind_response(blinding_factor)
}

/// Derives the final 32-byte PRF output from the input and the unblinded point (2Hash-DH).
pub fn finalize_query(data: &[u8], unblinded: Affine) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(OUTPUT_DS);
    hasher.update(&(data.len() as u64).to_be_bytes());
    hasher.update(data);
    hasher.update(&group::point_to_bytes(unblinded));
    *hasher.finalize().as_bytes()
}

/// Verifies the proof of a single (non-threshold) server and unblinds its response.
///
/// # Arguments
///
/// * `public_key` - The public key of the server.
/// * `request` - The blinded request sent to the server.
/// * `response` - The blinded response of the server.
/// * `proof` - The discrete log equality proof of the server.
/// * `blinding_factor` - The blinding factor used for the request.
///
/// # Returns
///
/// The unblinded point if the proof is valid, else `InvalidProof`.
pub fn verify_and_unblind(
    public_key: Affine,
    request: &BlindedOprfRequest,
    response: &BlindedOprfResponse,
    proof: &DLogEqualityProof,
    blinding_factor: &BlindingFactor,
) -> Result<Affine, InvalidProof> {
    proof.verify(public_key, response.response(), request.blinded_query())?;
    Ok(unblind(response, &blinding_factor.prepare()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_digest_domain_separated() {
        let digest = query_digest(b"hello");
        assert_eq!(digest, query_digest(b"hello"));
        assert_ne!(digest, *blake3::hash(b"hello").as_bytes());
    }

    #[test]
    fn test_finalize_query() {
        let point = encode_query(b"hello");
        let out = finalize_query(b"hello", point);
        assert_eq!(out, finalize_query(b"hello", point));
        assert_ne!(out, finalize_query(b"hellp", point));
        assert_ne!(out, finalize_query(b"hello", encode_query(b"hellp")));
    }

    #[test]
    fn test_blind_randomized() {
        let mut rng = rand::thread_rng();
        let (a, _) = blind(b"hello", &mut rng).unwrap();
        let (b, _) = blind(b"hello", &mut rng).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.blinded_query(), encode_query(b"hello"));
    }
}
