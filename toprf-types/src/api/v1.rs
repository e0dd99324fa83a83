//! # v1 API types
//!
//! Data transfer objects for the version 1 threshold OPRF API.
//!
//! A client sends the same [`EvaluationRequest`] to every node of the
//! quorum. Each node answers with an [`EvaluationResponse`] carrying its
//! partial evaluation and a DLog equality proof binding the evaluation to
//! its public key share.
use std::fmt;

use serde::{Deserialize, Serialize};
use toprf_core::{
    DLogEqualityProof,
    group::Affine,
    oprf::{BlindedOprfRequest, BlindedOprfResponse},
};
use uuid::Uuid;

use crate::{crypto::PartyId, serde_compat};

/// A request sent by a client to perform a partial OPRF evaluation.
#[derive(Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Unique ID of the request (used to correlate responses).
    pub request_id: Uuid,
    /// Input point `B` of the OPRF, serialized as a BabyJubJub affine point.
    #[serde(serialize_with = "serde_compat::serialize_affine")]
    #[serde(deserialize_with = "serde_compat::deserialize_affine")]
    pub blinded_query: Affine,
}

/// A node's answer to an [`EvaluationRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// The ID of the answered request.
    pub request_id: Uuid,
    /// The party ID of the node.
    pub party_id: PartyId,
    /// The partial evaluation `B * x_i`.
    #[serde(serialize_with = "serde_compat::serialize_affine")]
    #[serde(deserialize_with = "serde_compat::deserialize_affine")]
    pub evaluation: Affine,
    /// Proof that `evaluation` and the node's public key share have the same discrete log.
    #[serde(serialize_with = "serde_compat::serialize_proof")]
    #[serde(deserialize_with = "serde_compat::deserialize_proof")]
    pub proof: DLogEqualityProof,
}

impl EvaluationRequest {
    /// Creates a request with a fresh random ID.
    pub fn new(blinded_request: &BlindedOprfRequest) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            blinded_query: blinded_request.blinded_query(),
        }
    }

    /// Returns the blinded query.
    pub fn blinded_request(&self) -> BlindedOprfRequest {
        BlindedOprfRequest::new(self.blinded_query)
    }
}

impl EvaluationResponse {
    /// Returns the partial evaluation.
    pub fn blinded_response(&self) -> BlindedOprfResponse {
        BlindedOprfResponse::new(self.evaluation)
    }
}

impl fmt::Debug for EvaluationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationRequest")
            .field("req_id", &self.request_id)
            .field("blinded_query", &self.blinded_query.to_string())
            .finish()
    }
}
