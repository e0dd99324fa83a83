//! Client-side state of a single threshold OPRF evaluation.
//!
//! A [`ThresholdOprfSession`] is created for one blinded request. Every node answer is verified against the public key
//! share the client registered for that node at setup. Once enough contributions are accepted, [`ThresholdOprfSession::finalize`]
//! recombines them in the exponent and removes the blinding.
//!
//! How a failing proof is treated is decided by the [`VerificationPolicy`]:
//! - [`VerificationPolicy::Abort`] (default): the failure is returned to the caller and the session is poisoned.
//! - [`VerificationPolicy::Discard`]: the contribution is dropped and the session continues. Callers should solicit more
//!   than `threshold` nodes in this mode.

use crate::{
    Error,
    dlog_equality::DLogEqualityProof,
    group::Affine,
    keygen::{PublicKeyShares, ShareIndex},
    oprf::{BlindedOprfRequest, BlindedOprfResponse, BlindingFactor, client},
    shamir,
};

/// What to do with a contribution whose proof does not verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationPolicy {
    /// Treat a failing proof as fatal for the whole session.
    #[default]
    Abort,
    /// Drop the failing contribution and continue with the remaining ones.
    Discard,
}

/// Outcome of [`ThresholdOprfSession::add_contribution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The proof verified and the evaluation takes part in the recombination.
    Accepted,
    /// The proof failed and the contribution was dropped ([`VerificationPolicy::Discard`] only).
    Rejected,
}

/// The result of a finished threshold OPRF evaluation.
#[derive(Debug, Clone)]
pub struct ThresholdOprfOutput {
    /// The recombined blinded response `B*sk`.
    pub blinded_response: BlindedOprfResponse,
    /// The unblinded PRF value `H(data)*sk`.
    pub unblinded_response: Affine,
    /// The parties whose evaluations were recombined, in the order they were accepted.
    pub contributors: Vec<ShareIndex>,
}

impl ThresholdOprfOutput {
    /// Derives the final 32-byte PRF output for `data`. See [`client::finalize_query`].
    pub fn finalize(&self, data: &[u8]) -> [u8; 32] {
        client::finalize_query(data, self.unblinded_response)
    }
}

/// Collects, verifies and recombines the node contributions for one blinded request.
#[derive(Debug)]
pub struct ThresholdOprfSession {
    public_shares: PublicKeyShares,
    threshold: usize,
    policy: VerificationPolicy,
    request: BlindedOprfRequest,
    blinding_factor: BlindingFactor,
    accepted: Vec<ShareIndex>,
    evaluations: Vec<Affine>,
    rejected: Vec<ShareIndex>,
    poisoned_by: Option<ShareIndex>,
}

impl ThresholdOprfSession {
    /// Creates a new session for `request`, which was blinded with `blinding_factor`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidThreshold`] unless `1 <= threshold <= public_shares.len()`.
    pub fn new(
        public_shares: PublicKeyShares,
        threshold: usize,
        policy: VerificationPolicy,
        request: BlindedOprfRequest,
        blinding_factor: BlindingFactor,
    ) -> Result<Self, Error> {
        if threshold == 0 || threshold > public_shares.len() {
            return Err(Error::InvalidThreshold {
                threshold,
                num_parties: public_shares.len(),
            });
        }
        Ok(Self {
            public_shares,
            threshold,
            policy,
            request,
            blinding_factor,
            accepted: Vec::with_capacity(threshold),
            evaluations: Vec::with_capacity(threshold),
            rejected: Vec::new(),
            poisoned_by: None,
        })
    }

    /// The blinded request this session collects answers for.
    pub fn request(&self) -> &BlindedOprfRequest {
        &self.request
    }

    /// The policy applied to failing proofs.
    pub fn policy(&self) -> VerificationPolicy {
        self.policy
    }

    /// Parties whose contributions were accepted so far.
    pub fn accepted(&self) -> &[ShareIndex] {
        &self.accepted
    }

    /// Parties whose contributions were dropped so far.
    pub fn rejected(&self) -> &[ShareIndex] {
        &self.rejected
    }

    /// Returns `true` once at least `threshold` contributions are accepted.
    pub fn is_complete(&self) -> bool {
        self.accepted.len() >= self.threshold
    }

    /// Verifies the contribution of party `index` and records it.
    ///
    /// # Errors
    /// - [`Error::InvalidProof`] if the proof fails under [`VerificationPolicy::Abort`], or if the session was already
    ///   poisoned by an earlier failure.
    /// - [`Error::UnknownParty`] if no public key share is registered for `index`.
    /// - [`Error::DuplicateContribution`] if `index` already contributed (accepted or rejected).
    pub fn add_contribution(
        &mut self,
        index: ShareIndex,
        response: &BlindedOprfResponse,
        proof: &DLogEqualityProof,
    ) -> Result<Verification, Error> {
        if let Some(party) = self.poisoned_by {
            return Err(Error::InvalidProof { party: party.get() });
        }
        let public_key = self
            .public_shares
            .get(index)
            .ok_or(Error::UnknownParty(index.get()))?;
        if self.accepted.contains(&index) || self.rejected.contains(&index) {
            return Err(Error::DuplicateContribution(index.get()));
        }

        match proof.verify(
            public_key,
            response.response(),
            self.request.blinded_query(),
        ) {
            Ok(()) => {
                tracing::trace!("accepted contribution of party {index}");
                self.accepted.push(index);
                self.evaluations.push(response.response());
                Ok(Verification::Accepted)
            }
            Err(_) => match self.policy {
                VerificationPolicy::Abort => {
                    self.poisoned_by = Some(index);
                    Err(Error::InvalidProof { party: index.get() })
                }
                VerificationPolicy::Discard => {
                    tracing::warn!("discarding contribution of party {index}: invalid DLog proof");
                    self.rejected.push(index);
                    Ok(Verification::Rejected)
                }
            },
        }
    }

    /// Recombines the accepted contributions and unblinds the result.
    ///
    /// # Errors
    /// Returns [`Error::InvalidProof`] if the session was poisoned and [`Error::NotEnoughContributions`] if fewer than
    /// `threshold` contributions were accepted.
    pub fn finalize(self) -> Result<ThresholdOprfOutput, Error> {
        if let Some(party) = self.poisoned_by {
            return Err(Error::InvalidProof { party: party.get() });
        }
        tracing::debug!(
            "recombining {} contributions (threshold {}, {} rejected)",
            self.accepted.len(),
            self.threshold,
            self.rejected.len()
        );
        let combined =
            shamir::combine_threshold(&self.accepted, &self.evaluations, self.threshold)?;
        let blinded_response = BlindedOprfResponse::new(combined);
        let unblinded_response =
            client::unblind(&blinded_response, &self.blinding_factor.prepare());
        Ok(ThresholdOprfOutput {
            blinded_response,
            unblinded_response,
            contributors: self.accepted,
        })
    }
}
