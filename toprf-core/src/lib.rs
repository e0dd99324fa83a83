#![deny(clippy::unwrap_used)]
//! This crate implements a threshold Oblivious Pseudorandom Function (TOPRF) over the BabyJubJub curve.
//!
//! A client computes `PRF(sk, data)` where `sk` is Shamir-shared among `n` nodes. Any `t` of them answer a blinded
//! query with a partial evaluation and a Chaum-Pedersen proof binding it to their public key share. The client verifies
//! every contribution, recombines them via Lagrange interpolation in the exponent and unblinds the result.
//!
//! Modules include:
//! - **group**: The group/field adapter (scalar sampling, hashing into the group and the scalar field, encodings).
//! - **keygen**: Secret sharing of a master key into `(index, private share, public share)` tuples.
//! - **dlog_equality**: Chaum-Pedersen proofs for discrete log equality.
//! - **oprf**: Blinded OPRF protocol types and client/server operations.
//! - **shamir**: Lagrange coefficients and threshold recombination of scalars and points.
//! - **session**: Client-side collection and verification of node contributions.
pub mod dlog_equality;
pub mod group;
pub mod keygen;
pub mod oprf;
pub mod session;
pub mod shamir;

pub use dlog_equality::{DLogEqualityProof, InvalidProof};
pub use keygen::{PublicKeyShares, Share, ShareIndex, create_shares};
pub use session::{ThresholdOprfOutput, ThresholdOprfSession, Verification, VerificationPolicy};

/// Errors returned by the threshold OPRF protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The threshold is zero or exceeds the number of parties.
    #[error("invalid threshold {threshold} for {num_parties} parties")]
    InvalidThreshold {
        /// requested threshold
        threshold: usize,
        /// requested number of parties
        num_parties: usize,
    },
    /// Party indices are 1-based and fit into a `u16`.
    #[error("invalid party index {0}")]
    InvalidPartyIndex(usize),
    /// An index set used for interpolation was empty.
    #[error("index set is empty")]
    EmptyIndexSet,
    /// An index occurs more than once in an index set.
    #[error("duplicate index {0} in index set")]
    DuplicateIndex(u16),
    /// Indices and evaluations passed to recombination differ in length.
    #[error("got {indices} indices but {evaluations} evaluations")]
    LengthMismatch {
        /// amount of indices
        indices: usize,
        /// amount of evaluations
        evaluations: usize,
    },
    /// Fewer contributions than the threshold were supplied.
    #[error("expected at least {threshold} contributions, got {got}")]
    NotEnoughContributions {
        /// actual amount of contributions
        got: usize,
        /// expected threshold
        threshold: usize,
    },
    /// The DLog equality proof of a party could not be verified.
    #[error("DLog proof of party {party} could not be verified")]
    InvalidProof {
        /// the index of the misbehaving party
        party: u16,
    },
    /// A contribution came from a party without a registered public key share.
    #[error("no public key share for party {0}")]
    UnknownParty(u16),
    /// A party contributed twice to the same session.
    #[error("party {0} already contributed")]
    DuplicateContribution(u16),
    /// The random source failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,
    /// The blinding factor may not be zero.
    #[error("invalid blinding factor, may not be zero")]
    InvalidBlindingFactor,
    /// A byte encoding could not be decoded into a scalar or group element.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(&'static str),
}
