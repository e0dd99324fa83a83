//! Common cryptographic types used by threshold OPRF clients and nodes.
//!
//! Main types:
//! * [`PartyId`]
//! * [`OprfPublicKey`]
//! * [`PublicKeyShare`]

use std::fmt;

use serde::{Deserialize, Serialize};
use toprf_core::{ShareIndex, group::Affine};

use crate::serde_compat;

/// The party id of an OPRF node.
///
/// Party ids share the 1-based index space of the key shares.
#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PartyId(pub u16);

impl PartyId {
    /// Converts to a `u16`.
    pub fn into_inner(self) -> u16 {
        self.0
    }

    /// Returns the share index of this party.
    ///
    /// # Errors
    /// Returns [`toprf_core::Error::InvalidPartyIndex`] for the party id `0`.
    pub fn share_index(self) -> Result<ShareIndex, toprf_core::Error> {
        ShareIndex::new(self.0)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("PartyId({})", self.0))
    }
}

impl From<u16> for PartyId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<PartyId> for u16 {
    fn from(value: PartyId) -> Self {
        value.0
    }
}

impl From<ShareIndex> for PartyId {
    fn from(value: ShareIndex) -> Self {
        Self(value.get())
    }
}

/// The OPRF public-key.
///
/// Constructed by multiplying the BabyJubJub generator with the secret shared among the OPRF nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OprfPublicKey(
    #[serde(serialize_with = "serde_compat::serialize_affine")]
    #[serde(deserialize_with = "serde_compat::deserialize_affine")]
    Affine,
);

impl From<Affine> for OprfPublicKey {
    fn from(value: Affine) -> Self {
        Self(value)
    }
}

impl OprfPublicKey {
    /// Create a new `OprfPublicKey` by wrapping a BabyJubJub point.
    pub fn new(value: Affine) -> Self {
        Self::from(value)
    }

    /// Gets the inner value (a BabyJubJub point in Affine representation).
    pub fn inner(self) -> Affine {
        self.0
    }
}

impl fmt::Display for OprfPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("OprfPublicKey({})", self.0))
    }
}

/// The public key share of a single node, as published at setup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyShare {
    /// The node owning the share.
    pub party_id: PartyId,
    /// `G * f(party_id)`.
    #[serde(serialize_with = "serde_compat::serialize_affine")]
    #[serde(deserialize_with = "serde_compat::deserialize_affine")]
    pub public_key: Affine,
}

impl From<&toprf_core::Share> for PublicKeyShare {
    fn from(share: &toprf_core::Share) -> Self {
        Self {
            party_id: share.index().into(),
            public_key: share.public_key(),
        }
    }
}

/// Collects published key shares into the registry used by a client.
///
/// # Errors
/// Returns [`toprf_core::Error::InvalidPartyIndex`] for party id `0` and [`toprf_core::Error::DuplicateIndex`] if a
/// party occurs twice.
pub fn public_key_shares(
    shares: impl IntoIterator<Item = PublicKeyShare>,
) -> Result<toprf_core::PublicKeyShares, toprf_core::Error> {
    let mut registry = toprf_core::PublicKeyShares::default();
    for share in shares {
        let index = share.party_id.share_index()?;
        if registry.insert(index, share.public_key).is_some() {
            return Err(toprf_core::Error::DuplicateIndex(index.get()));
        }
    }
    Ok(registry)
}
