//! Secret sharing of the OPRF master key.
//!
//! The dealer samples a random polynomial `f(x) = sk + a_1*x + ... + a_{t-1}*x^{t-1}` over the scalar field and hands
//! party `i` the share `f(i)` together with the public key share `G*f(i)`. Any `t` shares determine `sk` via Lagrange
//! interpolation at `x = 0`, fewer reveal nothing about it.
//!
//! Parties are addressed by their 1-based [`ShareIndex`], which is also the evaluation point of their share. There is
//! no other index space: array positions never leak into the protocol.

use std::{collections::BTreeMap, fmt, num::NonZeroU16};

use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    Error,
    dlog_equality::DLogEqualityProof,
    group::{self, Affine, CURVE, ScalarField},
    oprf::{BlindedOprfRequest, BlindedOprfResponse},
    shamir,
};

/// The 1-based public index of a party, used as the evaluation point of its share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareIndex(NonZeroU16);

impl ShareIndex {
    /// Creates an index, rejecting zero.
    pub fn new(index: u16) -> Result<Self, Error> {
        NonZeroU16::new(index)
            .map(Self)
            .ok_or(Error::InvalidPartyIndex(0))
    }

    /// Returns the index as `u16`.
    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl TryFrom<usize> for ShareIndex {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .ok()
            .and_then(NonZeroU16::new)
            .map(Self)
            .ok_or(Error::InvalidPartyIndex(value))
    }
}

impl From<ShareIndex> for ScalarField {
    fn from(value: ShareIndex) -> Self {
        ScalarField::from(value.get())
    }
}

impl fmt::Display for ShareIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A party's share `f(i)` of the OPRF master key.
///
/// Not `Debug`/`Display` to avoid accidental leaks.
#[derive(Clone, ZeroizeOnDrop)]
pub struct OprfKeyShare(ScalarField);

impl OprfKeyShare {
    /// Wraps a scalar as key share.
    pub fn new(value: ScalarField) -> Self {
        Self(value)
    }

    /// Returns the secret scalar.
    pub fn expose(&self) -> ScalarField {
        self.0
    }
}

/// The key material of a single party: index, private share and public share.
///
/// Created once at setup by [`create_shares`], immutable afterwards.
#[derive(Clone)]
pub struct Share {
    index: ShareIndex,
    private_key: OprfKeyShare,
    public_key: Affine,
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("index", &self.index)
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key.to_string())
            .finish()
    }
}

impl Share {
    /// The 1-based index of this share.
    pub fn index(&self) -> ShareIndex {
        self.index
    }

    /// The private share `f(i)`.
    pub fn private_key(&self) -> &OprfKeyShare {
        &self.private_key
    }

    /// The public key share `G*f(i)`.
    pub fn public_key(&self) -> Affine {
        self.public_key
    }

    /// Evaluates a blinded query with the private share and proves that the same exponent as in the public key share
    /// was used.
    ///
    /// # Errors
    /// Returns [`Error::RandomnessFailure`] if the proof nonce cannot be sampled.
    pub fn evaluate(
        &self,
        query: &BlindedOprfRequest,
        rng: &mut (impl CryptoRng + Rng),
    ) -> Result<(BlindedOprfResponse, DLogEqualityProof), Error> {
        crate::oprf::server::evaluate_with_proof(self.private_key.0, query, rng)
    }
}

/// Public key shares of all parties, as known to a client after setup.
///
/// Contributions of nodes are verified against this registry, never against a key a node claims for itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicKeyShares(BTreeMap<ShareIndex, Affine>);

impl PublicKeyShares {
    /// Returns the public key share of the party with the given index.
    pub fn get(&self, index: ShareIndex) -> Option<Affine> {
        self.0.get(&index).copied()
    }

    /// Registers the public key share of a party, returning the previous one.
    pub fn insert(&mut self, index: ShareIndex, public_key: Affine) -> Option<Affine> {
        self.0.insert(index, public_key)
    }

    /// Number of registered parties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff no party is registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All registered indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = ShareIndex> + '_ {
        self.0.keys().copied()
    }
}

impl<'a> FromIterator<&'a Share> for PublicKeyShares {
    fn from_iter<T: IntoIterator<Item = &'a Share>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|share| (share.index, share.public_key))
                .collect(),
        )
    }
}

/// The random coefficients `a_1..a_{t-1}` of a sharing polynomial. The constant term is the secret and is never
/// stored here.
#[derive(ZeroizeOnDrop)]
struct SharingPoly {
    coeffs: Vec<ScalarField>,
}

impl SharingPoly {
    fn random(threshold: usize, rng: &mut (impl CryptoRng + Rng)) -> Result<Self, Error> {
        let coeffs = (1..threshold)
            .map(|_| group::random_scalar(rng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { coeffs })
    }

    fn eval(&self, secret: ScalarField, x: ScalarField) -> ScalarField {
        shamir::evaluate_poly(secret, &self.coeffs, x)
    }
}

/// Splits `secret` into `num_parties` shares such that any `threshold` of them can recombine it.
///
/// The shares are returned in index order, i.e. `shares[k].index() == k + 1`.
///
/// # Errors
/// Returns [`Error::InvalidThreshold`] unless `1 <= threshold <= num_parties`, [`Error::InvalidPartyIndex`] if
/// `num_parties` does not fit into the index space, and [`Error::RandomnessFailure`] if the coefficients cannot be
/// sampled. Parameters are checked before any randomness is drawn.
pub fn create_shares(
    num_parties: usize,
    threshold: usize,
    secret: ScalarField,
    rng: &mut (impl CryptoRng + Rng),
) -> Result<Vec<Share>, Error> {
    if threshold == 0 || threshold > num_parties {
        return Err(Error::InvalidThreshold {
            threshold,
            num_parties,
        });
    }
    // the largest index must be representable
    ShareIndex::try_from(num_parties)?;

    let poly = SharingPoly::random(threshold, rng)?;
    let mut shares = Vec::with_capacity(num_parties);
    for i in 1..=num_parties {
        let index = ShareIndex::try_from(i)?;
        let mut private_key = poly.eval(secret, index.into());
        let public_key = CURVE.mul_generator(private_key);
        shares.push(Share {
            index,
            private_key: OprfKeyShare(private_key),
            public_key,
        });
        private_key.zeroize();
    }
    tracing::debug!("created {num_parties} shares with threshold {threshold}");
    Ok(shares)
}

/// Recombines the public key shares of the given parties into the master public key `G*sk`.
pub fn recombine_public_key(
    shares: &PublicKeyShares,
    indices: &[ShareIndex],
    threshold: usize,
) -> Result<Affine, Error> {
    let keys = indices
        .iter()
        .map(|&i| shares.get(i).ok_or(Error::UnknownParty(i.get())))
        .collect::<Result<Vec<_>, _>>()?;
    shamir::combine_threshold(indices, &keys, threshold)
}
