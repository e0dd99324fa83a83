//! The group and field adapter the protocol is built on.
//!
//! All protocol code works over the prime-order subgroup of BabyJubJub. This module fixes the process-wide constants
//! (generator, group order) in an immutable [`CurveContext`] and provides the primitives the protocol consumes:
//!
//! - uniform scalar sampling from a CSPRNG, by rejection sampling (never by modular reduction),
//! - a domain-separated hash into the scalar field (blake3 in XOF mode, again rejection sampled),
//! - a hash from arbitrary bytes onto the curve,
//! - fixed-width big-endian encodings for scalars and points.

use std::{convert::Infallible, sync::LazyLock};

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use rand::{CryptoRng, Rng};
use zeroize::Zeroize;

use crate::Error;

mod mappings;

/// Affine representation of a BabyJubJub point.
pub type Affine = ark_babyjubjub::EdwardsAffine;
/// Projective representation of a BabyJubJub point.
pub type Projective = ark_babyjubjub::EdwardsProjective;
/// The scalar field of the prime-order subgroup, i.e. integers mod `N`.
pub type ScalarField = ark_babyjubjub::Fr;
/// The base field the curve coordinates live in.
pub type BaseField = ark_babyjubjub::Fq;

/// Length of an encoded scalar.
pub const SCALAR_BYTES: usize = 32;
/// Length of an encoded point (`x || y`).
pub const POINT_BYTES: usize = 2 * SCALAR_BYTES;

// Clears the bits above the bit size of `N` in the most significant byte of a candidate.
const TOP_BYTE_MASK: u8 = 0xff >> (SCALAR_BYTES as u32 * 8 - ScalarField::MODULUS_BIT_SIZE);

const HASH_TO_POINT_DS: &[u8] = b"TOPRF_HashToPoint";

/// Process-wide curve constants.
pub static CURVE: LazyLock<CurveContext> = LazyLock::new(CurveContext::babyjubjub);

/// The immutable curve configuration: the distinguished generator and the group order `N`.
///
/// There is exactly one instance, [`CURVE`], initialized on first use.
#[derive(Debug)]
pub struct CurveContext {
    generator: Affine,
    order: BigUint,
    base_modulus: BigUint,
}

impl CurveContext {
    fn babyjubjub() -> Self {
        Self {
            generator: Affine::generator(),
            order: ScalarField::MODULUS.into(),
            base_modulus: BaseField::MODULUS.into(),
        }
    }

    /// The generator `G` of the prime-order subgroup.
    pub fn generator(&self) -> Affine {
        self.generator
    }

    /// The group order `N` as an arbitrary precision integer.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    /// Computes `G * k`.
    pub fn mul_generator(&self, k: ScalarField) -> Affine {
        (self.generator * k).into_affine()
    }
}

/// Samples a uniform scalar in `[0, N)` from the provided CSPRNG.
///
/// # Errors
/// Returns [`Error::RandomnessFailure`] if the random source fails. There is no fallback to another source.
pub fn random_scalar(rng: &mut (impl CryptoRng + Rng)) -> Result<ScalarField, Error> {
    sample_scalar(|candidate| {
        rng.try_fill_bytes(candidate)
            .map_err(|_| Error::RandomnessFailure)
    })
}

/// Samples a uniform non-zero scalar from the provided CSPRNG.
pub(crate) fn random_nonzero_scalar(
    rng: &mut (impl CryptoRng + Rng),
) -> Result<ScalarField, Error> {
    loop {
        let scalar = random_scalar(rng)?;
        if scalar != ScalarField::from(0u64) {
            return Ok(scalar);
        }
    }
}

/// Maps a domain separator and a sequence of byte strings to a scalar in `[0, N)`.
///
/// The parts are concatenated in order and fed into blake3 after the length-prefixed domain. The XOF output is read
/// in 32-byte blocks until a block falls below `N`.
pub fn hash_to_scalar(domain: &[u8], parts: &[&[u8]]) -> ScalarField {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(domain.len() as u64).to_be_bytes());
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    let mut xof = hasher.finalize_xof();
    sample_scalar(|candidate| {
        xof.fill(candidate);
        Ok::<_, Infallible>(())
    })
    .unwrap_or_else(|never| match never {})
}

/// Deterministically maps arbitrary bytes to a point in the prime-order subgroup. Nobody knows the discrete log of the
/// output with respect to the generator.
pub fn hash_to_point(data: &[u8]) -> Affine {
    let mut hasher = blake3::Hasher::new();
    hasher.update(HASH_TO_POINT_DS);
    hasher.update(data);
    // 64 bytes to have enough statistical security against modulo bias
    let mut wide = [0u8; 64];
    hasher.finalize_xof().fill(&mut wide);
    mappings::encode_to_curve(BaseField::from_le_bytes_mod_order(&wide))
}

/// Rejection sampler shared by [`random_scalar`] and [`hash_to_scalar`].
///
/// `fill` provides 32-byte blocks. The candidate is the block with all bits above the bit size of `N` cleared, so
/// only the low 251 bits are ever compared against `N`. Candidates `>= N` are discarded and a fresh block is requested,
/// never reduced.
pub(crate) fn sample_scalar<E>(
    mut fill: impl FnMut(&mut [u8; SCALAR_BYTES]) -> Result<(), E>,
) -> Result<ScalarField, E> {
    let mut candidate = [0u8; SCALAR_BYTES];
    loop {
        fill(&mut candidate)?;
        candidate[0] &= TOP_BYTE_MASK;
        let value = BigUint::from_bytes_be(&candidate);
        candidate.zeroize();
        if value < CURVE.order {
            return Ok(ScalarField::from(value));
        }
        tracing::trace!("rejected scalar candidate outside of [0, N)");
    }
}

/// Encodes a scalar as 32 big-endian bytes.
pub fn scalar_to_bytes(scalar: ScalarField) -> [u8; SCALAR_BYTES] {
    to_be_array(scalar.into_bigint().to_bytes_be())
}

/// Decodes 32 big-endian bytes into a scalar.
///
/// # Errors
/// Returns [`Error::InvalidEncoding`] if the length is wrong or the value is not below `N`. The value is never reduced.
pub fn scalar_from_bytes(bytes: &[u8]) -> Result<ScalarField, Error> {
    if bytes.len() != SCALAR_BYTES {
        return Err(Error::InvalidEncoding("scalar must be 32 bytes"));
    }
    let value = BigUint::from_bytes_be(bytes);
    if value >= CURVE.order {
        return Err(Error::InvalidEncoding("scalar is not reduced"));
    }
    Ok(ScalarField::from(value))
}

/// Encodes a point as its affine coordinates `x || y`, each 32 big-endian bytes.
pub fn point_to_bytes(point: Affine) -> [u8; POINT_BYTES] {
    let mut out = [0u8; POINT_BYTES];
    out[..SCALAR_BYTES].copy_from_slice(&to_be_array(point.x.into_bigint().to_bytes_be()));
    out[SCALAR_BYTES..].copy_from_slice(&to_be_array(point.y.into_bigint().to_bytes_be()));
    out
}

/// Decodes `x || y` into a point.
///
/// # Errors
/// Returns [`Error::InvalidEncoding`] if a coordinate is out of range or the point is not on the curve or not in the
/// prime-order subgroup.
pub fn point_from_bytes(bytes: &[u8]) -> Result<Affine, Error> {
    if bytes.len() != POINT_BYTES {
        return Err(Error::InvalidEncoding("point must be 64 bytes"));
    }
    let (x, y) = bytes.split_at(SCALAR_BYTES);
    let point = Affine::new_unchecked(base_from_bytes(x)?, base_from_bytes(y)?);
    if !point.is_on_curve() {
        return Err(Error::InvalidEncoding("point is not on curve"));
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::InvalidEncoding("point is not in correct subgroup"));
    }
    Ok(point)
}

fn base_from_bytes(bytes: &[u8]) -> Result<BaseField, Error> {
    let value = BigUint::from_bytes_be(bytes);
    if value >= CURVE.base_modulus {
        return Err(Error::InvalidEncoding("coordinate is not reduced"));
    }
    Ok(BaseField::from(value))
}

fn to_be_array(bytes: Vec<u8>) -> [u8; SCALAR_BYTES] {
    let mut out = [0u8; SCALAR_BYTES];
    out[SCALAR_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}
