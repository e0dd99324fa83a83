//! Serde helpers for group elements, scalars and DLog equality proofs.
//!
//! Every value is written as a fixed-width big-endian byte string:
//! * scalars: 32 bytes,
//! * points: `x || y`, 64 bytes,
//! * proofs: `c || r`, 64 bytes.
//!
//! Binary formats (CBOR) store them as byte strings, text formats (JSON) as arrays of numbers. Deserialization rejects
//! wrong lengths, non-canonical scalars and points outside the prime-order subgroup.

use std::{fmt, marker::PhantomData};

use serde::{Deserializer, Serializer, de};
use toprf_core::{
    DLogEqualityProof,
    group::{self, Affine, POINT_BYTES, SCALAR_BYTES, ScalarField},
};

const PROOF_BYTES: usize = 2 * SCALAR_BYTES;

/// Serializes a curve point as `x || y`.
pub fn serialize_affine<S: Serializer>(p: &Affine, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_bytes(&group::point_to_bytes(*p))
}

/// Deserializes a curve point and checks subgroup membership.
pub fn deserialize_affine<'de, D>(deserializer: D) -> Result<Affine, D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = deserializer.deserialize_bytes(FixedBytesVisitor::<POINT_BYTES>::default())?;
    group::point_from_bytes(&bytes).map_err(de::Error::custom)
}

/// Serializes a scalar as 32 big-endian bytes.
pub fn serialize_scalar<S: Serializer>(s: &ScalarField, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_bytes(&group::scalar_to_bytes(*s))
}

/// Deserializes a canonical scalar.
pub fn deserialize_scalar<'de, D>(deserializer: D) -> Result<ScalarField, D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = deserializer.deserialize_bytes(FixedBytesVisitor::<SCALAR_BYTES>::default())?;
    group::scalar_from_bytes(&bytes).map_err(de::Error::custom)
}

/// Serializes a [`DLogEqualityProof`] as `c || r`.
pub fn serialize_proof<S: Serializer>(
    proof: &DLogEqualityProof,
    ser: S,
) -> Result<S::Ok, S::Error> {
    let mut bytes = [0u8; PROOF_BYTES];
    bytes[..SCALAR_BYTES].copy_from_slice(&group::scalar_to_bytes(proof.c));
    bytes[SCALAR_BYTES..].copy_from_slice(&group::scalar_to_bytes(proof.r));
    ser.serialize_bytes(&bytes)
}

/// Deserializes a [`DLogEqualityProof`]. Both scalars must be canonical.
pub fn deserialize_proof<'de, D>(deserializer: D) -> Result<DLogEqualityProof, D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = deserializer.deserialize_bytes(FixedBytesVisitor::<PROOF_BYTES>::default())?;
    let (c, r) = bytes.split_at(SCALAR_BYTES);
    Ok(DLogEqualityProof {
        c: group::scalar_from_bytes(c).map_err(de::Error::custom)?,
        r: group::scalar_from_bytes(r).map_err(de::Error::custom)?,
    })
}

#[derive(Default)]
struct FixedBytesVisitor<const N: usize>(PhantomData<[u8; N]>);

impl<'de, const N: usize> de::Visitor<'de> for FixedBytesVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a byte string of length {N}")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.try_into()
            .map_err(|_| de::Error::invalid_length(v.len(), &self))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = [0u8; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        //check if there are no more elements
        if seq.next_element::<u8>()?.is_some() {
            return Err(de::Error::invalid_length(N + 1, &self));
        }
        Ok(bytes)
    }
}
