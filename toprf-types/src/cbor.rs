//! CBOR framing of wire messages.

use eyre::Context;
use serde::{Serialize, de::DeserializeOwned};

/// Encodes `value` as CBOR.
pub fn to_vec<T: Serialize>(value: &T) -> eyre::Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).context("while encoding CBOR")?;
    Ok(buf)
}

/// Decodes a CBOR encoded value.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> eyre::Result<T> {
    ciborium::from_reader(bytes).context("while decoding CBOR")
}
