#![deny(missing_docs)]
//! Core type definitions exchanged between threshold OPRF clients and nodes.
//!
//! This crate groups together the strongly-typed values and message
//! structures used on the wire. It provides:
//!
//! * Cryptographic identifiers and keys (see [`crypto`] module).
//! * API versioned request/response types (see [`api`] module).
//! * Serde helpers encoding curve points and scalars as fixed-width
//!   big-endian byte strings (see [`serde_compat`] module).
//! * CBOR framing of messages (see [`cbor`] module).
//!
//! All decoders validate their input: points must lie in the prime-order
//! subgroup and scalars must be canonical.

pub mod api;
pub mod cbor;
pub mod crypto;
pub mod serde_compat;
