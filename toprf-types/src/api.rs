//! This module defines the request and response payloads exchanged
//! between clients and nodes for the threshold OPRF protocol. Types here
//! wrap curve points and proofs with Serde (de)serialization so they can
//! be sent over the wire.
//!
//! Payloads are versioned. The current version is [`v1`].

pub mod v1;

/// The API version implemented by this crate.
pub const PROTOCOL_VERSION: u16 = 1;
