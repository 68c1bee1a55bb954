//! `hearth-auth` — pre-shared-key authentication for bridge ingress.
//!
//! # Overview
//!
//! Every inbound bridge request carries a signature, an epoch-millis
//! timestamp, a bridge id, and a caller-chosen nonce. The [`IngressGate`]
//! validates them in a fast-failing pipeline: field extraction, credential
//! lookup, replay-cache consumption, then signature comparison. Consumption
//! happens *before* the signature check so an attacker cannot probe signature
//! validity with a stale or duplicate token without it being recorded
//! consumed.
//!
//! The signature wire format is a lowercase 64-character hex SHA-256 digest
//! of `body + timestamp + psk + nonce`.
//!
//! All state is process-lifetime only; nothing here touches disk.

pub mod gate;
pub mod replay;
pub mod types;

pub use gate::{expected_signature, IngressGate};
pub use replay::{ParamToken, ReplayCache};
pub use types::{AuthFailure, AuthResult, BridgeCredential, CredentialStore, IngressRequest};
