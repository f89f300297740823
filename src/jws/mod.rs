// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The jws module authenticates compact JWS objects signed with a key whose
//! certificate travels in the `x5c` header parameter, as used by the FIDO
//! metadata service for its table of contents.
//!
//! # Example
//!
//! ```no_run
//! use fidotrust::jws::Verifier;
//!
//! # let token = String::new();
//! let payload = Verifier::default()
//!     .verify_and_extract_payload(&token)
//!     .expect("verifying TOC");
//! ```

pub use self::errors::Error;
pub use self::token::SignedToken;
pub use self::verifier::{AlgorithmPolicy, Verifier};

pub(crate) mod base64;
mod errors;
mod token;
mod verifier;

/// Verify `token` with the default (ES256 only) policy and return its payload
pub fn verify_and_extract_payload(token: &str) -> Result<Vec<u8>, Error> {
    Verifier::default().verify_and_extract_payload(token)
}
