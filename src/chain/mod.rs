// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The chain module decides whether an authenticator's attestation
//! certificate chain leads to a trusted root and has not been revoked.
//!
//! The actual path validation is delegated to a [`ChainVerifier`], either
//! the `openssl` command line tool ([`OpensslCommand`]) or the in-process
//! [`NativeVerifier`].  The [`ChainValidator`] stages the certificates and
//! any CRLs it can discover on disk, picks the verification flags, and makes
//! sure nothing is left behind.
//!
//! # Example
//!
//! ```no_run
//! use fidotrust::chain::{Certificate, ChainValidator, NativeVerifier};
//! use fidotrust::http::BlockingClient;
//! use std::time::Duration;
//!
//! # let (leaf, root) = (Vec::new(), Vec::new());
//! let http = BlockingClient::new(Duration::from_secs(10)).expect("HTTP client");
//! let v = ChainValidator::new(http, NativeVerifier);
//!
//! v.check(&[Certificate::new(leaf)], &[Certificate::new(root)])
//!     .expect("trusted attestation chain");
//! ```

pub use self::certificate::{der_to_pem, normalize_to_pem, Certificate};
pub use self::errors::Error;
pub use self::revocation::{crl_distribution_point, RevocationResolver};
pub use self::tempstore::{ScopedDirectory, StagedFile};
pub use self::validator::{check_validity, ChainValidator};
pub use self::verifier::{ChainVerifier, NativeVerifier, OpensslCommand, VerifyRequest};

mod certificate;
mod errors;
mod revocation;
mod tempstore;
mod validator;
mod verifier;
