// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! FIDO authenticator metadata and attestation trust.
//!
//! This crate answers the two questions a relying party has to settle before
//! trusting a registering authenticator:
//! * Is a piece of authenticator metadata authentic, i.e., was it published
//!   by the FIDO metadata service?  See [`mds`] and [`jws`].
//! * Does the authenticator's attestation certificate chain lead to one of
//!   its trusted roots without going through a revoked certificate?  See
//!   [`chain`].
//!
//! Network access goes through the [`http::HttpClient`] trait, so that
//! callers can plug in their own transport.

pub mod chain;
pub mod config;
pub mod http;
pub mod jws;
pub mod mds;

#[cfg(test)]
mod testutil;
