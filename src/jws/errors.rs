// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed token: {0}")]
    MalformedToken(String),
    #[error("Empty payload")]
    EmptyPayload,
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Missing signing certificate: {0}")]
    MissingSigningCertificate(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MalformedToken(e)
            | Error::UnsupportedAlgorithm(e)
            | Error::MissingSigningCertificate(e)
            | Error::InvalidSignature(e) => {
                write!(f, "{}", e)
            }
            Error::EmptyPayload => write!(f, "empty payload"),
        }
    }
}
