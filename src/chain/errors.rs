// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
    #[error("Expired certificate: {0}")]
    ExpiredCertificate(String),
    #[error("Certificate not yet valid: {0}")]
    NotYetValid(String),
    #[error("Directory creation failed: {0}")]
    DirectoryCreationFailed(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidChain(e)
            | Error::ExpiredCertificate(e)
            | Error::NotYetValid(e)
            | Error::DirectoryCreationFailed(e)
            | Error::Io(e)
            | Error::Crypto(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
