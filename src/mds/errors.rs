// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::{http, jws};

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("TOC entry has no URL")]
    MissingUrl,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Hash mismatch: {0}")]
    HashMismatch(String),
    #[error(transparent)]
    Jws(#[from] jws::Error),
    #[error(transparent)]
    Http(#[from] http::Error),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ServiceUnavailable(e) | Error::InvalidResponse(e) | Error::HashMismatch(e) => {
                write!(f, "{}", e)
            }
            Error::MissingUrl => write!(f, "missing url"),
            Error::Jws(e) => write!(f, "{:?}", e),
            Error::Http(e) => write!(f, "{:?}", e),
        }
    }
}
