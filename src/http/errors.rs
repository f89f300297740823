// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Client setup error: {0}")]
    Setup(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Transport(e) | Error::Setup(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
