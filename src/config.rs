// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! JSON configuration for the metadata service client and the chain
//! validator.
//!
//! ```json
//! {
//!   "mds": { "token": "...", "verify_entry_hash": true },
//!   "chain": { "verifier": "openssl", "process_timeout_secs": 10 }
//! }
//! ```

use crate::chain::{ChainVerifier, NativeVerifier, OpensslCommand};
use crate::mds::DEFAULT_BASE_URI;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub mds: MdsConfig,
    #[serde(default)]
    pub chain: ChainConfig,
}

impl Config {
    pub fn load_json(j: &str) -> Result<Self, serde_json::Error> {
        let c: Config = serde_json::from_str(j)?;
        Ok(c)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MdsConfig {
    pub base_uri: String,
    /// Access token appended to every metadata service request
    pub token: String,
    /// Require statement bodies to match the digest in their TOC entry
    pub verify_entry_hash: bool,
}

impl Default for MdsConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            token: String::new(),
            verify_entry_hash: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierKind {
    #[default]
    Native,
    Openssl,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Where temporary artifacts go; the system temp dir if unset
    pub work_dir: Option<PathBuf>,
    /// The `openssl` executable, used when `verifier` is `openssl`
    pub openssl: PathBuf,
    pub verifier: VerifierKind,
    pub process_timeout_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            openssl: PathBuf::from("openssl"),
            verifier: VerifierKind::Native,
            process_timeout_secs: 30,
            http_timeout_secs: 30,
        }
    }
}

impl ChainConfig {
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn chain_verifier(&self) -> Box<dyn ChainVerifier> {
        match self.verifier {
            VerifierKind::Native => Box::new(NativeVerifier),
            VerifierKind::Openssl => {
                Box::new(OpensslCommand::new(&self.openssl, self.process_timeout()))
            }
        }
    }
}
