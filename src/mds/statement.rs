// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::chain::{self, Certificate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethodDescriptor {
    pub user_verification: u32,
    /// Code accuracy descriptor
    pub ca_desc: Option<Value>,
    /// Biometric accuracy descriptor
    pub ba_desc: Option<Value>,
    /// Pattern accuracy descriptor
    pub pa_desc: Option<Value>,
}

/// Per-authenticator metadata, as published by the metadata service.
///
/// Fields this type does not model are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStatement {
    pub legal_header: Option<String>,
    pub aaid: Option<String>,
    pub aaguid: Option<String>,
    pub attestation_certificate_key_identifiers: Option<Vec<String>>,
    pub description: String,
    #[serde(default)]
    pub alternative_descriptions: HashMap<String, String>,
    #[serde(default)]
    pub authenticator_version: u32,
    pub protocol_family: Option<String>,
    #[serde(default)]
    pub upv: Vec<Version>,
    pub assertion_scheme: Option<String>,
    pub authentication_algorithm: Option<u16>,
    pub authentication_algorithms: Option<Vec<u16>>,
    pub public_key_alg_and_encoding: Option<u16>,
    pub public_key_alg_and_encodings: Option<Vec<u16>>,
    #[serde(default)]
    pub attestation_types: Vec<u16>,
    #[serde(default)]
    pub user_verification_details: Vec<Vec<VerificationMethodDescriptor>>,
    pub key_protection: Option<u16>,
    pub is_key_restricted: Option<bool>,
    pub is_fresh_user_verification_required: Option<bool>,
    pub matcher_protection: Option<u16>,
    pub crypto_strength: Option<u16>,
    pub operating_env: Option<String>,
    pub attachment_hint: Option<u32>,
    pub is_second_factor_only: Option<bool>,
    pub tc_display: Option<u16>,
    pub tc_display_content_type: Option<String>,
    /// Base64 DER trust anchors for this authenticator's attestation chains
    #[serde(default)]
    attestation_root_certificates: Vec<String>,
    pub icon: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetadataStatement {
    /// Decode a metadata statement from JSON
    pub fn parse(j: &[u8]) -> Result<Self, serde_json::Error> {
        let v: MetadataStatement = serde_json::from_slice(j)?;
        Ok(v)
    }

    /// The attestation roots, decoded, ready to be used as trust anchors
    pub fn attestation_root_certificates(&self) -> Result<Vec<Certificate>, chain::Error> {
        self.attestation_root_certificates
            .iter()
            .map(|c| Certificate::from_base64(c))
            .collect()
    }

    /// Whether the authenticator supports the given attestation type
    /// (`ATTESTATION_BASIC_FULL` is 0x3E07, `ATTESTATION_BASIC_SURROGATE`
    /// 0x3E08, ...)
    pub fn supports_attestation_type(&self, t: u16) -> bool {
        self.attestation_types.contains(&t)
    }
}
