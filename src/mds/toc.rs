// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Error;

/// Certification or compromise status of an authenticator, as reported in
/// the TOC.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum AuthenticatorStatus {
    #[serde(rename = "NOT_FIDO_CERTIFIED")]
    NotFidoCertified,
    #[serde(rename = "FIDO_CERTIFIED")]
    FidoCertified,
    #[serde(rename = "USER_VERIFICATION_BYPASS")]
    UserVerificationBypass,
    #[serde(rename = "ATTESTATION_KEY_COMPROMISE")]
    AttestationKeyCompromise,
    #[serde(rename = "USER_KEY_REMOTE_COMPROMISE")]
    UserKeyRemoteCompromise,
    #[serde(rename = "USER_KEY_PHYSICAL_COMPROMISE")]
    UserKeyPhysicalCompromise,
    #[serde(rename = "UPDATE_AVAILABLE")]
    UpdateAvailable,
    #[serde(rename = "REVOKED")]
    Revoked,
    #[serde(rename = "SELF_ASSERTION_SUBMITTED")]
    SelfAssertionSubmitted,
    #[serde(rename = "FIDO_CERTIFIED_L1")]
    FidoCertifiedL1,
    #[serde(rename = "FIDO_CERTIFIED_L1plus")]
    FidoCertifiedL1Plus,
    #[serde(rename = "FIDO_CERTIFIED_L2")]
    FidoCertifiedL2,
    #[serde(rename = "FIDO_CERTIFIED_L2plus")]
    FidoCertifiedL2Plus,
    #[serde(rename = "FIDO_CERTIFIED_L3")]
    FidoCertifiedL3,
    #[serde(rename = "FIDO_CERTIFIED_L3plus")]
    FidoCertifiedL3Plus,
    /// Anything this version does not know about
    #[serde(other)]
    Unknown,
}

impl AuthenticatorStatus {
    /// Statuses that mean the authenticator must not be trusted any more
    pub fn is_compromised(&self) -> bool {
        matches!(
            self,
            AuthenticatorStatus::UserVerificationBypass
                | AuthenticatorStatus::AttestationKeyCompromise
                | AuthenticatorStatus::UserKeyRemoteCompromise
                | AuthenticatorStatus::UserKeyPhysicalCompromise
                | AuthenticatorStatus::Revoked
        )
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: AuthenticatorStatus,
    pub effective_date: Option<String>,
    /// Base64 DER of the certificate the status relates to, if any
    pub certificate: Option<String>,
    pub url: Option<String>,
    pub certification_descriptor: Option<String>,
    pub certificate_number: Option<String>,
    pub certification_policy_version: Option<String>,
    pub certification_requirements_version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricStatusReport {
    pub cert_level: u16,
    /// Bitmask of the `USER_VERIFY_*` modalities
    pub modality: u32,
    pub effective_date: Option<String>,
    pub certification_descriptor: Option<String>,
    pub certificate_number: Option<String>,
    pub certification_policy_version: Option<String>,
    pub certification_requirements_version: Option<String>,
}

/// One authenticator model in the TOC
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataTOCPayloadEntry {
    /// UAF authenticators
    pub aaid: Option<String>,
    /// FIDO2 authenticators
    pub aaguid: Option<String>,
    /// U2F authenticators, hex encoded SKIs of their attestation certificates
    pub attestation_certificate_key_identifiers: Option<Vec<String>>,
    /// base64url SHA-256 of the statement document found at `url`
    pub hash: Option<String>,
    /// Where the metadata statement lives; must be present to fetch it
    pub url: Option<String>,
    #[serde(default)]
    pub status_reports: Vec<StatusReport>,
    #[serde(default)]
    pub biometric_status_reports: Vec<BiometricStatusReport>,
    pub time_of_last_status_change: Option<String>,
    #[serde(rename = "rogueListURL")]
    pub rogue_list_url: Option<String>,
    pub rogue_list_hash: Option<String>,
}

impl MetadataTOCPayloadEntry {
    /// The most recent status, i.e., the last one in the report list
    pub fn latest_status(&self) -> Option<&AuthenticatorStatus> {
        self.status_reports.last().map(|r| &r.status)
    }

    /// Whether any report flags the authenticator as compromised or revoked
    pub fn is_compromised(&self) -> bool {
        self.status_reports.iter().any(|r| r.status.is_compromised())
    }
}

/// The verified table of contents published by the metadata service
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataTOCPayload {
    pub legal_header: Option<String>,
    /// Serial number of this TOC
    pub no: u64,
    /// ISO 8601 date by which a newer TOC will be available
    pub next_update: String,
    entries: Vec<MetadataTOCPayloadEntry>,
}

impl MetadataTOCPayload {
    /// Decode a TOC payload from JSON
    pub fn parse(j: &[u8]) -> Result<Self, Error> {
        let v: MetadataTOCPayload = serde_json::from_slice(j)?;
        Ok(v)
    }

    pub fn entries(&self) -> &[MetadataTOCPayloadEntry] {
        &self.entries
    }

    pub fn find_by_aaguid(&self, aaguid: &str) -> Option<&MetadataTOCPayloadEntry> {
        self.entries
            .iter()
            .find(|e| e.aaguid.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(aaguid)))
    }

    pub fn find_by_aaid(&self, aaid: &str) -> Option<&MetadataTOCPayloadEntry> {
        self.entries
            .iter()
            .find(|e| e.aaid.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(aaid)))
    }

    /// Find the entry listing `ski` (hex) among its attestation certificate
    /// key identifiers
    pub fn find_by_key_identifier(&self, ski: &str) -> Option<&MetadataTOCPayloadEntry> {
        self.entries.iter().find(|e| {
            e.attestation_certificate_key_identifiers
                .as_ref()
                .is_some_and(|ids| ids.iter().any(|i| i.eq_ignore_ascii_case(ski)))
        })
    }
}
