// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::statement::MetadataStatement;
use super::toc::{MetadataTOCPayload, MetadataTOCPayloadEntry};
use crate::config::MdsConfig;
use crate::http::{with_token, HttpClient, Method};
use crate::jws::Verifier;
use base64::{engine::general_purpose, Engine as _};
use openssl::sha::sha256;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URI: &str = "https://mds2.fidoalliance.org/";

/// Talks to a FIDO metadata service.
///
/// The TOC is only handed out once its JWS signature has been verified.
/// Metadata statements are fetched from the URLs listed in the verified TOC
/// and are not signed themselves; when the entry hash check is enabled their
/// digest must match the one the TOC carries.
pub struct MdsClient<H> {
    http: H,
    base_uri: String,
    token: String,
    verifier: Verifier,
    verify_entry_hash: bool,
}

impl<H: HttpClient> MdsClient<H> {
    pub fn new(http: H, token: impl Into<String>) -> Self {
        Self {
            http,
            base_uri: DEFAULT_BASE_URI.to_string(),
            token: token.into(),
            verifier: Verifier::default(),
            verify_entry_hash: false,
        }
    }

    pub fn from_config(http: H, cfg: &MdsConfig) -> Self {
        Self::new(http, cfg.token.clone())
            .with_base_uri(cfg.base_uri.clone())
            .with_entry_hash_check(cfg.verify_entry_hash)
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = uri.into();
        self
    }

    /// Replace the TOC signature verifier, e.g. to widen the algorithm policy
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_entry_hash_check(mut self, on: bool) -> Self {
        self.verify_entry_hash = on;
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn get(&self, uri: &str) -> Result<Vec<u8>, Error> {
        let req = self.http.request(Method::Get, &with_token(uri, &self.token));
        let rsp = self.http.send(&req)?;

        if !rsp.is_ok() {
            warn!(%uri, status = rsp.status, "metadata service request failed");
            return Err(Error::ServiceUnavailable(format!(
                "{uri} returned {}",
                rsp.status
            )));
        }

        Ok(rsp.body)
    }

    /// Fetch the TOC, verify its signature and decode the payload
    pub fn fetch_toc_payload(&self) -> Result<MetadataTOCPayload, Error> {
        let body = self.get(&self.base_uri)?;

        let token = String::from_utf8(body)
            .map_err(|e| Error::InvalidResponse(format!("TOC is not text: {e}")))?;

        let payload = self.verifier.verify_and_extract_payload(token.trim())?;

        let toc = MetadataTOCPayload::parse(&payload)
            .map_err(|e| Error::InvalidResponse(format!("decoding TOC payload: {e}")))?;

        debug!(no = toc.no, entries = toc.entries().len(), "fetched TOC");

        Ok(toc)
    }

    /// Fetch and decode the metadata statement `entry` points to
    pub fn fetch_statement_for(
        &self,
        entry: &MetadataTOCPayloadEntry,
    ) -> Result<MetadataStatement, Error> {
        let url = entry.url.as_deref().ok_or(Error::MissingUrl)?;

        let body = self.get(url)?;

        if self.verify_entry_hash {
            check_entry_hash(entry, &body)?;
        }

        let raw = decode_statement_body(&body)?;

        MetadataStatement::parse(&raw)
            .map_err(|e| Error::InvalidResponse(format!("decoding statement: {e}")))
    }
}

/// Statements are served base64url encoded; some mirrors use the standard
/// alphabet instead
fn decode_statement_body(body: &[u8]) -> Result<Vec<u8>, Error> {
    let s = std::str::from_utf8(body)
        .map_err(|e| Error::InvalidResponse(format!("statement is not text: {e}")))?
        .trim();

    general_purpose::URL_SAFE_NO_PAD
        .decode(s.trim_end_matches('='))
        .or_else(|_| general_purpose::STANDARD.decode(s))
        .map_err(|e| Error::InvalidResponse(format!("decoding statement base64: {e}")))
}

fn check_entry_hash(entry: &MetadataTOCPayloadEntry, body: &[u8]) -> Result<(), Error> {
    let expected = entry
        .hash
        .as_deref()
        .ok_or_else(|| Error::HashMismatch("TOC entry carries no hash".to_string()))?
        .trim_end_matches('=');

    let actual = general_purpose::URL_SAFE_NO_PAD.encode(sha256(body));

    if actual != expected {
        return Err(Error::HashMismatch(format!(
            "expected {expected}, got {actual}"
        )));
    }

    Ok(())
}
