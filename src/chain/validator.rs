// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::Certificate;
use super::errors::Error;
use super::revocation::RevocationResolver;
use super::tempstore::ScopedDirectory;
use super::verifier::{ChainVerifier, VerifyRequest};
use crate::http::HttpClient;
use openssl::asn1::Asn1Time;
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{debug, warn};

const ANCHORS_PREFIX: &str = "fidotrust-ta-";
const CHAIN_PREFIX: &str = "fidotrust-chain-";

/// Validates authenticator attestation chains against a set of trust anchors.
pub struct ChainValidator<H, V> {
    resolver: RevocationResolver<H>,
    verifier: V,
    work_dir: Option<PathBuf>,
}

impl<H: HttpClient, V: ChainVerifier> ChainValidator<H, V> {
    pub fn new(http: H, verifier: V) -> Self {
        Self {
            resolver: RevocationResolver::new(http),
            verifier,
            work_dir: None,
        }
    }

    /// Stage temporary artifacts under `dir` instead of the system temp dir
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Check `authenticator` (leaf first, then intermediates) against
    /// `trusted`.
    ///
    /// With no trust anchors only the validity period of each certificate is
    /// looked at.  That is a much weaker statement than a validated path and
    /// callers should treat it as such.
    pub fn check(&self, authenticator: &[Certificate], trusted: &[Certificate]) -> Result<(), Error> {
        if authenticator.is_empty() {
            return Err(Error::InvalidChain(
                "no authenticator certificate supplied".to_string(),
            ));
        }

        if trusted.is_empty() {
            warn!("no trust anchors supplied, checking validity periods only");
            return check_validity(authenticator);
        }

        self.check_path(authenticator, trusted)
    }

    fn check_path(&self, authenticator: &[Certificate], trusted: &[Certificate]) -> Result<(), Error> {
        let work_dir = self.work_dir.as_deref();

        // both directories are removed on drop should anything below bail out
        let mut anchors = ScopedDirectory::create(work_dir, ANCHORS_PREFIX)?;
        let mut staging = ScopedDirectory::create(work_dir, CHAIN_PREFIX)?;

        let mut has_crls = false;

        for ta in trusted {
            let crl = self.resolver.resolve_crl(ta);
            let staged = anchors.write_certificate_file(ta, crl.as_deref())?;
            has_crls |= staged.had_crl();
        }

        // CRLs of the authenticator's own certificates can only be found
        // through the CA directory, so they are filed next to the anchors
        let mut staged_chain = Vec::with_capacity(authenticator.len());

        for c in authenticator {
            let staged = staging.write_certificate_file(c, None)?;

            if let Some(crl) = self.resolver.resolve_crl(c) {
                anchors.write_crl_file(&crl)?;
                has_crls = true;
            }

            staged_chain.push(staged.path);
        }

        if !self.verifier.rehash(anchors.path()) {
            return Err(Error::InvalidChain(
                "indexing the trust anchor directory failed".to_string(),
            ));
        }

        let mut chain = staged_chain.into_iter();
        let subject = chain
            .next()
            .ok_or_else(|| Error::InvalidChain("no leaf certificate staged".to_string()))?;

        let req = VerifyRequest {
            ca_path: anchors.path().to_path_buf(),
            untrusted: chain.collect(),
            subject,
            crl_check: has_crls,
        };

        debug!(
            anchors = trusted.len(),
            intermediates = req.untrusted.len(),
            crl_check = req.crl_check,
            "verifying attestation chain"
        );

        let ok = self.verifier.verify(&req);

        staging.release_all();
        anchors.release_all();

        if !ok {
            return Err(Error::InvalidChain(format!(
                "chain for {:?} does not validate",
                authenticator[0]
            )));
        }

        debug!(leaf = ?authenticator[0], "attestation chain verified");

        Ok(())
    }
}

/// Require "now" to fall within the validity period of every certificate
pub fn check_validity(certs: &[Certificate]) -> Result<(), Error> {
    let now = Asn1Time::days_from_now(0).map_err(|e| Error::Crypto(format!("{e:?}")))?;

    for c in certs {
        let x = c
            .parse()
            .map_err(|e| Error::InvalidChain(e.to_string()))?;

        let starts = x
            .not_before()
            .compare(&now)
            .map_err(|e| Error::Crypto(format!("{e:?}")))?;

        if starts == Ordering::Greater {
            return Err(Error::NotYetValid(format!(
                "{c:?} is valid from {}",
                x.not_before()
            )));
        }

        let ends = x
            .not_after()
            .compare(&now)
            .map_err(|e| Error::Crypto(format!("{e:?}")))?;

        if ends == Ordering::Less {
            return Err(Error::ExpiredCertificate(format!(
                "{c:?} expired on {}",
                x.not_after()
            )));
        }
    }

    Ok(())
}
