// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::{der_to_pem, Certificate, PEM_CRL};
use crate::http::{HttpClient, Method};
use openssl::x509::{X509Crl, X509Ref};
use tracing::{debug, warn};

/// Finds and downloads the CRL a certificate points at.
///
/// Revocation data is opportunistic: every failure along the way (no
/// distribution point, network error, non-200 status, undecodable body)
/// yields `None`, which means "nothing known", never "revoked".
pub struct RevocationResolver<H> {
    http: H,
}

impl<H: HttpClient> RevocationResolver<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    /// Return the PEM encoded CRL for `cert`, if one can be obtained
    pub fn resolve_crl(&self, cert: &Certificate) -> Option<String> {
        let x509 = match cert.parse() {
            Ok(x) => x,
            Err(e) => {
                debug!(cert = ?cert, error = %e, "cannot parse certificate, skipping CRL lookup");
                return None;
            }
        };

        let uri = crl_distribution_point(&x509)?;

        debug!(cert = ?cert, %uri, "fetching CRL");

        let req = self.http.request(Method::Get, &uri);

        let rsp = match self.http.send(&req) {
            Ok(r) => r,
            Err(e) => {
                warn!(%uri, error = %e, "CRL fetch failed");
                return None;
            }
        };

        if !rsp.is_ok() {
            warn!(%uri, status = rsp.status, "CRL endpoint unavailable");
            return None;
        }

        let pem = crl_to_pem(&rsp.body);
        if pem.is_none() {
            warn!(%uri, "CRL endpoint returned something that is not a CRL");
        }

        pem
    }
}

/// The first URI-form name in the CRL distribution points extension
pub fn crl_distribution_point(x509: &X509Ref) -> Option<String> {
    let dps = x509.crl_distribution_points()?;

    for dp in dps.iter() {
        let names = match dp.distpoint().and_then(|n| n.fullname()) {
            Some(n) => n,
            None => continue,
        };

        if let Some(uri) = names.iter().find_map(|gn| gn.uri()) {
            return Some(uri.to_string());
        }
    }

    None
}

// DER is what distribution points are supposed to serve, but PEM shows up too
fn crl_to_pem(body: &[u8]) -> Option<String> {
    if X509Crl::from_der(body).is_ok() {
        return Some(der_to_pem(PEM_CRL, body));
    }

    if X509Crl::from_pem(body).is_ok() {
        return std::str::from_utf8(body).ok().map(|s| s.to_string());
    }

    None
}
